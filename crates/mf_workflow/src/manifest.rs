// crates/mf_workflow/src/manifest.rs

//! 运行清单（归档中的 `manifest.json`）

use chrono::{DateTime, Utc};
use mf_physics::{FailureRecord, RunReport};
use serde::Serialize;

/// 清单条目名
pub const MANIFEST_NAME: &str = "manifest.json";

/// 失败记录条目名
pub const FAILURE_NAME: &str = "failure.json";

/// 运行清单
#[derive(Debug, Clone, Serialize)]
pub struct RunManifest {
    /// 算例名
    pub case_name: String,
    /// 输入文档路径
    pub config_path: String,
    /// 开始时间
    pub started_at: DateTime<Utc>,
    /// 结束时间
    pub finished_at: DateTime<Utc>,
    /// 完成步数
    pub steps: usize,
    /// 结束时的模拟时间
    pub final_time: f64,
    /// completed / failed / stopped
    pub outcome: String,
    /// 归档中的快照文件
    pub files: Vec<String>,
    /// 失败记录
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureRecord>,
    /// 快照写入错误
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub write_errors: Vec<String>,
}

impl RunManifest {
    /// 由运行报告构造
    pub fn from_report(
        case_name: &str,
        config_path: &str,
        started_at: DateTime<Utc>,
        report: &RunReport,
        files: Vec<String>,
    ) -> Self {
        Self {
            case_name: case_name.to_string(),
            config_path: config_path.to_string(),
            started_at,
            finished_at: Utc::now(),
            steps: report.steps,
            final_time: report.final_time,
            outcome: report.outcome.as_str().to_string(),
            files,
            failure: report.failure.clone(),
            write_errors: report.write_errors.clone(),
        }
    }

    /// 运行时长（秒）
    pub fn elapsed_secs(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}
