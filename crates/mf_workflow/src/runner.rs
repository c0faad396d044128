// crates/mf_workflow/src/runner.rs

//! 算例运行器
//!
//! 输入文档 → 求解器状态 → 时间循环 → 快照 → 归档。
//! 数值失败时仍写出归档（含失败记录），再把错误连同归档路径返回。

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use chrono::Utc;
use mf_config::CaseConfig;
use mf_foundation::MfError;
use mf_io::{ArchiveWriter, IoError, SnapshotWriter, ARCHIVE_EXTENSION};
use mf_physics::{PhysicsError, RunOutcome, RunReport, SolverState, TimeLoop};

use crate::error::{WorkflowError, WorkflowResult};
use crate::manifest::{RunManifest, FAILURE_NAME, MANIFEST_NAME};

/// 运行选项
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// 输出目录（快照子目录与归档都放在这里）
    pub output_dir: PathBuf,
    /// 算例名，缺省取输入文件名主干
    pub case_name: Option<String>,
    /// 协作式停止标志
    pub stop_flag: Option<Arc<AtomicBool>>,
}

impl RunOptions {
    /// 输出到指定目录
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            case_name: None,
            stop_flag: None,
        }
    }

    /// 指定算例名
    pub fn with_case_name(mut self, name: impl Into<String>) -> Self {
        self.case_name = Some(name.into());
        self
    }

    /// 设置停止标志
    pub fn with_stop_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.stop_flag = Some(flag);
        self
    }

    fn resolve_case_name(&self, config_path: &Path) -> String {
        self.case_name.clone().unwrap_or_else(|| {
            config_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("case")
                .to_string()
        })
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self::new("output")
    }
}

/// `--check` 的结果摘要
#[derive(Debug, Clone, PartialEq)]
pub struct CheckSummary {
    /// 单元数 (nx, ny, nz)
    pub counts: [usize; 3],
    /// 流体单元数
    pub n_fluid: usize,
    /// 速度自由度
    pub n_velocity: usize,
    /// PPE 是否为全 Neumann
    pub ppe_singular: bool,
    /// 计划步数
    pub planned_steps: usize,
}

/// 只检查输入并构建算子，不推进时间
pub fn check_case(config_path: &Path) -> WorkflowResult<CheckSummary> {
    let config = CaseConfig::from_file(config_path)?;
    let mut state = SolverState::new(&config).map_err(WorkflowError::at_start)?;
    state.prepare().map_err(WorkflowError::at_start)?;

    let grid = state.grid();
    let params = state.params();
    let summary = CheckSummary {
        counts: [grid.nx(), grid.ny(), grid.nz()],
        n_fluid: state.mask().n_fluid(),
        n_velocity: state.fields().n_velocity(),
        ppe_singular: state.ppe_is_singular().unwrap_or(false),
        planned_steps: params.planned_steps(),
    };
    tracing::info!(
        "检查通过: {}×{}×{} 单元, {} 个流体单元, 约 {} 步",
        summary.counts[0],
        summary.counts[1],
        summary.counts[2],
        summary.n_fluid,
        summary.planned_steps
    );
    Ok(summary)
}

/// 运行算例，返回归档路径
pub fn run_case(config_path: &Path, options: &RunOptions) -> WorkflowResult<PathBuf> {
    let started_at = Utc::now();
    let config = CaseConfig::from_file(config_path)?;
    let case_name = options.resolve_case_name(config_path);
    tracing::info!("算例 {case_name}: 读取 {}", config_path.display());

    let mut state = SolverState::new(&config).map_err(WorkflowError::at_start)?;
    let snapshot_dir = options.output_dir.join(&case_name);
    let mut writer = SnapshotWriter::new(&snapshot_dir)?;

    let mut time_loop = TimeLoop::new();
    if let Some(flag) = &options.stop_flag {
        time_loop = time_loop.with_stop_flag(Arc::clone(flag));
    }
    let report = time_loop.run(&mut state, &mut writer);

    match report.outcome {
        RunOutcome::Completed => tracing::info!(
            "算例 {case_name} 完成: {} 步, t = {}",
            report.steps,
            report.final_time
        ),
        RunOutcome::Stopped => tracing::warn!(
            "算例 {case_name} 被中断: {} 步, t = {}",
            report.steps,
            report.final_time
        ),
        RunOutcome::Failed => {
            if let Some(failure) = &report.failure {
                tracing::error!(
                    "算例 {case_name} 失败 [{}] 于第 {} 步: {}",
                    failure.kind,
                    failure.step,
                    failure.message
                );
            }
        }
    }

    let archive_path = options
        .output_dir
        .join(format!("{case_name}.{ARCHIVE_EXTENSION}"));
    write_archive(
        &archive_path,
        &writer,
        &case_name,
        config_path,
        started_at,
        &report,
    )?;
    tracing::info!("归档: {}", archive_path.display());

    finish(report, archive_path)
}

fn write_archive(
    path: &Path,
    writer: &SnapshotWriter,
    case_name: &str,
    config_path: &Path,
    started_at: chrono::DateTime<Utc>,
    report: &RunReport,
) -> WorkflowResult<()> {
    let mut archive = ArchiveWriter::new();
    let mut files = Vec::with_capacity(writer.written().len());
    for file in writer.written() {
        archive.add_file(file)?;
        if let Some(name) = file.file_name().and_then(|n| n.to_str()) {
            files.push(name.to_string());
        }
    }

    let manifest = RunManifest::from_report(
        case_name,
        &config_path.display().to_string(),
        started_at,
        report,
        files,
    );
    tracing::debug!("运行耗时 {:.3} s", manifest.elapsed_secs());
    archive.add_bytes(MANIFEST_NAME, to_json(MANIFEST_NAME, &manifest)?);

    if let Some(failure) = &report.failure {
        archive.add_bytes(FAILURE_NAME, to_json(FAILURE_NAME, failure)?);
    }

    archive.write(path)?;
    Ok(())
}

fn to_json<T: serde::Serialize>(name: &str, value: &T) -> WorkflowResult<Vec<u8>> {
    serde_json::to_vec_pretty(value).map_err(|source| {
        WorkflowError::Io(IoError::Json {
            path: PathBuf::from(name),
            source,
        })
    })
}

fn finish(report: RunReport, archive: PathBuf) -> WorkflowResult<PathBuf> {
    if report.outcome == RunOutcome::Failed {
        let (step, time) = report
            .failure
            .as_ref()
            .map(|f| (f.step, f.time))
            .unwrap_or((report.steps, report.final_time));
        let source = report
            .error
            .unwrap_or_else(|| PhysicsError::state("时间循环失败但未记录错误"));
        return Err(WorkflowError::Physics {
            source,
            step,
            time,
            archive: Some(archive),
        });
    }
    if !report.write_errors.is_empty() {
        let message = report.write_errors.join("; ");
        return Err(WorkflowError::Io(IoError::from(MfError::io(message))));
    }
    Ok(archive)
}
