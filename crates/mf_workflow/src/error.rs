// crates/mf_workflow/src/error.rs

//! 工作流错误
//!
//! 汇总配置、数值与 IO 三层错误。数值失败时携带失败位置与仍然写出的归档路径，
//! 终端输出与退出码都由 [`WorkflowError::kind`] 决定。

use std::path::PathBuf;

use mf_config::ConfigError;
use mf_foundation::FailureKind;
use mf_io::IoError;
use mf_physics::PhysicsError;
use thiserror::Error;

/// 工作流结果类型
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// 工作流错误
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// 输入文档无法读取或未通过模式检查
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// 构造或时间推进中的数值错误
    #[error("{source}")]
    Physics {
        /// 底层错误
        source: PhysicsError,
        /// 失败时的步数
        step: usize,
        /// 失败时的时间
        time: f64,
        /// 失败后仍写出的归档
        archive: Option<PathBuf>,
    },

    /// 快照或归档写入失败
    #[error(transparent)]
    Io(#[from] IoError),
}

impl WorkflowError {
    /// 构造阶段（尚未推进）的数值错误
    pub fn at_start(source: PhysicsError) -> Self {
        Self::Physics {
            source,
            step: 0,
            time: 0.0,
            archive: None,
        }
    }

    /// 失败分类
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Config(err) => err.kind(),
            Self::Physics { source, .. } => source.kind(),
            Self::Io(err) => err.kind(),
        }
    }

    /// 进程退出码
    pub fn exit_code(&self) -> i32 {
        self.kind().exit_code()
    }

    /// 失败位置 (step, time)；配置与 IO 错误为 (0, 0)
    pub fn location(&self) -> (usize, f64) {
        match self {
            Self::Physics { step, time, .. } => (*step, *time),
            _ => (0, 0.0),
        }
    }

    /// 失败后写出的归档
    pub fn archive(&self) -> Option<&PathBuf> {
        match self {
            Self::Physics { archive, .. } => archive.as_ref(),
            _ => None,
        }
    }

    /// 终端单行描述：`error[<KIND>] at step <n> (t=<t>): <message>`
    pub fn terminal_line(&self) -> String {
        let (step, time) = self.location();
        format!("error[{}] at step {step} (t={time}): {self}", self.kind())
    }
}
