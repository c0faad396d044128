// crates/mf_io/src/error.rs

//! IO 错误类型定义
//!
//! 所有错误最终可转换为 [`MfError`]，作为快照接口的错误类型跨层传递。

use std::path::PathBuf;

use mf_foundation::{FailureKind, MfError};
use thiserror::Error;

/// IO 模块结果类型别名
pub type IoResult<T> = Result<T, IoError>;

/// IO 错误枚举
#[derive(Error, Debug)]
pub enum IoError {
    /// 文件读写失败
    #[error("文件读写失败: {path}: {source}")]
    File {
        /// 文件路径
        path: PathBuf,
        /// 底层错误
        #[source]
        source: std::io::Error,
    },

    /// JSON 序列化失败
    #[error("JSON 序列化失败: {path}: {source}")]
    Json {
        /// 文件路径
        path: PathBuf,
        /// 底层错误
        #[source]
        source: serde_json::Error,
    },

    /// 文件格式错误
    #[error("格式错误: {path}: {reason}")]
    Format {
        /// 文件路径
        path: PathBuf,
        /// 原因
        reason: String,
    },

    /// 归档条目校验失败
    #[error("归档条目 {entry} 校验失败: 记录 CRC {expected:#010x}, 实际 {found:#010x}")]
    Checksum {
        /// 条目名
        entry: String,
        /// 归档中记录的 CRC
        expected: u32,
        /// 重新计算的 CRC
        found: u32,
    },

    /// 基础层错误转换
    #[error("基础层错误: {0}")]
    Foundation(#[from] MfError),
}

impl IoError {
    /// 文件读写错误
    pub fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }

    /// 格式错误
    pub fn format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Format {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// 失败分类
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Foundation(err) => err.kind(),
            _ => FailureKind::IoError,
        }
    }
}

impl From<IoError> for MfError {
    fn from(err: IoError) -> Self {
        match err {
            IoError::File { path, source } => {
                MfError::io_with_source(path.display().to_string(), source)
            }
            IoError::Json { path, source } => {
                MfError::serialization(format!("{}: {source}", path.display()))
            }
            IoError::Foundation(inner) => inner,
            other => MfError::io(other.to_string()),
        }
    }
}
