// crates/mf_foundation/src/error.rs

//! 统一错误类型与失败分类
//!
//! `MfError` 是基础层和快照接口使用的错误；[`FailureKind`] 是全项目共用的
//! 失败分类。各 crate 的错误类型都能映射到一个 `FailureKind`，
//! 由它决定终端输出的错误种类与进程退出码。
//!
//! # 示例
//!
//! ```
//! use mf_foundation::error::{FailureKind, MfError};
//!
//! let err = MfError::io("snapshot_0003.bin: 磁盘已满");
//! assert_eq!(err.kind(), FailureKind::IoError);
//! assert_eq!(err.kind().exit_code(), 8);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// 统一结果类型
pub type MfResult<T> = Result<T, MfError>;

/// macflow 基础错误类型
///
/// 配置、数值与输出相关错误分别在各自 crate 中定义，需要跨越快照接口时
/// 转换成这里的变体。
#[derive(Error, Debug)]
pub enum MfError {
    /// 文件读写失败
    #[error("IO错误: {message}")]
    Io {
        /// 出错的文件或操作
        message: String,
        /// 底层 IO 错误
        #[source]
        source: Option<std::io::Error>,
    },

    /// 输入值无法识别
    #[error("无效的输入数据: {message}")]
    InvalidInput {
        /// 说明
        message: String,
    },

    /// JSON 编码失败
    #[error("序列化错误: {message}")]
    Serialization {
        /// 说明
        message: String,
    },
}

impl MfError {
    /// 不带底层错误的 IO 错误
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
            source: None,
        }
    }

    /// 带底层错误的 IO 错误
    pub fn io_with_source(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source: Some(source),
        }
    }

    /// 无效输入
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// 序列化错误
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// 该错误对应的失败分类
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Io { .. } | Self::Serialization { .. } => FailureKind::IoError,
            Self::InvalidInput { .. } => FailureKind::SchemaError,
        }
    }
}

impl From<std::io::Error> for MfError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

// ========================================================================
// 失败分类
// ========================================================================

/// 运行失败分类
///
/// 终端输出、归档中的失败记录以及进程退出码都以它为准。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureKind {
    /// 输入文档结构不满足约定
    SchemaError,
    /// 掩码、范围或几何不一致
    InvalidGeometry,
    /// 时间步长、物性或网格间距无效
    ConfigError,
    /// 压力泊松方程未在迭代上限内收敛
    LinearSolveError,
    /// 校正后散度超出容差
    ProjectionError,
    /// CFL 数超过 1
    #[serde(rename = "CFL_VIOLATION")]
    CflViolation,
    /// 快照或归档写入失败
    #[serde(rename = "IOError")]
    IoError,
    /// 未归类的内部错误
    Internal,
}

impl FailureKind {
    /// 规范名称（终端输出与失败记录使用）
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SchemaError => "SchemaError",
            Self::InvalidGeometry => "InvalidGeometry",
            Self::ConfigError => "ConfigError",
            Self::LinearSolveError => "LinearSolveError",
            Self::ProjectionError => "ProjectionError",
            Self::CflViolation => "CFL_VIOLATION",
            Self::IoError => "IOError",
            Self::Internal => "InternalError",
        }
    }

    /// 进程退出码（0 保留给成功）
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Internal => 1,
            Self::SchemaError => 2,
            Self::InvalidGeometry => 3,
            Self::ConfigError => 4,
            Self::LinearSolveError => 5,
            Self::ProjectionError => 6,
            Self::CflViolation => 7,
            Self::IoError => 8,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
