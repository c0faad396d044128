// crates/mf_config/src/error.rs

//! 配置层错误类型

use mf_foundation::{FailureKind, ValidationReport};
use std::path::PathBuf;

/// 配置结果类型
pub type ConfigResult<T> = Result<T, ConfigError>;

/// 配置错误
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO 错误
    #[error("无法读取配置文件 {path}: {source}")]
    Io {
        /// 文件路径
        path: PathBuf,
        /// 底层错误
        #[source]
        source: std::io::Error,
    },

    /// 解析错误（结构不符：缺字段、类型错误、未知枚举值）
    #[error("解析错误: {0}")]
    Parse(String),

    /// 模式检查失败
    #[error("模式检查失败: {0}")]
    Schema(ValidationReport),

    /// 无效值
    #[error("无效值 '{key}': {value} - {reason}")]
    InvalidValue {
        /// 配置键
        key: String,
        /// 配置值
        value: String,
        /// 原因
        reason: String,
    },
}

impl ConfigError {
    /// 失败分类
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Io { .. } => FailureKind::IoError,
            Self::Parse(_) | Self::Schema(_) | Self::InvalidValue { .. } => {
                FailureKind::SchemaError
            }
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidValue {
            key: "simulation_parameters.time_step".to_string(),
            value: "-1".to_string(),
            reason: "必须为正".to_string(),
        };
        assert!(err.to_string().contains("time_step"));
        assert_eq!(err.kind(), FailureKind::SchemaError);
    }

    #[test]
    fn test_parse_error_is_schema_kind() {
        let err: ConfigError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), FailureKind::SchemaError);
    }
}
