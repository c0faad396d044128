// crates/mf_foundation/src/validation.rs

//! 运行时验证工具
//!
//! 提供验证报告和错误/警告类型。输入文档的模式检查会把所有问题收集到同一份
//! 报告里，一次性报告给用户，而不是遇到第一个问题就停止。
//!
//! # 示例
//!
//! ```
//! use mf_foundation::validation::{ValidationReport, ValidationError};
//!
//! let density = -1.0f64;
//! let mut report = ValidationReport::new();
//! if density <= 0.0 {
//!     report.add_error(ValidationError::OutOfRange {
//!         field: "fluid_properties.density".into(),
//!         value: density,
//!         min: 0.0,
//!         max: f64::INFINITY,
//!     });
//! }
//!
//! assert!(report.has_errors());
//! ```

use std::fmt;

/// 验证报告
#[derive(Debug, Default, Clone)]
pub struct ValidationReport {
    /// 错误列表
    pub errors: Vec<ValidationError>,
    /// 警告列表
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    /// 创建空的验证报告
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加错误
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// 添加警告
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ValidationWarning {
            field: field.into(),
            message: message.into(),
        });
    }

    /// 检查数值有限，非有限时记录错误并返回 false
    pub fn check_finite(&mut self, field: &str, value: f64) -> bool {
        if value.is_finite() {
            true
        } else {
            self.add_error(ValidationError::NonFinite {
                field: field.to_string(),
                value,
            });
            false
        }
    }

    /// 检查数值位于闭区间 [min, max]
    pub fn check_range(&mut self, field: &str, value: f64, min: f64, max: f64) {
        if self.check_finite(field, value) && (value < min || value > max) {
            self.add_error(ValidationError::OutOfRange {
                field: field.to_string(),
                value,
                min,
                max,
            });
        }
    }

    /// 检查数值严格为正
    pub fn check_positive(&mut self, field: &str, value: f64) {
        if self.check_finite(field, value) && value <= 0.0 {
            self.add_error(ValidationError::Invalid {
                field: field.to_string(),
                reason: format!("必须大于 0，实际为 {value}"),
            });
        }
    }

    /// 是否有错误
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// 是否有警告
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// 错误数量
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// 警告数量
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// 是否通过（无错误）
    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }

    /// 报告中是否有指向该字段（或其子字段）的错误
    pub fn mentions(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field().starts_with(field))
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} 个错误", self.error_count())?;
        for err in &self.errors {
            write!(f, "; {err}")?;
        }
        Ok(())
    }
}

/// 验证错误类型
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// 缺少必需字段
    Missing {
        /// 字段路径
        field: String,
    },
    /// 非有限值
    NonFinite {
        /// 字段路径
        field: String,
        /// 非有限的数值
        value: f64,
    },
    /// 数据超出范围
    OutOfRange {
        /// 字段路径
        field: String,
        /// 实际值
        value: f64,
        /// 下界
        min: f64,
        /// 上界
        max: f64,
    },
    /// 重复条目
    Duplicate {
        /// 字段路径
        field: String,
        /// 重复的值
        value: String,
    },
    /// 其他无效值
    Invalid {
        /// 字段路径
        field: String,
        /// 原因
        reason: String,
    },
}

impl ValidationError {
    /// 出错字段的路径
    pub fn field(&self) -> &str {
        match self {
            Self::Missing { field }
            | Self::NonFinite { field, .. }
            | Self::OutOfRange { field, .. }
            | Self::Duplicate { field, .. }
            | Self::Invalid { field, .. } => field,
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing { field } => write!(f, "{field}: 缺少必需字段"),
            Self::NonFinite { field, value } => write!(f, "{field}: 非有限值 {value}"),
            Self::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "{field}: {value} 超出范围 [{min}, {max}]"),
            Self::Duplicate { field, value } => write!(f, "{field}: 重复的条目 {value}"),
            Self::Invalid { field, reason } => write!(f, "{field}: {reason}"),
        }
    }
}

/// 验证警告
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationWarning {
    /// 字段路径
    pub field: String,
    /// 警告说明
    pub message: String,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}
