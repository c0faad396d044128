// crates/mf_foundation/src/lib.rs

//! macflow 基础层
//!
//! 为整个工作区提供共享的基础抽象。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型与失败分类（退出码）
//! - [`validation`]: 验证报告，收集输入文档的全部问题
//! - [`index`]: 三维结构化索引与展平顺序
//!
//! # 示例
//!
//! ```
//! use mf_foundation::{Dims3, FlatteningOrder};
//!
//! let dims = Dims3::new(4, 3, 2);
//! let order = FlatteningOrder::IFastest;
//! let idx = order.index(dims, 1, 2, 1);
//! assert_eq!(order.unflatten(dims, idx), (1, 2, 1));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod index;
pub mod validation;

// 重导出常用类型
pub use error::{FailureKind, MfError, MfResult};
pub use index::{Dims3, FlatteningOrder};
pub use validation::{ValidationError, ValidationReport, ValidationWarning};

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::error::{FailureKind, MfError, MfResult};
    pub use crate::index::{Dims3, FlatteningOrder};
    pub use crate::validation::{ValidationError, ValidationReport, ValidationWarning};
}
