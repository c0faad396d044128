// crates/mf_workflow/src/lib.rs

//! macflow 工作流模块
//!
//! 顶层入口 [`run_case`]：读取输入文档，构建求解器状态，运行时间循环，
//! 写出快照并打包归档。返回值为归档路径。
//!
//! # 模块结构
//!
//! - [`runner`]: 运行与检查入口
//! - [`manifest`]: 归档中的运行清单
//! - [`error`]: 工作流错误与退出码
//!
//! # 示例
//!
//! ```no_run
//! use std::path::Path;
//! use mf_workflow::{run_case, RunOptions};
//!
//! let options = RunOptions::new("output");
//! match run_case(Path::new("cavity.json"), &options) {
//!     Ok(archive) => println!("{}", archive.display()),
//!     Err(err) => {
//!         eprintln!("{}", err.terminal_line());
//!         std::process::exit(err.exit_code());
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod manifest;
pub mod runner;

// 重导出核心类型
pub use error::{WorkflowError, WorkflowResult};
pub use manifest::{RunManifest, FAILURE_NAME, MANIFEST_NAME};
pub use runner::{check_case, run_case, CheckSummary, RunOptions};
