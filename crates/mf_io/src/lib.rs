// crates/mf_io/src/lib.rs

//! macflow IO 模块
//!
//! # 模块
//!
//! - [`snapshot`]: 快照元数据（JSON）与场数据（二进制）
//! - [`archive`]: 带 CRC 校验的单文件归档
//! - [`error`]: IO 错误类型
//!
//! # 使用示例
//!
//! ```no_run
//! use mf_config::CaseConfig;
//! use mf_io::SnapshotWriter;
//! use mf_physics::{SolverState, TimeLoop};
//!
//! let config = CaseConfig::from_file("case.json")?;
//! let mut state = SolverState::new(&config)?;
//! let mut writer = SnapshotWriter::new("output")?;
//! let report = TimeLoop::new().run(&mut state, &mut writer);
//! println!("{} 步, {} 个文件", report.steps, writer.written().len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod archive;
pub mod error;
pub mod snapshot;

// 重导出常用类型
pub use archive::{crc32, Archive, ArchiveEntry, ArchiveWriter, ARCHIVE_EXTENSION};
pub use error::{IoError, IoResult};
pub use snapshot::{
    read_snapshot, snapshot_stem, FieldEntry, GridSummary, SnapshotMetadata, SnapshotWriter,
    FINAL_STEM,
};
