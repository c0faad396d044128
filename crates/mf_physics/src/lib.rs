// crates/mf_physics/src/lib.rs

//! 交错网格不可压 Navier–Stokes 求解核心
//!
//! 在均匀笛卡尔 MAC 网格上用 Chorin 投影法推进：
//! - 网格、几何掩码与场分配 (grid, mask, fields)
//! - 物性与派生常量 (constants)
//! - 边界条件表、面分类与虚拟层填充 (boundary)
//! - 稀疏线性代数与离散算子 (numerics)
//! - 预测、压力泊松、校正、诊断与时间循环 (engine)
//!
//! # 示例
//!
//! ```
//! use mf_config::CaseConfig;
//! use mf_physics::{NullSink, SolverState, TimeLoop};
//!
//! let mut config = CaseConfig::template(4, 4, 4);
//! config.simulation_parameters.total_time = 0.02;
//! let mut state = SolverState::new(&config).unwrap();
//! let report = TimeLoop::new().run(&mut state, &mut NullSink);
//! assert!(report.is_success());
//! assert_eq!(report.steps, 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod boundary;
pub mod constants;
pub mod engine;
pub mod error;
pub mod fields;
pub mod grid;
pub mod mask;
pub mod numerics;

// 重导出常用类型
pub use boundary::{BoundaryApplier, BoundaryKind, BoundaryTable, FaceClass, FaceClassification};
pub use constants::{DerivedConstants, FluidProperties, SimulationParams};
pub use engine::{
    DiagnosticsRecord, FailureRecord, NullSink, PpeReport, PpeSolver, RunOutcome, RunReport,
    SimulationPhase, Snapshot, SnapshotSink, SolverState, TimeLoop,
};
pub use error::{PhysicsError, PhysicsResult};
pub use fields::{Component, FieldLayout, StaggeredFields};
pub use grid::Grid;
pub use mask::{CellKind, GeometryMask};
pub use numerics::{OperatorBuilder, Operators};
