// crates/mf_physics/src/engine/mod.rs

//! 时间推进引擎
//!
//! 一步之内严格按顺序执行：边界 → 预测 → 压力泊松 → 校正 → 边界。
//! 工作缓冲区随状态分配，跨步复用。

pub mod corrector;
pub mod diagnostics;
pub mod predictor;
pub mod pressure;
pub mod state;
pub mod time_loop;

pub use corrector::{check_projection, Corrector};
pub use diagnostics::{
    cfl_estimate, cfl_velocity, check_cfl, max_face_speed, max_velocity_magnitude,
    DiagnosticsRecord, FailureRecord,
};
pub use predictor::Predictor;
pub use pressure::{PpeReport, PpeSolver};
pub use state::{SimulationPhase, SolverState};
pub use time_loop::{NullSink, RunOutcome, RunReport, Snapshot, SnapshotSink, TimeLoop};
