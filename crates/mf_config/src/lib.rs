// crates/mf_config/src/lib.rs

//! macflow 配置层
//!
//! 算例输入文档的数据模型与模式检查。文档是唯一逐位约定的外部接口：
//!
//! - `domain_definition`: 计算域范围与单元数
//! - `fluid_properties`: 密度、黏度
//! - `initial_conditions`: 初始速度、初始压力
//! - `simulation_parameters`: 时间步长、总时长、输出间隔
//! - `boundary_conditions`: 六个面的边界条件记录
//! - `geometry_definition`: 几何掩码与展平顺序
//! - `external_forces`: 体积力
//! - `solver_settings`: 数值求解设置（扩展段，可省略）
//!
//! # 层级架构
//!
//! ```text
//! apps/mf_cli   ─> mf_workflow
//! mf_workflow   ─> mf_config, mf_physics, mf_io
//! mf_physics    ─> mf_config (本层), mf_foundation
//! mf_config     ─> mf_foundation
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod boundary;
pub mod case;
pub mod error;
pub mod solver;

// 重导出核心类型
pub use boundary::{BoundaryRecord, BoundaryType, FaceLocation};
pub use case::{
    CaseConfig, DomainDefinition, ExternalForces, FluidPropertiesConfig, GeometryDefinition,
    InitialConditions, SimulationParameters,
};
pub use error::{ConfigError, ConfigResult};
pub use solver::{
    AdvectionScheme, PpeMethod, PpeSettings, PreconditionerKind, PressureBoundaryMode,
    SingularStrategy, SolverSettings,
};
