// crates/mf_physics/src/numerics/operators/mod.rs

//! 交错网格上的离散算子
//!
//! - [`divergence`]: 散度 D
//! - [`gradient`]: 仿射压力梯度 G·p + g_b
//! - [`laplacian`]: 各速度分量的拉普拉斯（边界规则折叠进系数）
//! - [`advection`]: 无矩阵的对流项与中心格式稳定性检查
//! - [`ppe`]: 压力泊松矩阵 Lp = D·G
//! - [`builder`]: 一次性装配全部算子
//!
//! 所有算子都是二阶中心差分（对流默认一阶迎风）。

pub mod advection;
pub mod builder;
pub mod divergence;
pub mod gradient;
pub mod laplacian;
pub mod ppe;

pub use advection::{advection_term, check_central_stability};
pub use builder::{OperatorBuilder, Operators};
pub use divergence::{build_divergence, rms_over};
pub use gradient::GradientOperator;
pub use laplacian::ComponentLaplacian;
pub use ppe::PpeOperator;
