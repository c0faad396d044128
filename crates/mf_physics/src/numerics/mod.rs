// crates/mf_physics/src/numerics/mod.rs

//! 数值方法模块
//!
//! 包含：
//! - linear_algebra/ - 稀疏线性代数 (CSR, PCG, BiCGStab, 带状 Cholesky)
//! - operators/ - MAC 网格离散算子 (散度、梯度、拉普拉斯、对流、PPE)

pub mod linear_algebra;
pub mod operators;

pub use linear_algebra::{
    BandCholesky, BiCgStabSolver, CsrBuilder, CsrMatrix, PcgSolver, Preconditioner,
    SolverConfig, SolverResult, SolverStatus,
};
pub use operators::{OperatorBuilder, Operators};
