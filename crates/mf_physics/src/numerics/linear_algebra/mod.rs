// crates/mf_physics/src/numerics/linear_algebra/mod.rs

//! 稀疏线性代数
//!
//! 离散算子的存储格式与压力泊松方程的求解器：
//!
//! - [`csr`]: CSR 矩阵、构建器、稀疏乘积与拼接
//! - [`vector_ops`]: BLAS Level 1 风格的向量运算
//! - [`preconditioner`]: Identity / Jacobi / SSOR
//! - [`solver`]: PCG 与 BiCGStab（带残差历史）
//! - [`cholesky`]: 带状 Cholesky 直接分解

pub mod cholesky;
pub mod csr;
pub mod preconditioner;
pub mod solver;
pub mod vector_ops;

pub use cholesky::{BandCholesky, CholeskyError};
pub use csr::{CsrBuilder, CsrMatrix, CsrPattern, RowView};
pub use preconditioner::{
    IdentityPreconditioner, JacobiPreconditioner, Preconditioner, SsorPreconditioner,
};
pub use solver::{BiCgStabSolver, PcgSolver, SolverConfig, SolverResult, SolverStatus};
pub use vector_ops::{axpy, copy, dot, mean, norm2, norm_inf, remove_mean, scale, xpay};
