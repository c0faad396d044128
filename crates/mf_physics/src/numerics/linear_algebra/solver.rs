// crates/mf_physics/src/numerics/linear_algebra/solver.rs

//! 迭代线性求解器
//!
//! 用于求解压力泊松方程的约化系统 Ax = b：
//!
//! - [`PcgSolver`]: 预条件共轭梯度法，要求 A 对称正定（或在值域内相容的半正定）
//! - [`BiCgStabSolver`]: 双共轭梯度稳定法，不要求对称
//!
//! 每次求解都会记录残差历史（第 0 项为初始残差），未收敛时由调用方随错误一起上报。
//!
//! # 使用示例
//!
//! ```
//! use mf_physics::numerics::linear_algebra::{
//!     CsrBuilder, JacobiPreconditioner, PcgSolver, SolverConfig,
//! };
//!
//! let mut builder = CsrBuilder::new_square(3);
//! for i in 0..3 {
//!     builder.set(i, i, 2.0);
//! }
//! let matrix = builder.build();
//! let precond = JacobiPreconditioner::from_matrix(&matrix);
//!
//! let mut solver = PcgSolver::new(SolverConfig::new(1e-10, 50));
//! let mut x = vec![0.0; 3];
//! let result = solver.solve(&matrix, &[2.0, 4.0, 6.0], &mut x, &precond);
//! assert!(result.is_converged());
//! assert!((x[2] - 3.0).abs() < 1e-9);
//! ```

use super::csr::CsrMatrix;
use super::preconditioner::Preconditioner;
use super::vector_ops::{axpy, copy, dot, norm2};
use serde::{Deserialize, Serialize};

/// 内积低于该值视为算法崩溃
const BREAKDOWN_TOL: f64 = 1e-300;

/// 残差增长超过初始值的该倍数视为发散
const DIVERGENCE_FACTOR: f64 = 1e8;

/// 求解器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// 相对收敛容差（相对于 ‖b‖）
    pub rtol: f64,
    /// 绝对收敛容差
    pub atol: f64,
    /// 最大迭代次数
    pub max_iter: usize,
    /// 是否输出逐次迭代残差
    pub verbose: bool,
    /// 容差上限：有效容差不超过该值（不低于 atol）
    pub residual_ceiling: Option<f64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            rtol: 1e-6,
            atol: 1e-12,
            max_iter: 1000,
            verbose: false,
            residual_ceiling: None,
        }
    }
}

impl SolverConfig {
    /// 创建求解器配置
    pub fn new(rtol: f64, max_iter: usize) -> Self {
        Self {
            rtol,
            max_iter,
            ..Default::default()
        }
    }

    /// 设置绝对容差
    pub fn with_atol(mut self, atol: f64) -> Self {
        self.atol = atol;
        self
    }

    /// 设置容差上限
    pub fn with_residual_ceiling(mut self, ceiling: f64) -> Self {
        self.residual_ceiling = Some(ceiling);
        self
    }

    /// 启用详细输出
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    /// 有效容差 max(atol, min(rtol·‖b‖, ceiling))
    pub fn effective_tolerance(&self, b_norm: f64) -> f64 {
        let relative = self.rtol * b_norm;
        let capped = match self.residual_ceiling {
            Some(ceiling) => relative.min(ceiling),
            None => relative,
        };
        self.atol.max(capped)
    }
}

/// 求解器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverStatus {
    /// 收敛
    Converged,
    /// 达到最大迭代次数
    MaxIterationsReached,
    /// 发散
    Diverged,
    /// 停滞（内积崩溃）
    Stagnated,
}

/// 求解器结果
#[derive(Debug, Clone)]
pub struct SolverResult {
    /// 求解状态
    pub status: SolverStatus,
    /// 迭代次数
    pub iterations: usize,
    /// 最终残差范数
    pub residual_norm: f64,
    /// 初始残差范数
    pub initial_residual_norm: f64,
    /// 本次使用的有效容差
    pub tolerance: f64,
}

impl SolverResult {
    /// 是否成功收敛
    pub fn is_converged(&self) -> bool {
        self.status == SolverStatus::Converged
    }

    /// 相对初始残差的比值
    pub fn relative_residual(&self) -> f64 {
        if self.initial_residual_norm > 0.0 {
            self.residual_norm / self.initial_residual_norm
        } else {
            0.0
        }
    }
}

/// 预条件共轭梯度法
///
/// 工作向量在多次求解间复用，只在规模变化时重新分配。
#[derive(Debug, Clone)]
pub struct PcgSolver {
    config: SolverConfig,
    r: Vec<f64>,
    z: Vec<f64>,
    p: Vec<f64>,
    ap: Vec<f64>,
    history: Vec<f64>,
}

impl PcgSolver {
    /// 创建 PCG 求解器
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            r: Vec::new(),
            z: Vec::new(),
            p: Vec::new(),
            ap: Vec::new(),
            history: Vec::new(),
        }
    }

    /// 配置
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// 最近一次求解的残差历史
    pub fn residual_history(&self) -> &[f64] {
        &self.history
    }

    fn ensure_workspace(&mut self, n: usize) {
        if self.r.len() != n {
            self.r = vec![0.0; n];
            self.z = vec![0.0; n];
            self.p = vec![0.0; n];
            self.ap = vec![0.0; n];
        }
    }

    /// 求解 Ax = b，`x` 输入初值、输出解
    pub fn solve<P: Preconditioner + ?Sized>(
        &mut self,
        matrix: &CsrMatrix,
        b: &[f64],
        x: &mut [f64],
        precond: &P,
    ) -> SolverResult {
        let n = b.len();
        self.ensure_workspace(n);
        self.history.clear();

        let tol = self.config.effective_tolerance(norm2(b));

        // r = b - A*x
        matrix.mul_vec(x, &mut self.r);
        for (ri, &bi) in self.r.iter_mut().zip(b.iter()) {
            *ri = bi - *ri;
        }

        let initial_norm = norm2(&self.r);
        self.history.push(initial_norm);
        let finish = |status, iterations, residual_norm| SolverResult {
            status,
            iterations,
            residual_norm,
            initial_residual_norm: initial_norm,
            tolerance: tol,
        };

        if initial_norm <= tol {
            return finish(SolverStatus::Converged, 0, initial_norm);
        }

        precond.apply(&self.r, &mut self.z);
        copy(&self.z, &mut self.p);
        let mut rz = dot(&self.r, &self.z);

        for iter in 0..self.config.max_iter {
            matrix.mul_vec(&self.p, &mut self.ap);

            let pap = dot(&self.p, &self.ap);
            if !(pap.abs() > BREAKDOWN_TOL) {
                let res = norm2(&self.r);
                return finish(SolverStatus::Stagnated, iter, res);
            }
            let alpha = rz / pap;

            axpy(alpha, &self.p, x);
            axpy(-alpha, &self.ap, &mut self.r);

            let res_norm = norm2(&self.r);
            self.history.push(res_norm);
            if self.config.verbose {
                log::trace!("PCG iter {}: residual = {:.6e}", iter + 1, res_norm);
            }

            if res_norm <= tol {
                return finish(SolverStatus::Converged, iter + 1, res_norm);
            }
            if !res_norm.is_finite() || res_norm > initial_norm * DIVERGENCE_FACTOR {
                return finish(SolverStatus::Diverged, iter + 1, res_norm);
            }

            precond.apply(&self.r, &mut self.z);
            let rz_new = dot(&self.r, &self.z);
            let beta = rz_new / rz;
            rz = rz_new;

            // p = z + beta * p
            for (pi, &zi) in self.p.iter_mut().zip(self.z.iter()) {
                *pi = zi + beta * *pi;
            }
        }

        let res = norm2(&self.r);
        finish(SolverStatus::MaxIterationsReached, self.config.max_iter, res)
    }
}

/// BiCGStab 求解器
#[derive(Debug, Clone)]
pub struct BiCgStabSolver {
    config: SolverConfig,
    r: Vec<f64>,
    r0: Vec<f64>,
    p: Vec<f64>,
    v: Vec<f64>,
    s: Vec<f64>,
    t: Vec<f64>,
    p_hat: Vec<f64>,
    s_hat: Vec<f64>,
    history: Vec<f64>,
}

impl BiCgStabSolver {
    /// 创建 BiCGStab 求解器
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            r: Vec::new(),
            r0: Vec::new(),
            p: Vec::new(),
            v: Vec::new(),
            s: Vec::new(),
            t: Vec::new(),
            p_hat: Vec::new(),
            s_hat: Vec::new(),
            history: Vec::new(),
        }
    }

    /// 配置
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// 最近一次求解的残差历史
    pub fn residual_history(&self) -> &[f64] {
        &self.history
    }

    fn ensure_workspace(&mut self, n: usize) {
        if self.r.len() != n {
            for v in [
                &mut self.r,
                &mut self.r0,
                &mut self.p,
                &mut self.v,
                &mut self.s,
                &mut self.t,
                &mut self.p_hat,
                &mut self.s_hat,
            ] {
                *v = vec![0.0; n];
            }
        }
    }

    /// 求解 Ax = b，`x` 输入初值、输出解
    pub fn solve<P: Preconditioner + ?Sized>(
        &mut self,
        matrix: &CsrMatrix,
        b: &[f64],
        x: &mut [f64],
        precond: &P,
    ) -> SolverResult {
        let n = b.len();
        self.ensure_workspace(n);
        self.history.clear();

        let tol = self.config.effective_tolerance(norm2(b));

        matrix.mul_vec(x, &mut self.r);
        for (ri, &bi) in self.r.iter_mut().zip(b.iter()) {
            *ri = bi - *ri;
        }

        let initial_norm = norm2(&self.r);
        self.history.push(initial_norm);
        let finish = |status, iterations, residual_norm| SolverResult {
            status,
            iterations,
            residual_norm,
            initial_residual_norm: initial_norm,
            tolerance: tol,
        };

        if initial_norm <= tol {
            return finish(SolverStatus::Converged, 0, initial_norm);
        }

        // 影子残差固定为初始残差
        copy(&self.r, &mut self.r0);
        self.p.fill(0.0);
        self.v.fill(0.0);

        let mut rho_old = 1.0;
        let mut alpha = 1.0;
        let mut omega = 1.0;

        for iter in 0..self.config.max_iter {
            let rho = dot(&self.r0, &self.r);
            if !(rho.abs() > BREAKDOWN_TOL) {
                let res = norm2(&self.r);
                return finish(SolverStatus::Stagnated, iter, res);
            }

            let beta = if iter == 0 {
                0.0
            } else {
                (rho / rho_old) * (alpha / omega)
            };
            rho_old = rho;

            // p = r + beta * (p - omega * v)
            for i in 0..n {
                self.p[i] = self.r[i] + beta * (self.p[i] - omega * self.v[i]);
            }

            precond.apply(&self.p, &mut self.p_hat);
            matrix.mul_vec(&self.p_hat, &mut self.v);

            let r0v = dot(&self.r0, &self.v);
            if !(r0v.abs() > BREAKDOWN_TOL) {
                let res = norm2(&self.r);
                return finish(SolverStatus::Stagnated, iter, res);
            }
            alpha = rho / r0v;

            // s = r - alpha * v
            for i in 0..n {
                self.s[i] = self.r[i] - alpha * self.v[i];
            }

            let s_norm = norm2(&self.s);
            if s_norm <= tol {
                axpy(alpha, &self.p_hat, x);
                self.history.push(s_norm);
                return finish(SolverStatus::Converged, iter + 1, s_norm);
            }

            precond.apply(&self.s, &mut self.s_hat);
            matrix.mul_vec(&self.s_hat, &mut self.t);

            let tt = dot(&self.t, &self.t);
            omega = if tt > BREAKDOWN_TOL {
                dot(&self.t, &self.s) / tt
            } else {
                0.0
            };

            // x = x + alpha * p_hat + omega * s_hat
            axpy(alpha, &self.p_hat, x);
            axpy(omega, &self.s_hat, x);

            // r = s - omega * t
            for i in 0..n {
                self.r[i] = self.s[i] - omega * self.t[i];
            }

            let res_norm = norm2(&self.r);
            self.history.push(res_norm);
            if self.config.verbose {
                log::trace!("BiCGStab iter {}: residual = {:.6e}", iter + 1, res_norm);
            }

            if res_norm <= tol {
                return finish(SolverStatus::Converged, iter + 1, res_norm);
            }
            if !res_norm.is_finite() || res_norm > initial_norm * DIVERGENCE_FACTOR {
                return finish(SolverStatus::Diverged, iter + 1, res_norm);
            }
            if !(omega.abs() > BREAKDOWN_TOL) {
                return finish(SolverStatus::Stagnated, iter + 1, res_norm);
            }
        }

        let res = norm2(&self.r);
        finish(SolverStatus::MaxIterationsReached, self.config.max_iter, res)
    }
}
