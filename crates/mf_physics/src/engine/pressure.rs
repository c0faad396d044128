// crates/mf_physics/src/engine/pressure.rs

//! 压力泊松方程求解
//!
//! 右端 `b = (ρ/dt)·D·u* − D·g_b`。在流体单元上求解约化系统：
//!
//! - 已知单元（固定的参考单元，或 `cell_dirichlet` 模式下贴开边界的单元）
//!   从未知量中去掉，耦合项移到右端；
//! - 系统取负号 `A = −Lp[U,U]`，对 CG 为对称正（半）定；
//! - 以上一步的压力为初值。
//!
//! 全 Neumann 时先减去 b 在流体单元上的均值，`zero_mean` 策略直接在相容的
//! 半正定系统上迭代，`pin_reference`（以及直接法）固定第一个流体单元；两种
//! 策略最后都把压力平移到零均值。
//!
//! 残差上限 `½·(ρ/dt)·rtol·√N_fluid` 保证求解器报告收敛时校正后的散度
//! 满足投影检查；固定参考单元时再除以 `1+√n`。

use crate::constants::DerivedConstants;
use crate::error::{PhysicsError, PhysicsResult};
use crate::numerics::linear_algebra::{
    norm2, BandCholesky, BiCgStabSolver, CholeskyError, CsrMatrix, IdentityPreconditioner,
    JacobiPreconditioner, PcgSolver, Preconditioner, SolverConfig, SolverResult,
    SolverStatus, SsorPreconditioner,
};
use crate::numerics::operators::Operators;
use mf_config::{PpeMethod, PpeSettings, PreconditionerKind, SingularStrategy};

/// 一次求解的摘要
#[derive(Debug, Clone, PartialEq)]
pub struct PpeReport {
    /// 迭代次数（直接法为 1）
    pub iterations: usize,
    /// 约化系统最终残差
    pub residual: f64,
    /// 有效容差
    pub tolerance: f64,
    /// 是否收敛
    pub converged: bool,
    /// 是否为全 Neumann
    pub singular: bool,
}

enum Backend {
    Pcg(PcgSolver),
    BiCgStab(BiCgStabSolver),
    Direct(BandCholesky),
}

/// PPE 求解器
///
/// 约化矩阵、预条件器与（直接法的）分解在构造时建立，之后每步复用。
pub struct PpeSolver {
    backend: Backend,
    preconditioner: Box<dyn Preconditioner>,
    config: SolverConfig,
    matrix: CsrMatrix,
    n_fluid: usize,
    connected: Vec<usize>,
    unknowns: Vec<usize>,
    known: Vec<(usize, f64)>,
    known_coupling: Vec<f64>,
    boundary_rhs: Vec<f64>,
    singular: bool,
    pinned: bool,
    rhs_full: Vec<f64>,
    rhs: Vec<f64>,
    x: Vec<f64>,
    residual: Vec<f64>,
    history: Vec<f64>,
}

impl std::fmt::Debug for PpeSolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PpeSolver")
            .field("method", &self.method_name())
            .field("preconditioner", &self.preconditioner.name())
            .field("unknowns", &self.unknowns.len())
            .field("sealed", &(self.n_fluid - self.connected.len()))
            .field("known", &self.known.len())
            .field("singular", &self.singular)
            .field("pinned", &self.pinned)
            .finish()
    }
}

impl PpeSolver {
    /// 建立约化系统与求解后端
    pub fn new(
        ops: &Operators,
        settings: &PpeSettings,
        consts: &DerivedConstants,
    ) -> PhysicsResult<Self> {
        let lp = &ops.ppe.matrix;
        let n_cells = lp.n_rows();
        let fluid = &ops.ppe.fluid_cells;
        let singular = ops.ppe.singular;

        // 六个面都是固体面的流体单元在 Lp 中是零行零列，不进入约化系统，压力取 0
        let connected: Vec<usize> = fluid
            .iter()
            .copied()
            .filter(|&c| lp.diagonal_value(c) != 0.0)
            .collect();
        if connected.len() < fluid.len() {
            log::warn!(
                "{} 个流体单元被固体完全包围，不参与压力求解",
                fluid.len() - connected.len()
            );
        }

        let pinned = singular
            && (settings.singular_strategy == SingularStrategy::PinReference
                || settings.method == PpeMethod::Direct);
        let known: Vec<(usize, f64)> = if pinned {
            connected.first().map(|&c| vec![(c, 0.0)]).unwrap_or_default()
        } else {
            ops.ppe.dirichlet_cells.clone()
        };

        let mut is_known = vec![false; n_cells];
        let mut known_values = vec![0.0; n_cells];
        for &(cell, value) in &known {
            is_known[cell] = true;
            known_values[cell] = value;
        }
        let unknowns: Vec<usize> = connected.iter().copied().filter(|&c| !is_known[c]).collect();

        let mut matrix = lp.principal_submatrix(&unknowns);
        matrix.scale(-1.0);

        let mut known_coupling = vec![0.0; n_cells];
        lp.mul_vec(&known_values, &mut known_coupling);

        let mut boundary_rhs = vec![0.0; n_cells];
        ops.divergence.mul_vec(&ops.gradient.bias, &mut boundary_rhs);

        let n = unknowns.len();
        let mut ceiling = 0.5 * consts.rho_over_dt * settings.rtol * (fluid.len() as f64).sqrt();
        if pinned {
            ceiling /= 1.0 + (n as f64).sqrt();
        }
        let mut config = SolverConfig::new(settings.rtol, settings.max_iterations)
            .with_atol(settings.atol)
            .with_residual_ceiling(ceiling);
        if settings.verbose {
            config = config.verbose();
        }

        let preconditioner: Box<dyn Preconditioner> = match settings.preconditioner {
            PreconditionerKind::None => Box::new(IdentityPreconditioner),
            PreconditionerKind::Jacobi => Box::new(JacobiPreconditioner::from_matrix(&matrix)),
            PreconditionerKind::Ssor => {
                Box::new(SsorPreconditioner::from_matrix(&matrix, settings.ssor_omega))
            }
        };

        let backend = match settings.method {
            PpeMethod::Pcg => Backend::Pcg(PcgSolver::new(config.clone())),
            PpeMethod::Bicgstab => Backend::BiCgStab(BiCgStabSolver::new(config.clone())),
            PpeMethod::Direct => {
                let factor = BandCholesky::factor(&matrix).map_err(|e| match e {
                    CholeskyError::TooLarge { .. } => PhysicsError::config(format!(
                        "直接法不适用于该规模: {e}；请改用 solver_settings.ppe.method = \"pcg\""
                    )),
                    other => PhysicsError::config(format!("PPE 矩阵分解失败: {other}")),
                })?;
                log::debug!(
                    "PPE 带状 Cholesky: n = {}, 半带宽 = {}",
                    factor.n(),
                    factor.bandwidth()
                );
                Backend::Direct(factor)
            }
        };

        let solver = Self {
            backend,
            preconditioner,
            config,
            matrix,
            n_fluid: fluid.len(),
            connected,
            unknowns,
            known,
            known_coupling,
            boundary_rhs,
            singular,
            pinned,
            rhs_full: vec![0.0; n_cells],
            rhs: vec![0.0; n],
            x: vec![0.0; n],
            residual: vec![0.0; n],
            history: Vec::new(),
        };
        log::debug!("{solver:?}");
        Ok(solver)
    }

    fn method_name(&self) -> &'static str {
        match self.backend {
            Backend::Pcg(_) => "pcg",
            Backend::BiCgStab(_) => "bicgstab",
            Backend::Direct(_) => "direct",
        }
    }

    /// 全 Neumann
    #[inline]
    pub fn is_singular(&self) -> bool {
        self.singular
    }

    /// 未知量个数
    #[inline]
    pub fn n_unknowns(&self) -> usize {
        self.unknowns.len()
    }

    /// 最近一次求解的残差历史（第 0 项为初始残差）
    pub fn residual_history(&self) -> &[f64] {
        &self.history
    }

    /// 求解 Lp·p = b
    ///
    /// `p` 输入上一步压力（初值），输出新压力；固体单元写 0。
    pub fn solve(
        &mut self,
        ops: &Operators,
        consts: &DerivedConstants,
        u_star: &[f64],
        p: &mut [f64],
    ) -> PhysicsResult<PpeReport> {
        ops.divergence.mul_vec(u_star, &mut self.rhs_full);
        for (b, &gb) in self.rhs_full.iter_mut().zip(&self.boundary_rhs) {
            *b = consts.rho_over_dt * *b - gb;
        }

        if self.singular && !self.connected.is_empty() {
            let mean = self.connected.iter().map(|&c| self.rhs_full[c]).sum::<f64>()
                / self.connected.len() as f64;
            for &c in &self.connected {
                self.rhs_full[c] -= mean;
            }
        }

        for (r, &cell) in self.unknowns.iter().enumerate() {
            self.rhs[r] = -(self.rhs_full[cell] - self.known_coupling[cell]);
            self.x[r] = p[cell];
        }

        let result = if self.unknowns.is_empty() {
            self.history.clear();
            self.history.push(0.0);
            SolverResult {
                status: SolverStatus::Converged,
                iterations: 0,
                residual_norm: 0.0,
                initial_residual_norm: 0.0,
                tolerance: 0.0,
            }
        } else {
            self.run_backend()
        };

        if !result.is_converged() {
            return Err(PhysicsError::LinearSolve {
                iterations: result.iterations,
                residual: result.residual_norm,
                tolerance: result.tolerance,
                history: self.history.clone(),
            });
        }

        p.fill(0.0);
        for (r, &cell) in self.unknowns.iter().enumerate() {
            p[cell] = self.x[r];
        }
        for &(cell, value) in &self.known {
            p[cell] = value;
        }
        let connected = &self.connected;
        if self.singular && !connected.is_empty() {
            let mean = connected.iter().map(|&c| p[c]).sum::<f64>() / connected.len() as f64;
            for &c in connected {
                p[c] -= mean;
            }
        }

        Ok(PpeReport {
            iterations: result.iterations,
            residual: result.residual_norm,
            tolerance: result.tolerance,
            converged: true,
            singular: self.singular,
        })
    }

    fn run_backend(&mut self) -> SolverResult {
        match &mut self.backend {
            Backend::Pcg(solver) => {
                let result =
                    solver.solve(&self.matrix, &self.rhs, &mut self.x, self.preconditioner.as_ref());
                self.history.clear();
                self.history.extend_from_slice(solver.residual_history());
                result
            }
            Backend::BiCgStab(solver) => {
                let result =
                    solver.solve(&self.matrix, &self.rhs, &mut self.x, self.preconditioner.as_ref());
                self.history.clear();
                self.history.extend_from_slice(solver.residual_history());
                result
            }
            Backend::Direct(factor) => {
                let tolerance = self.config.effective_tolerance(norm2(&self.rhs));
                self.matrix.mul_vec(&self.x, &mut self.residual);
                let initial = residual_norm(&self.rhs, &mut self.residual);

                factor.solve(&self.rhs, &mut self.x);
                self.matrix.mul_vec(&self.x, &mut self.residual);
                let fin = residual_norm(&self.rhs, &mut self.residual);

                self.history.clear();
                self.history.extend_from_slice(&[initial, fin]);
                let status = if fin <= tolerance {
                    SolverStatus::Converged
                } else {
                    SolverStatus::Diverged
                };
                SolverResult {
                    status,
                    iterations: 1,
                    residual_norm: fin,
                    initial_residual_norm: initial,
                    tolerance,
                }
            }
        }
    }
}

/// ‖b − Ax‖，`ax` 输入 A·x，计算后被覆盖为残差
fn residual_norm(b: &[f64], ax: &mut [f64]) -> f64 {
    for (r, &bi) in ax.iter_mut().zip(b) {
        *r = bi - *r;
    }
    norm2(ax)
}
