// crates/mf_physics/src/engine/state.rs

//! 求解器状态
//!
//! 单一聚合体，由时间循环独占。`new` 只做校验与分配（INIT），
//! `prepare` 构建派生常量、算子与 PPE 缓存（READY），`step` 执行一步：
//!
//! ```text
//! BC → CFL(入) → 预测 → PPE → 校正 → BC → 投影检查 → 推进 t → CFL(出)
//! ```
//!
//! 状态机：INIT → READY → RUNNING → {DONE, FAILED, STOPPED}。

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::corrector::{check_projection, Corrector};
use super::diagnostics::{
    cfl_estimate, cfl_velocity, check_cfl, max_velocity_magnitude, DiagnosticsRecord,
    FailureRecord,
};
use super::predictor::Predictor;
use super::pressure::PpeSolver;
use crate::boundary::{BoundaryApplier, BoundaryTable};
use crate::constants::{DerivedConstants, FluidProperties, SimulationParams};
use crate::error::{PhysicsError, PhysicsResult};
use crate::fields::StaggeredFields;
use crate::grid::Grid;
use crate::mask::GeometryMask;
use crate::numerics::linear_algebra::norm_inf;
use crate::numerics::operators::{check_central_stability, OperatorBuilder, Operators};
use mf_config::{AdvectionScheme, CaseConfig, SolverSettings};

/// 模拟阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SimulationPhase {
    /// 已分配，未构建算子
    Init,
    /// 算子就绪
    Ready,
    /// 时间推进中
    Running,
    /// 到达结束时间
    Done,
    /// 失败（终态）
    Failed,
    /// 被停止标志中断（终态）
    Stopped,
}

impl SimulationPhase {
    /// 是否为终态
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Stopped)
    }
}

impl std::fmt::Display for SimulationPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Init => "INIT",
            Self::Ready => "READY",
            Self::Running => "RUNNING",
            Self::Done => "DONE",
            Self::Failed => "FAILED",
            Self::Stopped => "STOPPED",
        };
        f.write_str(name)
    }
}

/// 求解器状态
#[derive(Debug)]
pub struct SolverState {
    grid: Grid,
    mask: GeometryMask,
    props: FluidProperties,
    params: SimulationParams,
    table: BoundaryTable,
    force: [f64; 3],
    settings: SolverSettings,
    fields: StaggeredFields,

    consts: Option<DerivedConstants>,
    operators: Option<Arc<Operators>>,
    ppe: Option<PpeSolver>,
    predictor: Predictor,
    corrector: Corrector,

    diagnostics: DiagnosticsRecord,
    step: usize,
    time: f64,
    phase: SimulationPhase,
    ready_for_time_loop: bool,
}

impl SolverState {
    /// 由输入文档校验并分配，处于 INIT
    ///
    /// 几何不一致返回 `InvalidGeometry`，物性或时间参数无效返回 `Config`。
    /// 文档的模式检查由调用方在此之前完成。
    pub fn new(config: &CaseConfig) -> PhysicsResult<Self> {
        let grid = Grid::from_domain(&config.domain_definition)?;
        let mask = GeometryMask::from_definition(
            config.geometry_definition.as_ref(),
            grid.cell_dims(),
        )?;
        let props = FluidProperties::from_config(&config.fluid_properties)?;
        let params = SimulationParams::from_config(&config.simulation_parameters)?;
        let table = BoundaryTable::from_records(&config.boundary_conditions)?;

        let mut fields = StaggeredFields::zeros(&grid, mask.order());
        let ic = &config.initial_conditions;
        fields.fill_uniform(ic.initial_velocity, ic.initial_pressure);

        let n_velocity = fields.n_velocity();
        let n_cells = grid.n_cells();
        log::debug!(
            "状态已分配: {}×{}×{} 单元, {} 个流体单元, {} 个速度自由度",
            grid.nx(),
            grid.ny(),
            grid.nz(),
            mask.n_fluid(),
            n_velocity
        );

        Ok(Self {
            grid,
            mask,
            props,
            params,
            table,
            force: config.external_forces.force_vector,
            settings: config.solver_settings.clone(),
            fields,
            consts: None,
            operators: None,
            ppe: None,
            predictor: Predictor::new(n_velocity),
            corrector: Corrector::new(n_velocity, n_cells),
            diagnostics: DiagnosticsRecord::default(),
            step: 0,
            time: 0.0,
            phase: SimulationPhase::Init,
            ready_for_time_loop: false,
        })
    }

    /// 构建常量、算子与 PPE 缓存，INIT → READY
    ///
    /// 已经离开 INIT 的状态上调用不做任何修改。
    pub fn prepare(&mut self) -> PhysicsResult<()> {
        if self.phase != SimulationPhase::Init {
            return Ok(());
        }

        let consts = DerivedConstants::new(&self.grid, &self.props, self.params.dt)?;
        let ops = OperatorBuilder::new(&self.grid, &self.mask, &self.table, &consts)
            .with_advection(self.settings.advection)
            .with_pressure_mode(self.settings.ppe.pressure_boundary)
            .build()?;

        if self.settings.advection == AdvectionScheme::Central {
            let max_speed = norm_inf(self.fields.velocity());
            check_central_stability(max_speed, self.grid.spacings(), consts.nu, consts.dt)
                .map_err(|reason| {
                    PhysicsError::config(format!("中心对流格式在初始状态下不稳定: {reason}"))
                })?;
        }

        let ppe = PpeSolver::new(&ops, &self.settings.ppe, &consts)?;

        BoundaryApplier::new(&self.table, &ops.faces).apply(&mut self.fields);
        for cell in 0..self.grid.n_cells() {
            if !self.mask.is_fluid_at(cell) {
                self.fields.pressure_mut()[cell] = 0.0;
            }
        }

        self.diagnostics.ppe_singularity_detected = ops.ppe_is_singular();
        self.diagnostics.max_velocity_magnitude = max_velocity_magnitude(&self.fields, &self.mask);
        self.diagnostics.cfl_advection_estimate = cfl_estimate(
            cfl_velocity(&self.fields, &self.mask),
            consts.dt,
            self.grid.min_spacing(),
        );

        log::debug!(
            "算子就绪: PPE {}，{} 个未知量",
            if ops.ppe_is_singular() { "奇异" } else { "非奇异" },
            ppe.n_unknowns()
        );

        self.consts = Some(consts);
        self.operators = Some(Arc::new(ops));
        self.ppe = Some(ppe);
        self.phase = SimulationPhase::Ready;
        self.ready_for_time_loop = true;
        Ok(())
    }

    /// 推进一步
    pub fn step(&mut self) -> PhysicsResult<()> {
        if !matches!(self.phase, SimulationPhase::Ready | SimulationPhase::Running) {
            return Err(PhysicsError::state(format!(
                "当前阶段 {} 不能推进",
                self.phase
            )));
        }
        let (Some(consts), Some(ops)) = (self.consts, self.operators.clone()) else {
            return Err(PhysicsError::state("算子尚未构建"));
        };
        let Some(ppe) = self.ppe.as_mut() else {
            return Err(PhysicsError::state("PPE 求解器尚未构建"));
        };
        self.phase = SimulationPhase::Running;

        let applier = BoundaryApplier::new(&self.table, &ops.faces);
        applier.apply(&mut self.fields);

        let min_h = self.grid.min_spacing();
        let cfl_v = cfl_velocity(&self.fields, &self.mask);
        check_cfl(cfl_estimate(cfl_v, consts.dt, min_h), self.step, self.time)?;

        let mut scheme = self.settings.advection;
        let mut fallback = false;
        if scheme == AdvectionScheme::Central {
            let max_speed = norm_inf(self.fields.velocity());
            if let Err(reason) =
                check_central_stability(max_speed, self.grid.spacings(), consts.nu, consts.dt)
            {
                log::warn!("第 {} 步中心格式不稳定（{reason}），本步改用迎风", self.step);
                scheme = AdvectionScheme::Upwind;
                fallback = true;
            }
        }

        self.predictor
            .predict(&mut self.fields, &ops, &consts, self.force, scheme);
        let pre = self.corrector.divergence_norm(&ops, self.fields.velocity());

        let (velocity, pressure) = self.fields.split_mut();
        let report = ppe.solve(&ops, &consts, velocity, pressure)?;

        self.corrector.correct(&mut self.fields, &ops, &consts);
        applier.apply(&mut self.fields);

        let post = self.corrector.divergence_norm(&ops, self.fields.velocity());
        check_projection(post, self.settings.projection_tolerance())?;

        let max_v = max_velocity_magnitude(&self.fields, &self.mask);
        let cfl = cfl_estimate(cfl_velocity(&self.fields, &self.mask), consts.dt, min_h);
        self.diagnostics = DiagnosticsRecord {
            divergence_norm: post,
            pre_correction_divergence_norm: pre,
            max_velocity_magnitude: max_v,
            cfl_advection_estimate: cfl,
            ppe_iterations: report.iterations,
            ppe_residual: report.residual,
            ppe_converged: report.converged,
            ppe_singularity_detected: report.singular,
            advection_fallback: fallback,
            failure: None,
        };

        self.step += 1;
        self.time += consts.dt;
        if self.params.reached_end(self.time) {
            self.time = self.params.t_end;
            self.phase = SimulationPhase::Done;
            self.ready_for_time_loop = false;
        }

        log::debug!(
            "step {:>5} t = {:.6} | div {:.3e} → {:.3e} | PPE {} 次, 残差 {:.3e} | CFL {:.3}",
            self.step,
            self.time,
            pre,
            post,
            report.iterations,
            report.residual,
            cfl
        );

        check_cfl(cfl, self.step, self.time)
    }

    /// 记录失败并进入 FAILED
    pub fn mark_failed(&mut self, error: &PhysicsError) {
        self.diagnostics.failure = Some(FailureRecord::from_error(error, self.step, self.time));
        self.phase = SimulationPhase::Failed;
        self.ready_for_time_loop = false;
    }

    /// 被停止标志中断
    pub fn mark_stopped(&mut self) {
        if !self.phase.is_terminal() {
            self.phase = SimulationPhase::Stopped;
        }
        self.ready_for_time_loop = false;
    }

    /// 是否已到达结束时间
    pub fn is_finished(&self) -> bool {
        self.phase == SimulationPhase::Done
    }

    /// 网格
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// 几何掩码
    pub fn mask(&self) -> &GeometryMask {
        &self.mask
    }

    /// 流体物性
    pub fn props(&self) -> &FluidProperties {
        &self.props
    }

    /// 时间推进参数
    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// 边界条件表
    pub fn boundary_table(&self) -> &BoundaryTable {
        &self.table
    }

    /// 数值设置
    pub fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    /// 场
    pub fn fields(&self) -> &StaggeredFields {
        &self.fields
    }

    /// 可变场（用于构造测试初值）
    pub fn fields_mut(&mut self) -> &mut StaggeredFields {
        &mut self.fields
    }

    /// 派生常量（READY 之后可用）
    pub fn constants(&self) -> Option<&DerivedConstants> {
        self.consts.as_ref()
    }

    /// 算子（READY 之后可用）
    pub fn operators(&self) -> Option<&Operators> {
        self.operators.as_deref()
    }

    /// PPE 是否为全 Neumann（READY 之后可用）
    pub fn ppe_is_singular(&self) -> Option<bool> {
        self.operators.as_ref().map(|ops| ops.ppe_is_singular())
    }

    /// 最近一次 PPE 求解的残差历史
    pub fn ppe_residual_history(&self) -> &[f64] {
        self.ppe.as_ref().map(|p| p.residual_history()).unwrap_or(&[])
    }

    /// 诊断记录
    pub fn diagnostics(&self) -> &DiagnosticsRecord {
        &self.diagnostics
    }

    /// 已完成步数
    pub fn step_index(&self) -> usize {
        self.step
    }

    /// 当前时间
    pub fn time(&self) -> f64 {
        self.time
    }

    /// 当前阶段
    pub fn phase(&self) -> SimulationPhase {
        self.phase
    }

    /// 是否可以继续推进
    pub fn ready_for_time_loop(&self) -> bool {
        self.ready_for_time_loop
    }
}
