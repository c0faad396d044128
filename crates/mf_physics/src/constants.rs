// crates/mf_physics/src/constants.rs

//! 物性、时间参数与派生常量
//!
//! 派生常量（间距倒数及其平方、ν = μ/ρ、dt/ρ 等）只计算一次，求解器
//! 状态进入 READY 之后不再改写。

use crate::error::{PhysicsError, PhysicsResult};
use crate::grid::Grid;
use mf_config::{FluidPropertiesConfig, SimulationParameters};
use serde::Serialize;

/// 流体物性
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FluidProperties {
    /// 密度 ρ > 0
    pub density: f64,
    /// 动力黏度 μ ≥ 0
    pub viscosity: f64,
}

impl FluidProperties {
    /// 检查并构造
    pub fn new(density: f64, viscosity: f64) -> PhysicsResult<Self> {
        if !(density.is_finite() && density > 0.0) {
            return Err(PhysicsError::config(format!("密度必须为正的有限值: {density}")));
        }
        if !(viscosity.is_finite() && viscosity >= 0.0) {
            return Err(PhysicsError::config(format!("黏度必须为非负有限值: {viscosity}")));
        }
        Ok(Self { density, viscosity })
    }

    /// 由输入文档构造
    pub fn from_config(config: &FluidPropertiesConfig) -> PhysicsResult<Self> {
        Self::new(config.density, config.viscosity)
    }

    /// 运动黏度 ν = μ/ρ
    #[inline]
    pub fn kinematic_viscosity(&self) -> f64 {
        self.viscosity / self.density
    }
}

/// 结束判定的相对余量（以 dt 计）
pub const END_TIME_SLACK: f64 = 1e-9;

/// 时间推进参数
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulationParams {
    /// 时间步长
    pub dt: f64,
    /// 结束时间
    pub t_end: f64,
    /// 快照输出间隔（步）
    pub output_interval: usize,
}

impl SimulationParams {
    /// 检查并构造
    pub fn new(dt: f64, t_end: f64, output_interval: usize) -> PhysicsResult<Self> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(PhysicsError::config(format!("时间步长必须为正的有限值: {dt}")));
        }
        if !(t_end.is_finite() && t_end > 0.0) {
            return Err(PhysicsError::config(format!("总时长必须为正的有限值: {t_end}")));
        }
        if output_interval == 0 {
            return Err(PhysicsError::config("输出间隔必须至少为 1"));
        }
        Ok(Self {
            dt,
            t_end,
            output_interval,
        })
    }

    /// 由输入文档构造
    pub fn from_config(config: &SimulationParameters) -> PhysicsResult<Self> {
        Self::new(config.time_step, config.total_time, config.output_interval)
    }

    /// `time` 是否已到达结束时间（`T_end − t ≤ 1e-9·dt`）
    #[inline]
    pub fn reached_end(&self, time: f64) -> bool {
        self.t_end - time <= END_TIME_SLACK * self.dt
    }

    /// 时间循环将执行的步数
    ///
    /// 与 [`reached_end`](Self::reached_end) 的判定一致：最后一步可以不足 dt。
    pub fn planned_steps(&self) -> usize {
        ((self.t_end / self.dt - END_TIME_SLACK).ceil() as usize).max(1)
    }
}

/// 派生常量
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedConstants {
    /// 1/dx, 1/dy, 1/dz
    pub inv_h: [f64; 3],
    /// 1/dx², 1/dy², 1/dz²
    pub inv_h2: [f64; 3],
    /// 密度
    pub rho: f64,
    /// 动力黏度
    pub mu: f64,
    /// 运动黏度
    pub nu: f64,
    /// 时间步长
    pub dt: f64,
    /// dt/ρ（校正步系数）
    pub dt_over_rho: f64,
    /// ρ/dt（泊松方程右端系数）
    pub rho_over_dt: f64,
}

impl DerivedConstants {
    /// 计算派生常量
    ///
    /// dt ≤ 0 或任一间距非有限时返回 `Config` 错误。
    pub fn new(grid: &Grid, props: &FluidProperties, dt: f64) -> PhysicsResult<Self> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(PhysicsError::config(format!("时间步长必须为正的有限值: {dt}")));
        }
        let h = grid.spacings();
        for (axis, &hs) in h.iter().enumerate() {
            if !(hs.is_finite() && hs > 0.0) {
                return Err(PhysicsError::config(format!(
                    "第 {axis} 轴网格间距无效: {hs}"
                )));
            }
        }

        let inv_h = h.map(|hs| 1.0 / hs);
        let inv_h2 = inv_h.map(|v| v * v);
        let nu = props.kinematic_viscosity();
        if !nu.is_finite() {
            return Err(PhysicsError::config(format!("运动黏度无效: {nu}")));
        }

        Ok(Self {
            inv_h,
            inv_h2,
            rho: props.density,
            mu: props.viscosity,
            nu,
            dt,
            dt_over_rho: dt / props.density,
            rho_over_dt: props.density / dt,
        })
    }

    /// Σ 1/h²
    pub fn sum_inv_h2(&self) -> f64 {
        self.inv_h2.iter().sum()
    }
}
