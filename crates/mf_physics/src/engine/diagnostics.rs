// crates/mf_physics/src/engine/diagnostics.rs

//! 每步诊断量
//!
//! - 散度范数（校正前后）
//! - 单元中心速度模的最大值与 CFL 估计（CFL 同时看面上速度分量）
//! - PPE 迭代次数、残差、是否收敛、是否奇异
//! - 失败记录（若有）

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{PhysicsError, PhysicsResult};
use crate::fields::{Component, StaggeredFields};
use crate::mask::GeometryMask;
use glam::DVec3;
use mf_foundation::FailureKind;
use serde::Serialize;

/// 失败记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureRecord {
    /// 失败分类
    pub kind: FailureKind,
    /// 错误说明
    pub message: String,
    /// 失败时的步数
    pub step: usize,
    /// 失败时的时间
    pub time: f64,
}

impl FailureRecord {
    /// 由错误与位置构造
    pub fn from_error(error: &PhysicsError, step: usize, time: f64) -> Self {
        let (step, time) = match error {
            PhysicsError::CflViolation { step, time, .. } => (*step, *time),
            _ => (step, time),
        };
        Self {
            kind: error.kind(),
            message: error.to_string(),
            step,
            time,
        }
    }
}

/// 诊断记录
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DiagnosticsRecord {
    /// 校正后 ‖D·u‖₂ / √N
    pub divergence_norm: f64,
    /// 校正前 ‖D·u*‖₂ / √N
    pub pre_correction_divergence_norm: f64,
    /// 单元中心速度模的最大值
    pub max_velocity_magnitude: f64,
    /// max|u|·dt / min(h)
    pub cfl_advection_estimate: f64,
    /// PPE 迭代次数
    pub ppe_iterations: usize,
    /// PPE 最终残差
    pub ppe_residual: f64,
    /// PPE 是否收敛
    pub ppe_converged: bool,
    /// PPE 是否为全 Neumann（奇异）
    pub ppe_singularity_detected: bool,
    /// 本步是否由中心格式回退到迎风
    pub advection_fallback: bool,
    /// 失败记录
    pub failure: Option<FailureRecord>,
}

/// 流体单元中心速度模的最大值
///
/// 单元中心速度取相对两个面的平均。
pub fn max_velocity_magnitude(fields: &StaggeredFields, mask: &GeometryMask) -> f64 {
    let dims = mask.dims();
    let order = mask.order();
    let layouts = fields.layouts();
    let [u, v, w] = [Component::U, Component::V, Component::W].map(|c| fields.component(c));

    let speed = |cell: usize| -> f64 {
        if !mask.is_fluid_at(cell) {
            return 0.0;
        }
        let (i, j, k) = order.unflatten(dims, cell);
        let avg = |values: &[f64], axis: usize| {
            let mut hi = [i, j, k];
            hi[axis] += 1;
            let layout = layouts[axis];
            0.5 * (values[layout.index(i, j, k)] + values[layout.index_of(hi)])
        };
        DVec3::new(avg(u, 0), avg(v, 1), avg(w, 2)).length()
    };

    #[cfg(feature = "parallel")]
    let max = (0..dims.len()).into_par_iter().map(speed).reduce(|| 0.0, f64::max);
    #[cfg(not(feature = "parallel"))]
    let max = (0..dims.len()).map(speed).fold(0.0, f64::max);

    max
}

/// 与流体单元相邻的面上速度分量绝对值的最大值
///
/// 面值可能大于相邻单元中心的平均（例如两侧面值反号）。
pub fn max_face_speed(fields: &StaggeredFields, mask: &GeometryMask) -> f64 {
    let n = mask.dims().as_array();
    let mut max = 0.0_f64;
    for (axis, layout) in fields.layouts().into_iter().enumerate() {
        let values = fields.component(Component::ALL[axis]);
        for (f, &value) in values.iter().enumerate() {
            let q = layout.coords(f);
            let upper = q[axis] < n[axis] && mask.is_fluid(q[0], q[1], q[2]);
            let lower = q[axis] > 0 && {
                let mut lo = q;
                lo[axis] -= 1;
                mask.is_fluid(lo[0], lo[1], lo[2])
            };
            if upper || lower {
                max = max.max(value.abs());
            }
        }
    }
    max
}

/// CFL 用的速度：单元中心速度模与面上分量两者取大
pub fn cfl_velocity(fields: &StaggeredFields, mask: &GeometryMask) -> f64 {
    max_velocity_magnitude(fields, mask).max(max_face_speed(fields, mask))
}

/// CFL 估计 max|u|·dt / min(h)
#[inline]
pub fn cfl_estimate(max_velocity: f64, dt: f64, min_spacing: f64) -> f64 {
    max_velocity * dt / min_spacing
}

/// CFL > 1 时返回 `CflViolation`
pub fn check_cfl(cfl: f64, step: usize, time: f64) -> PhysicsResult<()> {
    if cfl > 1.0 || !cfl.is_finite() {
        return Err(PhysicsError::CflViolation { cfl, step, time });
    }
    Ok(())
}
