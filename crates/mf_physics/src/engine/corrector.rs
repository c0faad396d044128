// crates/mf_physics/src/engine/corrector.rs

//! 校正步与投影检查
//!
//! `uⁿ⁺¹ = u* − (dt/ρ)·(G·p + g_b)`。固体面与壁面的梯度行为空，校正后保持
//! 原值；之后再由边界处理器重新施加一次。

use crate::constants::DerivedConstants;
use crate::error::{PhysicsError, PhysicsResult};
use crate::fields::StaggeredFields;
use crate::numerics::linear_algebra::axpy;
use crate::numerics::operators::{rms_over, Operators};

/// 校正器（持有梯度与散度的工作缓冲区）
#[derive(Debug, Clone)]
pub struct Corrector {
    grad: Vec<f64>,
    div: Vec<f64>,
}

impl Corrector {
    /// 分配缓冲区
    pub fn new(n_velocity: usize, n_cells: usize) -> Self {
        Self {
            grad: vec![0.0; n_velocity],
            div: vec![0.0; n_cells],
        }
    }

    /// 用压力梯度校正速度
    pub fn correct(
        &mut self,
        fields: &mut StaggeredFields,
        ops: &Operators,
        consts: &DerivedConstants,
    ) {
        let (velocity, pressure) = fields.split_mut();
        ops.gradient.apply(pressure, &mut self.grad);
        axpy(-consts.dt_over_rho, &self.grad, velocity);
    }

    /// ‖D·u‖₂ / √N，N 为计入连续方程的流体单元数
    pub fn divergence_norm(&mut self, ops: &Operators, velocity: &[f64]) -> f64 {
        ops.divergence.mul_vec(velocity, &mut self.div);
        rms_over(&self.div, &ops.ppe.counted_cells)
    }
}

/// 校正后散度超过 `tolerance` 时返回 `Projection` 错误
pub fn check_projection(divergence: f64, tolerance: f64) -> PhysicsResult<()> {
    if divergence > tolerance || !divergence.is_finite() {
        return Err(PhysicsError::Projection {
            divergence,
            tolerance,
        });
    }
    Ok(())
}
