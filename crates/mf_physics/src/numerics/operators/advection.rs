// crates/mf_physics/src/numerics/operators/advection.rs

//! 对流项 (u·∇)u，无矩阵形式
//!
//! 在扩展数组上逐面计算，因此越出计算域的邻居自动取虚拟层的值。
//! 分量 c 在面 q 处的对流项为 `Σ_a vel_a · ∂U_c/∂x_a`：
//!
//! - `a == c` 时 vel 取 U_c[q] 本身；
//! - `a != c` 时取周围四个 U_a 面值的算术平均（c 方向 q[c]−1、q[c]，
//!   a 方向 q[a]、q[a]+1）。
//!
//! 一阶迎风按 vel 的符号选择后向或前向差分；中心格式取
//! `(U[+1] − U[−1]) / 2h`，只有在 [`check_central_stability`] 通过时才允许使用。

use mf_config::AdvectionScheme;
use ndarray::Array3;

/// 分量 `component` 在面 `q`（未偏移的面下标）处的对流项
///
/// `q` 必须是 `Active` 面，保证 `q[component] ≥ 1`。
#[inline]
pub fn advection_term(
    component: usize,
    q: [usize; 3],
    ext: &[Array3<f64>; 3],
    inv_h: [f64; 3],
    scheme: AdvectionScheme,
) -> f64 {
    let c = component;
    let e = &ext[c];
    let qe = q.map(|v| v + 1);
    let u0 = e[qe];

    let mut total = 0.0;
    for a in 0..3 {
        let vel = if a == c {
            u0
        } else {
            let ea = &ext[a];
            let mut sum = 0.0;
            for dc in 0..2 {
                for da in 0..2 {
                    let mut p = qe;
                    p[c] = qe[c] - 1 + dc;
                    p[a] = qe[a] + da;
                    sum += ea[p];
                }
            }
            0.25 * sum
        };
        if vel == 0.0 {
            continue;
        }

        let mut lo = qe;
        lo[a] -= 1;
        let mut hi = qe;
        hi[a] += 1;
        let grad = match scheme {
            AdvectionScheme::Upwind if vel > 0.0 => (u0 - e[lo]) * inv_h[a],
            AdvectionScheme::Upwind => (e[hi] - u0) * inv_h[a],
            AdvectionScheme::Central => 0.5 * (e[hi] - e[lo]) * inv_h[a],
        };
        total += vel * grad;
    }
    total
}

/// 中心格式的稳定性检查
///
/// 同时要求：
/// - 网格 Péclet 数 `max|u|·h/ν ≤ 2`（每个方向）；
/// - `dt ≤ 2ν / max|u|²`；
/// - 扩散限制 `ν·dt·Σ1/h² ≤ ½`。
///
/// 不满足时返回说明原因的字符串。
pub fn check_central_stability(
    max_speed: f64,
    spacings: [f64; 3],
    nu: f64,
    dt: f64,
) -> Result<(), String> {
    let sum_inv_h2: f64 = spacings.iter().map(|h| 1.0 / (h * h)).sum();
    let diffusion = nu * dt * sum_inv_h2;
    if diffusion > 0.5 {
        return Err(format!("扩散数 ν·dt·Σ1/h² = {diffusion:.3e} > 0.5"));
    }
    if max_speed <= 0.0 {
        return Ok(());
    }
    for (axis, &h) in spacings.iter().enumerate() {
        let peclet = if nu > 0.0 { max_speed * h / nu } else { f64::INFINITY };
        if peclet > 2.0 {
            return Err(format!("第 {axis} 轴网格 Péclet 数 {peclet:.3e} > 2"));
        }
    }
    let limit = 2.0 * nu / (max_speed * max_speed);
    if dt > limit {
        return Err(format!("dt = {dt} 超过 2ν/|u|² = {limit:.3e}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{BoundaryApplier, BoundaryTable, FaceClassification};
    use crate::fields::{Component, StaggeredFields};
    use crate::grid::Grid;
    use crate::mask::GeometryMask;
    use mf_foundation::FlatteningOrder;

    fn setup() -> (Grid, FaceClassification, BoundaryTable, StaggeredFields) {
        let grid = Grid::new([0.0; 3], [1.0; 3], [4, 4, 4]).unwrap();
        let order = FlatteningOrder::IFastest;
        let mask = GeometryMask::all_fluid(grid.cell_dims(), order);
        let table = BoundaryTable::all_no_slip();
        let faces = FaceClassification::build(&grid, &mask, &table);
        let fields = StaggeredFields::zeros(&grid, order);
        (grid, faces, table, fields)
    }

    #[test]
    fn test_uniform_flow_has_no_advection() {
        let (grid, faces, table, mut fields) = setup();
        fields.fill_uniform([0.5, 0.5, 0.5], 0.0);
        BoundaryApplier::new(&table, &faces).fill_ghosts(&mut fields);
        let inv_h = grid.spacings().map(|h| 1.0 / h);
        let q = [2, 2, 2];
        for scheme in [AdvectionScheme::Upwind, AdvectionScheme::Central] {
            let a = advection_term(0, q, fields.ext_all(), inv_h, scheme);
            assert!(a.abs() < 1e-14);
        }
    }

    #[test]
    fn test_upwind_direction() {
        let (grid, faces, table, mut fields) = setup();
        // U = x（面坐标），V = W = 0
        let layout = fields.layout(Component::U);
        for (idx, u) in fields.component_mut(Component::U).iter_mut().enumerate() {
            let [i, _, _] = layout.coords(idx);
            *u = i as f64 * 0.25;
        }
        BoundaryApplier::new(&table, &faces).fill_ghosts(&mut fields);
        let inv_h = grid.spacings().map(|h| 1.0 / h);

        // u·∂u/∂x = x·1
        let a = advection_term(0, [2, 1, 1], fields.ext_all(), inv_h, AdvectionScheme::Upwind);
        assert!((a - 0.5).abs() < 1e-12);
        let c = advection_term(0, [2, 1, 1], fields.ext_all(), inv_h, AdvectionScheme::Central);
        assert!((c - 0.5).abs() < 1e-12);

        let a = advection_term(0, [3, 1, 1], fields.ext_all(), inv_h, AdvectionScheme::Upwind);
        assert!((a - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_central_stability_bounds() {
        let h = [0.1; 3];
        assert!(check_central_stability(0.0, h, 0.01, 0.01).is_ok());
        assert!(check_central_stability(0.1, h, 0.01, 0.01).is_ok());
        // Péclet = 1·0.1/0.01 = 10
        assert!(check_central_stability(1.0, h, 0.01, 0.001)
            .unwrap_err()
            .contains("Péclet"));
        // 扩散数 = 0.1·1·300 = 30
        assert!(check_central_stability(0.0, h, 0.1, 1.0).is_err());
        // 无黏时任何非零速度都不满足
        assert!(check_central_stability(0.1, h, 0.0, 0.01).is_err());
    }
}
