// crates/mf_physics/src/numerics/operators/gradient.rs

//! 压力梯度 G_x、G_y、G_z
//!
//! 内部流体面 (i,j,k) 上 `(P[i,j,k] − P[i−1,j,k]) / dx`，其余方向类推。
//! 固体面与给定法向速度的面行为空。
//!
//! 开边界面在 `face_dirichlet` 模式下用半个网格距离构造单侧差分：
//!
//! - 最大侧：`(p_b − p_in) / (h/2)`，系数 `−2/h`，偏置 `+2·p_b/h`
//! - 最小侧：`(p_in − p_b) / (h/2)`，系数 `+2/h`，偏置 `−2·p_b/h`
//!
//! 偏置向量 `g_b` 与矩阵一起构成仿射梯度 `G·p + g_b`。`cell_dirichlet`
//! 模式下开边界行为空，压力由贴边单元的已知值给定。

use crate::boundary::{BoundaryTable, FaceClass, FaceClassification};
use crate::mask::GeometryMask;
use crate::numerics::linear_algebra::{CsrBuilder, CsrMatrix};
use mf_config::PressureBoundaryMode;

/// 仿射梯度算子
#[derive(Debug, Clone)]
pub struct GradientOperator {
    /// 各分量的梯度矩阵 |U_a| × (nx·ny·nz)
    pub components: [CsrMatrix; 3],
    /// 纵向拼接 [G_x; G_y; G_z]
    pub stacked: CsrMatrix,
    /// 偏置 g_b（长度 |U|+|V|+|W|）
    pub bias: Vec<f64>,
}

impl GradientOperator {
    /// 装配
    pub fn build(
        inv_h: [f64; 3],
        mask: &GeometryMask,
        faces: &FaceClassification,
        table: &BoundaryTable,
        mode: PressureBoundaryMode,
    ) -> Self {
        let offsets = faces.offsets();
        let mut bias = vec![0.0; offsets[3]];
        let components = [0, 1, 2].map(|axis| {
            build_component(
                axis,
                inv_h[axis],
                mask,
                faces,
                table,
                mode,
                &mut bias[offsets[axis]..offsets[axis + 1]],
            )
        });
        let stacked = CsrMatrix::vstack(&[&components[0], &components[1], &components[2]]);
        Self {
            components,
            stacked,
            bias,
        }
    }

    /// out = G·p + g_b
    pub fn apply(&self, p: &[f64], out: &mut [f64]) {
        self.stacked.mul_vec(p, out);
        for (o, &b) in out.iter_mut().zip(&self.bias) {
            *o += b;
        }
    }
}

fn build_component(
    axis: usize,
    inv_h: f64,
    mask: &GeometryMask,
    faces: &FaceClassification,
    table: &BoundaryTable,
    mode: PressureBoundaryMode,
    bias: &mut [f64],
) -> CsrMatrix {
    let dims = mask.dims();
    let order = mask.order();
    let layout = faces.layout(axis);
    let mut builder = CsrBuilder::new(layout.len(), dims.len());

    for (f, class) in faces.classes(axis).iter().enumerate() {
        let q = layout.coords(f);
        match class {
            FaceClass::Active => {
                let mut lo = q;
                lo[axis] -= 1;
                builder.set(f, order.index(dims, q[0], q[1], q[2]), inv_h);
                builder.set(f, order.index(dims, lo[0], lo[1], lo[2]), -inv_h);
            }
            FaceClass::Open if mode == PressureBoundaryMode::FaceDirichlet => {
                let Some(is_max) = faces.boundary_side(axis, q) else {
                    continue;
                };
                let Some(p_b) = table.side(axis, is_max).dirichlet_pressure() else {
                    continue;
                };
                let mut inner = q;
                if is_max {
                    inner[axis] -= 1;
                    builder.set(f, order.index(dims, inner[0], inner[1], inner[2]), -2.0 * inv_h);
                    bias[f] = 2.0 * p_b * inv_h;
                } else {
                    builder.set(f, order.index(dims, inner[0], inner[1], inner[2]), 2.0 * inv_h);
                    bias[f] = -2.0 * p_b * inv_h;
                }
            }
            _ => {}
        }
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::BoundaryKind;
    use crate::grid::Grid;
    use mf_config::FaceLocation;
    use mf_foundation::FlatteningOrder;

    fn setup(table: &BoundaryTable) -> (Grid, GeometryMask, FaceClassification) {
        let grid = Grid::new([0.0; 3], [4.0, 1.0, 1.0], [4, 2, 2]).unwrap();
        let mask = GeometryMask::all_fluid(grid.cell_dims(), FlatteningOrder::IFastest);
        let faces = FaceClassification::build(&grid, &mask, table);
        (grid, mask, faces)
    }

    #[test]
    fn test_linear_pressure_gradient() {
        let table = BoundaryTable::all_no_slip();
        let (grid, mask, faces) = setup(&table);
        let inv_h = grid.spacings().map(|h| 1.0 / h);
        let g = GradientOperator::build(
            inv_h,
            &mask,
            &faces,
            &table,
            PressureBoundaryMode::FaceDirichlet,
        );

        let dims = grid.cell_dims();
        let p: Vec<f64> = (0..dims.len())
            .map(|c| {
                let (i, j, k) = FlatteningOrder::IFastest.unflatten(dims, c);
                grid.cell_center(i, j, k).x * 3.0
            })
            .collect();
        let mut gp = vec![0.0; faces.offsets()[3]];
        g.apply(&p, &mut gp);
        for (f, class) in faces.classes(0).iter().enumerate() {
            let expected = if class.is_active() { 3.0 } else { 0.0 };
            assert!((gp[f] - expected).abs() < 1e-12);
        }
        assert!(g.bias.iter().all(|&b| b == 0.0));
    }

    #[test]
    fn test_dirichlet_faces_use_half_cell() {
        let table = BoundaryTable::all_no_slip()
            .with(FaceLocation::XMin, BoundaryKind::Pressure { pressure: 1.0 })
            .with(FaceLocation::XMax, BoundaryKind::Pressure { pressure: 0.0 });
        let (grid, mask, faces) = setup(&table);
        let inv_h = grid.spacings().map(|h| 1.0 / h);
        let g = GradientOperator::build(
            inv_h,
            &mask,
            &faces,
            &table,
            PressureBoundaryMode::FaceDirichlet,
        );

        // 压力 p = 1 − x/4 在单元中心取值，面上梯度恒为 −0.25
        let dims = grid.cell_dims();
        let p: Vec<f64> = (0..dims.len())
            .map(|c| {
                let (i, j, k) = FlatteningOrder::IFastest.unflatten(dims, c);
                1.0 - grid.cell_center(i, j, k).x / 4.0
            })
            .collect();
        let mut gp = vec![0.0; faces.offsets()[3]];
        g.apply(&p, &mut gp);
        let layout = faces.layout(0);
        for i in 0..=4 {
            let f = layout.index(i, 1, 1);
            assert!((gp[f] + 0.25).abs() < 1e-12, "face {i}: {}", gp[f]);
        }

        let cell_mode = GradientOperator::build(
            inv_h,
            &mask,
            &faces,
            &table,
            PressureBoundaryMode::CellDirichlet,
        );
        assert_eq!(cell_mode.components[0].row(layout.index(0, 0, 0)).len(), 0);
        assert!(cell_mode.bias.iter().all(|&b| b == 0.0));
    }
}
