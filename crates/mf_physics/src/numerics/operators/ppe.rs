// crates/mf_physics/src/numerics/operators/ppe.rs

//! 压力泊松矩阵 Lp = D·[G_x; G_y; G_z]
//!
//! 由稀疏乘积直接得到，结构与系数随边界分类自动调整：给定法向速度的面
//! 梯度行为空（Neumann），开边界面在 `face_dirichlet` 模式下贡献对角
//! `−2/h²`。Lp 对称半负定；没有开边界面时为奇异矩阵（常数零空间）。
//!
//! `cell_dirichlet` 模式下，贴开边界的流体单元记为已知单元，其方程由
//! 求解器替换为单位行，右端为给定压力。

use crate::boundary::{BoundaryTable, FaceClass, FaceClassification};
use crate::mask::GeometryMask;
use crate::numerics::linear_algebra::CsrMatrix;
use mf_config::PressureBoundaryMode;

/// 压力泊松算子
#[derive(Debug, Clone)]
pub struct PpeOperator {
    /// Lp，(nx·ny·nz) × (nx·ny·nz)
    pub matrix: CsrMatrix,
    /// 全 Neumann（奇异）
    pub singular: bool,
    /// 压力已知的单元及其值（`cell_dirichlet` 模式）
    pub dirichlet_cells: Vec<(usize, f64)>,
    /// 全部流体单元（展平顺序）
    pub fluid_cells: Vec<usize>,
    /// 参与散度统计的单元：流体单元去掉 `dirichlet_cells`
    pub counted_cells: Vec<usize>,
}

impl PpeOperator {
    /// 由散度与拼接梯度构造
    pub fn build(
        divergence: &CsrMatrix,
        gradient: &CsrMatrix,
        mask: &GeometryMask,
        faces: &FaceClassification,
        table: &BoundaryTable,
        mode: PressureBoundaryMode,
    ) -> Self {
        let matrix = divergence.mul_mat(gradient);
        let singular = !faces.has_open();
        let fluid_cells = mask.fluid_cells();

        let dirichlet_cells = match mode {
            PressureBoundaryMode::FaceDirichlet => Vec::new(),
            PressureBoundaryMode::CellDirichlet => collect_dirichlet_cells(mask, faces, table),
        };

        let mut is_known = vec![false; mask.dims().len()];
        for &(cell, _) in &dirichlet_cells {
            is_known[cell] = true;
        }
        let counted_cells = fluid_cells
            .iter()
            .copied()
            .filter(|&c| !is_known[c])
            .collect();

        log::debug!(
            "PPE 矩阵: n = {}, nnz = {}, 奇异 = {singular}, 已知单元 = {}",
            matrix.n_rows(),
            matrix.nnz(),
            dirichlet_cells.len()
        );

        Self {
            matrix,
            singular,
            dirichlet_cells,
            fluid_cells,
            counted_cells,
        }
    }

    /// 流体单元数
    #[inline]
    pub fn n_fluid(&self) -> usize {
        self.fluid_cells.len()
    }
}

/// 贴开边界面的流体单元（同一单元只取第一次遇到的压力值）
fn collect_dirichlet_cells(
    mask: &GeometryMask,
    faces: &FaceClassification,
    table: &BoundaryTable,
) -> Vec<(usize, f64)> {
    let dims = mask.dims();
    let order = mask.order();
    let mut seen = vec![false; dims.len()];
    let mut cells = Vec::new();

    for axis in 0..3 {
        let layout = faces.layout(axis);
        for (f, class) in faces.classes(axis).iter().enumerate() {
            if *class != FaceClass::Open {
                continue;
            }
            let mut q = layout.coords(f);
            let Some(is_max) = faces.boundary_side(axis, q) else {
                continue;
            };
            let Some(p_b) = table.side(axis, is_max).dirichlet_pressure() else {
                continue;
            };
            if is_max {
                q[axis] -= 1;
            }
            let cell = order.index(dims, q[0], q[1], q[2]);
            if !seen[cell] {
                seen[cell] = true;
                cells.push((cell, p_b));
            }
        }
    }
    cells.sort_unstable_by_key(|&(c, _)| c);
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::BoundaryKind;
    use crate::grid::Grid;
    use crate::numerics::operators::{build_divergence, GradientOperator};
    use mf_config::FaceLocation;
    use mf_foundation::FlatteningOrder;

    fn build(table: &BoundaryTable, mode: PressureBoundaryMode) -> PpeOperator {
        let grid = Grid::new([0.0; 3], [1.0; 3], [3, 3, 3]).unwrap();
        let mask = GeometryMask::all_fluid(grid.cell_dims(), FlatteningOrder::IFastest);
        let faces = FaceClassification::build(&grid, &mask, table);
        let inv_h = grid.spacings().map(|h| 1.0 / h);
        let d = build_divergence(inv_h, &mask, &faces);
        let g = GradientOperator::build(inv_h, &mask, &faces, table, mode);
        PpeOperator::build(&d, &g.stacked, &mask, &faces, table, mode)
    }

    #[test]
    fn test_all_neumann_is_singular_and_symmetric() {
        let ppe = build(&BoundaryTable::all_no_slip(), PressureBoundaryMode::FaceDirichlet);
        assert!(ppe.singular);
        assert!(ppe.matrix.is_symmetric(1e-12));
        for row in 0..ppe.matrix.n_rows() {
            let sum: f64 = ppe.matrix.row(row).values().iter().sum();
            assert!(sum.abs() < 1e-9);
        }
        // 角点单元：三个邻居
        assert!((ppe.matrix.get(0, 0) + 3.0 * 9.0).abs() < 1e-9);
        assert_eq!(ppe.counted_cells.len(), 27);
    }

    #[test]
    fn test_dirichlet_modes() {
        let table = BoundaryTable::all_no_slip()
            .with(FaceLocation::XMax, BoundaryKind::Outflow { pressure: 0.5 });

        let face = build(&table, PressureBoundaryMode::FaceDirichlet);
        assert!(!face.singular);
        assert!(face.dirichlet_cells.is_empty());
        // (2,0,0)：三个邻居 + 半格 Dirichlet 项
        assert!((face.matrix.get(2, 2) + (3.0 + 2.0) * 9.0).abs() < 1e-9);
        assert!(face.matrix.is_symmetric(1e-12));

        let cell = build(&table, PressureBoundaryMode::CellDirichlet);
        assert_eq!(cell.dirichlet_cells.len(), 9);
        assert_eq!(cell.dirichlet_cells[0], (2, 0.5));
        assert_eq!(cell.counted_cells.len(), 18);
    }
}
