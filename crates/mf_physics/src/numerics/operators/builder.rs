// crates/mf_physics/src/numerics/operators/builder.rs

//! 算子构建器
//!
//! 一次性装配全部离散算子，结果放在 [`Operators`] 中，由求解器状态以
//! `Arc` 持有并只读共享给预测、压力与校正步骤。

use super::divergence::build_divergence;
use super::gradient::GradientOperator;
use super::laplacian::ComponentLaplacian;
use super::ppe::PpeOperator;
use crate::boundary::{BoundaryTable, FaceClassification};
use crate::constants::DerivedConstants;
use crate::error::{PhysicsError, PhysicsResult};
use crate::grid::Grid;
use crate::mask::GeometryMask;
use crate::numerics::linear_algebra::CsrMatrix;
use mf_config::{AdvectionScheme, PressureBoundaryMode};

/// 全部离散算子
#[derive(Debug, Clone)]
pub struct Operators {
    /// 速度自由度分类
    pub faces: FaceClassification,
    /// 散度 D
    pub divergence: CsrMatrix,
    /// 仿射梯度 G·p + g_b
    pub gradient: GradientOperator,
    /// 各分量拉普拉斯
    pub laplacians: [ComponentLaplacian; 3],
    /// 压力泊松算子
    pub ppe: PpeOperator,
    /// 配置的对流格式
    pub advection: AdvectionScheme,
    /// Dirichlet 压力施加方式
    pub pressure_mode: PressureBoundaryMode,
}

impl Operators {
    /// PPE 是否奇异（全 Neumann）
    #[inline]
    pub fn ppe_is_singular(&self) -> bool {
        self.ppe.singular
    }

    /// 速度自由度总数
    #[inline]
    pub fn n_velocity(&self) -> usize {
        self.divergence.n_cols()
    }
}

/// 算子构建器
///
/// ```
/// use mf_physics::boundary::BoundaryTable;
/// use mf_physics::constants::{DerivedConstants, FluidProperties};
/// use mf_physics::grid::Grid;
/// use mf_physics::mask::GeometryMask;
/// use mf_physics::numerics::operators::OperatorBuilder;
/// use mf_foundation::FlatteningOrder;
///
/// let grid = Grid::new([0.0; 3], [1.0; 3], [4, 4, 4]).unwrap();
/// let mask = GeometryMask::all_fluid(grid.cell_dims(), FlatteningOrder::IFastest);
/// let table = BoundaryTable::all_no_slip();
/// let props = FluidProperties::new(1.0, 0.01).unwrap();
/// let consts = DerivedConstants::new(&grid, &props, 0.01).unwrap();
///
/// let ops = OperatorBuilder::new(&grid, &mask, &table, &consts).build().unwrap();
/// assert!(ops.ppe_is_singular());
/// assert_eq!(ops.ppe.matrix.n_rows(), 64);
/// ```
pub struct OperatorBuilder<'a> {
    grid: &'a Grid,
    mask: &'a GeometryMask,
    table: &'a BoundaryTable,
    consts: &'a DerivedConstants,
    advection: AdvectionScheme,
    pressure_mode: PressureBoundaryMode,
}

impl<'a> OperatorBuilder<'a> {
    /// 创建构建器
    pub fn new(
        grid: &'a Grid,
        mask: &'a GeometryMask,
        table: &'a BoundaryTable,
        consts: &'a DerivedConstants,
    ) -> Self {
        Self {
            grid,
            mask,
            table,
            consts,
            advection: AdvectionScheme::default(),
            pressure_mode: PressureBoundaryMode::default(),
        }
    }

    /// 设置对流格式
    pub fn with_advection(mut self, scheme: AdvectionScheme) -> Self {
        self.advection = scheme;
        self
    }

    /// 设置 Dirichlet 压力施加方式
    pub fn with_pressure_mode(mut self, mode: PressureBoundaryMode) -> Self {
        self.pressure_mode = mode;
        self
    }

    /// 装配全部算子
    pub fn build(self) -> PhysicsResult<Operators> {
        if self.mask.dims() != self.grid.cell_dims() {
            return Err(PhysicsError::invalid_geometry(format!(
                "掩码维度 {} 与网格 {} 不一致",
                self.mask.dims(),
                self.grid.cell_dims()
            )));
        }

        let faces = FaceClassification::build(self.grid, self.mask, self.table);
        let inv_h = self.consts.inv_h;
        let divergence = build_divergence(inv_h, self.mask, &faces);
        let gradient =
            GradientOperator::build(inv_h, self.mask, &faces, self.table, self.pressure_mode);
        let laplacians = [0, 1, 2]
            .map(|c| ComponentLaplacian::build(c, self.consts.inv_h2, &faces, self.table));
        let ppe = PpeOperator::build(
            &divergence,
            &gradient.stacked,
            self.mask,
            &faces,
            self.table,
            self.pressure_mode,
        );

        log::debug!(
            "算子装配完成: D {}×{} (nnz {}), Lp nnz {}",
            divergence.n_rows(),
            divergence.n_cols(),
            divergence.nnz(),
            ppe.matrix.nnz()
        );

        Ok(Operators {
            faces,
            divergence,
            gradient,
            laplacians,
            ppe,
            advection: self.advection,
            pressure_mode: self.pressure_mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FluidProperties;
    use mf_foundation::{Dims3, FlatteningOrder};

    #[test]
    fn test_operator_shapes() {
        let grid = Grid::new([0.0; 3], [1.0; 3], [2, 3, 4]).unwrap();
        let mask = GeometryMask::all_fluid(grid.cell_dims(), FlatteningOrder::JFastest);
        let table = BoundaryTable::all_no_slip();
        let props = FluidProperties::new(1.0, 0.1).unwrap();
        let consts = DerivedConstants::new(&grid, &props, 0.1).unwrap();
        let ops = OperatorBuilder::new(&grid, &mask, &table, &consts)
            .build()
            .unwrap();

        let n_u = 3 * 3 * 4;
        let n_v = 2 * 4 * 4;
        let n_w = 2 * 3 * 5;
        assert_eq!(ops.divergence.n_rows(), 24);
        assert_eq!(ops.n_velocity(), n_u + n_v + n_w);
        assert_eq!(ops.gradient.components[0].n_rows(), n_u);
        assert_eq!(ops.gradient.components[1].n_cols(), 24);
        assert_eq!(ops.laplacians[2].matrix.n_rows(), n_w);
        assert_eq!(ops.ppe.matrix.n_rows(), 24);
        assert!(ops.ppe.matrix.is_symmetric(1e-9));
    }

    #[test]
    fn test_mask_grid_mismatch() {
        let grid = Grid::new([0.0; 3], [1.0; 3], [2, 2, 2]).unwrap();
        let mask = GeometryMask::all_fluid(Dims3::new(3, 2, 2), FlatteningOrder::IFastest);
        let props = FluidProperties::new(1.0, 0.1).unwrap();
        let consts = DerivedConstants::new(&grid, &props, 0.1).unwrap();
        let table = BoundaryTable::all_no_slip();
        let err = OperatorBuilder::new(&grid, &mask, &table, &consts)
            .build()
            .unwrap_err();
        assert_eq!(err.kind(), mf_foundation::FailureKind::InvalidGeometry);
    }
}
