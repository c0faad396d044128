// crates/mf_physics/src/boundary/faces.rs

//! 速度自由度分类
//!
//! 每个法向面只分类一次，预测、校正、边界处理与算子装配共享同一份结果：
//!
//! | 类别 | 位置 | 处理 |
//! |---|---|---|
//! | `Active` | 两侧都是流体的内部面 | 预测器更新，校正器校正 |
//! | `Solid` | 任一侧为固体 | 恒为 0 |
//! | `Wall(v)` | 无滑移 / 自由滑移 / 入流的边界法向面 | 恒为 v |
//! | `Open` | 出流 / 给定压力的边界法向面 | 由内侧外推，再用 Dirichlet 压力校正 |

use super::table::BoundaryTable;
use crate::fields::FieldLayout;
use crate::grid::Grid;
use crate::mask::GeometryMask;

/// 面类别
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FaceClass {
    /// 内部流体面
    Active,
    /// 接触固体
    Solid,
    /// 给定法向速度的边界面
    Wall(f64),
    /// 开边界面
    Open,
}

impl FaceClass {
    /// 是否为内部流体面
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// 被钉住的值（Solid → 0，Wall → v）
    #[inline]
    pub fn pinned_value(&self) -> Option<f64> {
        match *self {
            Self::Solid => Some(0.0),
            Self::Wall(v) => Some(v),
            Self::Active | Self::Open => None,
        }
    }
}

/// 全部速度自由度的分类
#[derive(Debug, Clone, PartialEq)]
pub struct FaceClassification {
    layouts: [FieldLayout; 3],
    classes: [Vec<FaceClass>; 3],
    counts: [usize; 3],
}

impl FaceClassification {
    /// 根据几何掩码与边界表分类
    pub fn build(grid: &Grid, mask: &GeometryMask, table: &BoundaryTable) -> Self {
        let counts = grid.cell_dims().as_array();
        let layouts = [0, 1, 2].map(|a| FieldLayout::new(grid.face_dims(a), mask.order()));

        let classes = [0, 1, 2].map(|axis| {
            let layout = layouts[axis];
            let n = counts[axis];
            (0..layout.len())
                .map(|idx| {
                    let q = layout.coords(idx);
                    Self::classify(axis, q, n, mask, table)
                })
                .collect::<Vec<_>>()
        });

        let out = Self {
            layouts,
            classes,
            counts,
        };
        log::debug!(
            "面分类: active={}, solid={}, wall={}, open={}",
            out.count(|c| c.is_active()),
            out.count(|c| matches!(c, FaceClass::Solid)),
            out.count(|c| matches!(c, FaceClass::Wall(_))),
            out.count(|c| matches!(c, FaceClass::Open)),
        );
        out
    }

    fn classify(
        axis: usize,
        q: [usize; 3],
        n: usize,
        mask: &GeometryMask,
        table: &BoundaryTable,
    ) -> FaceClass {
        if q[axis] == 0 || q[axis] == n {
            let is_max = q[axis] == n;
            let mut inner = q;
            inner[axis] = if is_max { n - 1 } else { 0 };
            if !mask.is_fluid(inner[0], inner[1], inner[2]) {
                return FaceClass::Solid;
            }
            return match table.side(axis, is_max).normal_velocity(axis) {
                Some(v) => FaceClass::Wall(v),
                None => FaceClass::Open,
            };
        }

        let mut lo = q;
        lo[axis] -= 1;
        if mask.is_fluid(lo[0], lo[1], lo[2]) && mask.is_fluid(q[0], q[1], q[2]) {
            FaceClass::Active
        } else {
            FaceClass::Solid
        }
    }

    /// 分量布局
    #[inline]
    pub fn layout(&self, axis: usize) -> FieldLayout {
        self.layouts[axis]
    }

    /// 分量的全部分类
    #[inline]
    pub fn classes(&self, axis: usize) -> &[FaceClass] {
        &self.classes[axis]
    }

    /// 一维下标处的分类
    #[inline]
    pub fn class(&self, axis: usize, idx: usize) -> FaceClass {
        self.classes[axis][idx]
    }

    /// (i, j, k) 处的分类
    #[inline]
    pub fn class_at(&self, axis: usize, q: [usize; 3]) -> FaceClass {
        self.classes[axis][self.layouts[axis].index_of(q)]
    }

    /// 各分量在拼接速度向量中的起点，末项为总长
    pub fn offsets(&self) -> [usize; 4] {
        let mut offsets = [0; 4];
        for a in 0..3 {
            offsets[a + 1] = offsets[a] + self.layouts[a].len();
        }
        offsets
    }

    /// 若为边界法向面，返回所在侧（true 表示最大侧）
    #[inline]
    pub fn boundary_side(&self, axis: usize, q: [usize; 3]) -> Option<bool> {
        if q[axis] == 0 {
            Some(false)
        } else if q[axis] == self.counts[axis] {
            Some(true)
        } else {
            None
        }
    }

    /// 满足条件的面数
    pub fn count(&self, pred: impl Fn(&FaceClass) -> bool) -> usize {
        self.classes.iter().flatten().filter(|c| pred(c)).count()
    }

    /// 是否存在开边界面
    pub fn has_open(&self) -> bool {
        self.classes
            .iter()
            .flatten()
            .any(|c| matches!(c, FaceClass::Open))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::BoundaryKind;
    use mf_config::FaceLocation;
    use mf_foundation::FlatteningOrder;

    fn grid(n: usize) -> Grid {
        Grid::new([0.0; 3], [1.0; 3], [n, n, n]).unwrap()
    }

    #[test]
    fn test_all_fluid_no_slip() {
        let g = grid(3);
        let mask = GeometryMask::all_fluid(g.cell_dims(), FlatteningOrder::IFastest);
        let faces = FaceClassification::build(&g, &mask, &BoundaryTable::all_no_slip());
        // 每个分量 4·3·3 = 36 个面，其中 2·9 个为边界面
        assert_eq!(faces.count(|c| c.is_active()), 3 * 18);
        assert_eq!(faces.count(|c| matches!(c, FaceClass::Wall(v) if *v == 0.0)), 3 * 18);
        assert!(!faces.has_open());
        assert_eq!(faces.boundary_side(0, [3, 1, 1]), Some(true));
        assert_eq!(faces.boundary_side(0, [1, 1, 1]), None);
    }

    #[test]
    fn test_inflow_outflow_and_solid() {
        let g = grid(4);
        let mut values = vec![1i64; 64];
        let order = FlatteningOrder::IFastest;
        let dims = g.cell_dims();
        for k in 0..4 {
            for j in 0..4 {
                for i in 0..4 {
                    if dims.on_boundary(i, j, k) {
                        values[order.index(dims, i, j, k)] = -1;
                    }
                }
            }
        }
        values[order.index(dims, 1, 1, 1)] = 0;
        values[order.index(dims, 0, 2, 2)] = 0;
        let mask = GeometryMask::from_flat(&values, None, dims, order).unwrap();

        let table = BoundaryTable::all_no_slip()
            .with(
                FaceLocation::XMin,
                BoundaryKind::Inflow {
                    velocity: [2.0, 0.0, 0.0],
                },
            )
            .with(FaceLocation::XMax, BoundaryKind::Outflow { pressure: 0.0 });
        let faces = FaceClassification::build(&g, &mask, &table);

        assert_eq!(faces.class_at(0, [0, 1, 1]), FaceClass::Wall(2.0));
        assert_eq!(faces.class_at(0, [4, 1, 1]), FaceClass::Open);
        // 内侧单元为固体的边界面
        assert_eq!(faces.class_at(0, [0, 2, 2]), FaceClass::Solid);
        // 固体单元两侧的内部面
        assert_eq!(faces.class_at(0, [1, 1, 1]), FaceClass::Solid);
        assert_eq!(faces.class_at(0, [2, 1, 1]), FaceClass::Solid);
        assert_eq!(faces.class_at(1, [1, 2, 1]), FaceClass::Solid);
        assert_eq!(faces.class_at(0, [3, 1, 1]), FaceClass::Active);
        assert!(faces.has_open());
        assert_eq!(FaceClass::Wall(2.0).pinned_value(), Some(2.0));
        assert_eq!(FaceClass::Open.pinned_value(), None);
    }
}
