// crates/mf_physics/src/numerics/operators/laplacian.rs

//! 速度分量的拉普拉斯 L_u、L_v、L_w
//!
//! 只有 `Active` 面有非空行。内部面 (i,j,k) 上
//! `(U[i−1] + U[i+1] − 2U[i])/dx² + y、z 方向同理`。
//!
//! 边界修正直接折叠进系数：
//!
//! - 沿法向的邻居总是存在的面（可能被钉住），作为普通列；
//! - 沿切向越出计算域的邻居按边界的虚拟值规则消元：镜像 `2v − u` 给
//!   对角 `−1/h²` 与偏置 `2v/h²`，复制 `u` 给对角 `+1/h²`；
//! - 沿切向的 `Solid` 邻居视作无滑移壁面，镜像为 `−u`。

use crate::boundary::{BoundaryTable, FaceClass, FaceClassification, GhostRule};
use crate::numerics::linear_algebra::{CsrBuilder, CsrMatrix};

/// 单个分量的拉普拉斯：L·u + bias
#[derive(Debug, Clone)]
pub struct ComponentLaplacian {
    /// |U_c| × |U_c| 矩阵
    pub matrix: CsrMatrix,
    /// 非齐次边界值带来的常数项
    pub bias: Vec<f64>,
}

impl ComponentLaplacian {
    /// 装配分量 `component` 的拉普拉斯
    pub fn build(
        component: usize,
        inv_h2: [f64; 3],
        faces: &FaceClassification,
        table: &BoundaryTable,
    ) -> Self {
        let layout = faces.layout(component);
        let extent = layout.dims().as_array();
        let mut builder = CsrBuilder::new_square(layout.len());
        let mut bias = vec![0.0; layout.len()];

        for (f, class) in faces.classes(component).iter().enumerate() {
            if !class.is_active() {
                continue;
            }
            let q = layout.coords(f);
            let mut diag = 0.0;

            for axis in 0..3 {
                let w = inv_h2[axis];
                diag -= 2.0 * w;

                for is_max in [false, true] {
                    let neighbour = step(q, axis, is_max, extent[axis]);
                    match neighbour {
                        Some(nq) => {
                            let nf = layout.index_of(nq);
                            if axis != component && faces.class(component, nf) == FaceClass::Solid
                            {
                                diag -= w;
                            } else {
                                builder.add(f, nf, w);
                            }
                        }
                        None => match table.side(axis, is_max).tangential_rule(component) {
                            GhostRule::Mirror(v) => {
                                diag -= w;
                                bias[f] += 2.0 * v * w;
                            }
                            GhostRule::Copy => diag += w,
                        },
                    }
                }
            }

            builder.add(f, f, diag);
        }

        Self {
            matrix: builder.build(),
            bias,
        }
    }

    /// out = L·u + bias
    pub fn apply(&self, u: &[f64], out: &mut [f64]) {
        self.matrix.mul_vec(u, out);
        for (o, &b) in out.iter_mut().zip(&self.bias) {
            *o += b;
        }
    }
}

/// 沿 `axis` 前进一格，越出 [0, extent) 时返回 `None`
#[inline]
fn step(q: [usize; 3], axis: usize, is_max: bool, extent: usize) -> Option<[usize; 3]> {
    let mut n = q;
    if is_max {
        n[axis] += 1;
        (n[axis] < extent).then_some(n)
    } else {
        n[axis] = q[axis].checked_sub(1)?;
        Some(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::BoundaryKind;
    use crate::grid::Grid;
    use crate::mask::GeometryMask;
    use mf_config::FaceLocation;
    use mf_foundation::FlatteningOrder;

    fn build(table: &BoundaryTable, component: usize) -> (FaceClassification, ComponentLaplacian) {
        let grid = Grid::new([0.0; 3], [1.0; 3], [4, 4, 4]).unwrap();
        let mask = GeometryMask::all_fluid(grid.cell_dims(), FlatteningOrder::IFastest);
        let faces = FaceClassification::build(&grid, &mask, table);
        let inv_h2 = grid.spacings().map(|h| 1.0 / (h * h));
        let lap = ComponentLaplacian::build(component, inv_h2, &faces, table);
        (faces, lap)
    }

    #[test]
    fn test_interior_row_is_seven_point() {
        let table = BoundaryTable::all_no_slip();
        let (faces, lap) = build(&table, 0);
        let f = faces.layout(0).index(2, 2, 2);
        let row = lap.matrix.row(f);
        assert_eq!(row.len(), 7);
        assert_eq!(lap.matrix.get(f, f), -6.0 * 16.0);
        assert_eq!(row.values().iter().sum::<f64>(), 0.0);
        // 非 Active 行为空
        assert!(lap.matrix.row(faces.layout(0).index(0, 1, 1)).is_empty());
    }

    #[test]
    fn test_tangential_wall_rows() {
        let table = BoundaryTable::all_no_slip()
            .with(
                FaceLocation::YMax,
                BoundaryKind::Inflow {
                    velocity: [1.0, 0.0, 0.0],
                },
            )
            .with(FaceLocation::ZMin, BoundaryKind::FreeSlip);
        let (faces, lap) = build(&table, 0);
        let layout = faces.layout(0);

        // 贴 y_max：镜像 2·1 − u
        let f = layout.index(2, 3, 2);
        assert_eq!(lap.matrix.get(f, f), -7.0 * 16.0);
        assert_eq!(lap.bias[f], 2.0 * 16.0);

        // 贴 z_min：复制，对角 −5/h²
        let f = layout.index(2, 2, 0);
        assert_eq!(lap.matrix.get(f, f), -5.0 * 16.0);
        assert_eq!(lap.bias[f], 0.0);

        // 常数场 u = 1 在入流壁面处的拉普拉斯为 0
        let u = vec![1.0; layout.len()];
        let mut out = vec![0.0; layout.len()];
        lap.apply(&u, &mut out);
        assert!(out[layout.index(2, 3, 2)].abs() < 1e-12);
    }
}
