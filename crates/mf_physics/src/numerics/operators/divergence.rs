// crates/mf_physics/src/numerics/operators/divergence.rs

//! 散度算子 D：(nx·ny·nz) × (|U|+|V|+|W|)
//!
//! 流体单元 (i,j,k) 的行：
//! `(U[i+1]−U[i])/dx + (V[j+1]−V[j])/dy + (W[k+1]−W[k])/dz`。
//! 固体单元的行为空；`Solid` 面的列不装配（其值恒为 0）。

use crate::boundary::{FaceClass, FaceClassification};
use crate::mask::GeometryMask;
use crate::numerics::linear_algebra::{CsrBuilder, CsrMatrix};

/// 装配散度矩阵
pub fn build_divergence(
    inv_h: [f64; 3],
    mask: &GeometryMask,
    faces: &FaceClassification,
) -> CsrMatrix {
    let dims = mask.dims();
    let order = mask.order();
    let offsets = faces.offsets();
    let mut builder = CsrBuilder::new(dims.len(), offsets[3]);

    for cell in 0..dims.len() {
        if !mask.is_fluid_at(cell) {
            continue;
        }
        let (i, j, k) = order.unflatten(dims, cell);
        let q = [i, j, k];
        for axis in 0..3 {
            let layout = faces.layout(axis);
            let mut hi = q;
            hi[axis] += 1;
            for (face, coef) in [(q, -inv_h[axis]), (hi, inv_h[axis])] {
                let f = layout.index_of(face);
                if faces.class(axis, f) == FaceClass::Solid {
                    continue;
                }
                builder.set(cell, offsets[axis] + f, coef);
            }
        }
    }

    builder.build()
}

/// 指定单元上散度的均方根 ‖D·u‖₂ / √N
///
/// `div` 为整场散度（长度 nx·ny·nz），`cells` 为参与统计的单元。
pub fn rms_over(div: &[f64], cells: &[usize]) -> f64 {
    if cells.is_empty() {
        return 0.0;
    }
    let sum: f64 = cells.iter().map(|&c| div[c] * div[c]).sum();
    (sum / cells.len() as f64).sqrt()
}
