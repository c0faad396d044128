// crates/mf_physics/src/grid.rs

//! 结构化笛卡尔网格
//!
//! 构造后不可变。压力位于单元中心，u/v/w 分别位于 x/y/z 法向面中心
//! （MAC 交错布置）。

use crate::error::{PhysicsError, PhysicsResult};
use glam::DVec3;
use mf_config::DomainDefinition;
use mf_foundation::Dims3;
use serde::Serialize;

/// 矩形计算域上的均匀网格
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grid {
    lower: [f64; 3],
    upper: [f64; 3],
    counts: [usize; 3],
    spacings: [f64; 3],
}

impl Grid {
    /// 由下界、上界与单元数构造
    ///
    /// 范围倒置、非有限或单元数为 0 时返回 `InvalidGeometry`。
    /// 间距的有限性由派生常量检查。
    pub fn new(lower: [f64; 3], upper: [f64; 3], counts: [usize; 3]) -> PhysicsResult<Self> {
        const AXES: [&str; 3] = ["x", "y", "z"];
        for axis in 0..3 {
            let name = AXES[axis];
            if !lower[axis].is_finite() || !upper[axis].is_finite() {
                return Err(PhysicsError::invalid_geometry(format!(
                    "{name} 方向范围必须为有限值: [{}, {}]",
                    lower[axis], upper[axis]
                )));
            }
            if !(upper[axis] > lower[axis]) {
                return Err(PhysicsError::invalid_geometry(format!(
                    "{name} 方向范围倒置: {name}_max = {} 不大于 {name}_min = {}",
                    upper[axis], lower[axis]
                )));
            }
            if counts[axis] == 0 {
                return Err(PhysicsError::invalid_geometry(format!(
                    "n{name} 必须至少为 1"
                )));
            }
        }

        let spacings = [0, 1, 2].map(|a| (upper[a] - lower[a]) / counts[a] as f64);
        Ok(Self {
            lower,
            upper,
            counts,
            spacings,
        })
    }

    /// 由输入文档的计算域段构造
    pub fn from_domain(domain: &DomainDefinition) -> PhysicsResult<Self> {
        Self::new(
            [domain.x_min, domain.y_min, domain.z_min],
            [domain.x_max, domain.y_max, domain.z_max],
            [domain.nx, domain.ny, domain.nz],
        )
    }

    /// x 方向单元数
    #[inline]
    pub fn nx(&self) -> usize {
        self.counts[0]
    }

    /// y 方向单元数
    #[inline]
    pub fn ny(&self) -> usize {
        self.counts[1]
    }

    /// z 方向单元数
    #[inline]
    pub fn nz(&self) -> usize {
        self.counts[2]
    }

    /// 单元数组维度 (nx, ny, nz)
    #[inline]
    pub fn cell_dims(&self) -> Dims3 {
        Dims3::new(self.counts[0], self.counts[1], self.counts[2])
    }

    /// 法向沿 `axis` 的面数组维度
    #[inline]
    pub fn face_dims(&self, axis: usize) -> Dims3 {
        self.cell_dims().grown(axis)
    }

    /// 单元总数
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.cell_dims().len()
    }

    /// 某轴单元数
    #[inline]
    pub fn count(&self, axis: usize) -> usize {
        self.counts[axis]
    }

    /// 某轴间距
    #[inline]
    pub fn spacing(&self, axis: usize) -> f64 {
        self.spacings[axis]
    }

    /// (dx, dy, dz)
    #[inline]
    pub fn spacings(&self) -> [f64; 3] {
        self.spacings
    }

    /// min(dx, dy, dz)
    pub fn min_spacing(&self) -> f64 {
        self.spacings.iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// 某轴下界
    #[inline]
    pub fn lower(&self, axis: usize) -> f64 {
        self.lower[axis]
    }

    /// 某轴上界
    #[inline]
    pub fn upper(&self, axis: usize) -> f64 {
        self.upper[axis]
    }

    /// (x_min, x_max, y_min, y_max, z_min, z_max)
    pub fn extents(&self) -> [f64; 6] {
        [
            self.lower[0],
            self.upper[0],
            self.lower[1],
            self.upper[1],
            self.lower[2],
            self.upper[2],
        ]
    }

    /// 单元中心坐标
    pub fn cell_center(&self, i: usize, j: usize, k: usize) -> DVec3 {
        DVec3::new(
            self.lower[0] + (i as f64 + 0.5) * self.spacings[0],
            self.lower[1] + (j as f64 + 0.5) * self.spacings[1],
            self.lower[2] + (k as f64 + 0.5) * self.spacings[2],
        )
    }

    /// 法向沿 `axis` 的面 (i, j, k) 的中心坐标
    pub fn face_center(&self, axis: usize, i: usize, j: usize, k: usize) -> DVec3 {
        let mut c = self.cell_center(i, j, k);
        c[axis] -= 0.5 * self.spacings[axis];
        c
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spacings_and_dims() {
        let grid = Grid::new([0.0, 0.0, -1.0], [4.0, 1.0, 1.0], [16, 4, 4]).unwrap();
        assert_eq!(grid.spacings(), [0.25, 0.25, 0.5]);
        assert_eq!(grid.min_spacing(), 0.25);
        assert_eq!(grid.face_dims(0), Dims3::new(17, 4, 4));
        assert_eq!(grid.face_dims(2), Dims3::new(16, 4, 5));
        assert_eq!(grid.n_cells(), 256);
        assert_eq!(grid.cell_center(0, 0, 0), DVec3::new(0.125, 0.125, -0.75));
        assert_eq!(grid.face_center(0, 0, 0, 0).x, 0.0);
    }

    #[test]
    fn test_inverted_extent_is_invalid_geometry() {
        let err = Grid::new([1.0, 0.0, 0.0], [0.0, 1.0, 1.0], [2, 2, 2]).unwrap_err();
        assert!(matches!(err, PhysicsError::InvalidGeometry { .. }));
        assert!(err.to_string().contains("x"));
    }

    #[test]
    fn test_zero_cells_is_invalid_geometry() {
        let err = Grid::new([0.0; 3], [1.0; 3], [2, 0, 2]).unwrap_err();
        assert!(matches!(err, PhysicsError::InvalidGeometry { .. }));
    }
}
