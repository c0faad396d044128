// crates/mf_physics/src/fields.rs

//! 交错网格场
//!
//! P 位于单元中心，形状 (nx, ny, nz)；U、V、W 位于法向面，形状分别为
//! (nx+1, ny, nz)、(nx, ny+1, nz)、(nx, ny, nz+1)。三个速度分量按
//! [U | V | W] 连续存放在一个向量里，散度算子可以直接作用于它。
//!
//! 每个场另有一个带一层虚拟单元的扩展数组（`ndarray::Array3`，形状各维 +2），
//! 内部区域 `[i+1, j+1, k+1]` 与展平向量保存同样的逻辑值，由边界处理器同步。

use crate::grid::Grid;
use mf_foundation::{Dims3, FlatteningOrder};
use ndarray::Array3;
use serde::Serialize;
use std::ops::Range;

/// 速度分量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Component {
    /// x 方向分量（x 法向面）
    U,
    /// y 方向分量（y 法向面）
    V,
    /// z 方向分量（z 法向面）
    W,
}

impl Component {
    /// 全部分量
    pub const ALL: [Component; 3] = [Self::U, Self::V, Self::W];

    /// 所在轴
    #[inline]
    pub fn axis(self) -> usize {
        self as usize
    }

    /// 由轴构造
    pub fn from_axis(axis: usize) -> Self {
        match axis {
            0 => Self::U,
            1 => Self::V,
            _ => Self::W,
        }
    }

    /// 名称
    pub fn name(self) -> &'static str {
        match self {
            Self::U => "U",
            Self::V => "V",
            Self::W => "W",
        }
    }
}

/// 三维数组的维度与展平顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldLayout {
    dims: Dims3,
    order: FlatteningOrder,
}

impl FieldLayout {
    /// 创建布局
    pub fn new(dims: Dims3, order: FlatteningOrder) -> Self {
        Self { dims, order }
    }

    /// 维度
    #[inline]
    pub fn dims(&self) -> Dims3 {
        self.dims
    }

    /// 展平顺序
    #[inline]
    pub fn order(&self) -> FlatteningOrder {
        self.order
    }

    /// 元素数
    #[inline]
    pub fn len(&self) -> usize {
        self.dims.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.dims.is_empty()
    }

    /// (i, j, k) → 一维下标
    #[inline]
    pub fn index(&self, i: usize, j: usize, k: usize) -> usize {
        self.order.index(self.dims, i, j, k)
    }

    /// 以数组形式给出坐标的一维下标
    #[inline]
    pub fn index_of(&self, q: [usize; 3]) -> usize {
        self.index(q[0], q[1], q[2])
    }

    /// 一维下标 → [i, j, k]
    #[inline]
    pub fn coords(&self, idx: usize) -> [usize; 3] {
        let (i, j, k) = self.order.unflatten(self.dims, idx);
        [i, j, k]
    }

    /// 扩展数组形状
    pub fn ext_shape(&self) -> (usize, usize, usize) {
        (self.dims.ni + 2, self.dims.nj + 2, self.dims.nk + 2)
    }
}

/// 交错网格上的全部场
#[derive(Debug, Clone, PartialEq)]
pub struct StaggeredFields {
    pressure_layout: FieldLayout,
    velocity_layouts: [FieldLayout; 3],
    offsets: [usize; 4],
    pressure: Vec<f64>,
    velocity: Vec<f64>,
    pressure_ext: Array3<f64>,
    velocity_ext: [Array3<f64>; 3],
}

impl StaggeredFields {
    /// 分配并置零
    pub fn zeros(grid: &Grid, order: FlatteningOrder) -> Self {
        let pressure_layout = FieldLayout::new(grid.cell_dims(), order);
        let velocity_layouts = [0, 1, 2].map(|a| FieldLayout::new(grid.face_dims(a), order));

        let mut offsets = [0; 4];
        for a in 0..3 {
            offsets[a + 1] = offsets[a] + velocity_layouts[a].len();
        }

        Self {
            pressure: vec![0.0; pressure_layout.len()],
            velocity: vec![0.0; offsets[3]],
            pressure_ext: Array3::zeros(pressure_layout.ext_shape()),
            velocity_ext: velocity_layouts.map(|l| Array3::zeros(l.ext_shape())),
            pressure_layout,
            velocity_layouts,
            offsets,
        }
    }

    /// 压力布局
    #[inline]
    pub fn pressure_layout(&self) -> FieldLayout {
        self.pressure_layout
    }

    /// 速度分量布局
    #[inline]
    pub fn layout(&self, c: Component) -> FieldLayout {
        self.velocity_layouts[c.axis()]
    }

    /// 三个速度分量布局
    #[inline]
    pub fn layouts(&self) -> [FieldLayout; 3] {
        self.velocity_layouts
    }

    /// 形状 [P, U, V, W]
    pub fn shapes(&self) -> [[usize; 3]; 4] {
        [
            self.pressure_layout.dims().as_array(),
            self.velocity_layouts[0].dims().as_array(),
            self.velocity_layouts[1].dims().as_array(),
            self.velocity_layouts[2].dims().as_array(),
        ]
    }

    /// 速度自由度总数 |U|+|V|+|W|
    #[inline]
    pub fn n_velocity(&self) -> usize {
        self.offsets[3]
    }

    /// 某分量在拼接向量中的区间
    #[inline]
    pub fn component_range(&self, c: Component) -> Range<usize> {
        self.offsets[c.axis()]..self.offsets[c.axis() + 1]
    }

    /// 各分量在拼接向量中的起点
    #[inline]
    pub fn offsets(&self) -> [usize; 4] {
        self.offsets
    }

    /// 压力
    #[inline]
    pub fn pressure(&self) -> &[f64] {
        &self.pressure
    }

    /// 可变压力
    #[inline]
    pub fn pressure_mut(&mut self) -> &mut [f64] {
        &mut self.pressure
    }

    /// 拼接的速度向量 [U | V | W]
    #[inline]
    pub fn velocity(&self) -> &[f64] {
        &self.velocity
    }

    /// 可变拼接速度向量
    #[inline]
    pub fn velocity_mut(&mut self) -> &mut [f64] {
        &mut self.velocity
    }

    /// 单个速度分量
    #[inline]
    pub fn component(&self, c: Component) -> &[f64] {
        &self.velocity[self.component_range(c)]
    }

    /// 可变单个速度分量
    pub fn component_mut(&mut self, c: Component) -> &mut [f64] {
        let range = self.component_range(c);
        &mut self.velocity[range]
    }

    /// 同时可变借用三个分量
    pub fn components_mut(&mut self) -> [&mut [f64]; 3] {
        let (u, rest) = self.velocity.split_at_mut(self.offsets[1]);
        let (v, w) = rest.split_at_mut(self.offsets[2] - self.offsets[1]);
        [u, v, w]
    }

    /// 同时可变借用速度向量与压力
    pub fn split_mut(&mut self) -> (&mut [f64], &mut [f64]) {
        (&mut self.velocity, &mut self.pressure)
    }

    /// 与外部缓冲区交换速度向量（长度必须一致）
    pub fn swap_velocity(&mut self, other: &mut Vec<f64>) {
        assert_eq!(other.len(), self.velocity.len(), "速度缓冲区长度不一致");
        std::mem::swap(&mut self.velocity, other);
    }

    /// 速度分量 (i, j, k) 处的值
    #[inline]
    pub fn value(&self, c: Component, i: usize, j: usize, k: usize) -> f64 {
        self.component(c)[self.layout(c).index(i, j, k)]
    }

    /// 压力 (i, j, k) 处的值
    #[inline]
    pub fn pressure_at(&self, i: usize, j: usize, k: usize) -> f64 {
        self.pressure[self.pressure_layout.index(i, j, k)]
    }

    /// 速度扩展数组
    #[inline]
    pub fn ext(&self, c: Component) -> &Array3<f64> {
        &self.velocity_ext[c.axis()]
    }

    /// 三个速度扩展数组
    #[inline]
    pub fn ext_all(&self) -> &[Array3<f64>; 3] {
        &self.velocity_ext
    }

    /// 压力扩展数组
    #[inline]
    pub fn pressure_ext(&self) -> &Array3<f64> {
        &self.pressure_ext
    }

    /// 拆分借用：只读展平场与可变扩展数组，供虚拟单元填充使用
    pub(crate) fn split_for_ghost_fill(
        &mut self,
    ) -> (&[f64], &[f64], &mut [Array3<f64>; 3], &mut Array3<f64>) {
        (
            &self.velocity,
            &self.pressure,
            &mut self.velocity_ext,
            &mut self.pressure_ext,
        )
    }

    /// 用常数填充速度与压力
    pub fn fill_uniform(&mut self, velocity: [f64; 3], pressure: f64) {
        for c in Component::ALL {
            let value = velocity[c.axis()];
            self.component_mut(c).fill(value);
        }
        self.pressure.fill(pressure);
    }
}
