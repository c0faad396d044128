// crates/mf_physics/src/mask.rs

//! 几何掩码
//!
//! 三态编码：1 = 内部流体，0 = 固体，-1 = 贴边流体（与计算域某个面相邻、
//! 接受边界处理的流体单元）。不含 -1 的二值掩码会被提升：所有位于计算域
//! 边界层的流体单元标记为 -1。

use crate::error::{PhysicsError, PhysicsResult};
use mf_config::GeometryDefinition;
use mf_foundation::{Dims3, FlatteningOrder};
use serde::Serialize;

/// 单元类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(i8)]
pub enum CellKind {
    /// 贴边流体
    BoundaryFluid = -1,
    /// 固体
    Solid = 0,
    /// 内部流体
    Fluid = 1,
}

impl CellKind {
    /// 由掩码整数值解析
    pub fn from_value(value: i64) -> Option<Self> {
        match value {
            -1 => Some(Self::BoundaryFluid),
            0 => Some(Self::Solid),
            1 => Some(Self::Fluid),
            _ => None,
        }
    }

    /// 掩码整数值
    #[inline]
    pub fn value(self) -> i8 {
        self as i8
    }

    /// 是否为流体（含贴边流体）
    #[inline]
    pub fn is_fluid(self) -> bool {
        !matches!(self, Self::Solid)
    }
}

/// 三态几何掩码（构造后不可变）
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryMask {
    dims: Dims3,
    order: FlatteningOrder,
    cells: Vec<CellKind>,
    n_fluid: usize,
    lifted: bool,
}

impl GeometryMask {
    /// 全流体掩码（边界层标记为 -1）
    pub fn all_fluid(dims: Dims3, order: FlatteningOrder) -> Self {
        let mut cells = vec![CellKind::Fluid; dims.len()];
        Self::lift(&mut cells, dims, order);
        Self {
            dims,
            order,
            n_fluid: cells.len(),
            cells,
            lifted: true,
        }
    }

    /// 由展平的整数掩码构造
    ///
    /// 长度、形状、取值或 -1 单元位置不合法，以及没有流体单元时返回
    /// `InvalidGeometry`。
    pub fn from_flat(
        values: &[i64],
        shape: Option<&[usize]>,
        dims: Dims3,
        order: FlatteningOrder,
    ) -> PhysicsResult<Self> {
        if let Some(shape) = shape {
            if shape != dims.as_array().as_slice() {
                return Err(PhysicsError::invalid_geometry(format!(
                    "geometry_mask_shape {shape:?} 与网格 {dims} 不一致"
                )));
            }
        }
        if values.len() != dims.len() {
            return Err(PhysicsError::invalid_geometry(format!(
                "掩码长度 {} 不等于 nx·ny·nz = {}",
                values.len(),
                dims.len()
            )));
        }

        let mut cells = Vec::with_capacity(values.len());
        let mut has_boundary_fluid = false;
        for (idx, &value) in values.iter().enumerate() {
            let kind = CellKind::from_value(value).ok_or_else(|| {
                PhysicsError::invalid_geometry(format!(
                    "掩码第 {idx} 个元素取值 {value} 不在 {{-1, 0, 1}} 中"
                ))
            })?;
            if kind == CellKind::BoundaryFluid {
                let (i, j, k) = order.unflatten(dims, idx);
                if !dims.on_boundary(i, j, k) {
                    return Err(PhysicsError::invalid_geometry(format!(
                        "单元 ({i}, {j}, {k}) 标记为贴边流体 (-1)，但不在计算域边界上"
                    )));
                }
                has_boundary_fluid = true;
            }
            cells.push(kind);
        }

        let n_fluid = cells.iter().filter(|c| c.is_fluid()).count();
        if n_fluid == 0 {
            return Err(PhysicsError::invalid_geometry("掩码中没有流体单元"));
        }

        let lifted = !has_boundary_fluid;
        if lifted {
            log::warn!("几何掩码不含 -1，按二值掩码处理：边界层流体单元标记为贴边流体");
            Self::lift(&mut cells, dims, order);
        }

        Ok(Self {
            dims,
            order,
            cells,
            n_fluid,
            lifted,
        })
    }

    /// 由输入文档的几何段构造，缺省为全流体
    pub fn from_definition(
        definition: Option<&GeometryDefinition>,
        dims: Dims3,
    ) -> PhysicsResult<Self> {
        match definition {
            Some(def) => Self::from_flat(
                &def.geometry_mask_flat,
                def.geometry_mask_shape.as_deref(),
                dims,
                def.flattening_order,
            ),
            None => Ok(Self::all_fluid(dims, FlatteningOrder::default())),
        }
    }

    fn lift(cells: &mut [CellKind], dims: Dims3, order: FlatteningOrder) {
        for (idx, cell) in cells.iter_mut().enumerate() {
            if *cell == CellKind::Fluid {
                let (i, j, k) = order.unflatten(dims, idx);
                if dims.on_boundary(i, j, k) {
                    *cell = CellKind::BoundaryFluid;
                }
            }
        }
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

    /// 是否由二值掩码提升而来
    pub fn was_lifted(&self) -> bool {
        self.lifted
    }

    /// (i, j, k) 处单元类别
    #[inline]
    pub fn kind(&self, i: usize, j: usize, k: usize) -> CellKind {
        self.cells[self.order.index(self.dims, i, j, k)]
    }

    /// 按一维下标取单元类别
    #[inline]
    pub fn kind_at(&self, idx: usize) -> CellKind {
        self.cells[idx]
    }

    /// (i, j, k) 是否为流体
    #[inline]
    pub fn is_fluid(&self, i: usize, j: usize, k: usize) -> bool {
        self.kind(i, j, k).is_fluid()
    }

    /// 一维下标处是否为流体
    #[inline]
    pub fn is_fluid_at(&self, idx: usize) -> bool {
        self.cells[idx].is_fluid()
    }

    /// 流体单元数
    #[inline]
    pub fn n_fluid(&self) -> usize {
        self.n_fluid
    }

    /// 按一维下标升序列出流体单元
    pub fn fluid_cells(&self) -> Vec<usize> {
        (0..self.cells.len()).filter(|&c| self.is_fluid_at(c)).collect()
    }

    /// 整数形式的掩码（展平顺序与构造时一致）
    pub fn to_values(&self) -> Vec<i8> {
        self.cells.iter().map(|c| c.value()).collect()
    }
}
