// crates/mf_physics/src/boundary/ghost.rs

//! 边界处理器
//!
//! 每个子步两件事：
//!
//! 1. 把被钉住的面（`Solid` → 0，`Wall(v)` → v）精确写回速度向量；
//! 2. 同步扩展数组的内部区域并填充虚拟层。
//!
//! 虚拟层按 x、y、z 轴依次填充，后处理的轴覆盖角点，结果与遍历顺序无关。
//! 沿法向的虚拟值：给定法向速度的面做线性外推 `2U₀ − U₁`（面上值保持为
//! 给定值），开边界直接复制；沿切向按 [`GhostRule`] 镜像或复制。压力在
//! Dirichlet 面取 `2p_b − p`，其余面零梯度。

use super::faces::FaceClassification;
use super::table::BoundaryTable;
use super::types::GhostRule;
use crate::fields::{Component, FieldLayout, StaggeredFields};
use ndarray::{Array3, Axis};

/// 边界处理器
#[derive(Debug, Clone, Copy)]
pub struct BoundaryApplier<'a> {
    table: &'a BoundaryTable,
    faces: &'a FaceClassification,
}

impl<'a> BoundaryApplier<'a> {
    /// 创建
    pub fn new(table: &'a BoundaryTable, faces: &'a FaceClassification) -> Self {
        Self { table, faces }
    }

    /// 钉住面值并填充虚拟层
    pub fn apply(&self, fields: &mut StaggeredFields) {
        self.enforce_faces(fields);
        self.fill_ghosts(fields);
    }

    /// 把 `Solid` 与 `Wall` 面写成精确值
    pub fn enforce_faces(&self, fields: &mut StaggeredFields) {
        for (axis, values) in fields.components_mut().into_iter().enumerate() {
            for (value, class) in values.iter_mut().zip(self.faces.classes(axis)) {
                if let Some(pinned) = class.pinned_value() {
                    *value = pinned;
                }
            }
        }
    }

    /// 被钉住的面与其给定值的最大偏差
    pub fn max_pinned_deviation(&self, fields: &StaggeredFields) -> f64 {
        Component::ALL
            .iter()
            .flat_map(|&c| {
                fields
                    .component(c)
                    .iter()
                    .zip(self.faces.classes(c.axis()))
                    .filter_map(|(&v, class)| class.pinned_value().map(|p| (v - p).abs()))
            })
            .fold(0.0, f64::max)
    }

    /// 同步扩展数组并填充虚拟层
    pub fn fill_ghosts(&self, fields: &mut StaggeredFields) {
        let layouts = fields.layouts();
        let pressure_layout = fields.pressure_layout();
        let (velocity, pressure, ext, pressure_ext) = fields.split_for_ghost_fill();

        let mut start = 0;
        for (c, e) in ext.iter_mut().enumerate() {
            let layout = layouts[c];
            let values = &velocity[start..start + layout.len()];
            start += layout.len();
            copy_interior(e, values, layout);
            for axis in 0..3 {
                if axis == c {
                    self.fill_normal(e, axis);
                } else {
                    self.fill_tangential(e, axis, c);
                }
            }
        }

        copy_interior(pressure_ext, pressure, pressure_layout);
        for axis in 0..3 {
            self.fill_pressure(pressure_ext, axis);
        }
    }

    fn fill_normal(&self, e: &mut Array3<f64>, axis: usize) {
        let pinned = [false, true].map(|is_max| {
            self.table
                .side(axis, is_max)
                .normal_velocity(axis)
                .is_some()
        });
        for mut lane in e.lanes_mut(Axis(axis)) {
            let m = lane.len();
            lane[0] = if pinned[0] {
                2.0 * lane[1] - lane[2]
            } else {
                lane[1]
            };
            lane[m - 1] = if pinned[1] {
                2.0 * lane[m - 2] - lane[m - 3]
            } else {
                lane[m - 2]
            };
        }
    }

    fn fill_tangential(&self, e: &mut Array3<f64>, axis: usize, component: usize) {
        let rules: [GhostRule; 2] =
            [false, true].map(|is_max| self.table.side(axis, is_max).tangential_rule(component));
        for mut lane in e.lanes_mut(Axis(axis)) {
            let m = lane.len();
            lane[0] = rules[0].ghost_value(lane[1]);
            lane[m - 1] = rules[1].ghost_value(lane[m - 2]);
        }
    }

    fn fill_pressure(&self, e: &mut Array3<f64>, axis: usize) {
        let rules = [false, true].map(|is_max| {
            match self.table.side(axis, is_max).dirichlet_pressure() {
                Some(p) => GhostRule::Mirror(p),
                None => GhostRule::Copy,
            }
        });
        for mut lane in e.lanes_mut(Axis(axis)) {
            let m = lane.len();
            lane[0] = rules[0].ghost_value(lane[1]);
            lane[m - 1] = rules[1].ghost_value(lane[m - 2]);
        }
    }
}

fn copy_interior(e: &mut Array3<f64>, values: &[f64], layout: FieldLayout) {
    for (idx, &v) in values.iter().enumerate() {
        let [i, j, k] = layout.coords(idx);
        e[[i + 1, j + 1, k + 1]] = v;
    }
}
