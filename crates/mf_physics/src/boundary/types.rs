// crates/mf_physics/src/boundary/types.rs

//! 边界条件类型定义
//!
//! - [`BoundaryKind`]: 编译后的边界类型，每种类型携带自己的参数
//! - [`GhostRule`]: 切向虚拟值的构造规则
//!
//! 文档中的字符串类型在构造时一次性解析成和类型，数值路径上只做 `match`。

use mf_config::{BoundaryRecord, BoundaryType};
use serde::Serialize;
use std::fmt;

// ============================================================
// 边界类型
// ============================================================

/// 边界类型
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BoundaryKind {
    /// 无滑移：三个速度分量在面上为 0
    #[default]
    NoSlip,

    /// 自由滑移 / 对称：法向为 0，切向零梯度
    FreeSlip,

    /// 入流：面上速度为给定值，压力零梯度
    Inflow {
        /// 给定速度 (u, v, w)
        velocity: [f64; 3],
    },

    /// 出流：速度零梯度，压力 Dirichlet（缺省 p = 0）
    Outflow {
        /// 面上压力
        pressure: f64,
    },

    /// 给定压力：压力 Dirichlet，速度零梯度
    Pressure {
        /// 面上压力
        pressure: f64,
    },
}

impl BoundaryKind {
    /// 由输入记录编译
    pub fn from_record(record: &BoundaryRecord) -> Self {
        match record.kind {
            BoundaryType::NoSlip => Self::NoSlip,
            BoundaryType::FreeSlip => Self::FreeSlip,
            BoundaryType::Inflow => Self::Inflow {
                velocity: [
                    record.value_or_zero("u"),
                    record.value_or_zero("v"),
                    record.value_or_zero("w"),
                ],
            },
            BoundaryType::Outflow => Self::Outflow {
                pressure: record.value_or_zero("p"),
            },
            BoundaryType::Pressure => Self::Pressure {
                pressure: record.value_or_zero("p"),
            },
        }
    }

    /// 文档中的类型标签
    pub fn label(&self) -> BoundaryType {
        match self {
            Self::NoSlip => BoundaryType::NoSlip,
            Self::FreeSlip => BoundaryType::FreeSlip,
            Self::Inflow { .. } => BoundaryType::Inflow,
            Self::Outflow { .. } => BoundaryType::Outflow,
            Self::Pressure { .. } => BoundaryType::Pressure,
        }
    }

    /// 法向速度是否由边界给定
    ///
    /// 返回 `Some(value)` 时该面的法向自由度被钉住；`None` 表示开边界，
    /// 法向速度由内部外推并由压力校正。
    #[inline]
    pub fn normal_velocity(&self, axis: usize) -> Option<f64> {
        match self {
            Self::NoSlip | Self::FreeSlip => Some(0.0),
            Self::Inflow { velocity } => Some(velocity[axis]),
            Self::Outflow { .. } | Self::Pressure { .. } => None,
        }
    }

    /// 切向分量 `component` 的虚拟值规则
    #[inline]
    pub fn tangential_rule(&self, component: usize) -> GhostRule {
        match self {
            Self::NoSlip => GhostRule::Mirror(0.0),
            Self::Inflow { velocity } => GhostRule::Mirror(velocity[component]),
            Self::FreeSlip | Self::Outflow { .. } | Self::Pressure { .. } => GhostRule::Copy,
        }
    }

    /// Dirichlet 压力值（若有）
    #[inline]
    pub fn dirichlet_pressure(&self) -> Option<f64> {
        match self {
            Self::Outflow { pressure } | Self::Pressure { pressure } => Some(*pressure),
            _ => None,
        }
    }

    /// 是否为开边界（法向速度不被钉住）
    #[inline]
    pub fn is_open(&self) -> bool {
        self.dirichlet_pressure().is_some()
    }
}

impl fmt::Display for BoundaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inflow { velocity } => write!(
                f,
                "inflow({}, {}, {})",
                velocity[0], velocity[1], velocity[2]
            ),
            Self::Outflow { pressure } => write!(f, "outflow(p={pressure})"),
            Self::Pressure { pressure } => write!(f, "pressure(p={pressure})"),
            other => write!(f, "{}", other.label()),
        }
    }
}

// ============================================================
// 虚拟值规则
// ============================================================

/// 切向虚拟值规则
///
/// 对于面上给定值 v 的 Dirichlet 条件，虚拟值取 `2v − 内部值`，使两者的
/// 算术平均恰为 v；零梯度条件直接复制内部值。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GhostRule {
    /// 关于面上值 v 镜像
    Mirror(f64),
    /// 复制内部值
    Copy,
}

impl GhostRule {
    /// 由内部值计算虚拟值
    #[inline]
    pub fn ghost_value(&self, interior: f64) -> f64 {
        match *self {
            Self::Mirror(value) => 2.0 * value - interior,
            Self::Copy => interior,
        }
    }
}
