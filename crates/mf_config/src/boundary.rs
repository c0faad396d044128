// crates/mf_config/src/boundary.rs

//! 边界条件记录
//!
//! 输入文档中 `boundary_conditions` 数组的条目。这里只描述文档结构与模式检查，
//! 编译成按面查找的边界表由 `mf_physics::boundary` 完成。

use mf_foundation::{ValidationError, ValidationReport};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 计算域的六个面
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaceLocation {
    /// x 最小面
    XMin,
    /// x 最大面
    XMax,
    /// y 最小面
    YMin,
    /// y 最大面
    YMax,
    /// z 最小面
    ZMin,
    /// z 最大面
    ZMax,
}

impl FaceLocation {
    /// 全部六个面（固定顺序）
    pub const ALL: [FaceLocation; 6] = [
        Self::XMin,
        Self::XMax,
        Self::YMin,
        Self::YMax,
        Self::ZMin,
        Self::ZMax,
    ];

    /// 由轴与侧构造
    pub fn from_axis(axis: usize, is_max: bool) -> Self {
        match (axis, is_max) {
            (0, false) => Self::XMin,
            (0, true) => Self::XMax,
            (1, false) => Self::YMin,
            (1, true) => Self::YMax,
            (_, false) => Self::ZMin,
            (_, true) => Self::ZMax,
        }
    }

    /// 法向所在轴（0=x, 1=y, 2=z）
    pub fn axis(&self) -> usize {
        match self {
            Self::XMin | Self::XMax => 0,
            Self::YMin | Self::YMax => 1,
            Self::ZMin | Self::ZMax => 2,
        }
    }

    /// 是否为最大侧
    pub fn is_max(&self) -> bool {
        matches!(self, Self::XMax | Self::YMax | Self::ZMax)
    }

    /// 在 [`Self::ALL`] 中的序号
    pub fn ordinal(&self) -> usize {
        self.axis() * 2 + usize::from(self.is_max())
    }

    /// 文档中的名称
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::XMin => "x_min",
            Self::XMax => "x_max",
            Self::YMin => "y_min",
            Self::YMax => "y_max",
            Self::ZMin => "z_min",
            Self::ZMax => "z_max",
        }
    }
}

impl fmt::Display for FaceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 边界条件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BoundaryType {
    /// 无滑移
    #[default]
    #[serde(alias = "no_slip", alias = "noslip", alias = "wall")]
    NoSlip,
    /// 自由滑移 / 对称
    #[serde(alias = "free_slip", alias = "symmetry")]
    FreeSlip,
    /// 入流
    Inflow,
    /// 出流
    Outflow,
    /// 给定压力
    Pressure,
}

impl fmt::Display for BoundaryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NoSlip => "no-slip",
            Self::FreeSlip => "free-slip",
            Self::Inflow => "inflow",
            Self::Outflow => "outflow",
            Self::Pressure => "pressure",
        };
        f.write_str(s)
    }
}

/// 允许出现在 `values` 中的键
pub const VALUE_KEYS: [&str; 4] = ["u", "v", "w", "p"];

/// 边界条件记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundaryRecord {
    /// 所在面
    pub location: FaceLocation,
    /// 类型
    #[serde(rename = "type")]
    pub kind: BoundaryType,
    /// 参数（u, v, w, p）
    #[serde(default)]
    pub values: BTreeMap<String, f64>,
    /// 备注
    #[serde(default)]
    pub comment: String,
}

impl BoundaryRecord {
    /// 创建记录
    pub fn new(location: FaceLocation, kind: BoundaryType) -> Self {
        Self {
            location,
            kind,
            values: BTreeMap::new(),
            comment: String::new(),
        }
    }

    /// 设置参数
    pub fn with_value(mut self, key: &str, value: f64) -> Self {
        self.values.insert(key.to_string(), value);
        self
    }

    /// 读取参数，缺省为 0
    pub fn value_or_zero(&self, key: &str) -> f64 {
        self.values.get(key).copied().unwrap_or(0.0)
    }

    /// 该类型会读取的参数
    pub fn used_keys(&self) -> &'static [&'static str] {
        match self.kind {
            BoundaryType::Inflow => &["u", "v", "w"],
            BoundaryType::Outflow | BoundaryType::Pressure => &["p"],
            BoundaryType::NoSlip | BoundaryType::FreeSlip => &[],
        }
    }

    pub(crate) fn validate_into(&self, index: usize, report: &mut ValidationReport) {
        for (key, &value) in &self.values {
            let field = format!("boundary_conditions[{index}].values.{key}");
            if !VALUE_KEYS.contains(&key.as_str()) {
                report.add_error(ValidationError::Invalid {
                    field,
                    reason: format!("未知的参数名 '{key}'，允许: u, v, w, p"),
                });
                continue;
            }
            if report.check_finite(&field, value) && !self.used_keys().contains(&key.as_str()) {
                report.add_warning(field, format!("{} 边界不使用该参数，已忽略", self.kind));
            }
        }
    }
}

/// 检查整张边界列表（每个面至多一条记录）
pub(crate) fn validate_boundaries(records: &[BoundaryRecord], report: &mut ValidationReport) {
    let mut seen = [false; 6];
    for (index, record) in records.iter().enumerate() {
        let slot = record.location.ordinal();
        if seen[slot] {
            report.add_error(ValidationError::Duplicate {
                field: format!("boundary_conditions[{index}].location"),
                value: record.location.to_string(),
            });
        }
        seen[slot] = true;
        record.validate_into(index, report);
    }
}
