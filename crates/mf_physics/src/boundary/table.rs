// crates/mf_physics/src/boundary/table.rs

//! 边界表：六个面 → 边界类型
//!
//! 输入中未出现的面为无滑移。表在求解器状态构造时编译一次，此后只读。

use super::types::BoundaryKind;
use crate::error::{PhysicsError, PhysicsResult};
use mf_config::{BoundaryRecord, FaceLocation};
use serde::Serialize;

/// 边界表
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct BoundaryTable {
    kinds: [BoundaryKind; 6],
}

impl BoundaryTable {
    /// 全部无滑移
    pub fn all_no_slip() -> Self {
        Self::default()
    }

    /// 由输入记录编译；同一面出现两次返回 `Config` 错误
    pub fn from_records(records: &[BoundaryRecord]) -> PhysicsResult<Self> {
        let mut table = Self::default();
        let mut seen = [false; 6];
        for record in records {
            let slot = record.location.ordinal();
            if seen[slot] {
                return Err(PhysicsError::config(format!(
                    "边界面 {} 重复定义",
                    record.location
                )));
            }
            seen[slot] = true;
            table.kinds[slot] = BoundaryKind::from_record(record);
        }
        for face in FaceLocation::ALL {
            log::debug!("边界 {face}: {}", table.get(face));
        }
        Ok(table)
    }

    /// 设置某个面
    pub fn with(mut self, face: FaceLocation, kind: BoundaryKind) -> Self {
        self.kinds[face.ordinal()] = kind;
        self
    }

    /// 查询某个面
    #[inline]
    pub fn get(&self, face: FaceLocation) -> BoundaryKind {
        self.kinds[face.ordinal()]
    }

    /// 按轴与侧查询
    #[inline]
    pub fn side(&self, axis: usize, is_max: bool) -> BoundaryKind {
        self.kinds[axis * 2 + usize::from(is_max)]
    }

    /// 遍历 (面, 类型)
    pub fn iter(&self) -> impl Iterator<Item = (FaceLocation, BoundaryKind)> + '_ {
        FaceLocation::ALL.into_iter().map(|face| (face, self.get(face)))
    }

    /// 是否存在 Dirichlet 压力面
    pub fn has_dirichlet_pressure(&self) -> bool {
        self.kinds.iter().any(BoundaryKind::is_open)
    }
}
