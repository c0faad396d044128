// crates/mf_foundation/src/index.rs

//! 三维结构化索引
//!
//! 所有三维数组（掩码、压力、各速度分量、算子的自由度编号、快照数据）都通过
//! 同一个 [`FlatteningOrder`] 在 `(i, j, k)` 与一维下标之间转换。顺序在读取
//! 几何掩码时确定，此后所有展平/重排都必须使用它。

use crate::error::MfError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 三维数组的维度 (ni, nj, nk)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dims3 {
    /// x 方向长度
    pub ni: usize,
    /// y 方向长度
    pub nj: usize,
    /// z 方向长度
    pub nk: usize,
}

impl Dims3 {
    /// 创建维度
    pub const fn new(ni: usize, nj: usize, nk: usize) -> Self {
        Self { ni, nj, nk }
    }

    /// 元素总数
    #[inline]
    pub const fn len(&self) -> usize {
        self.ni * self.nj * self.nk
    }

    /// 是否为空
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 以数组形式返回
    #[inline]
    pub const fn as_array(&self) -> [usize; 3] {
        [self.ni, self.nj, self.nk]
    }

    /// 指定轴的长度
    #[inline]
    pub const fn axis(&self, axis: usize) -> usize {
        match axis {
            0 => self.ni,
            1 => self.nj,
            _ => self.nk,
        }
    }

    /// 沿某轴加一后的维度（交错网格面数组）
    pub const fn grown(&self, axis: usize) -> Self {
        match axis {
            0 => Self::new(self.ni + 1, self.nj, self.nk),
            1 => Self::new(self.ni, self.nj + 1, self.nk),
            _ => Self::new(self.ni, self.nj, self.nk + 1),
        }
    }

    /// (i, j, k) 是否位于边界层（任一方向取首或末）
    pub fn on_boundary(&self, i: usize, j: usize, k: usize) -> bool {
        i == 0 || j == 0 || k == 0 || i + 1 == self.ni || j + 1 == self.nj || k + 1 == self.nk
    }
}

impl fmt::Display for Dims3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.ni, self.nj, self.nk)
    }
}

/// 展平顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FlatteningOrder {
    /// `i + nx·(j + ny·k)`：i 变化最快
    #[default]
    #[serde(rename = "i + nx·(j + ny·k)", alias = "i + nx*(j + ny*k)")]
    IFastest,
    /// `j + ny·(i + nx·k)`：j 变化最快
    #[serde(rename = "j + ny·(i + nx·k)", alias = "j + ny*(i + nx*k)")]
    JFastest,
}

impl FlatteningOrder {
    /// 规范表示
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IFastest => "i + nx·(j + ny·k)",
            Self::JFastest => "j + ny·(i + nx·k)",
        }
    }

    /// (i, j, k) → 一维下标
    #[inline]
    pub fn index(&self, dims: Dims3, i: usize, j: usize, k: usize) -> usize {
        debug_assert!(i < dims.ni && j < dims.nj && k < dims.nk);
        match self {
            Self::IFastest => i + dims.ni * (j + dims.nj * k),
            Self::JFastest => j + dims.nj * (i + dims.ni * k),
        }
    }

    /// 一维下标 → (i, j, k)
    #[inline]
    pub fn unflatten(&self, dims: Dims3, idx: usize) -> (usize, usize, usize) {
        debug_assert!(idx < dims.len());
        match self {
            Self::IFastest => {
                let i = idx % dims.ni;
                let rest = idx / dims.ni;
                (i, rest % dims.nj, rest / dims.nj)
            }
            Self::JFastest => {
                let j = idx % dims.nj;
                let rest = idx / dims.nj;
                (rest % dims.ni, j, rest / dims.ni)
            }
        }
    }
}

impl fmt::Display for FlatteningOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FlatteningOrder {
    type Err = MfError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| if c == '·' { '*' } else { c })
            .collect();
        match compact.as_str() {
            "i+nx*(j+ny*k)" => Ok(Self::IFastest),
            "j+ny*(i+nx*k)" => Ok(Self::JFastest),
            _ => Err(MfError::invalid_input(format!("未知的展平顺序: {s}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_unflatten_inverse() {
        let dims = Dims3::new(3, 4, 2);
        for order in [FlatteningOrder::IFastest, FlatteningOrder::JFastest] {
            let mut seen = vec![false; dims.len()];
            for k in 0..dims.nk {
                for j in 0..dims.nj {
                    for i in 0..dims.ni {
                        let idx = order.index(dims, i, j, k);
                        assert!(!seen[idx]);
                        seen[idx] = true;
                        assert_eq!(order.unflatten(dims, idx), (i, j, k));
                    }
                }
            }
            assert!(seen.iter().all(|&s| s));
        }
    }

    #[test]
    fn test_fastest_axis() {
        let dims = Dims3::new(3, 4, 2);
        assert_eq!(FlatteningOrder::IFastest.index(dims, 1, 0, 0), 1);
        assert_eq!(FlatteningOrder::IFastest.index(dims, 0, 1, 0), 3);
        assert_eq!(FlatteningOrder::JFastest.index(dims, 0, 1, 0), 1);
        assert_eq!(FlatteningOrder::JFastest.index(dims, 1, 0, 0), 4);
        assert_eq!(FlatteningOrder::JFastest.index(dims, 0, 0, 1), 12);
    }

    #[test]
    fn test_parse_and_serde_aliases() {
        assert_eq!(
            "i + nx*(j + ny*k)".parse::<FlatteningOrder>().unwrap(),
            FlatteningOrder::IFastest
        );
        assert_eq!(
            "j + ny·(i + nx·k)".parse::<FlatteningOrder>().unwrap(),
            FlatteningOrder::JFastest
        );
        assert!("k + nz*(i)".parse::<FlatteningOrder>().is_err());

        let parsed: FlatteningOrder = serde_json::from_str("\"j + ny*(i + nx*k)\"").unwrap();
        assert_eq!(parsed, FlatteningOrder::JFastest);
        let json = serde_json::to_string(&FlatteningOrder::IFastest).unwrap();
        assert_eq!(json, "\"i + nx·(j + ny·k)\"");
    }

    #[test]
    fn test_on_boundary() {
        let dims = Dims3::new(4, 4, 4);
        assert!(dims.on_boundary(0, 2, 2));
        assert!(dims.on_boundary(1, 3, 1));
        assert!(!dims.on_boundary(1, 2, 1));
        let flat = Dims3::new(1, 3, 3);
        assert!(flat.on_boundary(0, 1, 1));
    }
}
