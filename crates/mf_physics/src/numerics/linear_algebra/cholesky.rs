// crates/mf_physics/src/numerics/linear_algebra/cholesky.rs

//! 带状 Cholesky 直接分解
//!
//! 对半带宽为 `bw` 的对称正定矩阵做 A = L·Lᵀ 分解，存储与计算量分别为
//! O(n·bw) 与 O(n·bw²)。结构化网格按自然顺序编号时，压力泊松矩阵的半带宽
//! 约为一层单元数，适合中小规模算例。分解结果在算子重建前一直复用。

use super::csr::CsrMatrix;
use thiserror::Error;

/// 带状存储允许的最大元素数（约 800 MB）
pub const MAX_BAND_ENTRIES: usize = 100_000_000;

/// 分解失败
#[derive(Debug, Error)]
pub enum CholeskyError {
    /// 矩阵不是方阵
    #[error("矩阵不是方阵: {rows}×{cols}")]
    NotSquare {
        /// 行数
        rows: usize,
        /// 列数
        cols: usize,
    },

    /// 出现非正主元
    #[error("矩阵非正定: 第 {row} 行主元为 {pivot:.3e}")]
    NotPositiveDefinite {
        /// 行号
        row: usize,
        /// 主元值
        pivot: f64,
    },

    /// 带状存储过大
    #[error("带状存储需要 {entries} 个元素，超过上限 {limit}")]
    TooLarge {
        /// 需要的元素数
        entries: usize,
        /// 上限
        limit: usize,
    },
}

/// 带状 Cholesky 分解结果
///
/// 第 i 行存储 L[i][i-bw..=i]，行主序。
#[derive(Debug, Clone)]
pub struct BandCholesky {
    n: usize,
    bw: usize,
    data: Vec<f64>,
}

impl BandCholesky {
    /// 分解对称正定矩阵（只读取下三角部分）
    pub fn factor(matrix: &CsrMatrix) -> Result<Self, CholeskyError> {
        let n = matrix.n_rows();
        if matrix.n_cols() != n {
            return Err(CholeskyError::NotSquare {
                rows: n,
                cols: matrix.n_cols(),
            });
        }
        let bw = matrix.bandwidth();
        let entries = n.saturating_mul(bw + 1);
        if entries > MAX_BAND_ENTRIES {
            return Err(CholeskyError::TooLarge {
                entries,
                limit: MAX_BAND_ENTRIES,
            });
        }

        let mut band = Self {
            n,
            bw,
            data: vec![0.0; entries],
        };
        for i in 0..n {
            for (j, v) in matrix.row(i).iter() {
                if j <= i {
                    let idx = band.idx(i, j);
                    band.data[idx] = v;
                }
            }
        }

        for i in 0..n {
            let lo = i.saturating_sub(bw);
            for j in lo..=i {
                let k_lo = lo.max(j.saturating_sub(bw));
                let mut sum = band.data[band.idx(i, j)];
                for k in k_lo..j {
                    sum -= band.data[band.idx(i, k)] * band.data[band.idx(j, k)];
                }
                if i == j {
                    if !(sum > 0.0) {
                        return Err(CholeskyError::NotPositiveDefinite { row: i, pivot: sum });
                    }
                    let idx = band.idx(i, i);
                    band.data[idx] = sum.sqrt();
                } else {
                    let idx = band.idx(i, j);
                    band.data[idx] = sum / band.data[band.idx(j, j)];
                }
            }
        }

        Ok(band)
    }

    #[inline]
    fn idx(&self, i: usize, j: usize) -> usize {
        debug_assert!(j <= i && i - j <= self.bw);
        i * (self.bw + 1) + (j + self.bw - i)
    }

    /// 维度
    pub fn n(&self) -> usize {
        self.n
    }

    /// 半带宽
    pub fn bandwidth(&self) -> usize {
        self.bw
    }

    /// 求解 L·Lᵀ·x = b
    pub fn solve(&self, b: &[f64], x: &mut [f64]) {
        assert_eq!(b.len(), self.n, "右端项长度不匹配");
        assert_eq!(x.len(), self.n, "解向量长度不匹配");

        // 前代 L y = b
        for i in 0..self.n {
            let mut sum = b[i];
            for k in i.saturating_sub(self.bw)..i {
                sum -= self.data[self.idx(i, k)] * x[k];
            }
            x[i] = sum / self.data[self.idx(i, i)];
        }

        // 回代 Lᵀ x = y
        for i in (0..self.n).rev() {
            let mut sum = x[i];
            for k in (i + 1)..self.n.min(i + self.bw + 1) {
                sum -= self.data[self.idx(k, i)] * x[k];
            }
            x[i] = sum / self.data[self.idx(i, i)];
        }
    }
}
