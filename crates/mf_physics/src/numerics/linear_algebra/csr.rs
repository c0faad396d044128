// crates/mf_physics/src/numerics/linear_algebra/csr.rs

//! 压缩稀疏行（CSR）矩阵格式
//!
//! 交错网格上的所有离散算子（散度、梯度、各分量拉普拉斯、压力泊松矩阵）
//! 都以 CSR 形式存储：
//! - 高效的矩阵-向量乘法 (SpMV)
//! - 行遍历（预条件器、带状分解的装配）
//! - 稀疏矩阵乘积 `Lp = D · G` 与块的纵向拼接
//!
//! # 特性开关
//!
//! - `parallel`: 启用基于 `rayon` 的并行矩阵-向量乘法
//!
//! # 格式说明
//!
//! CSR 使用三个数组存储：
//! - `row_ptr`: 行指针，长度 n_rows + 1，row_ptr[i] 是第 i 行第一个非零元的索引
//! - `col_idx`: 列索引，每行内升序
//! - `values`: 非零元值
//!
//! # 使用示例
//!
//! ```
//! use mf_physics::numerics::linear_algebra::CsrBuilder;
//!
//! let mut builder = CsrBuilder::new_square(3);
//! builder.set(0, 0, 4.0);
//! builder.set(0, 1, -1.0);
//! builder.set(1, 0, -1.0);
//! builder.set(1, 1, 4.0);
//! builder.set(2, 2, 4.0);
//! let matrix = builder.build();
//!
//! let x = vec![1.0, 2.0, 3.0];
//! let mut y = vec![0.0; 3];
//! matrix.mul_vec(&x, &mut y);
//! assert_eq!(y, vec![2.0, 7.0, 12.0]);
//! ```

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use std::collections::BTreeMap;

/// 行数超过该值时 `mul_vec` 走并行路径
#[cfg(feature = "parallel")]
const PARALLEL_ROW_THRESHOLD: usize = 4096;

// =============================================================================
// 稀疏模式
// =============================================================================

/// CSR 矩阵的稀疏模式
///
/// 存储矩阵的结构信息（哪些位置有非零元），与值分离。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrPattern {
    n_rows: usize,
    n_cols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
}

impl CsrPattern {
    /// 行数
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// 列数
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// 非零元数量
    #[inline]
    pub fn nnz(&self) -> usize {
        self.col_idx.len()
    }

    /// 行指针切片
    #[inline]
    pub fn row_ptr(&self) -> &[usize] {
        &self.row_ptr
    }

    /// 列索引切片
    #[inline]
    pub fn col_idx(&self) -> &[usize] {
        &self.col_idx
    }

    /// 第 row 行的非零元列索引
    #[inline]
    pub fn row_indices(&self, row: usize) -> &[usize] {
        &self.col_idx[self.row_ptr[row]..self.row_ptr[row + 1]]
    }

    /// 查找 (row, col) 对应的值索引
    pub fn find_index(&self, row: usize, col: usize) -> Option<usize> {
        let start = self.row_ptr[row];
        self.row_indices(row)
            .binary_search(&col)
            .ok()
            .map(|local| start + local)
    }
}

// =============================================================================
// CSR 矩阵
// =============================================================================

/// CSR 稀疏矩阵
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    pattern: CsrPattern,
    values: Vec<f64>,
}

impl CsrMatrix {
    /// 从原始数组创建
    ///
    /// # Panics
    /// - `row_ptr.len() != n_rows + 1`
    /// - `col_idx.len() != values.len()`
    pub fn from_raw(
        n_rows: usize,
        n_cols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<f64>,
    ) -> Self {
        assert_eq!(row_ptr.len(), n_rows + 1, "row_ptr 长度必须为 n_rows + 1");
        assert_eq!(col_idx.len(), values.len(), "col_idx 与 values 长度不一致");
        debug_assert!(col_idx.iter().all(|&c| c < n_cols), "列索引越界");
        Self {
            pattern: CsrPattern {
                n_rows,
                n_cols,
                row_ptr,
                col_idx,
            },
            values,
        }
    }

    /// 单位矩阵
    pub fn identity(n: usize) -> Self {
        Self::from_raw(n, n, (0..=n).collect(), (0..n).collect(), vec![1.0; n])
    }

    /// 无非零元的 n_rows × n_cols 矩阵
    pub fn zeros(n_rows: usize, n_cols: usize) -> Self {
        Self::from_raw(n_rows, n_cols, vec![0; n_rows + 1], Vec::new(), Vec::new())
    }

    /// 行数
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.pattern.n_rows
    }

    /// 列数
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.pattern.n_cols
    }

    /// 非零元数量
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// 稀疏模式
    #[inline]
    pub fn pattern(&self) -> &CsrPattern {
        &self.pattern
    }

    /// 非零元值
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// 读取 (row, col)，不存在返回 0
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.pattern
            .find_index(row, col)
            .map_or(0.0, |idx| self.values[idx])
    }

    /// 第 row 行视图
    #[inline]
    pub fn row(&self, row: usize) -> RowView<'_> {
        let start = self.pattern.row_ptr[row];
        let end = self.pattern.row_ptr[row + 1];
        RowView {
            indices: &self.pattern.col_idx[start..end],
            values: &self.values[start..end],
        }
    }

    /// 对角元（不存在为 0）
    pub fn diagonal_value(&self, row: usize) -> f64 {
        self.get(row, row)
    }

    /// 提取对角线
    pub fn extract_diagonal(&self) -> Vec<f64> {
        (0..self.n_rows().min(self.n_cols()))
            .map(|i| self.diagonal_value(i))
            .collect()
    }

    /// y = A·x
    ///
    /// 启用 `parallel` 特性且行数较多时自动使用并行路径。
    ///
    /// # Panics
    /// - `x.len() != self.n_cols()`
    /// - `y.len() != self.n_rows()`
    #[cfg(feature = "parallel")]
    pub fn mul_vec(&self, x: &[f64], y: &mut [f64]) {
        if self.n_rows() >= PARALLEL_ROW_THRESHOLD {
            self.mul_vec_parallel(x, y);
        } else {
            self.mul_vec_serial(x, y);
        }
    }

    /// y = A·x
    #[cfg(not(feature = "parallel"))]
    pub fn mul_vec(&self, x: &[f64], y: &mut [f64]) {
        self.mul_vec_serial(x, y);
    }

    /// 串行 y = A·x
    pub fn mul_vec_serial(&self, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), self.n_cols(), "x 长度必须等于矩阵列数");
        assert_eq!(y.len(), self.n_rows(), "y 长度必须等于矩阵行数");

        for (row, out) in y.iter_mut().enumerate() {
            *out = self.row_dot(row, x);
        }
    }

    /// 并行 y = A·x（需启用 `parallel` 特性）
    #[cfg(feature = "parallel")]
    pub fn mul_vec_parallel(&self, x: &[f64], y: &mut [f64]) {
        assert_eq!(x.len(), self.n_cols(), "x 长度必须等于矩阵列数");
        assert_eq!(y.len(), self.n_rows(), "y 长度必须等于矩阵行数");

        y.par_iter_mut()
            .enumerate()
            .for_each(|(row, out)| *out = self.row_dot(row, x));
    }

    #[inline]
    fn row_dot(&self, row: usize, x: &[f64]) -> f64 {
        let start = self.pattern.row_ptr[row];
        let end = self.pattern.row_ptr[row + 1];
        let mut sum = 0.0;
        for idx in start..end {
            sum += self.values[idx] * x[self.pattern.col_idx[idx]];
        }
        sum
    }

    /// 稀疏矩阵乘积 C = A·B（Gustavson 行累加）
    ///
    /// 结构上出现但数值抵消为零的元素保留在模式中。
    ///
    /// # Panics
    /// - `self.n_cols() != other.n_rows()`
    pub fn mul_mat(&self, other: &CsrMatrix) -> CsrMatrix {
        assert_eq!(self.n_cols(), other.n_rows(), "矩阵乘积维度不匹配");

        let n_cols = other.n_cols();
        let mut acc = vec![0.0; n_cols];
        let mut marker = vec![usize::MAX; n_cols];
        let mut cols: Vec<usize> = Vec::new();

        let mut row_ptr = Vec::with_capacity(self.n_rows() + 1);
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        row_ptr.push(0);

        for row in 0..self.n_rows() {
            cols.clear();
            for (k, a) in self.row(row).iter() {
                for (j, b) in other.row(k).iter() {
                    if marker[j] != row {
                        marker[j] = row;
                        acc[j] = 0.0;
                        cols.push(j);
                    }
                    acc[j] += a * b;
                }
            }
            cols.sort_unstable();
            for &j in &cols {
                col_idx.push(j);
                values.push(acc[j]);
            }
            row_ptr.push(col_idx.len());
        }

        CsrMatrix::from_raw(self.n_rows(), n_cols, row_ptr, col_idx, values)
    }

    /// 纵向拼接若干列数相同的块
    ///
    /// # Panics
    /// - 块为空或列数不一致
    pub fn vstack(blocks: &[&CsrMatrix]) -> CsrMatrix {
        assert!(!blocks.is_empty(), "至少需要一个块");
        let n_cols = blocks[0].n_cols();
        assert!(
            blocks.iter().all(|b| b.n_cols() == n_cols),
            "拼接的块列数必须一致"
        );

        let n_rows: usize = blocks.iter().map(|b| b.n_rows()).sum();
        let nnz: usize = blocks.iter().map(|b| b.nnz()).sum();
        let mut row_ptr = Vec::with_capacity(n_rows + 1);
        let mut col_idx = Vec::with_capacity(nnz);
        let mut values = Vec::with_capacity(nnz);
        row_ptr.push(0);

        for block in blocks {
            let offset = col_idx.len();
            row_ptr.extend(block.pattern.row_ptr[1..].iter().map(|&p| p + offset));
            col_idx.extend_from_slice(&block.pattern.col_idx);
            values.extend_from_slice(&block.values);
        }

        CsrMatrix::from_raw(n_rows, n_cols, row_ptr, col_idx, values)
    }

    /// 主子矩阵：保留 `index` 所列的行与列（按 `index` 的顺序重新编号）
    pub fn principal_submatrix(&self, index: &[usize]) -> CsrMatrix {
        let mut map = vec![usize::MAX; self.n_cols()];
        for (new, &old) in index.iter().enumerate() {
            map[old] = new;
        }

        let mut row_ptr = Vec::with_capacity(index.len() + 1);
        let mut col_idx = Vec::new();
        let mut values = Vec::new();
        let mut entries: Vec<(usize, f64)> = Vec::new();
        row_ptr.push(0);

        for &old_row in index {
            entries.clear();
            for (col, value) in self.row(old_row).iter() {
                if map[col] != usize::MAX {
                    entries.push((map[col], value));
                }
            }
            entries.sort_unstable_by_key(|&(c, _)| c);
            for &(c, v) in &entries {
                col_idx.push(c);
                values.push(v);
            }
            row_ptr.push(col_idx.len());
        }

        CsrMatrix::from_raw(index.len(), index.len(), row_ptr, col_idx, values)
    }

    /// 所有值乘以 s
    pub fn scale(&mut self, s: f64) {
        for v in &mut self.values {
            *v *= s;
        }
    }

    /// 半带宽 max |i − j|
    pub fn bandwidth(&self) -> usize {
        (0..self.n_rows())
            .flat_map(|row| self.row(row).indices.iter().map(move |&c| row.abs_diff(c)))
            .max()
            .unwrap_or(0)
    }

    /// 检查对称性
    pub fn is_symmetric(&self, tol: f64) -> bool {
        if self.n_rows() != self.n_cols() {
            return false;
        }
        (0..self.n_rows()).all(|row| {
            self.row(row)
                .iter()
                .all(|(col, v)| (v - self.get(col, row)).abs() <= tol)
        })
    }
}

/// 行视图
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    indices: &'a [usize],
    values: &'a [f64],
}

impl<'a> RowView<'a> {
    /// 非零元个数
    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// 是否为空行
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// 列索引
    #[inline]
    pub fn indices(&self) -> &'a [usize] {
        self.indices
    }

    /// 值
    #[inline]
    pub fn values(&self) -> &'a [f64] {
        self.values
    }

    /// 遍历 (列, 值)
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + 'a {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }
}

// =============================================================================
// 构建器
// =============================================================================

/// CSR 矩阵构建器
///
/// 逐元素装配，重复位置可以覆盖（`set`）或累加（`add`）。
#[derive(Debug, Clone)]
pub struct CsrBuilder {
    n_cols: usize,
    rows: Vec<BTreeMap<usize, f64>>,
}

impl CsrBuilder {
    /// 方阵构建器
    #[inline]
    pub fn new_square(n: usize) -> Self {
        Self::new(n, n)
    }

    /// n_rows × n_cols 构建器
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_cols,
            rows: vec![BTreeMap::new(); n_rows],
        }
    }

    /// 行数
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// 设置 (row, col) 的值（覆盖）
    ///
    /// # Panics
    /// - 行或列越界
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        assert!(col < self.n_cols, "列索引越界");
        self.rows[row].insert(col, value);
    }

    /// 累加到 (row, col)
    ///
    /// # Panics
    /// - 行或列越界
    pub fn add(&mut self, row: usize, col: usize, value: f64) {
        assert!(col < self.n_cols, "列索引越界");
        *self.rows[row].entry(col).or_insert(0.0) += value;
    }

    /// 当前 (row, col) 的值（不存在返回 0）
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.rows[row].get(&col).copied().unwrap_or(0.0)
    }

    /// 当前非零元总数
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(BTreeMap::len).sum()
    }

    /// 构建 CSR 矩阵（消耗构建器）
    pub fn build(self) -> CsrMatrix {
        let n_rows = self.rows.len();
        let nnz = self.nnz();
        let mut row_ptr = Vec::with_capacity(n_rows + 1);
        let mut col_idx = Vec::with_capacity(nnz);
        let mut values = Vec::with_capacity(nnz);
        row_ptr.push(0);

        for row in self.rows {
            for (col, value) in row {
                col_idx.push(col);
                values.push(value);
            }
            row_ptr.push(col_idx.len());
        }

        CsrMatrix::from_raw(n_rows, self.n_cols, row_ptr, col_idx, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn dense(m: &CsrMatrix) -> Vec<Vec<f64>> {
        (0..m.n_rows())
            .map(|i| (0..m.n_cols()).map(|j| m.get(i, j)).collect())
            .collect()
    }

    fn sample(n_rows: usize, n_cols: usize, seed: usize) -> CsrMatrix {
        let mut builder = CsrBuilder::new(n_rows, n_cols);
        for i in 0..n_rows {
            for j in 0..n_cols {
                let h = (i * 7 + j * 13 + seed * 5) % 11;
                if h < 4 {
                    builder.set(i, j, h as f64 - 1.5);
                }
            }
        }
        builder.build()
    }

    #[test]
    fn test_identity_matrix() {
        let mat = CsrMatrix::identity(5);
        assert_eq!(mat.nnz(), 5);
        for i in 0..5 {
            assert_eq!(mat.get(i, i), 1.0);
        }
        assert_eq!(mat.get(0, 1), 0.0);
    }

    #[test]
    fn test_builder_and_mul() {
        // 三对角矩阵
        let mut builder = CsrBuilder::new_square(4);
        builder.set(0, 0, 2.0);
        builder.set(0, 1, -1.0);
        builder.add(0, 1, -0.5); // 累加
        builder.set(1, 0, -1.0);
        builder.set(1, 1, 2.0);
        builder.set(1, 2, -1.0);
        builder.set(2, 1, -1.0);
        builder.set(2, 2, 2.0);
        builder.set(2, 3, -1.0);
        builder.set(3, 3, 1.0);

        let mat = builder.build();
        assert_eq!(mat.nnz(), 9);

        let x = vec![1.0, 2.0, 3.0, 4.0];
        let mut y = vec![0.0; 4];
        mat.mul_vec(&x, &mut y);

        // y[0] = 2*1 + (-1.5)*2 = -1
        assert!((y[0] + 1.0).abs() < EPS);
        assert!(y[1].abs() < EPS);
        assert!(y[2].abs() < EPS);
        assert!((y[3] - 4.0).abs() < EPS);
    }

    #[test]
    fn test_mul_mat_matches_dense_product() {
        let a = sample(5, 4, 1);
        let b = sample(4, 6, 2);
        let c = a.mul_mat(&b);
        assert_eq!((c.n_rows(), c.n_cols()), (5, 6));

        let (da, db, dc) = (dense(&a), dense(&b), dense(&c));
        for i in 0..5 {
            for j in 0..6 {
                let expected: f64 = (0..4).map(|k| da[i][k] * db[k][j]).sum();
                assert!((dc[i][j] - expected).abs() < EPS);
            }
        }
    }

    #[test]
    fn test_vstack_preserves_rows() {
        let a = sample(3, 4, 3);
        let b = CsrMatrix::zeros(2, 4);
        let c = sample(2, 4, 4);
        let stacked = CsrMatrix::vstack(&[&a, &b, &c]);
        assert_eq!(stacked.n_rows(), 7);
        assert_eq!(stacked.nnz(), a.nnz() + c.nnz());
        for j in 0..4 {
            assert_eq!(stacked.get(1, j), a.get(1, j));
            assert_eq!(stacked.get(3, j), 0.0);
            assert_eq!(stacked.get(6, j), c.get(1, j));
        }
    }

    #[test]
    fn test_principal_submatrix() {
        let a = sample(5, 5, 6);
        let keep = [0, 2, 4];
        let sub = a.principal_submatrix(&keep);
        for (ni, &oi) in keep.iter().enumerate() {
            for (nj, &oj) in keep.iter().enumerate() {
                assert_eq!(sub.get(ni, nj), a.get(oi, oj));
            }
        }
    }

    #[test]
    fn test_symmetric_check_and_bandwidth() {
        let mut builder = CsrBuilder::new_square(3);
        builder.set(0, 0, 1.0);
        builder.set(0, 2, 0.5);
        builder.set(2, 0, 0.5);
        builder.set(1, 1, 1.0);
        builder.set(2, 2, 1.0);
        let mat = builder.build();
        assert!(mat.is_symmetric(1e-12));
        assert_eq!(mat.bandwidth(), 2);

        let mut builder = CsrBuilder::new_square(2);
        builder.set(0, 1, 0.6);
        builder.set(1, 0, 0.5);
        assert!(!builder.build().is_symmetric(1e-12));
    }

    #[test]
    fn test_realistic_poisson_matrix() {
        // 二维泊松方程的 10x10 网格离散
        let n = 100;
        let mut builder = CsrBuilder::new_square(n);
        for i in 0..n {
            builder.set(i, i, 4.0);
            if i % 10 != 9 {
                builder.set(i, i + 1, -1.0);
            }
            if i % 10 != 0 {
                builder.set(i, i - 1, -1.0);
            }
            if i + 10 < n {
                builder.set(i, i + 10, -1.0);
            }
            if i >= 10 {
                builder.set(i, i - 10, -1.0);
            }
        }
        let mat = builder.build();
        assert_eq!(mat.nnz(), 5 * n - 4 * 10);
        assert_eq!(mat.bandwidth(), 10);
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_correctness() {
        let mut builder = CsrBuilder::new_square(100);
        for i in 0..100 {
            builder.set(i, i, 2.0);
            if i < 99 {
                builder.set(i, i + 1, -1.0);
            }
        }
        let mat = builder.build();

        let x: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let mut y_serial = vec![0.0; 100];
        let mut y_parallel = vec![0.0; 100];
        mat.mul_vec_serial(&x, &mut y_serial);
        mat.mul_vec_parallel(&x, &mut y_parallel);
        assert_eq!(y_serial, y_parallel, "并行结果与串行不一致");
    }
}
