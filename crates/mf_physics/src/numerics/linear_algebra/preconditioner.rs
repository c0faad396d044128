// crates/mf_physics/src/numerics/linear_algebra/preconditioner.rs

//! 预条件器
//!
//! 将 Ax = b 转换为条件数更好的 M⁻¹Ax = M⁻¹b。压力泊松方程的约化矩阵是
//! 对称正定的，这里的三种预条件器都保持对称性，可用于 PCG。
//!
//! - [`IdentityPreconditioner`]: 无预条件
//! - [`JacobiPreconditioner`]: 对角预条件
//! - [`SsorPreconditioner`]: 对称逐次超松弛

use super::csr::CsrMatrix;

/// 预条件器 trait
///
/// 核心操作是 `apply`: z = M⁻¹ * r
pub trait Preconditioner: Send + Sync {
    /// 应用预条件器: z = M⁻¹ * r
    fn apply(&self, r: &[f64], z: &mut [f64]);

    /// 名称
    fn name(&self) -> &'static str;
}

/// 恒等预条件器（M = I）
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityPreconditioner;

impl Preconditioner for IdentityPreconditioner {
    fn apply(&self, r: &[f64], z: &mut [f64]) {
        z.copy_from_slice(r);
    }

    fn name(&self) -> &'static str {
        "Identity"
    }
}

/// 对角元过小时退化为单位预条件的阈值
const DIAG_THRESHOLD: f64 = 1e-300;

/// Jacobi 预条件器（M = diag(A)）
#[derive(Debug, Clone)]
pub struct JacobiPreconditioner {
    inv_diag: Vec<f64>,
}

impl JacobiPreconditioner {
    /// 从 CSR 矩阵创建
    pub fn from_matrix(matrix: &CsrMatrix) -> Self {
        let inv_diag = matrix
            .extract_diagonal()
            .into_iter()
            .map(|d| if d.abs() > DIAG_THRESHOLD { 1.0 / d } else { 1.0 })
            .collect();
        Self { inv_diag }
    }

    /// 对角元倒数
    pub fn inv_diagonal(&self) -> &[f64] {
        &self.inv_diag
    }
}

impl Preconditioner for JacobiPreconditioner {
    fn apply(&self, r: &[f64], z: &mut [f64]) {
        debug_assert_eq!(r.len(), self.inv_diag.len());
        for ((zi, &ri), &inv_d) in z.iter_mut().zip(r.iter()).zip(self.inv_diag.iter()) {
            *zi = ri * inv_d;
        }
    }

    fn name(&self) -> &'static str {
        "Jacobi"
    }
}

/// SSOR 预条件器
///
/// M ∝ (D + ωL) D⁻¹ (D + ωU)，L、U 为 A 的严格下、上三角部分。
#[derive(Debug, Clone)]
pub struct SsorPreconditioner {
    matrix: CsrMatrix,
    diag: Vec<f64>,
    omega: f64,
}

impl SsorPreconditioner {
    /// 从 CSR 矩阵创建
    ///
    /// `omega` 通常取 1.0 到 1.8。
    pub fn from_matrix(matrix: &CsrMatrix, omega: f64) -> Self {
        let diag = matrix
            .extract_diagonal()
            .into_iter()
            .map(|d| if d.abs() > DIAG_THRESHOLD { d } else { 1.0 })
            .collect();
        Self {
            matrix: matrix.clone(),
            diag,
            omega,
        }
    }

    /// 松弛因子
    pub fn omega(&self) -> f64 {
        self.omega
    }
}

impl Preconditioner for SsorPreconditioner {
    fn apply(&self, r: &[f64], z: &mut [f64]) {
        let n = self.diag.len();

        // 前向扫描: (D + ωL) y = r
        for i in 0..n {
            let mut sum = r[i];
            for (j, a) in self.matrix.row(i).iter() {
                if j < i {
                    sum -= self.omega * a * z[j];
                }
            }
            z[i] = sum / self.diag[i];
        }

        // 对角缩放: y = D (2 - ω) y
        let scale = 2.0 - self.omega;
        for i in 0..n {
            z[i] *= self.diag[i] * scale;
        }

        // 后向扫描: (D + ωU) z = y
        for i in (0..n).rev() {
            let mut sum = z[i];
            for (j, a) in self.matrix.row(i).iter() {
                if j > i {
                    sum -= self.omega * a * z[j];
                }
            }
            z[i] = sum / self.diag[i];
        }
    }

    fn name(&self) -> &'static str {
        "SSOR"
    }
}
