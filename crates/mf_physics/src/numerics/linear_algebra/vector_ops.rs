// crates/mf_physics/src/numerics/linear_algebra/vector_ops.rs

//! 向量运算（BLAS Level 1 风格）
//!
//! 迭代求解器与投影步骤共用的基础运算。
//!
//! - [`dot`]: 点积 x·y
//! - [`norm2`]: 二范数 ||x||₂
//! - [`axpy`]: y = α*x + y
//! - [`xpay`]: y = x + α*y
//! - [`mean`] / [`remove_mean`]: 奇异压力系统的零均值投影

/// 点积 x·y
#[inline]
pub fn dot(x: &[f64], y: &[f64]) -> f64 {
    debug_assert_eq!(x.len(), y.len());
    x.iter().zip(y.iter()).map(|(a, b)| a * b).sum()
}

/// 二范数 ||x||₂
#[inline]
pub fn norm2(x: &[f64]) -> f64 {
    dot(x, x).sqrt()
}

/// 无穷范数 ||x||∞
pub fn norm_inf(x: &[f64]) -> f64 {
    x.iter().fold(0.0, |acc, v| acc.max(v.abs()))
}

/// y = α*x + y
#[inline]
pub fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    debug_assert_eq!(x.len(), y.len());
    for (yi, &xi) in y.iter_mut().zip(x.iter()) {
        *yi += alpha * xi;
    }
}

/// y = x + α*y
#[inline]
pub fn xpay(x: &[f64], alpha: f64, y: &mut [f64]) {
    debug_assert_eq!(x.len(), y.len());
    for (yi, &xi) in y.iter_mut().zip(x.iter()) {
        *yi = xi + alpha * *yi;
    }
}

/// x = α*x
pub fn scale(alpha: f64, x: &mut [f64]) {
    for xi in x.iter_mut() {
        *xi *= alpha;
    }
}

/// y = x
#[inline]
pub fn copy(x: &[f64], y: &mut [f64]) {
    y.copy_from_slice(x);
}

/// 算术平均（空向量为 0）
pub fn mean(x: &[f64]) -> f64 {
    if x.is_empty() {
        0.0
    } else {
        x.iter().sum::<f64>() / x.len() as f64
    }
}

/// 减去均值，返回被减去的均值
pub fn remove_mean(x: &mut [f64]) -> f64 {
    let m = mean(x);
    for xi in x.iter_mut() {
        *xi -= m;
    }
    m
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_and_norms() {
        let x = [1.0, 2.0, 3.0];
        let y = [4.0, 5.0, 6.0];
        assert_eq!(dot(&x, &y), 32.0);
        assert!((norm2(&[3.0, 4.0]) - 5.0).abs() < 1e-15);
        assert_eq!(norm_inf(&[1.0, -7.0, 3.0]), 7.0);
    }

    #[test]
    fn test_axpy_xpay() {
        let x = [1.0, 2.0, 3.0];
        let mut y = vec![4.0, 5.0, 6.0];
        axpy(2.0, &x, &mut y);
        assert_eq!(y, vec![6.0, 9.0, 12.0]);

        xpay(&x, 0.5, &mut y);
        assert_eq!(y, vec![4.0, 6.5, 9.0]);

        scale(2.0, &mut y);
        assert_eq!(y, vec![8.0, 13.0, 18.0]);
    }

    #[test]
    fn test_remove_mean() {
        let mut x = vec![1.0, 2.0, 6.0];
        let m = remove_mean(&mut x);
        assert_eq!(m, 3.0);
        assert!(mean(&x).abs() < 1e-15);
        assert_eq!(mean(&[]), 0.0);
    }
}
