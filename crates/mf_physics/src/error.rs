// crates/mf_physics/src/error.rs

//! 数值核心的错误类型
//!
//! 数值路径上的错误不在本地捕获，一路传播到时间循环，由它记录失败、
//! 尽力写出最后一次快照后退出。每个变体都对应一个 [`FailureKind`]。

use mf_foundation::FailureKind;
use thiserror::Error;

/// 数值核心结果类型
pub type PhysicsResult<T> = Result<T, PhysicsError>;

/// 数值核心错误
#[derive(Debug, Clone, Error)]
pub enum PhysicsError {
    /// 几何无效（范围倒置、掩码长度或取值错误）
    #[error("几何无效: {message}")]
    InvalidGeometry {
        /// 错误说明
        message: String,
    },

    /// 配置无效（时间步长、物性、间距或求解设置）
    #[error("配置无效: {message}")]
    Config {
        /// 错误说明
        message: String,
    },

    /// 压力泊松方程未收敛
    #[error("压力泊松方程未收敛: {iterations} 次迭代后残差 {residual:.3e}（容差 {tolerance:.3e}）")]
    LinearSolve {
        /// 已执行的迭代次数
        iterations: usize,
        /// 最终残差
        residual: f64,
        /// 有效容差
        tolerance: f64,
        /// 残差历史（第 0 项为初始残差）
        history: Vec<f64>,
    },

    /// 校正后散度超出容差
    #[error("投影失败: 校正后散度范数 {divergence:.3e} 超过容差 {tolerance:.3e}")]
    Projection {
        /// 校正后的散度范数
        divergence: f64,
        /// 容差
        tolerance: f64,
    },

    /// CFL 数超过 1
    #[error("CFL 违反: CFL = {cfl:.3} > 1（第 {step} 步, t = {time}）")]
    CflViolation {
        /// CFL 估计值
        cfl: f64,
        /// 被检查状态的步数
        step: usize,
        /// 被检查状态的时间
        time: f64,
    },

    /// 求解器状态不允许该操作
    #[error("求解器状态错误: {message}")]
    State {
        /// 错误说明
        message: String,
    },
}

impl PhysicsError {
    /// 几何错误
    pub fn invalid_geometry(message: impl Into<String>) -> Self {
        Self::InvalidGeometry {
            message: message.into(),
        }
    }

    /// 配置错误
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// 状态错误
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// 对应的失败分类
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidGeometry { .. } => FailureKind::InvalidGeometry,
            Self::Config { .. } => FailureKind::ConfigError,
            Self::LinearSolve { .. } => FailureKind::LinearSolveError,
            Self::Projection { .. } => FailureKind::ProjectionError,
            Self::CflViolation { .. } => FailureKind::CflViolation,
            Self::State { .. } => FailureKind::Internal,
        }
    }
}
