// crates/mf_config/src/solver.rs

//! 数值求解设置（`solver_settings` 段，可选）
//!
//! 所有字段都有默认值；缺省整段时等价于 `SolverSettings::default()`。

use mf_foundation::{ValidationError, ValidationReport};
use serde::{Deserialize, Serialize};

/// 压力泊松方程求解方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PpeMethod {
    /// 预条件共轭梯度
    #[default]
    Pcg,
    /// 预条件 BiCGStab
    #[serde(alias = "bicg_stab")]
    Bicgstab,
    /// 带状 Cholesky 直接分解（分解结果缓存）
    Direct,
}

/// 预条件器类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreconditionerKind {
    /// 不使用预条件
    None,
    /// Jacobi 对角预条件
    #[default]
    Jacobi,
    /// 对称逐次超松弛
    Ssor,
}

/// 全 Neumann 情况下的奇异性处理
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SingularStrategy {
    /// 在相容的半正定系统上直接迭代，解投影到零均值
    #[default]
    ZeroMean,
    /// 固定第一个流体单元的压力
    PinReference,
}

/// Dirichlet 压力边界的施加方式
///
/// 缺省为 `face_dirichlet`：压力给在边界面上，贴边流体单元保留连续方程，
/// 投影后的散度上界对全部流体单元成立。
/// `cell_dirichlet` 是单位行做法：贴边流体单元直接取给定压力，
/// 这些单元不再满足连续方程，也不计入散度统计。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PressureBoundaryMode {
    /// 在边界面上施加压力（虚拟单元消元，所有流体单元的连续方程保留）
    #[default]
    FaceDirichlet,
    /// 贴边流体单元的方程行换成单位行，右端为给定压力
    CellDirichlet,
}

/// 对流离散格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvectionScheme {
    /// 一阶迎风（donor-cell）
    #[default]
    Upwind,
    /// 二阶中心差分，仅在稳定性条件满足时使用
    Central,
}

/// 压力泊松方程设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PpeSettings {
    /// 求解方法
    #[serde(default)]
    pub method: PpeMethod,
    /// 预条件器
    #[serde(default)]
    pub preconditioner: PreconditionerKind,
    /// SSOR 松弛因子
    #[serde(default = "default_ssor_omega")]
    pub ssor_omega: f64,
    /// 相对收敛容差
    #[serde(default = "default_rtol")]
    pub rtol: f64,
    /// 绝对收敛容差
    #[serde(default = "default_atol")]
    pub atol: f64,
    /// 最大迭代次数
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// 奇异性处理
    #[serde(default)]
    pub singular_strategy: SingularStrategy,
    /// Dirichlet 压力边界的施加方式
    #[serde(default)]
    pub pressure_boundary: PressureBoundaryMode,
    /// 是否输出逐次迭代残差
    #[serde(default)]
    pub verbose: bool,
}

fn default_ssor_omega() -> f64 { 1.2 }
fn default_rtol() -> f64 { 1e-6 }
fn default_atol() -> f64 { 1e-12 }
fn default_max_iterations() -> usize { 1000 }
fn default_projection_tolerance_factor() -> f64 { 10.0 }

impl Default for PpeSettings {
    fn default() -> Self {
        Self {
            method: PpeMethod::default(),
            preconditioner: PreconditionerKind::default(),
            ssor_omega: default_ssor_omega(),
            rtol: default_rtol(),
            atol: default_atol(),
            max_iterations: default_max_iterations(),
            singular_strategy: SingularStrategy::default(),
            pressure_boundary: PressureBoundaryMode::default(),
            verbose: false,
        }
    }
}

/// 数值求解设置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverSettings {
    /// 压力泊松方程
    #[serde(default)]
    pub ppe: PpeSettings,
    /// 对流格式
    #[serde(default)]
    pub advection: AdvectionScheme,
    /// 校正后散度范数允许为 rtol 的多少倍
    #[serde(default = "default_projection_tolerance_factor")]
    pub projection_tolerance_factor: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            ppe: PpeSettings::default(),
            advection: AdvectionScheme::default(),
            projection_tolerance_factor: default_projection_tolerance_factor(),
        }
    }
}

impl SolverSettings {
    /// 散度检查阈值 = factor · rtol
    pub fn projection_tolerance(&self) -> f64 {
        self.projection_tolerance_factor * self.ppe.rtol
    }

    pub(crate) fn validate_into(&self, report: &mut ValidationReport) {
        let ppe = &self.ppe;
        report.check_positive("solver_settings.ppe.rtol", ppe.rtol);
        report.check_positive("solver_settings.ppe.atol", ppe.atol);
        if ppe.max_iterations == 0 {
            report.add_error(ValidationError::Invalid {
                field: "solver_settings.ppe.max_iterations".into(),
                reason: "必须至少为 1".into(),
            });
        }
        if ppe.preconditioner == PreconditionerKind::Ssor
            && !(ppe.ssor_omega > 0.0 && ppe.ssor_omega < 2.0)
        {
            report.add_error(ValidationError::OutOfRange {
                field: "solver_settings.ppe.ssor_omega".into(),
                value: ppe.ssor_omega,
                min: 0.0,
                max: 2.0,
            });
        }
        report.check_range(
            "solver_settings.projection_tolerance_factor",
            self.projection_tolerance_factor,
            1.0,
            f64::MAX,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = SolverSettings::default();
        assert_eq!(s.ppe.rtol, 1e-6);
        assert_eq!(s.ppe.atol, 1e-12);
        assert_eq!(s.ppe.max_iterations, 1000);
        assert_eq!(s.advection, AdvectionScheme::Upwind);
        assert!((s.projection_tolerance() - 1e-5).abs() < 1e-18);

        let mut report = ValidationReport::new();
        s.validate_into(&mut report);
        assert!(report.is_valid());
    }

    #[test]
    fn test_partial_document_uses_defaults() {
        let json = r#"{"ppe": {"method": "direct", "rtol": 1e-8}, "advection": "central"}"#;
        let s: SolverSettings = serde_json::from_str(json).unwrap();
        assert_eq!(s.ppe.method, PpeMethod::Direct);
        assert_eq!(s.ppe.rtol, 1e-8);
        assert_eq!(s.ppe.max_iterations, 1000);
        assert_eq!(s.advection, AdvectionScheme::Central);
    }

    #[test]
    fn test_pressure_boundary_mode_names() {
        assert_eq!(PpeSettings::default().pressure_boundary, PressureBoundaryMode::FaceDirichlet);
        let s: PpeSettings = serde_json::from_str(r#"{"pressure_boundary": "cell_dirichlet"}"#).unwrap();
        assert_eq!(s.pressure_boundary, PressureBoundaryMode::CellDirichlet);
        let s: PpeSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(s.pressure_boundary, PressureBoundaryMode::FaceDirichlet);
    }

    #[test]
    fn test_invalid_settings() {
        let mut s = SolverSettings::default();
        s.ppe.rtol = 0.0;
        s.ppe.max_iterations = 0;
        s.ppe.preconditioner = PreconditionerKind::Ssor;
        s.ppe.ssor_omega = 2.5;
        let mut report = ValidationReport::new();
        s.validate_into(&mut report);
        assert_eq!(report.error_count(), 3);
    }
}
