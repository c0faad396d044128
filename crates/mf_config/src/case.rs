// crates/mf_config/src/case.rs

//! 算例输入文档
//!
//! 与外部约定逐字段对应的 serde 结构。`CaseConfig::from_file` 读取并做完整的
//! 模式检查，任何缺失字段或越界值都会在数值计算开始之前以
//! [`ConfigError`] 报告。

use crate::boundary::{validate_boundaries, BoundaryRecord};
use crate::error::{ConfigError, ConfigResult};
use crate::solver::SolverSettings;
use mf_foundation::{FlatteningOrder, ValidationError, ValidationReport};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 计算域定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainDefinition {
    /// x 下界
    pub x_min: f64,
    /// x 上界
    pub x_max: f64,
    /// y 下界
    pub y_min: f64,
    /// y 上界
    pub y_max: f64,
    /// z 下界
    pub z_min: f64,
    /// z 上界
    pub z_max: f64,
    /// x 方向单元数
    pub nx: usize,
    /// y 方向单元数
    pub ny: usize,
    /// z 方向单元数
    pub nz: usize,
}

/// 流体物性
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluidPropertiesConfig {
    /// 密度 ρ
    pub density: f64,
    /// 动力黏度 μ
    pub viscosity: f64,
}

/// 初始条件
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InitialConditions {
    /// 初始速度 (u, v, w)
    #[serde(default)]
    pub initial_velocity: [f64; 3],
    /// 初始压力
    #[serde(default)]
    pub initial_pressure: f64,
}

/// 时间推进参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationParameters {
    /// 时间步长 dt
    pub time_step: f64,
    /// 总时长 T_end
    pub total_time: f64,
    /// 每隔多少步输出一次快照
    pub output_interval: usize,
}

/// 几何掩码
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryDefinition {
    /// 展平后的掩码，取值应为 -1、0、1
    pub geometry_mask_flat: Vec<i64>,
    /// 掩码形状 [nx, ny, nz]
    #[serde(default)]
    pub geometry_mask_shape: Option<Vec<usize>>,
    /// 展平顺序
    #[serde(default)]
    pub flattening_order: FlatteningOrder,
}

/// 外力
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExternalForces {
    /// 体积力（加速度）向量
    #[serde(default)]
    pub force_vector: [f64; 3],
    /// 单位说明
    #[serde(default)]
    pub units: String,
    /// 备注
    #[serde(default)]
    pub comment: String,
}

/// 完整算例文档
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseConfig {
    /// 计算域
    pub domain_definition: DomainDefinition,
    /// 流体物性
    pub fluid_properties: FluidPropertiesConfig,
    /// 初始条件
    #[serde(default)]
    pub initial_conditions: InitialConditions,
    /// 时间推进
    pub simulation_parameters: SimulationParameters,
    /// 边界条件（缺省的面为无滑移）
    #[serde(default)]
    pub boundary_conditions: Vec<BoundaryRecord>,
    /// 几何掩码（缺省为全流体）
    #[serde(default)]
    pub geometry_definition: Option<GeometryDefinition>,
    /// 外力
    #[serde(default)]
    pub external_forces: ExternalForces,
    /// 数值求解设置
    #[serde(default)]
    pub solver_settings: SolverSettings,
}

impl CaseConfig {
    /// 单位立方体模板：[0,1]³、ρ=1、μ=0.01、dt=0.01、T=0.1，全部面无滑移
    ///
    /// 供测试与交互式使用，调用方按需修改字段。
    pub fn template(nx: usize, ny: usize, nz: usize) -> Self {
        Self {
            domain_definition: DomainDefinition {
                x_min: 0.0,
                x_max: 1.0,
                y_min: 0.0,
                y_max: 1.0,
                z_min: 0.0,
                z_max: 1.0,
                nx,
                ny,
                nz,
            },
            fluid_properties: FluidPropertiesConfig {
                density: 1.0,
                viscosity: 0.01,
            },
            initial_conditions: InitialConditions::default(),
            simulation_parameters: SimulationParameters {
                time_step: 0.01,
                total_time: 0.1,
                output_interval: 1,
            },
            boundary_conditions: Vec::new(),
            geometry_definition: None,
            external_forces: ExternalForces::default(),
            solver_settings: SolverSettings::default(),
        }
    }

    /// 从文件加载并检查
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&content)?;
        log::debug!("已加载算例配置: {}", path.display());
        Ok(config)
    }

    /// 从 JSON 文本解析并检查
    pub fn from_json_str(content: &str) -> ConfigResult<Self> {
        let config: CaseConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 保存到文件（格式化 JSON）
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 模式检查：收集全部问题后一次性报告
    pub fn validate(&self) -> ConfigResult<()> {
        let report = self.validation_report();
        for warning in &report.warnings {
            log::warn!("{warning}");
        }
        if report.has_errors() {
            Err(ConfigError::Schema(report))
        } else {
            Ok(())
        }
    }

    /// 生成验证报告（不返回错误）
    pub fn validation_report(&self) -> ValidationReport {
        let mut report = ValidationReport::new();

        let d = &self.domain_definition;
        for (name, value) in [
            ("x_min", d.x_min),
            ("x_max", d.x_max),
            ("y_min", d.y_min),
            ("y_max", d.y_max),
            ("z_min", d.z_min),
            ("z_max", d.z_max),
        ] {
            report.check_finite(&format!("domain_definition.{name}"), value);
        }
        for (name, n) in [("nx", d.nx), ("ny", d.ny), ("nz", d.nz)] {
            if n < 1 {
                report.add_error(ValidationError::Invalid {
                    field: format!("domain_definition.{name}"),
                    reason: "单元数必须至少为 1".into(),
                });
            }
        }

        let fp = &self.fluid_properties;
        report.check_positive("fluid_properties.density", fp.density);
        report.check_range("fluid_properties.viscosity", fp.viscosity, 0.0, f64::MAX);

        let ic = &self.initial_conditions;
        for (c, &value) in ic.initial_velocity.iter().enumerate() {
            report.check_finite(&format!("initial_conditions.initial_velocity[{c}]"), value);
        }
        report.check_finite("initial_conditions.initial_pressure", ic.initial_pressure);

        let sp = &self.simulation_parameters;
        report.check_positive("simulation_parameters.time_step", sp.time_step);
        report.check_positive("simulation_parameters.total_time", sp.total_time);
        if sp.output_interval < 1 {
            report.add_error(ValidationError::Invalid {
                field: "simulation_parameters.output_interval".into(),
                reason: "必须至少为 1".into(),
            });
        }

        validate_boundaries(&self.boundary_conditions, &mut report);

        if let Some(geometry) = &self.geometry_definition {
            if let Some(shape) = &geometry.geometry_mask_shape {
                if shape.len() != 3 {
                    report.add_error(ValidationError::Invalid {
                        field: "geometry_definition.geometry_mask_shape".into(),
                        reason: format!("必须恰好有 3 个元素，实际 {}", shape.len()),
                    });
                }
            }
            if geometry.geometry_mask_flat.is_empty() {
                report.add_error(ValidationError::Missing {
                    field: "geometry_definition.geometry_mask_flat".into(),
                });
            }
        }

        for (c, &value) in self.external_forces.force_vector.iter().enumerate() {
            report.check_finite(&format!("external_forces.force_vector[{c}]"), value);
        }

        self.solver_settings.validate_into(&mut report);
        report
    }
}
