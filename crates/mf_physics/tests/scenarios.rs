// crates/mf_physics/tests/scenarios.rs

//! 端到端算例
//! 静止立方体、体积力静水平衡、顶盖驱动方腔、压差管流、固体障碍物、CFL 违反

use mf_config::{BoundaryRecord, BoundaryType, CaseConfig, FaceLocation, GeometryDefinition};
use mf_foundation::{FailureKind, FlatteningOrder};
use mf_physics::{
    Component, FaceClass, NullSink, RunOutcome, SimulationPhase, SolverState, TimeLoop,
};

fn cube(n: usize, dt: f64, t_end: f64) -> CaseConfig {
    let mut config = CaseConfig::template(n, n, n);
    config.simulation_parameters.time_step = dt;
    config.simulation_parameters.total_time = t_end;
    config
}

fn max_abs(values: &[f64]) -> f64 {
    values.iter().fold(0.0, |m, v| m.max(v.abs()))
}

/// 静止立方体一步后仍静止
#[test]
fn test_cube_at_rest() {
    let config = cube(2, 0.1, 0.1);
    let mut state = SolverState::new(&config).unwrap();
    let report = TimeLoop::new().run(&mut state, &mut NullSink);

    assert!(report.is_success());
    assert_eq!(report.steps, 1);
    assert_eq!(state.phase(), SimulationPhase::Done);
    let fields = state.fields();
    assert!(max_abs(fields.velocity()) < 1e-12);
    assert!(max_abs(fields.pressure()) < 1e-9);
}

/// 重力被压力梯度平衡：W ≈ 0，∂p/∂z ≈ ρ·g
#[test]
fn test_uniform_body_force_hydrostatic() {
    let mut config = cube(4, 0.01, 0.03);
    config.external_forces.force_vector = [0.0, 0.0, -9.81];
    let mut state = SolverState::new(&config).unwrap();
    let report = TimeLoop::new().run(&mut state, &mut NullSink);
    assert!(report.is_success(), "{:?}", report.error);
    assert_eq!(report.steps, 3);

    let fields = state.fields();
    assert!(max_abs(fields.component(Component::U)) < 1e-4);
    assert!(max_abs(fields.component(Component::V)) < 1e-4);
    assert!(max_abs(fields.component(Component::W)) < 1e-4);

    let h = state.grid().spacing(2);
    for k in 0..3 {
        for j in 0..4 {
            for i in 0..4 {
                let dpdz = (fields.pressure_at(i, j, k + 1) - fields.pressure_at(i, j, k)) / h;
                assert!((dpdz + 9.81).abs() < 1e-3, "dp/dz = {dpdz} at ({i},{j},{k})");
            }
        }
    }
    assert!(state.diagnostics().divergence_norm < 1e-5);
    assert!(state.diagnostics().ppe_singularity_detected);
}

/// 顶盖驱动方腔：每步散度达标，速度不超过顶盖速度
#[test]
fn test_lid_driven_cavity() {
    let mut config = cube(8, 0.01, 0.5);
    config.boundary_conditions = vec![
        BoundaryRecord::new(FaceLocation::YMax, BoundaryType::Inflow).with_value("u", 1.0),
    ];
    let mut state = SolverState::new(&config).unwrap();
    state.prepare().unwrap();

    while !state.is_finished() {
        state.step().unwrap();
        let diag = state.diagnostics();
        assert!(diag.divergence_norm < 1e-5, "step {}: {}", state.step_index(), diag.divergence_norm);
        assert!(diag.divergence_norm <= diag.pre_correction_divergence_norm + 1e-15);
        assert!(max_abs(state.fields().component(Component::U)) <= 1.0 + 1e-3);
    }
    assert_eq!(state.step_index(), 50);
    assert_eq!(state.time(), 0.5);

    // 顶盖拖动的流体沿 +x 运动
    let fields = state.fields();
    assert!(fields.value(Component::U, 4, 7, 4) > 0.0);
}

/// 压差驱动管流：各 x 截面流量相等且为正
#[test]
fn test_pipe_pressure_drop() {
    let mut config = CaseConfig::template(16, 4, 4);
    config.domain_definition.x_max = 4.0;
    config.fluid_properties.viscosity = 0.1;
    config.simulation_parameters.time_step = 0.02;
    config.simulation_parameters.total_time = 2.0;
    config.boundary_conditions = vec![
        BoundaryRecord::new(FaceLocation::XMin, BoundaryType::Pressure).with_value("p", 1.0),
        BoundaryRecord::new(FaceLocation::XMax, BoundaryType::Pressure).with_value("p", 0.0),
    ];
    let mut state = SolverState::new(&config).unwrap();
    let report = TimeLoop::new().run(&mut state, &mut NullSink);
    assert!(report.is_success(), "{:?}", report.error);
    assert_eq!(state.ppe_is_singular(), Some(false));

    let grid = state.grid();
    let area = grid.spacing(1) * grid.spacing(2);
    let fields = state.fields();
    let fluxes: Vec<f64> = (0..=16)
        .map(|i| {
            let mut q = 0.0;
            for k in 0..4 {
                for j in 0..4 {
                    q += fields.value(Component::U, i, j, k) * area;
                }
            }
            q
        })
        .collect();

    let mean = fluxes.iter().sum::<f64>() / fluxes.len() as f64;
    assert!(mean > 0.0);
    for (i, q) in fluxes.iter().enumerate() {
        assert!(*q > 0.0, "plane {i}: {q}");
        assert!((q - mean).abs() <= 0.05 * mean, "plane {i}: {q} vs {mean}");
    }

    // 压力沿流向单调下降
    assert!(fields.pressure_at(0, 2, 2) > fields.pressure_at(15, 2, 2));
}

/// 固体障碍物：贴固体的面始终为 0
#[test]
fn test_solid_obstacle() {
    let n = 8;
    let mut config = cube(n, 0.01, 0.2);
    let mut mask = vec![1_i64; n * n * n];
    for k in 3..=4 {
        for j in 3..=4 {
            for i in 3..=4 {
                mask[FlatteningOrder::IFastest.index(mf_foundation::Dims3::new(n, n, n), i, j, k)] = 0;
            }
        }
    }
    config.geometry_definition = Some(GeometryDefinition {
        geometry_mask_flat: mask,
        geometry_mask_shape: Some(vec![n, n, n]),
        flattening_order: FlatteningOrder::IFastest,
    });
    config.boundary_conditions = vec![
        BoundaryRecord::new(FaceLocation::XMin, BoundaryType::Inflow).with_value("u", 1.0),
        BoundaryRecord::new(FaceLocation::XMax, BoundaryType::Outflow),
    ];

    let mut state = SolverState::new(&config).unwrap();
    assert!(state.mask().was_lifted());
    assert_eq!(state.mask().n_fluid(), n * n * n - 8);
    state.prepare().unwrap();

    let solid_faces: Vec<(Component, usize)> = {
        let ops = state.operators().unwrap();
        Component::ALL
            .iter()
            .flat_map(|&c| {
                ops.faces
                    .classes(c.axis())
                    .iter()
                    .enumerate()
                    .filter(|(_, class)| **class == FaceClass::Solid)
                    .map(move |(f, _)| (c, f))
            })
            .collect()
    };
    // 每个分量 2×2 个截面 × 3 个位置（两侧与中间）
    assert_eq!(solid_faces.len(), 3 * 12);

    while !state.is_finished() {
        state.step().unwrap();
        let fields = state.fields();
        for &(c, f) in &solid_faces {
            assert_eq!(fields.component(c)[f], 0.0);
        }
        assert!(state.diagnostics().divergence_norm < 1e-5);
    }
    assert_eq!(state.step_index(), 20);

    // 入口流量从出口流出
    let fields = state.fields();
    let inflow: f64 = (0..n)
        .flat_map(|k| (0..n).map(move |j| (j, k)))
        .map(|(j, k)| fields.value(Component::U, 0, j, k))
        .sum();
    let outflow: f64 = (0..n)
        .flat_map(|k| (0..n).map(move |j| (j, k)))
        .map(|(j, k)| fields.value(Component::U, n, j, k))
        .sum();
    assert!((inflow - outflow).abs() < 1e-3 * inflow);
}

/// 初始速度过大：第 0 步报告 CFL 违反
#[test]
fn test_cfl_violation_before_first_step() {
    let mut config = cube(4, 1.0, 10.0);
    config.initial_conditions.initial_velocity = [100.0, 0.0, 0.0];
    let mut state = SolverState::new(&config).unwrap();
    let report = TimeLoop::new().run(&mut state, &mut NullSink);

    assert_eq!(report.outcome, RunOutcome::Failed);
    assert_eq!(report.steps, 0);
    let failure = report.failure.expect("failure record");
    assert_eq!(failure.kind, FailureKind::CflViolation);
    assert_eq!(failure.step, 0);
    assert_eq!(failure.time, 0.0);
    assert_eq!(failure.kind.exit_code(), 7);
    assert_eq!(state.phase(), SimulationPhase::Failed);
}
