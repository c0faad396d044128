// crates/mf_physics/tests/operator_properties.rs

//! 离散算子性质
//! 场形状、MMS 拉普拉斯、Lp 对称性与行和、G 与 D 的伴随关系、边界处理器

use mf_config::FaceLocation;
use mf_foundation::{Dims3, FlatteningOrder};
use mf_physics::{
    BoundaryApplier, BoundaryKind, BoundaryTable, Component, DerivedConstants, FaceClass,
    FluidProperties, GeometryMask, Grid, OperatorBuilder, Operators, StaggeredFields,
};

fn build(
    grid: &Grid,
    mask: &GeometryMask,
    table: &BoundaryTable,
) -> (Operators, DerivedConstants) {
    let props = FluidProperties::new(1.0, 0.01).unwrap();
    let consts = DerivedConstants::new(grid, &props, 0.01).unwrap();
    let ops = OperatorBuilder::new(grid, mask, table, &consts).build().unwrap();
    (ops, consts)
}

/// 构造后 P、U、V、W 的形状
#[test]
fn test_field_shapes() {
    for order in [FlatteningOrder::IFastest, FlatteningOrder::JFastest] {
        let grid = Grid::new([0.0; 3], [1.0, 2.0, 3.0], [5, 3, 2]).unwrap();
        let fields = StaggeredFields::zeros(&grid, order);
        assert_eq!(
            fields.shapes(),
            [[5, 3, 2], [6, 3, 2], [5, 4, 2], [5, 3, 3]]
        );
        assert_eq!(fields.pressure().len(), 30);
        assert_eq!(fields.n_velocity(), 36 + 40 + 45);
    }
}

/// p = x²+y²+z² 时内部单元上 Lp·p = 6
#[test]
fn test_mms_laplacian() {
    let n = 6;
    let grid = Grid::new([0.0; 3], [1.0, 1.5, 0.75], [n, n, n]).unwrap();
    let order = FlatteningOrder::IFastest;
    let mask = GeometryMask::all_fluid(grid.cell_dims(), order);
    let (ops, _) = build(&grid, &mask, &BoundaryTable::all_no_slip());

    let dims = grid.cell_dims();
    let mut p = vec![0.0; dims.len()];
    for (idx, value) in p.iter_mut().enumerate() {
        let (i, j, k) = order.unflatten(dims, idx);
        *value = grid.cell_center(i, j, k).length_squared();
    }
    let mut lp = vec![0.0; dims.len()];
    ops.ppe.matrix.mul_vec(&p, &mut lp);

    let mut checked = 0;
    for k in 1..n - 1 {
        for j in 1..n - 1 {
            for i in 1..n - 1 {
                let v = lp[order.index(dims, i, j, k)];
                assert!((v - 6.0).abs() < 1e-9, "({i},{j},{k}): {v}");
                checked += 1;
            }
        }
    }
    assert_eq!(checked, 64);
}

/// 全 Neumann 时 Lp 对称、行和为零；有障碍物时固体行为空
#[test]
fn test_ppe_symmetry_and_row_sums() {
    let n = 5;
    let dims = Dims3::new(n, n, n);
    let order = FlatteningOrder::IFastest;
    let mut flat = vec![1_i64; dims.len()];
    flat[order.index(dims, 2, 2, 2)] = 0;
    let mask = GeometryMask::from_flat(&flat, None, dims, order).unwrap();
    let grid = Grid::new([0.0; 3], [1.0; 3], [n, n, n]).unwrap();
    let (ops, _) = build(&grid, &mask, &BoundaryTable::all_no_slip());

    let lp = &ops.ppe.matrix;
    assert!(ops.ppe_is_singular());
    assert!(lp.is_symmetric(1e-12));
    for r in 0..lp.n_rows() {
        let sum: f64 = lp.row(r).values().iter().sum();
        assert!(sum.abs() < 1e-9, "row {r}: {sum}");
    }
    assert!(lp.row(order.index(dims, 2, 2, 2)).is_empty());
    assert_eq!(ops.ppe.n_fluid(), dims.len() - 1);
}

/// 内部面上 G = −Dᵀ
#[test]
fn test_gradient_is_negative_divergence_transpose() {
    let grid = Grid::new([0.0; 3], [1.0; 3], [3, 4, 2]).unwrap();
    let mask = GeometryMask::all_fluid(grid.cell_dims(), FlatteningOrder::IFastest);
    let table = BoundaryTable::all_no_slip()
        .with(FaceLocation::XMax, BoundaryKind::Outflow { pressure: 0.0 });
    let (ops, _) = build(&grid, &mask, &table);

    let g = &ops.gradient.stacked;
    let d = &ops.divergence;
    let offsets = ops.faces.offsets();
    for axis in 0..3 {
        for (f, class) in ops.faces.classes(axis).iter().enumerate() {
            if *class != FaceClass::Active {
                continue;
            }
            let row = offsets[axis] + f;
            for (cell, value) in g.row(row).iter() {
                assert!((value + d.get(cell, row)).abs() < 1e-12);
            }
            assert_eq!(g.row(row).len(), 2);
        }
    }
}

/// 常数速度场在无边界影响的面上拉普拉斯为零
#[test]
fn test_component_laplacian_annihilates_constants() {
    let n = 5;
    let grid = Grid::new([0.0; 3], [1.0; 3], [n, n, n]).unwrap();
    let mask = GeometryMask::all_fluid(grid.cell_dims(), FlatteningOrder::IFastest);
    let (ops, _) = build(&grid, &mask, &BoundaryTable::all_no_slip());

    for c in Component::ALL {
        let layout = ops.faces.layout(c.axis());
        let ones = vec![1.0; layout.len()];
        let mut out = vec![0.0; layout.len()];
        ops.laplacians[c.axis()].apply(&ones, &mut out);
        for (f, &v) in out.iter().enumerate() {
            let q = layout.coords(f);
            let far_from_walls = (0..3).all(|a| {
                let extent = layout.dims().as_array()[a];
                if a == c.axis() {
                    q[a] >= 2 && q[a] + 2 < extent
                } else {
                    q[a] >= 1 && q[a] + 1 < extent
                }
            });
            if far_from_walls {
                assert!(v.abs() < 1e-9, "{} face {q:?}: {v}", c.name());
            }
        }
    }
}

/// 边界处理后壁面与固体面取给定值，虚拟层满足镜像/复制规则
#[test]
fn test_boundary_applier_pins_faces() {
    let n = 4;
    let dims = Dims3::new(n, n, n);
    let order = FlatteningOrder::JFastest;
    let mut flat = vec![1_i64; dims.len()];
    flat[order.index(dims, 1, 2, 1)] = 0;
    let mask = GeometryMask::from_flat(&flat, None, dims, order).unwrap();
    let grid = Grid::new([0.0; 3], [1.0; 3], [n, n, n]).unwrap();
    let table = BoundaryTable::all_no_slip()
        .with(FaceLocation::XMin, BoundaryKind::Inflow { velocity: [0.5, 0.2, 0.0] })
        .with(FaceLocation::XMax, BoundaryKind::Outflow { pressure: 0.0 })
        .with(FaceLocation::ZMax, BoundaryKind::FreeSlip);
    let (ops, _) = build(&grid, &mask, &table);

    let mut fields = StaggeredFields::zeros(&grid, order);
    fields.fill_uniform([1.0, 1.0, 1.0], 3.0);
    let applier = BoundaryApplier::new(&table, &ops.faces);
    applier.apply(&mut fields);
    assert_eq!(applier.max_pinned_deviation(&fields), 0.0);

    // 入口法向面为 0.5，出口法向面未被固定
    assert_eq!(fields.value(Component::U, 0, 0, 0), 0.5);
    assert_eq!(fields.value(Component::U, n, 1, 1), 1.0);
    // 贴固体单元的面为 0
    assert_eq!(fields.value(Component::U, 1, 2, 1), 0.0);
    assert_eq!(fields.value(Component::U, 2, 2, 1), 0.0);
    assert_eq!(fields.value(Component::W, 1, 2, 2), 0.0);

    let v = fields.ext(Component::V);
    // x_min 入口的切向 V：2·0.2 − 内部值
    assert!((v[[0, 2, 2]] - (0.4 - v[[1, 2, 2]])).abs() < 1e-15);
    // z_max 自由滑移的切向 V：复制
    assert_eq!(v[[2, 2, n + 1]], v[[2, 2, n]]);

    let p = fields.pressure_ext();
    // 出口压力 0：镜像
    assert_eq!(p[[n + 1, 2, 2]], -p[[n, 2, 2]]);
    // 壁面：复制
    assert_eq!(p[[2, 0, 2]], p[[2, 1, 2]]);
}
