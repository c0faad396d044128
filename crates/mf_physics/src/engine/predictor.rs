// crates/mf_physics/src/engine/predictor.rs

//! 预测步
//!
//! `u* = uⁿ + dt·(−A(uⁿ) + ν·L(uⁿ) + f)`，只作用于 `Active` 面：
//!
//! - `Wall(v)` 面写 v，`Solid` 面写 0；
//! - `Open` 面取向内相邻 `Active` 面的 u*（零法向梯度），没有时保持 uⁿ。
//!
//! 结果写入预分配的缓冲区，最后与场交换，不做每步分配。
//! 调用前扩展数组必须已由边界处理器填充。

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::boundary::FaceClass;
use crate::constants::DerivedConstants;
use crate::fields::StaggeredFields;
use crate::numerics::operators::{advection_term, Operators};
use mf_config::AdvectionScheme;

/// 预测器（持有 u* 与拉普拉斯的工作缓冲区）
#[derive(Debug, Clone)]
pub struct Predictor {
    star: Vec<f64>,
    laplacian: Vec<f64>,
}

impl Predictor {
    /// 按速度自由度总数分配
    pub fn new(n_velocity: usize) -> Self {
        Self {
            star: vec![0.0; n_velocity],
            laplacian: vec![0.0; n_velocity],
        }
    }

    /// 计算 u* 并与场交换
    pub fn predict(
        &mut self,
        fields: &mut StaggeredFields,
        ops: &Operators,
        consts: &DerivedConstants,
        force: [f64; 3],
        scheme: AdvectionScheme,
    ) {
        let offsets = fields.offsets();
        let dt = consts.dt;
        let nu = consts.nu;
        let inv_h = consts.inv_h;

        for c in 0..3 {
            let range = offsets[c]..offsets[c + 1];
            let u = &fields.velocity()[range.clone()];
            let ext = fields.ext_all();
            let layout = ops.faces.layout(c);
            let classes = ops.faces.classes(c);
            let f_c = force[c];

            let lap = &mut self.laplacian[range.clone()];
            ops.laplacians[c].apply(u, lap);
            let lap = &self.laplacian[range.clone()];
            let star = &mut self.star[range];

            let update = |(f, s): (usize, &mut f64)| {
                *s = match classes[f] {
                    FaceClass::Active => {
                        let adv = advection_term(c, layout.coords(f), ext, inv_h, scheme);
                        u[f] + dt * (-adv + nu * lap[f] + f_c)
                    }
                    FaceClass::Wall(v) => v,
                    FaceClass::Solid => 0.0,
                    FaceClass::Open => u[f],
                };
            };

            #[cfg(feature = "parallel")]
            star.par_iter_mut().enumerate().for_each(update);
            #[cfg(not(feature = "parallel"))]
            star.iter_mut().enumerate().for_each(update);

            // 开边界：零法向梯度外推
            for (f, class) in classes.iter().enumerate() {
                if *class != FaceClass::Open {
                    continue;
                }
                let mut q = layout.coords(f);
                match ops.faces.boundary_side(c, q) {
                    Some(true) => q[c] -= 1,
                    Some(false) => q[c] += 1,
                    None => continue,
                }
                let inward = layout.index_of(q);
                if classes[inward].is_active() {
                    star[f] = star[inward];
                }
            }
        }

        fields.swap_velocity(&mut self.star);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::{BoundaryApplier, BoundaryKind, BoundaryTable};
    use crate::constants::FluidProperties;
    use crate::fields::Component;
    use crate::grid::Grid;
    use crate::mask::GeometryMask;
    use crate::numerics::operators::OperatorBuilder;
    use mf_config::FaceLocation;
    use mf_foundation::FlatteningOrder;

    fn setup(table: &BoundaryTable) -> (Operators, DerivedConstants, StaggeredFields) {
        let grid = Grid::new([0.0; 3], [1.0; 3], [4, 4, 4]).unwrap();
        let mask = GeometryMask::all_fluid(grid.cell_dims(), FlatteningOrder::IFastest);
        let props = FluidProperties::new(1.0, 0.01).unwrap();
        let consts = DerivedConstants::new(&grid, &props, 0.01).unwrap();
        let ops = OperatorBuilder::new(&grid, &mask, table, &consts).build().unwrap();
        let fields = StaggeredFields::zeros(&grid, FlatteningOrder::IFastest);
        (ops, consts, fields)
    }

    #[test]
    fn test_body_force_only_moves_active_faces() {
        let table = BoundaryTable::all_no_slip();
        let (ops, consts, mut fields) = setup(&table);
        BoundaryApplier::new(&table, &ops.faces).apply(&mut fields);
        let mut predictor = Predictor::new(fields.n_velocity());
        predictor.predict(
            &mut fields,
            &ops,
            &consts,
            [0.0, 0.0, -9.81],
            AdvectionScheme::Upwind,
        );

        let layout = fields.layout(Component::W);
        let w = fields.component(Component::W);
        assert!((w[layout.index(1, 1, 2)] + 0.0981).abs() < 1e-12);
        assert_eq!(w[layout.index(1, 1, 0)], 0.0);
        assert_eq!(w[layout.index(1, 1, 4)], 0.0);
        assert!(fields.component(Component::U).iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_open_face_copies_inward_neighbour() {
        let table = BoundaryTable::all_no_slip()
            .with(FaceLocation::XMax, BoundaryKind::Outflow { pressure: 0.0 });
        let (ops, consts, mut fields) = setup(&table);
        BoundaryApplier::new(&table, &ops.faces).apply(&mut fields);
        let mut predictor = Predictor::new(fields.n_velocity());
        predictor.predict(&mut fields, &ops, &consts, [1.0, 0.0, 0.0], AdvectionScheme::Upwind);

        let layout = fields.layout(Component::U);
        let u = fields.component(Component::U);
        assert_eq!(u[layout.index(4, 2, 2)], u[layout.index(3, 2, 2)]);
        assert!(u[layout.index(4, 2, 2)] > 0.0);
        assert_eq!(u[layout.index(0, 2, 2)], 0.0);
    }
}
