// crates/mf_physics/src/boundary/mod.rs

//! 边界条件模块
//!
//! # 子模块
//!
//! - [`types`]: 边界类型与虚拟值规则
//! - [`table`]: 六个面的边界表
//! - [`faces`]: 速度自由度分类（Active / Solid / Wall / Open）
//! - [`ghost`]: 边界处理器，钉住面值并填充虚拟层
//!
//! # 使用示例
//!
//! ```
//! use mf_physics::boundary::{BoundaryApplier, BoundaryTable, FaceClassification};
//! use mf_physics::fields::StaggeredFields;
//! use mf_physics::grid::Grid;
//! use mf_physics::mask::GeometryMask;
//! use mf_foundation::FlatteningOrder;
//!
//! let grid = Grid::new([0.0; 3], [1.0; 3], [2, 2, 2]).unwrap();
//! let mask = GeometryMask::all_fluid(grid.cell_dims(), FlatteningOrder::IFastest);
//! let table = BoundaryTable::all_no_slip();
//! let faces = FaceClassification::build(&grid, &mask, &table);
//!
//! let mut fields = StaggeredFields::zeros(&grid, FlatteningOrder::IFastest);
//! fields.fill_uniform([1.0, 0.0, 0.0], 0.0);
//! BoundaryApplier::new(&table, &faces).apply(&mut fields);
//! assert_eq!(fields.component(mf_physics::fields::Component::U)[0], 0.0);
//! ```

pub mod faces;
pub mod ghost;
pub mod table;
pub mod types;

pub use faces::{FaceClass, FaceClassification};
pub use ghost::BoundaryApplier;
pub use table::BoundaryTable;
pub use types::{BoundaryKind, GhostRule};
