//! Mathematics for tetrahedral isosurface extraction
//!
//! This crate provides the small set of value types the extraction pipeline
//! and its data sources are built on.
//!
//! ## Core Types
//!
//! - [`Vec3`] - 3D vector used for physical coordinates and normals
//! - [`Vec4`] - homogeneous position (`w = 1.0` for points) as written to vertex buffers
//!
//! ## Mesh Types
//!
//! - [`Tetrahedron`] - A 3-simplex defined by vertex indices
//! - [`TetMesh`] - Shared vertex array plus tetrahedra referencing it
//! - [`GridSpec`] - Structured grid decomposed into tetrahedra (Kuhn triangulation)
//!
//! ## Fields
//!
//! - [`ImplicitFunction`] - Scalar function of position, sampled onto mesh vertices

mod vec3;
mod vec4;
pub mod shape;
pub mod grid;
pub mod implicit;

pub use vec3::Vec3;
pub use vec4::Vec4;
pub use shape::{TetMesh, Tetrahedron};
pub use grid::GridSpec;
pub use implicit::{Gyroid, ImplicitFunction, Plane, Sphere, Torus};
