//! Vertex buffer strides for extracted geometry
//!
//! Output lives in three separate vertex buffers: positions (`vec4<f32>`,
//! `w = 1`), normals (`vec3<f32>`) and colors (`vec4<f32>`). These strides
//! must match the `Pod` types written into the buffers.

use isotet_math::{Vec3, Vec4};

use crate::color_map::Rgba;

/// Bytes per position entry
pub const POSITION_STRIDE: u64 = std::mem::size_of::<Vec4>() as u64;

/// Bytes per normal entry
pub const NORMAL_STRIDE: u64 = std::mem::size_of::<Vec3>() as u64;

/// Bytes per color entry
pub const COLOR_STRIDE: u64 = std::mem::size_of::<Rgba>() as u64;

/// Bytes of buffer storage per output vertex across all three buffers
pub const BYTES_PER_VERTEX: u64 = POSITION_STRIDE + NORMAL_STRIDE + COLOR_STRIDE;
