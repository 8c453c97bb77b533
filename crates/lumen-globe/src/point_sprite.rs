//! Point-cloud meshes drawn as camera-facing quads.
//!
//! WebGPU has no adjustable point size, so every point is expanded into four
//! vertices sharing the same centre. The vertex shader offsets each corner in
//! view space, which keeps points round and lets each one carry its own size.
//!
//! Vertex layout shared by the point materials:
//! - `ATTRIBUTE_POSITION` (location 0): point centre in mesh space.
//! - `ATTRIBUTE_UV_0` (location 1): quad corner in [-1, 1]².
//! - `ATTRIBUTE_UV_1` (location 2): per-point payload (size, or map UV).
//! - `ATTRIBUTE_COLOR` (location 3): per-point linear RGBA.

use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, MeshVertexBufferLayoutRef, PrimitiveTopology};
use bevy::prelude::*;
use bevy::render::render_resource::{RenderPipelineDescriptor, SpecializedMeshPipelineError};

/// Corners of a unit quad, counter-clockwise when viewed head on.
const CORNERS: [[f32; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];

/// A single point in a sprite cloud.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpritePoint {
    /// Centre of the point in mesh space.
    pub center: Vec3,
    /// Free per-point data read by the material's shader.
    pub payload: Vec2,
    /// Linear RGBA colour.
    pub color: [f32; 4],
}

/// Build a quad-expanded point-cloud mesh.
///
/// An empty slice produces a mesh with no vertices, which is still a valid
/// asset; callers hide the entity instead of skipping it.
#[allow(clippy::cast_possible_truncation)]
pub fn build_sprite_mesh(points: &[SpritePoint]) -> Mesh {
    let vertex_count = points.len() * 4;
    let mut positions: Vec<[f32; 3]> = Vec::with_capacity(vertex_count);
    let mut corners: Vec<[f32; 2]> = Vec::with_capacity(vertex_count);
    let mut payloads: Vec<[f32; 2]> = Vec::with_capacity(vertex_count);
    let mut colors: Vec<[f32; 4]> = Vec::with_capacity(vertex_count);
    let mut indices: Vec<u32> = Vec::with_capacity(points.len() * 6);

    for (i, point) in points.iter().enumerate() {
        let base = (i * 4) as u32;
        for corner in CORNERS {
            positions.push(point.center.to_array());
            corners.push(corner);
            payloads.push(point.payload.to_array());
            colors.push(point.color);
        }
        indices.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    let mut mesh = Mesh::new(
        PrimitiveTopology::TriangleList,
        RenderAssetUsages::default(),
    );
    mesh.insert_attribute(Mesh::ATTRIBUTE_POSITION, positions);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_0, corners);
    mesh.insert_attribute(Mesh::ATTRIBUTE_UV_1, payloads);
    mesh.insert_attribute(Mesh::ATTRIBUTE_COLOR, colors);
    mesh.insert_indices(Indices::U32(indices));
    mesh
}

/// Point the pipeline's vertex stage at the sprite attributes.
pub fn apply_sprite_layout(
    descriptor: &mut RenderPipelineDescriptor,
    layout: &MeshVertexBufferLayoutRef,
) -> Result<(), SpecializedMeshPipelineError> {
    let vertex_layout = layout.0.get_layout(&[
        Mesh::ATTRIBUTE_POSITION.at_shader_location(0),
        Mesh::ATTRIBUTE_UV_0.at_shader_location(1),
        Mesh::ATTRIBUTE_UV_1.at_shader_location(2),
        Mesh::ATTRIBUTE_COLOR.at_shader_location(3),
    ])?;
    descriptor.vertex.buffers = vec![vertex_layout];
    Ok(())
}
