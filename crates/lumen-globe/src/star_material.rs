//! Additive point-sprite material for the starfield.

use bevy::asset::embedded_asset;
use bevy::mesh::MeshVertexBufferLayoutRef;
use bevy::pbr::{Material, MaterialPipeline, MaterialPipelineKey, MaterialPlugin};
use bevy::prelude::*;
use bevy::render::render_resource::{
    AsBindGroup, RenderPipelineDescriptor, SpecializedMeshPipelineError,
};
use bevy::shader::ShaderRef;

use crate::point_sprite::apply_sprite_layout;

/// Plugin that registers the star material and its shader.
pub struct StarMaterialPlugin;

impl Plugin for StarMaterialPlugin {
    fn build(&self, app: &mut App) {
        embedded_asset!(app, "star_material.wgsl");
        app.add_plugins(MaterialPlugin::<StarMaterial>::default());
    }
}

/// Soft round stars blended additively over the background.
#[derive(Asset, TypePath, AsBindGroup, Debug, Clone)]
pub struct StarMaterial {
    /// `x` brightness, `y` size multiplier. Padded to 16 bytes for WebGL.
    #[uniform(0)]
    pub params: Vec4,
}

impl Default for StarMaterial {
    fn default() -> Self {
        Self {
            params: Vec4::new(1.0, 1.0, 0.0, 0.0),
        }
    }
}

impl Material for StarMaterial {
    fn vertex_shader() -> ShaderRef {
        "embedded://lumen_globe/star_material.wgsl".into()
    }

    fn fragment_shader() -> ShaderRef {
        "embedded://lumen_globe/star_material.wgsl".into()
    }

    fn alpha_mode(&self) -> AlphaMode {
        AlphaMode::Add
    }

    fn enable_shadows() -> bool {
        false
    }

    fn enable_prepass() -> bool {
        false
    }

    fn specialize(
        _pipeline: &MaterialPipeline,
        descriptor: &mut RenderPipelineDescriptor,
        layout: &MeshVertexBufferLayoutRef,
        _key: MaterialPipelineKey<Self>,
    ) -> Result<(), SpecializedMeshPipelineError> {
        apply_sprite_layout(descriptor, layout)?;
        // Quads always face the camera; winding depends on the view.
        descriptor.primitive.cull_mode = None;
        Ok(())
    }
}
