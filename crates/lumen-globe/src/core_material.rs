//! Glowing inner core material.
//!
//! Renders only back faces with additive blending, so the core reads as a
//! soft volume behind the surface points. `time` drives the breathing pulse
//! and is written every frame by [`update_core_time`].

use bevy::asset::embedded_asset;
use bevy::mesh::MeshVertexBufferLayoutRef;
use bevy::pbr::{Material, MaterialPipeline, MaterialPipelineKey, MaterialPlugin};
use bevy::prelude::*;
use bevy::render::render_resource::{
    AsBindGroup, Face, RenderPipelineDescriptor, ShaderType, SpecializedMeshPipelineError,
};
use bevy::shader::ShaderRef;

use crate::config::PlanetConfig;

/// Plugin that registers the core material and its shader.
pub struct CoreMaterialPlugin;

impl Plugin for CoreMaterialPlugin {
    fn build(&self, app: &mut App) {
        embedded_asset!(app, "core_material.wgsl");
        app.add_plugins(MaterialPlugin::<CoreMaterial>::default());
    }
}

/// Uniform block of the core shader.
#[derive(ShaderType, Debug, Clone, Copy)]
pub struct CoreParams {
    pub color: Vec4,
    /// Seconds since startup.
    pub time: f32,
    pub glow_strength: f32,
    pub rim_power: f32,
    pub rim_strength: f32,
}

impl CoreParams {
    pub fn from_config(config: &PlanetConfig) -> Self {
        Self {
            color: LinearRgba::from(config.core_color).to_vec4(),
            time: 0.0,
            glow_strength: config.core_glow_strength,
            rim_power: config.core_rim_power,
            rim_strength: config.core_rim_strength,
        }
    }
}

#[derive(Asset, TypePath, AsBindGroup, Debug, Clone)]
pub struct CoreMaterial {
    #[uniform(0)]
    pub params: CoreParams,
}

impl Material for CoreMaterial {
    fn fragment_shader() -> ShaderRef {
        "embedded://lumen_globe/core_material.wgsl".into()
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
        _layout: &MeshVertexBufferLayoutRef,
        _key: MaterialPipelineKey<Self>,
    ) -> Result<(), SpecializedMeshPipelineError> {
        // Back faces only.
        descriptor.primitive.cull_mode = Some(Face::Front);
        Ok(())
    }
}

/// Marker for the inner core entity.
#[derive(Component, Debug, Clone, Copy)]
pub struct PlanetCore;

/// Write the elapsed time into the core's uniform.
pub fn update_core_time(
    time: Res<Time>,
    query: Query<&MeshMaterial3d<CoreMaterial>, With<PlanetCore>>,
    mut materials: ResMut<Assets<CoreMaterial>>,
) {
    for handle in &query {
        if let Some(material) = materials.get_mut(&handle.0) {
            material.params.time = time.elapsed_secs();
        }
    }
}
