//! Shaded point-cloud material for the planet surface.
//!
//! Each point carries its world-map UV. The shader discards points facing
//! away from the camera, classifies land and ocean from the map's red
//! channel, highlights continent edges and fades towards the silhouette.
//! The formulas are mirrored in [`crate::shading`].

use bevy::asset::embedded_asset;
use bevy::mesh::MeshVertexBufferLayoutRef;
use bevy::pbr::{Material, MaterialPipeline, MaterialPipelineKey, MaterialPlugin};
use bevy::prelude::*;
use bevy::render::render_resource::{
    AsBindGroup, RenderPipelineDescriptor, ShaderType, SpecializedMeshPipelineError,
};
use bevy::shader::ShaderRef;

use crate::config::PlanetConfig;
use crate::point_sprite::apply_sprite_layout;

/// Plugin that registers the surface material and its shader.
pub struct SurfaceMaterialPlugin;

impl Plugin for SurfaceMaterialPlugin {
    fn build(&self, app: &mut App) {
        embedded_asset!(app, "surface_material.wgsl");
        app.add_plugins(MaterialPlugin::<SurfaceMaterial>::default());
    }
}

/// Uniform block of the surface shader. Field order matches the WGSL struct.
#[derive(ShaderType, Debug, Clone, Copy)]
pub struct SurfaceParams {
    pub land_color: Vec4,
    pub ocean_color: Vec4,
    pub edge_color: Vec4,
    /// Size of one texel of the world map, for the edge filter.
    pub texel_size: Vec2,
    pub point_size: f32,
    pub land_threshold: f32,
    pub edge_strength: f32,
    pub glow_strength: f32,
    pub fade_width: f32,
    pub ocean_darkening: f32,
}

impl SurfaceParams {
    /// Parameters from the planet config. The texel size assumes a 2:1 map
    /// until the real dimensions are known.
    pub fn from_config(config: &PlanetConfig) -> Self {
        Self {
            land_color: LinearRgba::from(config.land_color).to_vec4(),
            ocean_color: LinearRgba::from(config.ocean_color).to_vec4(),
            edge_color: LinearRgba::from(config.edge_color).to_vec4(),
            texel_size: Vec2::new(1.0 / 2048.0, 1.0 / 1024.0),
            point_size: config.surface_point_size,
            land_threshold: config.land_threshold,
            edge_strength: config.edge_strength,
            glow_strength: config.center_glow_strength,
            fade_width: config.silhouette_fade,
            ocean_darkening: config.ocean_darkening,
        }
    }
}

/// Material for the planet's point-cloud surface.
#[derive(Asset, TypePath, AsBindGroup, Debug, Clone)]
pub struct SurfaceMaterial {
    #[uniform(0)]
    pub params: SurfaceParams,
    /// Equirectangular world map; land is read from the red channel.
    #[texture(1)]
    #[sampler(2)]
    pub world_map: Handle<Image>,
}

impl Material for SurfaceMaterial {
    fn vertex_shader() -> ShaderRef {
        "embedded://lumen_globe/surface_material.wgsl".into()
    }

    fn fragment_shader() -> ShaderRef {
        "embedded://lumen_globe/surface_material.wgsl".into()
    }

    fn alpha_mode(&self) -> AlphaMode {
        AlphaMode::Blend
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
        descriptor.primitive.cull_mode = None;
        Ok(())
    }
}

/// Update the edge-filter texel size once the world map has loaded.
pub fn sync_world_map_texel_size(
    mut image_events: MessageReader<AssetEvent<Image>>,
    images: Res<Assets<Image>>,
    mut materials: ResMut<Assets<SurfaceMaterial>>,
) {
    for event in image_events.read() {
        let AssetEvent::LoadedWithDependencies { id } = event else {
            continue;
        };
        let Some(image) = images.get(*id) else {
            continue;
        };
        let size = image.size_f32();
        if size.x <= 0.0 || size.y <= 0.0 {
            continue;
        }
        for (_, material) in materials.iter_mut() {
            if material.world_map.id() == *id {
                material.params.texel_size = Vec2::ONE / size;
            }
        }
    }
}
