//! Launch parameter parsing for the viewer.
//!
//! On native, parameters are parsed from command-line arguments using clap.
//! On WASM, defaults are used (CLI argument parsing is not available).

use std::path::PathBuf;

use bevy::prelude::*;
use lumen_globe::{GlobeConfig, PlanetConfig, StarfieldConfig};

/// Default event records, relative to the working directory.
const DEFAULT_RECORDS: &str = "assets/data/events.json";
/// Default world map, relative to the asset folder.
const DEFAULT_WORLD_MAP: &str = "textures/world_map.png";

/// Launch parameters for the viewer.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct LaunchParams {
    /// JSON file of event records. `None` uses the bundled sample.
    pub records: Option<PathBuf>,
    /// World-map texture path inside the asset folder.
    pub world_map: String,
    /// Number of stars; zero disables the starfield.
    pub stars: Option<usize>,
    /// Starfield seed.
    pub seed: Option<u64>,
    /// Planet rotation in radians per second.
    pub rotation_speed: Option<f32>,
    /// Use the small decorative starfield instead of the full one.
    pub decorative_stars: bool,
}

impl Default for LaunchParams {
    fn default() -> Self {
        Self {
            records: None,
            world_map: DEFAULT_WORLD_MAP.to_string(),
            stars: None,
            seed: None,
            rotation_speed: None,
            decorative_stars: false,
        }
    }
}

impl LaunchParams {
    /// Globe configuration with these overrides applied.
    pub fn globe_config(&self) -> GlobeConfig {
        let mut starfield = if self.decorative_stars {
            StarfieldConfig::decorative()
        } else {
            StarfieldConfig::primary()
        };
        if let Some(stars) = self.stars {
            starfield.num_stars = stars;
        }
        if let Some(seed) = self.seed {
            starfield.seed = seed;
        }

        let defaults = PlanetConfig::default();
        GlobeConfig {
            planet: PlanetConfig {
                world_map_path: self.world_map.clone(),
                rotation_speed: self.rotation_speed.unwrap_or(defaults.rotation_speed),
                ..defaults
            },
            starfield,
            ..default()
        }
    }
}

#[cfg(not(target_family = "wasm"))]
mod native {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    #[command(about = "Interactive globe of live prayer events")]
    struct CliArgs {
        /// JSON file of event records.
        #[arg(long, default_value = DEFAULT_RECORDS)]
        records: PathBuf,

        /// World-map texture, relative to the asset folder.
        #[arg(long, default_value = DEFAULT_WORLD_MAP)]
        world_map: String,

        /// Number of stars (0 disables the starfield).
        #[arg(long)]
        stars: Option<usize>,

        /// Starfield seed.
        #[arg(long)]
        seed: Option<u64>,

        /// Planet rotation in radians per second.
        #[arg(long, allow_negative_numbers = true)]
        rotation_speed: Option<f32>,

        /// Use the small decorative starfield.
        #[arg(long)]
        decorative_stars: bool,
    }

    pub fn parse() -> LaunchParams {
        let args = CliArgs::parse();
        LaunchParams {
            records: Some(args.records),
            world_map: args.world_map,
            stars: args.stars,
            seed: args.seed,
            rotation_speed: args.rotation_speed,
            decorative_stars: args.decorative_stars,
        }
    }
}

/// Parse launch parameters from CLI args (native) or use defaults (WASM).
pub fn parse() -> LaunchParams {
    #[cfg(not(target_family = "wasm"))]
    {
        native::parse()
    }
    #[cfg(target_family = "wasm")]
    {
        LaunchParams::default()
    }
}
