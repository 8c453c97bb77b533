//! Stellar classes and their procedural colours and sizes.

use bevy::color::Color;
use rand::Rng;

/// Coarse stellar class used to colour background stars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StarClass {
    /// Hot blue-white stars. The most common class in the field.
    BlueWhite,
    /// Cool red dwarfs and giants.
    Red,
    /// Sun-like yellow stars. The rarest class in the field.
    Yellow,
}

/// Cumulative weights for sampling: 60% blue-white, 28% red, 12% yellow.
const CLASS_WEIGHTS: [(StarClass, f32); 3] = [
    (StarClass::BlueWhite, 0.60),
    (StarClass::Red, 0.88),
    (StarClass::Yellow, 1.0),
];

impl StarClass {
    /// Sample a class with the field's weighted distribution.
    pub fn sample<R: Rng>(rng: &mut R) -> Self {
        let roll: f32 = rng.random();
        CLASS_WEIGHTS
            .iter()
            .find(|(_, cumulative)| roll < *cumulative)
            .map_or(StarClass::Yellow, |(class, _)| *class)
    }

    /// Hue (degrees), saturation and lightness bands for this class.
    ///
    /// Each band is `(min, max)`; colours are sampled uniformly inside them.
    fn hsl_bands(self) -> [(f32, f32); 3] {
        match self {
            StarClass::BlueWhite => [(200.0, 230.0), (0.25, 0.6), (0.78, 0.95)],
            StarClass::Red => [(0.0, 18.0), (0.55, 0.85), (0.55, 0.72)],
            StarClass::Yellow => [(42.0, 58.0), (0.6, 0.9), (0.65, 0.82)],
        }
    }

    /// Relative size multiplier, so giants read as slightly larger points.
    fn size_factor(self) -> f32 {
        match self {
            StarClass::BlueWhite => 1.0,
            StarClass::Red => 0.85,
            StarClass::Yellow => 1.2,
        }
    }
}

/// Sample a star colour from the class's HSL band with a small jitter.
pub fn star_color<R: Rng>(class: StarClass, rng: &mut R) -> Color {
    let [hue, saturation, lightness] = class.hsl_bands();
    let pick = |(min, max): (f32, f32), rng: &mut R| min + (max - min) * rng.random::<f32>();
    Color::hsl(
        pick(hue, rng).rem_euclid(360.0),
        pick(saturation, rng),
        pick(lightness, rng),
    )
}

/// Sample a point size in `[min_size, max_size]` skewed towards small stars.
pub fn star_size<R: Rng>(class: StarClass, min_size: f32, max_size: f32, rng: &mut R) -> f32 {
    // Cubing the roll gives many faint points and a handful of bright ones.
    let roll = rng.random::<f32>().powi(3);
    let size = min_size + (max_size - min_size) * roll;
    (size * class.size_factor()).clamp(min_size, max_size)
}
