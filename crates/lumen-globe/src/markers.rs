//! Event markers.
//!
//! Every valid [`EventRecord`] becomes one glowing sphere under the marker
//! group. Markers are keyed by record id in [`MarkerRegistry`], and each owns
//! its own mesh and material, which are removed from their asset stores when
//! the marker goes away.
//!
//! All mutation goes through the [`GlobeMarkers`] system parameter:
//!
//! ```ignore
//! fn load(mut markers: GlobeMarkers, records: Res<PendingRecords>) {
//!     let placed = markers.replace_event_markers(records.0.iter().cloned());
//!     tracing::info!(placed, "Markers placed");
//! }
//! ```

use std::collections::{HashMap, HashSet};
use std::f32::consts::TAU;

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::config::{GlobeConfig, MarkerConfig};
use crate::coords::lat_lng_to_position;
use crate::interaction::{CursorFeedback, HoverState};
use crate::lifecycle::GlobeLifecycle;
use crate::record::EventRecord;
use crate::scene::GlobeScene;

/// Base opacity of a marker at pulse intensity 1.
const BASE_OPACITY: f32 = 0.85;
/// Emissive multiplier at pulse intensity 1.
const BASE_EMISSIVE: f32 = 1.6;

// ============================================================================
// Components and resources
// ============================================================================

/// Colour tier of a marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerTier {
    High,
    Low,
}

/// A marker on the globe.
#[derive(Component, Debug, Clone)]
pub struct EventMarker {
    /// The record this marker was created from.
    pub record: EventRecord,
    /// Sphere radius.
    pub size: f32,
    pub tier: MarkerTier,
    /// Scale to restore when hover ends.
    pub original_scale: Vec3,
    pub is_hovered: bool,
    /// Pulse phase offset in radians.
    pub phase: f32,
    base_emissive: LinearRgba,
}

struct MarkerSlot {
    entity: Entity,
    mesh: Handle<Mesh>,
    material: Handle<StandardMaterial>,
}

/// Markers currently on the globe, keyed by record id.
#[derive(Resource, Default)]
pub struct MarkerRegistry {
    slots: HashMap<String, MarkerSlot>,
}

impl MarkerRegistry {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.slots.contains_key(id)
    }

    /// Entity of the marker for `id`.
    pub fn entity(&self, id: &str) -> Option<Entity> {
        self.slots.get(id).map(|slot| slot.entity)
    }

    /// Entities of every marker, in no particular order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.slots.values().map(|slot| slot.entity)
    }

    /// Record ids of every marker, in no particular order.
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.slots.keys().map(String::as_str)
    }
}

impl std::fmt::Debug for MarkerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkerRegistry")
            .field("markers", &self.slots.len())
            .finish()
    }
}

// ============================================================================
// Sizing and animation
// ============================================================================

/// Sphere radius for a priority: `base + (priority / 10) * max_delta`, clamped.
#[allow(clippy::cast_precision_loss)]
pub fn marker_size(priority: i32, config: &MarkerConfig) -> f32 {
    let p = priority as f32;
    (config.base_size + (p / 10.0) * config.max_size_delta).clamp(config.min_size, config.max_size)
}

/// Colour tier for a priority.
pub fn marker_tier(priority: i32, config: &MarkerConfig) -> MarkerTier {
    if priority >= config.high_priority_threshold {
        MarkerTier::High
    } else {
        MarkerTier::Low
    }
}

/// Deterministic pulse phase in `[0, TAU)` from a record's id and priority.
#[allow(clippy::cast_precision_loss, clippy::cast_sign_loss)]
pub fn pulse_phase(id: &str, priority: i32) -> f32 {
    // FNV-1a.
    let mut hash: u32 = 0x811c_9dc5;
    for byte in id.bytes().chain(priority.to_le_bytes()) {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    (f64::from(hash) / (f64::from(u32::MAX) + 1.0)) as f32 * TAU
}

/// How strongly a priority pulses, in `[0.1, 1]`.
#[allow(clippy::cast_precision_loss)]
pub fn pulse_weight(priority: i32) -> f32 {
    priority.clamp(1, 10) as f32 / 10.0
}

/// Pulse multiplier at `time`: `1 + amplitude * weight * sin(time * speed + phase)`.
pub fn pulse_intensity(priority: i32, phase: f32, time: f32, config: &MarkerConfig) -> f32 {
    let wave = (time * config.pulse_speed + phase).sin();
    1.0 + config.pulse_amplitude * pulse_weight(priority) * wave
}

/// Marker opacity for a pulse intensity.
pub fn marker_opacity(intensity: f32) -> f32 {
    (BASE_OPACITY * intensity).clamp(0.3, 1.0)
}

/// Apply the pulse to every marker's material.
pub fn pulse_markers(
    time: Res<Time>,
    config: Res<GlobeConfig>,
    markers: Query<(&EventMarker, &MeshMaterial3d<StandardMaterial>)>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let t = time.elapsed_secs();
    let config = &config.markers;
    for (marker, handle) in &markers {
        let Some(material) = materials.get_mut(&handle.0) else {
            continue;
        };
        let intensity = pulse_intensity(marker.record.priority, marker.phase, t, config);
        let boost = if marker.is_hovered {
            config.hover_emissive_boost
        } else {
            1.0
        };
        material.emissive = marker.base_emissive * (intensity * boost);
        material.base_color.set_alpha(marker_opacity(intensity));
    }
}

// ============================================================================
// Mutation
// ============================================================================

/// System parameter for adding and removing markers.
#[derive(SystemParam)]
pub struct GlobeMarkers<'w, 's> {
    commands: Commands<'w, 's>,
    registry: ResMut<'w, MarkerRegistry>,
    hover: ResMut<'w, HoverState>,
    cursor: ResMut<'w, CursorFeedback>,
    meshes: ResMut<'w, Assets<Mesh>>,
    materials: ResMut<'w, Assets<StandardMaterial>>,
    config: Res<'w, GlobeConfig>,
    scene: Res<'w, GlobeScene>,
    lifecycle: Res<'w, GlobeLifecycle>,
    children: Query<'w, 's, &'static Children>,
    meshed: Query<
        'w,
        's,
        (
            Option<&'static Mesh3d>,
            Option<&'static MeshMaterial3d<StandardMaterial>>,
        ),
    >,
    markers: Query<'w, 's, &'static EventMarker>,
}

impl GlobeMarkers<'_, '_> {
    /// Place a marker for `record`.
    ///
    /// Returns `None` and logs a warning when the record has no usable
    /// coordinates. A marker already registered under the same id is
    /// removed first.
    pub fn add_event_marker(&mut self, record: EventRecord) -> Option<Entity> {
        if self.lifecycle.is_disposed() {
            tracing::warn!(id = %record.id, "Ignoring marker add after globe disposal");
            return None;
        }
        let (lat, lng) = match record.coordinates() {
            Ok(coordinates) => coordinates,
            Err(err) => {
                tracing::warn!(id = %record.id, "Skipping event record: {err}");
                return None;
            }
        };
        if self.registry.contains(&record.id) {
            tracing::debug!(id = %record.id, "Replacing existing marker");
            self.remove_event_marker(&record.id);
        }

        let config = &self.config.markers;
        let radius = self.config.planet.radius + config.altitude;
        let position = lat_lng_to_position(lat, lng, f64::from(radius));
        let size = marker_size(record.priority, config);
        let tier = marker_tier(record.priority, config);
        let color = match tier {
            MarkerTier::High => config.high_color,
            MarkerTier::Low => config.low_color,
        };
        let base_emissive = LinearRgba::from(color) * BASE_EMISSIVE;

        let mesh = self.meshes.add(Sphere::new(size).mesh().uv(16, 12));
        let material = self.materials.add(StandardMaterial {
            base_color: color.with_alpha(BASE_OPACITY),
            emissive: base_emissive,
            alpha_mode: AlphaMode::Blend,
            ..default()
        });

        let id = record.id.clone();
        let phase = pulse_phase(&record.id, record.priority);
        let entity = self
            .commands
            .spawn((
                Name::new(format!("Marker {id}")),
                EventMarker {
                    record,
                    size,
                    tier,
                    original_scale: Vec3::ONE,
                    is_hovered: false,
                    phase,
                    base_emissive,
                },
                Mesh3d(mesh.clone()),
                MeshMaterial3d(material.clone()),
                Transform::from_translation(position),
                ChildOf(self.scene.marker_group),
            ))
            .id();

        tracing::debug!(%id, ?tier, size, "Added marker");
        self.registry.slots.insert(
            id,
            MarkerSlot {
                entity,
                mesh,
                material,
            },
        );
        Some(entity)
    }

    /// Remove the marker for `id`. Unknown ids are ignored.
    ///
    /// Returns whether a marker was removed.
    pub fn remove_event_marker(&mut self, id: &str) -> bool {
        if self.lifecycle.is_disposed() {
            tracing::warn!(id, "Ignoring marker removal after globe disposal");
            return false;
        }
        let Some(slot) = self.registry.slots.remove(id) else {
            return false;
        };
        self.release(&slot);
        tracing::debug!(id, "Removed marker");
        true
    }

    /// Remove every marker and anything else left under the marker group.
    pub fn clear_event_markers(&mut self) {
        if self.lifecycle.is_disposed() {
            tracing::warn!("Ignoring marker clear after globe disposal");
            return;
        }
        let slots: Vec<MarkerSlot> = self.registry.slots.drain().map(|(_, slot)| slot).collect();
        let released: HashSet<Entity> = slots.iter().map(|slot| slot.entity).collect();
        for slot in &slots {
            self.release(slot);
        }

        let mut orphans = 0usize;
        if let Ok(children) = self.children.get(self.scene.marker_group) {
            for child in children.iter().filter(|child| !released.contains(child)) {
                if let Ok((mesh, material)) = self.meshed.get(child) {
                    if let Some(mesh) = mesh {
                        self.meshes.remove(&mesh.0);
                    }
                    if let Some(material) = material {
                        self.materials.remove(&material.0);
                    }
                }
                self.commands.entity(child).try_despawn();
                orphans += 1;
            }
        }
        if orphans > 0 {
            tracing::warn!(orphans, "Despawned untracked children of the marker group");
        }

        self.reset_hover();
        tracing::debug!(removed = slots.len(), "Cleared markers");
    }

    /// Replace all markers with `records`. Returns how many were placed.
    pub fn replace_event_markers(
        &mut self,
        records: impl IntoIterator<Item = EventRecord>,
    ) -> usize {
        self.clear_event_markers();
        records
            .into_iter()
            .filter_map(|record| self.add_event_marker(record))
            .count()
    }

    pub fn marker_count(&self) -> usize {
        self.registry.len()
    }

    /// The marker for `id`, once its entity has been spawned.
    pub fn marker(&self, id: &str) -> Option<&EventMarker> {
        let entity = self.registry.entity(id)?;
        self.markers.get(entity).ok()
    }

    fn release(&mut self, slot: &MarkerSlot) {
        self.meshes.remove(&slot.mesh);
        self.materials.remove(&slot.material);
        self.commands.entity(slot.entity).try_despawn();
        if self.hover.hovered() == Some(slot.entity) {
            self.reset_hover();
        }
    }

    fn reset_hover(&mut self) {
        self.hover.clear();
        *self.cursor = CursorFeedback::Default;
    }
}

#[cfg(test)]
mod tests {
    use bevy::ecs::system::RunSystemOnce;

    use super::*;
    use crate::test_app;

    fn add(app: &mut App, record: EventRecord) -> Option<Entity> {
        app.world_mut()
            .run_system_once(move |mut markers: GlobeMarkers| {
                markers.add_event_marker(record.clone())
            })
            .unwrap()
    }

    fn count(app: &mut App) -> usize {
        app.world_mut()
            .run_system_once(|markers: GlobeMarkers| markers.marker_count())
            .unwrap()
    }

    fn group_children(app: &App) -> usize {
        let group = app.world().resource::<GlobeScene>().marker_group;
        app.world()
            .get::<Children>(group)
            .map_or(0, |children| children.len())
    }

    #[test]
    fn test_size_grows_with_priority() {
        let config = MarkerConfig::default();
        assert!(marker_size(9, &config) > marker_size(2, &config));
        assert_eq!(marker_size(-50, &config), config.min_size);
        assert_eq!(marker_size(1_000, &config), config.max_size);
    }

    #[test]
    fn test_tier_threshold() {
        let config = MarkerConfig::default();
        assert_eq!(marker_tier(9, &config), MarkerTier::High);
        assert_eq!(marker_tier(7, &config), MarkerTier::High);
        assert_eq!(marker_tier(6, &config), MarkerTier::Low);
        assert_eq!(marker_tier(2, &config), MarkerTier::Low);
    }

    #[test]
    fn test_pulse_phase_is_deterministic_and_spread() {
        assert_eq!(pulse_phase("abc", 5), pulse_phase("abc", 5));
        assert_ne!(pulse_phase("abc", 5), pulse_phase("abd", 5));
        assert_ne!(pulse_phase("abc", 5), pulse_phase("abc", 6));
        for id in ["", "a", "65f1c0", "zzzzzzzzzzzz"] {
            let phase = pulse_phase(id, 3);
            assert!((0.0..TAU).contains(&phase), "{phase}");
        }
    }

    #[test]
    fn test_pulse_intensity_bounds() {
        let config = MarkerConfig::default();
        for i in 0..200 {
            let t = i as f32 * 0.05;
            let high = pulse_intensity(10, 0.3, t, &config);
            let low = pulse_intensity(1, 0.3, t, &config);
            assert!((high - 1.0).abs() <= config.pulse_amplitude + 1e-5);
            assert!((low - 1.0).abs() <= config.pulse_amplitude * 0.1 + 1e-5);
        }
    }

    #[test]
    fn test_priority_drives_size_and_tier() {
        let mut app = test_app();
        add(&mut app, EventRecord::new("low", 10.0, 20.0, 2));
        add(&mut app, EventRecord::new("high", 10.0, 20.0, 9));

        let (low, high) = app
            .world_mut()
            .run_system_once(|markers: GlobeMarkers| {
                let low = markers.marker("low").cloned();
                let high = markers.marker("high").cloned();
                (low, high)
            })
            .unwrap();
        let (low, high) = (low.unwrap(), high.unwrap());
        assert!(high.size > low.size);
        assert_eq!(high.tier, MarkerTier::High);
        assert_eq!(low.tier, MarkerTier::Low);
    }

    #[test]
    fn test_invalid_records_rejected() {
        let mut app = test_app();
        let missing = EventRecord {
            id: "missing".into(),
            longitude: Some(10.0),
            ..Default::default()
        };
        assert_eq!(add(&mut app, missing), None);
        assert_eq!(add(&mut app, EventRecord::new("nan", 10.0, f64::NAN, 5)), None);
        assert_eq!(add(&mut app, EventRecord::new("inf", f64::INFINITY, 1.0, 5)), None);
        assert_eq!(count(&mut app), 0);
        assert_eq!(group_children(&app), 0);
    }

    #[test]
    fn test_add_then_clear() {
        let mut app = test_app();
        for i in 0..12 {
            let record = EventRecord::new(
                format!("m{i}"),
                f64::from(i) * 5.0,
                f64::from(i) * 20.0 - 100.0,
                i % 10,
            );
            assert!(add(&mut app, record).is_some());
        }
        assert_eq!(count(&mut app), 12);
        assert_eq!(group_children(&app), 12);

        app.world_mut()
            .run_system_once(|mut markers: GlobeMarkers| markers.clear_event_markers())
            .unwrap();
        assert_eq!(count(&mut app), 0);
        assert_eq!(group_children(&app), 0);
        assert_eq!(app.world().resource::<Assets<StandardMaterial>>().len(), 0);
        assert_eq!(app.world().resource::<Assets<Mesh>>().len(), 0);
    }

    #[test]
    fn test_clear_removes_orphans() {
        let mut app = test_app();
        add(&mut app, EventRecord::new("a", 1.0, 2.0, 5));
        let group = app.world().resource::<GlobeScene>().marker_group;
        let stray_mesh = app
            .world_mut()
            .resource_mut::<Assets<Mesh>>()
            .add(Sphere::new(0.1).mesh().uv(8, 6));
        app.world_mut()
            .spawn((Mesh3d(stray_mesh), Transform::default(), ChildOf(group)));
        assert_eq!(group_children(&app), 2);

        app.world_mut()
            .run_system_once(|mut markers: GlobeMarkers| markers.clear_event_markers())
            .unwrap();
        assert_eq!(group_children(&app), 0);
        assert_eq!(app.world().resource::<Assets<Mesh>>().len(), 0);
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut app = test_app();
        add(&mut app, EventRecord::new("a", 1.0, 2.0, 5));
        let removed = app
            .world_mut()
            .run_system_once(|mut markers: GlobeMarkers| markers.remove_event_marker("nope"))
            .unwrap();
        assert!(!removed);
        assert_eq!(count(&mut app), 1);
    }

    #[test]
    fn test_duplicate_id_replaces_marker() {
        let mut app = test_app();
        let first = add(&mut app, EventRecord::new("dup", 1.0, 2.0, 2)).unwrap();
        let second = add(&mut app, EventRecord::new("dup", 3.0, 4.0, 9)).unwrap();
        assert_ne!(first, second);
        assert!(app.world().get_entity(first).is_err());
        assert_eq!(count(&mut app), 1);
        assert_eq!(group_children(&app), 1);
        assert_eq!(app.world().resource::<Assets<StandardMaterial>>().len(), 1);

        let tier = app
            .world_mut()
            .run_system_once(|markers: GlobeMarkers| markers.marker("dup").map(|m| m.tier))
            .unwrap();
        assert_eq!(tier, Some(MarkerTier::High));
    }

    #[test]
    fn test_replace_counts_valid_records() {
        let mut app = test_app();
        add(&mut app, EventRecord::new("old", 1.0, 2.0, 5));
        let records = vec![
            EventRecord::new("a", 40.7, -74.0, 9),
            EventRecord {
                id: "b".into(),
                longitude: Some(10.0),
                priority: 3,
                ..Default::default()
            },
            EventRecord::new("c", -33.9, 151.2, 4),
        ];
        let placed = app
            .world_mut()
            .run_system_once(move |mut markers: GlobeMarkers| {
                markers.replace_event_markers(records.clone())
            })
            .unwrap();
        assert_eq!(placed, 2);
        assert_eq!(count(&mut app), 2);
        assert_eq!(group_children(&app), 2);
    }

    #[test]
    fn test_pulse_changes_material() {
        let mut app = test_app();
        let entity = add(&mut app, EventRecord::new("a", 1.0, 2.0, 10)).unwrap();
        let handle = app
            .world()
            .get::<MeshMaterial3d<StandardMaterial>>(entity)
            .unwrap()
            .0
            .clone();
        let emissive = |app: &App| {
            app.world()
                .resource::<Assets<StandardMaterial>>()
                .get(&handle)
                .unwrap()
                .emissive
        };
        let before = emissive(&app);

        app.world_mut().run_system_once(pulse_markers).unwrap();
        let after = emissive(&app);
        let marker = app.world().get::<EventMarker>(entity).unwrap();
        let t = app.world().resource::<Time>().elapsed_secs();
        let expected = pulse_intensity(10, marker.phase, t, &MarkerConfig::default());
        assert!((after.red - before.red * expected).abs() < 1e-4, "{before:?} {after:?}");
    }
}
