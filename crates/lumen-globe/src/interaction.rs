//! Pointer picking and the hover/click state machine.
//!
//! Pointer input arrives as [`GlobePointer`] messages, either from the window
//! bridge or from any other source (tests, touch adapters). Each move ray is
//! tested against the current marker set; the nearest hit becomes the hovered
//! marker. Hover changes always emit `markerLeave` for the old marker before
//! `markerHover` for the new one, and clicks only emit while a marker is
//! hovered.

use bevy::math::{Affine3A, Ray3d};
use bevy::prelude::*;

use crate::config::GlobeConfig;
use crate::listeners::{GlobeEventKind, GlobeListeners};
use crate::markers::{EventMarker, MarkerRegistry};
use crate::record::EventRecord;
use crate::scene::GlobeScene;

// ============================================================================
// Messages and state
// ============================================================================

/// Pointer input in world space.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub enum GlobePointer {
    /// The pointer moved; `ray` runs from the camera through the pointer.
    Move { ray: Ray3d },
    /// The pointer left the render surface.
    Leave,
    /// The primary button was clicked.
    Click,
}

/// An interaction event, written alongside the listener callbacks.
#[derive(Message, Debug, Clone, PartialEq)]
pub struct GlobeEvent {
    pub kind: GlobeEventKind,
    pub record: EventRecord,
}

/// The currently hovered marker, if any.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct HoverState {
    hovered: Option<Entity>,
}

impl HoverState {
    pub fn hovered(&self) -> Option<Entity> {
        self.hovered
    }

    pub fn is_hovering(&self) -> bool {
        self.hovered.is_some()
    }

    /// Forget the hovered marker without emitting anything.
    pub(crate) fn clear(&mut self) {
        self.hovered = None;
    }
}

/// Cursor the window should show.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum CursorFeedback {
    #[default]
    Default,
    /// A marker is under the pointer.
    Pointer,
}

/// Lets the owning UI block globe input while its widgets are under the pointer.
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct GlobeInputGate {
    pub blocked: bool,
}

// ============================================================================
// Picking
// ============================================================================

/// Distance along a normalized ray to the first intersection with a sphere.
///
/// Hits behind the origin are ignored. When the origin is inside the sphere
/// the exit point is returned.
pub fn ray_sphere_intersect(origin: Vec3, dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = origin - center;
    let b = oc.dot(dir);
    let c = oc.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let sqrt_disc = disc.sqrt();
    let mut t = -b - sqrt_disc;
    if t <= 0.0 {
        t = -b + sqrt_disc;
    }
    (t > 0.0).then_some(t)
}

/// World transform of the marker group, from the local transforms of its parents.
///
/// Computed from `Transform` rather than `GlobalTransform` so picking sees
/// this frame's rotation even before propagation.
fn marker_frame(frames: &Query<&Transform, Without<EventMarker>>, scene: &GlobeScene) -> Affine3A {
    let root = frames
        .get(scene.root)
        .map_or(Affine3A::IDENTITY, Transform::compute_affine);
    let group = frames
        .get(scene.marker_group)
        .map_or(Affine3A::IDENTITY, Transform::compute_affine);
    root * group
}

/// Nearest marker hit by `ray`, ignoring markers hidden behind the planet.
fn pick_marker(
    ray: Ray3d,
    frame: Affine3A,
    config: &GlobeConfig,
    registry: &MarkerRegistry,
    markers: &Query<(&mut EventMarker, &mut Transform)>,
) -> Option<Entity> {
    let (frame_scale, _, frame_origin) = frame.to_scale_rotation_translation();
    let frame_scale = frame_scale.max_element();
    let planet_hit = if config.markers.occlude_by_planet {
        ray_sphere_intersect(
            ray.origin,
            *ray.direction,
            frame_origin,
            config.planet.radius * frame_scale,
        )
    } else {
        None
    };

    let mut best: Option<(Entity, f32)> = None;
    for entity in registry.entities() {
        let Ok((marker, transform)) = markers.get(entity) else {
            continue;
        };
        let center = frame.transform_point3(transform.translation);
        let radius = marker.size * transform.scale.max_element() * frame_scale;
        let Some(t) = ray_sphere_intersect(ray.origin, *ray.direction, center, radius) else {
            continue;
        };
        if planet_hit.is_some_and(|planet_t| planet_t < t) {
            continue;
        }
        if best.is_none_or(|(_, best_t)| t < best_t) {
            best = Some((entity, t));
        }
    }
    best.map(|(entity, _)| entity)
}

// ============================================================================
// State machine
// ============================================================================

fn emit(
    listeners: &GlobeListeners,
    events: &mut MessageWriter<GlobeEvent>,
    kind: GlobeEventKind,
    record: EventRecord,
) {
    tracing::trace!(%kind, id = %record.id, "Globe event");
    listeners.dispatch(kind, &record);
    events.write(GlobeEvent { kind, record });
}

/// Move the hover to `next`, emitting leave then hover.
fn transition(
    next: Option<Entity>,
    hover: &mut HoverState,
    cursor: &mut CursorFeedback,
    markers: &mut Query<(&mut EventMarker, &mut Transform)>,
    listeners: &GlobeListeners,
    events: &mut MessageWriter<GlobeEvent>,
    hover_scale: f32,
) {
    if hover.hovered == next {
        return;
    }

    // A stale entity (removed since the last move) is forgotten silently.
    if let Some(previous) = hover.hovered.take()
        && let Ok((mut marker, mut transform)) = markers.get_mut(previous)
    {
        transform.scale = marker.original_scale;
        marker.is_hovered = false;
        let record = marker.record.clone();
        emit(listeners, events, GlobeEventKind::MarkerLeave, record);
    }

    *cursor = CursorFeedback::Default;
    if let Some(entity) = next
        && let Ok((mut marker, mut transform)) = markers.get_mut(entity)
    {
        hover.hovered = Some(entity);
        transform.scale = marker.original_scale * hover_scale;
        marker.is_hovered = true;
        let record = marker.record.clone();
        emit(listeners, events, GlobeEventKind::MarkerHover, record);
        *cursor = CursorFeedback::Pointer;
    }
}

/// Apply pointer messages to the hover state.
#[allow(clippy::too_many_arguments)]
pub fn handle_pointer(
    mut pointer: MessageReader<GlobePointer>,
    mut hover: ResMut<HoverState>,
    mut cursor: ResMut<CursorFeedback>,
    mut events: MessageWriter<GlobeEvent>,
    listeners: Res<GlobeListeners>,
    config: Res<GlobeConfig>,
    scene: Res<GlobeScene>,
    registry: Res<MarkerRegistry>,
    frames: Query<&Transform, Without<EventMarker>>,
    mut markers: Query<(&mut EventMarker, &mut Transform)>,
) {
    let hover_scale = config.markers.hover_scale;
    for message in pointer.read() {
        match *message {
            GlobePointer::Move { ray } => {
                let frame = marker_frame(&frames, &scene);
                let next = pick_marker(ray, frame, &config, &registry, &markers);
                transition(
                    next,
                    &mut hover,
                    &mut cursor,
                    &mut markers,
                    &listeners,
                    &mut events,
                    hover_scale,
                );
            }
            GlobePointer::Leave => {
                transition(
                    None,
                    &mut hover,
                    &mut cursor,
                    &mut markers,
                    &listeners,
                    &mut events,
                    hover_scale,
                );
            }
            GlobePointer::Click => {
                if let Some(entity) = hover.hovered
                    && let Ok((marker, _)) = markers.get(entity)
                {
                    emit(
                        &listeners,
                        &mut events,
                        GlobeEventKind::MarkerClick,
                        marker.record.clone(),
                    );
                }
            }
        }
    }
}
