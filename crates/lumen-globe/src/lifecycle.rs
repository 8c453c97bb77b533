//! Globe lifecycle: running, paused and disposed.
//!
//! ## States
//!
//! - **Uninitialized**: before startup finishes.
//! - **Running**: per-frame systems run and the camera renders.
//! - **Paused**: per-frame systems are skipped, the camera is inactive and
//!   the event loop drops to reactive low-power mode.
//! - **Disposed**: terminal. Every globe entity and asset has been released.
//!
//! ### Valid transitions
//!
//! ```text
//! Uninitialized -> Running <-> Paused
//! Running | Paused -> Disposed
//! ```
//!
//! Changes are requested through [`LifecycleRequests`] and applied at the
//! start of the next frame, before any input or animation system runs.

use std::time::Duration;

use bevy::ecs::system::SystemState;
use bevy::prelude::*;
use bevy::winit::{UpdateMode, WinitSettings};

use crate::core_material::CoreMaterial;
use crate::error::GlobeError;
use crate::interaction::{CursorFeedback, HoverState};
use crate::listeners::GlobeListeners;
use crate::markers::GlobeMarkers;
use crate::scene::GlobeScene;
use crate::star_material::StarMaterial;
use crate::surface_material::SurfaceMaterial;

/// Wake-up interval of the event loop while paused.
const PAUSED_WAIT: Duration = Duration::from_secs(1);

// ============================================================================
// State
// ============================================================================

/// Lifecycle state of the globe.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    #[default]
    Uninitialized,
    Running,
    Paused,
    Disposed,
}

/// Current lifecycle state.
#[derive(Resource, Debug, Default)]
pub struct GlobeLifecycle {
    state: LifecycleState,
    /// Event loop settings to restore on resume.
    saved_update_modes: Option<(UpdateMode, UpdateMode)>,
}

impl GlobeLifecycle {
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LifecycleState::Running
    }

    pub fn is_paused(&self) -> bool {
        self.state == LifecycleState::Paused
    }

    pub fn is_disposed(&self) -> bool {
        self.state == LifecycleState::Disposed
    }
}

/// Run condition: the globe is running.
pub fn globe_running(lifecycle: Res<GlobeLifecycle>) -> bool {
    lifecycle.is_running()
}

/// Pending lifecycle requests.
///
/// Requests are queued and applied in order by the lifecycle system at the
/// start of the next frame.
#[derive(Resource, Debug, Default)]
pub struct LifecycleRequests {
    pending: Vec<LifecycleRequest>,
}

impl LifecycleRequests {
    /// Request that per-frame work stops.
    pub fn request_pause(&mut self) {
        self.pending.push(LifecycleRequest::Pause);
    }

    /// Request that per-frame work resumes. No-op while running.
    pub fn request_resume(&mut self) {
        self.pending.push(LifecycleRequest::Resume);
    }

    /// Request permanent teardown.
    pub fn request_dispose(&mut self) {
        self.pending.push(LifecycleRequest::Dispose);
    }

    fn take(&mut self) -> Vec<LifecycleRequest> {
        std::mem::take(&mut self.pending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LifecycleRequest {
    Pause,
    Resume,
    Dispose,
}

/// Frames rendered while running.
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct GlobeFrameStats {
    pub frames: u64,
}

/// Written when the globe fails after startup, for example when the world
/// map cannot be loaded. The globe disposes itself afterwards.
#[derive(Message, Debug, Clone)]
pub struct GlobeFailure(pub GlobeError);

// ============================================================================
// Systems
// ============================================================================

/// Enter the running state once startup has finished.
pub fn start_globe(mut lifecycle: ResMut<GlobeLifecycle>) {
    if lifecycle.state == LifecycleState::Uninitialized {
        lifecycle.state = LifecycleState::Running;
        tracing::info!("Globe running");
    }
}

/// Count a rendered frame.
pub fn count_frame(mut stats: ResMut<GlobeFrameStats>) {
    stats.frames += 1;
}

/// Dispose after a failure.
pub fn dispose_on_failure(
    mut failures: MessageReader<GlobeFailure>,
    mut requests: ResMut<LifecycleRequests>,
) {
    for GlobeFailure(err) in failures.read() {
        tracing::error!("Globe failed: {err}");
        requests.request_dispose();
    }
}

/// Apply queued lifecycle requests.
pub fn process_lifecycle_requests(world: &mut World) {
    let requests = world.resource_mut::<LifecycleRequests>().take();
    for request in requests {
        match request {
            LifecycleRequest::Pause => pause(world),
            LifecycleRequest::Resume => resume(world),
            LifecycleRequest::Dispose => dispose(world),
        }
    }
}

fn state(world: &World) -> LifecycleState {
    world.resource::<GlobeLifecycle>().state
}

fn pause(world: &mut World) {
    match state(world) {
        LifecycleState::Running => {}
        LifecycleState::Paused => return,
        other => {
            tracing::warn!(?other, "Ignoring pause request");
            return;
        }
    }

    set_camera_active(world, false);
    let saved = world
        .get_resource_mut::<WinitSettings>()
        .map(|mut settings| {
            let saved = (settings.focused_mode, settings.unfocused_mode);
            settings.focused_mode = UpdateMode::reactive_low_power(PAUSED_WAIT);
            settings.unfocused_mode = UpdateMode::reactive_low_power(PAUSED_WAIT);
            saved
        });

    let mut lifecycle = world.resource_mut::<GlobeLifecycle>();
    lifecycle.state = LifecycleState::Paused;
    lifecycle.saved_update_modes = saved;
    tracing::info!("Globe paused");
}

fn resume(world: &mut World) {
    match state(world) {
        LifecycleState::Paused => {}
        LifecycleState::Running => return,
        other => {
            tracing::warn!(?other, "Ignoring resume request");
            return;
        }
    }

    let saved = world
        .resource_mut::<GlobeLifecycle>()
        .saved_update_modes
        .take();
    if let Some((focused, unfocused)) = saved
        && let Some(mut settings) = world.get_resource_mut::<WinitSettings>()
    {
        settings.focused_mode = focused;
        settings.unfocused_mode = unfocused;
    }
    set_camera_active(world, true);

    world.resource_mut::<GlobeLifecycle>().state = LifecycleState::Running;
    tracing::info!("Globe resumed");
}

fn dispose(world: &mut World) {
    if state(world) == LifecycleState::Disposed {
        return;
    }
    pause(world);

    let Some(scene) = world.get_resource::<GlobeScene>().cloned() else {
        world.resource_mut::<GlobeLifecycle>().state = LifecycleState::Disposed;
        return;
    };

    // Markers go through their own removal path first.
    let mut markers = SystemState::<GlobeMarkers>::new(world);
    markers.get_mut(world).clear_event_markers();
    markers.apply(world);

    let mut entities = Vec::new();
    collect_subtree(world, scene.root, &mut entities);
    entities.extend(scene.starfield);
    let released = entities.len();
    for &entity in &entities {
        release_entity_assets(world, entity);
    }

    if let Some(world_map) = &scene.world_map
        && let Some(mut images) = world.get_resource_mut::<Assets<Image>>()
    {
        images.remove(world_map);
    }

    for entity in [Some(scene.root), scene.starfield, scene.camera]
        .into_iter()
        .flatten()
    {
        if let Ok(entity) = world.get_entity_mut(entity) {
            entity.despawn();
        }
    }

    world.resource_mut::<GlobeListeners>().clear();
    world.resource_mut::<HoverState>().clear();
    *world.resource_mut::<CursorFeedback>() = CursorFeedback::Default;

    let mut lifecycle = world.resource_mut::<GlobeLifecycle>();
    lifecycle.state = LifecycleState::Disposed;
    lifecycle.saved_update_modes = None;
    tracing::info!(entities = released, "Globe disposed");
}

fn set_camera_active(world: &mut World, active: bool) {
    let Some(camera) = world.get_resource::<GlobeScene>().and_then(|scene| scene.camera) else {
        return;
    };
    if let Some(mut camera) = world.get_mut::<Camera>(camera) {
        camera.is_active = active;
    }
}

fn collect_subtree(world: &World, entity: Entity, out: &mut Vec<Entity>) {
    out.push(entity);
    let children: Vec<Entity> = world
        .get::<Children>(entity)
        .map(|children| children.iter().collect())
        .unwrap_or_default();
    for child in children {
        collect_subtree(world, child, out);
    }
}

/// Remove the mesh and material assets referenced by `entity`.
fn release_entity_assets(world: &mut World, entity: Entity) {
    if let Some(mesh) = world.get::<Mesh3d>(entity).map(|mesh| mesh.0.clone())
        && let Some(mut meshes) = world.get_resource_mut::<Assets<Mesh>>()
    {
        meshes.remove(&mesh);
    }
    release_material::<StandardMaterial>(world, entity);
    release_material::<SurfaceMaterial>(world, entity);
    release_material::<CoreMaterial>(world, entity);
    release_material::<StarMaterial>(world, entity);
}

fn release_material<M: Material>(world: &mut World, entity: Entity) {
    if let Some(material) = world
        .get::<MeshMaterial3d<M>>(entity)
        .map(|material| material.0.clone())
        && let Some(mut materials) = world.get_resource_mut::<Assets<M>>()
    {
        materials.remove(&material);
    }
}

#[cfg(test)]
mod tests {
    use bevy::ecs::system::RunSystemOnce;

    use super::*;
    use crate::interaction::GlobePointer;
    use crate::markers::MarkerRegistry;
    use crate::record::EventRecord;
    use crate::test_app;

    fn place_markers(app: &mut App) {
        app.world_mut()
            .run_system_once(|mut markers: GlobeMarkers| {
                markers.replace_event_markers([
                    EventRecord::new("a", 10.0, 10.0, 5),
                    EventRecord::new("b", 20.0, 20.0, 8),
                ])
            })
            .unwrap();
    }

    fn frames(app: &App) -> u64 {
        app.world().resource::<GlobeFrameStats>().frames
    }

    #[test]
    fn test_running_after_startup() {
        let mut app = test_app();
        assert_eq!(
            app.world().resource::<GlobeLifecycle>().state(),
            LifecycleState::Running
        );
        let before = frames(&app);
        app.update();
        assert_eq!(frames(&app), before + 1);
    }

    #[test]
    fn test_pause_stops_frames_and_resume_restarts() {
        let mut app = test_app();
        app.world_mut().resource_mut::<LifecycleRequests>().request_pause();
        app.update();
        assert!(app.world().resource::<GlobeLifecycle>().is_paused());

        let paused_at = frames(&app);
        app.update();
        app.update();
        assert_eq!(frames(&app), paused_at);

        app.world_mut().resource_mut::<LifecycleRequests>().request_resume();
        app.update();
        assert!(app.world().resource::<GlobeLifecycle>().is_running());
        assert_eq!(frames(&app), paused_at + 1);
    }

    #[test]
    fn test_resume_while_running_is_noop() {
        let mut app = test_app();
        let before = frames(&app);
        {
            let mut requests = app.world_mut().resource_mut::<LifecycleRequests>();
            requests.request_resume();
            requests.request_resume();
        }
        app.update();
        assert!(app.world().resource::<GlobeLifecycle>().is_running());
        assert_eq!(frames(&app), before + 1);
    }

    #[test]
    fn test_dispose_releases_everything() {
        let mut app = test_app();
        place_markers(&mut app);
        app.world_mut()
            .resource_mut::<GlobeListeners>()
            .add_listener(crate::GlobeEventKind::MarkerClick, |_| {});

        app.world_mut().resource_mut::<LifecycleRequests>().request_dispose();
        app.update();

        assert!(app.world().resource::<GlobeLifecycle>().is_disposed());
        assert!(app.world().resource::<MarkerRegistry>().is_empty());
        assert!(app.world().resource::<GlobeListeners>().is_empty());
        assert_eq!(app.world().resource::<Assets<Mesh>>().len(), 0);
        assert_eq!(app.world().resource::<Assets<StandardMaterial>>().len(), 0);
        let root = app.world().resource::<GlobeScene>().root;
        assert!(app.world().get_entity(root).is_err());
    }

    #[test]
    fn test_no_frames_after_dispose() {
        let mut app = test_app();
        place_markers(&mut app);
        app.world_mut().resource_mut::<LifecycleRequests>().request_dispose();
        app.update();
        let disposed_at = frames(&app);

        for _ in 0..3 {
            app.world_mut().write_message(GlobePointer::Click);
            app.update();
        }
        assert_eq!(frames(&app), disposed_at);

        // Requests after disposal do not bring anything back.
        app.world_mut().resource_mut::<LifecycleRequests>().request_resume();
        app.world_mut().resource_mut::<LifecycleRequests>().request_dispose();
        app.update();
        assert!(app.world().resource::<GlobeLifecycle>().is_disposed());
        assert_eq!(frames(&app), disposed_at);
    }

    #[test]
    fn test_mutations_after_dispose_refused() {
        let mut app = test_app();
        app.world_mut().resource_mut::<LifecycleRequests>().request_dispose();
        app.update();

        let placed = app
            .world_mut()
            .run_system_once(|mut markers: GlobeMarkers| {
                markers.add_event_marker(EventRecord::new("late", 0.0, 0.0, 5))
            })
            .unwrap();
        assert_eq!(placed, None);
        assert!(app.world().resource::<MarkerRegistry>().is_empty());
    }

    #[test]
    fn test_failure_triggers_dispose() {
        let mut app = test_app();
        app.world_mut().write_message(GlobeFailure(GlobeError::TextureLoad {
            path: "textures/world_map.png".into(),
            message: "not found".into(),
        }));
        app.update();
        app.update();
        assert!(app.world().resource::<GlobeLifecycle>().is_disposed());
    }
}
