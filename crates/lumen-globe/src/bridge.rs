//! Converts window cursor input into [`GlobePointer`] messages.

use bevy::prelude::*;
use bevy::window::{CursorLeft, CursorMoved, PrimaryWindow};

use crate::interaction::{GlobeInputGate, GlobePointer};
use crate::scene::GlobeScene;

/// Cursor travel between press and release, in logical pixels, above which
/// a left release counts as a drag rather than a click.
pub const CLICK_SLOP: f32 = 4.0;

/// Cursor tracking between frames.
#[derive(Default)]
pub struct CursorTracker {
    position: Option<Vec2>,
    pressed_at: Option<Vec2>,
    dragged: bool,
    blocked: bool,
}

impl CursorTracker {
    /// Note a left-button press at the current position.
    pub fn press(&mut self) {
        self.pressed_at = self.position;
        self.dragged = false;
    }

    /// Move the cursor, marking the press as a drag once it passes [`CLICK_SLOP`].
    pub fn moved(&mut self, position: Vec2) {
        if let Some(start) = self.pressed_at
            && start.distance(position) > CLICK_SLOP
        {
            self.dragged = true;
        }
        self.position = Some(position);
    }

    /// Whether a left release completes a click.
    pub fn release(&mut self) -> bool {
        let click = self.pressed_at.take().is_some() && !self.dragged;
        self.dragged = false;
        click
    }

    fn left(&mut self) {
        self.position = None;
        self.pressed_at = None;
        self.dragged = false;
    }
}

/// Forward cursor movement, leave and click from the primary window.
#[allow(clippy::too_many_arguments, clippy::needless_pass_by_value)]
pub fn bridge_window_pointer(
    mut moved: MessageReader<CursorMoved>,
    mut left: MessageReader<CursorLeft>,
    buttons: Res<ButtonInput<MouseButton>>,
    gate: Res<GlobeInputGate>,
    scene: Res<GlobeScene>,
    primary: Query<Entity, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform)>,
    mut tracker: Local<CursorTracker>,
    mut pointer: MessageWriter<GlobePointer>,
) {
    let Ok(primary) = primary.single() else {
        return;
    };

    if gate.blocked {
        moved.clear();
        left.clear();
        if !tracker.blocked {
            tracker.blocked = true;
            tracker.left();
            pointer.write(GlobePointer::Leave);
        }
        return;
    }
    tracker.blocked = false;

    let camera = scene.camera.and_then(|entity| cameras.get(entity).ok());
    for event in moved.read().filter(|event| event.window == primary) {
        tracker.moved(event.position);
        let Some((camera, transform)) = camera else {
            continue;
        };
        match camera.viewport_to_world(transform, event.position) {
            Ok(ray) => {
                pointer.write(GlobePointer::Move { ray });
            }
            Err(err) => tracing::trace!("No pointer ray: {err}"),
        }
    }

    if left.read().any(|event| event.window == primary) {
        tracker.left();
        pointer.write(GlobePointer::Leave);
    }

    if buttons.just_pressed(MouseButton::Left) {
        tracker.press();
    }
    if buttons.just_released(MouseButton::Left) && tracker.release() {
        pointer.write(GlobePointer::Click);
    }
}

#[cfg(test)]
mod tests {
    use bevy::camera::RenderTargetInfo;

    use super::*;
    use crate::test_app;

    /// Pointer messages seen after the bridge ran.
    #[derive(Resource, Default)]
    struct Forwarded(Vec<GlobePointer>);

    fn collect_pointer(mut pointer: MessageReader<GlobePointer>, mut forwarded: ResMut<Forwarded>) {
        forwarded.0.extend(pointer.read().copied());
    }

    fn bridge_app() -> (App, Entity) {
        let mut app = test_app();
        app.add_message::<CursorMoved>()
            .add_message::<CursorLeft>()
            .init_resource::<ButtonInput<MouseButton>>()
            .init_resource::<Forwarded>()
            .add_systems(
                Update,
                (bridge_window_pointer, collect_pointer)
                    .chain()
                    .in_set(crate::GlobeSystems::Window),
            );
        let window = app.world_mut().spawn((Window::default(), PrimaryWindow)).id();
        (app, window)
    }

    /// Camera at +Z looking at the origin with an 800x600 viewport.
    fn spawn_camera(app: &mut App) {
        let mut camera = Camera::default();
        camera.computed.target_info = Some(RenderTargetInfo {
            physical_size: UVec2::new(800, 600),
            scale_factor: 1.0,
        });
        camera.computed.clip_from_view =
            Mat4::perspective_infinite_reverse_rh(std::f32::consts::FRAC_PI_4, 800.0 / 600.0, 0.01);
        let transform = Transform::from_xyz(0.0, 0.0, 3.0).looking_at(Vec3::ZERO, Vec3::Y);
        let entity = app
            .world_mut()
            .spawn((camera, transform, GlobalTransform::from(transform)))
            .id();
        app.world_mut().resource_mut::<GlobeScene>().camera = Some(entity);
    }

    fn move_to(app: &mut App, window: Entity, position: Vec2) {
        app.world_mut().write_message(CursorMoved {
            window,
            position,
            delta: None,
        });
    }

    fn frame(app: &mut App) -> Vec<GlobePointer> {
        app.update();
        app.world_mut()
            .resource_mut::<ButtonInput<MouseButton>>()
            .clear();
        std::mem::take(&mut app.world_mut().resource_mut::<Forwarded>().0)
    }

    #[test]
    fn test_move_becomes_camera_ray() {
        let (mut app, window) = bridge_app();
        spawn_camera(&mut app);
        move_to(&mut app, window, Vec2::new(400.0, 300.0));

        let forwarded = frame(&mut app);
        let [GlobePointer::Move { ray }] = forwarded[..] else {
            panic!("expected one move, got {forwarded:?}");
        };
        assert!(ray.direction.dot(Vec3::NEG_Z) > 0.999);
    }

    #[test]
    fn test_blocked_gate_leaves_once_and_swallows_moves() {
        let (mut app, window) = bridge_app();
        spawn_camera(&mut app);
        app.world_mut().resource_mut::<GlobeInputGate>().blocked = true;

        move_to(&mut app, window, Vec2::new(400.0, 300.0));
        assert_eq!(frame(&mut app), [GlobePointer::Leave]);
        move_to(&mut app, window, Vec2::new(410.0, 300.0));
        assert!(frame(&mut app).is_empty());

        app.world_mut().resource_mut::<GlobeInputGate>().blocked = false;
        move_to(&mut app, window, Vec2::new(420.0, 300.0));
        assert!(matches!(frame(&mut app)[..], [GlobePointer::Move { .. }]));
    }

    #[test]
    fn test_cursor_left_forwards_leave() {
        let (mut app, window) = bridge_app();
        app.world_mut().write_message(CursorLeft { window });
        assert_eq!(frame(&mut app), [GlobePointer::Leave]);
    }

    #[test]
    fn test_other_window_ignored() {
        let (mut app, _) = bridge_app();
        let other = app.world_mut().spawn(Window::default()).id();
        app.world_mut().write_message(CursorLeft { window: other });
        assert!(frame(&mut app).is_empty());
    }

    #[test]
    fn test_still_press_release_clicks_once() {
        let (mut app, window) = bridge_app();
        move_to(&mut app, window, Vec2::new(100.0, 100.0));
        frame(&mut app);

        app.world_mut()
            .resource_mut::<ButtonInput<MouseButton>>()
            .press(MouseButton::Left);
        assert!(frame(&mut app).is_empty());
        app.world_mut()
            .resource_mut::<ButtonInput<MouseButton>>()
            .release(MouseButton::Left);
        assert_eq!(frame(&mut app), [GlobePointer::Click]);
        assert!(frame(&mut app).is_empty());
    }

    #[test]
    fn test_drag_release_does_not_click() {
        let (mut app, window) = bridge_app();
        move_to(&mut app, window, Vec2::new(100.0, 100.0));
        frame(&mut app);

        app.world_mut()
            .resource_mut::<ButtonInput<MouseButton>>()
            .press(MouseButton::Left);
        frame(&mut app);
        move_to(&mut app, window, Vec2::new(160.0, 100.0));
        frame(&mut app);
        app.world_mut()
            .resource_mut::<ButtonInput<MouseButton>>()
            .release(MouseButton::Left);
        assert!(frame(&mut app).is_empty());
    }

    #[test]
    fn test_still_release_is_click() {
        let mut tracker = CursorTracker::default();
        tracker.moved(Vec2::new(100.0, 100.0));
        tracker.press();
        tracker.moved(Vec2::new(102.0, 101.0));
        assert!(tracker.release());
    }

    #[test]
    fn test_drag_is_not_click() {
        let mut tracker = CursorTracker::default();
        tracker.moved(Vec2::new(100.0, 100.0));
        tracker.press();
        tracker.moved(Vec2::new(140.0, 100.0));
        tracker.moved(Vec2::new(100.0, 100.0));
        assert!(!tracker.release());
    }

    #[test]
    fn test_release_without_press_or_position() {
        let mut tracker = CursorTracker::default();
        assert!(!tracker.release());
        tracker.press();
        assert!(!tracker.release());
    }
}
