//! Event detail panel, hover tooltip and debug overlay.

use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::prelude::*;
use bevy_egui::{EguiContexts, EguiPlugin, EguiPrimaryContextPass, egui};
use lumen_globe::{
    EventRecord, GlobeEvent, GlobeEventKind, GlobeFrameStats, GlobeInputGate, GlobeLifecycle,
    GlobeListeners, GlobeMarkers, GlobeSystems, LifecycleRequests, MarkerRegistry,
};

use crate::records::RecordReload;

/// Plugin for the viewer overlay.
pub struct ViewerUiPlugin;

impl Plugin for ViewerUiPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(EguiPlugin::default())
            .add_plugins(FrameTimeDiagnosticsPlugin::default())
            .init_resource::<EventFocus>()
            .add_systems(Startup, register_logging_listeners)
            .add_systems(
                Update,
                (
                    track_globe_events,
                    drop_removed_focus.run_if(resource_changed::<MarkerRegistry>),
                )
                    .chain()
                    .after(GlobeSystems::Input),
            )
            .add_systems(
                EguiPrimaryContextPass,
                (event_panels_system, debug_ui_system, update_input_gate).chain(),
            );
    }
}

/// Records the overlay is showing.
#[derive(Resource, Debug, Default)]
pub struct EventFocus {
    /// Opened by the last click.
    pub selected: Option<EventRecord>,
    /// Under the pointer right now.
    pub hovered: Option<EventRecord>,
}

impl EventFocus {
    fn apply(&mut self, event: &GlobeEvent) {
        match event.kind {
            GlobeEventKind::MarkerHover => self.hovered = Some(event.record.clone()),
            GlobeEventKind::MarkerLeave => {
                if self
                    .hovered
                    .as_ref()
                    .is_some_and(|hovered| hovered.id == event.record.id)
                {
                    self.hovered = None;
                }
            }
            GlobeEventKind::MarkerClick => self.selected = Some(event.record.clone()),
        }
    }

    /// Forget a hovered record whose marker is gone. Removal does not emit a leave.
    fn drop_removed(&mut self, registry: &MarkerRegistry) {
        if self
            .hovered
            .as_ref()
            .is_some_and(|hovered| !registry.contains(&hovered.id))
        {
            self.hovered = None;
        }
    }
}

fn register_logging_listeners(mut listeners: ResMut<GlobeListeners>) {
    for kind in [
        GlobeEventKind::MarkerHover,
        GlobeEventKind::MarkerLeave,
        GlobeEventKind::MarkerClick,
    ] {
        listeners.add_listener(kind, move |record| {
            tracing::debug!(%kind, id = %record.id, title = %record.title, "Globe event");
        });
    }
}

fn track_globe_events(mut events: MessageReader<GlobeEvent>, mut focus: ResMut<EventFocus>) {
    for event in events.read() {
        focus.apply(event);
    }
}

#[allow(clippy::needless_pass_by_value)]
fn drop_removed_focus(registry: Res<MarkerRegistry>, mut focus: ResMut<EventFocus>) {
    focus.drop_removed(&registry);
}

/// Keep globe input off while egui owns the pointer.
fn update_input_gate(mut contexts: EguiContexts, mut gate: ResMut<GlobeInputGate>) -> Result {
    let ctx = contexts.ctx_mut()?;
    let blocked = ctx.is_pointer_over_area() || ctx.is_using_pointer();
    if gate.blocked != blocked {
        gate.blocked = blocked;
    }
    Ok(())
}

fn event_details(ui: &mut egui::Ui, record: &EventRecord) {
    ui.heading(if record.title.is_empty() {
        record.id.as_str()
    } else {
        record.title.as_str()
    });
    if let Some(country) = &record.country {
        ui.label(egui::RichText::new(country.as_str()).strong());
    }
    if !record.description.is_empty() {
        ui.label(record.description.as_str());
    }
    ui.separator();
    ui.label(format!("Priority: {}", record.priority));
    if let Some(published_at) = &record.published_at {
        ui.label(format!("Published: {published_at}"));
    }
    if let Some(source) = &record.source {
        ui.label(format!("Source: {source}"));
    }
    if let Some(url) = &record.url {
        ui.hyperlink(url);
    }
}

/// Render the hover tooltip and the detail window.
fn event_panels_system(mut contexts: EguiContexts, mut focus: ResMut<EventFocus>) -> Result {
    let ctx = contexts.ctx_mut()?;

    if let Some(hovered) = &focus.hovered
        && let Some(pointer) = ctx.pointer_hover_pos()
    {
        egui::Area::new(egui::Id::new("marker_tooltip"))
            .fixed_pos(pointer + egui::vec2(16.0, 16.0))
            .interactable(false)
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.label(egui::RichText::new(hovered.title.as_str()).strong());
                    if let Some(country) = &hovered.country {
                        ui.label(country.as_str());
                    }
                });
            });
    }

    let mut open = focus.selected.is_some();
    if let Some(selected) = &focus.selected {
        egui::Window::new("Event")
            .open(&mut open)
            .anchor(egui::Align2::RIGHT_TOP, [-10.0, 10.0])
            .default_width(320.0)
            .show(ctx, |ui| event_details(ui, selected));
    }
    if !open {
        focus.selected = None;
    }

    Ok(())
}

/// Render the debug overlay.
#[allow(clippy::needless_pass_by_value)]
fn debug_ui_system(
    mut contexts: EguiContexts,
    diagnostics: Res<DiagnosticsStore>,
    stats: Res<GlobeFrameStats>,
    mut requests: ResMut<LifecycleRequests>,
    mut reload: ResMut<RecordReload>,
    mut markers: GlobeMarkers,
    lifecycle: Res<GlobeLifecycle>,
) -> Result {
    let ctx = contexts.ctx_mut()?;

    let fps = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(bevy::diagnostic::Diagnostic::smoothed)
        .unwrap_or(0.0);

    egui::Window::new("Globe")
        .default_pos([10.0, 10.0])
        .show(ctx, |ui| {
            ui.label(format!("FPS: {fps:.0}"));
            ui.label(format!("Markers: {}", markers.marker_count()));
            ui.label(format!("Frames: {}", stats.frames));
            ui.label(format!("State: {:?}", lifecycle.state()));
            ui.separator();

            ui.add_enabled_ui(!lifecycle.is_disposed(), |ui| {
                ui.horizontal(|ui| {
                    if lifecycle.is_running() {
                        if ui.button("Pause").clicked() {
                            requests.request_pause();
                        }
                    } else if ui.button("Resume").clicked() {
                        requests.request_resume();
                    }
                    if ui.button("Dispose").clicked() {
                        requests.request_dispose();
                    }
                });
                ui.horizontal(|ui| {
                    if ui.button("Clear markers").clicked() {
                        markers.clear_event_markers();
                    }
                    if ui.button("Reload records").clicked() {
                        reload.requested = true;
                    }
                });
            });

            ui.separator();
            ui.label("Controls:");
            ui.label("  Left drag - Orbit");
            ui.label("  Right drag - Pan");
            ui.label("  Wheel - Zoom");
            ui.label("  Click marker - Details");
        });

    Ok(())
}
