//! Desktop and web viewer for the Lumen prayer-light globe.
//!
//! Shows the globe with event markers loaded from a JSON file. Clicking a
//! marker opens its details; the debug panel drives the globe lifecycle.

mod launch_params;
mod records;
mod ui;

use bevy::prelude::*;
use lumen_globe::GlobePlugin;
use records::RecordsPlugin;
use ui::ViewerUiPlugin;

fn main() {
    // Initialize tracing for native platforms.
    #[cfg(not(target_family = "wasm"))]
    {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer())
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    // Initialize tracing for WASM (logs to browser console).
    #[cfg(target_family = "wasm")]
    {
        console_error_panic_hook::set_once();
        tracing_wasm::set_as_global_default();
    }

    let params = launch_params::parse();
    let globe = match GlobePlugin::new(params.globe_config()) {
        Ok(globe) => globe,
        Err(err) => {
            tracing::error!("Invalid globe configuration: {err}");
            return;
        }
    };

    let mut app = App::new();

    #[allow(unused_mut)]
    let mut window = Window {
        title: "lumen-viewer".to_string(),
        resolution: (1280, 720).into(),
        position: WindowPosition::Centered(MonitorSelection::Primary),
        ..Default::default()
    };

    // WASM: Fit canvas to parent element and prevent browser event handling.
    #[cfg(target_family = "wasm")]
    {
        window.fit_canvas_to_parent = true;
        window.prevent_default_event_handling = true;
    }

    app.add_plugins(DefaultPlugins.set(WindowPlugin {
        primary_window: Some(window),
        ..Default::default()
    }));

    app.insert_resource(params)
        .add_plugins((globe, RecordsPlugin, ViewerUiPlugin))
        .run();
}
