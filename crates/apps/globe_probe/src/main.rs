//! Headless driver for the globe: runs the overlay registry against synthetic
//! feeds while a scripted pointer exercises hover, click and drag, then prints
//! a JSON summary of what happened.

mod config;
mod feeds;
mod pointer;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use foundation::math::{GLOBE_RADIUS, GeoPoint, Vec3};
use interaction::{
    GlobeInteraction, InteractionEvent, PointerInput, PointerSample, SurfaceIndicator,
};
use layers::{InstanceRecord, OverlayEvent, OverlayRegistry, VisualizationMode};
use scene::{Camera, GlobeSurface, HitTestPipeline, MemoryScene, Subtree, Viewport};
use serde::Serialize;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{ProbeConfig, parse_mode};
use crate::pointer::PointerScript;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless globe interaction and overlay probe")]
struct Args {
    /// JSON config file; missing fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Visualization mode (geo_political, cyber_command, eco_natural)
    #[arg(long)]
    mode: Option<String>,

    /// Switch to this mode halfway through the run
    #[arg(long)]
    switch_to: Option<String>,

    #[arg(long)]
    duration_ms: Option<u64>,

    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Debug, Default, Serialize)]
struct Summary {
    mode: String,
    overlays_added: usize,
    overlays_removed: usize,
    data_updates: usize,
    unchanged_updates: usize,
    data_errors: usize,
    model_clicks: usize,
    surface_clicks: usize,
    drags: usize,
    hover_changes: usize,
    live_overlays: Vec<String>,
    live_overlay_objects: usize,
    leaked_objects: usize,
}

impl Summary {
    fn record_overlay(&mut self, event: &OverlayEvent) {
        match event {
            OverlayEvent::Added(_) => self.overlays_added += 1,
            OverlayEvent::Removed(_) => self.overlays_removed += 1,
            OverlayEvent::DataLoading(name) => debug!(overlay = %name, "loading"),
            OverlayEvent::DataUpdated { unchanged: true, .. } => self.unchanged_updates += 1,
            OverlayEvent::DataUpdated { .. } => self.data_updates += 1,
            OverlayEvent::DataError { name, message } => {
                warn!(overlay = %name, error = %message, "overlay refresh failed");
                self.data_errors += 1;
            }
        }
    }

    fn record_interaction(&mut self, event: &InteractionEvent, registry: &OverlayRegistry) {
        match event {
            InteractionEvent::Click { object: Some(id), .. } => {
                self.model_clicks += 1;
                match registry.find_instance(id).map(|i| &i.record) {
                    Some(InstanceRecord::Threat(threat)) => {
                        info!(
                            id = %id.as_str(),
                            severity = threat.severity.as_str(),
                            "threat selected"
                        )
                    }
                    Some(InstanceRecord::Marker(marker)) => {
                        info!(id = %id.as_str(), label = %marker.label, "marker selected")
                    }
                    None => debug!(id = %id.as_str(), "clicked model no longer live"),
                }
            }
            InteractionEvent::Click { surface: Some(geo), .. } => {
                self.surface_clicks += 1;
                debug!(lat = geo.lat_deg, lng = geo.lng_deg, "surface click");
            }
            InteractionEvent::DragStarted => self.drags += 1,
            InteractionEvent::HoverChanged(_) => self.hover_changes += 1,
            _ => {}
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => ProbeConfig::load(path)?,
        None => ProbeConfig::default(),
    };
    config.apply_env();
    if let Some(mode) = &args.mode {
        config.mode = parse_mode(mode).ok_or_else(|| format!("unknown mode {mode:?}"))?;
    }
    if let Some(duration_ms) = args.duration_ms {
        config.duration_ms = duration_ms;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    let switch_to = match &args.switch_to {
        Some(mode) => Some(parse_mode(mode).ok_or_else(|| format!("unknown mode {mode:?}"))?),
        None => None,
    };

    info!(
        mode = config.mode.as_str(),
        duration_ms = config.duration_ms,
        seed = config.seed,
        "globe probe starting"
    );
    let summary = run(&config, switch_to).await;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

async fn run(config: &ProbeConfig, switch_to: Option<VisualizationMode>) -> Summary {
    let tick_ms = config.tick_ms.max(1);
    let viewport = Viewport::new(config.viewport_width, config.viewport_height);
    let camera = Camera::orbiting(
        GeoPoint::new(20.0, 10.0),
        config.camera_distance,
        0.8,
        viewport.aspect(),
    );

    let mut scene = MemoryScene::new(camera);
    let mut registry = OverlayRegistry::new();
    feeds::register_all(&mut registry, config);
    registry.set_mode(&mut scene, config.mode);

    let mut picker = HitTestPipeline::new(camera, viewport).with_globe(GlobeSurface {
        center: Vec3::ZERO,
        radius: GLOBE_RADIUS,
    });
    let mut globe = GlobeInteraction::new(config.interaction);
    let mut indicator = SurfaceIndicator::new(GLOBE_RADIUS);
    let mut script = PointerScript::new(viewport, config.seed);
    let mut summary = Summary::default();

    let ticks = config.duration_ms / tick_ms;
    let mut ticker = tokio::time::interval(Duration::from_millis(tick_ms));
    for tick in 0..ticks {
        ticker.tick().await;
        let now_ms = tick * tick_ms;

        let mut dirty = false;
        if let Some(mode) = switch_to.filter(|_| tick == ticks / 2) {
            let change = registry.set_mode(&mut scene, mode);
            info!(removed = ?change.removed, added = ?change.added, "mode switched");
            dirty = true;
        }
        dirty |= registry.pump(&mut scene) > 0;
        if dirty {
            registry.update_screen_positions(&camera, viewport);
            picker.clear_groups();
            picker.push_group(registry.pick_group());
            globe.pick_targets_changed();
        }

        for input in script.due(now_ms) {
            globe.handle(input, &picker);
        }
        indicator.update(&mut scene, globe.globe_hover());

        for event in registry.drain_events() {
            summary.record_overlay(&event);
        }
        for event in globe.drain_events() {
            summary.record_interaction(&event, &registry);
        }
    }

    let end = PointerSample::new(0.0, 0.0, ticks * tick_ms);
    globe.handle(PointerInput::Leave(end), &picker);
    indicator.update(&mut scene, globe.globe_hover());

    summary.mode = registry
        .mode()
        .unwrap_or(config.mode)
        .as_str()
        .to_string();
    summary.live_overlays = registry.get_overlays().to_vec();
    summary.live_overlay_objects = scene.live_in(Subtree::Overlays).len();

    registry.clear(&mut scene);
    indicator.clear(&mut scene);
    for event in registry.drain_events() {
        summary.record_overlay(&event);
    }
    summary.leaked_objects = scene.live_count();
    summary
}
