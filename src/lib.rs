//! Sectorflow: animated sector bubble chart with a temporal force layout.
//! Library for testing and reuse.

pub mod core;
pub mod io;
pub mod layout;
pub mod render;
pub mod ui;

use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::{input::egui_wants_any_keyboard_input, EguiPlugin};
use std::path::PathBuf;

use crate::core::config::SectorflowConfig;
use crate::core::model::Timeline;
use crate::core::playback::{playback_command_system, playback_tick_system, PlaybackCommand, PlaybackScheduler};
use crate::core::resources::{status_message_tick_system, ActiveDataset, BakedLayout, CanvasSize, StatusMessage};
use crate::io::dataset::{
    load_timeline, parse_timeline, process_dataset_requests_system, process_pending_file_dialog_system,
    LoadDataset, PendingFileDialog,
};
use crate::layout::rebake_layout_system;
use crate::render::bubbles::{bubble_transition_system, draw_bubbles_system, BubbleAnimation};
use crate::render::guides::draw_guides_system;
use crate::ui::timeline::{playback_keys_system, ui_timeline_bar_system};

/// Command-line options.
#[derive(Debug, Default, PartialEq)]
pub struct CliArgs {
    pub dataset: Option<PathBuf>,
    pub bake: Option<PathBuf>,
}

pub fn parse_args(args: impl IntoIterator<Item = String>) -> CliArgs {
    let mut out = CliArgs::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        if arg == "--dataset" {
            out.dataset = args.next().map(PathBuf::from);
        } else if arg == "--bake" {
            out.bake = args.next().map(PathBuf::from);
        }
    }
    out
}

/// Pick the timeline: `--dataset`, then piped stdin, then the built-in sample.
fn initial_timeline(cli: &CliArgs, config: &SectorflowConfig) -> Result<(Timeline, String), String> {
    use std::io::{IsTerminal, Read};

    if let Some(path) = &cli.dataset {
        let timeline = load_timeline(path, config).map_err(|e| format!("{}: {}", path.display(), e))?;
        return Ok((timeline, path.display().to_string()));
    }

    if !std::io::stdin().is_terminal() {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|e| format!("stdin: {}", e))?;
        if let Some(timeline) = parse_piped(&buf, config)? {
            return Ok((timeline, "stdin".to_string()));
        }
    }

    Ok((crate::io::demo::sample_timeline(&config.category_set()), "sample".to_string()))
}

/// Parse piped input. Blank input means nothing was piped.
fn parse_piped(input: &str, config: &SectorflowConfig) -> Result<Option<Timeline>, String> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(None);
    }
    parse_timeline(input, &config.category_set())
        .map(Some)
        .map_err(|e| format!("stdin: {}", e))
}

/// Build and run the Sectorflow app.
pub fn run() {
    let app_config = crate::core::config::load_config();
    let cli = parse_args(std::env::args().skip(1));

    let (timeline, source) = match initial_timeline(&cli, &app_config) {
        Ok(found) => found,
        Err(e) => {
            eprintln!("Failed to load dataset: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(out) = &cli.bake {
        match crate::io::export::bake_to_path(&timeline, &app_config, out) {
            Ok(n) => println!("Baked {} snapshots from {} to {}", n, source, out.display()),
            Err(e) => {
                eprintln!("Failed to write {}: {}", out.display(), e);
                std::process::exit(1);
            }
        }
        return;
    }

    let scheduler = PlaybackScheduler::new(timeline.len(), app_config.playback.frame_duration());

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Sectorflow".to_string(),
                ..default()
            }),
            ..default()
        }))
        .insert_resource(ClearColor(app_config.bg_color()))
        .insert_resource(app_config.canvas())
        .insert_resource(app_config)
        .insert_resource(ActiveDataset { timeline, source })
        .insert_resource(scheduler)
        .add_plugins(EguiPlugin::default())
        .init_resource::<BakedLayout>()
        .init_resource::<BubbleAnimation>()
        .init_resource::<StatusMessage>()
        .init_resource::<PendingFileDialog>()
        .add_message::<PlaybackCommand>()
        .add_message::<LoadDataset>()
        .add_systems(Startup, (setup_canvas, setup_gizmo_line_width, autoplay_system))
        .add_systems(
            Update,
            (
                sync_canvas_size_system,
                process_pending_file_dialog_system,
                process_dataset_requests_system,
                rebake_layout_system,
                playback_keys_system.run_if(not(egui_wants_any_keyboard_input)),
                playback_command_system,
                playback_tick_system,
                bubble_transition_system,
                draw_guides_system,
                draw_bubbles_system,
                status_message_tick_system,
            )
                .chain(),
        )
        .add_systems(bevy_egui::EguiPrimaryContextPass, ui_timeline_bar_system)
        .run();
}

fn setup_gizmo_line_width(mut config_store: ResMut<GizmoConfigStore>) {
    let (config, _) = config_store.config_mut::<DefaultGizmoConfigGroup>();
    config.line.width = 2.0;
}

fn setup_canvas(mut commands: Commands) {
    commands.spawn(Camera2d);
}

fn autoplay_system(config: Res<SectorflowConfig>, mut playback: MessageWriter<PlaybackCommand>) {
    if config.playback.autoplay {
        info!("[PLAYBACK] Autoplay");
        playback.write(PlaybackCommand::Play);
    }
}

/// Track the primary window size. Only writes on an actual change so the
/// re-bake is not triggered every frame.
fn sync_canvas_size_system(windows: Query<&Window, With<PrimaryWindow>>, mut canvas: ResMut<CanvasSize>) {
    let Ok(window) = windows.single() else {
        return;
    };
    // Minimized windows report zero size.
    if window.width() < 1.0 || window.height() < 1.0 {
        return;
    }
    if canvas.differs_from(window.width(), window.height()) {
        *canvas = CanvasSize::new(window.width(), window.height());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_dataset_and_bake() {
        let cli = parse_args(args(&["--dataset", "d.json", "--bake", "out.json"]));
        assert_eq!(cli.dataset, Some(PathBuf::from("d.json")));
        assert_eq!(cli.bake, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn ignores_unknown_and_dangling_flags() {
        let cli = parse_args(args(&["--verbose", "--bake"]));
        assert_eq!(cli, CliArgs::default());
    }

    #[test]
    fn piped_input_is_parsed_or_reported() {
        let config = SectorflowConfig::default();
        assert_eq!(parse_piped("  \n", &config), Ok(None));

        let err = parse_piped("{ not json", &config).unwrap_err();
        assert!(err.starts_with("stdin: "), "{err}");

        let json = r#"{ "snapshots": [ { "entities": [
            { "id": "XOM", "category": "Energy", "value": 1, "magnitude": 1 }
        ] } ] }"#;
        let timeline = parse_piped(json, &config).unwrap().unwrap();
        assert_eq!(timeline.len(), 1);
    }
}
