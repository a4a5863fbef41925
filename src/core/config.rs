use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::core::model::CategorySet;
use crate::core::playback::PlaybackParams;
use crate::core::resources::CanvasSize;
use crate::core::scales::ScaleParams;
use crate::layout::LayoutParams;

/// Application configuration loaded from `~/.sectorflowrc`.
#[derive(Debug, Clone, Serialize, Deserialize, Resource)]
pub struct SectorflowConfig {
    /// Background color of the canvas in hex format (e.g., "#1e1e2e").
    #[serde(default = "default_background_color")]
    pub background_color: String,
    /// Ordered category list used when a dataset does not declare its own.
    #[serde(default = "default_categories")]
    pub categories: Vec<String>,
    /// Canvas size used for headless bakes; the viewer tracks the window instead.
    #[serde(default = "default_canvas_width")]
    pub canvas_width: f32,
    #[serde(default = "default_canvas_height")]
    pub canvas_height: f32,
    #[serde(default)]
    pub layout: LayoutParams,
    #[serde(default)]
    pub scale: ScaleParams,
    #[serde(default)]
    pub playback: PlaybackParams,
}

fn default_background_color() -> String { "#1e1e2e".to_string() }
fn default_canvas_width() -> f32 { 1280.0 }
fn default_canvas_height() -> f32 { 720.0 }

/// GICS sectors, in the order the columns are drawn.
fn default_categories() -> Vec<String> {
    [
        "Information Technology",
        "Communication Services",
        "Consumer Discretionary",
        "Consumer Staples",
        "Health Care",
        "Financials",
        "Industrials",
        "Energy",
        "Materials",
        "Utilities",
        "Real Estate",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for SectorflowConfig {
    fn default() -> Self {
        Self {
            background_color: default_background_color(), // Catppuccin Mocha Base
            categories: default_categories(),
            canvas_width: default_canvas_width(),
            canvas_height: default_canvas_height(),
            layout: LayoutParams::default(),
            scale: ScaleParams::default(),
            playback: PlaybackParams::default(),
        }
    }
}

impl SectorflowConfig {
    /// Parse the background hex string into a Bevy Color.
    pub fn bg_color(&self) -> Color {
        bevy::color::Srgba::hex(&self.background_color)
            .unwrap_or(bevy::color::Srgba::new(0.12, 0.12, 0.18, 1.0))
            .into()
    }

    pub fn category_set(&self) -> CategorySet {
        CategorySet::new(self.categories.iter().cloned())
    }

    pub fn canvas(&self) -> CanvasSize {
        CanvasSize::new(self.canvas_width, self.canvas_height)
    }
}

/// Attempts to load the configuration from `~/.sectorflowrc`.
/// Falls back to default if the file is missing or invalid.
pub fn load_config() -> SectorflowConfig {
    if let Ok(home) = env::var("HOME") {
        let path = PathBuf::from(home).join(".sectorflowrc");
        if let Ok(contents) = fs::read_to_string(path) {
            match toml::from_str(&contents) {
                Ok(config) => return config,
                Err(err) => {
                    eprintln!("Failed to parse ~/.sectorflowrc: {}", err);
                }
            }
        }
    }
    SectorflowConfig::default()
}
