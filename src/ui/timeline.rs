//! Timeline bar (egui bottom panel) and playback keys.

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts};

use crate::core::playback::{PlaybackCommand, PlaybackScheduler};
use crate::core::resources::{ActiveDataset, BakedLayout, StatusMessage};
use crate::io::dataset::PendingFileDialog;
use crate::render::bubbles::category_rgb;

fn color32((r, g, b): (f32, f32, f32)) -> egui::Color32 {
    egui::Color32::from_rgb((r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8)
}

/// Bottom bar: Play/Pause, scrub slider, snapshot label, open button, status.
/// A second row shows the category legend.
pub fn ui_timeline_bar_system(
    mut contexts: EguiContexts,
    scheduler: Res<PlaybackScheduler>,
    baked: Res<BakedLayout>,
    dataset: Res<ActiveDataset>,
    status: Res<StatusMessage>,
    pending_dialog: Res<PendingFileDialog>,
    mut playback: MessageWriter<PlaybackCommand>,
) {
    let Ok(ctx) = contexts.ctx_mut() else {
        return;
    };

    egui::TopBottomPanel::bottom("timeline_bar")
        .default_height(52.0)
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                let label = if scheduler.is_playing() { "Pause" } else { "Play" };
                if ui
                    .add_enabled(scheduler.snapshot_count() > 0, egui::Button::new(label))
                    .clicked()
                {
                    playback.write(PlaybackCommand::Toggle);
                }

                let last = scheduler.snapshot_count().saturating_sub(1);
                let mut index = scheduler.current_index();
                let slider = ui.add_enabled(
                    scheduler.snapshot_count() > 1,
                    egui::Slider::new(&mut index, 0..=last).show_value(false),
                );
                if slider.changed() {
                    playback.write(PlaybackCommand::Scrub(index));
                }

                let snapshot_label = baked
                    .snapshot(scheduler.current_index())
                    .map(|s| s.label.as_str())
                    .unwrap_or("—");
                ui.label(egui::RichText::new(snapshot_label).strong().monospace());
                ui.label(
                    egui::RichText::new(format!("{}/{}", scheduler.current_index() + 1, scheduler.snapshot_count().max(1)))
                        .color(egui::Color32::GRAY),
                );

                ui.separator();
                if ui.button("Open dataset…").clicked() {
                    pending_dialog.open();
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if status.is_visible() {
                        ui.label(egui::RichText::new(&status.text).color(egui::Color32::LIGHT_YELLOW));
                    } else {
                        ui.label(egui::RichText::new(&dataset.source).color(egui::Color32::DARK_GRAY));
                    }
                });
            });
            ui.horizontal_wrapped(|ui| {
                for (id, name) in dataset.timeline.categories.iter() {
                    ui.label(egui::RichText::new("●").color(color32(category_rgb(id))));
                    ui.label(egui::RichText::new(name).small());
                }
            });
        });
}

/// Space toggles playback, ←/→ step one snapshot, Home rewinds.
pub fn playback_keys_system(keys: Res<ButtonInput<KeyCode>>, mut playback: MessageWriter<PlaybackCommand>) {
    if keys.just_pressed(KeyCode::Space) {
        playback.write(PlaybackCommand::Toggle);
    }
    if keys.just_pressed(KeyCode::ArrowRight) {
        playback.write(PlaybackCommand::Step(1));
    }
    if keys.just_pressed(KeyCode::ArrowLeft) {
        playback.write(PlaybackCommand::Step(-1));
    }
    if keys.just_pressed(KeyCode::Home) {
        playback.write(PlaybackCommand::Scrub(0));
    }
}
