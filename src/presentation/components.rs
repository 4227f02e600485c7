use crate::domain::models::{OrientationReading, PipelineState};
use eframe::egui;

pub struct Components;

impl Components {
    pub fn card<R>(
        ui: &mut egui::Ui,
        title: &str,
        add_contents: impl FnOnce(&mut egui::Ui) -> R,
    ) -> R {
        let stroke = ui.style().visuals.widgets.noninteractive.bg_stroke;
        let bg = ui.style().visuals.widgets.noninteractive.bg_fill;

        egui::Frame::none()
            .inner_margin(egui::Margin::same(12.0))
            .stroke(stroke)
            .fill(bg)
            .show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.label(egui::RichText::new(title).monospace().strong());
                    ui.add_space(6.0);
                    add_contents(ui)
                })
                .inner
            })
            .inner
    }

    pub fn status_banner(ui: &mut egui::Ui, state: PipelineState) {
        let (bg_color, text_color) = match state {
            PipelineState::Streaming => (egui::Color32::from_rgb(0, 200, 0), egui::Color32::BLACK),
            PipelineState::Failed => (egui::Color32::from_rgb(255, 50, 50), egui::Color32::WHITE),
            PipelineState::Idle => (egui::Color32::from_gray(100), egui::Color32::WHITE),
            _ => (egui::Color32::from_rgb(255, 200, 0), egui::Color32::BLACK),
        };

        ui.add_sized(
            [ui.available_width(), 28.0],
            egui::Label::new(
                egui::RichText::new(state.label())
                    .color(text_color)
                    .background_color(bg_color)
                    .strong(),
            )
            .wrap_mode(egui::TextWrapMode::Extend),
        );
    }

    pub fn color_swatch(ui: &mut egui::Ui, color: egui::Color32) {
        let (rect, _) = ui.allocate_exact_size(egui::vec2(80.0, 2.0), egui::Sense::hover());
        ui.painter().rect_filled(rect, 0.0, color);
    }

    pub fn reading_table(ui: &mut egui::Ui, reading: &OrientationReading) {
        for line in [
            format!("X: {}", reading.x),
            format!("Y: {}", reading.y),
            format!("Z: {}", reading.z),
            format!("Roll (X): {}°", reading.roll),
            format!("Pitch (Y): {}°", reading.pitch),
            format!("Yaw (Z): {}°", reading.yaw),
        ] {
            ui.label(egui::RichText::new(line).monospace());
        }
    }
}
