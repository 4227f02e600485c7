use crate::domain::models::{
    AppEvent, MessageSeverity, OrientationReading, PipelineState, SensorIdentity, StatusMessage,
};
use crate::domain::session::{RevisionReceiver, SessionSnapshot, SessionStore};
use crate::domain::settings::SensorSettings;
use crate::domain::tilt;
use crate::infrastructure::bluetooth::BluetoothService;
use crate::infrastructure::logging::LoggingGuard;
use crate::presentation::components::Components;
use eframe::egui;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const NEEDLE_LENGTH: f32 = 100.0;
const REPAINT_INTERVAL: Duration = Duration::from_millis(33);

pub struct TiltApp {
    sensors: Vec<SensorSettings>,

    // Session
    store: Arc<SessionStore>,
    revisions: RevisionReceiver,
    snapshot: SessionSnapshot,
    event_rx: mpsc::UnboundedReceiver<AppEvent>,

    // State
    pipeline_states: HashMap<SensorIdentity, PipelineState>,
    status_message: Option<StatusMessage>,

    // Dropped with the window, which stops the BLE thread
    _bluetooth: Option<BluetoothService>,
    _logging_guard: Option<LoggingGuard>,
}

impl TiltApp {
    pub fn new(
        sensors: Vec<SensorSettings>,
        store: Arc<SessionStore>,
        event_rx: mpsc::UnboundedReceiver<AppEvent>,
        bluetooth: Option<BluetoothService>,
        logging_guard: Option<LoggingGuard>,
    ) -> Self {
        let revisions = store.subscribe();
        let snapshot = store.current_state();

        Self {
            sensors,
            store,
            revisions,
            snapshot,
            event_rx,
            pipeline_states: HashMap::new(),
            status_message: None,
            _bluetooth: bluetooth,
            _logging_guard: logging_guard,
        }
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                AppEvent::PipelineState(identity, state) => {
                    self.pipeline_states.insert(identity, state);
                }
                AppEvent::LogMessage(msg) => self.status_message = Some(msg),
            }
        }
    }

    fn refresh_snapshot(&mut self) {
        if self.revisions.has_changed() {
            self.revisions.mark_seen();
            self.snapshot = self.store.current_state();
        }
    }

    fn reading(&self, identity: &SensorIdentity) -> OrientationReading {
        self.snapshot.get(identity).copied().unwrap_or_default()
    }

    fn ui_indicators(&self, ui: &mut egui::Ui) {
        let size = egui::vec2(2.0 * NEEDLE_LENGTH + 40.0, 2.0 * NEEDLE_LENGTH + 40.0);
        let (response, painter) = ui.allocate_painter(size, egui::Sense::hover());
        let origin = response.rect.center();

        for sensor in &self.sensors {
            let degrees = tilt::needle_rotation(&self.reading(&sensor.address)) as f32;
            let radians = degrees.to_radians();
            // 0° points straight up, angles grow clockwise
            let tip = origin + egui::vec2(radians.sin(), -radians.cos()) * NEEDLE_LENGTH;
            let [r, g, b] = sensor.color;
            painter.line_segment(
                [origin, tip],
                egui::Stroke::new(2.0, egui::Color32::from_rgb(r, g, b)),
            );
        }

        painter.circle_filled(origin, 10.0, egui::Color32::GREEN);
    }

    fn ui_difference(&self, ui: &mut egui::Ui) {
        if let [first, second, ..] = self.sensors.as_slice() {
            let difference =
                tilt::tilt_difference(&self.reading(&first.address), &self.reading(&second.address));
            ui.label(
                egui::RichText::new(format!("{:.1}°", difference))
                    .monospace()
                    .size(40.0),
            );
        }
    }

    fn ui_readings(&self, ui: &mut egui::Ui) {
        if self.sensors.is_empty() {
            return;
        }
        ui.columns(self.sensors.len(), |columns| {
            for (column, sensor) in columns.iter_mut().zip(&self.sensors) {
                let state = self
                    .pipeline_states
                    .get(&sensor.address)
                    .copied()
                    .unwrap_or_default();
                let [r, g, b] = sensor.color;

                Components::card(column, sensor.address.as_str(), |ui| {
                    if !sensor.label.is_empty() {
                        ui.label(&sensor.label);
                    }
                    Components::color_swatch(ui, egui::Color32::from_rgb(r, g, b));
                    ui.add_space(6.0);
                    Components::status_banner(ui, state);
                    ui.add_space(6.0);
                    Components::reading_table(ui, &self.reading(&sensor.address));
                });
            }
        });
    }

    fn ui_status(&self, ui: &mut egui::Ui) {
        if let Some(msg) = &self.status_message {
            let color = match msg.severity {
                MessageSeverity::Info => ui.visuals().text_color(),
                MessageSeverity::Success => egui::Color32::from_rgb(0, 160, 0),
                MessageSeverity::Warning => egui::Color32::from_rgb(230, 160, 0),
                MessageSeverity::Error => egui::Color32::from_rgb(255, 50, 50),
            };
            ui.label(egui::RichText::new(&msg.message).color(color));
        }
    }
}

impl eframe::App for TiltApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events();
        self.refresh_snapshot();

        egui::TopBottomPanel::bottom("status_panel").show(ctx, |ui| self.ui_status(ui));

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(20.0);
                self.ui_indicators(ui);
                self.ui_difference(ui);
                ui.add_space(30.0);
                self.ui_readings(ui);
            });
        });

        ctx.request_repaint_after(REPAINT_INTERVAL);
    }
}
