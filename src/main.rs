mod domain;
mod infrastructure;
mod presentation;

use domain::models::{AppEvent, MessageSeverity, StatusMessage};
use domain::session::SessionStore;
use domain::settings::SettingsService;
use eframe::egui;
use infrastructure::bluetooth::orchestrator::OrchestratorConfig;
use infrastructure::bluetooth::BluetoothService;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

fn main() -> anyhow::Result<()> {
    let settings_service = SettingsService::new()?;
    let settings = settings_service.get().clone();

    let logging_guard = infrastructure::logging::init_logger(&settings.log_settings)
        .map_err(|e| eprintln!("Failed to initialize logging: {}", e))
        .ok();

    info!("Starting Dual Tilt Monitor");

    // Write the effective settings back so the file exists for editing.
    if let Err(e) = settings_service.save() {
        warn!("Could not save settings: {}", e);
    }

    let store = Arc::new(SessionStore::new(settings.identities()));
    let (event_tx, event_rx) = mpsc::unbounded_channel();

    let bluetooth = match OrchestratorConfig::from_settings(&settings)
        .and_then(|config| BluetoothService::spawn(config, store.clone(), event_tx.clone()))
    {
        Ok(service) => Some(service),
        Err(e) => {
            error!("Bluetooth disabled: {:#}", e);
            let _ = event_tx.send(AppEvent::LogMessage(StatusMessage {
                message: format!("Bluetooth disabled: {}", e),
                severity: MessageSeverity::Warning,
            }));
            None
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([640.0, 640.0])
            .with_title("Dual Tilt Monitor"),
        ..Default::default()
    };

    let sensors = settings.sensors.clone();
    eframe::run_native(
        "Dual Tilt Monitor",
        options,
        Box::new(move |_cc| {
            Ok(Box::new(presentation::app::TiltApp::new(
                sensors,
                store,
                event_rx,
                bluetooth,
                logging_guard,
            )))
        }),
    )
    .map_err(|e| anyhow::anyhow!("GUI error: {}", e))
}
