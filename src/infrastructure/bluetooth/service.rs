//! Bluetooth Service Module
//!
//! Owns the background thread that runs the BLE stack and the connection
//! orchestrator, so the GUI thread never blocks on the radio.

use crate::domain::models::{AppEvent, MessageSeverity, StatusMessage};
use crate::domain::session::SessionStore;
use crate::infrastructure::bluetooth::btleplug_transport::BtleplugTransport;
use crate::infrastructure::bluetooth::orchestrator::{ConnectionOrchestrator, OrchestratorConfig};
use anyhow::Result;
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info};

/// Handle to the background Bluetooth thread
pub struct BluetoothService {
    shutdown: Option<oneshot::Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl BluetoothService {
    /// Start the BLE runtime and begin connecting to every configured sensor.
    pub fn spawn(
        config: OrchestratorConfig,
        store: Arc<SessionStore>,
        event_sender: mpsc::UnboundedSender<AppEvent>,
    ) -> Result<Self> {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let thread = std::thread::Builder::new()
            .name("bluetooth".to_string())
            .spawn(move || {
                let rt = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(rt) => rt,
                    Err(e) => {
                        error!("Failed to create tokio runtime for Bluetooth: {}", e);
                        let _ = event_sender.send(AppEvent::LogMessage(StatusMessage {
                            message: format!("Bluetooth unavailable: {}", e),
                            severity: MessageSeverity::Error,
                        }));
                        return;
                    }
                };

                rt.block_on(async move {
                    let transport = Arc::new(BtleplugTransport::new());
                    let orchestrator =
                        ConnectionOrchestrator::new(transport, store, config, event_sender);

                    tokio::select! {
                        outcomes = orchestrator.run() => {
                            info!("All sensor pipelines stopped ({} total)", outcomes.len());
                        }
                        _ = shutdown_rx => {
                            info!("Bluetooth service shutting down");
                        }
                    }
                });
            })?;

        Ok(Self {
            shutdown: Some(shutdown_tx),
            thread: Some(thread),
        })
    }

    /// Stop the orchestrator and wait for the thread to exit.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("Bluetooth thread panicked");
            }
        }
    }
}

impl Drop for BluetoothService {
    fn drop(&mut self) {
        self.shutdown();
    }
}
