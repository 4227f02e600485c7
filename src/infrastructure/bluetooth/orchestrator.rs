//! Connection Orchestrator
//!
//! Runs one shared scan, then drives every configured sensor through
//! connect, service discovery and subscription on its own task. Each
//! pipeline fails on its own; a dead sensor never holds up the other.

use crate::domain::clamp::ClampPolicy;
use crate::domain::error::PipelineError;
use crate::domain::models::{
    AppEvent, MessageSeverity, PipelineState, RawNotification, SensorIdentity, StatusMessage,
};
use crate::domain::session::SessionStore;
use crate::domain::settings::Settings;
use crate::infrastructure::bluetooth::protocol;
use crate::infrastructure::bluetooth::transport::{AdapterOptions, BleTransport, ScanRequest};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

/// Everything the orchestrator needs to know about the sensors
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub identities: Vec<SensorIdentity>,
    pub service_uuid: Uuid,
    pub notify_char_uuid: Uuid,
    pub scan_duration: Duration,
    /// Extra wait after the scan window before the scan is stopped
    pub scan_stop_margin: Duration,
    pub clamp: ClampPolicy,
    pub adapter: AdapterOptions,
    pub log_raw_frames: bool,
}

impl OrchestratorConfig {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        Ok(Self {
            identities: settings.identities(),
            service_uuid: protocol::parse_uuid(&settings.ble_service_uuid)?,
            notify_char_uuid: protocol::parse_uuid(&settings.ble_notify_char_uuid)?,
            scan_duration: settings.scan_duration(),
            scan_stop_margin: settings.scan_stop_margin(),
            clamp: settings.clamp,
            adapter: AdapterOptions::default(),
            log_raw_frames: settings.debug_raw_data_logging,
        })
    }
}

/// State shared by every pipeline task
struct Shared {
    transport: Arc<dyn BleTransport>,
    store: Arc<SessionStore>,
    config: OrchestratorConfig,
    event_sender: mpsc::UnboundedSender<AppEvent>,
}

impl Shared {
    fn set_state(&self, identity: &SensorIdentity, state: PipelineState) {
        debug!(sensor = %identity, "Pipeline state -> {}", state);
        let _ = self
            .event_sender
            .send(AppEvent::PipelineState(identity.clone(), state));
    }

    fn send_log(&self, message: String, severity: MessageSeverity) {
        let _ = self
            .event_sender
            .send(AppEvent::LogMessage(StatusMessage { message, severity }));
    }
}

pub struct ConnectionOrchestrator {
    shared: Arc<Shared>,
}

impl ConnectionOrchestrator {
    pub fn new(
        transport: Arc<dyn BleTransport>,
        store: Arc<SessionStore>,
        config: OrchestratorConfig,
        event_sender: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                transport,
                store,
                config,
                event_sender,
            }),
        }
    }

    /// Scan, then connect and stream every configured sensor.
    ///
    /// Returns once every pipeline has stopped, with the reason each one
    /// stopped for.
    pub async fn run(&self) -> Vec<(SensorIdentity, PipelineError)> {
        let (scan_done_tx, scan_done_rx) = watch::channel(false);

        let mut handles = Vec::new();
        for identity in &self.shared.config.identities {
            let shared = self.shared.clone();
            let identity = identity.clone();
            let scan_done = scan_done_rx.clone();
            handles.push(tokio::spawn(async move {
                let err = run_pipeline(&shared, &identity, scan_done).await;
                error!(sensor = %identity, "Pipeline stopped: {}", err);
                shared.set_state(&identity, PipelineState::Failed);
                shared.send_log(format!("{}: {}", identity, err), MessageSeverity::Error);
                (identity, err)
            }));
        }
        drop(scan_done_rx);

        match self.scan().await {
            Ok(()) => {
                let _ = scan_done_tx.send(true);
            }
            Err(e) => {
                error!("Scan failed: {}", e);
                self.shared
                    .send_log(format!("Scan failed: {}", e), MessageSeverity::Error);
                // Dropping the sender fails every waiting pipeline.
                drop(scan_done_tx);
            }
        }

        let mut outcomes = Vec::new();
        for handle in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => error!("Pipeline task aborted: {}", e),
            }
        }
        outcomes
    }

    /// Shared scan phase. Returns after the scan has been stopped.
    async fn scan(&self) -> anyhow::Result<()> {
        let shared = &self.shared;
        let config = &shared.config;

        for identity in &config.identities {
            shared.set_state(identity, PipelineState::Scanning);
        }

        shared.transport.start_adapter(&config.adapter).await?;
        info!("Bluetooth adapter started");

        let request = ScanRequest {
            service_filters: Vec::new(),
            duration: config.scan_duration,
            allow_duplicates: true,
        };
        info!("Scanning for {:?}", config.scan_duration);
        shared.send_log("Scanning for sensors...".to_string(), MessageSeverity::Info);
        shared.transport.scan(&request).await?;

        tokio::time::sleep(config.scan_duration + config.scan_stop_margin).await;

        shared.transport.stop_scan().await?;
        info!("Scan stopped, connecting");
        Ok(())
    }
}

/// Drive one sensor until something breaks. Only returns on failure.
async fn run_pipeline(
    shared: &Shared,
    identity: &SensorIdentity,
    mut scan_done: watch::Receiver<bool>,
) -> PipelineError {
    match connect_and_stream(shared, identity, &mut scan_done).await {
        Ok(()) => PipelineError::transport(PipelineState::Streaming, "notification stream closed"),
        Err(e) => e,
    }
}

async fn connect_and_stream(
    shared: &Shared,
    identity: &SensorIdentity,
    scan_done: &mut watch::Receiver<bool>,
) -> Result<(), PipelineError> {
    let transport = &shared.transport;
    let config = &shared.config;

    scan_done
        .wait_for(|done| *done)
        .await
        .map_err(|_| PipelineError::transport(PipelineState::Scanning, "scan did not complete"))?;

    shared.set_state(identity, PipelineState::Connecting);
    info!(sensor = %identity, "Connecting");
    transport
        .connect(identity)
        .await
        .map_err(|e| PipelineError::transport(PipelineState::Connecting, e))?;

    shared.set_state(identity, PipelineState::DiscoveringServices);
    transport
        .discover_services(identity)
        .await
        .map_err(|e| PipelineError::transport(PipelineState::DiscoveringServices, e))?;

    shared.set_state(identity, PipelineState::Subscribing);
    let mut notifications = transport
        .subscribe_notifications(identity, config.service_uuid, config.notify_char_uuid)
        .await
        .map_err(|e| PipelineError::transport(PipelineState::Subscribing, e))?;

    shared.set_state(identity, PipelineState::Streaming);
    info!(sensor = %identity, "Streaming");
    shared.send_log(format!("{} connected", identity), MessageSeverity::Success);

    while let Some(notification) = notifications.recv().await {
        if notification.characteristic_uuid != config.notify_char_uuid {
            trace!(
                sensor = %identity,
                "Ignoring notification from {}",
                notification.characteristic_uuid
            );
            continue;
        }

        if config.log_raw_frames {
            debug!(sensor = %notification.identity, "Frame: {:02X?}", notification.payload);
        }

        match ingest_notification(&shared.store, &config.clamp, &notification) {
            Ok(()) => {}
            Err(PipelineError::InsufficientData { len, .. }) => {
                debug!(sensor = %notification.identity, "Dropping short frame ({} bytes)", len);
            }
            Err(e) => warn!("Dropping notification: {}", e),
        }
    }

    Ok(())
}

/// Decode a notification and store it in the slot of the sensor it is
/// tagged with. Nothing is stored on error.
pub fn ingest_notification(
    store: &SessionStore,
    policy: &ClampPolicy,
    notification: &RawNotification,
) -> Result<(), PipelineError> {
    if !store.is_tracked(&notification.identity) {
        return Err(PipelineError::UnknownIdentity(notification.identity.clone()));
    }
    let reading = protocol::decode(&notification.payload, policy)?;
    store.record_reading(&notification.identity, reading)
}
