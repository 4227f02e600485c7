//! BLE Transport
//!
//! The operations the orchestrator needs from a BLE stack. The production
//! implementation is [`super::btleplug_transport::BtleplugTransport`]; tests
//! drive the orchestrator through a scripted in-memory transport.

use crate::domain::models::{RawNotification, SensorIdentity};
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Options passed when bringing up the adapter
#[derive(Debug, Clone, Default)]
pub struct AdapterOptions {
    /// Index of the adapter to use when the host has several
    pub adapter_index: usize,
}

/// Scan request parameters
#[derive(Debug, Clone)]
pub struct ScanRequest {
    /// Only report peripherals advertising one of these. Empty means all.
    pub service_filters: Vec<Uuid>,
    pub duration: Duration,
    pub allow_duplicates: bool,
}

/// Stream of notifications for one subscribed characteristic.
///
/// The sender side is dropped when the link goes away.
pub type NotificationStream = mpsc::UnboundedReceiver<RawNotification>;

#[async_trait]
pub trait BleTransport: Send + Sync {
    async fn start_adapter(&self, options: &AdapterOptions) -> Result<()>;

    /// Start discovery. Returns once the scan is running.
    async fn scan(&self, request: &ScanRequest) -> Result<()>;

    async fn stop_scan(&self) -> Result<()>;

    async fn connect(&self, identity: &SensorIdentity) -> Result<()>;

    /// Enumerate services and characteristics. Required before subscribing.
    async fn discover_services(&self, identity: &SensorIdentity) -> Result<()>;

    async fn subscribe_notifications(
        &self,
        identity: &SensorIdentity,
        service_uuid: Uuid,
        characteristic_uuid: Uuid,
    ) -> Result<NotificationStream>;
}
