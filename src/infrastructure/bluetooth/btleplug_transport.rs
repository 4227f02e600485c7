//! btleplug-backed BLE transport.

use crate::domain::models::{RawNotification, SensorIdentity};
use crate::infrastructure::bluetooth::transport::{
    AdapterOptions, BleTransport, NotificationStream, ScanRequest,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use btleplug::api::{Central, Characteristic, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::StreamExt;
use std::collections::HashMap;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct BtleplugTransport {
    adapter: Mutex<Option<Adapter>>,
    peripherals: Mutex<HashMap<SensorIdentity, Peripheral>>,
}

impl BtleplugTransport {
    pub fn new() -> Self {
        Self {
            adapter: Mutex::new(None),
            peripherals: Mutex::new(HashMap::new()),
        }
    }

    async fn adapter(&self) -> Result<Adapter> {
        self.adapter
            .lock()
            .await
            .clone()
            .ok_or_else(|| anyhow::anyhow!("Bluetooth adapter not started"))
    }

    /// Find the peripheral for `identity` among those the last scan surfaced.
    async fn peripheral(&self, identity: &SensorIdentity) -> Result<Peripheral> {
        if let Some(p) = self.peripherals.lock().await.get(identity) {
            return Ok(p.clone());
        }

        let adapter = self.adapter().await?;
        for p in adapter.peripherals().await? {
            if SensorIdentity::new(p.address().to_string()) == *identity {
                self.peripherals
                    .lock()
                    .await
                    .insert(identity.clone(), p.clone());
                return Ok(p);
            }
        }

        anyhow::bail!("Device {} not found during scan", identity)
    }
}

impl Default for BtleplugTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn find_characteristic(
    peripheral: &Peripheral,
    service_uuid: Uuid,
    characteristic_uuid: Uuid,
) -> Option<Characteristic> {
    peripheral
        .characteristics()
        .into_iter()
        .find(|c| c.uuid == characteristic_uuid && c.service_uuid == service_uuid)
}

#[async_trait]
impl BleTransport for BtleplugTransport {
    async fn start_adapter(&self, options: &AdapterOptions) -> Result<()> {
        let manager = Manager::new().await.context("Failed to open BLE manager")?;
        let adapters = manager.adapters().await?;
        let adapter = adapters
            .into_iter()
            .nth(options.adapter_index)
            .ok_or_else(|| anyhow::anyhow!("No Bluetooth adapter at index {}", options.adapter_index))?;

        info!("Using Bluetooth adapter: {}", adapter.adapter_info().await?);
        *self.adapter.lock().await = Some(adapter);
        Ok(())
    }

    async fn scan(&self, request: &ScanRequest) -> Result<()> {
        let adapter = self.adapter().await?;
        if !request.allow_duplicates {
            // btleplug always reports every advertisement; the flag is advisory.
            debug!("Duplicate filtering is left to the platform");
        }

        debug!("Starting scan, window {:?}", request.duration);
        adapter
            .start_scan(ScanFilter {
                services: request.service_filters.clone(),
            })
            .await
            .context("Failed to start scan")?;
        Ok(())
    }

    async fn stop_scan(&self) -> Result<()> {
        self.adapter().await?.stop_scan().await?;
        Ok(())
    }

    async fn connect(&self, identity: &SensorIdentity) -> Result<()> {
        let peripheral = self.peripheral(identity).await?;
        if !peripheral.is_connected().await? {
            peripheral.connect().await?;
        }
        Ok(())
    }

    async fn discover_services(&self, identity: &SensorIdentity) -> Result<()> {
        let peripheral = self.peripheral(identity).await?;
        peripheral.discover_services().await?;
        debug!(
            "Device {} exposes {} characteristics",
            identity,
            peripheral.characteristics().len()
        );
        Ok(())
    }

    async fn subscribe_notifications(
        &self,
        identity: &SensorIdentity,
        service_uuid: Uuid,
        characteristic_uuid: Uuid,
    ) -> Result<NotificationStream> {
        let peripheral = self.peripheral(identity).await?;
        let characteristic = find_characteristic(&peripheral, service_uuid, characteristic_uuid)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Characteristic {} not found in service {}",
                    characteristic_uuid,
                    service_uuid
                )
            })?;

        // Take the stream before subscribing so no early frame is missed.
        let mut notifications = peripheral.notifications().await?;
        peripheral.subscribe(&characteristic).await?;

        let (tx, rx) = mpsc::unbounded_channel();
        let identity = identity.clone();
        tokio::spawn(async move {
            while let Some(n) = notifications.next().await {
                let event = RawNotification {
                    identity: identity.clone(),
                    characteristic_uuid: n.uuid,
                    payload: n.value,
                };
                if tx.send(event).is_err() {
                    break;
                }
            }
            warn!("Notification stream for {} ended", identity);
        });

        Ok(rx)
    }
}
