//! Bluetooth Module
//!
//! Streams orientation frames from the tilt sensors into the session store.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    BluetoothService                      │
//! │        (background runtime thread, shutdown handle)      │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                 ConnectionOrchestrator                   │
//! │   shared scan ─► per-sensor connect/discover/subscribe   │
//! └──────────┬──────────────────────────────┬───────────────┘
//!            │                              │
//!            ▼                              ▼
//! ┌────────────────────┐          ┌──────────────────────┐
//! │    BleTransport    │          │       Protocol       │
//! │ (btleplug backend) │          │ - UUIDs              │
//! │ - scan / connect   │          │ - frame decoding     │
//! │ - notifications    │          │ - clamping           │
//! └────────────────────┘          └──────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`protocol`] - UUIDs and payload decoding
//! - [`transport`] - Operations required from a BLE stack
//! - [`btleplug_transport`] - Cross-platform transport on top of btleplug
//! - [`orchestrator`] - Per-sensor connection state machine
//! - [`service`] - Background thread owning the runtime

pub mod btleplug_transport;
pub mod orchestrator;
pub mod protocol;
pub mod service;
pub mod transport;

pub use service::BluetoothService;
