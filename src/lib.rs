//! Serial background executor and the scan/connect session that drives BLE device discovery.
//!
//! The crate has two independent parts:
//!
//! * [`executor::SerialExecutor`] runs closures one at a time, in submission order, on a
//!   dedicated thread. Tasks may be submitted from any thread; a panicking task is reported and
//!   doesn't stop the worker.
//! * [`session::ScanSession`] coordinates a cancellable, time-bounded scan and cancellable
//!   connects against an external [`Adapter`](session::Adapter), keeps the list of discovered
//!   devices and reports changes to its observers through an event receiver.
//!
//! The radio itself and all presentation (prompts, error messages, loading indicators) are
//! collaborators supplied by the caller.
//!
//! # Example
//!
//! ```no_run
//! use ble_session::*;
//! use ble_session::session::*;
//! use std::sync::Arc;
//!
//! # fn run(adapter: Arc<dyn Adapter>, dialogs: Arc<dyn UserDialogs>) {
//! let (session, events) = ScanSession::new(adapter, dialogs);
//! session.start_scan();
//!
//! // The adapter reports discoveries via `session.handle_event(..)` from its own threads.
//!
//! let handle_event = |event| {
//!     match event {
//!         SessionEvent::PropertiesChanged { changed } => {
//!             if changed.contains(Property::IsScanning) {
//!                 println!("scanning: {}", session.is_scanning());
//!             }
//!         }
//!         SessionEvent::DeviceAdded { device } => {
//!             println!("found {}", device.display_name());
//!         }
//!         _ => {}
//!     }
//! };
#![cfg_attr(not(feature = "async_events"), doc =r#"
while let Ok(event) = events.recv() {
    handle_event(event);
}
"#)]
#![cfg_attr(feature = "async_events", doc =r#"
async_std::task::block_on(async move {
    while let Ok(event) = events.recv().await {
        handle_event(event);
    }
})
"#)]
//! # }
//! ```
//!
//! A simulated adapter is wired up end to end in `demos/simulated_scan.rs`.
#![deny(dead_code)]
#![deny(non_snake_case)]
#![deny(unused_imports)]
#![deny(unused_must_use)]

pub mod error;
pub mod executor;
pub mod session;
mod sync;
pub mod uuid;
mod util;

use enumflags2::BitFlags;

pub use sync::Receiver;

/// Connection state of a device, as tracked by the adapter.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DeviceState {
    Disconnected,
    Connecting,
    Connected,
    Disconnecting,
}

/// Observable session properties, reported in
/// [`SessionEvent::PropertiesChanged`](session::SessionEvent::PropertiesChanged).
#[derive(BitFlags, Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum Property {
    /// [`ScanSession::is_scanning`](session::ScanSession::is_scanning).
    IsScanning = 0b0001,

    /// [`ScanSession::can_stop_scan`](session::ScanSession::can_stop_scan).
    CanStopScan = 0b0010,

    /// [`ScanSession::is_connecting`](session::ScanSession::is_connecting).
    IsConnecting = 0b0100,

    /// [`ScanSession::previous_device_id`](session::ScanSession::previous_device_id) and
    /// [`ScanSession::can_reconnect_to_previous`](session::ScanSession::can_reconnect_to_previous).
    PreviousDevice = 0b1000,
}
