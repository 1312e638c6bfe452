use async_trait::async_trait;

use crate::DeviceState;
use crate::error::Error;
use crate::uuid::Uuid;

use super::cancel::CancelHandle;
use super::device::Device;

/// The radio. Owns the true scan and connection state that the session mirrors.
///
/// Discovery results and scan timeouts are reported back through
/// [`ScanSession::handle_event`](super::ScanSession::handle_event) or the matching
/// `on_*` methods, from any thread.
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Begins a time-bounded scan. The adapter should stop once `cancel` is cancelled.
    fn start_scan(&self, cancel: CancelHandle);

    fn stop_scan(&self);

    async fn connect(&self, device: &Device, cancel: CancelHandle) -> Result<(), Error>;

    async fn disconnect(&self, device: &Device) -> Result<(), Error>;

    /// Devices currently connected through this adapter.
    fn connected_devices(&self) -> Vec<Device>;

    fn device_state(&self, id: Uuid) -> DeviceState;

    /// Looks for a specific device, e.g. by scanning for it. `Ok(None)` if it isn't around.
    async fn find_device(&self, id: Uuid, cancel: CancelHandle) -> Result<Option<Device>, Error>;
}

/// Presentation collaborator: prompts, error messages and a loading indicator.
#[async_trait]
pub trait UserDialogs: Send + Sync {
    async fn confirm(&self, message: &str) -> bool;

    fn show_error(&self, message: &str);

    fn show_loading(&self, message: &str);

    fn hide_loading(&self);
}

/// Callbacks from the adapter.
#[derive(Clone, Debug)]
pub enum AdapterEvent {
    DeviceDiscovered(Device),
    ScanTimeoutElapsed,
}
