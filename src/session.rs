mod adapter;
mod cancel;
pub mod device;
#[cfg(test)]
mod fake;

use async_std::future::timeout;
use enumflags2::BitFlags;
use log::*;
use static_assertions::*;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::*;
use crate::error::{ConnectError, ErrorKind};
use crate::sync;
use crate::util::{lock, BitFlagsDebug};
use crate::uuid::Uuid;

pub use adapter::{Adapter, AdapterEvent, UserDialogs};
pub use cancel::CancelHandle;
pub use device::Device;

use device::{DeviceList, Upsert};

const DEFAULT_FIND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum SessionEvent {
    PropertiesChanged {
        changed: BitFlags<Property>,
    },

    /// The device list was emptied at the start of a scan.
    DevicesCleared,

    DeviceAdded {
        device: Device,
    },

    /// A device already in the list was rediscovered with new name or signal strength.
    DeviceUpdated {
        device: Device,
    },

    DeviceRemoved {
        device: Device,
    },
}

assert_impl_all!(SessionEvent: Send);

pub struct ScanSessionBuilder {
    find_timeout: Duration,
}

impl ScanSessionBuilder {
    pub fn new() -> Self {
        Self {
            find_timeout: DEFAULT_FIND_TIMEOUT,
        }
    }

    /// How long [`ScanSession::reconnect_to_previous`] looks for the previous device.
    pub fn find_timeout(&mut self, v: Duration) -> &mut Self {
        self.find_timeout = v;
        self
    }

    pub fn build(&self, adapter: Arc<dyn Adapter>, dialogs: Arc<dyn UserDialogs>)
        -> (ScanSession, sync::Receiver<SessionEvent>)
    {
        ScanSession::build(self, adapter, dialogs)
    }
}

assert_impl_all!(ScanSessionBuilder: Send, Sync);

struct State {
    devices: DeviceList,
    active_scan: Option<CancelHandle>,
    active_connects: Vec<CancelHandle>,
    previous_device_id: Option<Uuid>,
}

/// Scan and connect state machine over an [`Adapter`].
///
/// Every state change is applied and announced under one lock, so getters and observers never
/// see a half-updated device list. The lock is never held while awaiting the adapter or the
/// dialogs.
pub struct ScanSession {
    adapter: Arc<dyn Adapter>,
    dialogs: Arc<dyn UserDialogs>,
    find_timeout: Duration,
    state: Mutex<State>,
    events: sync::Sender<SessionEvent>,
}

assert_impl_all!(ScanSession: Send, Sync);

impl ScanSession {
    pub fn new(adapter: Arc<dyn Adapter>, dialogs: Arc<dyn UserDialogs>)
        -> (Self, sync::Receiver<SessionEvent>)
    {
        ScanSessionBuilder::new().build(adapter, dialogs)
    }

    /// Starts a scan unless one is already running.
    ///
    /// Clears the device list and seeds it with the devices the adapter reports as connected.
    /// Returns `false` if a scan was already running.
    pub fn start_scan(&self) -> bool {
        let connected = self.adapter.connected_devices();
        let cancel = CancelHandle::new();
        {
            let mut state = lock(&self.state);
            if state.active_scan.is_some() {
                debug!("scan already running");
                return false;
            }

            state.devices.clear();
            self.send(SessionEvent::DevicesCleared);
            for device in connected {
                self.upsert(&mut state, device);
            }

            state.active_scan = Some(cancel.clone());
            self.notify(Property::IsScanning | Property::CanStopScan);
        }

        info!("starting scan {:?}", cancel);
        self.adapter.start_scan(cancel);
        true
    }

    /// Cancels the running scan. Returns `false` if there was none.
    pub fn stop_scan(&self) -> bool {
        let cancel = match self.retire_scan() {
            Some(v) => v,
            None => return false,
        };
        info!("stopping scan {:?}", cancel);
        cancel.cancel();
        self.adapter.stop_scan();
        true
    }

    /// Called by the adapter for every discovered device, on any thread.
    ///
    /// Devices reported while no scan is running are dropped. A device that's already listed is
    /// refreshed in place.
    pub fn on_device_discovered(&self, device: Device) {
        let mut state = lock(&self.state);
        if state.active_scan.is_none() {
            debug!("ignoring {:?} discovered while not scanning", device.id());
            return;
        }
        trace!("discovered {:?} {:?} {} dB", device.id(), device.name(), device.rssi());
        self.upsert(&mut state, device);
    }

    /// Called by the adapter once the scan's time bound has elapsed.
    pub fn on_scan_timeout(&self) {
        if let Some(cancel) = self.retire_scan() {
            info!("scan {:?} timed out", cancel);
            cancel.cancel();
        }
    }

    pub fn handle_event(&self, event: AdapterEvent) {
        match event {
            AdapterEvent::DeviceDiscovered(device) => self.on_device_discovered(device),
            AdapterEvent::ScanTimeoutElapsed => self.on_scan_timeout(),
        }
    }

    /// Restarts discovery from an empty list.
    pub fn refresh(&self) {
        self.stop_scan();
        self.start_scan();
    }

    /// The device list became visible.
    pub fn resume(&self) {
        self.start_scan();
    }

    /// The device list was hidden.
    pub fn suspend(&self) {
        self.stop_scan();
    }

    /// Connects to `device`, asking for confirmation first if `prompt` is set.
    ///
    /// Failures are reported through [`UserDialogs::show_error`]; the caller only learns
    /// whether the device ended up connected.
    pub async fn connect(&self, device: &Device, prompt: bool) -> bool {
        self.try_connect(device, prompt).await.is_ok()
    }

    /// Same as [`connect`](Self::connect) but returns why the device didn't get connected.
    /// Failures are still reported through [`UserDialogs::show_error`].
    pub async fn try_connect(&self, device: &Device, prompt: bool) -> Result<(), ConnectError> {
        if self.is_connected(device) {
            debug!("{:?} already connected", device.id());
            return Ok(());
        }

        if prompt {
            let message = format!("Connect to device '{}'?", device.display_name());
            if !self.dialogs.confirm(&message).await {
                debug!("connecting to {:?} declined", device.id());
                return Err(ConnectError::Declined);
            }
        }

        let _loading = Loading::show(self, "Connecting ...");

        // The state may have changed while the prompt was up.
        if self.is_connected(device) {
            return Ok(());
        }

        let result = {
            let connecting = Connecting::begin(self);
            self.adapter.connect(device, connecting.cancel.clone()).await
        };

        match result {
            Ok(()) => {
                info!("connected to {:?}", device.id());
                let mut state = lock(&self.state);
                if state.previous_device_id.replace(device.id()) != Some(device.id()) {
                    self.notify(Property::PreviousDevice.into());
                }
                Ok(())
            }
            Err(e) => {
                warn!("couldn't connect to {:?}: {}", device.id(), e);
                if e.kind() != ErrorKind::OperationCancelled {
                    self.dialogs.show_error(&format!("Connection error: {}", e));
                }
                Err(ConnectError::Failed(e))
            }
        }
    }

    /// Cancels in-flight connects. Doesn't affect the scan.
    /// Returns `false` if nothing was connecting.
    pub fn cancel_connect(&self) -> bool {
        let state = lock(&self.state);
        for cancel in &state.active_connects {
            debug!("cancelling connect {:?}", cancel);
            cancel.cancel();
        }
        !state.active_connects.is_empty()
    }

    /// Disconnects `device` and removes it from the list.
    ///
    /// Does nothing and returns `false` if the device isn't connected. On failure the error is
    /// reported and the device stays listed.
    pub async fn disconnect(&self, device: &Device) -> bool {
        if !self.is_connected(device) {
            return false;
        }

        let _loading = Loading::show(self, &format!("Disconnecting {}...", device.display_name()));

        match self.adapter.disconnect(device).await {
            Ok(()) => {
                info!("disconnected from {:?}", device.id());
                let mut state = lock(&self.state);
                if let Some(device) = state.devices.remove(device.id()) {
                    self.send(SessionEvent::DeviceRemoved { device });
                }
                true
            }
            Err(e) => {
                warn!("couldn't disconnect from {:?}: {}", device.id(), e);
                self.dialogs.show_error(&format!("Disconnect error: {}", e));
                false
            }
        }
    }

    /// Looks up the last successfully connected device and connects to it with a prompt.
    ///
    /// Fails with [`ConnectError::Unavailable`] before the first successful connect and with
    /// [`ConnectError::NotFound`] if the lookup comes back empty or runs out of time.
    pub async fn reconnect_to_previous(&self) -> Result<(), ConnectError> {
        let id = self.previous_device_id().ok_or(ConnectError::Unavailable)?;

        let found = {
            let _loading = Loading::show(self, &format!("Searching for '{}'", id));
            let cancel = CancelHandle::new();
            match timeout(self.find_timeout, self.adapter.find_device(id, cancel.clone())).await {
                Ok(Ok(v)) => v,
                Ok(Err(e)) => {
                    warn!("looking for {:?} failed: {}", id, e);
                    self.dialogs.show_error(&e.to_string());
                    return Err(ConnectError::Failed(e));
                }
                Err(_) => {
                    debug!("looking for {:?} timed out", id);
                    cancel.cancel();
                    None
                }
            }
        };

        match found {
            Some(device) => self.try_connect(&device, true).await,
            None => {
                let e = ConnectError::NotFound(id);
                self.dialogs.show_error(&e.to_string());
                Err(e)
            }
        }
    }

    pub fn is_scanning(&self) -> bool {
        lock(&self.state).active_scan.is_some()
    }

    /// Whether there's a scan that [`stop_scan`](Self::stop_scan) can cancel.
    pub fn can_stop_scan(&self) -> bool {
        self.is_scanning()
    }

    pub fn is_connecting(&self) -> bool {
        !lock(&self.state).active_connects.is_empty()
    }

    pub fn previous_device_id(&self) -> Option<Uuid> {
        lock(&self.state).previous_device_id
    }

    pub fn can_reconnect_to_previous(&self) -> bool {
        self.previous_device_id().is_some()
    }

    /// Snapshot of the device list in discovery order.
    pub fn devices(&self) -> Vec<Device> {
        lock(&self.state).devices.to_vec()
    }

    pub fn device_state(&self, device: &Device) -> DeviceState {
        self.adapter.device_state(device.id())
    }

    fn is_connected(&self, device: &Device) -> bool {
        self.device_state(device) == DeviceState::Connected
    }

    fn retire_scan(&self) -> Option<CancelHandle> {
        let mut state = lock(&self.state);
        let cancel = state.active_scan.take()?;
        self.notify(Property::IsScanning | Property::CanStopScan);
        Some(cancel)
    }

    fn upsert(&self, state: &mut State, device: Device) {
        match state.devices.upsert(device.clone()) {
            Upsert::Inserted => self.send(SessionEvent::DeviceAdded { device }),
            Upsert::Updated => self.send(SessionEvent::DeviceUpdated { device }),
            Upsert::Unchanged => {}
        }
    }

    fn notify(&self, changed: BitFlags<Property>) {
        trace!("properties changed: {:?}", BitFlagsDebug(changed));
        self.send(SessionEvent::PropertiesChanged { changed });
    }

    fn send(&self, event: SessionEvent) {
        sync::send(&self.events, event);
    }

    fn build(b: &ScanSessionBuilder, adapter: Arc<dyn Adapter>, dialogs: Arc<dyn UserDialogs>)
        -> (Self, sync::Receiver<SessionEvent>)
    {
        let (events, receiver) = sync::channel();
        (Self {
            adapter,
            dialogs,
            find_timeout: b.find_timeout,
            state: Mutex::new(State {
                devices: DeviceList::new(),
                active_scan: None,
                active_connects: Vec::new(),
                previous_device_id: None,
            }),
            events,
        }, receiver)
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        self.stop_scan();
        self.cancel_connect();
    }
}

/// Registers an in-flight connect for the lifetime of the value.
struct Connecting<'a> {
    session: &'a ScanSession,
    cancel: CancelHandle,
}

impl<'a> Connecting<'a> {
    fn begin(session: &'a ScanSession) -> Self {
        let cancel = CancelHandle::new();
        let mut state = lock(&session.state);
        state.active_connects.push(cancel.clone());
        if state.active_connects.len() == 1 {
            session.notify(Property::IsConnecting.into());
        }
        Self {
            session,
            cancel,
        }
    }
}

impl Drop for Connecting<'_> {
    fn drop(&mut self) {
        let mut state = lock(&self.session.state);
        let len = state.active_connects.len();
        let cancel = &self.cancel;
        state.active_connects.retain(|v| !v.same(cancel));
        if len > 0 && state.active_connects.is_empty() {
            self.session.notify(Property::IsConnecting.into());
        }
    }
}

/// Shows the loading indicator for the lifetime of the value.
struct Loading<'a> {
    dialogs: &'a dyn UserDialogs,
}

impl<'a> Loading<'a> {
    fn show(session: &'a ScanSession, message: &str) -> Self {
        session.dialogs.show_loading(message);
        Self {
            dialogs: &*session.dialogs,
        }
    }
}

impl Drop for Loading<'_> {
    fn drop(&mut self) {
        self.dialogs.hide_loading();
    }
}
