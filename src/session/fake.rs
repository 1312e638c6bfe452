use async_std::task;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::DeviceState;
use crate::error::{Error, ErrorKind};
use crate::uuid::Uuid;

use super::*;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Call {
    StartScan,
    StopScan,
    Connect(Uuid),
    Disconnect(Uuid),
    FindDevice(Uuid),
}

/// Adapter double. Connects and disconnects succeed unless a failure was queued.
#[derive(Default)]
pub struct FakeAdapter {
    calls: Mutex<Vec<Call>>,
    states: Mutex<HashMap<Uuid, DeviceState>>,
    connected: Mutex<Vec<Device>>,
    connect_failures: Mutex<VecDeque<Error>>,
    disconnect_failures: Mutex<VecDeque<Error>>,
    scans: Mutex<Vec<CancelHandle>>,
    findable: Mutex<Vec<Device>>,
    find_delay: Mutex<Option<Duration>>,
    hang_connect: AtomicBool,
}

impl FakeAdapter {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn scans(&self) -> Vec<CancelHandle> {
        self.scans.lock().unwrap().clone()
    }

    pub fn set_connected(&self, device: &Device) {
        self.states.lock().unwrap().insert(device.id(), DeviceState::Connected);
        self.connected.lock().unwrap().push(device.clone());
    }

    pub fn fail_next_connect(&self, kind: ErrorKind, description: &str) {
        self.connect_failures.lock().unwrap().push_back(Error::new(kind, description));
    }

    pub fn fail_next_disconnect(&self, kind: ErrorKind, description: &str) {
        self.disconnect_failures.lock().unwrap().push_back(Error::new(kind, description));
    }

    pub fn add_findable(&self, device: &Device) {
        self.findable.lock().unwrap().push(device.clone());
    }

    pub fn set_find_delay(&self, delay: Duration) {
        *self.find_delay.lock().unwrap() = Some(delay);
    }

    /// Makes connects wait until their handle gets cancelled.
    pub fn hang_connect(&self) {
        self.hang_connect.store(true, Ordering::SeqCst);
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Adapter for FakeAdapter {
    fn start_scan(&self, cancel: CancelHandle) {
        self.record(Call::StartScan);
        self.scans.lock().unwrap().push(cancel);
    }

    fn stop_scan(&self) {
        self.record(Call::StopScan);
    }

    async fn connect(&self, device: &Device, cancel: CancelHandle) -> Result<(), Error> {
        self.record(Call::Connect(device.id()));
        if self.hang_connect.load(Ordering::SeqCst) {
            while !cancel.is_cancelled() {
                task::sleep(Duration::from_millis(1)).await;
            }
            return Err(Error::new(ErrorKind::OperationCancelled, "cancelled"));
        }
        let failure = self.connect_failures.lock().unwrap().pop_front();
        if let Some(e) = failure {
            return Err(e);
        }
        self.set_connected(device);
        Ok(())
    }

    async fn disconnect(&self, device: &Device) -> Result<(), Error> {
        self.record(Call::Disconnect(device.id()));
        let failure = self.disconnect_failures.lock().unwrap().pop_front();
        if let Some(e) = failure {
            return Err(e);
        }
        self.states.lock().unwrap().insert(device.id(), DeviceState::Disconnected);
        self.connected.lock().unwrap().retain(|d| d.id() != device.id());
        Ok(())
    }

    fn connected_devices(&self) -> Vec<Device> {
        self.connected.lock().unwrap().clone()
    }

    fn device_state(&self, id: Uuid) -> DeviceState {
        self.states.lock().unwrap().get(&id).copied().unwrap_or(DeviceState::Disconnected)
    }

    async fn find_device(&self, id: Uuid, _cancel: CancelHandle) -> Result<Option<Device>, Error> {
        self.record(Call::FindDevice(id));
        let delay = *self.find_delay.lock().unwrap();
        if let Some(delay) = delay {
            task::sleep(delay).await;
        }
        Ok(self.findable.lock().unwrap().iter().find(|d| d.id() == id).cloned())
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Dialog {
    Confirm(String),
    Error(String),
    Loading(String),
    HideLoading,
}

pub struct FakeDialogs {
    answer: AtomicBool,
    log: Mutex<Vec<Dialog>>,
}

impl FakeDialogs {
    pub fn new(answer: bool) -> Self {
        Self {
            answer: AtomicBool::new(answer),
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn log(&self) -> Vec<Dialog> {
        self.log.lock().unwrap().clone()
    }

    pub fn confirms(&self) -> usize {
        self.log().iter().filter(|d| matches!(d, Dialog::Confirm(_))).count()
    }

    pub fn errors(&self) -> Vec<String> {
        self.log().into_iter()
            .filter_map(|d| match d {
                Dialog::Error(v) => Some(v),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl UserDialogs for FakeDialogs {
    async fn confirm(&self, message: &str) -> bool {
        self.log.lock().unwrap().push(Dialog::Confirm(message.to_owned()));
        self.answer.load(Ordering::SeqCst)
    }

    fn show_error(&self, message: &str) {
        self.log.lock().unwrap().push(Dialog::Error(message.to_owned()));
    }

    fn show_loading(&self, message: &str) {
        self.log.lock().unwrap().push(Dialog::Loading(message.to_owned()));
    }

    fn hide_loading(&self) {
        self.log.lock().unwrap().push(Dialog::HideLoading);
    }
}
