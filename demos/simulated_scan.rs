use async_std::task;
use async_trait::async_trait;
use log::*;
use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use ble_session::*;
use ble_session::error::{Error, ErrorKind};
use ble_session::executor::SerialExecutor;
use ble_session::session::*;
use ble_session::uuid::Uuid;

/// Pretends to find a handful of sensors, then reports the scan timeout.
struct SimulatedAdapter {
    events: Mutex<mpsc::Sender<AdapterEvent>>,
    connected: Mutex<HashMap<Uuid, Device>>,
}

impl SimulatedAdapter {
    fn new(events: mpsc::Sender<AdapterEvent>) -> Self {
        Self {
            events: Mutex::new(events),
            connected: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl Adapter for SimulatedAdapter {
    fn start_scan(&self, cancel: CancelHandle) {
        let events = self.events.lock().unwrap().clone();
        thread::spawn(move || {
            for i in 0..5u8 {
                thread::sleep(Duration::from_millis(100));
                if cancel.is_cancelled() {
                    return;
                }
                let device = Device::new(Uuid::from_u128(i as u128 + 1), Some(format!("Sensor {}", i + 1).as_str()))
                    .with_rssi(-40 - 5 * i as i32);
                let _ = events.send(AdapterEvent::DeviceDiscovered(device));
            }
            let _ = events.send(AdapterEvent::ScanTimeoutElapsed);
        });
    }

    fn stop_scan(&self) {
        debug!("radio: scan stopped");
    }

    async fn connect(&self, device: &Device, cancel: CancelHandle) -> Result<(), Error> {
        task::sleep(Duration::from_millis(200)).await;
        if cancel.is_cancelled() {
            return Err(Error::new(ErrorKind::OperationCancelled, "connect cancelled"));
        }
        self.connected.lock().unwrap().insert(device.id(), device.clone());
        Ok(())
    }

    async fn disconnect(&self, device: &Device) -> Result<(), Error> {
        match self.connected.lock().unwrap().remove(&device.id()) {
            Some(_) => Ok(()),
            None => Err(Error::new(ErrorKind::NotConnected, "not connected")),
        }
    }

    fn connected_devices(&self) -> Vec<Device> {
        self.connected.lock().unwrap().values().cloned().collect()
    }

    fn device_state(&self, id: Uuid) -> DeviceState {
        if self.connected.lock().unwrap().contains_key(&id) {
            DeviceState::Connected
        } else {
            DeviceState::Disconnected
        }
    }

    async fn find_device(&self, id: Uuid, _cancel: CancelHandle) -> Result<Option<Device>, Error> {
        task::sleep(Duration::from_millis(100)).await;
        Ok(Some(Device::new(id, Some("Sensor (found again)"))))
    }
}

struct ConsoleDialogs;

#[async_trait]
impl UserDialogs for ConsoleDialogs {
    async fn confirm(&self, message: &str) -> bool {
        println!("{} [auto-yes]", message);
        true
    }

    fn show_error(&self, message: &str) {
        eprintln!("error: {}", message);
    }

    fn show_loading(&self, message: &str) {
        println!("{}", message);
    }

    fn hide_loading(&self) {}
}

#[cfg(not(feature = "async_events"))]
fn next_event(events: &Receiver<SessionEvent>) -> Option<SessionEvent> {
    events.recv().ok()
}

#[cfg(feature = "async_events")]
fn next_event(events: &Receiver<SessionEvent>) -> Option<SessionEvent> {
    task::block_on(events.recv()).ok()
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let (adapter_tx, adapter_rx) = mpsc::channel();
    let adapter = Arc::new(SimulatedAdapter::new(adapter_tx));
    let (session, events) = ScanSession::new(adapter, Arc::new(ConsoleDialogs));
    let session = Arc::new(session);

    // Session events are rendered one at a time on a dedicated "ui" thread.
    let ui = SerialExecutor::new(Some("ui"))?;
    let forwarder = thread::spawn(move || {
        while let Some(event) = next_event(&events) {
            let r = ui.submit(move || match event {
                SessionEvent::PropertiesChanged { changed } => println!("changed: {:?}", changed),
                SessionEvent::DeviceAdded { device } =>
                    println!("+ {} ({} dB)", device.display_name(), device.rssi()),
                SessionEvent::DeviceRemoved { device } => println!("- {}", device.display_name()),
                _ => {}
            });
            if r.is_err() {
                break;
            }
        }
    });

    println!("Scanning...");
    session.start_scan();
    for event in adapter_rx.iter() {
        let done = matches!(event, AdapterEvent::ScanTimeoutElapsed);
        session.handle_event(event);
        if done {
            break;
        }
    }

    let devices = session.devices();
    let device = match devices.iter().max_by_key(|d| d.rssi()) {
        Some(v) => v.clone(),
        None => anyhow::bail!("no devices found"),
    };

    task::block_on(async {
        if session.connect(&device, true).await {
            println!("connected to {}", device.display_name());
        }
        session.disconnect(&device).await;
        match session.reconnect_to_previous().await {
            Ok(()) => println!("reconnected to {}", device.id()),
            Err(e) => println!("couldn't reconnect: {}", e),
        }
    });

    drop(session);
    forwarder.join().map_err(|_| anyhow::anyhow!("event forwarder panicked"))?;
    Ok(())
}
