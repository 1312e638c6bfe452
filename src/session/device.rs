use static_assertions::assert_impl_all;

use crate::uuid::Uuid;

/// A device reported by the adapter.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Device {
    id: Uuid,
    name: Option<String>,
    rssi: i32,
}

assert_impl_all!(Device: Send, Sync);

impl Device {
    pub fn new(id: Uuid, name: Option<&str>) -> Self {
        Self {
            id,
            name: name.map(|v| v.to_owned()),
            rssi: 0,
        }
    }

    pub fn with_rssi(mut self, rssi: i32) -> Self {
        self.rssi = rssi;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Advertised local name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_ref().map(|v| v.as_str())
    }

    /// Name for prompts and messages; falls back to the identifier.
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.id.to_string(),
        }
    }

    /// Signal strength in dBm at the time of discovery.
    pub fn rssi(&self) -> i32 {
        self.rssi
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(in crate) enum Upsert {
    Inserted,
    Updated,
    Unchanged,
}

/// Discovered devices in discovery order, unique by identifier.
#[derive(Clone, Debug, Default)]
pub(in crate) struct DeviceList(Vec<Device>);

impl DeviceList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends `device`, or refreshes the entry with the same identifier in place.
    pub fn upsert(&mut self, device: Device) -> Upsert {
        match self.0.iter_mut().find(|d| d.id == device.id) {
            Some(existing) if *existing == device => Upsert::Unchanged,
            Some(existing) => {
                *existing = device;
                Upsert::Updated
            }
            None => {
                self.0.push(device);
                Upsert::Inserted
            }
        }
    }

    pub fn remove(&mut self, id: Uuid) -> Option<Device> {
        let i = self.0.iter().position(|d| d.id == id)?;
        Some(self.0.remove(i))
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn to_vec(&self) -> Vec<Device> {
        self.0.clone()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn dev(id: u128, name: &str) -> Device {
        Device::new(Uuid::from_u128(id), Some(name))
    }

    #[test]
    fn upsert_keeps_ids_unique_and_order() {
        let mut list = DeviceList::new();
        assert_eq!(list.upsert(dev(1, "a")), Upsert::Inserted);
        assert_eq!(list.upsert(dev(2, "b")), Upsert::Inserted);
        assert_eq!(list.upsert(dev(1, "a")), Upsert::Unchanged);
        assert_eq!(list.upsert(dev(1, "a").with_rssi(-40)), Upsert::Updated);

        let v = list.to_vec();
        assert_eq!(v.len(), 2);
        assert_eq!(v[0].id(), Uuid::from_u128(1));
        assert_eq!(v[0].rssi(), -40);
        assert_eq!(v[1].name(), Some("b"));
    }

    #[test]
    fn remove_and_clear() {
        let mut list = DeviceList::new();
        list.upsert(dev(1, "a"));
        list.upsert(dev(2, "b"));
        assert_eq!(list.remove(Uuid::from_u128(1)).map(|d| d.id()), Some(Uuid::from_u128(1)));
        assert!(list.remove(Uuid::from_u128(1)).is_none());
        assert_eq!(list.to_vec(), vec![dev(2, "b")]);
        list.clear();
        assert!(list.to_vec().is_empty());
    }

    #[test]
    fn display_name_falls_back_to_id() {
        assert_eq!(dev(1, "Sensor").display_name(), "Sensor");
        assert_eq!(Device::new(Uuid::from_u128(1), None).display_name(),
            "00000000-0000-0000-0000-000000000001");
    }
}
