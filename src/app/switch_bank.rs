//! Switch bank: the four relay outputs and their persisted states.
//!
//! Every mutation is write-through: the output is driven, then the whole
//! state record is written and committed before the call returns. The
//! output and in-memory state are applied even when storage fails; the
//! failure is returned so the caller can log it.

use super::ports::{StoragePort, SwitchOutputPort};
use crate::error::StorageError;

/// NVS namespace holding the switch record.
pub const SWITCH_NAMESPACE: &str = "switches";
/// Key of the 4-byte switch record.
pub const SWITCH_KEY: &str = "states";

pub const SWITCH_COUNT: usize = 4;

/// One of the four relay channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwitchId {
    Sw1,
    Sw2,
    Sw3,
    Sw4,
}

impl SwitchId {
    /// Every channel in ordinal order.
    pub const ALL: [SwitchId; SWITCH_COUNT] = [Self::Sw1, Self::Sw2, Self::Sw3, Self::Sw4];

    /// Zero-based slot in the persisted record.
    pub const fn index(self) -> usize {
        match self {
            Self::Sw1 => 0,
            Self::Sw2 => 1,
            Self::Sw3 => 2,
            Self::Sw4 => 3,
        }
    }

    /// One-based number used on the wire (`sw<n>`).
    pub const fn number(self) -> u8 {
        self.index() as u8 + 1
    }

    pub const fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Sw1),
            2 => Some(Self::Sw2),
            3 => Some(Self::Sw3),
            4 => Some(Self::Sw4),
            _ => None,
        }
    }
}

/// In-memory mirror of the persisted switch record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SwitchBank {
    states: [bool; SWITCH_COUNT],
}

impl SwitchBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the persisted record and drive every output from it.
    ///
    /// A missing record means all off; a short record leaves the
    /// remaining slots off. Any non-zero byte is "on".
    pub fn restore_all(
        &mut self,
        hw: &mut impl SwitchOutputPort,
        storage: &impl StoragePort,
    ) -> Result<(), StorageError> {
        let mut buf = [0u8; SWITCH_COUNT];
        let result = match storage.read(SWITCH_NAMESPACE, SWITCH_KEY, &mut buf) {
            Ok(len) => {
                buf[len.min(SWITCH_COUNT)..].fill(0);
                Ok(())
            }
            Err(StorageError::NotFound) => {
                buf = [0; SWITCH_COUNT];
                Ok(())
            }
            Err(e) => {
                buf = [0; SWITCH_COUNT];
                Err(e)
            }
        };

        for id in SwitchId::ALL {
            let on = buf[id.index()] != 0;
            self.states[id.index()] = on;
            hw.set_output(id, on);
        }
        result
    }

    /// Drive one output and persist the record.
    pub fn set_switch(
        &mut self,
        id: SwitchId,
        on: bool,
        hw: &mut impl SwitchOutputPort,
        storage: &mut impl StoragePort,
    ) -> Result<(), StorageError> {
        hw.set_output(id, on);
        self.states[id.index()] = on;
        self.persist(storage)
    }

    /// Drive every output, SW1 first, then persist once.
    pub fn set_all(
        &mut self,
        on: bool,
        hw: &mut impl SwitchOutputPort,
        storage: &mut impl StoragePort,
    ) -> Result<(), StorageError> {
        for id in SwitchId::ALL {
            hw.set_output(id, on);
            self.states[id.index()] = on;
        }
        self.persist(storage)
    }

    pub fn state(&self, id: SwitchId) -> bool {
        self.states[id.index()]
    }

    pub fn states(&self) -> [bool; SWITCH_COUNT] {
        self.states
    }

    fn persist(&self, storage: &mut impl StoragePort) -> Result<(), StorageError> {
        let record = self.states.map(u8::from);
        storage.write(SWITCH_NAMESPACE, SWITCH_KEY, &record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct Outputs([Option<bool>; SWITCH_COUNT]);

    impl SwitchOutputPort for Outputs {
        fn set_output(&mut self, id: SwitchId, on: bool) {
            self.0[id.index()] = Some(on);
        }
    }

    #[derive(Default)]
    struct MemStore {
        map: HashMap<(String, String), Vec<u8>>,
        fail_writes: bool,
    }

    impl StoragePort for MemStore {
        fn read(&self, ns: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
            let v = self
                .map
                .get(&(ns.to_string(), key.to_string()))
                .ok_or(StorageError::NotFound)?;
            let n = v.len().min(buf.len());
            buf[..n].copy_from_slice(&v[..n]);
            Ok(n)
        }

        fn write(&mut self, ns: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
            if self.fail_writes {
                return Err(StorageError::IoError);
            }
            self.map.insert((ns.to_string(), key.to_string()), data.to_vec());
            Ok(())
        }

        fn exists(&self, ns: &str, key: &str) -> bool {
            self.map.contains_key(&(ns.to_string(), key.to_string()))
        }

        fn erase_namespace(&mut self, ns: &str) -> Result<(), StorageError> {
            self.map.retain(|(n, _), _| n != ns);
            Ok(())
        }
    }

    fn record(store: &MemStore) -> Vec<u8> {
        store.map[&(SWITCH_NAMESPACE.to_string(), SWITCH_KEY.to_string())].clone()
    }

    #[test]
    fn switch_numbers_round_trip() {
        for id in SwitchId::ALL {
            assert_eq!(SwitchId::from_number(id.number()), Some(id));
        }
        assert_eq!(SwitchId::from_number(0), None);
        assert_eq!(SwitchId::from_number(5), None);
    }

    #[test]
    fn set_switch_writes_through() {
        let mut bank = SwitchBank::new();
        let mut hw = Outputs::default();
        let mut store = MemStore::default();
        bank.set_switch(SwitchId::Sw2, true, &mut hw, &mut store).unwrap();
        assert_eq!(hw.0[1], Some(true));
        assert_eq!(record(&store), vec![0, 1, 0, 0]);
    }

    #[test]
    fn set_all_drives_every_output() {
        let mut bank = SwitchBank::new();
        let mut hw = Outputs::default();
        let mut store = MemStore::default();
        bank.set_all(true, &mut hw, &mut store).unwrap();
        assert_eq!(hw.0, [Some(true); 4]);
        assert_eq!(record(&store), vec![1, 1, 1, 1]);
    }

    #[test]
    fn restore_treats_nonzero_as_on() {
        let mut store = MemStore::default();
        store.write(SWITCH_NAMESPACE, SWITCH_KEY, &[0, 7, 0, 1]).unwrap();
        let mut bank = SwitchBank::new();
        let mut hw = Outputs::default();
        bank.restore_all(&mut hw, &store).unwrap();
        assert_eq!(bank.states(), [false, true, false, true]);
        assert_eq!(hw.0, [Some(false), Some(true), Some(false), Some(true)]);
    }

    #[test]
    fn restore_without_record_turns_everything_off() {
        let store = MemStore::default();
        let mut bank = SwitchBank::new();
        let mut hw = Outputs::default();
        bank.restore_all(&mut hw, &store).unwrap();
        assert_eq!(hw.0, [Some(false); 4]);
    }

    #[test]
    fn restore_short_record_pads_with_off() {
        let mut store = MemStore::default();
        store.write(SWITCH_NAMESPACE, SWITCH_KEY, &[1, 1]).unwrap();
        let mut bank = SwitchBank::new();
        let mut hw = Outputs::default();
        bank.restore_all(&mut hw, &store).unwrap();
        assert_eq!(bank.states(), [true, true, false, false]);
    }

    #[test]
    fn storage_failure_still_drives_output() {
        let mut bank = SwitchBank::new();
        let mut hw = Outputs::default();
        let mut store = MemStore {
            fail_writes: true,
            ..Default::default()
        };
        let r = bank.set_switch(SwitchId::Sw4, true, &mut hw, &mut store);
        assert_eq!(r, Err(StorageError::IoError));
        assert_eq!(hw.0[3], Some(true));
        assert!(bank.state(SwitchId::Sw4));
    }
}
