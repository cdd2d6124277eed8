//! Simulated I2C bus.
//!
//! Each attached device is a 256-byte register file with an auto-
//! incrementing register pointer: a write sets the pointer from its first
//! byte and stores the rest, a read returns bytes from the pointer on.
//! Addresses without a device do not acknowledge.

use super::BusError;
use embedded_hal::i2c::{self, I2c, Operation};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

const REGISTER_FILE_SIZE: usize = 256;

#[derive(Debug, Clone)]
struct SimulatedDevice {
    registers: [u8; REGISTER_FILE_SIZE],
    pointer: u8,
}

#[derive(Debug, Default)]
struct SimulatedBusState {
    devices: BTreeMap<u8, SimulatedDevice>,
    transactions: u64,
}

/// In-memory I2C bus. Clones share the same devices.
#[derive(Debug, Clone, Default)]
pub struct SimulatedI2cBus {
    state: Arc<Mutex<SimulatedBusState>>,
}

impl SimulatedI2cBus {
    /// Create a bus without devices.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach (or replace) a device whose registers start with `image`.
    pub fn add_device(&self, address: u8, image: &[u8]) {
        let mut registers = [0u8; REGISTER_FILE_SIZE];
        let len = image.len().min(REGISTER_FILE_SIZE);
        registers[..len].copy_from_slice(&image[..len]);
        self.state.lock().devices.insert(
            address,
            SimulatedDevice {
                registers,
                pointer: 0,
            },
        );
    }

    /// Detach a device; later transfers to it are not acknowledged.
    pub fn remove_device(&self, address: u8) {
        self.state.lock().devices.remove(&address);
    }

    /// Copy `len` registers of a device starting at `start`.
    pub fn registers(&self, address: u8, start: u8, len: usize) -> Option<Vec<u8>> {
        let state = self.state.lock();
        let device = state.devices.get(&address)?;
        Some(
            (0..len)
                .map(|offset| device.registers[(usize::from(start) + offset) % REGISTER_FILE_SIZE])
                .collect(),
        )
    }

    /// Overwrite one register; returns false if no device is attached.
    pub fn set_register(&self, address: u8, register: u8, value: u8) -> bool {
        match self.state.lock().devices.get_mut(&address) {
            Some(device) => {
                device.registers[usize::from(register)] = value;
                true
            }
            None => false,
        }
    }

    /// Number of completed or attempted transactions.
    pub fn transaction_count(&self) -> u64 {
        self.state.lock().transactions
    }
}

impl i2c::ErrorType for SimulatedI2cBus {
    type Error = BusError;
}

impl I2c for SimulatedI2cBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut state = self.state.lock();
        state.transactions += 1;
        let device = state
            .devices
            .get_mut(&address)
            .ok_or(BusError::NoAcknowledge(address))?;

        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => {
                    if let Some((&register, data)) = bytes.split_first() {
                        device.pointer = register;
                        for &byte in data {
                            device.registers[usize::from(device.pointer)] = byte;
                            device.pointer = device.pointer.wrapping_add(1);
                        }
                    }
                }
                Operation::Read(buf) => {
                    for slot in buf.iter_mut() {
                        *slot = device.registers[usize::from(device.pointer)];
                        device.pointer = device.pointer.wrapping_add(1);
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_back() {
        let mut bus = SimulatedI2cBus::new();
        bus.add_device(0x64, &[]);

        bus.write(0x64, &[0x02, 1, 2, 3]).unwrap();
        let mut buf = [0u8; 4];
        bus.write_read(0x64, &[0x01], &mut buf).unwrap();
        assert_eq!(buf, [0, 1, 2, 3]);
        assert_eq!(bus.registers(0x64, 2, 3), Some(vec![1, 2, 3]));
        assert_eq!(bus.transaction_count(), 2);
    }

    #[test]
    fn missing_device_does_not_acknowledge() {
        let mut bus = SimulatedI2cBus::new();
        let mut buf = [0u8; 1];
        assert_eq!(
            bus.read(0x10, &mut buf),
            Err(BusError::NoAcknowledge(0x10))
        );

        bus.add_device(0x10, &[7]);
        assert!(bus.read(0x10, &mut buf).is_ok());
        assert_eq!(buf, [7]);

        bus.remove_device(0x10);
        assert!(bus.read(0x10, &mut buf).is_err());
    }

    #[test]
    fn register_pointer_wraps() {
        let mut bus = SimulatedI2cBus::new();
        bus.add_device(0x20, &[]);
        assert!(bus.set_register(0x20, 0x00, 0xAA));
        assert!(!bus.set_register(0x21, 0x00, 0xAA));

        bus.write(0x20, &[0xFF, 0x11, 0x22]).unwrap();
        assert_eq!(bus.registers(0x20, 0xFF, 2), Some(vec![0x11, 0x22]));
    }
}
