//! I2C buses.
//!
//! All buses speak `embedded_hal::i2c::I2c` with [`BusError`]. Devices on
//! one bus share it through a [`SharedBus`] handle; a [`BusProvider`]
//! opens the buses named in generated code.
//!
//! - [`linux`] - `/dev/i2c-N` through the `I2C_RDWR` ioctl
//! - [`simulation`] - In-memory register files for tests and `--simulate`

pub mod linux;
pub mod simulation;

use embedded_hal::i2c::{self, ErrorKind, I2c, NoAcknowledgeSource, Operation};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

pub use linux::LinuxI2cBus;
pub use simulation::SimulatedI2cBus;

/// I2C bus errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// Addressed device did not acknowledge.
    #[error("No acknowledge from device 0x{0:02X}")]
    NoAcknowledge(u8),

    /// Bus device could not be opened.
    #[error("Failed to open I2C bus {path}: {reason}")]
    Open {
        /// Device path.
        path: String,
        /// OS error text.
        reason: String,
    },

    /// Transfer failed for another reason.
    #[error("I2C transfer failed: {0}")]
    Transfer(String),
}

impl i2c::Error for BusError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NoAcknowledge(_) => ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address),
            Self::Open { .. } | Self::Transfer(_) => ErrorKind::Other,
        }
    }
}

type DynBus = Box<dyn I2c<Error = BusError> + Send>;

/// Clonable handle to a bus shared by several devices.
///
/// Each transaction holds the bus lock for its whole duration.
#[derive(Clone)]
pub struct SharedBus {
    inner: Arc<Mutex<DynBus>>,
}

impl SharedBus {
    /// Share `bus`.
    pub fn new<B>(bus: B) -> Self
    where
        B: I2c<Error = BusError> + Send + 'static,
    {
        Self {
            inner: Arc::new(Mutex::new(Box::new(bus))),
        }
    }
}

impl std::fmt::Debug for SharedBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedBus").finish_non_exhaustive()
    }
}

impl i2c::ErrorType for SharedBus {
    type Error = BusError;
}

impl I2c for SharedBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        self.inner.lock().transaction(address, operations)
    }
}

/// Opens the buses declared in generated code.
pub trait BusProvider {
    /// Open bus `id` backed by `device`.
    fn open(&self, id: &str, device: &Path) -> Result<SharedBus, BusError>;
}

/// Opens Linux i2c-dev buses.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinuxBusProvider;

impl BusProvider for LinuxBusProvider {
    fn open(&self, id: &str, device: &Path) -> Result<SharedBus, BusError> {
        let bus = LinuxI2cBus::open(device)?;
        info!("I2C bus '{}' on {}", id, bus.path().display());
        Ok(SharedBus::new(bus))
    }
}

/// Hands out simulated buses keyed by bus id.
///
/// The same id always yields the same simulated bus, so callers can seed
/// devices before the runtime opens the bus and inspect them afterwards.
#[derive(Debug, Default)]
pub struct SimulatedBusProvider {
    buses: Mutex<BTreeMap<String, SimulatedI2cBus>>,
}

impl SimulatedBusProvider {
    /// Create a provider without buses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulated bus `id`, created on first use.
    pub fn bus(&self, id: &str) -> SimulatedI2cBus {
        self.buses.lock().entry(id.to_string()).or_default().clone()
    }
}

impl BusProvider for SimulatedBusProvider {
    fn open(&self, id: &str, _device: &Path) -> Result<SharedBus, BusError> {
        Ok(SharedBus::new(self.bus(id)))
    }
}
