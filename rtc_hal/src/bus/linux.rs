//! Linux i2c-dev bus.
//!
//! Every `embedded-hal` transaction becomes one `I2C_RDWR` ioctl, so
//! write-then-read sequences use a repeated start instead of a stop.

use super::BusError;
use embedded_hal::i2c::{self, I2c, Operation};
use nix::errno::Errno;
use std::fs::{File, OpenOptions};
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};
use tracing::debug;

// linux/i2c-dev.h, linux/i2c.h
const I2C_RDWR: u32 = 0x0707;
const I2C_M_RD: u16 = 0x0001;
const I2C_RDWR_IOCTL_MAX_MSGS: usize = 42;

#[repr(C)]
struct I2cMsg {
    addr: u16,
    flags: u16,
    len: u16,
    buf: *mut u8,
}

#[repr(C)]
struct I2cRdwrIoctlData {
    msgs: *mut I2cMsg,
    nmsgs: u32,
}

mod ioctl {
    use super::{I2C_RDWR, I2cRdwrIoctlData};

    nix::ioctl_write_ptr_bad!(i2c_rdwr, I2C_RDWR, I2cRdwrIoctlData);
}

/// An opened `/dev/i2c-N` adapter.
#[derive(Debug)]
pub struct LinuxI2cBus {
    path: PathBuf,
    file: File,
}

impl LinuxI2cBus {
    /// Open the adapter at `path` for reading and writing.
    pub fn open(path: &Path) -> Result<Self, BusError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| BusError::Open {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        debug!("Opened I2C bus {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Device path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl i2c::ErrorType for LinuxI2cBus {
    type Error = BusError;
}

impl I2c for LinuxI2cBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if operations.is_empty() {
            return Ok(());
        }
        if operations.len() > I2C_RDWR_IOCTL_MAX_MSGS {
            return Err(BusError::Transfer(format!(
                "{} operations exceed the i2c-dev limit of {I2C_RDWR_IOCTL_MAX_MSGS}",
                operations.len()
            )));
        }

        let mut msgs = Vec::with_capacity(operations.len());
        for operation in operations.iter_mut() {
            let (flags, len, buf) = match operation {
                Operation::Read(buf) => (I2C_M_RD, buf.len(), buf.as_mut_ptr()),
                Operation::Write(buf) => (0, buf.len(), buf.as_ptr().cast_mut()),
            };
            let len = u16::try_from(len).map_err(|_| {
                BusError::Transfer(format!("{len} byte transfer exceeds the i2c-dev limit"))
            })?;
            msgs.push(I2cMsg {
                addr: u16::from(address),
                flags,
                len,
                buf,
            });
        }

        let data = I2cRdwrIoctlData {
            msgs: msgs.as_mut_ptr(),
            nmsgs: msgs.len() as u32,
        };

        // SAFETY: every message points into a buffer borrowed from
        // `operations`, which outlives the ioctl. Write buffers are only
        // read by the kernel.
        match unsafe { ioctl::i2c_rdwr(self.file.as_raw_fd(), &data) } {
            Ok(_) => Ok(()),
            Err(Errno::ENXIO | Errno::EREMOTEIO) => Err(BusError::NoAcknowledge(address)),
            Err(errno) => Err(BusError::Transfer(format!(
                "{}: {errno}",
                self.path.display()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_missing_adapter_fails() {
        let err = LinuxI2cBus::open(Path::new("/nonexistent/i2c-99")).unwrap_err();
        assert!(matches!(err, BusError::Open { ref path, .. } if path == "/nonexistent/i2c-99"));
    }

    #[test]
    fn empty_transaction_is_a_no_op() {
        let file = tempfile::tempfile().unwrap();
        let mut bus = LinuxI2cBus {
            path: PathBuf::from("/tmp/fake"),
            file,
        };
        assert!(bus.transaction(0x64, &mut []).is_ok());
        assert_eq!(bus.path(), Path::new("/tmp/fake"));
    }
}
