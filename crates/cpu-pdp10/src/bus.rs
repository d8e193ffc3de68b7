//! Programmed I/O bus.
//!
//! IOT instructions address one of 128 device numbers and select one of
//! four transfers: read or write the device's condition word (CONI/CONO)
//! or its data word (DATAI/DATAO). Block transfers and the condition-skip
//! forms are decode variations in the CPU; a device only ever sees the
//! four basic transfers.
//!
//! Device numbers 0 (APR) and 1 (PI) are the processor's own pseudo
//! devices; 2 is the pager on the KI10. External handlers register for
//! the rest and receive the PI unit so they can raise and drop their
//! request lines.

use crate::error::ConfigError;
use crate::interrupts::PiSystem;

/// The four bus transfers a device can be asked to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOp {
    /// Read conditions into the addressed word.
    Coni,
    /// Write conditions from the addressed word.
    Cono,
    /// Read data into the addressed word.
    Datai,
    /// Write data from the addressed word.
    Datao,
}

/// A device handler on the I/O bus.
///
/// Handlers run synchronously inside the IOT instruction, with the CPU
/// quiescent and interrupts at the invoking code's priority. Returning
/// `Err` is a hard device error and stops the simulation.
pub trait IoDevice {
    /// Handle one transfer. For CONO/DATAO, `data` carries the word from
    /// the CPU; for CONI/DATAI the handler stores the word to deliver.
    fn io(&mut self, op: IoOp, data: &mut u64, pi: &mut PiSystem) -> Result<(), DeviceError>;

    /// I/O-bus reset (CONO APR reset bit, machine reset).
    fn reset(&mut self, pi: &mut PiSystem) {
        let _ = pi;
    }
}

/// Hard device failure; surfaces as [`crate::Stop::IoError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceError;

/// The 128-entry device dispatch table.
pub struct IoBus {
    handlers: [Option<Box<dyn IoDevice>>; 128],
}

impl Default for IoBus {
    fn default() -> Self {
        IoBus {
            handlers: std::array::from_fn(|_| None),
        }
    }
}

impl IoBus {
    /// Bind a handler to a device number. The caller has already screened
    /// reserved numbers; this rejects double binding.
    pub fn register(
        &mut self,
        dev: u32,
        handler: Box<dyn IoDevice>,
    ) -> Result<(), ConfigError> {
        let slot = &mut self.handlers[(dev & 0o177) as usize];
        if slot.is_some() {
            return Err(ConfigError::DeviceInUse { dev });
        }
        *slot = Some(handler);
        Ok(())
    }

    /// Remove and return a handler.
    pub fn unregister(&mut self, dev: u32) -> Option<Box<dyn IoDevice>> {
        self.handlers[(dev & 0o177) as usize].take()
    }

    /// Perform one transfer. An unbound device number behaves as the
    /// null device: reads deliver zero, writes are dropped.
    pub fn io(
        &mut self,
        dev: u32,
        op: IoOp,
        data: &mut u64,
        pi: &mut PiSystem,
    ) -> Result<(), DeviceError> {
        match &mut self.handlers[(dev & 0o177) as usize] {
            Some(handler) => handler.io(op, data, pi),
            None => {
                if matches!(op, IoOp::Coni | IoOp::Datai) {
                    *data = 0;
                }
                Ok(())
            }
        }
    }

    /// Reset every bound handler.
    pub fn reset(&mut self, pi: &mut PiSystem) {
        for handler in self.handlers.iter_mut().flatten() {
            handler.reset(pi);
        }
    }
}

impl std::fmt::Debug for IoBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bound: Vec<usize> = self
            .handlers
            .iter()
            .enumerate()
            .filter_map(|(i, h)| h.is_some().then_some(i))
            .collect();
        f.debug_struct("IoBus").field("bound", &bound).finish()
    }
}
