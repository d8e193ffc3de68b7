//! Instruction-accurate PDP-10 CPU core.
//!
//! Implements the KA10 (1968) and KI10 (1972) central processors: 36-bit
//! two's-complement arithmetic, the nine-bit opcode set driven by a
//! per-opcode operand-flag table, recursive effective-address resolution,
//! the seven-level priority interrupt system, and the variant memory
//! management (two-segment protection on the KA10, demand paging on the
//! KI10).
//!
//! The variant is a type parameter, chosen at build time:
//!
//! ```
//! use cpu_pdp10::Ka10Machine;
//!
//! let mut m = Ka10Machine::new();
//! m.deposit(0o100, 0o254200_000100).unwrap(); // JRST 4, (halt)
//! m.set_pc(0o100);
//! assert_eq!(m.run(), cpu_pdp10::Stop::Halt);
//! ```
//!
//! Devices attach to the programmed I/O bus through [`IoDevice`]; the
//! host clock drives [`Machine::rtc_tick`] or posts [`HostEvent`]s.

pub mod bus;
pub mod error;
pub mod flags;
pub mod history;
pub mod interrupts;
pub mod machine;
pub mod opflags;
pub mod variant;
pub mod word;

mod arith;
mod branches;
mod byteops;
mod ea;
mod exceptions;
mod execute;
mod float;
mod iot;
mod logic;
mod shifts;

#[cfg(feature = "snapshot")]
pub mod snapshot;

pub use bus::{DeviceError, IoBus, IoDevice, IoOp};
pub use error::{ConfigError, NonExistentMemory, Stop};
pub use history::HistoryEntry;
pub use interrupts::PiSystem;
pub use machine::{HostEvent, Machine};
pub use opflags::OpFlags;
pub use variant::{Ka10, KaProtection, Ki10, KiPager, Variant};

/// A KA10 processor.
pub type Ka10Machine = Machine<Ka10>;

/// A KI10 processor.
pub type Ki10Machine = Machine<Ki10>;
