//! Effective-address resolution.
//!
//! Indexing adds the index register into the address field; indirection
//! replaces the instruction word with the addressed word and starts over.
//! The chain is unbounded in the hardware, so the loop polls for granted
//! interrupts and services host events between hops; a granted interrupt
//! abandons the calculation and the vector is taken instead.

use crate::error::Stop;
use crate::machine::Machine;
use crate::variant::Variant;
use crate::word::{FMASK, RMASK};

impl<V: Variant> Machine<V> {
    /// Resolve MB's indirect/index/address fields into AB. Sets `pi_rq`
    /// when an interrupt was granted mid-chain.
    pub(crate) fn resolve_ea(&mut self) -> Result<(), Stop> {
        let mut depth = 0u32;
        loop {
            if self.pi.enable && !self.pi_cycle && self.pi.pending {
                self.pi_rq = self.pi.check_irq_level();
            }
            let ind = self.mb & 0o20_000_000 != 0;
            self.ar = self.mb;
            self.ab = (self.mb & RMASK) as u32;
            if self.mb & 0o17_000_000 != 0 {
                let idx = ((self.mb >> 18) & 0o17) as u32;
                let x = V::get_reg(self, idx);
                self.mb = (u64::from(self.ab).wrapping_add(x)) & FMASK;
                self.ar = self.mb;
                self.ab = (self.mb & RMASK) as u32;
            }
            // JRST keeps the whole word in AR for its flag restore.
            if self.ir != 0o254 {
                self.ar &= RMASK;
            }
            let chase = ind && !self.pi_rq;
            if chase {
                let _ = self.mem_read(self.pi_cycle || self.uuo_cycle);
            }
            self.interval -= 1;
            if self.interval <= 0 {
                self.service_events()?;
            }
            if !chase {
                return Ok(());
            }
            depth += 1;
            if let Some(limit) = self.indirect_limit() {
                if depth > limit {
                    return Err(Stop::IndirectLimit);
                }
            }
        }
    }
}
