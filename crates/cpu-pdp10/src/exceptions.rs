//! Unimplemented-operation traps.
//!
//! Opcode 0 and the monitor UUOs run privileged (the vector instruction
//! executes with the user flag suppressed until it commits a jump); the
//! local UUOs 001-037 trap in the current context. The variant supplies
//! the vector sequence itself: location 40/41 on the KA10, the process
//! table on the KI10.

use crate::machine::Machine;
use crate::variant::{Variant, enter_uuo};

impl<V: Variant> Machine<V> {
    /// Opcodes 000-037.
    pub(crate) fn op_luuo(&mut self) {
        if self.ir == 0 {
            self.uuo_cycle = true;
        }
        self.pc_inh = true;
        enter_uuo(self);
    }

    /// Opcodes 040-077 and anything else routed to the monitor.
    pub(crate) fn op_muuo(&mut self) {
        self.uuo_cycle = true;
        self.pc_inh = true;
        enter_uuo(self);
    }

    /// Unassigned opcode groups (100-127 on the KA10, the gaps on the
    /// KI10).
    pub(crate) fn op_unassigned(&mut self) {
        if self.pi_cycle {
            self.pending_stop = Some(crate::error::Stop::InterruptInstruction);
            return;
        }
        V::unassigned(self);
    }

    /// JRST's user-mode HALT/JEN forms trap through the UUO word without
    /// touching the PC-advance state.
    pub(crate) fn jrst_uuo(&mut self) {
        enter_uuo(self);
    }
}
