//! Boolean, half-word, and test families (0400-0677).
//!
//! These lean almost entirely on the opflag plumbing: the mode variants
//! (immediate / memory / self / both, and the half-swaps) are staged
//! before dispatch, so each opcode row reduces to one expression here.

use crate::machine::Machine;
use crate::variant::Variant;
use crate::word::{FMASK, LMASK, LSIGN, RMASK, SMASK, cm};

impl<V: Variant> Machine<V> {
    /// The sixteen two-operand Boolean functions (0400-0477).
    pub(crate) fn op_boolean(&mut self) {
        self.ar = match (self.ir >> 2) & 0o17 {
            0 => 0,                               // SETZ
            1 => self.ar & self.br,               // AND
            2 => self.ar & cm(self.br),           // ANDCA
            3 => self.ar,                         // SETM
            4 => cm(self.ar) & self.br,           // ANDCM
            5 => self.br,                         // SETA
            6 => self.ar ^ self.br,               // XOR
            7 => cm(cm(self.ar) & cm(self.br)),   // IOR
            8 => cm(self.ar) & cm(self.br),       // ANDCB
            9 => cm(self.ar ^ self.br),           // EQV
            10 => cm(self.br),                    // SETCA
            11 => cm(cm(self.ar) & self.br),      // ORCA
            12 => cm(self.ar),                    // SETCM
            13 => cm(self.ar & cm(self.br)),      // ORCM
            14 => cm(self.ar & self.br),          // ORCB
            _ => FMASK,                           // SETO
        };
    }

    /// Half-word moves (0500-0577). The swapped rows arrive here with AR
    /// already exchanged, so only the keep/zero/one/extend choice is
    /// left.
    pub(crate) fn op_halfword(&mut self) {
        self.ar = match self.ir & 0o770 {
            0o500 => (self.ar & LMASK) | (self.br & RMASK),
            0o510 => self.ar & LMASK,
            0o520 => (self.ar & LMASK) | RMASK,
            0o530 => {
                let ext = if self.ar & SMASK != 0 { RMASK } else { 0 };
                (self.ar & LMASK) | ext
            }
            0o540 => (self.br & LMASK) | (self.ar & RMASK),
            0o550 => self.ar & RMASK,
            0o560 => LMASK | (self.ar & RMASK),
            _ => {
                let ext = if self.ar & LSIGN != 0 { LMASK } else { 0 };
                ext | (self.ar & RMASK)
            }
        };
    }

    /// Test family (0600-0677): mask the AC with the staged mask, skip on
    /// the selected condition, and keep the no/zero/complement/one
    /// modification.
    pub(crate) fn op_test(&mut self) {
        self.mq = match (self.ir >> 4) & 0o3 {
            0 => self.ar,                     // TxN: no modification
            1 => cm(self.ar) & self.br,       // TxZ
            2 => self.ar ^ self.br,           // TxC
            _ => self.ar | self.br,           // TxO
        };
        self.ar &= self.br;
        let skip =
            (u32::from(self.ar == 0) & ((self.ir >> 1) & 1)) ^ ((self.ir >> 2) & 1);
        if skip != 0 {
            self.pc = (self.pc + 1) & RMASK as u32;
        }
        self.ar = self.mq;
    }
}
