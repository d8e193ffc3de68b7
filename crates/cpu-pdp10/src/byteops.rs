//! Byte-pointer instructions (0133-0137).
//!
//! A byte pointer carries the position (bits to the right of the byte) in
//! bits 0-5, the size in bits 6-11, and a normal I/X/Y address part.
//! Incrementing subtracts the size from the position; when it goes
//! negative the position resets to 36 - size and the word address
//! advances.
//!
//! Load and deposit run in two phases. The first fetches the pointer,
//! stages the shift count and mask, and latches BYTI/BYF5; the next pass
//! through the cycle re-enters the standard effective-address loop with
//! the pointer word in MB, so the pointer's own indirection and indexing
//! resolve exactly like an instruction's. An interrupt between the
//! phases restarts at the second phase with the increment already done.

use crate::flags::BYTI;
use crate::machine::Machine;
use crate::variant::Variant;
use crate::word::{FMASK, LMASK, PMASK, RMASK, cm};

impl<V: Variant> Machine<V> {
    /// The 0130 group: UFA/DFN/FSC share the row with the byte ops.
    pub(crate) fn op_byte_group(&mut self) {
        match self.ir & 0o7 {
            0 => self.op_fad_fsb(), // UFA
            1 => self.op_dfn(),
            2 => self.op_fsc(),
            op => {
                // 3 IBP, 4 ILDB, 6 IDPB: increment first, once
                if matches!(op, 3 | 4 | 6) && self.flags & BYTI == 0 {
                    let size = (self.ar >> 24) & 0o77;
                    let scad =
                        (((self.ar >> 30) & 0o77) + (0o777 ^ size) + 1) & 0o777;
                    let pos = if scad & 0o400 != 0 {
                        // Wrapped: fresh word, position 36 - size
                        if V::KI {
                            self.ar = (self.ar & LMASK)
                                | (self.ar.wrapping_add(1) & RMASK);
                        } else {
                            self.ar = self.ar.wrapping_add(1) & FMASK;
                        }
                        ((0o777 ^ size) + 0o44 + 1) & 0o777
                    } else {
                        scad
                    };
                    self.ar &= PMASK;
                    self.ar |= (pos & 0o77) << 30;
                    if self.ir & 0o4 == 0 {
                        // IBP: the updated pointer goes back via FCEPSE
                        return;
                    }
                }
                self.op_byte_transfer();
            }
        }
    }

    /// LDB/DPB second stage, shared with ILDB/IDPB.
    fn op_byte_transfer(&mut self) {
        if self.flags & BYTI == 0 || !self.byf5 {
            // First phase: stage shift count and byte mask, suspend.
            self.sc = ((self.ar >> 30) & 0o77) as i32;
            self.mq = (1u64 << ((self.ar >> 24) & 0o77)) - 1;
            self.sc = ((0o777 ^ self.sc) + 1) & 0o777;
            self.load_pc = false;
            self.inst_fetch = false;
            self.pc_inh = true;
            self.flags |= BYTI;
            self.byf5 = true;
            return;
        }
        if self.ir & 0o6 == 4 {
            // ILDB/LDB: shift the byte down, mask, store to the AC
            self.ar = self.mb;
            while self.sc != 0 {
                self.ar >>= 1;
                self.sc = (self.sc + 1) & 0o777;
            }
            self.ar &= self.mq;
            let ar = self.ar;
            let ac = self.ac;
            V::set_reg(self, ac, ar, false);
        } else {
            // IDPB/DPB: shift the AC byte up, merge under the mask
            self.br = self.mb;
            self.ar = V::get_reg(self, self.ac) & self.mq;
            while self.sc != 0 {
                self.ar <<= 1;
                self.mq <<= 1;
                self.sc = (self.sc + 1) & 0o777;
            }
            self.br &= cm(self.mq);
            self.ar &= FMASK;
            self.br |= self.ar & self.mq;
            self.mb = self.br;
            let _ = self.mem_write(false);
        }
        self.flags &= !BYTI;
        self.byf5 = false;
    }
}
