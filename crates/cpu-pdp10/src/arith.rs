//! Fixed-point arithmetic, compares, and the skip/jump condition family.
//!
//! Carry bookkeeping follows the adder: CRY1 is the carry out of the
//! magnitude into the sign, CRY0 the carry out of the sign, and overflow
//! is their disagreement.

use crate::flags::{CRY0, CRY1, NODIV, OVR, TRP1};
use crate::machine::Machine;
use crate::variant::Variant;
use crate::word::{C1, CMASK, FMASK, LMASK, RMASK, SMASK, cm};

impl<V: Variant> Machine<V> {
    /// ADD/SUB (0270-0277). AR holds the memory operand (or E), BR the
    /// AC.
    pub(crate) fn op_add_sub(&mut self) {
        self.flags &= 0o1777;
        let (cry1, sum) = if self.ir & 0o4 != 0 {
            // SUB: AC - operand
            let cry1 = (((self.ar & CMASK) ^ CMASK) + (self.br & CMASK) + 1) & SMASK != 0;
            (cry1, cm(self.ar).wrapping_add(self.br).wrapping_add(1))
        } else {
            let cry1 = ((self.ar & CMASK) + (self.br & CMASK)) & SMASK != 0;
            (cry1, self.ar.wrapping_add(self.br))
        };
        if cry1 {
            self.flags |= CRY1;
        }
        let cry0 = sum & C1 != 0;
        if cry0 {
            self.flags |= CRY0;
        }
        if cry1 != cry0 {
            self.flags |= OVR;
            V::check_apr_irq(self);
        }
        self.br = sum & FMASK;
        self.ar = self.br;
    }

    /// MOVN/MOVM (0210-0217). MOVM of a positive operand is a plain
    /// move; everything else negates with full carry bookkeeping.
    pub(crate) fn op_movn_movm(&mut self) {
        if self.ir & 0o4 != 0 && self.ar & SMASK == 0 {
            return;
        }
        self.flags &= 0o1777;
        let cry1 = (((self.ar & CMASK) ^ CMASK) + 1) & SMASK != 0;
        if cry1 {
            self.flags |= CRY1;
        }
        let ad = cm(self.ar).wrapping_add(1);
        let cry0 = ad & C1 != 0;
        if cry0 {
            self.flags |= CRY0;
        }
        if cry1 != cry0 && !self.pi_cycle {
            self.flags |= OVR | TRP1;
            V::check_apr_irq(self);
        }
        if V::KI && self.ar == SMASK && !self.pi_cycle {
            self.flags |= TRP1;
        }
        self.ar = ad & FMASK;
    }

    /// IMUL/MUL (0220-0227). AR holds the memory operand, BR the AC.
    pub(crate) fn op_mul(&mut self) {
        let mut flag3 = false;
        if self.ar & SMASK != 0 {
            self.ar = (cm(self.ar) + 1) & FMASK;
            flag3 = true;
        }
        if self.br & SMASK != 0 {
            self.br = (cm(self.br) + 1) & FMASK;
            flag3 = !flag3;
        }

        if self.ar == 0 || self.br == 0 {
            self.ar = 0;
            self.mq = 0;
            return;
        }
        if !V::KI && self.br == SMASK {
            // -2^35 survives its own negation; the product sign flips.
            flag3 = !flag3;
        }

        // 36x36 in two 18-bit pieces, product in AR:MQ (70 bits).
        self.mq = self.ar.wrapping_mul(self.br & RMASK);
        self.ar = self.ar.wrapping_mul((self.br >> 18) & RMASK);
        self.mq = self.mq.wrapping_add((self.ar << 18) & LMASK);
        self.ar >>= 18;
        self.ar = (self.ar << 1).wrapping_add(self.mq >> 35);
        self.mq &= CMASK;

        if self.ir & 0o4 == 0 {
            // IMUL: single-word product
            if self.ar > u64::from(flag3) {
                self.flags |= OVR;
                V::check_apr_irq(self);
            }
            if flag3 {
                self.mq ^= CMASK;
                self.mq += 1;
                self.mq |= SMASK;
            }
            self.ar = self.mq;
            return;
        }
        if self.ar & SMASK != 0 {
            self.flags |= OVR;
            V::check_apr_irq(self);
        }
        if flag3 {
            self.ar ^= FMASK;
            self.mq ^= CMASK;
            self.mq += 1;
            if self.mq & SMASK != 0 {
                self.ar += 1;
                self.mq &= CMASK;
            }
        }
        self.ar &= FMASK;
        self.mq = (self.mq & !SMASK) | (self.ar & SMASK);
    }

    /// IDIV/DIV (0230-0237). AR holds the AC (dividend high), BR the
    /// memory operand.
    pub(crate) fn op_div(&mut self) {
        let mut flag1 = false;
        if self.ir & 0o4 == 0 {
            // IDIV
            if self.br & SMASK != 0 {
                self.br = (cm(self.br) + 1) & FMASK;
                flag1 = !flag1;
            }
            if self.br == 0 {
                self.flags |= OVR | NODIV;
                self.sac_inh = true;
                V::check_apr_irq(self);
                return;
            }
            let mut flag3 = false;
            if self.ar & SMASK != 0 {
                self.ar = (cm(self.ar) + 1) & FMASK;
                flag1 = !flag1;
                flag3 = true;
            }
            self.mq = self.ar % self.br;
            self.ar /= self.br;
            if flag1 {
                self.ar = (cm(self.ar) + 1) & FMASK;
            }
            if flag3 {
                self.mq = (cm(self.mq) + 1) & FMASK;
            }
        } else {
            // DIV: 70-bit dividend in AC,AC+1, restoring divide
            self.mq = V::get_reg(self, (self.ac + 1) & 0o17);
            if self.ar & SMASK != 0 {
                let mut ad = (cm(self.mq) + 1) & FMASK;
                self.mq = self.ar;
                self.ar = ad;
                ad = cm(self.mq) & FMASK;
                self.mq = self.ar;
                self.ar = ad;
                if self.mq & CMASK == 0 {
                    self.ar = (self.ar + 1) & FMASK;
                }
                flag1 = true;
            }
            let mut ad = if self.br & SMASK != 0 {
                (self.ar.wrapping_add(self.br)) & FMASK
            } else {
                (self.ar.wrapping_add(cm(self.br)).wrapping_add(1)) & FMASK
            };
            self.mq = (self.mq << 1) & FMASK;
            self.mq |= u64::from(ad & SMASK != 0);
            if ad & SMASK == 0 {
                self.flags |= OVR | NODIV;
                self.sac_inh = true;
                V::check_apr_irq(self);
                return;
            }
            let mut sc = 35;
            while sc != 0 {
                ad = if (self.br & SMASK != 0) ^ (self.mq & 1 != 0) {
                    self.ar.wrapping_add(cm(self.br)).wrapping_add(1)
                } else {
                    self.ar.wrapping_add(self.br)
                };
                self.ar = ((ad << 1) | u64::from(self.mq & SMASK != 0)) & FMASK;
                self.mq = (self.mq << 1) & FMASK;
                self.mq |= u64::from(ad & SMASK == 0);
                sc -= 1;
            }
            ad = if (self.br & SMASK != 0) ^ (self.mq & 1 != 0) {
                self.ar.wrapping_add(cm(self.br)).wrapping_add(1)
            } else {
                self.ar.wrapping_add(self.br)
            };
            self.ar = ad & FMASK;
            self.mq = (self.mq << 1) & FMASK;
            self.mq |= u64::from(ad & SMASK == 0);
            if self.ar & SMASK != 0 {
                self.ar = if self.br & SMASK != 0 {
                    (self.ar.wrapping_add(cm(self.br)).wrapping_add(1)) & FMASK
                } else {
                    (self.ar.wrapping_add(self.br)) & FMASK
                };
            }

            if flag1 {
                self.ar = (cm(self.ar) + 1) & FMASK;
            }
            if flag1 ^ (self.br & SMASK != 0) {
                let ad = (cm(self.mq) + 1) & FMASK;
                self.mq = self.ar;
                self.ar = ad;
            } else {
                std::mem::swap(&mut self.ar, &mut self.mq);
            }
        }
    }

    /// CAI (0300-0307) and CAM (0310-0317): compare the AC against E or
    /// the memory operand.
    pub(crate) fn op_cam_cai(&mut self) {
        let acv = V::get_reg(self, self.ac);
        let ad = cm(self.ar).wrapping_add(acv).wrapping_add(1);
        let mut f = 0u32;
        if acv & SMASK != 0 && self.ar & SMASK == 0 {
            f = 1;
        }
        if (acv & SMASK) == (self.ar & SMASK) && ad & SMASK != 0 {
            f = 1;
        }
        self.skip_tail(f, ad);
    }

    /// JUMP (0320-0327) and SKIP (0330-0337): test the staged operand.
    pub(crate) fn op_jump_skip(&mut self) {
        let ad = self.ar;
        let f = u32::from(ad & SMASK != 0);
        self.skip_tail(f, ad);
    }

    /// AOJ/AOS/SOJ/SOS (0340-0377): add or subtract one with full carry
    /// bookkeeping, then test.
    pub(crate) fn op_incr_decr(&mut self) {
        self.flags &= 0o1777;
        let delta = if self.ir & 0o20 != 0 { FMASK } else { 1 };
        let cry1 = ((self.ar & CMASK) + (delta & CMASK)) & SMASK != 0;
        if cry1 {
            self.flags |= CRY1;
        }
        let ad = self.ar.wrapping_add(delta);
        let cry0 = ad & C1 != 0;
        if cry0 {
            self.flags |= CRY0;
        }
        if cry1 != cry0 {
            self.flags |= OVR;
            V::check_apr_irq(self);
        }
        let f = u32::from(ad & SMASK != 0);
        self.skip_tail(f, ad);
    }

    /// Shared condition tail: fold the zero test into the condition bits,
    /// mask against the opcode's condition field, and either skip or
    /// jump. In a KI10 interrupt cycle, a skip-class vector that does not
    /// skip holds the level for the +1 vector.
    fn skip_tail(&mut self, mut f: u32, ad: u64) {
        let ad = ad & FMASK;
        self.ar = ad;
        f |= u32::from(ad == 0) << 1;
        f &= self.ir;
        if (self.ir & 0o4 != 0) == (f == 0) {
            match self.ir & 0o70 {
                0o20 | 0o40 | 0o60 => {
                    self.pc = self.ab;
                    self.pc_inh = true;
                }
                _ => {
                    self.pc = (self.pc + 1) & RMASK as u32;
                }
            }
        } else if V::KI && self.pi_cycle {
            if let 0o30 | 0o50 | 0o70 = self.ir & 0o70 {
                self.pi_ov = true;
                self.pi_hold = true;
            }
        }
    }
}
