//! Shift and rotate instructions (0240-0247), including JFFO.
//!
//! The count is the effective address taken as a signed 18-bit number;
//! negative counts shift right. ASH variants sign-extend and flag
//! overflow when discarded bits disagree with the sign; the combined
//! forms treat AR,MQ as one 70-bit register with the sign carried only
//! in AR.

use crate::flags::OVR;
use crate::machine::Machine;
use crate::variant::Variant;
use crate::word::{CMASK, FMASK, LSIGN, SMASK, ash_overflows, nlzero, shl36, shr36};

impl<V: Variant> Machine<V> {
    pub(crate) fn op_shift(&mut self) {
        self.br = u64::from(self.ab);
        let e = u64::from(self.ab);
        let neg = e & LSIGN != 0;
        match self.ir & 0o7 {
            0o0 => {
                // ASH
                let sc = (if neg { (0o377 ^ e) + 1 } else { e } & 0o377) as u32;
                if sc == 0 {
                    return;
                }
                let fill = if self.ar & SMASK != 0 { FMASK } else { 0 };
                if neg {
                    self.ar = if sc < 35 {
                        ((self.ar >> sc) | (fill << (36 - sc))) & FMASK
                    } else {
                        fill
                    };
                } else {
                    if ash_overflows(self.ar, fill, sc) {
                        self.flags |= OVR;
                        V::check_apr_irq(self);
                    }
                    self.ar = (shl36(self.ar, sc) & CMASK) | (self.ar & SMASK);
                }
            }
            0o1 => {
                // ROT
                let sc = rot_count::<V>(e, neg);
                if sc == 0 {
                    return;
                }
                let mut sc = sc % 36;
                if neg {
                    sc = 36 - sc;
                }
                if sc != 0 {
                    self.ar = ((self.ar << sc) | (self.ar >> (36 - sc))) & FMASK;
                }
            }
            0o2 => {
                // LSH: nine-bit count. The eight-bit complement of a
                // negative field leaves bit 8 standing, so a negative
                // count is always at least 256 and every bit leaves the
                // register.
                let sc = ((if neg { (0o377 ^ e) + 1 } else { e }) & 0o777) as u32;
                if sc == 0 {
                    return;
                }
                self.ar = if neg {
                    shr36(self.ar, sc)
                } else {
                    shl36(self.ar, sc) & FMASK
                };
            }
            0o3 => {
                // JFFO
                let mut sc = 0;
                if self.ar != 0 {
                    self.pc = self.ab;
                    self.pc_inh = true;
                    sc = nlzero(self.ar);
                }
                let ac1 = (self.ac + 1) & 0o17;
                V::set_reg(self, ac1, u64::from(sc), false);
            }
            0o4 => {
                // ASHC
                let mut sc = (if neg { (0o377 ^ e) + 1 } else { e } & 0o377) as u32;
                if sc == 0 {
                    return;
                }
                if sc > 70 {
                    sc = 70;
                }
                let fill = if self.ar & SMASK != 0 { FMASK } else { 0 };
                self.ar &= CMASK;
                self.mq &= CMASK;
                if neg {
                    if sc >= 35 {
                        self.mq =
                            (shr36(self.ar, sc - 35) | shl36(fill, 70 - sc)) & FMASK;
                        self.ar = fill;
                    } else {
                        self.mq = (fill & SMASK)
                            | (self.mq >> sc)
                            | ((self.ar << (35 - sc)) & CMASK);
                        self.ar = (fill & SMASK)
                            | (((self.ar >> sc) | (fill << (35 - sc))) & FMASK);
                    }
                } else if sc >= 35 {
                    if ash_overflows(self.ar, fill, sc) {
                        self.flags |= OVR;
                        V::check_apr_irq(self);
                    }
                    self.ar = (fill & SMASK) | (shl36(self.ar, sc - 35) & CMASK);
                    self.mq = fill & SMASK;
                } else {
                    if ((fill & CMASK) << sc) & !CMASK != (self.ar << sc) & !CMASK {
                        self.flags |= OVR;
                        V::check_apr_irq(self);
                    }
                    self.ar =
                        (fill & SMASK) | ((self.ar << sc) & CMASK) | (self.mq >> (35 - sc));
                    self.mq = (fill & SMASK) | ((self.mq << sc) & CMASK);
                }
            }
            0o5 => {
                // ROTC
                let sc = rotc_count::<V>(e, neg);
                if sc == 0 {
                    return;
                }
                let mut sc = sc % 72;
                if neg {
                    sc = 72 - sc;
                }
                if sc >= 36 {
                    std::mem::swap(&mut self.ar, &mut self.mq);
                    sc -= 36;
                }
                if sc != 0 {
                    let ad = ((self.ar << sc) | (self.mq >> (36 - sc))) & FMASK;
                    self.mq = ((self.mq << sc) | (self.ar >> (36 - sc))) & FMASK;
                    self.ar = ad;
                }
            }
            0o6 => {
                // LSHC
                let sc = (if neg { (0o377 ^ e) + 1 } else { e } & 0o377) as u32;
                if sc == 0 {
                    return;
                }
                if sc > 71 {
                    self.ar = 0;
                    self.mq = 0;
                    return;
                }
                let mut sc = sc;
                if sc > 36 {
                    if neg {
                        self.ar = self.mq;
                        self.mq = 0;
                    } else {
                        self.mq = self.ar;
                        self.ar = 0;
                    }
                    sc -= 36;
                }
                if neg {
                    self.mq = (shr36(self.mq, sc) | shl36(self.ar, 36 - sc)) & FMASK;
                    self.ar = shr36(self.ar, sc);
                } else {
                    self.ar = (shl36(self.ar, sc) | shr36(self.mq, 36 - sc)) & FMASK;
                    self.mq = shl36(self.mq, sc) & FMASK;
                }
            }
            _ => self.op_unassigned(),
        }
    }
}

/// ROT count decode: eight bits on the KA10.
fn rot_count<V: Variant>(e: u64, neg: bool) -> u32 {
    if V::KI {
        ki_rot_count(e, neg)
    } else {
        (if neg { (0o377 ^ e) + 1 } else { e } & 0o377) as u32
    }
}

/// ROTC count decode: nine bits on the KA10, twice ROT's range.
fn rotc_count<V: Variant>(e: u64, neg: bool) -> u32 {
    if V::KI {
        ki_rot_count(e, neg)
    } else {
        (if neg { (0o777 ^ e) + 1 } else { e } & 0o777) as u32
    }
}

/// The KI10 decode, shared by ROT and ROTC: a negative count with a zero
/// low byte maps to a full 256.
fn ki_rot_count(e: u64, neg: bool) -> u32 {
    if neg {
        if e & 0o377 != 0 {
            (((0o377 ^ e) + 1) & 0o377) as u32
        } else {
            0o400
        }
    } else {
        (e & 0o377) as u32
    }
}
