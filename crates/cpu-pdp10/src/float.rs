//! Floating point.
//!
//! Format: sign in bit 0, excess-128 exponent in bits 1-8, 27-bit
//! mantissa in bits 9-35. A negative number is the two's complement of
//! the whole word, so a negative operand's exponent field reads back
//! complemented.
//!
//! Single precision works in a shifted format with the mantissa moved up
//! 27 bits, leaving guard bits below for alignment and rounding. The
//! KI10 double-precision family works in a 35-bit-shifted format where
//! the host word truncates the smeared sign to bits 62-63; every exit
//! re-packs through the sign|mantissa mask, so the truncation is
//! invisible.

use crate::flags::{BYTI, FLTOVR, FLTUND, NODIV, OVR, TRP1};
use crate::machine::Machine;
use crate::variant::Variant;
use crate::word::{
    BIT8, BIT9, CMASK, FMASK, LSIGN, MMASK, PMASK, RMASK, SMASK, cm, get_expo,
    negate, shr36, smear_sign,
};

/// Sign bit of the single-precision working format.
const FP_SMASK: u64 = SMASK << 27;

/// One above the working-format mantissa: a sum that reaches it shifts
/// right once.
const FP_NMASK: u64 = 1 << 54;

/// Complement mask of the working format.
const FP_FMASK: u64 = (1 << 63) - 1;

/// Sign bit of the double-precision working format (host truncated).
const DP_SMASK: u64 = 1 << 63;

/// One above the double mantissa.
const DP_NMASK: u64 = 1 << 62;

/// Normalised bit of the double mantissa.
const DP_XMASK: u64 = 1 << 61;

impl<V: Variant> Machine<V> {
    /// FAD/FSB families (0140-0157) and UFA (0130). AR holds the memory
    /// operand, BR the AC; FSB negates the memory side first.
    pub(crate) fn op_fad_fsb(&mut self) {
        if self.ir & 0o770 == 0o150 {
            let ad = negate(self.ar) & FMASK;
            self.ar = self.br;
            self.br = ad;
        }

        // Exponent difference, with the comparison folded through the
        // operand signs so a complemented exponent field reads correctly.
        self.sc = ((self.br >> 27) & 0o777) as i32;
        let mut scad = if (self.br & SMASK) == (self.ar & SMASK) {
            self.sc + (((self.ar >> 27) & 0o777) as i32 ^ 0o777) + 1
        } else {
            self.sc + ((self.ar >> 27) & 0o777) as i32
        };
        scad &= 0o777;
        if ((self.br & SMASK) != 0) == (scad & 0o400 != 0) {
            std::mem::swap(&mut self.ar, &mut self.br);
        }
        if scad & 0o400 == 0 {
            if (self.ar & SMASK) == (self.br & SMASK) {
                scad = ((scad ^ 0o777) + 1) & 0o777;
            } else {
                scad ^= 0o777;
            }
        } else if (self.ar & SMASK) != (self.br & SMASK) {
            scad = (scad + 1) & 0o777;
        }

        self.sc = get_expo(self.ar);
        self.br = smear_sign(self.br) << 27;
        self.ar = smear_sign(self.ar) << 27;

        // Align the smaller operand, arithmetic shift with sign fill.
        if scad & 0o400 != 0 {
            let dist = 0o1000 - scad;
            if dist < 28 {
                let fill = if self.br & FP_SMASK != 0 { FP_FMASK } else { 0 };
                self.br = (self.br >> dist) | (fill << (54 - dist));
            } else {
                self.br = 0;
            }
        }

        self.ar = self.ar.wrapping_add(self.br);
        let flag1 = if self.ar & FP_SMASK != 0 {
            self.ar = (self.ar ^ FP_FMASK).wrapping_add(1);
            true
        } else {
            false
        };
        self.fnorm(flag1);
    }

    /// FMP families (0160-0167).
    pub(crate) fn op_fmp(&mut self) {
        self.sc = ((if self.br & SMASK != 0 { 0o777 } else { 0 })
            ^ (self.br >> 27) as i32)
            & 0o777;
        self.sc += ((if self.ar & SMASK != 0 { 0o777 } else { 0 })
            ^ (self.ar >> 27) as i32)
            & 0o777;
        self.sc += 0o600;
        self.sc &= 0o777;
        let mut flag1 = false;
        if self.ar & SMASK != 0 {
            self.ar = cm(self.ar).wrapping_add(1);
            flag1 = true;
        }
        if self.br & SMASK != 0 {
            self.br = cm(self.br).wrapping_add(1);
            flag1 = !flag1;
        }
        self.ar &= MMASK;
        self.br &= MMASK;
        self.ar = self.ar.wrapping_mul(self.br);
        self.fnorm(flag1);
    }

    /// FDV families (0170-0177). AR is the divisor (memory), BR the
    /// dividend (AC); MQ carries the low dividend word for FDVL.
    pub(crate) fn op_fdv(&mut self) {
        let mut flag1 = false;
        let mut fxu_hold = false;
        self.sc = (if self.br & SMASK != 0 { 0o777 } else { 0 })
            ^ (self.br >> 27) as i32;
        self.sc += (if self.ar & SMASK != 0 { 0 } else { 0o777 })
            ^ (self.ar >> 27) as i32;
        self.sc = (self.sc + 0o201) & 0o777;
        if self.ir & 0o7 == 1 {
            // FDVL: two-word dividend
            self.fe = ((if self.br & SMASK != 0 { 0o777 } else { 0 })
                ^ (self.br >> 27) as i32)
                - 26;
            if self.br & SMASK != 0 {
                self.mq = (cm(self.mq).wrapping_add(1)) & MMASK;
                self.br = cm(self.br);
                if self.mq == 0 {
                    self.br = self.br.wrapping_add(1);
                }
                flag1 = true;
            }
            self.mq &= MMASK;
        } else if self.br & SMASK != 0 {
            self.br = cm(self.br).wrapping_add(1);
            flag1 = true;
        }
        if self.ar & SMASK != 0 {
            self.ar = cm(self.ar).wrapping_add(1);
            flag1 = !flag1;
        }
        self.ar &= MMASK;
        self.br &= MMASK;

        // Dividend too large (or divisor zero): abandon the divide.
        if self.br >= (self.ar << 1) {
            self.flags |= OVR | NODIV | FLTOVR | TRP1;
            V::check_apr_irq(self);
            self.sac_inh = true;
            return;
        }
        self.br = (self.br << 27).wrapping_add(self.mq);
        self.mb = self.ar;
        if self.ir & 0o7 == 1 {
            self.ar <<= 27;
            let mut ad = 0u64;
            if self.br < self.ar {
                self.br <<= 1;
                self.sc -= 1;
            }
            for _ in 0..27 {
                ad <<= 1;
                if self.br >= self.ar {
                    self.br -= self.ar;
                    ad |= 1;
                }
                self.br <<= 1;
            }
            self.mq = self.br >> 28;
            self.ar = ad;
            self.sc += 1;
        } else {
            self.ar = self.br / self.ar;
        }

        if self.ar != 0 {
            if self.ir & 0o4 != 0 {
                self.ar += 1;
            }
            if self.ar & BIT8 != 0 {
                self.sc += 1;
                self.ar >>= 1;
            }
            if self.sc >= 0o600 {
                fxu_hold = true;
            }
            if flag1 {
                self.ar = (self.ar ^ MMASK).wrapping_add(1);
                self.ar |= SMASK;
            }
        } else if flag1 {
            self.ar = SMASK | BIT9;
            self.sc += 1;
        } else {
            self.ar = 0;
            self.sc = 0;
        }
        if self.sc & 0o400 != 0 {
            self.flags |= OVR | FLTOVR | TRP1;
            if !fxu_hold {
                self.flags |= FLTUND;
            }
            V::check_apr_irq(self);
        }
        let scad = self.sc ^ if self.ar & SMASK != 0 { 0o377 } else { 0 };
        self.ar &= SMASK | MMASK;
        self.ar |= ((scad & 0o377) as u64) << 27;
        if self.ir & 0o7 == 1 && self.mq != 0 {
            self.mq &= MMASK;
            if self.sc & 0o400 != 0 {
                self.fe -= 1;
            }
            self.fe ^= if self.ar & SMASK != 0 { 0o377 } else { 0 };
            self.mq |= ((self.fe & 0o377) as u64) << 27;
        }
    }

    /// FSC (0132): scale the exponent by E.
    pub(crate) fn op_fsc(&mut self) {
        let e = u64::from(self.ab);
        self.sc = ((if e & LSIGN != 0 { 0o400 } else { 0 }) | (e & 0o377)) as i32;
        let scad = get_expo(self.ar);
        self.sc = (scad + self.sc) & 0o777;

        let flag1 = if self.ar & SMASK != 0 {
            self.ar = cm(self.ar).wrapping_add(1);
            true
        } else {
            false
        };
        self.ar &= MMASK;
        if self.ar != 0 {
            if self.ar & 0o000_777_770_000 == 0 {
                self.sc -= 12;
                self.ar <<= 12;
            }
            if self.ar & 0o000_777_000_000 == 0 {
                self.sc -= 6;
                self.ar <<= 6;
            }
            if self.ar & 0o000_740_000_000 == 0 {
                self.sc -= 4;
                self.ar <<= 4;
            }
            if self.ar & 0o000_600_000_000 == 0 {
                self.sc -= 2;
                self.ar <<= 2;
            }
            if self.ar & 0o000_400_000_000 == 0 {
                self.sc -= 1;
                self.ar <<= 1;
            }
        } else if flag1 {
            self.ar = BIT9;
            self.sc += 1;
        }
        let mut fxu_hold = false;
        if (self.sc & 0o400 != 0) ^ (self.sc & 0o200 != 0) {
            fxu_hold = true;
        }
        if self.sc & 0o400 != 0 {
            self.flags |= OVR | FLTOVR | TRP1;
            if !fxu_hold {
                self.flags |= FLTUND;
            }
            V::check_apr_irq(self);
        }
        if flag1 {
            self.ar = SMASK | (cm(self.ar).wrapping_add(1) & MMASK);
            self.sc ^= 0o377;
        } else if self.ar == 0 {
            self.sc = 0;
        }
        self.ar |= ((self.sc & 0o377) as u64) << 27;
    }

    /// DFN (0131): negate the double-length float in AC,E in place.
    pub(crate) fn op_dfn(&mut self) {
        let mut ad = negate(self.br) & FMASK;
        self.sc = ((self.br >> 27) & 0o777) as i32;
        self.br = self.ar;
        self.ar = ad;
        ad = (cm(self.br).wrapping_add(u64::from(self.ar & MMASK == 0))) & FMASK;
        self.ar &= MMASK;
        self.ar |= ((self.sc & 0o777) as u64) << 27;
        self.br = self.ar;
        self.ar = ad;
        self.mb = self.br;
        if self.mem_write(false).is_err() {
            return;
        }
        let ar = self.ar;
        let ac = self.ac;
        V::set_reg(self, ac, ar, false);
    }

    /// Shared single-precision normalise / round / pack. UFA skips the
    /// left normalisation; the rounding forms add at the guard bit and
    /// renormalise once; the long forms pack the low word into MQ.
    fn fnorm(&mut self, mut flag1: bool) {
        let mut nrf = false;
        let mut fxu_hold = false;
        if self.ar != 0 {
            loop {
                if self.ar & FP_NMASK != 0 {
                    self.sc += 1;
                    self.ar >>= 1;
                }
                if (self.sc & 0o400 != 0) ^ (self.sc & 0o200 != 0) {
                    fxu_hold = true;
                }
                if self.ir != 0o130 {
                    for k in [27u32, 14, 9, 6, 4, 2, 1] {
                        let mask = ((1u64 << k) - 1) << (54 - k);
                        if self.ar & mask == 0 {
                            self.sc -= k as i32;
                            self.ar <<= k;
                        }
                    }
                    if !nrf && !flag1 && self.ir & 0o4 != 0 && self.ar & BIT9 != 0 {
                        self.ar += BIT8;
                        nrf = true;
                        continue;
                    }
                }
                break;
            }
            if flag1 {
                self.ar = (self.ar ^ FP_FMASK).wrapping_add(1);
            }
            self.mq = self.ar & MMASK;
            self.ar >>= 27;
            if flag1 {
                self.ar |= SMASK;
                self.mq |= SMASK;
            }
        } else if flag1 {
            self.ar = BIT9 | SMASK;
            self.mq = SMASK;
            self.sc += 1;
        } else {
            self.ar = 0;
            self.mq = 0;
            self.sc = 0;
        }
        if self.sc & 0o400 != 0 {
            self.flags |= OVR | FLTOVR | TRP1;
            if !fxu_hold {
                self.flags |= FLTUND;
            }
            V::check_apr_irq(self);
        }
        let scad = self.sc ^ if self.ar & SMASK != 0 { 0o377 } else { 0 };
        self.ar &= SMASK | MMASK;
        self.ar |= ((scad & 0o377) as u64) << 27;
        // Long forms: low-order result with its own exponent
        if self.ir & 0o7 == 1 {
            self.sc = (self.sc + (0o777 ^ 26)) & 0o777;
            if self.mq != 0 {
                self.mq &= MMASK;
                self.mq |= ((self.sc & 0o377) as u64) << 27;
            }
        }
        // UFA delivers to AC+1 and stores nothing else
        if self.ir == 0o130 {
            let ar = self.ar;
            let ac1 = (self.ac + 1) & 0o17;
            V::set_reg(self, ac1, ar, false);
        }
    }

    // === KI10 double precision (0110-0113) ===

    /// DFAD/DFSB/DFMP/DFDV; the unimplemented fixed double ops trap.
    pub(crate) fn op_dfloat(&mut self) {
        match self.ir & 0o7 {
            0 | 1 => self.op_dfad_dfsb(),
            2 => self.op_dfmp(),
            3 => self.op_dfdv(),
            _ => self.op_muuo(),
        }
    }

    /// Build the 62-bit working pair from a high word and a low word.
    fn dp_pair(high: u64, low: u64) -> u64 {
        (smear_sign(high) << 35) | (low & CMASK)
    }

    fn op_dfad_dfsb(&mut self) {
        // AR,MQ hold the AC pair; BR and the second memory word form the
        // memory pair.
        self.ab = (self.ab + 1) & RMASK as u32;
        if self.mem_read(false).is_err() {
            return;
        }
        self.sc = get_expo(self.br);
        self.br = Self::dp_pair(self.br, self.mb);
        self.fe = get_expo(self.ar);
        self.ar = Self::dp_pair(self.ar, self.mq);
        if self.ir & 0o1 != 0 {
            self.br = self.br.wrapping_neg();
        }
        let mut scad = self.sc - self.fe;
        if scad < 0 {
            std::mem::swap(&mut self.ar, &mut self.br);
            std::mem::swap(&mut self.sc, &mut self.fe);
            scad = self.sc - self.fe;
        }
        while scad > 0 {
            self.ar = (self.ar & (DP_SMASK | DP_NMASK)) | (self.ar >> 1);
            scad -= 1;
        }
        let mut ad = self.ar.wrapping_add(self.br);
        let mut flag1 = false;
        if (self.ar & DP_SMASK) != (self.br & DP_SMASK) {
            if ad & DP_SMASK != 0 {
                ad = ad.wrapping_neg();
                flag1 = true;
            }
        } else {
            if self.ar & DP_SMASK != 0 {
                ad = ad.wrapping_neg();
                flag1 = true;
            }
            if ad & DP_NMASK != 0 {
                ad = ad.wrapping_add(1);
                ad = (ad & DP_SMASK) | (ad >> 1);
                self.sc += 1;
            }
        }
        self.ar = ad;

        let mut fxu_hold = false;
        while self.ar != 0 && self.ar & DP_XMASK == 0 {
            self.ar <<= 1;
            self.sc -= 1;
            fxu_hold = true;
        }
        self.dpnorm(flag1, fxu_hold);
    }

    fn op_dfmp(&mut self) {
        self.ab = (self.ab + 1) & RMASK as u32;
        if self.mem_read(false).is_err() {
            return;
        }
        self.sc = get_expo(self.ar);
        self.ar = Self::dp_pair(self.ar, self.mq);
        self.fe = get_expo(self.br);
        self.br = Self::dp_pair(self.br, self.mb);
        let mut flag1 = false;
        if self.ar & DP_SMASK != 0 {
            self.ar = self.ar.wrapping_neg();
            flag1 = true;
        }
        if self.br & DP_SMASK != 0 {
            self.br = self.br.wrapping_neg();
            flag1 = !flag1;
        }
        self.sc = self.sc + self.fe - 0o201;
        let fxu_hold = self.sc < 0;
        let mut ad = (self.ar >> 30).wrapping_mul(self.br >> 30);
        ad = ad.wrapping_add((self.ar >> 30).wrapping_mul(self.br & PMASK) >> 30);
        ad = ad.wrapping_add((self.ar & PMASK).wrapping_mul(self.br >> 30) >> 30);
        self.ar = ad >> 1;
        if self.ar & DP_NMASK != 0 {
            self.ar >>= 1;
            self.sc += 1;
        }
        self.dpnorm(flag1, fxu_hold);
    }

    fn op_dfdv(&mut self) {
        self.ab = (self.ab + 1) & RMASK as u32;
        if self.mem_read(false).is_err() {
            return;
        }
        self.sc = get_expo(self.ar);
        self.ar = Self::dp_pair(self.ar, self.mq);
        self.fe = get_expo(self.br);
        self.br = Self::dp_pair(self.br, self.mb);
        let mut flag1 = false;
        if self.ar & DP_SMASK != 0 {
            self.ar = self.ar.wrapping_neg();
            flag1 = true;
        }
        if self.br & DP_SMASK != 0 {
            self.br = self.br.wrapping_neg();
            flag1 = !flag1;
        }
        if self.ar >= (self.br << 1) {
            self.flags |= OVR | FLTOVR | NODIV | TRP1;
            self.ar = 0;
            self.sac_inh = true;
            V::check_apr_irq(self);
            return;
        }
        if self.ar == 0 {
            self.sac_inh = true;
            return;
        }
        self.sc = self.sc - self.fe + 0o201;
        if self.ar < self.br {
            self.ar <<= 1;
            self.sc -= 1;
        }
        let fxu_hold = self.sc < 0;
        let mut ad = 0u64;
        for _ in 0..62 {
            ad <<= 1;
            if self.ar >= self.br {
                self.ar -= self.br;
                ad |= 1;
            }
            self.ar <<= 1;
        }
        self.ar = ad;
        self.dpnorm(flag1, fxu_hold);
    }

    /// Double-precision pack: split the working pair into a signed high
    /// word with exponent and a low word in MQ.
    fn dpnorm(&mut self, mut flag1: bool, fxu_hold: bool) {
        if self.ar == 0 {
            flag1 = false;
        }
        let mut arx = self.ar & CMASK;
        self.ar >>= 35;
        self.ar &= MMASK;
        if flag1 {
            arx = (arx ^ CMASK).wrapping_add(1);
            self.ar = (self.ar ^ MMASK).wrapping_add(u64::from(arx & SMASK != 0));
            arx &= CMASK;
            self.ar &= MMASK;
            self.ar |= SMASK;
        }
        if self.sc & 0o400 != 0 {
            self.flags |= OVR | FLTOVR | TRP1;
            if fxu_hold {
                self.flags |= FLTUND;
            }
            V::check_apr_irq(self);
        }
        let scad = self.sc ^ if self.ar & SMASK != 0 { 0o377 } else { 0 };
        self.ar &= SMASK | MMASK;
        if self.ar != 0 {
            self.ar |= ((scad & 0o377) as u64) << 27;
        }
        self.mq = arx;
    }

    // === KI10 double moves and conversions (0120-0127) ===

    pub(crate) fn op_dmove_fix(&mut self) {
        match self.ir & 0o7 {
            0 => {
                // DMOVE
                self.ab = (self.ab + 1) & RMASK as u32;
                if self.mem_read(false).is_err() {
                    return;
                }
                self.mq = self.mb;
            }
            1 => {
                // DMOVN
                self.ab = (self.ab + 1) & RMASK as u32;
                if self.mem_read(false).is_err() {
                    return;
                }
                self.mq = ((self.mb & CMASK) ^ CMASK).wrapping_add(1);
                self.ar =
                    (cm(self.ar).wrapping_add(u64::from(self.mq & SMASK != 0))) & FMASK;
                self.mq &= CMASK;
            }
            2 | 6 => self.op_fix(),
            4 => {
                // DMOVEM: two one-word passes chained through BYTI
                if self.flags & BYTI == 0 || self.pi_cycle {
                    self.mb = self.ar;
                    if self.mem_write(false).is_err() {
                        return;
                    }
                    if !self.pi_cycle {
                        self.flags |= BYTI;
                        self.pc_inh = true;
                        return;
                    }
                }
                if self.flags & BYTI != 0 || self.pi_cycle {
                    if !self.pi_cycle {
                        self.flags &= !BYTI;
                    }
                    self.ab = (self.ab + 1) & RMASK as u32;
                    self.mb = self.mq;
                    let _ = self.mem_write(false);
                }
            }
            5 => {
                // DMOVNM
                if self.flags & BYTI == 0 || self.pi_cycle {
                    self.ar = cm(self.ar);
                    self.br = self.ar.wrapping_add(1);
                    self.mq = ((self.mq & CMASK) ^ CMASK).wrapping_add(1);
                    if self.mq & SMASK != 0 {
                        self.ar = self.br;
                    }
                    self.ar &= FMASK;
                    self.mb = self.ar;
                    if self.mem_write(false).is_err() {
                        return;
                    }
                    if !self.pi_cycle {
                        self.flags |= BYTI;
                        self.pc_inh = true;
                        return;
                    }
                }
                if self.flags & BYTI != 0 || self.pi_cycle {
                    if !self.pi_cycle {
                        self.flags &= !BYTI;
                    }
                    self.mq = cm(self.mq).wrapping_add(1) & CMASK;
                    self.ab = (self.ab + 1) & RMASK as u32;
                    self.mb = self.mq;
                    let _ = self.mem_write(false);
                }
            }
            7 => {
                // FLTR
                let flag1 = if self.ar & SMASK != 0 {
                    self.ar = cm(self.ar).wrapping_add(1) & CMASK;
                    true
                } else {
                    false
                };
                self.ar <<= 19;
                self.sc = 163;
                self.fnorm(flag1);
            }
            _ => self.op_muuo(), // EXTEND and the rest
        }
    }

    /// FIX/FIXR: float to fixed, truncating or rounding.
    fn op_fix(&mut self) {
        self.mq = 0;
        self.sc = (((if self.ar & SMASK != 0 { 0o377 } else { 0 })
            ^ ((self.ar >> 27) & 0o377) as i32)
            + 0o600)
            & 0o777;
        let flag1 = if self.ar & SMASK != 0 {
            self.ar ^= MMASK;
            self.ar += 1;
            self.ar &= MMASK;
            true
        } else {
            self.ar &= MMASK;
            false
        };
        self.sc -= 27;
        self.sc &= 0o777;
        if self.sc < 9 {
            self.ar = (self.ar << self.sc) & FMASK;
        } else if self.sc & 0o400 != 0 {
            self.sc = 0o1000 - self.sc;
            let dist = self.sc as u32;
            self.mq = if dist < 36 { self.ar << (36 - dist) } else { 0 }
                .wrapping_sub(u64::from(flag1));
            self.ar = shr36(self.ar, dist);
            if self.ir & 0o4 != 0 && self.mq & SMASK != 0 {
                self.ar += 1;
            }
        } else if !self.pi_cycle {
            self.flags |= OVR | TRP1;
            self.sac_inh = true;
        }
        if flag1 {
            self.ar = negate(self.ar) & FMASK;
        }
    }
}
