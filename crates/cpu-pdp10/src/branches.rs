//! Jumps, the block transfer, and the stack group (0250-0267).

use crate::error::Stop;
use crate::flags::{
    BYTI, CRY0, CRY1, FLTOVR, FLTUND, NODIV, OVR, PUBLIC, TRP1, TRP2, USER, USERIO,
};
use crate::machine::Machine;
use crate::variant::Variant;
use crate::word::{C1, FMASK, RMASK, cm};

/// Flag bits a subroutine call clears in the saved context.
const CALL_CLEARS: u32 = BYTI | FLTUND | NODIV | TRP1;

impl<V: Variant> Machine<V> {
    pub(crate) fn op_branch(&mut self) {
        match self.ir & 0o7 {
            0o0 => {
                // EXCH: BR (the AC via FAC) goes back to the AC; AR (the
                // fetched word) returns through the FCEPSE writeback.
                let br = self.br;
                let ac = self.ac;
                V::set_reg(self, ac, br, false);
            }
            0o1 => self.op_blt(),
            0o2 => {
                // AOBJP
                self.ar = V::aob(self.ar);
                if self.ar & crate::word::SMASK == 0 {
                    self.pc = self.ab;
                    self.pc_inh = true;
                }
                self.ar &= FMASK;
            }
            0o3 => {
                // AOBJN
                self.ar = V::aob(self.ar);
                if self.ar & crate::word::SMASK != 0 {
                    self.pc = self.ab;
                    self.pc_inh = true;
                }
                self.ar &= FMASK;
            }
            0o4 => self.op_jrst(),
            0o5 => {
                // JFCL: test and clear the selected flag bits
                if (self.flags >> 9) & self.ac != 0 {
                    self.pc = (self.ar & RMASK) as u32;
                    self.pc_inh = true;
                }
                self.flags &= 0o17777 ^ (self.ac << 9);
            }
            0o6 => {
                // XCT: run the addressed word as the current instruction
                self.load_pc = false;
                self.pc_inh = true;
                if V::KI && self.flags & USER == 0 {
                    self.xct_flag = self.ac;
                }
                self.count_xct();
            }
            _ => V::op_map(self),
        }
    }

    /// BLT: copy words from left-half(AC) to right-half(AC) until the
    /// destination reaches E, yielding to interrupts between words. The
    /// advancing pointer lives in the AC so a granted interrupt resumes
    /// exactly where the copy stopped.
    fn op_blt(&mut self) {
        self.br = u64::from(self.ab);
        loop {
            if self.interval <= 0 {
                self.service_events_latched();
            }
            if self.pi.enable && self.pi.pending {
                self.pi_rq = self.pi.check_irq_level();
                if self.pi_rq {
                    self.pc_inh = true;
                    self.load_pc = false;
                    self.inst_fetch = false;
                    let ar = self.ar;
                    let ac = self.ac;
                    V::set_reg(self, ac, ar, false);
                    return;
                }
            }
            self.ab = ((self.ar >> 18) & RMASK) as u32;
            if self.mem_read(false).is_err() {
                return;
            }
            self.ab = (self.ar & RMASK) as u32;
            if self.mem_write(false).is_err() {
                return;
            }
            let ad = (self.ar & RMASK)
                .wrapping_add(cm(self.br))
                .wrapping_add(1);
            self.ar = self.ar.wrapping_add(0o1_000_001);
            if ad & C1 != 0 {
                return;
            }
        }
    }

    fn op_jrst(&mut self) {
        self.pc = (self.ar & RMASK) as u32;
        if self.uuo_cycle || self.pi_cycle {
            self.flags &= !USER;
        }
        // JEN: dismiss the held interrupt level
        if self.ac & 0o10 != 0 {
            if self.flags & (USER | USERIO) == USER {
                self.jrst_uuo();
                return;
            }
            self.pi_restore = true;
        }
        // HALT
        if self.ac & 0o4 != 0 {
            if self.flags & (USER | USERIO) == USER {
                self.jrst_uuo();
                return;
            }
            self.pending_stop = Some(Stop::Halt);
        }
        // JRSTF: restore flags from the left half of the last word the
        // effective-address chain touched
        if self.ac & 0o2 != 0 {
            self.flags &= !(OVR | NODIV | FLTUND | BYTI | FLTOVR | CRY1 | CRY0);
            let restored = (self.ar >> 23) as u32;
            // Only the executive may set USER and USERIO; anyone may
            // clear USERIO.
            if self.flags & USER == 0 {
                self.flags |= restored & (USER | USERIO);
            }
            if restored & USERIO == 0 {
                self.flags &= !USERIO;
            }
            self.flags |= restored & (OVR | NODIV | FLTUND | BYTI | FLTOVR | CRY1 | CRY0);
            V::check_apr_irq(self);
        }
        // Enter user mode
        if self.ac & 0o1 != 0 {
            self.flags |= USER;
            if V::KI {
                self.flags &= !PUBLIC;
            }
        }
        self.pc_inh = true;
    }

    pub(crate) fn op_stack_jump(&mut self) {
        match self.ir & 0o7 {
            0o0 => {
                // PUSHJ
                self.br = u64::from(self.ab);
                self.ar = V::aob(self.ar);
                self.ab = (self.ar & RMASK) as u32;
                if self.ar & C1 != 0 {
                    self.push_ovf = true;
                    if V::KI {
                        self.flags |= TRP2;
                    }
                    V::check_apr_irq(self);
                }
                self.ar &= FMASK;
                self.mb = (u64::from(self.flags) << 23)
                    | u64::from((self.pc + u32::from(!self.pi_cycle)) & RMASK as u32);
                self.flags &= !CALL_CLEARS;
                if self.uuo_cycle || self.pi_cycle {
                    self.flags &= !USER;
                }
                let priv_ = self.uuo_cycle || self.pi_cycle;
                let _ = self.mem_write(priv_);
                self.pc = (self.br & RMASK) as u32;
                self.pc_inh = true;
            }
            0o1 => {
                // PUSH
                self.ar = V::aob(self.ar);
                self.ab = (self.ar & RMASK) as u32;
                if self.ar & C1 != 0 {
                    self.push_ovf = true;
                    if V::KI {
                        self.flags |= TRP2;
                    }
                    V::check_apr_irq(self);
                }
                self.ar &= FMASK;
                self.mb = self.br;
                let _ = self.mem_write(false);
            }
            0o2 => {
                // POP
                self.ab = (self.ar & RMASK) as u32;
                if self.mem_read(false).is_err() {
                    return;
                }
                self.ar = V::sob(self.ar);
                self.ab = (self.br & RMASK) as u32;
                if self.mem_write(false).is_err() {
                    return;
                }
                if self.ar & C1 == 0 {
                    self.push_ovf = true;
                    if V::KI {
                        self.flags |= TRP2;
                    }
                    V::check_apr_irq(self);
                }
                self.ar &= FMASK;
            }
            0o3 => {
                // POPJ
                self.ab = (self.ar & RMASK) as u32;
                if self.mem_read(false).is_err() {
                    return;
                }
                self.pc = (self.mb & RMASK) as u32;
                self.ar = V::sob(self.ar);
                if self.ar & C1 == 0 {
                    self.push_ovf = true;
                    if V::KI {
                        self.flags |= TRP2;
                    }
                    V::check_apr_irq(self);
                }
                self.ar &= FMASK;
                self.pc_inh = true;
            }
            0o4 => {
                // JSR: save flags,,PC at E, continue at E+1
                let ad = (u64::from(self.flags) << 23)
                    | u64::from((self.pc + u32::from(!self.pi_cycle)) & RMASK as u32);
                self.flags &= !CALL_CLEARS;
                if self.uuo_cycle || self.pi_cycle {
                    self.flags &= !USER;
                }
                self.pc = ((self.ar as u32).wrapping_add(u32::from(self.pi_cycle)))
                    & RMASK as u32;
                self.ar = ad;
            }
            0o5 => {
                // JSP: save flags,,PC in the AC, jump to E
                let ad = (u64::from(self.flags) << 23)
                    | u64::from((self.pc + u32::from(!self.pi_cycle)) & RMASK as u32);
                self.flags &= !CALL_CLEARS;
                if self.uuo_cycle || self.pi_cycle {
                    self.flags &= !USER;
                }
                self.pc = (self.ar & RMASK) as u32;
                self.ar = ad;
                self.pc_inh = true;
            }
            0o6 => {
                // JSA: save the AC at E, AC gets E,,PC+1, continue at E+1
                let word = (self.ar << 18) | u64::from((self.pc + 1) & RMASK as u32);
                let ac = self.ac;
                V::set_reg(self, ac, word, false);
                if self.uuo_cycle || self.pi_cycle {
                    self.flags &= !USER;
                }
                self.pc = (self.ar & RMASK) as u32;
                self.ar = self.br;
            }
            _ => {
                // JRA: restore the AC from the address in its left half,
                // jump to E
                let ad = self.ab;
                self.ab = ((V::get_reg(self, self.ac) >> 18) & RMASK) as u32;
                let priv_ = self.uuo_cycle || self.pi_cycle;
                if self.mem_read(priv_).is_err() {
                    return;
                }
                let mb = self.mb;
                let ac = self.ac;
                V::set_reg(self, ac, mb, false);
                self.pc = ad & RMASK as u32;
                self.pc_inh = true;
            }
        }
    }
}
