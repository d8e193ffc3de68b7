//! IOT family (0700-0777): device decode, block transfers, and the PI
//! pseudo device.
//!
//! Bits 3-9 of the instruction carry the device number; the AC field
//! selects the sub-function. BLKI/BLKO advance a count,,address pointer
//! and then perform the corresponding data transfer on the pointed-to
//! word; exhaustion in an interrupt cycle redirects to the +1 vector.

use crate::bus::IoOp;
use crate::error::Stop;
use crate::flags::{USER, USERIO};
use crate::machine::Machine;
use crate::variant::Variant;
use crate::word::{C1, FMASK, RMASK};

impl<V: Variant> Machine<V> {
    pub(crate) fn op_iot(&mut self) {
        if self.flags & (USER | USERIO) == USER && !self.pi_cycle {
            // User mode without the in-out privilege
            self.op_muuo();
            return;
        }
        let d = ((self.ir & 0o77) << 1) | u32::from(self.ac & 0o10 != 0);
        match self.ac & 0o7 {
            0 | 2 => {
                // BLKI/BLKO: bump the pointer, then transfer through it
                if self.mem_read(self.pi_cycle).is_err() {
                    return;
                }
                self.ar = self.mb;
                let operand = self.ar;
                self.hist.update(|e| e.operand = operand);
                self.ac |= 1;
                self.ar = V::aob(self.ar);
                if self.ar & C1 != 0 {
                    self.pi_ov = true;
                } else if !self.pi_cycle {
                    self.pc = (self.pc + 1) & RMASK as u32;
                }
                self.ar &= FMASK;
                self.mb = self.ar;
                if self.mem_write(self.pi_cycle).is_err() {
                    return;
                }
                self.ab = (self.ar & RMASK) as u32;
                if self.ac & 0o7 == 1 {
                    self.io_datai(d);
                } else {
                    self.io_datao(d);
                }
            }
            1 => self.io_datai(d),
            3 => self.io_datao(d),
            4 => {
                // CONO: conditions from the effective address
                let mut word = self.ar;
                self.dev_io(d, IoOp::Cono, &mut word);
            }
            5 => {
                // CONI: conditions into M[E]
                let mut word = self.ar;
                self.dev_io(d, IoOp::Coni, &mut word);
                self.ar = word;
                self.mb = self.ar;
                let _ = self.mem_write(self.pi_cycle);
            }
            6 => {
                // CONSZ: skip when the masked conditions are zero
                let mut word = self.ar;
                self.dev_io(d, IoOp::Coni, &mut word);
                self.ar = word & u64::from(self.ab);
                if self.ar == 0 {
                    self.pc = (self.pc + 1) & RMASK as u32;
                }
            }
            _ => {
                // CONSO: skip when any masked condition is set
                let mut word = self.ar;
                self.dev_io(d, IoOp::Coni, &mut word);
                self.ar = word & u64::from(self.ab);
                if self.ar != 0 {
                    self.pc = (self.pc + 1) & RMASK as u32;
                }
            }
        }
    }

    fn io_datai(&mut self, d: u32) {
        let mut word = self.ar;
        self.dev_io(d, IoOp::Datai, &mut word);
        self.ar = word;
        self.mb = self.ar;
        let _ = self.mem_write(self.pi_cycle);
    }

    fn io_datao(&mut self, d: u32) {
        if self.mem_read(self.pi_cycle).is_err() {
            return;
        }
        self.ar = self.mb;
        let mut word = self.ar;
        self.dev_io(d, IoOp::Datao, &mut word);
    }

    /// Route a transfer to the processor pseudo devices or the bus.
    fn dev_io(&mut self, d: u32, op: IoOp, data: &mut u64) {
        match d {
            0 => V::apr_io(self, op, data),
            1 => self.pi_io(op, data),
            2 if V::KI => V::pager_io(self, op, data),
            _ => {
                if self.external_io(d, op, data).is_err() {
                    self.pending_stop = Some(Stop::IoError);
                }
            }
        }
    }

    /// The priority-interrupt pseudo device (device 1).
    fn pi_io(&mut self, op: IoOp, data: &mut u64) {
        match op {
            IoOp::Cono => {
                let res = *data;
                if res & 0o10000 != 0 {
                    self.pi.pir = 0;
                    self.pi.pih = 0;
                    self.pi.pie = 0;
                    self.pi.enable = false;
                    self.pi.parity = false;
                }
                if res & 0o200 != 0 {
                    self.pi.enable = true;
                }
                if res & 0o400 != 0 {
                    self.pi.enable = false;
                }
                if res & 0o1000 != 0 {
                    self.pi.pie &= !((res & 0o177) as u8);
                }
                if res & 0o2000 != 0 {
                    self.pi.pie |= (res & 0o177) as u8;
                }
                if res & 0o4000 != 0 {
                    self.pi.pir |= (res & 0o177) as u8;
                    self.pi.pending = true;
                }
                if res & 0o40000 != 0 {
                    self.pi.parity = true;
                }
                if res & 0o100000 != 0 {
                    self.pi.parity = false;
                }
            }
            IoOp::Coni => {
                let mut res = u64::from(self.pi.pie);
                res |= u64::from(self.pi.enable) << 7;
                res |= u64::from(self.pi.pih) << 8;
                if V::KI {
                    res |= u64::from(self.pi.pir) << 18;
                }
                res |= u64::from(self.pi.parity) << 15;
                *data = res;
            }
            IoOp::Datao | IoOp::Datai => {
                // Console lights on the real machine.
            }
        }
    }
}
