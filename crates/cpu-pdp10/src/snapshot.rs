//! Save states.
//!
//! A [`SaveState`] captures every architectural register plus the
//! re-entry state of the multi-part instructions, so a machine restored
//! mid byte-instruction (or with an interrupt level held) continues
//! exactly where it left off.

use serde::{Deserialize, Serialize};

use crate::machine::Machine;
use crate::variant::Variant;
use crate::word::FMASK;

/// Complete machine state, generic over the variant's MMU state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveState<M> {
    // Memory
    pub mem: Vec<u64>,
    pub fm: Vec<u64>,

    // Registers
    pub pc: u32,
    pub flags: u32,
    pub ar: u64,
    pub mq: u64,
    pub br: u64,
    pub mb: u64,
    pub ab: u32,
    pub ir: u32,
    pub ac: u32,
    pub sc: i32,
    pub fe: i32,

    // Cycle re-entry state
    pub byf5: bool,
    pub uuo_cycle: bool,
    pub load_pc: bool,
    pub inst_fetch: bool,
    pub pc_inh: bool,
    pub xct_flag: u32,

    // PI unit
    pub pir: u8,
    pub pih: u8,
    pub pie: u8,
    pub pi_enable: bool,
    pub pi_pending: bool,
    pub pi_enc: u32,
    pub pi_parity: bool,
    pub pi_cycle: bool,
    pub pi_ov: bool,
    pub pi_hold: bool,
    pub pi_restore: bool,
    pub dev_irq: Vec<u8>,

    // APR conditions and assignments
    pub push_ovf: bool,
    pub mem_prot: bool,
    pub nxm_flag: bool,
    pub clk_flg: bool,
    pub ov_irq: bool,
    pub fov_irq: bool,
    pub clk_en: bool,
    pub apr_irq: u32,
    pub clk_irq: u32,

    // Variant MMU
    pub mmu: M,
}

impl<V: Variant> Machine<V> {
    /// Capture the complete architectural state.
    #[must_use]
    pub fn save_state(&self) -> SaveState<V::Mmu> {
        SaveState {
            mem: self.mem[..self.memsize].to_vec(),
            fm: self.fm.to_vec(),
            pc: self.pc,
            flags: self.flags,
            ar: self.ar,
            mq: self.mq,
            br: self.br,
            mb: self.mb,
            ab: self.ab,
            ir: self.ir,
            ac: self.ac,
            sc: self.sc,
            fe: self.fe,
            byf5: self.byf5,
            uuo_cycle: self.uuo_cycle,
            load_pc: self.load_pc,
            inst_fetch: self.inst_fetch,
            pc_inh: self.pc_inh,
            xct_flag: self.xct_flag,
            pir: self.pi.pir,
            pih: self.pi.pih,
            pie: self.pi.pie,
            pi_enable: self.pi.enable,
            pi_pending: self.pi.pending,
            pi_enc: self.pi.enc,
            pi_parity: self.pi.parity,
            pi_cycle: self.pi_cycle,
            pi_ov: self.pi_ov,
            pi_hold: self.pi_hold,
            pi_restore: self.pi_restore,
            dev_irq: (0..128).map(|d| self.pi.dev_request(d)).collect(),
            push_ovf: self.push_ovf,
            mem_prot: self.mem_prot,
            nxm_flag: self.nxm_flag,
            clk_flg: self.clk_flg,
            ov_irq: self.ov_irq,
            fov_irq: self.fov_irq,
            clk_en: self.clk_en,
            apr_irq: self.apr_irq,
            clk_irq: self.clk_irq,
            mmu: self.mmu.clone(),
        }
    }

    /// Restore a captured state. Memory size follows the snapshot.
    pub fn restore_state(&mut self, s: &SaveState<V::Mmu>) {
        self.memsize = s.mem.len();
        self.mem = s.mem.clone();
        for (slot, &word) in self.fm.iter_mut().zip(s.fm.iter()) {
            *slot = word & FMASK;
        }
        self.pc = s.pc;
        self.flags = s.flags;
        self.ar = s.ar;
        self.mq = s.mq;
        self.br = s.br;
        self.mb = s.mb;
        self.ab = s.ab;
        self.ir = s.ir;
        self.ac = s.ac;
        self.sc = s.sc;
        self.fe = s.fe;
        self.byf5 = s.byf5;
        self.uuo_cycle = s.uuo_cycle;
        self.load_pc = s.load_pc;
        self.inst_fetch = s.inst_fetch;
        self.pc_inh = s.pc_inh;
        self.xct_flag = s.xct_flag;
        self.iflags = V::opflags(s.ir);
        self.pi.pir = s.pir;
        self.pi.pih = s.pih;
        self.pi.pie = s.pie;
        self.pi.enable = s.pi_enable;
        self.pi.enc = s.pi_enc;
        self.pi.parity = s.pi_parity;
        self.pi_cycle = s.pi_cycle;
        self.pi_ov = s.pi_ov;
        self.pi_hold = s.pi_hold;
        self.pi_restore = s.pi_restore;
        for (dev, &line) in s.dev_irq.iter().enumerate().take(128) {
            if line == 0 {
                self.pi.clr_interrupt(dev as u32);
            } else {
                self.pi.set_interrupt(dev as u32, level_of(line));
            }
        }
        self.pi.pending = s.pi_pending;
        self.push_ovf = s.push_ovf;
        self.mem_prot = s.mem_prot;
        self.nxm_flag = s.nxm_flag;
        self.clk_flg = s.clk_flg;
        self.ov_irq = s.ov_irq;
        self.fov_irq = s.fov_irq;
        self.clk_en = s.clk_en;
        self.apr_irq = s.apr_irq;
        self.clk_irq = s.clk_irq;
        self.mmu = s.mmu.clone();
    }
}

/// Level number of a request-line mask bit.
fn level_of(line: u8) -> u32 {
    for level in 1..=7u32 {
        if crate::interrupts::level_bit(level) == line {
            return level;
        }
    }
    0
}
