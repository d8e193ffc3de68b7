//! Processor variants.
//!
//! The KA10 and KI10 share the instruction set core but differ in memory
//! management (two-segment relocation vs demand paging), fast-memory
//! organisation (one block of 16 vs four selectable blocks), trap
//! vectoring, and a handful of instruction details. Each divergence is an
//! associated item here so the main loop monomorphises with no runtime
//! variant tests.

use crate::bus::IoOp;
use crate::error::Stop;
use crate::flags::{PUBLIC, TRP1, TRP2, USER, USERIO};
use crate::interrupts::{APR_DEV, CLK_DEV};
use crate::machine::Machine;
use crate::opflags::{OPFLAGS_KA, OPFLAGS_KI, OpFlags};
use crate::word::{C1, FMASK, LMASK, LSIGN, RMASK, SMASK};

/// A processor variant: the KA10 or the KI10.
pub trait Variant: Sized + 'static {
    /// Memory-management state carried by the machine.
    type Mmu: Default + Clone + std::fmt::Debug;

    /// Model name.
    const NAME: &'static str;

    /// True on the KI10; const-folded by monomorphisation.
    const KI: bool;

    /// Fast-memory registers (16, or 64 in four blocks).
    const FAST_REGS: usize;

    /// Largest configurable memory, in units of 16K words.
    const MAX_UNITS: u32;

    /// Operand-fetch flags for an opcode.
    #[must_use]
    fn opflags(ir: u32) -> OpFlags;

    /// Translate a virtual address, or record the fault and return None.
    fn page_lookup(
        m: &mut Machine<Self>,
        addr: u32,
        privileged: bool,
        write: bool,
    ) -> Option<u32>;

    /// Read a fast-memory register in the current context.
    fn get_reg(m: &mut Machine<Self>, reg: u32) -> u64;

    /// Write a fast-memory register in the current context. `from_mem` is
    /// true when the store arrives through the memory path (address < 20).
    fn set_reg(m: &mut Machine<Self>, reg: u32, value: u64, from_mem: bool);

    /// The UUO vector sequence, entered with the offending word fields
    /// still in IR/AC/AB.
    fn uuo_trap(m: &mut Machine<Self>);

    /// An unassigned opcode.
    fn unassigned(m: &mut Machine<Self>);

    /// The arithmetic-processor pseudo device (device 0).
    fn apr_io(m: &mut Machine<Self>, op: IoOp, data: &mut u64);

    /// The pager pseudo device (device 2, KI10 only).
    fn pager_io(m: &mut Machine<Self>, op: IoOp, data: &mut u64) {
        let _ = (m, op, data);
    }

    /// The MAP instruction.
    fn op_map(m: &mut Machine<Self>);

    /// Re-derive the APR interrupt request from the current conditions.
    fn check_apr_irq(m: &mut Machine<Self>);

    /// Add one to both halves, keeping the carry out in bit 36.
    #[must_use]
    fn aob(x: u64) -> u64;

    /// Subtract one from both halves, keeping the carry out in bit 36.
    #[must_use]
    fn sob(x: u64) -> u64;
}

// === KA10 ===

/// The KA10 (1968): two-segment relocate-and-protect memory management.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ka10;

/// KA10 protection and relocation registers, loaded by DATAO APR.
///
/// Limits and relocations are in units of 1K words; an address passes the
/// low segment when it is at most `(low_limit << 10) | 1777`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "snapshot", derive(serde::Serialize, serde::Deserialize))]
pub struct KaProtection {
    /// Low segment limit (Pl).
    pub low_limit: u32,
    /// High segment limit (Ph).
    pub high_limit: u32,
    /// Low segment relocation (Rl).
    pub low_reloc: u32,
    /// High segment relocation (Rh).
    pub high_reloc: u32,
    /// High segment is write protected (Pflag).
    pub write_protect_high: bool,
    /// Two-segment mode (configuration, not a DATAO bit).
    pub two_segment: bool,
}

impl Variant for Ka10 {
    type Mmu = KaProtection;
    const NAME: &'static str = "KA10";
    const KI: bool = false;
    const FAST_REGS: usize = 16;
    const MAX_UNITS: u32 = 16;

    fn opflags(ir: u32) -> OpFlags {
        OpFlags::from_bits(OPFLAGS_KA[(ir & 0o777) as usize])
    }

    fn page_lookup(
        m: &mut Machine<Self>,
        addr: u32,
        privileged: bool,
        write: bool,
    ) -> Option<u32> {
        if privileged || m.flags & USER == 0 {
            return Some(addr);
        }
        let p = m.mmu;
        if addr <= ((p.low_limit << 10) | 0o1777) {
            Some((addr + (p.low_reloc << 10)) & RMASK as u32)
        } else if p.two_segment
            && (!p.write_protect_high || !write)
            && addr & 0o400000 != 0
            && addr <= ((p.high_limit << 10) | 0o1777)
        {
            Some((addr + (p.high_reloc << 10)) & RMASK as u32)
        } else {
            m.mem_prot = true;
            m.pi.set_interrupt(APR_DEV, m.apr_irq);
            None
        }
    }

    fn get_reg(m: &mut Machine<Self>, reg: u32) -> u64 {
        m.fm[(reg & 0o17) as usize]
    }

    fn set_reg(m: &mut Machine<Self>, reg: u32, value: u64, _from_mem: bool) {
        m.fm[(reg & 0o17) as usize] = value & FMASK;
    }

    fn uuo_trap(m: &mut Machine<Self>) {
        m.mb = (u64::from(m.ir) << 27) | (u64::from(m.ac) << 23) | u64::from(m.ab);
        m.ab = 0o40;
        let _ = m.mem_write(m.uuo_cycle);
        m.ab += 1;
        m.load_pc = false;
    }

    fn unassigned(m: &mut Machine<Self>) {
        m.mb = (u64::from(m.ir) << 27) | (u64::from(m.ac) << 23) | u64::from(m.ab);
        m.ab = 0o60;
        m.uuo_cycle = true;
        let _ = m.mem_write(true);
        m.ab += 1;
        m.load_pc = false;
        m.pc_inh = true;
    }

    fn apr_io(m: &mut Machine<Self>, op: IoOp, data: &mut u64) {
        use crate::flags::{FLTOVR, OVR};
        match op {
            IoOp::Coni => {
                let mut res = u64::from(m.apr_irq);
                res |= u64::from(m.flags & OVR != 0) << 3;
                res |= u64::from(m.ov_irq) << 4;
                res |= u64::from(m.flags & FLTOVR != 0) << 6;
                res |= u64::from(m.fov_irq) << 7;
                res |= u64::from(m.clk_flg) << 9;
                res |= u64::from(m.clk_en) << 10;
                res |= u64::from(m.nxm_flag) << 12;
                res |= u64::from(m.mem_prot) << 13;
                res |= u64::from(m.flags & USERIO != 0) << 15;
                res |= u64::from(m.push_ovf) << 16;
                *data = res;
            }
            IoOp::Cono => {
                let res = *data;
                m.apr_irq = (res & 0o7) as u32;
                m.clk_irq = m.apr_irq;
                if res & 0o10 != 0 {
                    m.flags &= !OVR;
                }
                if res & 0o20 != 0 {
                    m.ov_irq = true;
                }
                if res & 0o40 != 0 {
                    m.ov_irq = false;
                }
                if res & 0o100 != 0 {
                    m.flags &= !FLTOVR;
                }
                if res & 0o200 != 0 {
                    m.fov_irq = true;
                }
                if res & 0o400 != 0 {
                    m.fov_irq = false;
                }
                if res & 0o1000 != 0 {
                    m.clk_flg = false;
                    m.pi.clr_interrupt(CLK_DEV);
                }
                if res & 0o2000 != 0 {
                    m.clk_en = true;
                }
                if res & 0o4000 != 0 {
                    m.clk_en = false;
                }
                if res & 0o10000 != 0 {
                    m.nxm_flag = false;
                }
                if res & 0o20000 != 0 {
                    m.mem_prot = false;
                }
                if res & 0o200000 != 0 {
                    m.reset_io();
                }
                if res & 0o400000 != 0 {
                    m.push_ovf = false;
                }
                Self::check_apr_irq(m);
            }
            IoOp::Datao => {
                // Load the protection and relocation registers.
                let d = *data;
                m.mmu.high_reloc = ((d >> 1) & 0o377) as u32;
                m.mmu.low_reloc = ((d >> 10) & 0o377) as u32;
                m.mmu.write_protect_high = (d >> 18) & 0o1 != 0;
                m.mmu.high_limit = ((d >> 19) & 0o377) as u32;
                m.mmu.low_limit = ((d >> 28) & 0o377) as u32;
            }
            IoOp::Datai => {
                // Console data switches: none fitted here.
            }
        }
    }

    fn op_map(_m: &mut Machine<Self>) {
        // No pager; MAP stores the effective address already in AR.
    }

    fn check_apr_irq(m: &mut Machine<Self>) {
        use crate::flags::{FLTOVR, OVR};
        m.pi.clr_interrupt(APR_DEV);
        m.pi.clr_interrupt(CLK_DEV);
        if m.apr_irq != 0 {
            let flg = (m.flags & OVR != 0 && m.ov_irq)
                || (m.flags & FLTOVR != 0 && m.fov_irq)
                || m.nxm_flag
                || m.mem_prot
                || m.push_ovf;
            if flg {
                m.pi.set_interrupt(APR_DEV, m.apr_irq);
            }
        }
        if m.clk_flg && m.clk_en {
            m.pi.set_interrupt(CLK_DEV, m.clk_irq);
        }
    }

    fn aob(x: u64) -> u64 {
        x.wrapping_add(0o1_000_001)
    }

    fn sob(x: u64) -> u64 {
        x.wrapping_add(0o777_776_777_777)
    }
}

// === KI10 ===

/// The KI10 (1972): demand paging with separate executive and user page
/// tables, four fast-memory blocks, and arithmetic trap flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Ki10;

/// KI10 pager state, loaded by DATAO/CONO to device 2.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "snapshot", derive(serde::Serialize, serde::Deserialize))]
pub struct KiPager {
    /// User page-table base (word address, page aligned).
    pub ub_ptr: u32,
    /// Executive page-table base (word address, page aligned).
    pub eb_ptr: u32,
    /// Paging enabled.
    pub page_enable: bool,
    /// User address space limited to the low 112K.
    pub small_user: bool,
    /// User address compare enable.
    pub user_addr_cmp: bool,
    /// Selected fast-memory block, pre-shifted (0, 020, 040, 060).
    pub fm_sel: u8,
    /// AC-stack offset for previous-context register spills.
    pub ac_stack: u32,
    /// Page-table reload counter.
    pub pag_reload: u32,
    /// Fault word latched by the last page failure.
    pub fault_data: u64,
    /// In-out page failure flag.
    pub inout_fail: bool,
    /// Interval timer interrupt enable.
    pub timer_irq: bool,
    /// Interval timer flag.
    pub timer_flg: bool,
}

impl Variant for Ki10 {
    type Mmu = KiPager;
    const NAME: &'static str = "KI10";
    const KI: bool = true;
    const FAST_REGS: usize = 64;
    const MAX_UNITS: u32 = 128;

    fn opflags(ir: u32) -> OpFlags {
        OpFlags::from_bits(OPFLAGS_KI[(ir & 0o777) as usize])
    }

    fn page_lookup(
        m: &mut Machine<Self>,
        addr: u32,
        privileged: bool,
        write: bool,
    ) -> Option<u32> {
        let mut page = addr >> 9;
        let base;
        let mut uf = false;
        if (!privileged && m.flags & USER != 0)
            || (m.xct_flag & 1 != 0 && (!write || m.modify))
            || (m.xct_flag & 2 != 0 && write)
        {
            base = m.mmu.ub_ptr;
            uf = true;
            if m.mmu.small_user && addr & 0o340000 != 0 {
                m.mmu.fault_data = (u64::from(page) << 18) | (u64::from(uf) << 28);
                return None;
            }
        } else {
            // Executive addresses: pages 0-337 are direct, 340-377 map
            // through the user base, 400-777 through the executive base.
            if !m.mmu.page_enable {
                return Some(addr);
            }
            if addr & 0o340000 == 0o340000 {
                base = m.mmu.ub_ptr;
                page += 0o1000 - 0o340;
            } else if addr & 0o400000 != 0 {
                base = m.mmu.eb_ptr;
            } else {
                return Some(addr);
            }
        }
        let idx = (base + (page >> 1)) as usize;
        let mut data = m.mem.get(idx).copied().unwrap_or(0);
        if page & 1 == 0 {
            data >>= 18;
        }
        data &= RMASK;
        if data & LSIGN == 0 || (write && data & 0o100000 != 0) {
            let mut fd = (u64::from(page) << 18) | (u64::from(uf) << 28) | 0o20;
            if data & 0o100000 != 0 {
                fd |= 0o4;
            }
            if data & 0o040000 != 0 {
                fd |= 0o2;
            }
            if write {
                fd |= 0o1;
            }
            m.mmu.fault_data = fd;
            return None;
        }
        Some((((data & 0o37777) << 9) as u32) | (addr & 0o777))
    }

    fn get_reg(m: &mut Machine<Self>, reg: u32) -> u64 {
        let block = u32::from(m.mmu.fm_sel);
        if m.flags & USER != 0 {
            m.fm[((block | reg) & 0o77) as usize]
        } else if m.xct_flag & 1 != 0 {
            if m.flags & USERIO != 0 {
                if m.mmu.fm_sel == 0 {
                    if let Some(addr) = Self::page_lookup(m, reg, false, false) {
                        return m.mem.get(addr as usize).copied().unwrap_or(0);
                    }
                }
                m.fm[((block | reg) & 0o77) as usize]
            } else {
                let addr = (m.mmu.ub_ptr + m.mmu.ac_stack + reg) as usize;
                m.mem.get(addr).copied().unwrap_or(0)
            }
        } else {
            m.fm[(reg & 0o77) as usize]
        }
    }

    fn set_reg(m: &mut Machine<Self>, reg: u32, value: u64, from_mem: bool) {
        let value = value & FMASK;
        let block = u32::from(m.mmu.fm_sel);
        if m.flags & USER != 0 {
            m.fm[((block | reg) & 0o77) as usize] = value;
        } else if (m.xct_flag & 1 != 0 && from_mem && m.modify)
            || (m.xct_flag & 1 != 0 && !from_mem)
            || (m.xct_flag & 2 != 0)
        {
            if m.flags & USERIO != 0 {
                if m.mmu.fm_sel == 0 {
                    if let Some(addr) = Self::page_lookup(m, reg, false, true) {
                        if let Some(slot) = m.mem.get_mut(addr as usize) {
                            *slot = value;
                        }
                    }
                } else {
                    m.fm[((block | reg) & 0o77) as usize] = value;
                }
                return;
            }
            let addr = (m.mmu.ub_ptr + m.mmu.ac_stack + reg) as usize;
            if let Some(slot) = m.mem.get_mut(addr) {
                *slot = value;
            }
        } else {
            m.fm[(reg & 0o77) as usize] = value;
        }
    }

    fn uuo_trap(m: &mut Machine<Self>) {
        m.mb = (u64::from(m.ir) << 27) | (u64::from(m.ac) << 23) | u64::from(m.ab);
        if m.ir == 0 || m.ir & 0o40 != 0 {
            // Monitor UUO: offending word and return state into the user
            // process table, new PC from the vector matching the current
            // trap/user/public context.
            m.ab = m.mmu.ub_ptr | 0o424;
            m.uuo_cycle = true;
            let _ = m.mem_write(true);
            m.ab |= 1;
            m.mb = (u64::from(m.flags) << 23) | u64::from((m.pc + 1) & RMASK as u32);
            let _ = m.mem_write(true);
            m.ab = m.mmu.ub_ptr | 0o430;
            if m.flags & (TRP1 | TRP2) != 0 {
                m.ab |= 1;
            }
            if m.flags & USER != 0 {
                m.ab |= 2;
            }
            if m.flags & PUBLIC != 0 {
                m.ab |= 4;
            }
            let _ = m.mem_read(true);
            m.flags |= ((m.mb >> 23) & 0o17777) as u32;
            m.pc = (m.mb & RMASK) as u32;
            m.pc_inh = true;
            return;
        }
        // Local UUO: through location 40 of the current address space.
        m.ab = (if m.flags & USER != 0 { 0 } else { m.mmu.eb_ptr }) | 0o40;
        let _ = m.mem_write(m.uuo_cycle);
        m.ab += 1;
        m.load_pc = false;
    }

    fn unassigned(m: &mut Machine<Self>) {
        m.uuo_cycle = true;
        m.pc_inh = true;
        Self::uuo_trap(m);
    }

    fn apr_io(m: &mut Machine<Self>, op: IoOp, data: &mut u64) {
        match op {
            IoOp::Coni => {
                let mut res = u64::from(m.clk_irq);
                res |= u64::from(m.apr_irq) << 3;
                res |= u64::from(m.nxm_flag) << 6;
                res |= u64::from(m.mmu.inout_fail) << 7;
                res |= u64::from(m.clk_flg) << 9;
                res |= u64::from(m.clk_en) << 10;
                res |= u64::from(m.mmu.timer_irq) << 14;
                res |= u64::from(m.pi.parity) << 15;
                res |= u64::from(m.mmu.timer_flg) << 17;
                *data = res;
            }
            IoOp::Cono => {
                let res = *data;
                m.clk_irq = (res & 0o7) as u32;
                m.apr_irq = ((res >> 3) & 0o7) as u32;
                if res & 0o100 != 0 {
                    m.nxm_flag = false;
                }
                if res & 0o200 != 0 {
                    m.mmu.inout_fail = false;
                }
                if res & 0o1000 != 0 {
                    m.clk_flg = false;
                    m.pi.clr_interrupt(CLK_DEV);
                }
                if res & 0o2000 != 0 {
                    m.clk_en = true;
                }
                if res & 0o4000 != 0 {
                    m.clk_en = false;
                }
                if res & 0o40000 != 0 {
                    m.mmu.timer_irq = true;
                }
                if res & 0o100000 != 0 {
                    m.mmu.timer_irq = false;
                }
                if res & 0o400000 != 0 {
                    m.mmu.timer_flg = false;
                }
                Self::check_apr_irq(m);
            }
            IoOp::Datao | IoOp::Datai => {}
        }
    }

    fn pager_io(m: &mut Machine<Self>, op: IoOp, data: &mut u64) {
        match op {
            IoOp::Coni => {
                *data = 0;
            }
            IoOp::Cono => {
                m.mmu.ac_stack = ((*data >> 9) & 0o760) as u32;
                m.mmu.pag_reload = (*data & 0o37) as u32;
            }
            IoOp::Datao => {
                let res = *data;
                if res & LSIGN != 0 {
                    m.mmu.eb_ptr = ((res & 0o17777) as u32) << 9;
                    m.mmu.page_enable = res & 0o20000 != 0;
                }
                if res & SMASK != 0 {
                    m.mmu.ub_ptr = (((res >> 18) & 0o17777) as u32) << 9;
                    m.mmu.user_addr_cmp = res & 0o0020_000_000_000 != 0;
                    m.mmu.small_user = res & 0o0040_000_000_000 != 0;
                    m.mmu.fm_sel = ((res & 0o0300_000_000_000) >> 29) as u8;
                }
            }
            IoOp::Datai => {
                let mut res = u64::from(m.mmu.eb_ptr >> 9);
                if m.mmu.page_enable {
                    res |= 0o20000;
                }
                res |= u64::from(m.mmu.ub_ptr) << 9;
                if m.mmu.user_addr_cmp {
                    res |= 0o0020_000_000_000;
                }
                if m.mmu.small_user {
                    res |= 0o0040_000_000_000;
                }
                res |= u64::from(m.mmu.fm_sel) << 29;
                *data = res;
            }
        }
    }

    fn op_map(m: &mut Machine<Self>) {
        let mut f = m.ab >> 9;
        if m.flags & USER != 0 {
            if m.mmu.small_user && f & 0o340 != 0 {
                m.ar = 0o420000; // page failure, no match
                return;
            }
            m.ar = u64::from(m.mmu.ub_ptr);
        } else {
            if !m.mmu.page_enable {
                m.ar = 0o020000 + u64::from(f);
                return;
            }
            if f & 0o340 == 0o340 {
                m.ar = u64::from(m.mmu.ub_ptr);
                f += 0o1000 - 0o340;
            } else if f & 0o400 != 0 {
                m.ar = u64::from(m.mmu.eb_ptr);
            } else {
                m.ar = 0o020000 + u64::from(f);
                return;
            }
        }
        m.ab = (m.ar as u32).wrapping_add(f >> 1);
        let _ = m.mem_read(false);
        m.ar = m.mb;
        if f & 1 != 0 {
            m.ar >>= 18;
        }
        m.ar &= 0o357777;
    }

    fn check_apr_irq(m: &mut Machine<Self>) {
        use crate::flags::{FLTOVR, OVR};
        m.pi.clr_interrupt(APR_DEV);
        m.pi.clr_interrupt(CLK_DEV);
        if !m.mmu.page_enable {
            return;
        }
        if m.apr_irq != 0 {
            let flg = (m.flags & OVR != 0 && m.ov_irq)
                || (m.flags & FLTOVR != 0 && m.fov_irq)
                || (m.clk_flg && m.clk_irq != 0)
                || m.nxm_flag
                || m.mem_prot
                || m.push_ovf;
            if flg {
                m.pi.set_interrupt(APR_DEV, m.apr_irq);
            }
        }
        if m.clk_flg && m.clk_en {
            m.pi.set_interrupt(CLK_DEV, m.clk_irq);
        }
    }

    fn aob(x: u64) -> u64 {
        (x.wrapping_add(1) & RMASK) | (x.wrapping_add(0o1_000_000) & (C1 | LMASK))
    }

    fn sob(x: u64) -> u64 {
        (x.wrapping_add(RMASK) & RMASK) | (x.wrapping_add(LMASK) & (C1 | LMASK))
    }
}

/// Shared MUUO entry used by the execute dispatch: an instruction that
/// traps through the monitor vector. Unexpected inside an interrupt
/// cycle, which is a fatal stop rather than a trap.
pub(crate) fn enter_uuo<V: Variant>(m: &mut Machine<V>) {
    if m.pi_cycle {
        m.pending_stop = Some(Stop::InterruptInstruction);
        return;
    }
    V::uuo_trap(m);
}
