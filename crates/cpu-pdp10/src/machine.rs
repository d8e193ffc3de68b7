//! The processor itself.
//!
//! All architectural state lives in one owned [`Machine`] aggregate with a
//! single mutator: the instruction cycle. Device handlers and the
//! front-end reach in only through the methods here.
//!
//! [`Machine::step`] runs one pass of the instruction cycle:
//!
//! 1. service host events when the poll budget is spent;
//! 2. fetch (unless a multi-part instruction is mid-flight);
//! 3. resolve the effective address, polling for interrupts between
//!    indirection hops;
//! 4. vector to a granted interrupt instead of executing;
//! 5. stage operands per the opcode's flag word, dispatch, write back;
//! 6. advance PC unless inhibited, then run the interrupt-cycle epilogue.
//!
//! The long instructions (BLT, the byte pair, the double-word stores)
//! keep their progress in architectural state, so a step that vectors
//! away mid-instruction resumes exactly where the hardware would.

use std::collections::VecDeque;

use emu_core::{Observable, Value};

use crate::bus::{IoBus, IoDevice};
use crate::error::{ConfigError, MemFault, NonExistentMemory, Stop};
use crate::history::{HIST_MAX, HIST_MIN, History, HistoryEntry};
use crate::interrupts::{APR_DEV, PiSystem};
use crate::opflags::OpFlags;
use crate::variant::Variant;
use crate::word::{FMASK, RMASK};

/// Default host-event poll budget, charged per memory reference.
const DEFAULT_QUANTUM: i64 = 4096;

/// Out-of-band work delivered to the CPU loop at its suspension points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// Realtime clock tick: set the clock flag, request the clock level.
    Tick,
    /// Raise a device request line.
    SetInterrupt { dev: u32, level: u32 },
    /// Drop a device request line.
    ClearInterrupt { dev: u32 },
    /// Stop the run (breakpoint, step budget, front-end exit). A step
    /// stop arriving between the halves of a byte instruction is held
    /// until the instruction retires.
    Stop(Stop),
}

/// A PDP-10 central processor, KA10 or KI10 by type parameter.
pub struct Machine<V: Variant> {
    // === Memory ===
    pub(crate) mem: Vec<u64>,
    pub(crate) memsize: usize,
    /// Fast-memory register file. The KA10 uses the first sixteen; the
    /// KI10 addresses four blocks through the pager's block select.
    pub(crate) fm: [u64; 64],

    // === Working registers ===
    pub(crate) ar: u64,
    pub(crate) mq: u64,
    pub(crate) br: u64,
    pub(crate) mb: u64,
    pub(crate) ab: u32,
    pub(crate) pc: u32,
    pub(crate) ir: u32,
    pub(crate) ac: u32,
    pub(crate) flags: u32,
    pub(crate) sc: i32,
    pub(crate) fe: i32,

    // === Instruction-cycle state ===
    pub(crate) byf5: bool,
    pub(crate) uuo_cycle: bool,
    pub(crate) load_pc: bool,
    pub(crate) inst_fetch: bool,
    pub(crate) iflags: OpFlags,
    pub(crate) pc_inh: bool,
    pub(crate) sac_inh: bool,
    pub(crate) xct_flag: u32,
    pub(crate) modify: bool,
    xct_count: u32,

    // === Interrupt system ===
    /// Priority-interrupt unit; handed to device handlers so they can
    /// raise and drop request lines.
    pub pi: PiSystem,
    pub(crate) pi_cycle: bool,
    pub(crate) pi_ov: bool,
    pub(crate) pi_hold: bool,
    pub(crate) pi_restore: bool,
    pub(crate) pi_rq: bool,

    // === APR conditions ===
    pub(crate) push_ovf: bool,
    pub(crate) mem_prot: bool,
    pub(crate) nxm_flag: bool,
    pub(crate) clk_flg: bool,
    pub(crate) ov_irq: bool,
    pub(crate) fov_irq: bool,
    pub(crate) clk_en: bool,
    pub(crate) apr_irq: u32,
    pub(crate) clk_irq: u32,

    // === Memory management ===
    /// Variant MMU state: protection registers (KA10) or pager (KI10).
    pub mmu: V::Mmu,

    // === Collaborators ===
    bus: IoBus,
    events: VecDeque<HostEvent>,
    pub(crate) interval: i64,
    quantum: i64,
    pub(crate) pending_stop: Option<Stop>,

    // === Safety limits ===
    ind_limit: Option<u32>,
    xct_limit: Option<u32>,

    // === History ===
    pub(crate) hist: History,
}

impl<V: Variant> Default for Machine<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Variant> Machine<V> {
    /// Create a machine with the variant's full memory, everything clear.
    #[must_use]
    pub fn new() -> Self {
        let memsize = (V::MAX_UNITS as usize) * 16 * 1024;
        Machine {
            mem: vec![0; memsize],
            memsize,
            fm: [0; 64],
            ar: 0,
            mq: 0,
            br: 0,
            mb: 0,
            ab: 0,
            pc: 0,
            ir: 0,
            ac: 0,
            flags: 0,
            sc: 0,
            fe: 0,
            byf5: false,
            uuo_cycle: false,
            load_pc: true,
            inst_fetch: true,
            iflags: OpFlags::NONE,
            pc_inh: false,
            sac_inh: false,
            xct_flag: 0,
            modify: false,
            xct_count: 0,
            pi: PiSystem::default(),
            pi_cycle: false,
            pi_ov: false,
            pi_hold: false,
            pi_restore: false,
            pi_rq: false,
            push_ovf: false,
            mem_prot: false,
            nxm_flag: false,
            clk_flg: false,
            ov_irq: false,
            fov_irq: false,
            clk_en: false,
            apr_irq: 0,
            clk_irq: 0,
            mmu: V::Mmu::default(),
            bus: IoBus::default(),
            events: VecDeque::new(),
            interval: DEFAULT_QUANTUM,
            quantum: DEFAULT_QUANTUM,
            pending_stop: None,
            ind_limit: None,
            xct_limit: None,
            hist: History::default(),
        }
    }

    /// Processor reset: clears flags, conditions, the PI unit, and the
    /// MMU. Memory, the fast registers, and the PC are left alone, as on
    /// the real console.
    pub fn reset(&mut self) {
        self.byf5 = false;
        self.uuo_cycle = false;
        self.push_ovf = false;
        self.mem_prot = false;
        self.nxm_flag = false;
        self.clk_flg = false;
        self.ov_irq = false;
        self.fov_irq = false;
        self.clk_en = false;
        self.apr_irq = 0;
        self.clk_irq = 0;
        self.pi.reset();
        self.pi_cycle = false;
        self.pi_ov = false;
        self.pi_hold = false;
        self.pi_restore = false;
        self.pi_rq = false;
        self.load_pc = true;
        self.inst_fetch = true;
        self.pc_inh = false;
        self.sac_inh = false;
        self.xct_flag = 0;
        self.modify = false;
        self.xct_count = 0;
        self.mmu = V::Mmu::default();
        self.pending_stop = None;
        self.interval = self.quantum;
    }

    /// I/O-bus reset: every attached device, not the processor.
    pub fn reset_io(&mut self) {
        self.bus.reset(&mut self.pi);
    }

    // === Configuration surface ===

    /// Set memory size in units of 16K words.
    pub fn set_memory_size(&mut self, units: u32) -> Result<(), ConfigError> {
        if units == 0 || units > V::MAX_UNITS {
            return Err(ConfigError::MemorySize {
                units,
                max_units: V::MAX_UNITS,
            });
        }
        self.memsize = (units as usize) * 16 * 1024;
        self.mem.resize(self.memsize, 0);
        Ok(())
    }

    /// Configured memory size in words.
    #[must_use]
    pub fn memory_size(&self) -> usize {
        self.memsize
    }

    /// Configure the instruction history ring; zero disables it.
    pub fn set_history(&mut self, len: usize) -> Result<(), ConfigError> {
        if len != 0 && !(HIST_MIN..=HIST_MAX).contains(&len) {
            return Err(ConfigError::HistorySize { len });
        }
        self.hist.resize(len);
        Ok(())
    }

    /// Logged instructions, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.hist.iter()
    }

    /// Optional runaway guards for indirection chains and XCT chains.
    pub fn set_limits(&mut self, indirect: Option<u32>, xct: Option<u32>) {
        self.ind_limit = indirect;
        self.xct_limit = xct;
    }

    /// Host-event poll budget restored after each service pass.
    pub fn set_poll_quantum(&mut self, quantum: i64) {
        self.quantum = quantum.max(1);
    }

    /// Force the remaining poll budget, e.g. to deliver a queued event at
    /// a precise point in a long instruction.
    pub fn set_interval(&mut self, interval: i64) {
        self.interval = interval;
    }

    /// Attach an external device handler at a 7-bit device number.
    /// Numbers 0 and 1 (and 2 on the KI10) belong to the processor.
    pub fn attach_device(
        &mut self,
        dev: u32,
        handler: Box<dyn IoDevice>,
    ) -> Result<(), ConfigError> {
        if dev <= 1 || (V::KI && dev == 2) || dev > 0o177 {
            return Err(ConfigError::DeviceReserved { dev });
        }
        self.bus.register(dev, handler)
    }

    /// Detach and return a device handler.
    pub fn detach_device(&mut self, dev: u32) -> Option<Box<dyn IoDevice>> {
        self.bus.unregister(dev)
    }

    // === Device request lines (spec: set_interrupt / clr_interrupt) ===

    /// Raise a device's interrupt request.
    pub fn set_interrupt(&mut self, dev: u32, level: u32) {
        self.pi.set_interrupt(dev, level);
    }

    /// Drop a device's interrupt request.
    pub fn clear_interrupt(&mut self, dev: u32) {
        self.pi.clr_interrupt(dev);
    }

    /// The realtime-clock collaborator: sets the clock flag and, when
    /// clock interrupts are enabled, requests the assigned level.
    pub fn rtc_tick(&mut self) {
        self.clk_flg = true;
        if self.clk_en {
            self.pi
                .set_interrupt(crate::interrupts::CLK_DEV, self.clk_irq);
        }
    }

    /// Queue an out-of-band event for the next suspension point.
    pub fn post(&mut self, event: HostEvent) {
        self.events.push_back(event);
    }

    // === Front-end examine/deposit (bypass paging, honor AC aliasing) ===

    /// Read a word as the console would.
    pub fn examine(&self, addr: u32) -> Result<u64, NonExistentMemory> {
        if addr < 0o20 {
            Ok(self.fm[addr as usize] & FMASK)
        } else if (addr as usize) < self.memsize {
            Ok(self.mem[addr as usize] & FMASK)
        } else {
            Err(NonExistentMemory(addr))
        }
    }

    /// Write a word as the console would.
    pub fn deposit(&mut self, addr: u32, val: u64) -> Result<(), NonExistentMemory> {
        if addr < 0o20 {
            self.fm[addr as usize] = val & FMASK;
            Ok(())
        } else if (addr as usize) < self.memsize {
            self.mem[addr as usize] = val & FMASK;
            Ok(())
        } else {
            Err(NonExistentMemory(addr))
        }
    }

    /// Program counter.
    #[must_use]
    pub fn pc(&self) -> u32 {
        self.pc
    }

    /// Set the program counter and restart instruction sequencing there.
    pub fn set_pc(&mut self, pc: u32) {
        self.pc = pc & RMASK as u32;
        self.load_pc = true;
        self.inst_fetch = true;
        self.byf5 = false;
    }

    /// The flag register.
    #[must_use]
    pub fn flags(&self) -> u32 {
        self.flags
    }

    /// Load the flag register (console use).
    pub fn set_flags(&mut self, flags: u32) {
        self.flags = flags & crate::flags::FLAG_MASK;
    }

    /// Memory-protection violation latched (KA10).
    #[must_use]
    pub fn mem_prot(&self) -> bool {
        self.mem_prot
    }

    /// Non-existent-memory reference latched.
    #[must_use]
    pub fn nxm_flag(&self) -> bool {
        self.nxm_flag
    }

    /// Push-down overflow latched.
    #[must_use]
    pub fn push_ovf(&self) -> bool {
        self.push_ovf
    }

    /// Clock flag.
    #[must_use]
    pub fn clk_flg(&self) -> bool {
        self.clk_flg
    }

    // === Memory paths ===

    /// Read M[AB] into MB through the fast-register alias and the
    /// variant's translation. On failure the fault is latched and the
    /// instruction falls through to its epilogue.
    pub(crate) fn mem_read(&mut self, privileged: bool) -> Result<(), MemFault> {
        if self.ab < 0o20 {
            self.mb = V::get_reg(self, self.ab);
            return Ok(());
        }
        self.interval -= 1;
        let Some(addr) = V::page_lookup(self, self.ab, privileged, false) else {
            return Err(MemFault);
        };
        let addr = addr as usize;
        if addr >= self.memsize {
            self.nxm_flag = true;
            self.pi.set_interrupt(APR_DEV, self.apr_irq);
            return Err(MemFault);
        }
        self.mb = self.mem[addr];
        Ok(())
    }

    /// Write MB to M[AB], symmetric with [`Self::mem_read`]; translation
    /// checks the write-permission bit.
    pub(crate) fn mem_write(&mut self, privileged: bool) -> Result<(), MemFault> {
        if self.ab < 0o20 {
            let mb = self.mb;
            V::set_reg(self, self.ab, mb, true);
            return Ok(());
        }
        self.interval -= 1;
        let Some(addr) = V::page_lookup(self, self.ab, privileged, true) else {
            return Err(MemFault);
        };
        let addr = addr as usize;
        if addr >= self.memsize {
            self.nxm_flag = true;
            self.pi.set_interrupt(APR_DEV, self.apr_irq);
            return Err(MemFault);
        }
        self.mem[addr] = self.mb & FMASK;
        Ok(())
    }

    // === Host events ===

    /// Drain the event queue and restore the poll budget. A stop unwinds
    /// immediately unless it is a step landing between byte-instruction
    /// halves, which is latched until the instruction retires.
    pub(crate) fn service_events(&mut self) -> Result<(), Stop> {
        self.interval = self.quantum;
        while let Some(ev) = self.events.pop_front() {
            match ev {
                HostEvent::Tick => self.rtc_tick(),
                HostEvent::SetInterrupt { dev, level } => {
                    self.pi.set_interrupt(dev, level);
                }
                HostEvent::ClearInterrupt { dev } => self.pi.clr_interrupt(dev),
                HostEvent::Stop(stop) => {
                    if stop == Stop::Step && self.byf5 {
                        self.pending_stop = Some(stop);
                    } else {
                        return Err(stop);
                    }
                }
            }
        }
        Ok(())
    }

    /// Service events from inside a long instruction: a stop is latched
    /// for the instruction epilogue so the architectural resume state
    /// stays intact.
    pub(crate) fn service_events_latched(&mut self) {
        if let Err(stop) = self.service_events() {
            self.pending_stop = Some(stop);
        }
    }

    // === The instruction cycle ===

    /// Execute one pass of the instruction cycle: one instruction, one
    /// phase of a multi-part instruction, or one interrupt vector.
    pub fn step(&mut self) -> Result<(), Stop> {
        if self.interval <= 0 {
            self.service_events()?;
        }

        if self.load_pc {
            self.ab = self.pc;
            self.uuo_cycle = false;
            self.xct_flag = 0;
            self.xct_count = 0;
        }

        let mut force_fetch = false;
        'fetch: loop {
            if self.inst_fetch || force_fetch {
                force_fetch = false;
                let _ = self.mem_read(self.pi_cycle || self.uuo_cycle);
                self.ir = ((self.mb >> 27) & 0o777) as u32;
                self.ac = ((self.mb >> 23) & 0o17) as u32;
                self.iflags = V::opflags(self.ir);
                self.byf5 = false;
            }

            // Second half of a byte instruction: the pointer word is in
            // AR; fetch the byte's word through the normal operand path.
            if self.byf5 {
                self.iflags = OpFlags::FCE;
                self.ab = (self.ar & RMASK) as u32;
            }

            if self.hist.is_enabled() {
                let ac_val = V::get_reg(self, self.ac);
                let entry = HistoryEntry {
                    pc: if self.byf5 { self.pc } else { self.ab },
                    ea: self.ab,
                    ir: self.mb,
                    ac: ac_val,
                    flags: (self.flags << 4)
                        | (u32::from(self.clk_flg) << 3)
                        | (u32::from(self.mem_prot) << 2)
                        | (u32::from(self.nxm_flag) << 1)
                        | u32::from(self.push_ovf),
                    operand: 0,
                    result: 0,
                };
                self.hist.begin(entry);
            }

            self.resolve_ea()?;
            let ea = self.ab;
            self.hist.update(|e| e.ea = ea);

            // A granted interrupt preempts the instruction: the vector
            // location is executed in its place.
            if self.pi_rq {
                self.pi.set_hold();
                self.pi_cycle = true;
                self.pi_rq = false;
                self.pi_hold = false;
                self.pi_ov = false;
                self.ab = 0o40 | (self.pi.enc << 1);
                force_fetch = true;
                continue 'fetch;
            }

            // Operand staging.
            self.inst_fetch = true;
            self.load_pc = true;
            self.pc_inh = false;
            self.sac_inh = false;
            self.modify = false;

            let iflags = self.iflags;
            let mut aborted = false;
            if iflags.any(OpFlags::FCE.or(OpFlags::FCEPSE)) {
                self.modify = true;
                if self.mem_read(false).is_err() {
                    aborted = true;
                } else {
                    self.ar = self.mb;
                }
            }

            if !aborted {
                if iflags.any(OpFlags::FAC) {
                    self.br = self.ar;
                    self.ar = V::get_reg(self, self.ac);
                }
                if iflags.any(OpFlags::SWAR) {
                    self.ar = crate::word::swap_halves(self.ar);
                }
                if iflags.any(OpFlags::FBR) {
                    self.br = V::get_reg(self, self.ac);
                }
                if iflags.any(OpFlags::FMB) {
                    self.br = self.mb;
                }
                let operand = self.ar;
                self.hist.update(|e| e.operand = operand);
                if iflags.any(OpFlags::FAC2) {
                    self.mq = V::get_reg(self, (self.ac + 1) & 0o17);
                } else if !self.byf5 {
                    self.mq = 0;
                }

                self.execute();

                // Writeback, skipped wholesale when the AC store is
                // inhibited by a fault or an abandoned divide.
                let mut stored = true;
                if !self.sac_inh && self.iflags.any(OpFlags::SCE.or(OpFlags::FCEPSE)) {
                    self.mb = self.ar;
                    if self.mem_write(false).is_err() {
                        stored = false;
                    }
                }
                if stored {
                    if !self.sac_inh
                        && (self.iflags.any(OpFlags::SAC)
                            || (self.iflags.any(OpFlags::SACZ) && self.ac != 0))
                    {
                        let ar = self.ar;
                        let ac = self.ac;
                        V::set_reg(self, ac, ar, false);
                    }
                    if !self.sac_inh && self.iflags.any(OpFlags::SAC2) {
                        let mq = self.mq;
                        let ac1 = (self.ac + 1) & 0o17;
                        V::set_reg(self, ac1, mq, false);
                    }
                    let result = self.ar;
                    self.hist.update(|e| e.result = result);
                }
            }

            // Advance.
            if !self.pc_inh && !self.pi_cycle {
                self.pc = (self.pc + 1) & RMASK as u32;
            }

            // Interrupt-cycle epilogue: block-transfer vectors hold the
            // level and chain; anything else either dismisses or resumes
            // with the level held for a later JEN.
            if self.pi_cycle {
                if self.ir & 0o700 == 0o700 && self.ac & 0o4 == 0 {
                    self.pi_hold = self.pi_ov;
                    if !self.pi_hold && self.inst_fetch {
                        self.pi_restore = true;
                        self.pi_cycle = false;
                    } else {
                        self.ab = 0o40 | (self.pi.enc << 1) | u32::from(self.pi_ov);
                        self.pi_ov = false;
                        self.pi_hold = false;
                        force_fetch = true;
                        continue 'fetch;
                    }
                } else if self.pi_hold {
                    self.ab = 0o40 | (self.pi.enc << 1) | u32::from(self.pi_ov);
                    self.pi_ov = false;
                    self.pi_hold = false;
                    force_fetch = true;
                    continue 'fetch;
                } else {
                    self.inst_fetch = true;
                    self.load_pc = true;
                    self.pi_cycle = false;
                }
            }

            if self.pi_restore {
                if self.pi.restore_hold() {
                    V::check_apr_irq(self);
                }
                self.pi_restore = false;
            }

            self.interval -= 1;
            break;
        }

        match self.pending_stop {
            Some(stop) if !(stop == Stop::Step && self.byf5) => {
                self.pending_stop = None;
                Err(stop)
            }
            _ => Ok(()),
        }
    }

    /// Run until something stops the machine.
    pub fn run(&mut self) -> Stop {
        loop {
            if let Err(stop) = self.step() {
                return stop;
            }
        }
    }

    /// Nested-XCT accounting, called by the XCT handler.
    pub(crate) fn count_xct(&mut self) {
        self.xct_count += 1;
        if let Some(limit) = self.xct_limit {
            if self.xct_count > limit {
                self.pending_stop = Some(Stop::XctLimit);
            }
        }
    }

    /// Indirection depth guard, consulted by the EA loop.
    #[must_use]
    pub(crate) fn indirect_limit(&self) -> Option<u32> {
        self.ind_limit
    }

    /// Bus transfer to an external device, with the PI unit alongside.
    pub(crate) fn external_io(
        &mut self,
        dev: u32,
        op: crate::bus::IoOp,
        data: &mut u64,
    ) -> Result<(), crate::bus::DeviceError> {
        self.bus.io(dev, op, data, &mut self.pi)
    }
}

impl<V: Variant> std::fmt::Debug for Machine<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Machine")
            .field("model", &V::NAME)
            .field("pc", &format_args!("{:06o}", self.pc))
            .field("flags", &format_args!("{:06o}", self.flags))
            .field("memsize", &self.memsize)
            .finish_non_exhaustive()
    }
}

const QUERY_PATHS: &[&str] = &[
    "pc", "flags", "ar", "mq", "br", "mb", "ab", "ir", "ac",
    "pi.enable", "pi.pir", "pi.pih", "pi.pie", "pi.enc",
    "apr.nxm", "apr.memprot", "apr.pushovf", "apr.clk",
    "fm0", "fm1", "fm2", "fm3", "fm4", "fm5", "fm6", "fm7",
    "fm10", "fm11", "fm12", "fm13", "fm14", "fm15", "fm16", "fm17",
];

impl<V: Variant> Observable for Machine<V> {
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(oct) = path.strip_prefix("fm") {
            let reg = u32::from_str_radix(oct, 8).ok()?;
            if reg < 0o20 {
                return Some(Value::U64(self.fm[reg as usize] & FMASK));
            }
            return None;
        }
        match path {
            "pc" => Some(Value::U32(self.pc)),
            "flags" => Some(Value::U32(self.flags)),
            "ar" => Some(Value::U64(self.ar)),
            "mq" => Some(Value::U64(self.mq)),
            "br" => Some(Value::U64(self.br)),
            "mb" => Some(Value::U64(self.mb)),
            "ab" => Some(Value::U32(self.ab)),
            "ir" => Some(Value::U32(self.ir)),
            "ac" => Some(Value::U32(self.ac)),
            "pi.enable" => Some(self.pi.enable.into()),
            "pi.pir" => Some(Value::U8(self.pi.pir)),
            "pi.pih" => Some(Value::U8(self.pi.pih)),
            "pi.pie" => Some(Value::U8(self.pi.pie)),
            "pi.enc" => Some(Value::U8(self.pi.enc as u8)),
            "apr.nxm" => Some(self.nxm_flag.into()),
            "apr.memprot" => Some(self.mem_prot.into()),
            "apr.pushovf" => Some(self.push_ovf.into()),
            "apr.clk" => Some(self.clk_flg.into()),
            _ => None,
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        QUERY_PATHS
    }
}
