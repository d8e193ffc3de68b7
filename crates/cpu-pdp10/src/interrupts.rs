//! Seven-level priority interrupt unit.
//!
//! Levels are numbered 1 (highest) through 7 and live in seven-bit masks
//! with level 1 at bit value 0o100 and level 7 at 0o1. Three masks drive
//! arbitration:
//!
//! - PIR: requests (program requests plus device requests gated by PIE)
//! - PIH: levels currently held (granted, not yet dismissed)
//! - PIE: levels enabled for device/internal requests
//!
//! Once a level is granted it and everything below it stay masked until
//! the handler dismisses in order, so the set bits of PIH always form a
//! contiguous run from the highest granted level down.

/// Device number of the arithmetic processor's internal requests.
pub const APR_DEV: u32 = 0;

/// Device number the clock flag requests on.
pub const CLK_DEV: u32 = 4;

/// Mask bit for a level, `0o100 >> (level - 1)`.
#[must_use]
pub const fn level_bit(level: u32) -> u8 {
    if level == 0 || level > 7 {
        0
    } else {
        (0o200u32 >> level) as u8
    }
}

/// Priority-interrupt unit state.
#[derive(Debug, Clone)]
pub struct PiSystem {
    /// Pending requests.
    pub pir: u8,
    /// Held (in-service) levels.
    pub pih: u8,
    /// Enabled levels.
    pub pie: u8,
    /// Master enable.
    pub enable: bool,
    /// Some request line may be up; cleared when arbitration finds none.
    pub pending: bool,
    /// Grantable requests from the last arbitration.
    pub req: u8,
    /// Level granted by the last arbitration (1-7).
    pub enc: u32,
    /// Parity error request flag (set and cleared by CONO PI).
    pub parity: bool,
    /// Per-device request lines, one mask byte per 7-bit device number.
    dev_irq: [u8; 128],
}

impl Default for PiSystem {
    fn default() -> Self {
        PiSystem {
            pir: 0,
            pih: 0,
            pie: 0,
            enable: false,
            pending: false,
            req: 0,
            enc: 0,
            parity: false,
            dev_irq: [0; 128],
        }
    }
}

impl PiSystem {
    /// Raise a device's request at the given level. Level 0 is "no
    /// interrupt" and is ignored.
    pub fn set_interrupt(&mut self, dev: u32, level: u32) {
        let level = level & 0o7;
        if level != 0 {
            self.dev_irq[(dev & 0o177) as usize] = level_bit(level);
            self.pending = true;
        }
    }

    /// Drop a device's request.
    pub fn clr_interrupt(&mut self, dev: u32) {
        self.dev_irq[(dev & 0o177) as usize] = 0;
    }

    /// Current request line of a device.
    #[must_use]
    pub fn dev_request(&self, dev: u32) -> u8 {
        self.dev_irq[(dev & 0o177) as usize]
    }

    /// Clear everything (CONO PI reset bit, machine reset).
    pub fn reset(&mut self) {
        *self = PiSystem::default();
    }

    /// Arbitrate: merge device requests into PIR, then find the highest
    /// enabled, un-held level. On a grant, `enc` holds the level and the
    /// result is true.
    pub fn check_irq_level(&mut self) -> bool {
        let mut lines = 0u8;
        for l in self.dev_irq {
            lines |= l;
        }
        if lines == 0 {
            self.pending = false;
        }
        self.pir |= lines & self.pie;

        // A request may stack on top of a held level only when every
        // level above it is free; build the OK mask cumulatively from
        // level 1 down.
        let pi_t = (!self.pir & !self.pih) >> 1;
        let mut pi_ok = 0o100 & (self.pir & !self.pih);
        if pi_ok == 0 {
            let mut lvl = 0o40u8;
            for _ in 2..=7 {
                if lvl & pi_t != 0 {
                    pi_ok |= lvl;
                    lvl >>= 1;
                } else {
                    break;
                }
            }
        }

        self.req = self.pir & !self.pih & pi_ok;
        if self.req != 0 {
            let mut r = self.req;
            let mut lvl = 1;
            while r & 0o100 == 0 && lvl < 7 {
                r <<= 1;
                lvl += 1;
            }
            self.enc = lvl;
            true
        } else {
            false
        }
    }

    /// Commit the grant from the last arbitration: hold the level and
    /// drop its program request.
    pub fn set_hold(&mut self) {
        self.pih |= level_bit(self.enc);
        self.pir &= !level_bit(self.enc);
    }

    /// Dismiss the highest held level. Returns true when the APR device
    /// still has a request up and its conditions should be re-evaluated.
    pub fn restore_hold(&mut self) -> bool {
        if !self.enable {
            return false;
        }
        let mut lvl = 0o100u8;
        for _ in 1..=7 {
            if lvl & self.pih != 0 {
                self.pir &= !lvl;
                self.pih &= !lvl;
                break;
            }
            lvl >>= 1;
        }
        self.pending = true;
        self.dev_irq[APR_DEV as usize] != 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled(levels: &[u32]) -> PiSystem {
        let mut pi = PiSystem::default();
        pi.enable = true;
        for &l in levels {
            pi.pie |= level_bit(l);
        }
        pi
    }

    #[test]
    fn level_bits() {
        assert_eq!(level_bit(1), 0o100);
        assert_eq!(level_bit(4), 0o10);
        assert_eq!(level_bit(7), 0o1);
        assert_eq!(level_bit(0), 0);
    }

    #[test]
    fn highest_request_wins() {
        let mut pi = enabled(&[1, 2, 3, 4, 5, 6, 7]);
        pi.set_interrupt(0o10, 5);
        pi.set_interrupt(0o14, 2);
        assert!(pi.check_irq_level());
        assert_eq!(pi.enc, 2);
    }

    #[test]
    fn disabled_levels_do_not_request() {
        let mut pi = enabled(&[4]);
        pi.set_interrupt(0o10, 3);
        assert!(!pi.check_irq_level());
        pi.set_interrupt(0o14, 4);
        assert!(pi.check_irq_level());
        assert_eq!(pi.enc, 4);
    }

    #[test]
    fn held_level_masks_itself_and_below() {
        let mut pi = enabled(&[1, 2, 3, 4, 5, 6, 7]);
        pi.set_interrupt(0o10, 4);
        assert!(pi.check_irq_level());
        pi.set_hold();
        assert_eq!(pi.pih, level_bit(4));
        // The same level and lower priorities stay masked.
        pi.set_interrupt(0o14, 6);
        assert!(!pi.check_irq_level());
        // A higher priority still preempts.
        pi.set_interrupt(0o20, 2);
        assert!(pi.check_irq_level());
        assert_eq!(pi.enc, 2);
        pi.set_hold();
        // PIH is a contiguous run from the highest granted level down to
        // each granted level.
        assert_eq!(pi.pih, level_bit(2) | level_bit(4));
    }

    #[test]
    fn dismissal_unwinds_in_order() {
        let mut pi = enabled(&[1, 2, 3, 4, 5, 6, 7]);
        pi.set_interrupt(0o10, 4);
        assert!(pi.check_irq_level());
        pi.set_hold();
        pi.clr_interrupt(0o10);
        pi.set_interrupt(0o14, 2);
        assert!(pi.check_irq_level());
        pi.set_hold();
        pi.clr_interrupt(0o14);
        // Highest hold goes first.
        pi.restore_hold();
        assert_eq!(pi.pih, level_bit(4));
        pi.restore_hold();
        assert_eq!(pi.pih, 0);
    }

    #[test]
    fn program_requests_need_no_enable_bit() {
        let mut pi = PiSystem::default();
        pi.enable = true;
        pi.pir = level_bit(6);
        pi.pending = true;
        assert!(pi.check_irq_level());
        assert_eq!(pi.enc, 6);
        pi.set_hold();
        // The grant consumed the program request.
        assert_eq!(pi.pir, 0);
    }

    #[test]
    fn pending_clears_when_lines_drop() {
        let mut pi = enabled(&[4]);
        pi.set_interrupt(0o10, 4);
        assert!(pi.pending);
        pi.clr_interrupt(0o10);
        assert!(!pi.check_irq_level());
        assert!(!pi.pending);
    }

    #[test]
    fn hold_population_bounded() {
        // Grant all seven levels in priority order; the book-keeping
        // masks never exceed seven live bits.
        let mut pi = enabled(&[1, 2, 3, 4, 5, 6, 7]);
        for level in (1..=7u32).rev() {
            pi.set_interrupt(0o10 + level, level);
            assert!(pi.check_irq_level());
            assert_eq!(pi.enc, level);
            pi.set_hold();
            pi.clr_interrupt(0o10 + level);
        }
        let live = pi.pih.count_ones() + (pi.pie & !pi.pih).count_ones();
        assert!(live <= 7);
        assert_eq!(pi.pih, 0o177);
    }
}
