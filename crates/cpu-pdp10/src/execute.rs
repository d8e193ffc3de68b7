//! Opcode group dispatch.
//!
//! Nine-bit opcodes dispatch in groups of eight; the per-group handlers
//! live in the family files (arith, shifts, float, byteops, branches,
//! logic, iot). Operand staging and writeback happen in the machine's
//! step cycle, driven by the opflag table.

use crate::machine::Machine;
use crate::variant::Variant;

impl<V: Variant> Machine<V> {
    /// Dispatch the instruction in IR. Stops are latched in
    /// `pending_stop` and honored when the cycle completes.
    pub(crate) fn execute(&mut self) {
        match self.ir & 0o770 {
            0o000 | 0o010 | 0o020 | 0o030 => self.op_luuo(),
            0o040 | 0o050 | 0o060 | 0o070 => self.op_muuo(),
            0o100 => self.op_unassigned(),
            0o110 => {
                if V::KI {
                    self.op_dfloat();
                } else {
                    self.op_unassigned();
                }
            }
            0o120 => {
                if V::KI {
                    self.op_dmove_fix();
                } else {
                    self.op_unassigned();
                }
            }
            0o130 => self.op_byte_group(),
            0o140 | 0o150 => self.op_fad_fsb(),
            0o160 => self.op_fmp(),
            0o170 => self.op_fdv(),
            // MOVE/MOVS are pure opflag plumbing.
            0o200 => {}
            0o210 => self.op_movn_movm(),
            0o220 => self.op_mul(),
            0o230 => self.op_div(),
            0o240 => self.op_shift(),
            0o250 => self.op_branch(),
            0o260 => self.op_stack_jump(),
            0o270 => self.op_add_sub(),
            0o300 | 0o310 => self.op_cam_cai(),
            0o320 | 0o330 => self.op_jump_skip(),
            0o340 | 0o350 | 0o360 | 0o370 => self.op_incr_decr(),
            0o400 | 0o410 | 0o420 | 0o430 | 0o440 | 0o450 | 0o460 | 0o470 => {
                self.op_boolean();
            }
            0o500 | 0o510 | 0o520 | 0o530 | 0o540 | 0o550 | 0o560 | 0o570 => {
                self.op_halfword();
            }
            0o600 | 0o610 | 0o620 | 0o630 | 0o640 | 0o650 | 0o660 | 0o670 => {
                self.op_test();
            }
            _ => self.op_iot(),
        }
    }
}
