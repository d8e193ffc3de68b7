//! Instruction-level tests for the PDP-10 core, KA10 build.
//!
//! Programs are deposited through the front-end API and stepped one
//! instruction (or instruction phase) at a time.

use cpu_pdp10::flags::{BYTI, CRY0, CRY1, OVR};
use cpu_pdp10::word::{FMASK, SMASK};
use cpu_pdp10::{HostEvent, Ka10Machine, Stop};

/// Assemble a memory-reference instruction word.
fn inst(op: u32, ac: u32, ind: bool, idx: u32, y: u32) -> u64 {
    (u64::from(op & 0o777) << 27)
        | (u64::from(ac & 0o17) << 23)
        | (u64::from(ind) << 22)
        | (u64::from(idx & 0o17) << 18)
        | u64::from(y & 0o777_777)
}

fn machine_with(program: &[(u32, u64)]) -> Ka10Machine {
    let mut m = Ka10Machine::new();
    for &(addr, word) in program {
        m.deposit(addr, word).expect("deposit");
    }
    m
}

fn step(m: &mut Ka10Machine) {
    m.step().expect("no stop expected");
}

#[test]
fn add_basic() {
    let mut m = machine_with(&[
        (0o100, 1),
        (1, 2),
        (0o1000, inst(0o270, 1, false, 0, 0o100)), // ADD 1,100
    ]);
    m.set_pc(0o1000);
    step(&mut m);
    assert_eq!(m.examine(1).unwrap(), 3);
    assert_eq!(m.flags() & (OVR | CRY0 | CRY1), 0);
    assert_eq!(m.pc(), 0o1001);
}

#[test]
fn add_overflow_sets_carry0_only() {
    let mut m = machine_with(&[
        (0o100, SMASK),
        (1, SMASK),
        (0o1000, inst(0o270, 1, false, 0, 0o100)),
    ]);
    m.set_pc(0o1000);
    step(&mut m);
    assert_eq!(m.examine(1).unwrap(), 0);
    assert_ne!(m.flags() & OVR, 0);
    assert_ne!(m.flags() & CRY0, 0);
    assert_eq!(m.flags() & CRY1, 0);
}

#[test]
fn sub_basic() {
    let mut m = machine_with(&[
        (0o100, 3),
        (1, 10),
        (0o1000, inst(0o274, 1, false, 0, 0o100)), // SUB 1,100
    ]);
    m.set_pc(0o1000);
    step(&mut m);
    assert_eq!(m.examine(1).unwrap(), 7);
}

#[test]
fn movn_of_minus_max_overflows() {
    let mut m = machine_with(&[
        (1, SMASK),
        (0o1000, inst(0o210, 1, false, 0, 1)), // MOVN 1,1
    ]);
    m.set_pc(0o1000);
    step(&mut m);
    assert_eq!(m.examine(1).unwrap(), SMASK);
    assert_ne!(m.flags() & OVR, 0);
}

#[test]
fn movn_round_trip() {
    let mut m = machine_with(&[
        (1, 5),
        (0o1000, inst(0o210, 1, false, 0, 1)),
        (0o1001, inst(0o210, 1, false, 0, 1)),
    ]);
    m.set_pc(0o1000);
    step(&mut m);
    assert_eq!(m.examine(1).unwrap(), 0o777_777_777_773); // -5
    step(&mut m);
    assert_eq!(m.examine(1).unwrap(), 5);
}

#[test]
fn movei_movem_moves() {
    let mut m = machine_with(&[
        (0o1000, inst(0o201, 1, false, 0, 0o1234)), // MOVEI 1,1234
        (0o1001, inst(0o202, 1, false, 0, 0o300)),  // MOVEM 1,300
        (0o1002, inst(0o205, 2, false, 0, 0o77)),   // MOVSI 2,77
    ]);
    m.set_pc(0o1000);
    step(&mut m);
    step(&mut m);
    step(&mut m);
    assert_eq!(m.examine(0o300).unwrap(), 0o1234);
    assert_eq!(m.examine(2).unwrap(), 0o77 << 18);
}

#[test]
fn indexing_and_indirection() {
    let mut m = machine_with(&[
        (2, 0o50),                                  // index register
        (0o150, 0o42),                              // target via index
        (0o200, inst(0, 0, false, 0, 0o150)),       // pointer word
        (0o1000, inst(0o200, 1, false, 2, 0o100)),  // MOVE 1,100(2)
        (0o1001, inst(0o200, 3, true, 0, 0o200)),   // MOVE 3,@200
    ]);
    m.set_pc(0o1000);
    step(&mut m);
    assert_eq!(m.examine(1).unwrap(), 0o42);
    step(&mut m);
    assert_eq!(m.examine(3).unwrap(), 0o42);
}

#[test]
fn byte_load_deposit_round_trip() {
    // Pointer: size 4, position 32 - the high nibble of the word at 200.
    let pointer = (0o40u64 << 30) | (0o04u64 << 24) | 0o200;
    let word = 0o123456_765432;
    let mut m = machine_with(&[
        (0o100, pointer),
        (0o200, word),
        (0o1000, inst(0o135, 1, false, 0, 0o100)), // LDB 1,100
        (0o1001, inst(0o137, 1, false, 0, 0o100)), // DPB 1,100
    ]);
    m.set_pc(0o1000);
    step(&mut m); // first phase
    assert_ne!(m.flags() & BYTI, 0);
    step(&mut m); // second phase
    assert_eq!(m.examine(1).unwrap(), 1);
    assert_eq!(m.flags() & BYTI, 0);
    assert_eq!(m.pc(), 0o1001);
    step(&mut m);
    step(&mut m);
    assert_eq!(m.examine(0o200).unwrap(), word);
    assert_eq!(m.pc(), 0o1002);
}

#[test]
fn ildb_advances_to_high_nibble() {
    // Position 36: the canonical "before the first byte" pointer.
    let pointer = (0o44u64 << 30) | (0o04u64 << 24) | 0o200;
    let mut m = machine_with(&[
        (0o100, pointer),
        (0o200, 0o123456_765432),
        (0o1000, inst(0o134, 1, false, 0, 0o100)), // ILDB 1,100
    ]);
    m.set_pc(0o1000);
    step(&mut m);
    step(&mut m);
    assert_eq!(m.examine(1).unwrap(), 1);
    // The increment wrote the updated pointer back: position 32.
    assert_eq!(
        m.examine(0o100).unwrap(),
        (0o40u64 << 30) | (0o04u64 << 24) | 0o200
    );
}

#[test]
fn ibp_crosses_word_boundary() {
    // Size 18, position 0: the next increment must move to the next word.
    let pointer = (0o00u64 << 30) | (0o22u64 << 24) | 0o200;
    let mut m = machine_with(&[
        (0o100, pointer),
        (0o1000, inst(0o133, 0, false, 0, 0o100)), // IBP 100
    ]);
    m.set_pc(0o1000);
    step(&mut m);
    let updated = m.examine(0o100).unwrap();
    assert_eq!(updated & 0o777_777, 0o201); // word advanced
    assert_eq!((updated >> 30) & 0o77, 18); // position 36 - 18
}

#[test]
fn boolean_functions() {
    let mut m = machine_with(&[
        (0o100, 0o707070_707070),
        (1, 0o777000_000777),
        (2, 0o777000_000777),
        (3, 0o777000_000777),
        (0o1000, inst(0o404, 1, false, 0, 0o100)), // AND 1,100
        (0o1001, inst(0o430, 2, false, 0, 0o100)), // XOR 2,100
        (0o1002, inst(0o460, 3, false, 0, 0o100)), // SETCM 3,100
    ]);
    m.set_pc(0o1000);
    step(&mut m);
    step(&mut m);
    step(&mut m);
    assert_eq!(m.examine(1).unwrap(), 0o707070_707070 & 0o777000_000777);
    assert_eq!(m.examine(2).unwrap(), 0o707070_707070 ^ 0o777000_000777);
    assert_eq!(m.examine(3).unwrap(), !0o707070_707070u64 & FMASK);
}

#[test]
fn halfword_left_then_right_recovers() {
    let mut m = machine_with(&[
        (0o100, 0o123456_765432),
        (0o1000, inst(0o510, 1, false, 0, 0o100)), // HLLZ 1,100
        (0o1001, inst(0o554, 2, false, 0, 1)),     // HLRZ 2,1
    ]);
    m.set_pc(0o1000);
    step(&mut m);
    assert_eq!(m.examine(1).unwrap(), 0o123456u64 << 18);
    step(&mut m);
    assert_eq!(m.examine(2).unwrap(), 0o123456);
}

#[test]
fn halfword_extend_sign() {
    let mut m = machine_with(&[
        (0o100, 0o000000_400001),
        (0o1000, inst(0o570, 1, false, 0, 0o100)), // HRRE 1,100
    ]);
    m.set_pc(0o1000);
    step(&mut m);
    assert_eq!(m.examine(1).unwrap(), 0o777777_400001);
}

#[test]
fn test_family_skip_and_modify() {
    let mut m = machine_with(&[
        (1, 0o7),
        (0o1000, inst(0o602, 1, false, 0, 0o1)), // TRNE 1,1: masked bit set
        (0o1001, inst(0o201, 2, false, 0, 0o11)), // MOVEI 2,11 (not skipped)
        (0o1002, inst(0o620, 1, false, 0, 0o3)), // TRZ 1,3
    ]);
    m.set_pc(0o1000);
    step(&mut m);
    // TRNE skips when the masked bits are zero; 7 & 1 != 0, no skip.
    assert_eq!(m.pc(), 0o1001);
    step(&mut m);
    step(&mut m);
    assert_eq!(m.examine(1).unwrap(), 0o4);
}

#[test]
fn compare_immediate_skips() {
    let mut m = machine_with(&[
        (1, 5),
        (0o1000, inst(0o302, 1, false, 0, 5)),    // CAIE 1,5
        (0o1001, inst(0o201, 2, false, 0, 0o777)), // skipped
        (0o1002, inst(0o201, 3, false, 0, 0o111)),
    ]);
    m.set_pc(0o1000);
    step(&mut m);
    assert_eq!(m.pc(), 0o1002);
    step(&mut m);
    assert_eq!(m.examine(2).unwrap(), 0);
    assert_eq!(m.examine(3).unwrap(), 0o111);
}

#[test]
fn aoj_jumps_and_sos_skips() {
    let mut m = machine_with(&[
        (1, FMASK), // -1: AOJE jumps when result is zero
        (0o200, 2),
        (0o1000, inst(0o342, 1, false, 0, 0o2000)), // AOJE 1,2000
        (0o2000, inst(0o370, 2, false, 0, 0o200)),  // SOS 2,200
    ]);
    m.set_pc(0o1000);
    step(&mut m);
    assert_eq!(m.pc(), 0o2000);
    assert_eq!(m.examine(1).unwrap(), 0);
    step(&mut m);
    assert_eq!(m.examine(0o200).unwrap(), 1);
    assert_eq!(m.examine(2).unwrap(), 1); // SACZ stored to AC 2
}

#[test]
fn shifts_restore_and_rotate() {
    let mut m = machine_with(&[
        (1, 0o1234),
        (2, 0o1234),
        (0o1000, inst(0o240, 1, false, 0, 3)), // ASH 1,3
        (0o1001, inst(0o240, 1, false, 0, 0o777775)), // ASH 1,-3
        (0o1002, inst(0o241, 2, false, 0, 36)), // ROT 2,44 (36 decimal)
    ]);
    m.set_pc(0o1000);
    step(&mut m);
    assert_eq!(m.examine(1).unwrap(), 0o12340);
    step(&mut m);
    assert_eq!(m.examine(1).unwrap(), 0o1234);
    assert_eq!(m.flags() & OVR, 0);
    step(&mut m);
    assert_eq!(m.examine(2).unwrap(), 0o1234); // full rotation
}

#[test]
fn lsh_left_and_negative_count_clears() {
    let mut m = machine_with(&[
        (1, 0o1234),
        (0o1000, inst(0o242, 1, false, 0, 3)), // LSH 1,3
        (0o1001, inst(0o242, 1, false, 0, 0o777775)), // LSH 1,-3
    ]);
    m.set_pc(0o1000);
    step(&mut m);
    assert_eq!(m.examine(1).unwrap(), 0o12340);
    step(&mut m);
    // The count field's eight-bit complement leaves bit 8 standing, so a
    // negative LSH count is at least 256: everything shifts out.
    assert_eq!(m.examine(1).unwrap(), 0);
}

#[test]
fn rotc_negative_count_uses_nine_bits() {
    let mut m = machine_with(&[
        (1, 1),
        (2, 0),
        (0o1000, inst(0o245, 1, false, 0, 0o777774)), // ROTC 1,-4
    ]);
    m.set_pc(0o1000);
    step(&mut m);
    // Rotating the pair right by four carries AR's low bit into MQ.
    assert_eq!(m.examine(1).unwrap(), 0);
    assert_eq!(m.examine(2).unwrap(), 1 << 32);
}

#[test]
fn rotc_by_minus_256_rotates_fully() {
    // ROT's eight-bit decode turns -256 into zero, but ROTC's nine-bit
    // decode keeps it: 256 mod 72 leaves a rotation of 40.
    let mut m = machine_with(&[
        (1, 1),
        (2, 0),
        (3, 1),
        (0o1000, inst(0o245, 1, false, 0, 0o777400)), // ROTC 1,-256
        (0o1001, inst(0o241, 3, false, 0, 0o777400)), // ROT 3,-256
    ]);
    m.set_pc(0o1000);
    step(&mut m);
    assert_eq!(m.examine(1).unwrap(), 1 << 32);
    assert_eq!(m.examine(2).unwrap(), 0);
    step(&mut m);
    assert_eq!(m.examine(3).unwrap(), 1); // untouched
}

#[test]
fn ash_overflow_flagged() {
    let mut m = machine_with(&[
        (1, 0o200000_000000), // bit 1 set
        (0o1000, inst(0o240, 1, false, 0, 1)), // ASH 1,1
    ]);
    m.set_pc(0o1000);
    step(&mut m);
    assert_ne!(m.flags() & OVR, 0);
}

#[test]
fn ashc_pair_shift_right() {
    let mut m = machine_with(&[
        (1, 1),
        (2, 0),
        (0o1000, inst(0o244, 1, false, 0, 0o777777)), // ASHC 1,-1
    ]);
    m.set_pc(0o1000);
    step(&mut m);
    // AR's low bit crosses into the top magnitude bit of MQ.
    assert_eq!(m.examine(1).unwrap(), 0);
    assert_eq!(m.examine(2).unwrap(), 1 << 34);
    assert_eq!(m.flags() & OVR, 0);
}

#[test]
fn jffo_counts_leading_zeros() {
    let mut m = machine_with(&[
        (1, 1),
        (0o1000, inst(0o243, 1, false, 0, 0o2000)), // JFFO 1,2000
    ]);
    m.set_pc(0o1000);
    step(&mut m);
    assert_eq!(m.pc(), 0o2000);
    assert_eq!(m.examine(2).unwrap(), 35);
}

#[test]
fn jffo_zero_does_not_jump() {
    let mut m = machine_with(&[
        (1, 0),
        (0o1000, inst(0o243, 1, false, 0, 0o2000)),
    ]);
    m.set_pc(0o1000);
    step(&mut m);
    assert_eq!(m.pc(), 0o1001);
    assert_eq!(m.examine(2).unwrap(), 0);
}

#[test]
fn exch_swaps() {
    let mut m = machine_with(&[
        (1, 0o111),
        (0o100, 0o222),
        (0o1000, inst(0o250, 1, false, 0, 0o100)),
    ]);
    m.set_pc(0o1000);
    step(&mut m);
    assert_eq!(m.examine(1).unwrap(), 0o222);
    assert_eq!(m.examine(0o100).unwrap(), 0o111);
}

#[test]
fn blt_copies_block() {
    let mut m = machine_with(&[
        (0o100, 0o11),
        (0o101, 0o22),
        (0o102, 0o33),
        (1, (0o100 << 18) | 0o200),
        (0o1000, inst(0o251, 1, false, 0, 0o202)), // BLT 1,202
    ]);
    m.set_pc(0o1000);
    step(&mut m);
    assert_eq!(m.examine(0o200).unwrap(), 0o11);
    assert_eq!(m.examine(0o201).unwrap(), 0o22);
    assert_eq!(m.examine(0o202).unwrap(), 0o33);
    assert_eq!(m.pc(), 0o1001);
}

#[test]
fn push_pop_round_trip() {
    let stack = (((FMASK - 2) << 18) | 0o477) & FMASK; // -3,,477
    let mut m = machine_with(&[
        (0o17, stack),
        (0o100, 0o4242),
        (0o1000, inst(0o261, 0o17, false, 0, 0o100)), // PUSH 17,100
        (0o1001, inst(0o262, 0o17, false, 0, 0o102)), // POP 17,102
    ]);
    m.set_pc(0o1000);
    step(&mut m);
    assert_eq!(m.examine(0o500).unwrap(), 0o4242);
    assert!(!m.push_ovf());
    step(&mut m);
    assert_eq!(m.examine(0o102).unwrap(), 0o4242);
    assert_eq!(m.examine(0o17).unwrap(), stack);
}

#[test]
fn push_overflow_latches() {
    let stack = (FMASK << 18) & FMASK; // -1,,0: one slot left
    let mut m = machine_with(&[
        (0o17, stack),
        (0o100, 1),
        (0o1000, inst(0o261, 0o17, false, 0, 0o100)),
    ]);
    m.set_pc(0o1000);
    step(&mut m);
    assert!(m.push_ovf());
}

#[test]
fn pushj_popj_call_return() {
    let stack = (((FMASK - 3) << 18) | 0o477) & FMASK;
    let mut m = machine_with(&[
        (0o17, stack),
        (0o1000, inst(0o260, 0o17, false, 0, 0o2000)), // PUSHJ 17,2000
        (0o1001, inst(0o201, 3, false, 0, 0o55)),      // after return
        (0o2000, inst(0o263, 0o17, false, 0, 0)),      // POPJ 17,
    ]);
    m.set_pc(0o1000);
    step(&mut m);
    assert_eq!(m.pc(), 0o2000);
    assert_eq!(m.examine(0o500).unwrap() & 0o777_777, 0o1001);
    step(&mut m);
    assert_eq!(m.pc(), 0o1001);
    assert_eq!(m.examine(0o17).unwrap(), stack);
    step(&mut m);
    assert_eq!(m.examine(3).unwrap(), 0o55);
}

#[test]
fn jsr_jsp_save_return_state() {
    let mut m = machine_with(&[
        (0o1000, inst(0o264, 0, false, 0, 0o2000)), // JSR 2000
        (0o2001, inst(0o265, 5, false, 0, 0o3000)), // JSP 5,3000
    ]);
    m.set_pc(0o1000);
    step(&mut m);
    assert_eq!(m.pc(), 0o2001);
    assert_eq!(m.examine(0o2000).unwrap() & 0o777_777, 0o1001);
    step(&mut m);
    assert_eq!(m.pc(), 0o3000);
    assert_eq!(m.examine(5).unwrap() & 0o777_777, 0o2002);
}

#[test]
fn jsa_jra_pair() {
    let mut m = machine_with(&[
        (1, 0o654321),
        (0o1000, inst(0o266, 1, false, 0, 0o2000)), // JSA 1,2000
        (0o2001, inst(0o267, 1, false, 0, 0o1001)), // JRA 1,1001
    ]);
    m.set_pc(0o1000);
    step(&mut m);
    assert_eq!(m.pc(), 0o2001);
    assert_eq!(m.examine(0o2000).unwrap(), 0o654321); // old AC saved at E
    assert_eq!(m.examine(1).unwrap(), (0o2000 << 18) | 0o1001);
    step(&mut m);
    assert_eq!(m.pc(), 0o1001);
    assert_eq!(m.examine(1).unwrap(), 0o654321); // restored from M[E-left]
}

#[test]
fn aobjn_loop_counts() {
    // AC = -2,,300: two iterations of a one-instruction loop.
    let counter = ((FMASK - 1) << 18 | 0o300) & FMASK;
    let mut m = machine_with(&[
        (1, counter),
        (0o1000, inst(0o253, 1, false, 0, 0o1000)), // AOBJN 1,1000
    ]);
    m.set_pc(0o1000);
    step(&mut m);
    assert_eq!(m.pc(), 0o1000); // jumped back
    step(&mut m);
    assert_eq!(m.pc(), 0o1001); // count exhausted
    assert_eq!(m.examine(1).unwrap() & 0o777_777, 0o302);
}

#[test]
fn xct_executes_target_in_place() {
    let mut m = machine_with(&[
        (0o1000, inst(0o256, 0, false, 0, 0o2000)), // XCT 2000
        (0o2000, inst(0o201, 1, false, 0, 0o77)),   // MOVEI 1,77
    ]);
    m.set_pc(0o1000);
    step(&mut m); // XCT
    step(&mut m); // the target
    assert_eq!(m.examine(1).unwrap(), 0o77);
    assert_eq!(m.pc(), 0o1001);
}

#[test]
fn xct_chain_hits_limit() {
    let mut m = machine_with(&[
        (0o1000, inst(0o256, 0, false, 0, 0o1000)), // XCT 1000 (itself)
    ]);
    m.set_limits(None, Some(8));
    m.set_pc(0o1000);
    let stop = m.run();
    assert_eq!(stop, Stop::XctLimit);
}

#[test]
fn indirect_chain_hits_limit() {
    let mut m = machine_with(&[
        (0o2000, inst(0, 0, true, 0, 0o2000)), // @2000 points at itself
        (0o1000, inst(0o200, 1, true, 0, 0o2000)), // MOVE 1,@2000
    ]);
    m.set_limits(Some(16), None);
    m.set_pc(0o1000);
    let stop = m.run();
    assert_eq!(stop, Stop::IndirectLimit);
}

#[test]
fn jrst_halt_stops() {
    let mut m = machine_with(&[
        (0o1000, inst(0o254, 0o4, false, 0, 0o3000)), // JRST 4,3000
    ]);
    m.set_pc(0o1000);
    assert_eq!(m.run(), Stop::Halt);
    assert_eq!(m.pc(), 0o3000);
}

#[test]
fn imul_and_idiv() {
    let mut m = machine_with(&[
        (0o100, 7),
        (1, 6),
        (3, 45),
        (0o1000, inst(0o220, 1, false, 0, 0o100)), // IMUL 1,100
        (0o1001, inst(0o231, 3, false, 0, 7)),     // IDIVI 3,7
    ]);
    m.set_pc(0o1000);
    step(&mut m);
    assert_eq!(m.examine(1).unwrap(), 42);
    step(&mut m);
    assert_eq!(m.examine(3).unwrap(), 6); // quotient
    assert_eq!(m.examine(4).unwrap(), 3); // remainder
}

#[test]
fn imul_negative_operand() {
    let mut m = machine_with(&[
        (0o100, 0o777_777_777_771), // -7
        (1, 3),
        (0o1000, inst(0o220, 1, false, 0, 0o100)),
    ]);
    m.set_pc(0o1000);
    step(&mut m);
    assert_eq!(m.examine(1).unwrap(), 0o777_777_777_753); // -21
}

#[test]
fn idiv_by_zero_abandons() {
    let mut m = machine_with(&[
        (0o100, 0),
        (1, 42),
        (0o1000, inst(0o230, 1, false, 0, 0o100)), // IDIV 1,100
    ]);
    m.set_pc(0o1000);
    step(&mut m);
    assert_ne!(m.flags() & OVR, 0);
    assert_ne!(m.flags() & cpu_pdp10::flags::NODIV, 0);
    assert_eq!(m.examine(1).unwrap(), 42); // AC untouched
}

#[test]
fn div_double_dividend() {
    // 0,,100 / 9 = 9 remainder 1 with the high word zero.
    let mut m = machine_with(&[
        (0o100, 9),
        (1, 0),
        (2, 82),
        (0o1000, inst(0o234, 1, false, 0, 0o100)), // DIV 1,100
    ]);
    m.set_pc(0o1000);
    step(&mut m);
    assert_eq!(m.examine(1).unwrap(), 9);
    assert_eq!(m.examine(2).unwrap(), 1);
}

#[test]
fn mul_produces_double_product() {
    let big = 1u64 << 20;
    let mut m = machine_with(&[
        (0o100, big),
        (1, big),
        (0o1000, inst(0o224, 1, false, 0, 0o100)), // MUL 1,100
    ]);
    m.set_pc(0o1000);
    step(&mut m);
    // 2^40 = 2^5 in the high word, 0 in the low 35 bits.
    assert_eq!(m.examine(1).unwrap(), 1 << 5);
    assert_eq!(m.examine(2).unwrap(), 0);
}

#[test]
fn history_records_instructions() {
    let mut m = machine_with(&[
        (0o100, 1),
        (1, 2),
        (0o1000, inst(0o270, 1, false, 0, 0o100)),
    ]);
    m.set_history(64).expect("valid length");
    m.set_pc(0o1000);
    step(&mut m);
    let entries: Vec<_> = m.history().collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].pc, 0o1000);
    assert_eq!(entries[0].ea, 0o100);
    assert_eq!(entries[0].result, 3);
}

#[test]
fn history_length_validated() {
    let mut m = Ka10Machine::new();
    assert!(m.set_history(63).is_err());
    assert!(m.set_history(65537).is_err());
    assert!(m.set_history(0).is_ok());
    assert!(m.set_history(64).is_ok());
}

#[test]
fn breakpoint_event_stops_the_run() {
    let mut m = machine_with(&[(0o1000, inst(0o201, 1, false, 0, 1))]);
    m.set_pc(0o1000);
    m.post(HostEvent::Stop(Stop::Breakpoint));
    m.set_interval(0);
    assert_eq!(m.run(), Stop::Breakpoint);
}

#[test]
fn memory_size_validated() {
    let mut m = Ka10Machine::new();
    assert!(m.set_memory_size(0).is_err());
    assert!(m.set_memory_size(17).is_err()); // KA10 tops out at 256K
    assert!(m.set_memory_size(4).is_ok());
    assert_eq!(m.memory_size(), 64 * 1024);
    assert!(m.examine(0o200_0000).is_err());
}
