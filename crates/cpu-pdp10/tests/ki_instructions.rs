//! KI10-only instructions: double moves, double-precision floating
//! point, and the fixed/float conversions.

use cpu_pdp10::Ki10Machine;
use cpu_pdp10::flags::{BYTI, OVR, TRP1};

fn inst(op: u32, ac: u32, ind: bool, idx: u32, y: u32) -> u64 {
    (u64::from(op & 0o777) << 27)
        | (u64::from(ac & 0o17) << 23)
        | (u64::from(ind) << 22)
        | (u64::from(idx & 0o17) << 18)
        | u64::from(y & 0o777_777)
}

fn step(m: &mut Ki10Machine) {
    m.step().expect("no stop expected");
}

/// Single-precision float for small positive integers.
fn fp(exp: u64, mantissa: u64) -> u64 {
    (exp << 27) | mantissa
}

const ONE: u64 = 0o201_400_000_000; // 1.0
const TWO: u64 = 0o202_400_000_000; // 2.0

#[test]
fn dmove_loads_pair() {
    let mut m = Ki10Machine::new();
    m.deposit(0o100, 0o111).unwrap();
    m.deposit(0o101, 0o222).unwrap();
    m.deposit(0o1000, inst(0o120, 2, false, 0, 0o100)).unwrap();
    m.set_pc(0o1000);
    step(&mut m);
    assert_eq!(m.examine(2).unwrap(), 0o111);
    assert_eq!(m.examine(3).unwrap(), 0o222);
}

#[test]
fn dmovem_stores_pair_in_two_passes() {
    let mut m = Ki10Machine::new();
    m.deposit(2, 0o111).unwrap();
    m.deposit(3, 0o222).unwrap();
    m.deposit(0o1000, inst(0o124, 2, false, 0, 0o100)).unwrap();
    m.set_pc(0o1000);
    step(&mut m); // high word, BYTI latched
    assert_ne!(m.flags() & BYTI, 0);
    assert_eq!(m.examine(0o100).unwrap(), 0o111);
    step(&mut m); // low word
    assert_eq!(m.flags() & BYTI, 0);
    assert_eq!(m.examine(0o101).unwrap(), 0o222);
    assert_eq!(m.pc(), 0o1001);
}

#[test]
fn dmovn_negates_double() {
    let mut m = Ki10Machine::new();
    // +1 as a double: high 0, low 1. Negated: -1 = all ones in both
    // magnitudes with the high sign set.
    m.deposit(0o100, 0).unwrap();
    m.deposit(0o101, 1).unwrap();
    m.deposit(0o1000, inst(0o121, 2, false, 0, 0o100)).unwrap();
    m.set_pc(0o1000);
    step(&mut m);
    assert_eq!(m.examine(2).unwrap(), 0o777_777_777_777);
    assert_eq!(m.examine(3).unwrap(), 0o377_777_777_777);
}

#[test]
fn dfad_adds_doubles() {
    let mut m = Ki10Machine::new();
    m.deposit(2, ONE).unwrap();
    m.deposit(3, 0).unwrap();
    m.deposit(0o100, ONE).unwrap();
    m.deposit(0o101, 0).unwrap();
    m.deposit(0o1000, inst(0o110, 2, false, 0, 0o100)).unwrap();
    m.set_pc(0o1000);
    step(&mut m);
    assert_eq!(m.examine(2).unwrap(), TWO);
    assert_eq!(m.examine(3).unwrap(), 0);
}

#[test]
fn dfsb_subtracts_to_zero() {
    let mut m = Ki10Machine::new();
    m.deposit(2, ONE).unwrap();
    m.deposit(3, 0).unwrap();
    m.deposit(0o100, ONE).unwrap();
    m.deposit(0o101, 0).unwrap();
    m.deposit(0o1000, inst(0o111, 2, false, 0, 0o100)).unwrap();
    m.set_pc(0o1000);
    step(&mut m);
    assert_eq!(m.examine(2).unwrap(), 0);
    assert_eq!(m.examine(3).unwrap(), 0);
}

#[test]
fn dfmp_multiplies() {
    let mut m = Ki10Machine::new();
    m.deposit(2, TWO).unwrap();
    m.deposit(3, 0).unwrap();
    m.deposit(0o100, TWO).unwrap();
    m.deposit(0o101, 0).unwrap();
    m.deposit(0o1000, inst(0o112, 2, false, 0, 0o100)).unwrap();
    m.set_pc(0o1000);
    step(&mut m);
    assert_eq!(m.examine(2).unwrap(), fp(0o203, 0o400_000_000)); // 4.0
    assert_eq!(m.examine(3).unwrap(), 0);
}

#[test]
fn dfdv_divides() {
    let mut m = Ki10Machine::new();
    m.deposit(2, fp(0o203, 0o400_000_000)).unwrap(); // 4.0
    m.deposit(3, 0).unwrap();
    m.deposit(0o100, TWO).unwrap();
    m.deposit(0o101, 0).unwrap();
    m.deposit(0o1000, inst(0o113, 2, false, 0, 0o100)).unwrap();
    m.set_pc(0o1000);
    step(&mut m);
    assert_eq!(m.examine(2).unwrap(), TWO);
    assert_eq!(m.examine(3).unwrap(), 0);
}

#[test]
fn dfdv_abandons_on_large_dividend() {
    let mut m = Ki10Machine::new();
    m.deposit(2, fp(0o203, 0o400_000_000)).unwrap();
    m.deposit(3, 0).unwrap();
    m.deposit(0o100, 0).unwrap(); // divide by zero
    m.deposit(0o101, 0).unwrap();
    m.deposit(0o1000, inst(0o113, 2, false, 0, 0o100)).unwrap();
    m.set_pc(0o1000);
    step(&mut m);
    assert_ne!(m.flags() & OVR, 0);
    assert_ne!(m.flags() & TRP1, 0);
    assert_eq!(m.examine(2).unwrap(), fp(0o203, 0o400_000_000)); // untouched
}

#[test]
fn fix_truncates_and_fixr_rounds() {
    let mut m = Ki10Machine::new();
    // 2.5 = exponent 202, mantissa 0.101b
    let two_and_half = fp(0o202, 0o500_000_000);
    m.deposit(0o100, two_and_half).unwrap();
    m.deposit(0o1000, inst(0o122, 1, false, 0, 0o100)).unwrap(); // FIX
    m.deposit(0o1001, inst(0o126, 2, false, 0, 0o100)).unwrap(); // FIXR
    m.set_pc(0o1000);
    step(&mut m);
    assert_eq!(m.examine(1).unwrap(), 2);
    step(&mut m);
    assert_eq!(m.examine(2).unwrap(), 3);
}

#[test]
fn fix_overflow_on_huge_exponent() {
    let mut m = Ki10Machine::new();
    m.deposit(0o100, fp(0o300, 0o400_000_000)).unwrap();
    m.deposit(0o1000, inst(0o122, 1, false, 0, 0o100)).unwrap();
    m.set_pc(0o1000);
    step(&mut m);
    assert_ne!(m.flags() & OVR, 0);
    assert_ne!(m.flags() & TRP1, 0);
    assert_eq!(m.examine(1).unwrap(), 0); // store inhibited
}

#[test]
fn fltr_floats_integers() {
    let mut m = Ki10Machine::new();
    m.deposit(0o100, 5).unwrap();
    m.deposit(0o101, 0o777_777_777_773).unwrap(); // -5
    m.deposit(0o1000, inst(0o127, 1, false, 0, 0o100)).unwrap();
    m.deposit(0o1001, inst(0o127, 2, false, 0, 0o101)).unwrap();
    m.set_pc(0o1000);
    step(&mut m);
    assert_eq!(m.examine(1).unwrap(), fp(0o203, 0o500_000_000)); // 5.0
    step(&mut m);
    // -5.0: two's complement of the whole word
    assert_eq!(
        m.examine(2).unwrap(),
        (!fp(0o203, 0o500_000_000) + 1) & 0o777_777_777_777
    );
}

#[test]
fn movn_of_minus_max_sets_trap1() {
    let mut m = Ki10Machine::new();
    m.deposit(1, 0o400_000_000_000).unwrap();
    m.deposit(0o1000, inst(0o210, 1, false, 0, 1)).unwrap();
    m.set_pc(0o1000);
    step(&mut m);
    assert_ne!(m.flags() & OVR, 0);
    assert_ne!(m.flags() & TRP1, 0);
}

#[test]
fn ki_rotc_by_minus_256_rotates() {
    let mut m = Ki10Machine::new();
    m.deposit(1, 1).unwrap();
    m.deposit(2, 0).unwrap();
    // -256 in the right half: low byte zero, the KI decode maps it to a
    // full 0400 count. 256 mod 72 = 40, right rotation.
    m.deposit(0o1000, inst(0o245, 1, false, 0, 0o777400)).unwrap();
    m.set_pc(0o1000);
    step(&mut m);
    // Equivalent to a left rotation by 32: AR's low bit lands at bit 32.
    let ar = m.examine(1).unwrap();
    let mq = m.examine(2).unwrap();
    assert_eq!((ar, mq), (1 << 32, 0));
}
