//! Trap vectoring: local and monitor UUOs, unassigned opcodes, and the
//! user-mode IOT trap, on both variants.

use cpu_pdp10::flags::USER;
use cpu_pdp10::{Ka10Machine, Ki10Machine};

fn inst(op: u32, ac: u32, ind: bool, idx: u32, y: u32) -> u64 {
    (u64::from(op & 0o777) << 27)
        | (u64::from(ac & 0o17) << 23)
        | (u64::from(ind) << 22)
        | (u64::from(idx & 0o17) << 18)
        | u64::from(y & 0o777_777)
}

#[test]
fn ka_luuo_stores_word_and_runs_41() {
    let mut m = Ka10Machine::new();
    m.deposit(0o41, inst(0o264, 0, false, 0, 0o500)).unwrap(); // JSR 500
    m.deposit(0o1000, inst(0o001, 2, false, 0, 0o1234)).unwrap(); // LUUO 1
    m.set_pc(0o1000);
    m.step().unwrap(); // the trap stores and redirects
    assert_eq!(
        m.examine(0o40).unwrap(),
        (1u64 << 27) | (2 << 23) | 0o1234
    );
    m.step().unwrap(); // the instruction at 41 runs as the handler
    assert_eq!(m.examine(0o500).unwrap() & 0o777_777, 0o1001);
    assert_eq!(m.pc(), 0o501);
}

#[test]
fn ka_unassigned_opcode_vectors_to_60() {
    let mut m = Ka10Machine::new();
    m.deposit(0o61, inst(0o264, 0, false, 0, 0o510)).unwrap(); // JSR 510
    m.deposit(0o1000, inst(0o101, 0, false, 0, 0o42)).unwrap(); // unassigned
    m.set_pc(0o1000);
    m.step().unwrap();
    assert_eq!(m.examine(0o60).unwrap(), (0o101u64 << 27) | 0o42);
    m.step().unwrap();
    assert_eq!(m.examine(0o510).unwrap() & 0o777_777, 0o1001);
}

#[test]
fn ka_user_iot_traps_and_clears_user() {
    let mut m = Ka10Machine::new();
    m.deposit(0o41, inst(0o264, 0, false, 0, 0o500)).unwrap();
    // User mode, no USERIO: CONO APR is a monitor UUO.
    m.deposit(0o1000, inst(0o700, 4, false, 0, 0o2004)).unwrap();
    m.set_flags(USER);
    m.set_pc(0o1000);
    m.step().unwrap();
    assert_eq!(
        m.examine(0o40).unwrap(),
        (0o700u64 << 27) | (4 << 23) | 0o2004
    );
    m.step().unwrap(); // JSR from the trap vector drops to executive
    assert_eq!(m.flags() & USER, 0);
    assert_eq!(m.examine(0o500).unwrap() & 0o777_777, 0o1001);
}

#[test]
fn ki_muuo_uses_process_table() {
    let mut m = Ki10Machine::new();
    // ub_ptr defaults to zero, so the table sits at 424/425/430.
    m.deposit(0o430, inst(0, 0, false, 0, 0o2000)).unwrap(); // new PC word
    m.deposit(0o1000, inst(0o040, 3, false, 0, 0o66)).unwrap(); // MUUO
    m.set_pc(0o1000);
    m.step().unwrap();
    assert_eq!(
        m.examine(0o424).unwrap(),
        (0o040u64 << 27) | (3 << 23) | 0o66
    );
    assert_eq!(m.examine(0o425).unwrap() & 0o777_777, 0o1001);
    assert_eq!(m.pc(), 0o2000);
}

#[test]
fn ki_muuo_vector_selects_user_slot() {
    let mut m = Ki10Machine::new();
    m.mmu.ub_ptr = 0o2000;
    // User accesses always walk the table: identity-map user page 1
    // (1000-1777) so the MUUO itself can be fetched.
    m.deposit(0o2000, cpu_pdp10::word::LSIGN | 1).unwrap();
    // From user mode the new-PC word comes from ub|432 (430 | USER bit).
    m.deposit(0o2432, inst(0, 0, false, 0, 0o3000)).unwrap();
    m.deposit(0o1000, inst(0o040, 0, false, 0, 0)).unwrap();
    m.set_flags(USER);
    m.set_pc(0o1000);
    m.step().unwrap();
    assert_eq!(m.pc(), 0o3000);
    assert_eq!(
        m.examine(0o2424).unwrap(),
        (0o040u64 << 27) | 0
    );
    assert_eq!(m.examine(0o2425).unwrap() & 0o777_777, 0o1001);
}

#[test]
fn ki_luuo_in_executive_uses_ebr_40() {
    let mut m = Ki10Machine::new();
    m.deposit(0o41, inst(0o264, 0, false, 0, 0o500)).unwrap();
    m.deposit(0o1000, inst(0o001, 1, false, 0, 0o777)).unwrap();
    m.set_pc(0o1000);
    m.step().unwrap();
    assert_eq!(
        m.examine(0o40).unwrap(),
        (1u64 << 27) | (1 << 23) | 0o777
    );
    m.step().unwrap();
    assert_eq!(m.pc(), 0o501);
}
