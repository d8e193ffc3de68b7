//! Per-opcode operand-fetch flag words.
//!
//! Every opcode carries a small flag word telling the execution loop which
//! operands to stage before dispatch and which results to store after.
//! The table is load-bearing: the half-word, Boolean, and test families
//! get most of their variant behavior (immediate / memory / self / both)
//! from here rather than from per-opcode code.

const FCE: u16 = 0o0001; // fetch memory into AR
const FCEPSE: u16 = 0o0002; // fetch memory into AR, store AR back after
const SCE: u16 = 0o0004; // store AR into memory
const FAC: u16 = 0o0010; // BR <- AR, AR <- AC
const FAC2: u16 = 0o0020; // MQ <- AC+1
const SAC: u16 = 0o0040; // store AR into AC
const SACZ: u16 = 0o0100; // store AR into AC when the AC field is nonzero
const SAC2: u16 = 0o0200; // store MQ into AC+1
const SWAR: u16 = 0o1000; // swap the halves of AR
const FBR: u16 = 0o2000; // BR <- AC
const FMB: u16 = 0o4000; // BR <- MB

/// Typed view of one opcode's flag word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpFlags(u16);

impl OpFlags {
    pub const NONE: OpFlags = OpFlags(0);
    /// Fetch memory into AR.
    pub const FCE: OpFlags = OpFlags(FCE);
    /// Fetch memory into AR for read-modify-write.
    pub const FCEPSE: OpFlags = OpFlags(FCEPSE);
    /// Store AR into memory.
    pub const SCE: OpFlags = OpFlags(SCE);
    /// Move AR to BR, then fetch the AC into AR.
    pub const FAC: OpFlags = OpFlags(FAC);
    /// Fetch AC+1 into MQ.
    pub const FAC2: OpFlags = OpFlags(FAC2);
    /// Store AR into the AC.
    pub const SAC: OpFlags = OpFlags(SAC);
    /// Store AR into the AC only when the AC field is nonzero.
    pub const SACZ: OpFlags = OpFlags(SACZ);
    /// Store MQ into AC+1.
    pub const SAC2: OpFlags = OpFlags(SAC2);
    /// Swap the halves of AR.
    pub const SWAR: OpFlags = OpFlags(SWAR);
    /// Fetch the AC into BR.
    pub const FBR: OpFlags = OpFlags(FBR);
    /// Copy MB into BR.
    pub const FMB: OpFlags = OpFlags(FMB);

    #[must_use]
    pub(crate) const fn from_bits(bits: u16) -> Self {
        OpFlags(bits)
    }

    /// True when any of the given flags are present.
    #[must_use]
    pub const fn any(self, of: OpFlags) -> bool {
        self.0 & of.0 != 0
    }

    /// Union of two flag words.
    #[must_use]
    pub const fn or(self, other: OpFlags) -> OpFlags {
        OpFlags(self.0 | other.0)
    }
}

/// KA10 operand-fetch table, indexed by the 9-bit opcode.
pub(crate) static OPFLAGS_KA: [u16; 512] = base_table();

/// KI10 table: the KA10 table with the 110-127 block populated
/// (double-precision floating point, double moves, FIX/FLTR).
pub(crate) static OPFLAGS_KI: [u16; 512] = {
    let mut t = base_table();
    t[0o110] = FCE | FAC | FAC2 | SAC | SAC2; // DFAD
    t[0o111] = FCE | FAC | FAC2 | SAC | SAC2; // DFSB
    t[0o112] = FCE | FAC | FAC2 | SAC | SAC2; // DFMP
    t[0o113] = FCE | FAC | FAC2 | SAC | SAC2; // DFDV
    t[0o120] = FCE | SAC | SAC2;              // DMOVE
    t[0o121] = FCE | SAC | SAC2;              // DMOVN
    t[0o122] = FCE | SAC;                     // FIX
    t[0o124] = FAC | FAC2;                    // DMOVEM
    t[0o125] = FAC | FAC2;                    // DMOVNM
    t[0o126] = FCE | SAC;                     // FIXR
    t[0o127] = FCE | SAC;                     // FLTR
    t
};

#[rustfmt::skip]
const fn base_table() -> [u16; 512] {
    let mut t = [0u16; 512];

    // 000-077 LUUO/MUUO and 100-127 (unassigned on the KA10): no operands.

    // 130-137 UFA, DFN, FSC, byte operations
    t[0o130] = FCE | FBR;               // UFA
    t[0o131] = FCE | FAC;               // DFN
    t[0o132] = FAC | SAC;               // FSC
    t[0o133] = FCEPSE;                  // IBP
    t[0o134] = FCEPSE;                  // ILDB
    t[0o135] = FCE;                     // LDB
    t[0o136] = FCEPSE;                  // IDPB
    t[0o137] = FCE;                     // DPB

    // 140-177 floating add/subtract/multiply/divide with R/I/L/M/B modes.
    // FAD, FSB, FMP share a mode pattern; the long and immediate divides
    // differ.
    let mut op = 0o140;
    while op <= 0o170 {
        t[op] = SAC | FBR | FCE;        // basic
        t[op + 1] = SAC | SAC2 | FBR | FCE; // long
        t[op + 2] = FCEPSE | FBR;       // to memory
        t[op + 3] = SAC | FBR | FCEPSE; // to both
        t[op + 4] = SAC | FBR | FCE;    // rounded
        t[op + 5] = SAC | FBR | SWAR;   // rounded immediate
        t[op + 6] = FCEPSE | FBR;       // rounded to memory
        t[op + 7] = SAC | FBR | FCEPSE; // rounded to both
        op += 0o10;
    }
    t[0o171] = FAC2 | SAC2 | SAC | FBR | FCE; // FDVL

    // 200-217 full-word moves
    let mut op = 0o200;
    while op <= 0o214 {
        t[op] = SAC | FCE;              // MOVx
        t[op + 1] = SAC;                // MOVxI
        t[op + 2] = FAC | SCE;          // MOVxM
        t[op + 3] = SACZ | FCEPSE;      // MOVxS
        op += 4;
    }
    t[0o204] |= SWAR;                   // MOVS row adds the swap
    t[0o205] |= SWAR;
    t[0o206] |= SWAR;
    t[0o207] |= SWAR;

    // 220-237 multiply and divide
    t[0o220] = SAC | FCE | FBR;         // IMUL
    t[0o221] = SAC | FBR;
    t[0o222] = FCEPSE | FBR;
    t[0o223] = SAC | FCEPSE | FBR;
    t[0o224] = SAC2 | SAC | FCE | FBR;  // MUL
    t[0o225] = SAC2 | SAC | FBR;
    t[0o226] = FCEPSE | FBR;
    t[0o227] = SAC2 | SAC | FCEPSE | FBR;
    let mut op = 0o230;
    while op <= 0o234 {
        t[op] = SAC2 | SAC | FCE | FAC; // IDIV / DIV
        t[op + 1] = SAC2 | SAC | FAC;
        t[op + 2] = FCEPSE | FAC;
        t[op + 3] = SAC2 | SAC | FCEPSE | FAC;
        op += 4;
    }

    // 240-247 shifts and JFFO
    t[0o240] = FAC | SAC;               // ASH
    t[0o241] = FAC | SAC;               // ROT
    t[0o242] = FAC | SAC;               // LSH
    t[0o243] = FAC;                     // JFFO
    t[0o244] = FAC | SAC | SAC2 | FAC2; // ASHC
    t[0o245] = FAC | SAC | SAC2 | FAC2; // ROTC
    t[0o246] = FAC | SAC | SAC2 | FAC2; // LSHC

    // 250-257 exchange, block transfer, jumps
    t[0o250] = FAC | FCEPSE;            // EXCH
    t[0o251] = FAC;                     // BLT
    t[0o252] = FAC | SAC;               // AOBJP
    t[0o253] = FAC | SAC;               // AOBJN
    t[0o257] = SAC;                     // MAP

    // 260-267 stack and subroutine jumps
    t[0o260] = FAC | SAC;               // PUSHJ
    t[0o261] = FAC | FCE | SAC;         // PUSH
    t[0o262] = FAC | SAC;               // POP
    t[0o263] = FAC | SAC;               // POPJ
    t[0o264] = SCE;                     // JSR
    t[0o265] = SAC;                     // JSP
    t[0o266] = FBR | SCE;               // JSA

    // 270-277 add and subtract
    let mut op = 0o270;
    while op <= 0o274 {
        t[op] = FBR | SAC | FCE;
        t[op + 1] = FBR | SAC;
        t[op + 2] = FBR | FCEPSE;
        t[op + 3] = FBR | SAC | FCEPSE;
        op += 4;
    }

    // 300-377 compare, jump, skip, increment/decrement families
    let mut op = 0o310;
    while op <= 0o317 {
        t[op] = FCE;                    // CAM
        op += 1;
    }
    let mut op = 0o320;
    while op <= 0o327 {
        t[op] = FAC;                    // JUMP
        op += 1;
    }
    let mut op = 0o330;
    while op <= 0o337 {
        t[op] = SACZ | FCE;             // SKIP
        op += 1;
    }
    let mut op = 0o340;
    while op <= 0o347 {
        t[op] = SAC | FAC;              // AOJ
        t[op + 0o20] = SAC | FAC;       // SOJ
        op += 1;
    }
    let mut op = 0o350;
    while op <= 0o357 {
        t[op] = SACZ | FCEPSE;          // AOS
        t[op + 0o20] = SACZ | FCEPSE;   // SOS
        op += 1;
    }

    // 400-477 Boolean: the generic mode pattern, then the rows that take
    // no memory operand (SETZ/SETA/SETCA/SETO) overridden.
    let mut op = 0o400;
    while op <= 0o474 {
        t[op] = FBR | SAC | FCE;
        t[op + 1] = FBR | SAC;
        t[op + 2] = FBR | FCEPSE;
        t[op + 3] = FBR | SAC | FCEPSE;
        op += 4;
    }
    let mut row = 0;
    while row < 4 {
        // SETZ 400, SETA 424, SETCA 450, SETO 474
        let op = [0o400, 0o424, 0o450, 0o474][row];
        t[op] = FBR | SAC;
        t[op + 1] = FBR | SAC;
        t[op + 2] = FBR | SCE;
        t[op + 3] = FBR | SAC | SCE;
        row += 1;
    }
    t[0o414] = FBR | SAC | FCE;         // SETM
    t[0o415] = FBR | SAC;
    t[0o416] = FBR;                     // SETMM
    t[0o417] = FBR | SAC | FCE;         // SETMB

    // 500-577 half-word moves: alternating plain / swapped rows
    let mut op = 0o500;
    while op <= 0o570 {
        t[op] = FBR | SAC | FCE;
        t[op + 1] = FBR | SAC;
        t[op + 2] = FAC | FMB | FCEPSE;
        t[op + 3] = FMB | SACZ | FCEPSE;
        t[op + 4] = SWAR | FBR | SAC | FCE;
        t[op + 5] = SWAR | FBR | SAC;
        t[op + 6] = SWAR | FAC | FMB | FCEPSE;
        t[op + 7] = SWAR | FMB | SACZ | FCEPSE;
        op += 0o10;
    }

    // 600-677 test family: right/left rows, then direct/swapped rows.
    // TxN does not write the AC back; the others do.
    let mut op = 0o600;
    while op <= 0o670 {
        let sac = if op == 0o600 { 0 } else { SAC };
        let mut i = 0;
        while i < 0o10 {
            // even = right/direct mask, odd = left/swapped mask
            let swar = if i & 1 != 0 { SWAR } else { 0 };
            t[op + i] = FBR | sac | swar;
            t[op + 0o10 + i] = FBR | sac | swar | FCE;
            i += 1;
        }
        op += 0o20;
    }

    // 700-777 IOT: operands staged by the device dispatch itself.
    t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_family() {
        assert_eq!(OPFLAGS_KA[0o200], SAC | FCE); // MOVE
        assert_eq!(OPFLAGS_KA[0o201], SAC); // MOVEI
        assert_eq!(OPFLAGS_KA[0o202], FAC | SCE); // MOVEM
        assert_eq!(OPFLAGS_KA[0o205], SWAR | SAC); // MOVSI
        assert_eq!(OPFLAGS_KA[0o213], SACZ | FCEPSE); // MOVNS
    }

    #[test]
    fn arithmetic_and_stack() {
        assert_eq!(OPFLAGS_KA[0o270], FBR | SAC | FCE); // ADD
        assert_eq!(OPFLAGS_KA[0o271], FBR | SAC); // ADDI
        assert_eq!(OPFLAGS_KA[0o234], SAC2 | SAC | FCE | FAC); // DIV
        assert_eq!(OPFLAGS_KA[0o261], FAC | FCE | SAC); // PUSH
        assert_eq!(OPFLAGS_KA[0o264], SCE); // JSR
        assert_eq!(OPFLAGS_KA[0o251], FAC); // BLT
    }

    #[test]
    fn boolean_and_halfword() {
        assert_eq!(OPFLAGS_KA[0o400], FBR | SAC); // SETZ takes no operand
        assert_eq!(OPFLAGS_KA[0o402], FBR | SCE); // SETZM
        assert_eq!(OPFLAGS_KA[0o404], FBR | SAC | FCE); // AND
        assert_eq!(OPFLAGS_KA[0o416], FBR); // SETMM
        assert_eq!(OPFLAGS_KA[0o500], FBR | SAC | FCE); // HLL
        assert_eq!(OPFLAGS_KA[0o506], SWAR | FAC | FMB | FCEPSE); // HRLM
        assert_eq!(OPFLAGS_KA[0o547], SWAR | FMB | SACZ | FCEPSE); // HLRS
    }

    #[test]
    fn test_family() {
        assert_eq!(OPFLAGS_KA[0o600], FBR); // TRN
        assert_eq!(OPFLAGS_KA[0o601], FBR | SWAR); // TLN
        assert_eq!(OPFLAGS_KA[0o610], FBR | FCE); // TDN
        assert_eq!(OPFLAGS_KA[0o620], FBR | SAC); // TRZ
        assert_eq!(OPFLAGS_KA[0o631], FBR | SAC | SWAR | FCE); // TSZ
        assert_eq!(OPFLAGS_KA[0o661], FBR | SAC | SWAR); // TLO
    }

    #[test]
    fn floating_rows() {
        assert_eq!(OPFLAGS_KA[0o140], SAC | FBR | FCE); // FAD
        assert_eq!(OPFLAGS_KA[0o141], SAC | SAC2 | FBR | FCE); // FADL
        assert_eq!(OPFLAGS_KA[0o145], SAC | FBR | SWAR); // FADRI
        assert_eq!(OPFLAGS_KA[0o171], FAC2 | SAC2 | SAC | FBR | FCE); // FDVL
        assert_eq!(OPFLAGS_KA[0o136], FCEPSE); // IDPB
    }

    #[test]
    fn variant_difference_is_the_110_block() {
        assert_eq!(OPFLAGS_KA[0o110], 0);
        assert_eq!(OPFLAGS_KI[0o110], FCE | FAC | FAC2 | SAC | SAC2);
        assert_eq!(OPFLAGS_KI[0o124], FAC | FAC2);
        // Everything outside 110-127 is shared.
        let mut op = 0;
        while op < 512 {
            if !(0o110..=0o127).contains(&op) {
                assert_eq!(OPFLAGS_KA[op], OPFLAGS_KI[op], "op {op:o}");
            }
            op += 1;
        }
    }

    #[test]
    fn typed_queries() {
        let f = OpFlags::from_bits(OPFLAGS_KA[0o200]);
        assert!(f.any(OpFlags::FCE));
        assert!(f.any(OpFlags::FCE.or(OpFlags::FCEPSE)));
        assert!(!f.any(OpFlags::SCE));
    }
}
