use std::fmt;
use std::str::FromStr;

use super::InstClass;

/// Role of one operand token, in the order the tokens appear after the opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    ScalarDest,
    ScalarSrc,
    VectorDest,
    VectorSrc,
    /// Read by the instruction and kept reserved until it drains (`SV` data).
    VectorHeld,
    Immediate,
}

use Operand::*;

macro_rules! opcodes {
    ($($name:ident => $class:ident, [$($op:expr),*];)*) => {
        #[allow(clippy::upper_case_acronyms)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Opcode {
            $($name,)*
        }

        impl Opcode {
            pub const ALL: &'static [Opcode] = &[$(Opcode::$name,)*];

            pub fn class(self) -> InstClass {
                match self {
                    $(Opcode::$name => InstClass::$class,)*
                }
            }

            /// Operand layout of the instruction text.
            pub fn schema(self) -> &'static [Operand] {
                match self {
                    $(Opcode::$name => &[$($op),*],)*
                }
            }

            pub fn mnemonic(self) -> &'static str {
                match self {
                    $(Opcode::$name => stringify!($name),)*
                }
            }
        }

        impl FromStr for Opcode {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(stringify!($name) => Ok(Opcode::$name),)*
                    _ => Err(()),
                }
            }
        }
    };
}

opcodes! {
    // vector compute
    ADDVV => VectorCompute, [VectorDest, VectorSrc, VectorSrc];
    SUBVV => VectorCompute, [VectorDest, VectorSrc, VectorSrc];
    MULVV => VectorCompute, [VectorDest, VectorSrc, VectorSrc];
    DIVVV => VectorCompute, [VectorDest, VectorSrc, VectorSrc];
    ADDVS => VectorCompute, [VectorDest, VectorSrc, ScalarSrc];
    SUBVS => VectorCompute, [VectorDest, VectorSrc, ScalarSrc];
    MULVS => VectorCompute, [VectorDest, VectorSrc, ScalarSrc];
    DIVVS => VectorCompute, [VectorDest, VectorSrc, ScalarSrc];
    SEQVV => VectorCompute, [VectorSrc, VectorSrc];
    SNEVV => VectorCompute, [VectorSrc, VectorSrc];
    SGTVV => VectorCompute, [VectorSrc, VectorSrc];
    SLTVV => VectorCompute, [VectorSrc, VectorSrc];
    SGEVV => VectorCompute, [VectorSrc, VectorSrc];
    SLEVV => VectorCompute, [VectorSrc, VectorSrc];
    SEQVS => VectorCompute, [VectorSrc, ScalarSrc];
    SNEVS => VectorCompute, [VectorSrc, ScalarSrc];
    SGTVS => VectorCompute, [VectorSrc, ScalarSrc];
    SLTVS => VectorCompute, [VectorSrc, ScalarSrc];
    SGEVS => VectorCompute, [VectorSrc, ScalarSrc];
    SLEVS => VectorCompute, [VectorSrc, ScalarSrc];

    // vector memory, followed by the resolved address list
    LV => VectorMemory, [VectorDest, ScalarSrc];
    SV => VectorMemory, [VectorHeld, ScalarSrc];
    LVWS => VectorMemory, [VectorDest, ScalarSrc, ScalarSrc];
    SVWS => VectorMemory, [VectorSrc, ScalarSrc, ScalarSrc];
    LVI => VectorMemory, [VectorDest, ScalarSrc, VectorSrc];
    SVI => VectorMemory, [VectorSrc, ScalarSrc, VectorSrc];

    // scalar
    LS => Scalar, [ScalarDest, ScalarSrc, Immediate];
    SS => Scalar, [ScalarSrc, ScalarSrc, Immediate];
    ADD => Scalar, [ScalarDest, ScalarSrc, ScalarSrc];
    SUB => Scalar, [ScalarDest, ScalarSrc, ScalarSrc];
    AND => Scalar, [ScalarDest, ScalarSrc, ScalarSrc];
    OR => Scalar, [ScalarDest, ScalarSrc, ScalarSrc];
    XOR => Scalar, [ScalarDest, ScalarSrc, ScalarSrc];
    SLL => Scalar, [ScalarDest, ScalarSrc, ScalarSrc];
    SRL => Scalar, [ScalarDest, ScalarSrc, ScalarSrc];
    SRA => Scalar, [ScalarDest, ScalarSrc, ScalarSrc];
    BEQ => Scalar, [ScalarSrc, ScalarSrc, Immediate];
    BNE => Scalar, [ScalarSrc, ScalarSrc, Immediate];
    BGT => Scalar, [ScalarSrc, ScalarSrc, Immediate];
    BLT => Scalar, [ScalarSrc, ScalarSrc, Immediate];
    BGE => Scalar, [ScalarSrc, ScalarSrc, Immediate];
    BLE => Scalar, [ScalarSrc, ScalarSrc, Immediate];
    MFCL => Scalar, [ScalarDest];
    MTCL => Scalar, [ScalarSrc];
    POP => Scalar, [ScalarDest];
    CVM => Scalar, [];
    HALT => Scalar, [];
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
