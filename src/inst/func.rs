use crate::sim::unit::function_unit::FunctionUnitKeyType;

use super::opcode::Opcode;

/// Pipeline a vector compute opcode executes on.
///
/// Returns `None` for opcodes that never enter the compute pipelines.
pub fn func_unit_key(opcode: Opcode) -> Option<FunctionUnitKeyType> {
    // If you need more instructions, please extend this table
    use Opcode::*;
    match opcode {
        ADDVV | SUBVV | ADDVS | SUBVS
        | SEQVV | SNEVV | SGTVV | SLTVV | SGEVV | SLEVV
        | SEQVS | SNEVS | SGTVS | SLTVS | SGEVS | SLEVS => Some(FunctionUnitKeyType::VectorAlu),
        MULVV | MULVS => Some(FunctionUnitKeyType::VectorMul),
        DIVVV | DIVVS => Some(FunctionUnitKeyType::VectorDiv),
        _ => None,
    }
}
