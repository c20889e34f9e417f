use crate::inst::Inst;
use crate::sim::unit::function_unit::FunctionUnitKeyType;
use crate::sim::unit::memory_unit::MemoryUnitKeyType;
pub mod function_unit;
pub mod memory_unit;
pub mod latency_calculator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKeyType {
    FuncKey(FunctionUnitKeyType),
    MemKey(MemoryUnitKeyType),
}

/// An instruction leaving an execution unit; its reservations are already
/// released when this is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub unit_key: UnitKeyType,
    pub inst: Inst,
}
