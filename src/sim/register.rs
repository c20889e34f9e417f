use log::debug;

use crate::inst::Inst;

pub type RegisterIdType = u32;

pub const SCALAR_REGISTER_COUNT: usize = 8;
pub const VECTOR_REGISTER_COUNT: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Copy, Hash)]
pub enum RegisterType {
    ScalarRegister(RegisterIdType),
    VectorRegister(RegisterIdType),
}

/// Busy-board over the scalar and vector register files.
///
/// A register is busy from the cycle its writer is admitted into a queue
/// until that writer completes. Ids are range-checked at decode, so an
/// out-of-range id here is a bug and panics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterFile {
    pub scalar_registers: Vec<bool>,
    pub vector_registers: Vec<bool>,
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterFile {
    pub fn new() -> Self {
        RegisterFile {
            scalar_registers: vec![false; SCALAR_REGISTER_COUNT],
            vector_registers: vec![false; VECTOR_REGISTER_COUNT],
        }
    }

    fn slot_mut(&mut self, reg: RegisterType) -> &mut bool {
        match reg {
            RegisterType::ScalarRegister(id) => &mut self.scalar_registers[id as usize],
            RegisterType::VectorRegister(id) => &mut self.vector_registers[id as usize],
        }
    }

    pub fn is_busy(&self, reg: RegisterType) -> bool {
        match reg {
            RegisterType::ScalarRegister(id) => self.scalar_registers[id as usize],
            RegisterType::VectorRegister(id) => self.vector_registers[id as usize],
        }
    }

    /// True when none of the sources or destinations of `inst` is reserved.
    pub fn is_clear(&self, inst: &Inst) -> bool {
        inst.registers().all(|r| !self.is_busy(*r))
    }

    pub fn reserve(&mut self, inst: &Inst) {
        for r in &inst.destination {
            debug!("Reserve {:?} for {}", r, inst);
            *self.slot_mut(*r) = true;
        }
    }

    pub fn release(&mut self, inst: &Inst) {
        for r in &inst.destination {
            debug!("Release {:?} held by {}", r, inst);
            *self.slot_mut(*r) = false;
        }
    }

    pub fn any_busy(&self) -> bool {
        self.scalar_registers.iter().chain(self.vector_registers.iter()).any(|b| *b)
    }
}
