use std::fmt;

use thiserror::Error;

use crate::sim::register::{RegisterIdType, RegisterType, SCALAR_REGISTER_COUNT, VECTOR_REGISTER_COUNT};
use crate::sim::unit::function_unit::FunctionUnitKeyType;

pub mod func;
pub mod mem;
pub mod opcode;

use mem::{Addr, AddressPattern, Direction};
use opcode::{Opcode, Operand};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstClass {
    Scalar,
    VectorCompute,
    VectorMemory,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("empty instruction")]
    EmptyInstruction,
    #[error("unknown opcode `{0}`")]
    UnknownOpcode(String),
    #[error("`{opcode}` expects {expected} operands, got {got}")]
    MissingOperand { opcode: Opcode, expected: usize, got: usize },
    #[error("malformed register operand `{0}`")]
    BadRegister(String),
    #[error("register operand `{0}` is outside the register file")]
    RegisterOutOfRange(String),
    #[error("malformed immediate `{0}`")]
    BadImmediate(String),
    #[error("vector memory instruction has no resolved address list")]
    MissingAddresses,
    #[error("malformed address `{0}`")]
    BadAddress(String),
}

impl DecodeError {
    /// Errors that break the fixed register file shape; these abort the run
    /// instead of dropping the instruction.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DecodeError::RegisterOutOfRange(_))
    }
}

/// A decoded instruction as it travels through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inst {
    raw: String,
    pub opcode: Opcode,
    pub class: InstClass,
    /// Registers reserved while the instruction is in flight: results, and
    /// the data register of `SV`.
    pub destination: Vec<RegisterType>,
    pub resource: Vec<RegisterType>,
    /// One address per element, memory instructions only.
    pub addresses: Vec<Addr>,
}

impl Inst {
    /// Classify a trace line and extract its register and address metadata.
    pub fn decode(line: &str) -> Result<Inst, DecodeError> {
        let line = line.trim();
        let mnemonic = line.split_whitespace().next().ok_or(DecodeError::EmptyInstruction)?;
        let opcode = mnemonic
            .parse::<Opcode>()
            .map_err(|_| DecodeError::UnknownOpcode(mnemonic.to_string()))?;
        let class = opcode.class();

        let (operand_text, addresses) = match class {
            InstClass::VectorMemory => mem::split_address_list(line)?,
            _ => (line, Vec::new()),
        };

        let tokens = operand_text.split_whitespace().skip(1).collect::<Vec<_>>();
        let schema = opcode.schema();
        if tokens.len() < schema.len() {
            return Err(DecodeError::MissingOperand {
                opcode,
                expected: schema.len(),
                got: tokens.len(),
            });
        }

        let mut destination = Vec::new();
        let mut resource = Vec::new();
        for (operand, token) in schema.iter().zip(tokens) {
            match operand {
                Operand::ScalarDest => destination.push(parse_scalar(token)?),
                Operand::ScalarSrc => resource.push(parse_scalar(token)?),
                Operand::VectorDest => destination.push(parse_vector(token)?),
                Operand::VectorSrc => resource.push(parse_vector(token)?),
                Operand::VectorHeld => {
                    let r = parse_vector(token)?;
                    resource.push(r);
                    destination.push(r);
                }
                Operand::Immediate => {
                    token
                        .parse::<i64>()
                        .map_err(|_| DecodeError::BadImmediate(token.to_string()))?;
                }
            }
        }

        Ok(Inst {
            raw: line.to_string(),
            opcode,
            class,
            destination,
            resource,
            addresses,
        })
    }

    /// Decode a vector memory instruction whose addresses are given as a
    /// pattern instead of a resolved list.
    pub fn decode_with_pattern(line: &str, pattern: &AddressPattern, vector_length: u32) -> Result<Inst, DecodeError> {
        let addresses = pattern.expand(vector_length);
        let list = addresses.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(",");
        Inst::decode(&format!("{} ({})", line.trim(), list))
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn func_unit_key(&self) -> Option<FunctionUnitKeyType> {
        func::func_unit_key(self.opcode)
    }

    pub fn direction(&self) -> Option<Direction> {
        Direction::of(self.opcode)
    }

    /// Every register the hazard check has to look at.
    pub fn registers(&self) -> impl Iterator<Item = &RegisterType> {
        self.resource.iter().chain(self.destination.iter())
    }
}

impl fmt::Display for Inst {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_register(token: &str, prefix: &str, count: usize) -> Result<RegisterIdType, DecodeError> {
    let id = token
        .strip_prefix(prefix)
        .and_then(|s| s.parse::<RegisterIdType>().ok())
        .ok_or_else(|| DecodeError::BadRegister(token.to_string()))?;
    if id as usize >= count {
        return Err(DecodeError::RegisterOutOfRange(token.to_string()));
    }
    Ok(id)
}

fn parse_scalar(token: &str) -> Result<RegisterType, DecodeError> {
    parse_register(token, "SR", SCALAR_REGISTER_COUNT).map(RegisterType::ScalarRegister)
}

fn parse_vector(token: &str) -> Result<RegisterType, DecodeError> {
    parse_register(token, "VR", VECTOR_REGISTER_COUNT).map(RegisterType::VectorRegister)
}
