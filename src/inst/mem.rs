use super::opcode::Opcode;
use super::DecodeError;

pub type Addr = u32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Read,
    Write,
}

impl Direction {
    pub fn of(opcode: Opcode) -> Option<Direction> {
        match opcode {
            Opcode::LV | Opcode::LVWS | Opcode::LVI => Some(Direction::Read),
            Opcode::SV | Opcode::SVWS | Opcode::SVI => Some(Direction::Write),
            _ => None,
        }
    }
}

/// How the element addresses of a vector memory access are formed.
///
/// Both patterns flatten into one address per element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressPattern {
    /// `base + i * stride`; unit stride for `LV`/`SV`.
    Strided { base: Addr, stride: Addr },
    /// `base + offsets[i]`, offsets taken from an index vector register.
    Indexed { base: Addr, offsets: Vec<Addr> },
}

impl AddressPattern {
    pub fn expand(&self, vector_length: u32) -> Vec<Addr> {
        let vl = vector_length as usize;
        match self {
            AddressPattern::Strided { base, stride } => (0..vector_length)
                .map(|i| base.wrapping_add(i.wrapping_mul(*stride)))
                .collect(),
            AddressPattern::Indexed { base, offsets } => offsets
                .iter()
                .take(vl)
                .map(|o| base.wrapping_add(*o))
                .collect(),
        }
    }
}

/// Split the resolved address list `(a0,a1,...)` off the end of a trace line.
///
/// Returns the operand text before the list and the parsed addresses.
pub fn split_address_list(line: &str) -> Result<(&str, Vec<Addr>), DecodeError> {
    let open = line.find('(').ok_or(DecodeError::MissingAddresses)?;
    let close = line[open..]
        .find(')')
        .map(|i| open + i)
        .ok_or_else(|| DecodeError::BadAddress(line[open..].to_string()))?;

    let addresses = line[open + 1..close]
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<Addr>().map_err(|_| DecodeError::BadAddress(s.to_string())))
        .collect::<Result<Vec<_>, _>>()?;

    Ok((&line[..open], addresses))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strided_pattern_expands_per_element() {
        let p = AddressPattern::Strided { base: 100, stride: 4 };
        assert_eq!(p.expand(4), vec![100, 104, 108, 112]);
        assert!(p.expand(0).is_empty());
    }

    #[test]
    fn indexed_pattern_is_cut_to_vector_length() {
        let p = AddressPattern::Indexed { base: 10, offsets: vec![3, 0, 7, 1] };
        assert_eq!(p.expand(3), vec![13, 10, 17]);
    }

    #[test]
    fn address_list_split() {
        let (ops, addrs) = split_address_list("LV VR1 SR2 (0,1,2,3)").unwrap();
        assert_eq!(ops.trim(), "LV VR1 SR2");
        assert_eq!(addrs, vec![0, 1, 2, 3]);

        let (_, addrs) = split_address_list("SV VR0 SR1 ( 8, 16 )").unwrap();
        assert_eq!(addrs, vec![8, 16]);
    }

    #[test]
    fn address_list_errors() {
        assert_eq!(split_address_list("LV VR1 SR2"), Err(DecodeError::MissingAddresses));
        assert!(matches!(split_address_list("LV VR1 SR2 (1,x)"), Err(DecodeError::BadAddress(_))));
        assert!(matches!(split_address_list("LV VR1 SR2 (1,2"), Err(DecodeError::BadAddress(_))));
    }
}
