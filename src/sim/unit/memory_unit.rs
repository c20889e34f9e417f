use std::collections::VecDeque;

use anyhow::bail;
use log::debug;

use crate::config::MemoryUnits;
use crate::inst::mem::{Addr, Direction};
use crate::inst::Inst;
use crate::sim::register::RegisterFile;
use crate::sim::unit::{Completion, UnitKeyType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryUnitKeyType {
    Load,
    Store,
}

/// Banked vector memory behind a shift-register address pipeline.
///
/// Every cycle the oldest pipeline entry tries to reach its bank. If the
/// bank is busy the pipeline stalls; otherwise the bank turns busy for
/// `bank_busy_time` cycles and the next element address shifts in, taken
/// from the back of the address list. An
/// instruction completes once all its addresses have entered the pipeline
/// and every bank has gone idle. The pipeline itself is not flushed between
/// instructions.
pub struct LoadStoreUnit {
    bank_busy_time: u32,
    bank_busy: Vec<u32>,
    // front is the newest entry, back the oldest
    pipeline: VecDeque<Option<Addr>>,
    addresses: VecDeque<Addr>,
    current: Option<Inst>,
    bank_conflict_stalls: u64,
}

impl LoadStoreUnit {
    pub fn new(bank_number: u32, pipeline_depth: usize, bank_busy_time: u32) -> LoadStoreUnit {
        LoadStoreUnit {
            bank_busy_time,
            bank_busy: vec![0; bank_number as usize],
            pipeline: std::iter::repeat(None).take(pipeline_depth).collect(),
            addresses: VecDeque::new(),
            current: None,
            bank_conflict_stalls: 0,
        }
    }

    pub fn new_from_config(config: &MemoryUnits) -> LoadStoreUnit {
        LoadStoreUnit::new(config.bank_number, config.load_store_pipeline_depth, config.bank_busy_time)
    }

    pub fn is_free(&self) -> bool {
        self.current.is_none()
    }

    pub fn current(&self) -> Option<&Inst> {
        self.current.as_ref()
    }

    pub fn are_banks_free(&self) -> bool {
        self.bank_busy.iter().all(|b| *b == 0)
    }

    /// Cycles an address waited at the head of the pipeline for its bank.
    pub fn bank_conflict_stalls(&self) -> u64 {
        self.bank_conflict_stalls
    }

    fn bank_of(&self, addr: Addr) -> usize {
        (addr % self.bank_busy.len() as Addr) as usize
    }

    fn shift(&mut self) {
        self.pipeline.pop_back();
        let next = self.addresses.pop_back();
        self.pipeline.push_front(next);
    }

    pub fn run(&mut self, inst: Option<Inst>, register_file: &mut RegisterFile) -> anyhow::Result<Option<Completion>> {
        self.bank_busy.iter_mut().for_each(|b| *b = b.saturating_sub(1));

        if let Some(inst) = inst {
            if let Some(current) = &self.current {
                bail!("`{}` dispatched while `{}` occupies the memory unit", inst, current);
            }
            debug!("[LoadStoreUnit] accepts `{}` with {} element addresses", inst, inst.addresses.len());
            self.addresses = inst.addresses.iter().copied().collect();
            self.current = Some(inst);
        }

        if self.current.is_some() && !self.addresses.is_empty() {
            match self.pipeline.back().copied().flatten() {
                Some(addr) => {
                    let bank = self.bank_of(addr);
                    if self.bank_busy[bank] == 0 {
                        self.bank_busy[bank] = self.bank_busy_time;
                        self.shift();
                    } else {
                        debug!("[LoadStoreUnit] address {} waits on bank {} ({} cycles left)", addr, bank, self.bank_busy[bank]);
                        self.bank_conflict_stalls += 1;
                    }
                }
                None => self.shift(),
            }
        }

        if self.current.is_some() && self.addresses.is_empty() && self.are_banks_free() {
            if let Some(inst) = self.current.take() {
                debug!("[LoadStoreUnit] completes `{}`", inst);
                register_file.release(&inst);
                let key = match inst.direction() {
                    Some(Direction::Write) => MemoryUnitKeyType::Store,
                    _ => MemoryUnitKeyType::Load,
                };
                return Ok(Some(Completion {
                    unit_key: UnitKeyType::MemKey(key),
                    inst,
                }));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::register::RegisterType;

    fn reserved(rf: &mut RegisterFile, line: &str) -> Inst {
        let inst = Inst::decode(line).unwrap();
        rf.reserve(&inst);
        inst
    }

    /// Runs until the unit completes, returning the 1-based run on which it did.
    fn run_to_completion(lsu: &mut LoadStoreUnit, rf: &mut RegisterFile, inst: Inst) -> usize {
        let mut inst = Some(inst);
        for n in 1..1000 {
            if lsu.run(inst.take(), rf).unwrap().is_some() {
                return n;
            }
        }
        panic!("memory unit never drained");
    }

    #[test]
    fn same_bank_addresses_are_spaced_by_busy_time() {
        let mut lsu = LoadStoreUnit::new(4, 1, 6);
        let mut rf = RegisterFile::new();
        let mut inst = Some(reserved(&mut rf, "LV VR1 SR0 (0,4,8)"));

        // record the run on which each address enters the pipeline
        let mut accepted_at = Vec::new();
        let mut remaining = 3;
        for n in 1..=8 {
            lsu.run(inst.take(), &mut rf).unwrap();
            if lsu.addresses.len() < remaining {
                remaining = lsu.addresses.len();
                accepted_at.push(n);
            }
        }
        assert_eq!(accepted_at, vec![1, 2, 8]);
        assert_eq!(accepted_at[2] - accepted_at[1], 6);
        assert_eq!(lsu.bank_conflict_stalls(), 5);
    }

    #[test]
    fn release_waits_for_last_bank_to_drain() {
        let mut lsu = LoadStoreUnit::new(4, 1, 6);
        let mut rf = RegisterFile::new();
        let inst = reserved(&mut rf, "LV VR1 SR0 (0,1,2,3)");

        let mut inst = Some(inst);
        let mut done_at = None;
        for n in 1..=10 {
            if lsu.run(inst.take(), &mut rf).unwrap().is_some() {
                done_at = Some(n);
                break;
            }
            // addresses run out on the fourth cycle, banks are still busy
            if n >= 4 {
                assert!(lsu.addresses.is_empty());
                assert!(!lsu.are_banks_free());
                assert!(rf.is_busy(RegisterType::VectorRegister(1)));
            }
        }
        assert_eq!(done_at, Some(10));
        assert!(lsu.are_banks_free());
        assert!(lsu.is_free());
        assert!(!rf.any_busy());
        assert_eq!(lsu.bank_conflict_stalls(), 0);
    }

    #[test]
    fn leftover_pipeline_entries_hit_banks_for_next_instruction() {
        let mut lsu = LoadStoreUnit::new(4, 1, 6);
        let mut rf = RegisterFile::new();
        let first = reserved(&mut rf, "LV VR1 SR0 (0,1,2,3)");
        assert_eq!(run_to_completion(&mut lsu, &mut rf, first), 10);

        // address 0 is still in the pipeline and occupies bank 0 when 7 shifts in
        let second = reserved(&mut rf, "SV VR1 SR0 (7)");
        assert_eq!(run_to_completion(&mut lsu, &mut rf, second), 7);
    }

    #[test]
    fn addresses_are_taken_from_the_back() {
        let mut lsu = LoadStoreUnit::new(4, 1, 6);
        let mut rf = RegisterFile::new();
        let inst = reserved(&mut rf, "LV VR1 SR0 (0,4,1)");

        lsu.run(Some(inst), &mut rf).unwrap();
        assert_eq!(lsu.pipeline.back().copied().flatten(), Some(1));
        assert_eq!(lsu.current().unwrap().raw(), "LV VR1 SR0 (0,4,1)");

        // 1 and 4 sit in different banks, so only the drain of bank 0 remains
        let mut done_at = None;
        for n in 2..=20 {
            if lsu.run(None, &mut rf).unwrap().is_some() {
                done_at = Some(n);
                break;
            }
        }
        assert_eq!(done_at, Some(9));
        assert_eq!(lsu.bank_conflict_stalls(), 0);
    }

    #[test]
    fn store_completion_reports_store_key() {
        let mut lsu = LoadStoreUnit::new(2, 2, 3);
        let mut rf = RegisterFile::new();
        let inst = reserved(&mut rf, "SV VR2 SR0 (0,2)");
        let mut inst = Some(inst);
        let completion = loop {
            if let Some(c) = lsu.run(inst.take(), &mut rf).unwrap() {
                break c;
            }
        };
        assert_eq!(completion.unit_key, UnitKeyType::MemKey(MemoryUnitKeyType::Store));
        assert!(!rf.is_busy(RegisterType::VectorRegister(2)));
    }

    #[test]
    fn empty_address_list_completes_at_once() {
        let mut lsu = LoadStoreUnit::new(4, 3, 6);
        let mut rf = RegisterFile::new();
        let inst = reserved(&mut rf, "LV VR1 SR0 ()");
        assert!(lsu.run(Some(inst), &mut rf).unwrap().is_some());
        assert!(lsu.is_free());
    }

    #[test]
    fn dispatch_into_busy_unit_is_an_error() {
        let mut lsu = LoadStoreUnit::new(4, 1, 6);
        let mut rf = RegisterFile::new();
        lsu.run(Some(reserved(&mut rf, "LV VR1 SR0 (0,4)")), &mut rf).unwrap();
        assert!(!lsu.is_free());
        assert!(lsu.run(Some(Inst::decode("LV VR2 SR0 (1)").unwrap()), &mut rf).is_err());
    }
}
