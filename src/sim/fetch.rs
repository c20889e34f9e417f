use log::{debug, warn};

use crate::sim::vector_config::VectorConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    /// The stream is exhausted.
    Completed,
    /// Nothing emitted this cycle; a vector length change waits for the core to drain.
    Stalled,
    Fetched(String),
}

pub struct Fetch {
    pc: usize,
    inst_memory: Vec<String>,
    vector_config: VectorConfig,
    completed: bool,
}

impl Fetch {
    pub fn new(vector_config: VectorConfig) -> Fetch {
        Fetch {
            pc: 0,
            inst_memory: Vec::new(),
            vector_config,
            completed: false,
        }
    }

    pub fn load(&mut self, inst_memory: Vec<String>) {
        self.inst_memory = inst_memory;
        self.pc = 0;
        self.completed = false;
    }

    /// Run one fetch cycle. `quiescent` is the issue stage's drain state as
    /// seen at the start of the cycle.
    pub fn fetch(&mut self, quiescent: bool) -> FetchResult {
        if self.completed || self.pc >= self.inst_memory.len() {
            self.completed = true;
            return FetchResult::Completed;
        }

        let inst = &self.inst_memory[self.pc];
        if is_set_vector_length(inst) {
            if !quiescent {
                debug!("Fetch holds `{}` until the core drains", inst);
                return FetchResult::Stalled;
            }
            match resolved_vector_length(inst) {
                Some(vl) => {
                    debug!("Vector length {} -> {}", self.vector_config.vl, vl);
                    self.vector_config.set_vl(vl);
                }
                None => warn!("`{}` carries no resolved vector length, keeping {}", inst, self.vector_config.vl),
            }
        }

        let inst = inst.clone();
        self.next_pc();
        FetchResult::Fetched(inst)
    }

    pub fn next_pc(&mut self) {
        self.pc += 1;
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn vector_config(&self) -> &VectorConfig {
        &self.vector_config
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }
}

fn is_set_vector_length(inst: &str) -> bool {
    inst.split_whitespace().next() == Some("MTCL")
}

// `MTCL SR1 32`: the resolved value follows the register operand.
fn resolved_vector_length(inst: &str) -> Option<u32> {
    let mut tokens = inst.split_whitespace().skip(1);
    tokens.next()?;
    tokens.last()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetch_with(lines: &[&str]) -> Fetch {
        let mut fetch = Fetch::new(VectorConfig::new(64));
        fetch.load(lines.iter().map(|s| s.to_string()).collect());
        fetch
    }

    #[test]
    fn empty_stream_completes_immediately() {
        let mut fetch = fetch_with(&[]);
        assert!(!fetch.is_completed());
        assert_eq!(fetch.fetch(true), FetchResult::Completed);
        assert!(fetch.is_completed());
    }

    #[test]
    fn ordinary_lines_never_stall() {
        let mut fetch = fetch_with(&["ADD SR1 SR2 SR3", "HALT"]);
        assert_eq!(fetch.fetch(false), FetchResult::Fetched("ADD SR1 SR2 SR3".into()));
        assert_eq!(fetch.fetch(false), FetchResult::Fetched("HALT".into()));
        assert_eq!(fetch.fetch(false), FetchResult::Completed);
    }

    #[test]
    fn mtcl_waits_for_quiescence_then_sets_vl() {
        let mut fetch = fetch_with(&["MTCL SR1 16", "HALT"]);
        assert_eq!(fetch.fetch(false), FetchResult::Stalled);
        assert_eq!(fetch.fetch(false), FetchResult::Stalled);
        assert_eq!(fetch.pc(), 0);
        assert_eq!(fetch.vector_config().vl, 64);

        assert_eq!(fetch.fetch(true), FetchResult::Fetched("MTCL SR1 16".into()));
        assert_eq!(fetch.pc(), 1);
        assert_eq!(fetch.vector_config().vl, 16);
    }

    #[test]
    fn unresolved_mtcl_keeps_vector_length() {
        let mut fetch = fetch_with(&["MTCL SR1"]);
        assert_eq!(fetch.fetch(true), FetchResult::Fetched("MTCL SR1".into()));
        assert_eq!(fetch.vector_config().vl, 64);
    }
}
