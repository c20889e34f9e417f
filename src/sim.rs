use std::fmt;
use std::time::{Duration, Instant};

use anyhow::Context;
use log::{debug, info};

use crate::config::SimulatorConfig;
use crate::inst::{Inst, InstClass};
use crate::sim::fetch::{Fetch, FetchResult};
use crate::sim::issue::IssueUnit;
use crate::sim::register::RegisterFile;
use crate::sim::unit::function_unit::FunctionUnitCluster;
use crate::sim::unit::memory_unit::LoadStoreUnit;
use crate::sim::unit::{Completion, UnitKeyType};
use crate::sim::vector_config::VectorConfig;

pub mod fetch;
pub mod issue;
pub mod register;
pub mod unit;
pub mod vector_config;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimStatus {
    Running,
    Completed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimStats {
    pub fetched: u64,
    pub decode_failures: u64,
    pub issued_scalar: u64,
    pub issued_compute: u64,
    pub issued_memory: u64,
    pub completed_compute: u64,
    pub completed_memory: u64,
    /// Cycles fetch held a vector length change back.
    pub fetch_stall_cycles: u64,
    pub bank_conflict_stalls: u64,
}

/// What moved during the most recent cycle.
#[derive(Debug, Clone, Default)]
pub struct CycleTrace {
    pub cycle: u64,
    pub admitted: Option<Inst>,
    pub retired: Option<Inst>,
    pub completions: Vec<Completion>,
}

#[derive(Debug, Clone)]
pub struct SimReport {
    pub cycles: u64,
    pub elapsed: Duration,
    pub stats: SimStats,
}

impl fmt::Display for SimReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.elapsed.as_secs();
        writeln!(f, "----------------Simulation Results----------------")?;
        writeln!(f, "Clock Cycles: {}", self.cycles)?;
        writeln!(f, "Time Elapsed: {}m {}s", secs / 60, secs % 60)?;
        write!(f, "--------------------------------------------------")
    }
}

pub struct Simulator {
    fetch_unit: Fetch,
    issue_unit: IssueUnit,
    function_unit: FunctionUnitCluster,
    memory_unit: LoadStoreUnit,
    register_file: RegisterFile,
    clk: u64,
    status: SimStatus,
    stats: SimStats,
    last_cycle: CycleTrace,
}

impl Simulator {
    pub fn new(config: &SimulatorConfig) -> anyhow::Result<Simulator> {
        config.validate().context("Invalid simulator configuration")?;
        let fu = &config.functional_units;
        let mu = &config.memory_units;
        Ok(Simulator {
            fetch_unit: Fetch::new(VectorConfig::new(fu.max_vector_length)),
            issue_unit: IssueUnit::new(fu.compute_queue_depth, mu.data_queue_depth),
            function_unit: FunctionUnitCluster::new(fu),
            memory_unit: LoadStoreUnit::new_from_config(mu),
            register_file: RegisterFile::new(),
            clk: 1,
            status: SimStatus::Running,
            stats: SimStats::default(),
            last_cycle: CycleTrace::default(),
        })
    }

    pub fn load_instructions(&mut self, inst_memory: Vec<String>) {
        info!("Loaded {} instructions", inst_memory.len());
        self.fetch_unit.load(inst_memory);
    }

    pub fn register_file(&self) -> &RegisterFile {
        &self.register_file
    }

    pub fn issue_unit(&self) -> &IssueUnit {
        &self.issue_unit
    }

    pub fn vector_config(&self) -> &VectorConfig {
        self.fetch_unit.vector_config()
    }

    /// The cycle the next `step` will simulate.
    pub fn cycle(&self) -> u64 {
        self.clk
    }

    /// Cycles simulated so far.
    pub fn cycles(&self) -> u64 {
        self.clk - 1
    }

    pub fn is_completed(&self) -> bool {
        self.status == SimStatus::Completed
    }

    pub fn stats(&self) -> &SimStats {
        &self.stats
    }

    pub fn last_cycle(&self) -> &CycleTrace {
        &self.last_cycle
    }

    fn is_clear(&self) -> bool {
        self.issue_unit.is_clear(&self.function_unit, &self.memory_unit)
    }

    // every admitted scalar must also have retired
    fn is_drained(&self) -> bool {
        self.is_clear() && self.issue_unit.scalar_queue().is_empty()
    }

    /// Advance every stage by one cycle.
    pub fn step(&mut self) -> anyhow::Result<SimStatus> {
        if self.is_completed() {
            return Ok(SimStatus::Completed);
        }
        debug!("START THE SIMULATION OF CYCLE {}", self.clk);

        // 第一步：取指，改变向量长度的指令要等流水线排空
        let fetched = match self.fetch_unit.fetch(self.is_clear()) {
            FetchResult::Fetched(line) => {
                self.stats.fetched += 1;
                Some(line)
            }
            FetchResult::Stalled => {
                self.stats.fetch_stall_cycles += 1;
                None
            }
            FetchResult::Completed => None,
        };

        // 第二步：发射，队首指令进入执行单元，新指令译码后择一接纳
        let dispatch = self
            .issue_unit
            .run(fetched.as_deref(), &mut self.register_file, &self.function_unit, &self.memory_unit)
            .with_context(|| format!("Issue failed in cycle {}", self.clk))?;
        if dispatch.decode_failure.is_some() {
            self.stats.decode_failures += 1;
        }
        if let Some(inst) = &dispatch.admitted {
            match inst.class {
                InstClass::Scalar => self.stats.issued_scalar += 1,
                InstClass::VectorCompute => self.stats.issued_compute += 1,
                InstClass::VectorMemory => self.stats.issued_memory += 1,
            }
        }

        // 第三步：运算单元和访存单元各走一拍
        let mut completions = self
            .function_unit
            .run(dispatch.compute, self.fetch_unit.vector_config(), &mut self.register_file)
            .with_context(|| format!("Function unit failed in cycle {}", self.clk))?;
        if let Some(completion) = self
            .memory_unit
            .run(dispatch.data, &mut self.register_file)
            .with_context(|| format!("Memory unit failed in cycle {}", self.clk))?
        {
            completions.push(completion);
        }
        for completion in &completions {
            match completion.unit_key {
                UnitKeyType::FuncKey(_) => self.stats.completed_compute += 1,
                UnitKeyType::MemKey(_) => self.stats.completed_memory += 1,
            }
        }
        self.stats.bank_conflict_stalls = self.memory_unit.bank_conflict_stalls();

        self.last_cycle = CycleTrace {
            cycle: self.clk,
            admitted: dispatch.admitted,
            retired: dispatch.retired,
            completions,
        };
        self.clk += 1;

        if self.fetch_unit.is_completed() && self.is_drained() {
            info!("Pipeline drained after {} cycles", self.cycles());
            self.status = SimStatus::Completed;
        }
        Ok(self.status)
    }

    pub fn main_sim_loop(&mut self) -> anyhow::Result<SimReport> {
        info!("Timing Simulation Started");
        let start = Instant::now();
        while self.step()? == SimStatus::Running {}
        let elapsed = start.elapsed();
        info!("Timing Simulation Completed");

        Ok(SimReport {
            cycles: self.cycles(),
            elapsed,
            stats: self.stats.clone(),
        })
    }
}
