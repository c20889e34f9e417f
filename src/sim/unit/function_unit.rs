use std::collections::HashMap;

use anyhow::{bail, Context};
use log::debug;

use crate::config::FunctionalUnits;
use crate::inst::Inst;
use crate::sim::register::RegisterFile;
use crate::sim::unit::latency_calculator::calc_func_cycle;
use crate::sim::unit::{Completion, UnitKeyType};
use crate::sim::vector_config::VectorConfig;

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum FunctionUnitKeyType {
    VectorAlu,
    VectorMul,
    VectorDiv,
}

impl FunctionUnitKeyType {
    pub const ALL: [FunctionUnitKeyType; 3] = [
        FunctionUnitKeyType::VectorAlu,
        FunctionUnitKeyType::VectorMul,
        FunctionUnitKeyType::VectorDiv,
    ];
}

/// A single-slot pipeline: one instruction in flight at a time.
#[derive(Debug, Default)]
pub struct FunctionUnit {
    current: Option<Inst>,
    remained_cycle: u32,
}

impl FunctionUnit {
    pub fn is_empty(&self) -> bool {
        self.current.is_none()
    }

    pub fn remained_cycle(&self) -> u32 {
        self.remained_cycle
    }

    pub fn current(&self) -> Option<&Inst> {
        self.current.as_ref()
    }

    fn issue(&mut self, inst: Inst, latency: u32) {
        assert!(self.is_empty());
        self.current = Some(inst);
        self.remained_cycle = latency;
    }

    fn tick(&mut self) {
        self.remained_cycle = self.remained_cycle.saturating_sub(1);
    }

    fn take_completed(&mut self) -> Option<Inst> {
        if self.remained_cycle == 0 {
            self.current.take()
        } else {
            None
        }
    }
}

/// The add, multiply and divide pipelines.
pub struct FunctionUnitCluster {
    function_unit: HashMap<FunctionUnitKeyType, FunctionUnit>,
    config: FunctionalUnits,
}

impl FunctionUnitCluster {
    pub fn new(config: &FunctionalUnits) -> Self {
        FunctionUnitCluster {
            function_unit: FunctionUnitKeyType::ALL
                .iter()
                .map(|k| (*k, FunctionUnit::default()))
                .collect(),
            config: config.clone(),
        }
    }

    pub fn unit(&self, key: FunctionUnitKeyType) -> &FunctionUnit {
        &self.function_unit[&key]
    }

    pub fn can_accept_new_instruction(&self, key: FunctionUnitKeyType) -> bool {
        self.unit(key).is_empty()
    }

    pub fn is_idle(&self) -> bool {
        self.function_unit.values().all(FunctionUnit::is_empty)
    }

    /// One cycle: count down every pipeline, accept `inst` if one was
    /// dispatched, then retire whatever reached zero.
    pub fn run(
        &mut self,
        inst: Option<Inst>,
        vector_config: &VectorConfig,
        register_file: &mut RegisterFile,
    ) -> anyhow::Result<Vec<Completion>> {
        self.function_unit.values_mut().for_each(FunctionUnit::tick);

        if let Some(inst) = inst {
            let key = inst
                .func_unit_key()
                .with_context(|| format!("`{}` has no compute pipeline", inst))?;
            let latency = calc_func_cycle(key, &self.config, vector_config);
            let fu = self
                .function_unit
                .get_mut(&key)
                .with_context(|| format!("No {:?} pipeline", key))?;
            if !fu.is_empty() {
                bail!("`{}` dispatched to busy {:?} pipeline", inst, key);
            }
            debug!("[FunctionUnit] {:?} accepts `{}` for {} cycles (vl={})", key, inst, latency, vector_config.vl);
            fu.issue(inst, latency);
        }

        let mut completions = Vec::new();
        for key in FunctionUnitKeyType::ALL {
            let Some(fu) = self.function_unit.get_mut(&key) else {
                continue;
            };
            if let Some(inst) = fu.take_completed() {
                debug!("[FunctionUnit] {:?} completes `{}`", key, inst);
                register_file.release(&inst);
                completions.push(Completion {
                    unit_key: UnitKeyType::FuncKey(key),
                    inst,
                });
            }
        }
        Ok(completions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::register::RegisterType;

    fn config(lanes: u32) -> FunctionalUnits {
        FunctionalUnits {
            lane_number: lanes,
            add_pipeline_depth: 2,
            mul_pipeline_depth: 5,
            div_pipeline_depth: 8,
            compute_queue_depth: 4,
            max_vector_length: 64,
        }
    }

    fn reserved(rf: &mut RegisterFile, line: &str) -> Inst {
        let inst = Inst::decode(line).unwrap();
        rf.reserve(&inst);
        inst
    }

    #[test]
    fn add_occupies_slot_for_exact_latency() {
        // depth 2, 64 lanes, vl 64 => 2 cycles
        let mut cluster = FunctionUnitCluster::new(&config(64));
        let mut rf = RegisterFile::new();
        let vc = VectorConfig::new(64);
        let inst = reserved(&mut rf, "ADDVV VR1 VR2 VR3");

        assert!(cluster.run(Some(inst), &vc, &mut rf).unwrap().is_empty());
        assert!(!cluster.can_accept_new_instruction(FunctionUnitKeyType::VectorAlu));
        let alu = cluster.unit(FunctionUnitKeyType::VectorAlu);
        assert_eq!(alu.current().unwrap().raw(), "ADDVV VR1 VR2 VR3");
        assert!(cluster.run(None, &vc, &mut rf).unwrap().is_empty());
        assert!(rf.is_busy(RegisterType::VectorRegister(1)));

        let done = cluster.run(None, &vc, &mut rf).unwrap();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].unit_key, UnitKeyType::FuncKey(FunctionUnitKeyType::VectorAlu));
        assert!(!rf.is_busy(RegisterType::VectorRegister(1)));
        assert!(cluster.is_idle());
    }

    #[test]
    fn latency_is_fixed_at_acceptance() {
        let mut cluster = FunctionUnitCluster::new(&config(4));
        let mut rf = RegisterFile::new();
        let mut vc = VectorConfig::new(64);
        let inst = reserved(&mut rf, "MULVV VR1 VR2 VR3");

        cluster.run(Some(inst), &vc, &mut rf).unwrap();
        assert_eq!(cluster.unit(FunctionUnitKeyType::VectorMul).remained_cycle(), 5 + 16 - 1);

        vc.set_vl(4);
        cluster.run(None, &vc, &mut rf).unwrap();
        assert_eq!(cluster.unit(FunctionUnitKeyType::VectorMul).remained_cycle(), 5 + 16 - 2);
    }

    #[test]
    fn pipelines_run_independently() {
        let mut cluster = FunctionUnitCluster::new(&config(64));
        let mut rf = RegisterFile::new();
        let vc = VectorConfig::new(64);

        cluster.run(Some(reserved(&mut rf, "DIVVV VR1 VR2 VR3")), &vc, &mut rf).unwrap();
        cluster.run(Some(reserved(&mut rf, "ADDVV VR4 VR2 VR3")), &vc, &mut rf).unwrap();
        assert!(!cluster.can_accept_new_instruction(FunctionUnitKeyType::VectorDiv));
        assert!(!cluster.can_accept_new_instruction(FunctionUnitKeyType::VectorAlu));
        assert!(cluster.can_accept_new_instruction(FunctionUnitKeyType::VectorMul));

        assert!(cluster.run(None, &vc, &mut rf).unwrap().is_empty());
        let done = cluster.run(None, &vc, &mut rf).unwrap();
        assert_eq!(done.len(), 1);
        assert_eq!(done[0].inst.raw(), "ADDVV VR4 VR2 VR3");
        assert!(rf.is_busy(RegisterType::VectorRegister(1)));
    }

    #[test]
    fn zero_latency_completes_on_acceptance() {
        let mut c = config(4);
        c.add_pipeline_depth = 0;
        let mut cluster = FunctionUnitCluster::new(&c);
        let mut rf = RegisterFile::new();
        let mut vc = VectorConfig::new(64);
        vc.set_vl(0);

        let done = cluster.run(Some(reserved(&mut rf, "ADDVV VR1 VR2 VR3")), &vc, &mut rf).unwrap();
        assert_eq!(done.len(), 1);
        assert!(!rf.any_busy());
    }

    #[test]
    fn busy_pipeline_rejects_dispatch() {
        let mut cluster = FunctionUnitCluster::new(&config(64));
        let mut rf = RegisterFile::new();
        let vc = VectorConfig::new(64);
        cluster.run(Some(reserved(&mut rf, "ADDVV VR1 VR2 VR3")), &vc, &mut rf).unwrap();
        assert!(cluster.run(Some(Inst::decode("SUBVV VR4 VR5 VR6").unwrap()), &vc, &mut rf).is_err());
        assert!(cluster.run(Some(Inst::decode("HALT").unwrap()), &vc, &mut rf).is_err());
    }
}
