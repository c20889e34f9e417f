use std::collections::VecDeque;

use anyhow::anyhow;
use log::{debug, error};

use crate::inst::{DecodeError, Inst, InstClass};
use crate::sim::register::RegisterFile;
use crate::sim::unit::function_unit::FunctionUnitCluster;
use crate::sim::unit::memory_unit::LoadStoreUnit;

/// What the issue stage hands on in one cycle.
#[derive(Debug, Default)]
pub struct Dispatch {
    pub compute: Option<Inst>,
    pub data: Option<Inst>,
    /// Scalar instruction retired this cycle, reservations already released.
    pub retired: Option<Inst>,
    /// Instruction moved from the pending pool into a class queue.
    pub admitted: Option<Inst>,
    pub decode_failure: Option<DecodeError>,
}

/// Decode, pending pool and the per-class issue queues.
pub struct IssueUnit {
    pending: VecDeque<Inst>,
    compute_queue: VecDeque<Inst>,
    data_queue: VecDeque<Inst>,
    scalar_queue: VecDeque<Inst>,
    compute_queue_depth: usize,
    data_queue_depth: usize,
}

impl IssueUnit {
    pub fn new(compute_queue_depth: usize, data_queue_depth: usize) -> Self {
        IssueUnit {
            pending: VecDeque::new(),
            compute_queue: VecDeque::new(),
            data_queue: VecDeque::new(),
            scalar_queue: VecDeque::new(),
            compute_queue_depth,
            data_queue_depth,
        }
    }

    pub fn pending(&self) -> &VecDeque<Inst> {
        &self.pending
    }

    pub fn compute_queue(&self) -> &VecDeque<Inst> {
        &self.compute_queue
    }

    pub fn data_queue(&self) -> &VecDeque<Inst> {
        &self.data_queue
    }

    /// Scalars admitted last cycle, retired at the start of the next one.
    pub fn scalar_queue(&self) -> &VecDeque<Inst> {
        &self.scalar_queue
    }

    /// Nothing pending, queued or executing. Scalars awaiting retirement do
    /// not count.
    pub fn is_clear(&self, function_unit: &FunctionUnitCluster, memory_unit: &LoadStoreUnit) -> bool {
        self.pending.is_empty()
            && self.compute_queue.is_empty()
            && self.data_queue.is_empty()
            && memory_unit.is_free()
            && function_unit.is_idle()
    }

    fn should_pop_compute(&self, function_unit: &FunctionUnitCluster) -> bool {
        self.compute_queue
            .front()
            .and_then(Inst::func_unit_key)
            .is_some_and(|key| function_unit.can_accept_new_instruction(key))
    }

    fn has_room(&self, class: InstClass) -> bool {
        match class {
            InstClass::VectorCompute => self.compute_queue.len() < self.compute_queue_depth,
            InstClass::VectorMemory => self.data_queue.len() < self.data_queue_depth,
            InstClass::Scalar => true,
        }
    }

    fn queue_mut(&mut self, class: InstClass) -> &mut VecDeque<Inst> {
        match class {
            InstClass::VectorCompute => &mut self.compute_queue,
            InstClass::VectorMemory => &mut self.data_queue,
            InstClass::Scalar => &mut self.scalar_queue,
        }
    }

    /// One issue cycle. Unit states are those left by the previous cycle.
    pub fn run(
        &mut self,
        fetched: Option<&str>,
        register_file: &mut RegisterFile,
        function_unit: &FunctionUnitCluster,
        memory_unit: &LoadStoreUnit,
    ) -> anyhow::Result<Dispatch> {
        let mut dispatch = Dispatch::default();

        // 第一步：队首指令出队进入执行单元
        if self.should_pop_compute(function_unit) {
            dispatch.compute = self.compute_queue.pop_front();
        }
        if memory_unit.is_free() {
            dispatch.data = self.data_queue.pop_front();
        }
        if let Some(inst) = self.scalar_queue.pop_front() {
            debug!("Retire scalar `{}`", inst);
            register_file.release(&inst);
            dispatch.retired = Some(inst);
        }

        // 第二步：译码新取到的指令
        if let Some(line) = fetched {
            match Inst::decode(line) {
                Ok(inst) => {
                    debug!("Decoded `{}` as {:?}", inst, inst.class);
                    self.pending.push_back(inst);
                }
                Err(e) if e.is_fatal() => {
                    return Err(anyhow!(e).context(format!("Failed to decode `{}`", line)));
                }
                Err(e) => {
                    error!("Dropping `{}`: {}", line, e);
                    dispatch.decode_failure = Some(e);
                }
            }
        }

        // 第三步：最多接纳一条无冒险的指令
        dispatch.admitted = self.scan_and_issue(register_file);
        Ok(dispatch)
    }

    fn scan_and_issue(&mut self, register_file: &mut RegisterFile) -> Option<Inst> {
        let index = self
            .pending
            .iter()
            .position(|inst| self.has_room(inst.class) && register_file.is_clear(inst))?;
        let inst = self.pending.remove(index)?;
        if index > 0 {
            debug!("`{}` issues ahead of {} older pending instructions", inst, index);
        }
        register_file.reserve(&inst);
        self.queue_mut(inst.class).push_back(inst.clone());
        Some(inst)
    }
}
