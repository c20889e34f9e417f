use crate::config::FunctionalUnits;
use crate::sim::unit::function_unit::FunctionUnitKeyType;
use crate::sim::vector_config::VectorConfig;

/// 计算功能单元执行指令所需的周期数
///
/// `depth + ceil(vl / lanes) - 1`, never below zero.
pub fn calc_func_cycle(key: FunctionUnitKeyType, config: &FunctionalUnits, vector_config: &VectorConfig) -> u32 {
    let depth = match key {
        FunctionUnitKeyType::VectorAlu => config.add_pipeline_depth,
        FunctionUnitKeyType::VectorMul => config.mul_pipeline_depth,
        FunctionUnitKeyType::VectorDiv => config.div_pipeline_depth,
    };
    (depth + vector_config.element_groups(config.lane_number)).saturating_sub(1)
}
