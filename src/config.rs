use std::path::Path;

use anyhow::{ensure, Context};
use serde::Deserialize;

/// Shape of the simulated core.
///
/// Keys are flat, so the plain `key = value  # comment` parameter files used
/// by the functional model parse as TOML without conversion.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulatorConfig {
    #[serde(flatten)]
    pub functional_units: FunctionalUnits,
    #[serde(flatten)]
    pub memory_units: MemoryUnits,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FunctionalUnits {
    #[serde(rename = "numLanes")]
    pub lane_number: u32,
    #[serde(rename = "pipelineDepthAdd")]
    pub add_pipeline_depth: u32,
    #[serde(rename = "pipelineDepthMul")]
    pub mul_pipeline_depth: u32,
    #[serde(rename = "pipelineDepthDiv")]
    pub div_pipeline_depth: u32,
    #[serde(rename = "computeQueueDepth")]
    pub compute_queue_depth: usize,
    /// Maximum vector length, also the vector length at reset.
    #[serde(rename = "maxVectorLength", default = "default_max_vector_length")]
    pub max_vector_length: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MemoryUnits {
    #[serde(rename = "vdmNumBanks")]
    pub bank_number: u32,
    #[serde(rename = "vlsPipelineDepth")]
    pub load_store_pipeline_depth: usize,
    #[serde(rename = "dataQueueDepth", default = "default_data_queue_depth")]
    pub data_queue_depth: usize,
    /// Cycles a bank stays busy after an access leaves the address pipeline.
    #[serde(rename = "bankBusyTime", default = "default_bank_busy_time")]
    pub bank_busy_time: u32,
}

fn default_data_queue_depth() -> usize {
    4
}

fn default_bank_busy_time() -> u32 {
    6
}

fn default_max_vector_length() -> u32 {
    64
}

impl SimulatorConfig {
    /// 从指定路径加载配置文件
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Couldn't open config file {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let fu = &self.functional_units;
        let mu = &self.memory_units;
        ensure!(fu.lane_number > 0, "numLanes must be at least 1");
        ensure!(fu.compute_queue_depth > 0, "computeQueueDepth must be at least 1");
        ensure!(mu.data_queue_depth > 0, "dataQueueDepth must be at least 1");
        ensure!(mu.bank_number > 0, "vdmNumBanks must be at least 1");
        ensure!(mu.load_store_pipeline_depth > 0, "vlsPipelineDepth must be at least 1");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG_TXT: &str = "\
# Vector core parameters
dataQueueDepth = 4
computeQueueDepth = 4
vdmNumBanks = 16 # banks
vlsPipelineDepth = 11
numLanes = 4
pipelineDepthMul = 12
pipelineDepthAdd = 2
pipelineDepthDiv = 8
";

    #[test]
    fn parses_plain_parameter_file() {
        let config = SimulatorConfig::from_toml_str(CONFIG_TXT).unwrap();
        assert_eq!(config.functional_units.lane_number, 4);
        assert_eq!(config.functional_units.add_pipeline_depth, 2);
        assert_eq!(config.functional_units.mul_pipeline_depth, 12);
        assert_eq!(config.functional_units.div_pipeline_depth, 8);
        assert_eq!(config.memory_units.bank_number, 16);
        assert_eq!(config.memory_units.load_store_pipeline_depth, 11);
        assert_eq!(config.memory_units.bank_busy_time, 6);
        assert_eq!(config.functional_units.max_vector_length, 64);
    }

    #[test]
    fn data_queue_depth_has_default() {
        let without = CONFIG_TXT.replace("dataQueueDepth = 4\n", "");
        let config = SimulatorConfig::from_toml_str(&without).unwrap();
        assert_eq!(config.memory_units.data_queue_depth, 4);
    }

    #[test]
    fn missing_required_parameter_is_fatal() {
        let without = CONFIG_TXT.replace("numLanes = 4\n", "");
        let err = SimulatorConfig::from_toml_str(&without).unwrap_err();
        assert!(format!("{err:#}").contains("numLanes"));
    }

    #[test]
    fn zero_lanes_rejected() {
        let zero = CONFIG_TXT.replace("numLanes = 4", "numLanes = 0");
        assert!(SimulatorConfig::from_toml_str(&zero).is_err());
    }

    #[test]
    fn missing_file_is_fatal() {
        assert!(SimulatorConfig::load_from_file("does/not/exist/Config.txt").is_err());
    }
}
