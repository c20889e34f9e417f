use log::warn;

/// Software-visible vector state shared by fetch and the compute pipelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorConfig {
    pub vl: u32,     // number of active elements
    pub max_vl: u32, // maximum vector length of the hardware
}

impl VectorConfig {
    pub fn new(max_vl: u32) -> VectorConfig {
        VectorConfig { vl: max_vl, max_vl }
    }

    pub fn set_vl(&mut self, vl: u32) {
        if vl > self.max_vl {
            warn!("Vector length {} exceeds the maximum vector length {}", vl, self.max_vl);
        }
        self.vl = vl;
    }

    /// Number of passes the lanes need to cover every active element.
    pub fn element_groups(&self, lane_number: u32) -> u32 {
        self.vl.div_ceil(lane_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_groups_round_up() {
        let mut vc = VectorConfig::new(64);
        assert_eq!(vc.element_groups(64), 1);
        assert_eq!(vc.element_groups(1), 64);
        vc.set_vl(3);
        assert_eq!(vc.element_groups(2), 2);
        vc.set_vl(0);
        assert_eq!(vc.element_groups(4), 0);
    }
}
