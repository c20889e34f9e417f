use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use log::debug;

pub struct ExtractFile;

impl ExtractFile {
    /// Read an instruction trace, one instruction per line.
    pub fn extract_code_from_file<P: AsRef<Path>>(file_path: P) -> Result<Vec<String>> {
        let file_path = file_path.as_ref();
        debug!("Opening file: {}", file_path.display());
        let file = File::open(file_path)
            .with_context(|| format!("Couldn't open instruction file {}", file_path.display()))?;

        let mut code = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.with_context(|| format!("Failed to read {}", file_path.display()))?;
            if let Some(inst) = Self::strip_line(&line) {
                code.push(inst.to_string());
            }
        }
        debug!("Loaded {} instructions from {}", code.len(), file_path.display());
        Ok(code)
    }

    // 去掉注释和首尾空白，空行丢弃
    fn strip_line(line: &str) -> Option<&str> {
        let inst = line.split('#').next().unwrap_or_default().trim();
        (!inst.is_empty()).then_some(inst)
    }
}
