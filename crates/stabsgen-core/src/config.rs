//! Target description consumed by the debug symbol writer

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::CoreError;

/// Configuration passed through the writer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabsConfig {
    /// Big-endian targets pass narrow arguments in the high-numbered bytes
    /// of their slot, which shifts a parameter's argument offset
    pub big_endian: bool,
    /// Number given to the first nested block; must match the label numbering
    /// of the pass that places the `LBB`/`LBE` labels
    pub first_block_number: u32,
    /// Label at the start of the text section
    pub text_label: String,
    /// Renumbering of hard registers for the debugger; unmapped registers
    /// keep their own number
    pub register_numbers: Vec<RegisterMapping>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterMapping {
    pub hard: u32,
    pub debugger: u32,
}

impl Default for StabsConfig {
    fn default() -> Self {
        Self {
            big_endian: false,
            first_block_number: 2,
            text_label: "Ltext".to_string(),
            register_numbers: Vec::new(),
        }
    }
}

impl StabsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_big_endian(mut self, big_endian: bool) -> Self {
        self.big_endian = big_endian;
        self
    }

    pub fn with_register(mut self, hard: u32, debugger: u32) -> Self {
        self.register_numbers.retain(|m| m.hard != hard);
        self.register_numbers.push(RegisterMapping { hard, debugger });
        self
    }

    /// Register number as the debugger numbers it
    pub fn debugger_register(&self, regno: u32) -> u32 {
        self.register_numbers
            .iter()
            .find(|m| m.hard == regno)
            .map_or(regno, |m| m.debugger)
    }

    pub fn from_toml(text: &str) -> Result<Self, CoreError> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&text)?;
        tracing::debug!(path = %path.display(), ?config, "loaded configuration");
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, CoreError> {
        Ok(toml::to_string(self)?)
    }
}
