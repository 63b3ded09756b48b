//! Library interface for stabsgen CLI components

use anyhow::{Context, Result};
use stabsgen_codegen::{Codegen, StabsCodegen};
use stabsgen_core::{CompilationUnit, StabsConfig};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Configuration from `path`, or the defaults when no file is given
pub fn load_config(path: Option<&Path>) -> Result<StabsConfig> {
    match path {
        Some(path) => {
            let config = StabsConfig::load(path)
                .with_context(|| format!("Failed to load configuration: {:?}", path))?;
            debug!(?config, "loaded configuration");
            Ok(config)
        }
        None => Ok(StabsConfig::default()),
    }
}

/// Read a unit from `input` and return its stabs directives; also write them
/// to `output` when given
pub fn handle_emit(input: &Path, output: Option<&Path>, config: Option<&Path>) -> Result<String> {
    info!("Generating stabs from {:?}", input);

    let config = load_config(config)?;
    let content = fs::read_to_string(input)
        .with_context(|| format!("Failed to read unit file: {:?}", input))?;
    let unit = CompilationUnit::from_json(&content).with_context(|| "Failed to parse unit JSON")?;

    let mut codegen = StabsCodegen::new(config);
    let code = codegen
        .generate(&unit)
        .with_context(|| format!("Failed to describe {}", unit.source_file))?;

    if let Some(output) = output {
        fs::write(output, &code)
            .with_context(|| format!("Failed to write output: {:?}", output))?;
        info!("Stabs written to {:?}", output);
    }
    Ok(code)
}

/// The effective configuration as TOML
pub fn handle_config(config: Option<&Path>) -> Result<String> {
    let config = load_config(config)?;
    config
        .to_toml()
        .with_context(|| "Failed to serialize configuration")
}
