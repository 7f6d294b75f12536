//! Extract structural references from one document and print them as JSON.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tabpanels_core::{Settings, extract};

/// Read `file`, extract its plugin-block references, and print them.
pub fn execute(file: &Path, settings: &Settings) -> Result<()> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    let refs = extract::extract_document(&text, settings.keyword())?;
    println!("{}", serde_json::to_string_pretty(&refs)?);
    Ok(())
}
