//! Render the tab blocks of one document as panel trees.

use crate::hostfs::PlainRenderer;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tabpanels_core::panel::PanelBuilder;
use tabpanels_core::{Settings, extract};

/// Read `file`, locate its tab blocks, and print each assembled panel.
pub fn execute(file: &Path, settings: &Settings) -> Result<()> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let source_path = file.to_string_lossy();

    let blocks = extract::find_blocks(&text, settings.keyword())?;
    if blocks.is_empty() {
        println!(
            "No '{}' blocks found in {}",
            settings.keyword(),
            file.display()
        );
        return Ok(());
    }

    let mut renderer = PlainRenderer;
    for (i, block) in blocks.iter().enumerate() {
        let block_text = &text[block.content_start..block.content_end];
        let footnote_offset = extract::inline_footnotes_before(&text, block.content_start);

        let panel = PanelBuilder::new(settings)
            .with_footnote_offset(footnote_offset)
            .build(block_text, &source_path, &mut renderer)?;

        println!(
            "block {} (line {}, {} tabs, selected {})",
            i + 1,
            block.base.line,
            panel.tab_count,
            panel.selected
        );
        print!("{}", panel.root);
    }

    Ok(())
}
