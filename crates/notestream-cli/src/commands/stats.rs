//! Stats command handler

use anyhow::{Context, Result};

use notestream_core::{LearningStats, NoteStore, SharedStorage};

use crate::output::Output;

/// Show learning statistics over every note
pub fn show(storage: &SharedStorage, output: &Output) -> Result<()> {
    let mut store = NoteStore::open(storage.clone()).context("Failed to open note store")?;
    let stats = LearningStats::compute(store.load_all()?);
    output.print_stats(&stats)
}
