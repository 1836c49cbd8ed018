//! Incremental row-oriented export. Every row is flushed as it is written
//! so a mid-run failure leaves a valid, usable partial file.

use std::fs::File;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

/// One enriched (post, commenter) pair. Field names are the CSV header.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ContactRow {
    pub post_url: String,
    pub username: String,
    pub biography: String,
    pub phone_number: String,
    pub email: String,
    pub link: String,
}

/// Harvest-only shape: one row per (post, commenter) pair, no profile data.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CommentRow {
    pub post_url: String,
    pub comment_username: String,
}

pub trait RowSink: Send {
    fn write_contact(&mut self, row: &ContactRow) -> Result<()>;
    fn write_comment(&mut self, row: &CommentRow) -> Result<()>;
}

pub struct CsvSink {
    writer: csv::Writer<File>,
}

impl CsvSink {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file {}", path.display()))?;
        Ok(Self {
            writer: csv::Writer::from_writer(file),
        })
    }
}

impl RowSink for CsvSink {
    fn write_contact(&mut self, row: &ContactRow) -> Result<()> {
        self.writer.serialize(row).context("Failed to write row")?;
        self.writer.flush().context("Failed to flush output")?;
        Ok(())
    }

    fn write_comment(&mut self, row: &CommentRow) -> Result<()> {
        self.writer.serialize(row).context("Failed to write row")?;
        self.writer.flush().context("Failed to flush output")?;
        Ok(())
    }
}
