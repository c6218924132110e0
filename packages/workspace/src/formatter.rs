//! Formatter seam.
//!
//! Saving runs the document text through a formatter before it hits disk.
//! The real formatter is an external tool owned by the caller; the default
//! passes text through unchanged. A formatter failure aborts the save and
//! leaves the document dirty.

use std::io;
use std::path::Path;

pub trait Formatter: Send + Sync {
    fn format(&self, path: &Path, source: &str) -> io::Result<String>;
}

/// Default formatter: writes the text exactly as edited.
pub struct PassthroughFormatter;

impl Formatter for PassthroughFormatter {
    fn format(&self, _path: &Path, source: &str) -> io::Result<String> {
        Ok(source.to_string())
    }
}
