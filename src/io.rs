//! Reader/Writer traits and format dispatch
//!
//! Readers turn a payload file into a [`GraphPayload`]; writers persist a
//! [`LayoutReport`]. The registry picks a reader from the file extension and a
//! writer from a format id.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::payload::GraphPayload;
use crate::report::LayoutReport;

/// Errors that can occur during reading or writing
#[derive(Error, Debug)]
pub enum IoError {
    /// The file format is not supported
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The file extension could not be determined
    #[error("could not determine file format from path: {0}")]
    UnknownExtension(String),

    /// An I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A parsing error occurred
    #[error("parse error: {0}")]
    Parse(String),

    /// A serialization error occurred
    #[error("write error: {0}")]
    Write(String),
}

/// Result type for reader/writer operations
pub type IoResult<T> = Result<T, IoError>;

/// A reader parses an input file into a widget payload
pub trait Reader {
    fn read(&self, input: &Path) -> IoResult<GraphPayload>;

    /// File extensions this reader can handle (e.g., ["yaml", "yml"])
    fn supported_extensions(&self) -> &[&str];

    /// Check if this reader can handle the given file extension
    fn supports_extension(&self, ext: &str) -> bool {
        self.supported_extensions()
            .iter()
            .any(|e| e.eq_ignore_ascii_case(ext))
    }
}

/// A writer persists a layout report in one format
pub trait Writer {
    /// Serialize the report to a string
    fn render(&self, report: &LayoutReport) -> IoResult<String>;

    /// Identifier for this output format (e.g., "json", "yaml")
    fn format_id(&self) -> &str;

    /// Write the report to `output`, creating parent directories as needed
    fn write(&self, report: &LayoutReport, output: &Path) -> IoResult<()> {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(output, self.render(report)?)?;
        Ok(())
    }
}

/// Reader for JSON payloads
#[derive(Debug, Default)]
pub struct JsonReader;

impl Reader for JsonReader {
    fn read(&self, input: &Path) -> IoResult<GraphPayload> {
        let content = fs::read_to_string(input)?;
        serde_json::from_str(&content).map_err(|e| IoError::Parse(e.to_string()))
    }

    fn supported_extensions(&self) -> &[&str] {
        &["json"]
    }
}

/// Reader for YAML payloads
#[derive(Debug, Default)]
pub struct YamlReader;

impl Reader for YamlReader {
    fn read(&self, input: &Path) -> IoResult<GraphPayload> {
        let content = fs::read_to_string(input)?;
        serde_yaml::from_str(&content).map_err(|e| IoError::Parse(e.to_string()))
    }

    fn supported_extensions(&self) -> &[&str] {
        &["yaml", "yml"]
    }
}

/// Pretty-printed JSON report
#[derive(Debug, Default)]
pub struct JsonWriter;

impl Writer for JsonWriter {
    fn render(&self, report: &LayoutReport) -> IoResult<String> {
        serde_json::to_string_pretty(report).map_err(|e| IoError::Write(e.to_string()))
    }

    fn format_id(&self) -> &str {
        "json"
    }
}

/// YAML report
#[derive(Debug, Default)]
pub struct YamlWriter;

impl Writer for YamlWriter {
    fn render(&self, report: &LayoutReport) -> IoResult<String> {
        serde_yaml::to_string(report).map_err(|e| IoError::Write(e.to_string()))
    }

    fn format_id(&self) -> &str {
        "yaml"
    }
}

/// Registry of available readers and writers
pub struct FormatRegistry {
    readers: Vec<Box<dyn Reader>>,
    writers: Vec<Box<dyn Writer>>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FormatRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            readers: Vec::new(),
            writers: Vec::new(),
        }
    }

    /// Registry with JSON and YAML readers and writers
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_reader(Box::new(JsonReader));
        registry.register_reader(Box::new(YamlReader));
        registry.register_writer(Box::new(JsonWriter));
        registry.register_writer(Box::new(YamlWriter));
        registry
    }

    pub fn register_reader(&mut self, reader: Box<dyn Reader>) {
        self.readers.push(reader);
    }

    pub fn register_writer(&mut self, writer: Box<dyn Writer>) {
        self.writers.push(writer);
    }

    /// Find a reader for the given file extension
    pub fn reader_for_extension(&self, ext: &str) -> Option<&dyn Reader> {
        self.readers
            .iter()
            .find(|r| r.supports_extension(ext))
            .map(|r| r.as_ref())
    }

    /// Find a writer by format ID
    pub fn writer_for_format(&self, format_id: &str) -> Option<&dyn Writer> {
        self.writers
            .iter()
            .find(|w| w.format_id().eq_ignore_ascii_case(format_id))
            .map(|w| w.as_ref())
    }

    /// Get file extension from a path
    pub fn extension_from_path(path: &Path) -> Option<&str> {
        path.extension().and_then(|e| e.to_str())
    }

    /// Find a reader for the given path based on its extension
    pub fn reader_for_path(&self, path: &Path) -> IoResult<&dyn Reader> {
        let ext = Self::extension_from_path(path)
            .ok_or_else(|| IoError::UnknownExtension(path.display().to_string()))?;

        self.reader_for_extension(ext)
            .ok_or_else(|| IoError::UnsupportedFormat(ext.to_string()))
    }

    /// Find a writer by format ID, failing for unknown formats
    pub fn require_writer(&self, format_id: &str) -> IoResult<&dyn Writer> {
        self.writer_for_format(format_id)
            .ok_or_else(|| IoError::UnsupportedFormat(format_id.to_string()))
    }

    /// Read a payload, picking the reader from the path's extension
    pub fn read_payload(&self, path: &Path) -> IoResult<GraphPayload> {
        self.reader_for_path(path)?.read(path)
    }
}
