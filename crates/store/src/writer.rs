//! ZIP archive writing

use crate::error::StoreResult;
use std::io::{Seek, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Writes package entries into a ZIP archive
pub struct PackageWriter<W: Write + Seek> {
    zip: ZipWriter<W>,
}

impl<W: Write + Seek> PackageWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            zip: ZipWriter::new(writer),
        }
    }

    /// Write a text entry to the ZIP archive
    pub fn write_file(&mut self, path: &str, content: &str) -> StoreResult<()> {
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        self.zip.start_file(path, options)?;
        self.zip.write_all(content.as_bytes())?;

        Ok(())
    }

    /// Write binary data to the ZIP archive
    pub fn write_binary(&mut self, path: &str, data: &[u8]) -> StoreResult<()> {
        let options = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored); // Don't compress binary

        self.zip.start_file(path, options)?;
        self.zip.write_all(data)?;

        Ok(())
    }

    /// Finish the archive and hand back the underlying writer
    pub fn finish(self) -> StoreResult<W> {
        Ok(self.zip.finish()?)
    }
}
