use std::io::Write;

use log::debug;

use crate::spk::archive::SpkEncoder;
use crate::spk::{tag, FileEntry, SpkError, STRS_ALIGN};

// Bytes needed to bring `v` up to the next multiple of `alignment`
pub fn align(v: u64, alignment: u64) -> u64 {
    (alignment - (v % alignment)) % alignment
}

impl<W: Write> SpkEncoder<W> {
    /// Writes the `STRS` chunk and returns the table offset of every path,
    /// in file order.
    pub(crate) fn write_strs(&mut self, files: &[FileEntry]) -> Result<Vec<u64>, SpkError> {
        let len = self.measure(|enc| enc.write_paths(files).map(|_| ()))?;
        let padding = align(len, STRS_ALIGN);

        if !self.builder.is_measuring() {
            debug!("STRS {} paths, {} bytes + {} padding", files.len(), len, padding);
        }

        self.builder.write_chunk_header(tag::STRS, len + padding, false)?;
        let offsets = self.write_paths(files)?;
        self.builder.write_zeros(padding as usize)?;

        Ok(offsets)
    }

    fn write_paths(&mut self, files: &[FileEntry]) -> Result<Vec<u64>, SpkError> {
        let mut offsets = Vec::with_capacity(files.len());
        let mut offset = 0;

        for file in files.iter() {
            offsets.push(offset);
            self.builder.write_bytes(file.path().as_bytes())?;
            self.builder.write_u8(0)?;
            offset += file.path().len() as u64 + 1;
        }
        Ok(offsets)
    }
}
