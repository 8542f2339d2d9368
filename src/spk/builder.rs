use std::io::{self, Read, Write};

use byteorder::{LittleEndian, WriteBytesExt};
use log::debug;

use crate::hash::{Digests, UNSIGNED_FILL};
use crate::spk::sink::SpkSink;
use crate::spk::tag::{self, Tag};
use crate::spk::{SpkError, FI64_LEN, FINF_LEN, MAX32, WIDE_MARKER};

pub struct SpkBuilder<W: Write> {
    sink: SpkSink<W>,
}

// This is the low level chunk writer, everything goes through the sink so
// that it works the same in counting mode
impl<W: Write> SpkBuilder<W> {
    pub fn new(writer: W) -> Self {
        SpkBuilder {
            sink: SpkSink::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.sink.into_inner()
    }

    pub fn sink(&mut self) -> &mut SpkSink<W> {
        &mut self.sink
    }

    pub fn position(&self) -> u64 {
        self.sink.position()
    }

    pub fn is_measuring(&self) -> bool {
        self.sink.is_measuring()
    }

    // Narrow form is tag + u32, wide form is tag + marker + u64
    pub fn write_chunk_header(&mut self, tag: &Tag, value: u64, force_wide: bool) -> io::Result<usize> {
        self.sink.write_all(tag)?;
        if !force_wide && value <= MAX32 {
            self.sink.write_u32::<LittleEndian>(value as u32)?;
            Ok(8)
        } else {
            self.sink.write_u32::<LittleEndian>(WIDE_MARKER)?;
            self.sink.write_u64::<LittleEndian>(value)?;
            Ok(16)
        }
    }

    pub fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        self.sink.write_all(data)
    }

    pub fn write_u8(&mut self, v: u8) -> io::Result<()> {
        self.sink.write_u8(v)
    }

    pub fn write_u16(&mut self, v: u16) -> io::Result<()> {
        self.sink.write_u16::<LittleEndian>(v)
    }

    pub fn write_u32(&mut self, v: u32) -> io::Result<()> {
        self.sink.write_u32::<LittleEndian>(v)
    }

    pub fn write_u64(&mut self, v: u64) -> io::Result<()> {
        self.sink.write_u64::<LittleEndian>(v)
    }

    pub fn write_zeros(&mut self, len: usize) -> io::Result<()> {
        self.write_fill(0, len as u64)
    }

    pub fn write_fill(&mut self, byte: u8, len: u64) -> io::Result<()> {
        if self.sink.is_measuring() {
            self.sink.count(len);
            return Ok(());
        }

        let block = [byte; 4096];
        let mut left = len;
        while left > 0 {
            let n = left.min(block.len() as u64) as usize;
            self.sink.write_all(&block[..n])?;
            left -= n as u64;
        }
        Ok(())
    }

    // Field is NUL padded up to `len`, the caller guarantees it fits
    pub fn write_padded(&mut self, data: &[u8], len: usize) -> io::Result<()> {
        self.sink.write_all(data)?;
        self.write_zeros(len.saturating_sub(data.len()))
    }

    // Copy exactly `len` bytes of `reader`, returns how many were available
    pub fn copy_exact<R: Read>(&mut self, reader: &mut R, len: u64) -> io::Result<u64> {
        io::copy(&mut reader.take(len), &mut self.sink)
    }

    /// Writes one `FINF` (narrow) or `FI64` (wide) file record.
    ///
    /// The record header always carries the fixed payload length. The file
    /// length is written twice from the same value.
    pub fn write_finf(
        &mut self,
        length: u64,
        mode: u16,
        digests: &Digests,
        strs_offset: u64,
        sdat_offset: u64,
        wide: bool,
    ) -> Result<usize, SpkError> {
        if wide {
            let mut len = self.write_chunk_header(tag::FI64, FI64_LEN, false)?;
            self.write_u64(strs_offset)?;
            self.write_u64(length)?;
            self.write_u64(sdat_offset)?;
            self.write_u64(length)?;
            self.write_u16(mode)?;
            self.write_zeros(3)?;
            self.write_bytes(digests.signature.as_bytes())?;
            self.write_bytes(digests.checksum.as_bytes())?;
            self.write_zeros(3 + 4)?;
            len += FI64_LEN as usize;
            Ok(len)
        } else {
            let mut len = self.write_chunk_header(tag::FINF, FINF_LEN, false)?;
            self.write_u32(narrow("strs offset", strs_offset)?)?;
            self.write_u32(narrow("file length", length)?)?;
            self.write_u32(narrow("sdat offset", sdat_offset)?)?;
            self.write_u32(narrow("file length", length)?)?;
            self.write_u16(mode)?;
            self.write_zeros(3)?;
            self.write_bytes(digests.signature.as_bytes())?;
            self.write_bytes(digests.checksum.as_bytes())?;
            self.write_zeros(3)?;
            len += FINF_LEN as usize;
            Ok(len)
        }
    }

    pub fn write_sz64(&mut self, size: u64) -> io::Result<usize> {
        let len = self.write_chunk_header(tag::SZ64, 8, false)?;
        self.write_u64(size)?;
        Ok(len + 8)
    }

    pub fn write_fend(&mut self) -> io::Result<usize> {
        self.write_chunk_header(tag::FEND, 0, false)
    }

    // Footer pointing back at the SPKS chunk
    pub fn write_send(&mut self, spks_offset: u64, wide: bool) -> io::Result<usize> {
        if wide || spks_offset > MAX32 {
            debug!("SE64 -> {:#018x}", spks_offset);
            let len = self.write_chunk_header(tag::SE64, 8, false)?;
            self.write_u64(spks_offset)?;
            Ok(len + 8)
        } else {
            debug!("SEND -> {:#010x}", spks_offset);
            let len = self.write_chunk_header(tag::SEND, 4, false)?;
            self.write_u32(spks_offset as u32)?;
            Ok(len + 4)
        }
    }

    // Raw bytes ahead of the SPKS chunk, not part of any chunk
    pub fn write_prefix<R: Read>(&mut self, reader: &mut R) -> io::Result<u64> {
        io::copy(reader, &mut self.sink)
    }

    pub fn unsigned_fill(&mut self, len: u64) -> io::Result<()> {
        self.write_fill(UNSIGNED_FILL, len)
    }
}

fn narrow(field: &'static str, value: u64) -> Result<u32, SpkError> {
    if value > MAX32 {
        return Err(SpkError::OffsetOverflow { field, value });
    }
    Ok(value as u32)
}
