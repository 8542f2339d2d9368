use std::io::Write;

use log::{debug, info};

use crate::spk::builder::SpkBuilder;
use crate::spk::{tag, Archive, Package, SpkError, MAX32};

// u32 package count leading the SPKS payload
const SPKS_COUNT_LEN: u64 = 4;

/// Encoder context of one archive.
///
/// Everything an encode needs (output, options) lives here instead of in
/// global state. `encode` consumes the encoder so an archive is written
/// exactly once per context.
pub struct SpkEncoder<W: Write> {
    pub(super) builder: SpkBuilder<W>,
    pub(super) skip_data: bool,
}

impl<W: Write> SpkEncoder<W> {
    pub fn new(writer: W) -> Self {
        SpkEncoder {
            builder: SpkBuilder::new(writer),
            skip_data: false,
        }
    }

    // Fill SDAT with 0xAA instead of the file content
    pub fn skip_data(mut self, skip: bool) -> Self {
        self.skip_data = skip;
        self
    }

    pub fn into_inner(self) -> W {
        self.builder.into_inner()
    }

    pub fn position(&self) -> u64 {
        self.builder.position()
    }

    // Run `f` in counting mode and return how many bytes it would write
    pub(crate) fn measure<F>(&mut self, f: F) -> Result<u64, SpkError>
    where
        F: FnOnce(&mut Self) -> Result<(), SpkError>,
    {
        self.builder.sink().begin_measure();
        let ret = f(self);
        let len = self.builder.sink().end_measure();
        ret.map(|()| len)
    }

    pub fn encode(mut self, archive: &Archive) -> Result<W, SpkError> {
        if let Some(prefix) = archive.prefix() {
            let len = self.builder.write_prefix(&mut prefix.open()?)?;
            debug!("Prefix {} bytes", len);
        }

        self.write_spks(archive.packages())?;

        info!(
            "Wrote {} packages, {} bytes",
            archive.packages().len(),
            self.builder.position()
        );

        let mut inner = self.builder.into_inner();
        inner.flush()?;
        Ok(inner)
    }

    fn write_spks_payload(&mut self, packages: &[Package], force_wide: bool) -> Result<(), SpkError> {
        let count = u32::try_from(packages.len()).map_err(|_| SpkError::OffsetOverflow {
            field: "package count",
            value: packages.len() as u64,
        })?;

        self.builder.write_u32(count)?;
        self.write_packages(packages, force_wide)
    }

    fn write_packages(&mut self, packages: &[Package], force_wide: bool) -> Result<(), SpkError> {
        for package in packages.iter() {
            self.write_spk0(package, force_wide)?;
        }
        Ok(())
    }

    /// Measures the packages, first assuming every `SPK0` header stays
    /// narrow. Once the packages alone do not fit 32 bits, every `SPK0`
    /// header is forced wide and they are measured again.
    ///
    /// Returns the `SPKS` payload length (package count included) and
    /// whether the archive is wide.
    pub fn plan(&mut self, packages: &[Package]) -> Result<(u64, bool), SpkError> {
        let len = self.measure(|enc| enc.write_packages(packages, false))?;
        if len <= MAX32 {
            return Ok((SPKS_COUNT_LEN + len, false));
        }

        let len = self.measure(|enc| enc.write_packages(packages, true))?;
        Ok((SPKS_COUNT_LEN + len, true))
    }

    fn write_spks(&mut self, packages: &[Package]) -> Result<(), SpkError> {
        let spks_offset = self.builder.position();
        let (len, wide) = self.plan(packages)?;

        debug!(
            "SPKS at {:#x}, {} packages, {} bytes, wide: {}",
            spks_offset,
            packages.len(),
            len,
            wide
        );

        self.builder.write_chunk_header(tag::SPKS, len, wide)?;
        self.write_spks_payload(packages, wide)?;
        self.builder.write_send(spks_offset, wide)?;
        Ok(())
    }
}
