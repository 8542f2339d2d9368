use std::io::Write;

use log::{debug, info};

use crate::spk::archive::SpkEncoder;
use crate::spk::{tag, Package, SpkError, NAME_LEN, SHORTNAME_LEN, WIDE_MARKER};

impl<W: Write> SpkEncoder<W> {
    /// Writes one `SPK0` chunk (`SIDX` + `SDAT`).
    ///
    /// `force_wide` comes from the archive level and only widens the `SPK0`
    /// header. The layout inside goes wide once the package's own file data
    /// no longer fits 32 bits.
    pub(crate) fn write_spk0(&mut self, package: &Package, force_wide: bool) -> Result<(), SpkError> {
        let wide = package.needs_wide();
        let len = self.measure(|enc| enc.write_package(package, wide))?;

        if !self.builder.is_measuring() {
            debug!(
                "SPK0 {} {} ({} files) {} bytes, wide: {}, forced: {}",
                package.name(),
                package.version(),
                package.files().len(),
                len,
                wide,
                force_wide
            );
        }

        self.builder
            .write_chunk_header(tag::SPK0, len, force_wide || wide)?;
        self.write_package(package, wide)
    }

    fn write_package(&mut self, package: &Package, wide: bool) -> Result<(), SpkError> {
        self.write_sidx(package, wide)?;
        self.write_sdat(package, wide)
    }

    // The index chunk only goes wide when the index itself gets too big
    pub(crate) fn write_sidx(&mut self, package: &Package, wide: bool) -> Result<(), SpkError> {
        let len = self.measure(|enc| enc.write_sidx_payload(package, wide))?;

        self.builder.write_chunk_header(tag::SIDX, len, false)?;
        self.write_sidx_payload(package, wide)
    }

    fn write_sidx_payload(&mut self, package: &Package, wide: bool) -> Result<(), SpkError> {
        let total = package.total_data_size();
        let count = u32::try_from(package.files().len()).map_err(|_| SpkError::OffsetOverflow {
            field: "file count",
            value: package.files().len() as u64,
        })?;

        self.builder.write_padded(package.name().as_bytes(), NAME_LEN)?;
        self.builder.write_padded(package.shortname().as_bytes(), SHORTNAME_LEN)?;
        self.builder.write_bytes(&package.version().to_bytes())?;
        self.builder.write_u8(package.package_type().as_u8())?;
        self.builder.write_zeros(4)?;
        self.builder.write_u32(count)?;

        if wide {
            self.builder.write_u32(WIDE_MARKER)?;
            self.builder.write_sz64(total)?;
        } else {
            self.builder.write_u32(total as u32)?;
        }

        let strs_offsets = self.write_strs(package.files())?;

        let mut sdat_offset = 0;
        for (file, strs_offset) in package.files().iter().zip(strs_offsets) {
            self.builder.write_finf(
                file.length(),
                file.mode(),
                file.digests(),
                strs_offset,
                sdat_offset,
                wide,
            )?;
            sdat_offset += file.length();
        }

        self.builder.write_fend()?;
        Ok(())
    }

    // Wide packages already carry the size in SZ64, the SDAT value is then 0
    fn write_sdat(&mut self, package: &Package, wide: bool) -> Result<(), SpkError> {
        let total = package.total_data_size();
        self.builder
            .write_chunk_header(tag::SDAT, if wide { 0 } else { total }, false)?;

        if self.builder.is_measuring() {
            self.builder.sink().count(total);
            return Ok(());
        }

        for file in package.files().iter() {
            info!("Packing '{}'", file.path());

            if self.skip_data {
                self.builder.unsigned_fill(file.length())?;
                continue;
            }

            let mut reader = file.source().open()?;
            let copied = self.builder.copy_exact(&mut reader, file.length())?;
            if copied != file.length() {
                return Err(SpkError::LengthMismatch {
                    path: file.path().to_string(),
                    expected: file.length(),
                    actual: copied,
                });
            }
        }
        Ok(())
    }
}
