// src/provision/extract.rs

use std::fs::File;
use std::path::Path;

use flate2::read::GzDecoder;
use tar::Archive;

use crate::errors::ExtractError;

/// Unpacks a downloaded archive into a directory.
///
/// Implementations are synchronous; the provisioner runs them on the
/// blocking pool.
pub trait ArchiveExtractor: Send + Sync {
    fn extract(&self, archive: &Path, dest: &Path) -> Result<(), ExtractError>;
}

/// `.tar.gz` extractor backed by `flate2` + `tar`.
///
/// Entry permissions are preserved, so the miner binary keeps its executable
/// bit when the archive carries one.
#[derive(Debug, Clone, Copy, Default)]
pub struct TarGzExtractor;

impl ArchiveExtractor for TarGzExtractor {
    fn extract(&self, archive: &Path, dest: &Path) -> Result<(), ExtractError> {
        let io_err = |source: std::io::Error| ExtractError::Io {
            archive: archive.to_path_buf(),
            source,
        };

        let file = File::open(archive).map_err(io_err)?;
        let mut tar = Archive::new(GzDecoder::new(file));
        tar.set_preserve_permissions(true);
        tar.set_overwrite(true);
        tar.unpack(dest).map_err(io_err)?;
        Ok(())
    }
}
