use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::constants::MAX_PROGRAM_SIZE;

#[derive(Debug, Error)]
pub enum RomError {
    #[error("could not read program image {path}")]
    Io {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("program image is {size} bytes long, at most {max} bytes fit in memory")]
    TooLarge { size: usize, max: usize },
}

/// A raw program image: big-endian 16-bit instructions, loaded at
/// [`PROGRAM_START`](crate::constants::PROGRAM_START).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rom {
    bytes: Vec<u8>,
}

impl Rom {
    /// # Errors
    ///
    /// Fails if the image is larger than [`MAX_PROGRAM_SIZE`].
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, RomError> {
        if bytes.len() > MAX_PROGRAM_SIZE {
            return Err(RomError::TooLarge {
                size: bytes.len(),
                max: MAX_PROGRAM_SIZE,
            });
        }

        Ok(Self { bytes })
    }

    /// Read a program image from a file
    ///
    /// # Errors
    ///
    /// Fails if the file can't be read or is too large.
    #[tracing::instrument]
    pub fn read(path: &Utf8Path) -> Result<Self, RomError> {
        let bytes = std::fs::read(path).map_err(|source| RomError::Io {
            path: path.to_owned(),
            source,
        })?;
        debug!(size = bytes.len(), "Read program image");
        Self::from_bytes(bytes)
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
