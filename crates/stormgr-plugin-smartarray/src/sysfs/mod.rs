//! Block geometry the kernel reports for the controller's logical drives.
//!
//! The tool never prints a logical drive's block size, but once the drive
//! is attached as a SCSI disk the kernel exposes it under
//! `<root>/block/<device>/`. The root is injectable so tests can supply a
//! fake tree.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::SmartArrayError;

const SYSFS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::sysfs");

/// Where sysfs is normally mounted.
pub const DEFAULT_SYSFS_ROOT: &str = "/sys";

// The kernel reports `size` in 512-byte sectors whatever the block size.
const SECTOR_BYTES: u64 = 512;

/// Logical block size and block count of one disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockGeometry {
    /// Logical block size in bytes.
    pub block_size: u64,
    /// Number of logical blocks.
    pub num_of_blocks: u64,
}

/// Reader for block device attributes below one sysfs root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sysfs {
    root: PathBuf,
}

impl Default for Sysfs {
    fn default() -> Self {
        Self::new(DEFAULT_SYSFS_ROOT)
    }
}

impl Sysfs {
    /// Reads attributes below `root` instead of `/sys`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Mount point being read.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Geometry of `device` (such as `sda`), or `None` when the kernel does
    /// not expose it.
    ///
    /// # Errors
    ///
    /// [`SmartArrayError::Sysfs`] when an attribute exists but cannot be
    /// read or does not hold a positive integer.
    pub fn geometry(&self, device: &str) -> Result<Option<BlockGeometry>, SmartArrayError> {
        let dir = self.root.join("block").join(device);
        let Some(block_size) = attribute(&dir.join("queue").join("logical_block_size"))? else {
            return Ok(None);
        };
        let Some(sectors) = attribute(&dir.join("size"))? else {
            return Ok(None);
        };
        let num_of_blocks = sectors
            .checked_mul(SECTOR_BYTES)
            .and_then(|bytes| bytes.checked_div(block_size))
            .ok_or_else(|| SmartArrayError::Sysfs {
                path: dir.join("size"),
                message: format!("{sectors} sectors overflow a byte count"),
            })?;
        Ok(Some(BlockGeometry {
            block_size,
            num_of_blocks,
        }))
    }
}

fn attribute(path: &Path) -> Result<Option<u64>, SmartArrayError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            debug!(target: SYSFS_TARGET, path = %path.display(), "attribute not present");
            return Ok(None);
        }
        Err(error) => {
            return Err(SmartArrayError::Sysfs {
                path: path.to_path_buf(),
                message: error.to_string(),
            });
        }
    };
    match text.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(Some(value)),
        _ => Err(SmartArrayError::Sysfs {
            path: path.to_path_buf(),
            message: format!("expected a positive integer, found {:?}", text.trim()),
        }),
    }
}
