use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Assumed inflation of gzip-family files once a worker decompresses them.
const GZIP_EXPANSION_FACTOR: u64 = 13;
const GZIP_EXTENSIONS: [&str; 3] = [".gz", ".gzip", ".tgz"];

/// One discovered input file.
///
/// `size` is the on-disk size recorded for accounting; `estimated_uncompressed_size`
/// is what partitioning thresholds are measured against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub path: PathBuf,
    pub size: u64,
    pub estimated_uncompressed_size: u64,
}

impl FileMetadata {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        let path = path.into();
        let estimated_uncompressed_size = estimate_uncompressed_size(&path, size);
        Self {
            path,
            size,
            estimated_uncompressed_size,
        }
    }

    /// Build with an explicit estimate, bypassing the extension heuristic.
    pub fn with_estimate(path: impl Into<PathBuf>, size: u64, estimated_uncompressed_size: u64) -> Self {
        Self {
            path: path.into(),
            size,
            estimated_uncompressed_size,
        }
    }

    pub fn from_path(path: &Path) -> io::Result<Self> {
        let metadata = fs::metadata(path)?;
        Ok(Self::new(path, metadata.len()))
    }

    pub fn path_string(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

fn estimate_uncompressed_size(path: &Path, size: u64) -> u64 {
    let file_name = path
        .file_name()
        .map(|f| f.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    if GZIP_EXTENSIONS.iter().any(|ext| file_name.ends_with(ext)) {
        size.saturating_mul(GZIP_EXPANSION_FACTOR)
    } else {
        size
    }
}
