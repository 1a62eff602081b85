use serde::{Deserialize, Serialize};

use crate::codec::PayloadCompressor;
use crate::error::Error;
use crate::partition::DrainedPartition;

/// Paths handed to one compression worker.
///
/// `file_paths`, `group_ids` and `st_sizes` are parallel. `empty_directories`
/// is left out of both encodings when `None`; a present but empty list is
/// encoded as `[]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsToCompress {
    pub file_paths: Vec<String>,
    pub group_ids: Vec<u64>,
    pub st_sizes: Vec<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty_directories: Option<Vec<String>>,
}

impl PathsToCompress {
    /// Payload for a drained partition, without empty directories.
    pub fn from_drained(drained: &DrainedPartition) -> Self {
        Self {
            file_paths: drained.file_paths.clone(),
            group_ids: drained.group_ids.clone(),
            st_sizes: drained.st_sizes.clone(),
            empty_directories: None,
        }
    }

    pub fn original_size(&self) -> u64 {
        self.st_sizes.iter().sum()
    }

    /// Binary map encoding (MessagePack with field names as keys).
    pub fn to_msgpack(&self) -> Result<Vec<u8>, Error> {
        Ok(rmp_serde::to_vec_named(self)?)
    }

    pub fn from_msgpack(bytes: &[u8]) -> Result<Self, Error> {
        Ok(rmp_serde::from_slice(bytes)?)
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string(self)?)
    }

    /// The form stored in `compression_tasks.clp_paths_to_compress`.
    pub fn to_compressed(&self, codec: &dyn PayloadCompressor) -> Result<Vec<u8>, Error> {
        Ok(codec.compress(&self.to_msgpack()?)?)
    }

    pub fn from_compressed(bytes: &[u8], codec: &dyn PayloadCompressor) -> Result<Self, Error> {
        Self::from_msgpack(&codec.decompress(bytes)?)
    }
}
