use serde::{Deserialize, Serialize};

/// What a worker receives for one submitted partition.
///
/// `clp_io_config_json` is shared by every task of a job; the paths are the
/// uncompressed JSON form of the stored payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDescriptor {
    pub job_id: i64,
    pub task_id: i64,
    pub clp_io_config_json: String,
    pub paths_to_compress_json: String,
    pub database_connection_params: serde_json::Value,
}
