pub mod models;
pub mod queries;
pub mod sqlite;

pub use sqlite::Database;

use crate::error::Error;

/// Insert side of the task table, as seen by the partitioning buffer.
///
/// The call is synchronous and the returned id must be the row id the store
/// generated for this insert.
pub trait TaskStore {
    fn insert_compression_task(
        &self,
        job_id: i64,
        partition_original_size: u64,
        clp_paths_to_compress: &[u8],
    ) -> Result<i64, Error>;
}

impl TaskStore for Database {
    fn insert_compression_task(
        &self,
        job_id: i64,
        partition_original_size: u64,
        clp_paths_to_compress: &[u8],
    ) -> Result<i64, Error> {
        Ok(self.insert_task_row(job_id, partition_original_size, clp_paths_to_compress)?)
    }
}
