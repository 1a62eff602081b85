use super::models::*;
use super::sqlite::Database;
use rusqlite::{params, Result, Row};
use tracing::debug;

impl Database {
    // ── Compression jobs ─────────────────────────────────────────

    /// Insert a job row holding the (already encoded) job configuration and
    /// return its id.
    pub fn create_compression_job(&self, clp_config: &[u8]) -> Result<i64> {
        let now = chrono::Utc::now().to_rfc3339();
        self.connection().execute(
            "INSERT INTO compression_jobs (creation_time, clp_config) VALUES (?1, ?2)",
            params![now, clp_config],
        )?;
        let id = self.connection().last_insert_rowid();
        debug!("Created compression job {}", id);
        Ok(id)
    }

    pub fn get_compression_job(&self, job_id: i64) -> Result<Option<CompressionJob>> {
        match self.connection().query_row(
            "SELECT id, status, creation_time, clp_config FROM compression_jobs WHERE id = ?1",
            params![job_id],
            |row| {
                Ok(CompressionJob {
                    id: row.get(0)?,
                    status: row.get(1)?,
                    creation_time: row.get(2)?,
                    clp_config: row.get(3)?,
                })
            },
        ) {
            Ok(job) => Ok(Some(job)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }

    // ── Compression tasks ────────────────────────────────────────

    pub(crate) fn insert_task_row(
        &self,
        job_id: i64,
        partition_original_size: u64,
        clp_paths_to_compress: &[u8],
    ) -> Result<i64> {
        let partition_original_size = i64::try_from(partition_original_size)
            .map_err(|err| rusqlite::Error::ToSqlConversionFailure(Box::new(err)))?;
        self.connection().execute(
            "INSERT INTO compression_tasks \
             (job_id, partition_original_size, clp_paths_to_compress) \
             VALUES (?1, ?2, ?3)",
            params![job_id, partition_original_size, clp_paths_to_compress],
        )?;
        Ok(self.connection().last_insert_rowid())
    }

    /// Tasks of a job in submission order.
    pub fn get_compression_tasks(&self, job_id: i64) -> Result<Vec<CompressionTask>> {
        let mut stmt = self.connection().prepare(
            "SELECT id, job_id, status, partition_original_size, clp_paths_to_compress \
             FROM compression_tasks WHERE job_id = ?1 ORDER BY id",
        )?;
        let tasks = stmt
            .query_map(params![job_id], map_task_row)?
            .collect::<Result<Vec<_>>>()?;
        Ok(tasks)
    }

    pub fn count_compression_tasks(&self, job_id: i64) -> Result<i64> {
        self.connection().query_row(
            "SELECT COUNT(*) FROM compression_tasks WHERE job_id = ?1",
            params![job_id],
            |row| row.get(0),
        )
    }
}

fn map_task_row(row: &Row<'_>) -> Result<CompressionTask> {
    Ok(CompressionTask {
        id: row.get(0)?,
        job_id: row.get(1)?,
        status: row.get(2)?,
        partition_original_size: row.get(3)?,
        clp_paths_to_compress: row.get(4)?,
    })
}
