/// A scheduled compression job. Only created here; status transitions belong
/// to the orchestrator.
#[derive(Debug, Clone)]
pub struct CompressionJob {
    pub id: i64,
    pub status: String,
    pub creation_time: String,
    pub clp_config: Vec<u8>,
}

/// One archive's worth of paths, as stored for a worker to pick up.
#[derive(Debug, Clone)]
pub struct CompressionTask {
    pub id: i64,
    pub job_id: i64,
    pub status: String,
    pub partition_original_size: i64,
    pub clp_paths_to_compress: Vec<u8>,
}
