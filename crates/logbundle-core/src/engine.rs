use crate::buffer::{BufferOptions, PathsToCompressBuffer};
use crate::codec::{PayloadCompressor, ZstdCompressor};
use crate::config::{self, AppConfig, InputConfig};
use crate::error::Error;
use crate::progress::ProgressReporter;
use crate::scanner::{self, Discovery};
use crate::storage::Database;
use crate::task::TaskDescriptor;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info};

const PROGRESS_INTERVAL: usize = 1000;

/// How discovered files are handed to the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionMode {
    /// `add_file` per file, then `flush`.
    Streaming,
    /// One `add_files` call over the whole list.
    Bulk {
        num_archives: usize,
        target_archive_size: Option<u64>,
    },
}

pub struct SchedulingEngine {
    config: AppConfig,
    db_path: String,
}

#[derive(Debug)]
pub struct ScheduleResult {
    pub job_id: i64,
    pub scan_duration: Duration,
    pub partition_duration: Duration,
    pub files_scheduled: usize,
    pub empty_directories: usize,
    pub total_original_size: u64,
    pub tasks: Vec<TaskDescriptor>,
}

impl SchedulingEngine {
    pub fn new(config: AppConfig) -> Self {
        let db_path = config.database.path.clone();
        Self { config, db_path }
    }

    pub fn with_db_path(mut self, path: &str) -> Self {
        self.db_path = path.to_string();
        self.config.database.path = path.to_string();
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run one scheduling job:
    /// 1. Discover input files and empty directories
    /// 2. Create the job row
    /// 3. Feed the partitioning buffer, which stores one task per archive
    pub fn schedule(
        &self,
        mode: PartitionMode,
        reporter: &dyn ProgressReporter,
    ) -> Result<ScheduleResult, Error> {
        self.config.validate()?;

        // Phase 1: Discover
        info!("Discovering input files...");
        reporter.on_scan_start();
        let scan_start = Instant::now();
        let roots = input_roots(&self.config.io.input)?;
        info!("Input roots: {:?}", roots);
        let discovery = scanner::discover(&roots, &self.config.scheduler.ignore_patterns)?;
        let scan_duration = scan_start.elapsed();
        reporter.on_scan_complete(
            discovery.files.len(),
            discovery.empty_directories.len(),
            scan_duration.as_secs_f64(),
        );
        debug!(
            "Discovery completed in {:.2}s, {} files, {} empty directories",
            scan_duration.as_secs_f64(),
            discovery.files.len(),
            discovery.empty_directories.len(),
        );

        // Phase 2: Job row
        let db = Database::open(&self.db_path)?;
        let codec = ZstdCompressor::new(self.config.scheduler.compression_level);
        let clp_config = codec.compress(&rmp_serde::to_vec_named(&self.config.io)?)?;
        let job_id = db.create_compression_job(&clp_config)?;
        info!("Created compression job {}", job_id);

        // Phase 3: Partition
        reporter.on_partition_start(discovery.files.len());
        let partition_start = Instant::now();
        let tasks = self.partition(&db, job_id, codec, mode, &discovery, reporter)?;
        let partition_duration = partition_start.elapsed();
        reporter.on_partition_complete(tasks.len(), partition_duration.as_secs_f64());
        debug!(
            "Partitioning completed in {:.2}s, {} tasks",
            partition_duration.as_secs_f64(),
            tasks.len(),
        );

        Ok(ScheduleResult {
            job_id,
            scan_duration,
            partition_duration,
            files_scheduled: discovery.files.len(),
            empty_directories: discovery.empty_directories.len(),
            total_original_size: discovery.files.iter().map(|f| f.size).sum(),
            tasks,
        })
    }

    fn partition(
        &self,
        db: &Database,
        job_id: i64,
        codec: ZstdCompressor,
        mode: PartitionMode,
        discovery: &Discovery,
        reporter: &dyn ProgressReporter,
    ) -> Result<Vec<TaskDescriptor>, Error> {
        let options = BufferOptions {
            maintain_file_ordering: self.config.scheduler.maintain_file_ordering,
            empty_directories_allowed: self.config.scheduler.empty_directories_allowed,
        };
        let connection_params = serde_json::to_value(&self.config.database)?;
        let mut buffer =
            PathsToCompressBuffer::new(db, job_id, &self.config.io, options, connection_params)?
                .with_compressor(Box::new(codec));

        for dir in &discovery.empty_directories {
            buffer.add_empty_directory(dir);
        }

        match mode {
            PartitionMode::Streaming => {
                for (ix, file) in discovery.files.iter().enumerate() {
                    buffer.add_file(file.clone())?;
                    if (ix + 1) % PROGRESS_INTERVAL == 0 {
                        reporter.on_partition_progress(ix + 1, buffer.num_tasks());
                    }
                }
            }
            PartitionMode::Bulk {
                num_archives,
                target_archive_size,
            } => {
                let target = target_archive_size
                    .unwrap_or(self.config.io.output.target_archive_size);
                buffer.add_files(num_archives, target, &discovery.files)?;
            }
        }

        // Picks up the streaming tail, and empty directories when bulk mode had no files.
        buffer.flush()?;
        reporter.on_partition_progress(discovery.files.len(), buffer.num_tasks());

        Ok(buffer.into_tasks())
    }
}

/// Configured input paths plus those listed in `list_path`, with nested roots
/// removed.
fn input_roots(input: &InputConfig) -> Result<Vec<PathBuf>, Error> {
    let mut paths = input.paths.clone();
    if let Some(list_path) = &input.list_path {
        paths.extend(scanner::read_path_list(Path::new(list_path))?);
    }
    Ok(config::non_overlapping_paths(&paths))
}
