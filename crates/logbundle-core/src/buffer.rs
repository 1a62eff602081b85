use std::collections::VecDeque;
use std::path::Path;

use tracing::{debug, trace};

use crate::codec::{PayloadCompressor, ZstdCompressor};
use crate::config::IoConfig;
use crate::error::Error;
use crate::file_metadata::FileMetadata;
use crate::grouping::{FileGroup, FileGrouper, SimilarFilenameGrouper};
use crate::partition::{DrainedPartition, FilesPartition};
use crate::payload::PathsToCompress;
use crate::storage::TaskStore;
use crate::task::TaskDescriptor;

/// How the buffer lays files out into partitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct BufferOptions {
    /// Keep input order (each file gets its own group id) instead of grouping
    /// similar filenames together.
    pub maintain_file_ordering: bool,
    pub empty_directories_allowed: bool,
}

/// Sizes consumed by one submitted partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionSizes {
    pub task_id: i64,
    /// Sum of estimated sizes; what buffer thresholds are measured in.
    pub estimated_size: u64,
    /// Sum of on-disk sizes; what is recorded on the task row.
    pub original_size: u64,
}

/// Accumulates discovered files for one job and turns them into compression
/// tasks of roughly `target_archive_size` estimated bytes each.
///
/// Not synchronized: one buffer per job, driven by a single caller.
pub struct PathsToCompressBuffer<'a> {
    store: &'a dyn TaskStore,
    grouper: Box<dyn FileGrouper>,
    compressor: Box<dyn PayloadCompressor>,

    files: Vec<FileMetadata>,
    empty_directories: Option<Vec<String>>,
    total_file_size: u64,
    target_archive_size: u64,
    file_size_to_trigger_compression: u64,
    maintain_file_ordering: bool,

    job_id: i64,
    clp_io_config_json: String,
    database_connection_params: serde_json::Value,
    tasks: Vec<TaskDescriptor>,
}

impl<'a> PathsToCompressBuffer<'a> {
    pub fn new(
        store: &'a dyn TaskStore,
        job_id: i64,
        io_config: &IoConfig,
        options: BufferOptions,
        database_connection_params: serde_json::Value,
    ) -> Result<Self, Error> {
        io_config.validate()?;
        let target_archive_size = io_config.output.target_archive_size;

        Ok(Self {
            store,
            grouper: Box::new(SimilarFilenameGrouper),
            compressor: Box::new(ZstdCompressor::default()),
            files: Vec::new(),
            empty_directories: options.empty_directories_allowed.then(Vec::new),
            total_file_size: 0,
            target_archive_size,
            file_size_to_trigger_compression: target_archive_size.saturating_mul(2),
            maintain_file_ordering: options.maintain_file_ordering,
            job_id,
            clp_io_config_json: serde_json::to_string(io_config)?,
            database_connection_params,
            tasks: Vec::new(),
        })
    }

    pub fn with_grouper(mut self, grouper: Box<dyn FileGrouper>) -> Self {
        self.grouper = grouper;
        self
    }

    pub fn with_compressor(mut self, compressor: Box<dyn PayloadCompressor>) -> Self {
        self.compressor = compressor;
        self
    }

    pub fn job_id(&self) -> i64 {
        self.job_id
    }

    pub fn num_tasks(&self) -> usize {
        self.tasks.len()
    }

    pub fn tasks(&self) -> &[TaskDescriptor] {
        &self.tasks
    }

    pub fn into_tasks(self) -> Vec<TaskDescriptor> {
        self.tasks
    }

    /// Estimated bytes currently waiting in the backlog.
    pub fn total_file_size(&self) -> u64 {
        self.total_file_size
    }

    pub fn pending_files(&self) -> &[FileMetadata] {
        &self.files
    }

    pub fn contains_paths(&self) -> bool {
        !self.files.is_empty()
            || self
                .empty_directories
                .as_ref()
                .is_some_and(|dirs| !dirs.is_empty())
    }

    // ── Streaming mode ───────────────────────────────────────────

    pub fn add_file(&mut self, file: FileMetadata) -> Result<(), Error> {
        trace!("Buffering {}", file.path.display());
        self.total_file_size += file.estimated_uncompressed_size;
        self.files.push(file);

        if self.total_file_size >= self.file_size_to_trigger_compression {
            self.partition_and_compress(false)?;
        }
        Ok(())
    }

    /// Ignored unless the buffer was built with empty directories allowed.
    pub fn add_empty_directory(&mut self, path: impl AsRef<Path>) {
        if let Some(dirs) = self.empty_directories.as_mut() {
            dirs.push(path.as_ref().to_string_lossy().into_owned());
        }
    }

    /// Submit everything still buffered, however little.
    pub fn flush(&mut self) -> Result<(), Error> {
        self.partition_and_compress(true)
    }

    fn partition_and_compress(&mut self, flush: bool) -> Result<(), Error> {
        if !flush && self.total_file_size < self.target_archive_size {
            return Ok(());
        }
        if !self.contains_paths() {
            return Ok(());
        }

        debug!(
            "Partitioning {} buffered files ({} bytes estimated, flush={}) for job {}",
            self.files.len(),
            self.total_file_size,
            flush,
            self.job_id
        );

        if self.maintain_file_ordering {
            self.partition_in_order(flush)
        } else {
            self.partition_by_similarity(flush)
        }
    }

    /// Each file gets its own group id so workers keep the input order.
    fn partition_in_order(&mut self, flush: bool) -> Result<(), Error> {
        let mut partition = FilesPartition::new();
        let mut next_group_id = 0u64;
        // `reached`: backlog prefix placed into some partition.
        // `consumed`: backlog prefix whose partitions were stored.
        let mut reached = 0usize;
        let mut consumed = 0usize;
        let mut outcome = Ok(());

        if self.total_file_size >= self.target_archive_size {
            while reached < self.files.len() {
                partition.add(self.files[reached].clone(), next_group_id);
                next_group_id += 1;
                reached += 1;

                if partition.total_size() >= self.target_archive_size {
                    if let Err(err) = self.submit_and_account(&mut partition) {
                        outcome = Err(err);
                        break;
                    }
                    consumed = reached;
                    if self.total_file_size < self.target_archive_size {
                        break;
                    }
                }
            }
        }

        self.files.drain(..consumed);
        outcome?;

        if flush && self.contains_paths() {
            // The partition already holds files[..reached - consumed].
            for file in self.files[reached - consumed..].iter().cloned() {
                partition.add(file, next_group_id);
                next_group_id += 1;
            }
            self.submit_and_account(&mut partition)?;
            self.files.clear();
        }
        Ok(())
    }

    fn partition_by_similarity(&mut self, flush: bool) -> Result<(), Error> {
        let mut picks = RoundRobin::new(self.grouper.group(&self.files));
        let mut partition = FilesPartition::new();

        let outcome = self.fill_round_robin(&mut picks, &mut partition, flush);

        // Whatever was not stored goes back into the backlog: members of the
        // partition in flight first, then files no pass reached.
        let mut remaining = partition.drain().files;
        remaining.extend(picks.into_remaining());
        self.files = remaining;
        outcome?;

        if flush && self.contains_paths() {
            let mut partition = FilesPartition::new();
            for (group_id, file) in self.files.iter().cloned().enumerate() {
                partition.add(file, group_id as u64);
            }
            self.submit_and_account(&mut partition)?;
            self.files.clear();
        }
        Ok(())
    }

    fn fill_round_robin(
        &mut self,
        picks: &mut RoundRobin,
        partition: &mut FilesPartition,
        flush: bool,
    ) -> Result<(), Error> {
        while let Some((file, group_id)) = picks.next() {
            partition.add(file, group_id);

            if partition.total_size() >= self.target_archive_size {
                self.submit_and_account(partition)?;
                if !flush && self.total_file_size < self.target_archive_size {
                    break;
                }
            }
        }

        if partition.has_members() {
            self.submit_and_account(partition)?;
        }
        Ok(())
    }

    fn submit_and_account(&mut self, partition: &mut FilesPartition) -> Result<(), Error> {
        let sizes = self.submit_partition(partition)?;
        self.total_file_size = self.total_file_size.saturating_sub(sizes.estimated_size);
        Ok(())
    }

    // ── Bulk mode ────────────────────────────────────────────────

    /// Spread a fully known file list over `target_num_archives` partitions
    /// (capped at the number of files) and submit every one of them, however
    /// full. Independent of the streaming backlog.
    pub fn add_files(
        &mut self,
        target_num_archives: usize,
        target_archive_size: u64,
        files: &[FileMetadata],
    ) -> Result<(), Error> {
        let num_partitions = target_num_archives.min(files.len());
        if num_partitions == 0 {
            if files.is_empty() {
                return Ok(());
            }
            return Err(Error::InvalidConfig(
                "target_num_archives must be greater than zero".to_string(),
            ));
        }

        let mut partitions: Vec<FilesPartition> =
            (0..num_partitions).map(|_| FilesPartition::new()).collect();
        let mut picks = RoundRobin::new(self.grouper.group(files));

        let mut next_partition_ix = 0usize;
        while let Some((file, group_id)) = picks.next() {
            let ix = next_partition_with_space(&partitions, next_partition_ix, target_archive_size);
            next_partition_ix = (ix + 1) % num_partitions;
            partitions[ix].add(file, group_id);
        }

        debug!(
            "Distributed {} files over {} partitions for job {}",
            files.len(),
            num_partitions,
            self.job_id
        );

        for partition in partitions.iter_mut() {
            self.submit_partition(partition)?;
        }
        Ok(())
    }

    // ── Submission ───────────────────────────────────────────────

    /// Store one task for the partition's contents and record its descriptor.
    ///
    /// The partition is drained on success. On failure its contents, and any
    /// empty directories this submission would have carried, are put back.
    pub fn submit_partition(&mut self, partition: &mut FilesPartition) -> Result<PartitionSizes, Error> {
        let drained = partition.drain();
        let mut paths_to_compress = PathsToCompress::from_drained(&drained);
        if let Some(dirs) = self.empty_directories.as_mut() {
            if !dirs.is_empty() {
                paths_to_compress.empty_directories = Some(std::mem::take(dirs));
            }
        }

        match self.store_task(&paths_to_compress) {
            Ok(task_id) => {
                let sizes = PartitionSizes {
                    task_id,
                    estimated_size: drained.total_size,
                    original_size: drained.original_size(),
                };
                debug!(
                    "Submitted task {} for job {}: {} files, {} bytes ({} estimated)",
                    task_id,
                    self.job_id,
                    drained.files.len(),
                    sizes.original_size,
                    sizes.estimated_size
                );
                Ok(sizes)
            }
            Err(err) => {
                self.return_unsubmitted(partition, drained, paths_to_compress.empty_directories);
                Err(err)
            }
        }
    }

    fn store_task(&mut self, paths_to_compress: &PathsToCompress) -> Result<i64, Error> {
        let paths_to_compress_json = paths_to_compress.to_json()?;
        let compressed = paths_to_compress.to_compressed(self.compressor.as_ref())?;

        let task_id = self.store.insert_compression_task(
            self.job_id,
            paths_to_compress.original_size(),
            &compressed,
        )?;

        self.tasks.push(TaskDescriptor {
            job_id: self.job_id,
            task_id,
            clp_io_config_json: self.clp_io_config_json.clone(),
            paths_to_compress_json,
            database_connection_params: self.database_connection_params.clone(),
        });
        Ok(task_id)
    }

    fn return_unsubmitted(
        &mut self,
        partition: &mut FilesPartition,
        drained: DrainedPartition,
        empty_directories: Option<Vec<String>>,
    ) {
        partition.restore(drained);
        if let (Some(mut carried), Some(pending)) = (empty_directories, self.empty_directories.as_mut()) {
            carried.append(pending);
            *pending = carried;
        }
    }
}

fn next_partition_with_space(partitions: &[FilesPartition], start: usize, target_size: u64) -> usize {
    let n = partitions.len();
    (0..n)
        .map(|offset| (start + offset) % n)
        .find(|&ix| partitions[ix].total_size() < target_size)
        // Every partition is full: fall back to the rotation slot.
        .unwrap_or(start)
}

/// Hands out group members one at a time, cycling across groups and dropping
/// a group once its last member is taken.
struct RoundRobin {
    groups: Vec<(u64, VecDeque<FileMetadata>)>,
    next: usize,
}

impl RoundRobin {
    fn new(groups: Vec<FileGroup>) -> Self {
        let groups = groups
            .into_iter()
            .filter(|g| !g.files.is_empty())
            .map(|g| (g.id, VecDeque::from(g.files)))
            .collect();
        Self { groups, next: 0 }
    }

    fn next(&mut self) -> Option<(FileMetadata, u64)> {
        let ix = self.next;
        let (group_id, members) = self.groups.get_mut(ix)?;
        let group_id = *group_id;
        let file = members.pop_front()?;

        if members.is_empty() {
            self.groups.remove(ix);
        } else {
            self.next = ix + 1;
        }
        if self.groups.is_empty() {
            self.next = 0;
        } else {
            self.next %= self.groups.len();
        }

        Some((file, group_id))
    }

    /// Members never handed out, group by group.
    fn into_remaining(self) -> Vec<FileMetadata> {
        self.groups
            .into_iter()
            .flat_map(|(_, members)| members)
            .collect()
    }
}
