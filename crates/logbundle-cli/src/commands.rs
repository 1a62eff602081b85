use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "logbundle")]
#[command(about = "Bundle discovered log files into compression tasks", long_about = None)]
pub struct Cli {
    /// Keep input file order instead of grouping similar filenames
    #[arg(long, global = true)]
    pub ordered: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Discover inputs and stream them through the partitioning buffer
    Schedule,
    /// Discover inputs and spread them over a fixed number of archives
    Bulk(BulkArgs),
    /// Print the stored tasks of a job
    ListTasks(ListTasksArgs),
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct BulkArgs {
    /// Number of archives to create (capped at the number of files)
    #[arg(long)]
    pub num_archives: usize,

    /// Per-archive target in bytes; defaults to io.output.target_archive_size
    #[arg(long)]
    pub target_archive_size: Option<u64>,
}

#[derive(Debug, Args)]
pub struct ListTasksArgs {
    #[arg(long)]
    pub job_id: i64,

    /// Print each task's paths as well
    #[arg(long)]
    pub verbose: bool,
}
