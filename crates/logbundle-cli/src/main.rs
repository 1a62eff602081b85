mod commands;
mod logging;
mod progress;

use std::process;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{BulkArgs, Cli, Commands, ListTasksArgs};
use dotenv::dotenv;
use logbundle_core::codec::ZstdCompressor;
use logbundle_core::payload::PathsToCompress;
use logbundle_core::storage::Database;
use logbundle_core::{AppConfig, PartitionMode, ScheduleResult, SchedulingEngine};
use progress::CliReporter;
use tracing::{error, info};

fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let _guard = logging::init_logger();

    let args = Cli::parse();

    let mut config = match logbundle_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };
    if args.ordered {
        config.scheduler.maintain_file_ordering = true;
    }

    let outcome = match args.command {
        Some(Commands::Schedule) => run_schedule(&config, PartitionMode::Streaming),
        Some(Commands::Bulk(BulkArgs {
            num_archives,
            target_archive_size,
        })) => run_schedule(
            &config,
            PartitionMode::Bulk {
                num_archives,
                target_archive_size,
            },
        ),
        Some(Commands::ListTasks(args)) => run_list_tasks(&config, &args),
        Some(Commands::PrintConfig) => print_config(&config),
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    if let Err(err) = outcome {
        error!("Error: {:#}", err);
        process::exit(1);
    }

    Ok(())
}

fn run_schedule(config: &AppConfig, mode: PartitionMode) -> anyhow::Result<()> {
    let engine = SchedulingEngine::new(config.clone());
    let reporter = CliReporter::new();
    let result = engine
        .schedule(mode, &reporter)
        .context("scheduling failed")?;

    print_summary(&result);

    // Descriptors go to stdout, one JSON object per line, for the dispatcher.
    for task in &result.tasks {
        println!("{}", serde_json::to_string(task)?);
    }
    Ok(())
}

fn print_summary(result: &ScheduleResult) {
    info!(
        "Job {}: discovery {}, partitioning {}",
        format!("{}", result.job_id).cyan(),
        format!("{:.2}s", result.scan_duration.as_secs_f64()).green(),
        format!("{:.2}s", result.partition_duration.as_secs_f64()).green(),
    );
    info!(
        "{} files ({} bytes) and {} empty directories in {} tasks",
        format!("{}", result.files_scheduled).yellow(),
        format!("{}", result.total_original_size).yellow(),
        format!("{}", result.empty_directories).yellow(),
        format!("{}", result.tasks.len()).cyan(),
    );
}

fn run_list_tasks(config: &AppConfig, args: &ListTasksArgs) -> anyhow::Result<()> {
    let db = Database::open(&config.database.path)
        .with_context(|| format!("opening {}", config.database.path))?;
    let codec = ZstdCompressor::new(config.scheduler.compression_level);

    let tasks = db.get_compression_tasks(args.job_id)?;
    if tasks.is_empty() {
        println!("No tasks for job {}", args.job_id);
        return Ok(());
    }

    for task in tasks {
        let paths = PathsToCompress::from_compressed(&task.clp_paths_to_compress, &codec)
            .with_context(|| format!("decoding task {}", task.id))?;
        println!(
            "task {} [{}]: {} files, {} bytes{}",
            task.id.to_string().cyan(),
            task.status,
            paths.file_paths.len(),
            task.partition_original_size,
            match &paths.empty_directories {
                Some(dirs) => format!(", {} empty directories", dirs.len()),
                None => String::new(),
            }
        );
        if args.verbose {
            for ((path, group_id), size) in paths
                .file_paths
                .iter()
                .zip(&paths.group_ids)
                .zip(&paths.st_sizes)
            {
                println!("    {:>6} {:>12}  {}", group_id, size, path);
            }
            for dir in paths.empty_directories.iter().flatten() {
                println!("    {:>6} {:>12}  {}/", "-", "-", dir);
            }
        }
    }
    Ok(())
}

fn print_config(config: &AppConfig) -> anyhow::Result<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
