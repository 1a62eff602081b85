pub mod buffer;
pub mod codec;
pub mod config;
pub mod engine;
pub mod error;
pub mod file_metadata;
pub mod grouping;
pub mod partition;
pub mod payload;
pub mod progress;
pub mod scanner;
pub mod storage;
pub mod task;

pub use buffer::{PartitionSizes, PathsToCompressBuffer};
pub use crate::config::AppConfig;
pub use engine::{PartitionMode, ScheduleResult, SchedulingEngine};
pub use error::Error;
pub use file_metadata::FileMetadata;
pub use progress::{ProgressReporter, SilentReporter};
pub use task::TaskDescriptor;
