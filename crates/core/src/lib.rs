pub mod batch;
pub mod config;
pub mod testing;
pub mod ytdlp;

pub use batch::{
    BatchConfig, BatchError, BatchOrchestrator, BatchProgress, BatchResult, CallbackReporter,
    ChannelReporter, EnumerationError, Enumerator, FailedItem, FailureKind, FailureReason,
    ItemError, ItemProcessor, NoopReporter, Outcome, OutputFormat, ProgressReporter,
    ProgressSnapshot, SourceError, SourceRun, TracingReporter, WorkItem,
};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, AppConfig,
    BatchSettings, ConfigError,
};
pub use ytdlp::{YtDlpConfig, YtDlpEnumerator, YtDlpProcessor};
