// Time logs module
pub mod create_time_log;
pub mod read_time_logs;

// Re-export the public items
pub use create_time_log::{CreateTimeLogArgs, TimeLogType, create_time_log};
pub use read_time_logs::{ReadTimeLogsArgs, read_time_logs};
