pub mod support;
pub mod time_logs;
pub mod users;
pub mod work_items;
