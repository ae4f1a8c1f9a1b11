pub mod auth;
pub mod client;
pub mod models;
pub mod time_logs;
pub mod users;
pub mod wiql;
pub mod work_items;
