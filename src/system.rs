pub mod config;
pub mod database;
pub mod locale;
pub mod logging;
