pub mod database_manager;

pub use database_manager::*;
