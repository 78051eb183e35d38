pub mod errors;
pub mod models;
pub mod state;
#[cfg(test)]
pub mod testing;
pub mod utils;
