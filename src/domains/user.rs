pub mod dto;
pub mod errors;
pub mod handlers;
pub mod repository;
pub mod services;
