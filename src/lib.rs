pub mod config;
pub mod errors;
pub mod imaging;
pub mod services;
pub mod utils;
pub mod web;
