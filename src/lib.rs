pub mod client;
pub mod error;
pub mod models;
pub mod modules;
pub mod portal; // Portal API service module
pub mod utils;
