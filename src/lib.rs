// src/lib.rs
pub mod config;
pub mod engine;
pub mod recorder;
pub mod serial;
pub mod stream;
pub mod types;
