// src/lib.rs

pub mod app_state;
pub mod config;
pub mod error;
pub mod mirror;
pub mod model;
pub mod service;
pub mod sync;
