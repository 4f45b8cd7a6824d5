// src/lib.rs

//! sitewatch: website monitoring scheduler and change-detection engine

pub mod api;
pub mod config;
pub mod error;
#[cfg(feature = "lambda")]
pub mod lambda;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod scheduler;
#[cfg(feature = "server")]
pub mod server;
pub mod services;
pub mod storage;
pub mod utils;
