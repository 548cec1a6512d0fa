//! Bippi Downloader
//!
//! Web front-end and job orchestrator around `yt-dlp`: resolves URL metadata,
//! runs downloads as supervised background jobs that clients poll, and purges
//! finished files after a retention window.

pub mod app_state;
pub mod config;
pub mod models;
pub mod routes;
pub mod services;
