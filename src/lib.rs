//! SyncBridge transcription service
//!
//! Image-to-text and audio-to-text conversion driven by an in-process job
//! engine with simulated progress, exposed over HTTP behind a mock session.

pub mod app_state;
pub mod config;
pub mod models;
pub mod routes;
pub mod services;
