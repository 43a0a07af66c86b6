pub mod backend;
pub mod engine;
pub mod export;
pub mod progress;
pub mod session;
pub mod subscription;
