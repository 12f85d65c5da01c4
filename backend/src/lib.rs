pub mod app;
pub mod config;
pub mod error;
pub mod identity;
pub mod loader;
pub mod platform;
pub mod review;
pub mod services;
pub mod session;
pub mod storage;
pub mod warehouse;
