pub mod dataset;
pub mod review;
pub mod session;
pub mod types;
pub mod upload;
