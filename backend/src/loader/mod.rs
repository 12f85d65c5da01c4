//! CSV bulk loader: column scan and type inference, table materialization,
//! the row writer and the end-to-end upload pipeline.

pub mod dataset;
pub mod inference;
pub mod materialize;
pub mod pipeline;
pub mod writer;

pub use dataset::UploadedDataset;
pub use pipeline::{run_upload, SourceFile, UploadContext};
