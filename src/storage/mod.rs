//! Persistence collaborators: raw snapshots in, published datasets out

pub mod publish;
pub mod raw_store;

pub use publish::{DatasetMetadata, PublishSink, PublishedDataset, SqlitePublisher, UploadMode};
pub use raw_store::RawStore;
