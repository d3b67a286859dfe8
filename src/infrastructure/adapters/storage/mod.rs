//! Storage Adapter - 临时音频文件存储实现

mod artifact_storage;

pub use artifact_storage::FileArtifactStore;
