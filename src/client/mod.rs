//! Client side of the upload flow: checksum, presign, streamed upload with
//! bounded retry, concurrent orchestration, and the optimistic state the
//! admin UI renders from.

pub mod api;
pub mod error;
pub mod file;
pub mod library;
pub mod optimistic;
pub mod orchestrator;
pub mod retry;
pub mod task;
pub mod taxonomy;
pub mod uploader;

pub use api::{AssetApi, PresignClient};
pub use error::ClientError;
pub use file::UploadFile;
pub use library::AssetLibrary;
pub use orchestrator::{UploadOrchestrator, UploadSummary};
pub use task::{ProgressMap, UploadStatus, UploadTask};
pub use uploader::{HttpUploader, Uploader};
