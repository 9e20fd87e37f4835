use crate::error::AppError;
use crate::models::drive_types::RemoteFile;

/// Listing and download over a remote file store. `DriveClient` is the real
/// implementation; the pipeline is generic over this trait so tests can
/// substitute a fake.
#[allow(async_fn_in_trait)]
pub trait RemoteSource {
    /// Up to one page of files whose parent is `folder_id`, in listing order.
    /// An empty folder yields an empty vec, not an error.
    async fn list_folder(&self, folder_id: &str) -> Result<Vec<RemoteFile>, AppError>;

    /// The file's full content, accumulated in memory.
    async fn download(&self, file_id: &str) -> Result<Vec<u8>, AppError>;
}
