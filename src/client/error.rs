use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    /// The presign endpoint rejected the batch. No file of the batch was uploaded.
    #[error("presign request failed ({status}): {message}")]
    Presign { status: u16, message: String },

    /// The object store answered a PUT with a non-2xx status.
    #[error("upload rejected with status {0}")]
    UploadStatus(u16),

    /// Any other backend call that returned a non-2xx status.
    #[error("request failed ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("presign response does not match the requested keys: {0}")]
    GrantMismatch(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}
