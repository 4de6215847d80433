use std::fmt;

pub const MAX_KEY_LENGTH: usize = 512;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Storage keys are relative, slash-separated paths without traversal segments.
pub fn validate_storage_key(key: &str) -> Result<(), ValidationError> {
    if key.is_empty() || key.len() > MAX_KEY_LENGTH {
        return Err(ValidationError::new(
            "INVALID_KEY",
            format!("Key must be 1-{} bytes", MAX_KEY_LENGTH),
        ));
    }

    if key.starts_with('/') || key.ends_with('/') {
        return Err(ValidationError::new(
            "INVALID_KEY",
            format!("Key must be a relative object path: {}", key),
        ));
    }

    if key.contains('\\') || key.chars().any(char::is_control) {
        return Err(ValidationError::new(
            "INVALID_KEY",
            format!("Key contains forbidden characters: {:?}", key),
        ));
    }

    if key
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        tracing::warn!("Path traversal attempt detected in key: {}", key);
        return Err(ValidationError::new(
            "INVALID_KEY",
            format!("Key contains empty or relative segments: {}", key),
        ));
    }

    Ok(())
}

/// Accepts `type/subtype` with optional parameters.
pub fn validate_content_type(content_type: &str) -> Result<mime::Mime, ValidationError> {
    content_type.parse::<mime::Mime>().map_err(|_| {
        ValidationError::new(
            "INVALID_CONTENT_TYPE",
            format!("Invalid content type: {}", content_type),
        )
    })
}

/// Validates file size against maximum limit
pub fn validate_file_size(size: u64, max_size: u64) -> Result<(), ValidationError> {
    if size > max_size {
        return Err(ValidationError::new(
            "FILE_TOO_LARGE",
            format!(
                "File size {} bytes exceeds maximum allowed {} bytes ({} MB)",
                size,
                max_size,
                max_size / 1024 / 1024
            ),
        ));
    }
    Ok(())
}

pub fn validate_checksum(checksum: &str) -> Result<(), ValidationError> {
    if crate::utils::hash::is_valid_checksum(checksum) {
        Ok(())
    } else {
        Err(ValidationError::new(
            "INVALID_CHECKSUM",
            "Checksum must be 64 hex characters",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key_rules() {
        assert!(validate_storage_key("assets/2024/photo.png").is_ok());
        assert!(validate_storage_key("photo.png").is_ok());

        assert!(validate_storage_key("").is_err());
        assert!(validate_storage_key("/etc/passwd").is_err());
        assert!(validate_storage_key("assets/../secret").is_err());
        assert!(validate_storage_key("assets//double").is_err());
        assert!(validate_storage_key("assets\\win").is_err());
        assert!(validate_storage_key("assets/dir/").is_err());
        assert!(validate_storage_key(&"a".repeat(MAX_KEY_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_content_type() {
        assert_eq!(
            validate_content_type("image/png").unwrap().essence_str(),
            "image/png"
        );
        assert!(validate_content_type("text/plain; charset=utf-8").is_ok());
        assert!(validate_content_type("not a mime").is_err());
    }

    #[test]
    fn test_validate_file_size() {
        assert!(validate_file_size(1024, 2048).is_ok());
        assert!(validate_file_size(2048, 2048).is_ok());
        let err = validate_file_size(4096, 2048).unwrap_err();
        assert_eq!(err.code, "FILE_TOO_LARGE");
    }
}
