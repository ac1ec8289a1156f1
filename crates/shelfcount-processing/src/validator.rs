use shelfcount_core::models::MediaPayload;
use shelfcount_core::AppError;

/// Validation errors for decoded images
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Empty file")]
    EmptyFile,
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::FileTooLarge { .. } => AppError::PayloadTooLarge(err.to_string()),
            ValidationError::EmptyFile => AppError::InvalidEncoding("decoded image is empty".to_string()),
        }
    }
}

/// Media payload validator
///
/// Size is the only check: the MIME type is taken on trust from the file name.
#[derive(Debug, Clone, Copy)]
pub struct MediaValidator {
    max_file_size: usize,
}

impl MediaValidator {
    pub fn new(max_file_size: usize) -> Self {
        Self { max_file_size }
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Reject an encoded string whose decoded form would exceed the limit, before decoding.
    pub fn validate_encoded_len(&self, encoded_len: usize) -> Result<(), ValidationError> {
        let estimated = encoded_len / 4 * 3;
        if estimated > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size: estimated,
                max: self.max_file_size,
            });
        }
        Ok(())
    }

    pub fn validate(&self, payload: &MediaPayload) -> Result<(), ValidationError> {
        self.validate_file_size(payload.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_validator() -> MediaValidator {
        MediaValidator::new(1024 * 1024) // 1MB
    }

    #[test]
    fn test_validate_file_size_ok() {
        let validator = test_validator();
        assert!(validator.validate_file_size(512 * 1024).is_ok());
    }

    #[test]
    fn test_validate_file_size_too_large() {
        let validator = test_validator();
        let err = validator.validate_file_size(2 * 1024 * 1024).unwrap_err();
        assert!(matches!(AppError::from(err), AppError::PayloadTooLarge(_)));
    }

    #[test]
    fn test_validate_file_size_empty() {
        let validator = test_validator();
        assert!(matches!(
            validator.validate_file_size(0),
            Err(ValidationError::EmptyFile)
        ));
    }

    #[test]
    fn test_encoded_length_estimate() {
        let validator = MediaValidator::new(3);
        assert!(validator.validate_encoded_len(4).is_ok());
        assert!(validator.validate_encoded_len(8).is_err());
    }

    #[test]
    fn test_validate_payload() {
        let validator = test_validator();
        let payload = MediaPayload::new(vec![1, 2, 3], "image/png", "a.png");
        assert!(validator.validate(&payload).is_ok());
    }
}
