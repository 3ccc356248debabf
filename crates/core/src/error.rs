use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Attachment {name} could not be decoded: {reason}")]
    InvalidAttachment { name: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = CoreError::InvalidAttachment {
            name: "data.csv".to_string(),
            reason: "missing comma".to_string(),
        };
        assert!(error.to_string().contains("data.csv"));
        assert!(error.to_string().contains("missing comma"));
    }
}
