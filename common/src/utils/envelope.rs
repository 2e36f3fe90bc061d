use serde::{Deserialize, Serialize};

use crate::error::AppError;

pub const STATUS_OK: u16 = 200;
pub const STATUS_FAILED: u16 = 400;

/// The `{status, message, data}` shape every component boundary reports through.
///
/// `status == 200` means full or partial success; anything else is a failure worth surfacing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Envelope<T> {
    pub status: u16,
    pub message: String,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status: STATUS_OK,
            message: String::new(),
            data,
        }
    }

    pub fn failed(message: impl Into<String>, data: T) -> Self {
        Self {
            status: STATUS_FAILED,
            message: message.into(),
            data,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}

impl<T: Default> Envelope<T> {
    pub fn from_error(err: &AppError) -> Self {
        Self {
            status: err.envelope_status(),
            message: err.to_string(),
            data: T::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_envelope_keeps_message() {
        let envelope: Envelope<Vec<String>> = Envelope::failed("extraction failed", Vec::new());
        assert!(!envelope.is_ok());
        assert_eq!(envelope.status, STATUS_FAILED);
        assert_eq!(envelope.message, "extraction failed");
    }

    #[test]
    fn error_envelope_uses_default_data() {
        let envelope: Envelope<Option<u32>> =
            Envelope::from_error(&AppError::NotFound("task 42".into()));
        assert_eq!(envelope.status, 404);
        assert_eq!(envelope.data, None);
        assert!(envelope.message.contains("task 42"));
    }

    #[test]
    fn serializes_with_flat_fields() {
        let value = serde_json::to_value(Envelope::ok(3_u32)).expect("serialize");
        assert_eq!(value["status"], 200);
        assert_eq!(value["message"], "");
        assert_eq!(value["data"], 3);
    }
}
