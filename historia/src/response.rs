//! Tagged outcome of parsing a search payload.

use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::errors::{ParseError, ValidationIssue};

pub const NO_RESULTS_MESSAGE: &str = "No results found";
pub const SUCCESS_MESSAGE: &str = "Success";

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Status {
    Success,
    Error,
}

/// Either a payload with a human readable message, or the data-shape error that
/// prevented one from being built.
#[derive(Debug, Clone)]
pub enum Response<T> {
    Success { payload: T, message: String },
    Error { cause: ParseError },
}

impl<T> Response<T> {
    pub fn success(payload: T, message: impl Into<String>) -> Self {
        Response::Success {
            payload,
            message: message.into(),
        }
    }

    pub fn failure(cause: ParseError) -> Self {
        Response::Error { cause }
    }

    pub fn status(&self) -> Status {
        match self {
            Response::Success { .. } => Status::Success,
            Response::Error { .. } => Status::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Response::Error { .. })
    }

    pub fn payload(&self) -> Option<&T> {
        match self {
            Response::Success { payload, .. } => Some(payload),
            Response::Error { .. } => None,
        }
    }

    pub fn into_payload(self) -> Option<T> {
        self.into_result().ok()
    }

    /// Success message, or the error's description for failures.
    pub fn message(&self) -> String {
        match self {
            Response::Success { message, .. } => message.clone(),
            Response::Error { cause } => cause.to_string(),
        }
    }

    pub fn error(&self) -> Option<&ParseError> {
        match self {
            Response::Success { .. } => None,
            Response::Error { cause } => Some(cause),
        }
    }

    pub fn into_result(self) -> Result<T, ParseError> {
        match self {
            Response::Success { payload, .. } => Ok(payload),
            Response::Error { cause } => Err(cause),
        }
    }
}

#[derive(serde::Serialize)]
struct ErrorValue<'a> {
    message: String,
    issues: &'a [ValidationIssue],
}

/// Serializes as the descriptor UI callers consume:
/// `{ payload, message, status, error, isError }`.
impl<T: Serialize> Serialize for Response<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Response", 5)?;
        state.serialize_field("payload", &self.payload())?;
        state.serialize_field("message", &self.message())?;
        state.serialize_field("status", &self.status())?;
        let error = self.error().map(|cause| ErrorValue {
            message: cause.to_string(),
            issues: cause.details().map(|details| details.issues.as_slice()).unwrap_or(&[]),
        });
        state.serialize_field("error", &error)?;
        state.serialize_field("isError", &self.is_error())?;
        state.end()
    }
}
