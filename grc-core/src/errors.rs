//! # Errors
//!
//! Structured errors for organization-context operations.
//! - consistent codes + class names, so the dashboard can render them
//! - can be carried through `anyhow::Error`
//! - `to_json()` for diagnostics panels
//!
//! Storage backends have their own typed error, see [`crate::storage::StoreError`].

use std::fmt;

use anyhow::Error as AnyError;

/// Convenience result type for grc-core APIs that can reject a request.
pub type GrcResult<T> = std::result::Result<T, AnyError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadRequest,     // 400
    NotFound,       // 404
    Conflict,       // 409
    GeneralError,   // 500
}

impl ErrorKind {
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::GeneralError => 500,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "BadRequest",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::GeneralError => "GeneralError",
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad-request",
            ErrorKind::NotFound => "not-found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::GeneralError => "general-error",
        }
    }
}

/// A structured error that can live inside `anyhow::Error`.
#[derive(Debug)]
pub struct GrcError {
    pub kind: ErrorKind,
    pub message: String,
    pub data: Option<serde_json::Value>,
    pub source: Option<AnyError>,
}

impl GrcError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            data: None,
            source: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_source(mut self, source: AnyError) -> Self {
        self.source = Some(source);
        self
    }

    pub fn code(&self) -> u16 {
        self.kind.status_code()
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn class_name(&self) -> &'static str {
        self.kind.class_name()
    }

    pub fn into_anyhow(self) -> AnyError {
        AnyError::new(self)
    }

    pub fn from_anyhow(err: &AnyError) -> Option<&GrcError> {
        err.downcast_ref::<GrcError>()
    }

    /// Keep a `GrcError` as is, wrap anything else as `GeneralError`.
    pub fn normalize(err: AnyError) -> GrcError {
        match err.downcast::<GrcError>() {
            Ok(grc) => grc,
            Err(other) => GrcError::new(ErrorKind::GeneralError, other.to_string()).with_source(other),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::json;

        let mut base = json!({
            "name": self.name(),
            "message": self.message,
            "code": self.code(),
            "className": self.class_name(),
        });

        if let Some(d) = &self.data {
            base["data"] = d.clone();
        }
        base
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::BadRequest, msg)
    }
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, msg)
    }
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, msg)
    }
}

impl fmt::Display for GrcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.name(), self.code(), self.message)
    }
}

impl std::error::Error for GrcError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Return early with a `GrcError` built from one of its constructors.
#[macro_export]
macro_rules! bail_grc {
    ($ctor:ident, $msg:expr) => {
        return Err($crate::errors::GrcError::$ctor($msg).into_anyhow())
    };
    ($ctor:ident, $fmt:expr, $($arg:tt)*) => {
        return Err($crate::errors::GrcError::$ctor(format!($fmt, $($arg)*)).into_anyhow())
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reject(id: &str) -> GrcResult<()> {
        bail_grc!(conflict, "workspace {} belongs to another tenant", id);
    }

    #[test]
    fn bail_macro_carries_kind_through_anyhow() {
        let err = reject("eu").unwrap_err();
        let grc = GrcError::from_anyhow(&err).expect("grc error");
        assert_eq!(grc.kind, ErrorKind::Conflict);
        assert_eq!(grc.code(), 409);
        assert_eq!(grc.to_string(), "Conflict (409): workspace eu belongs to another tenant");
    }

    #[test]
    fn normalize_wraps_foreign_errors() {
        let err = anyhow::anyhow!("disk on fire");
        let grc = GrcError::normalize(err);
        assert_eq!(grc.kind, ErrorKind::GeneralError);
        assert!(grc.source.is_some());
    }

    #[test]
    fn json_shape() {
        let json = GrcError::not_found("no tenant selected")
            .with_data(serde_json::json!({ "workspace": "eu" }))
            .to_json();
        assert_eq!(json["name"], "NotFound");
        assert_eq!(json["className"], "not-found");
        assert_eq!(json["code"], 404);
        assert_eq!(json["data"]["workspace"], "eu");
    }
}
