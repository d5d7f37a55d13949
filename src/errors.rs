//! Error types for dynoddl.
//!
//! Every lifecycle step reports failures through [`DdlError`].
//! AWS SDK errors are mapped with typed `SdkError` variant matching and
//! service error codes, no string parsing of debug output.

use aws_sdk_dynamodb::error::{ProvideErrorMetadata, SdkError};
use std::fmt;
use thiserror::Error;

use crate::validate::MismatchDetail;

/// Result type used across the crate.
pub type Result<T> = std::result::Result<T, DdlError>;

/// Category of a control-plane failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPlaneErrorKind {
    /// Dispatch failure, I/O error or timeout talking to the store.
    Connection,
    /// Missing, invalid or expired credentials.
    Credentials,
    AccessDenied,
    /// Request rate or limit exceeded.
    Throttled,
    /// The table is being created, deleted or updated by someone else.
    ResourceInUse,
    /// The store rejected the request shape.
    Validation,
    Other,
}

impl ControlPlaneErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlPlaneErrorKind::Connection => "connection",
            ControlPlaneErrorKind::Credentials => "credentials",
            ControlPlaneErrorKind::AccessDenied => "access denied",
            ControlPlaneErrorKind::Throttled => "throttled",
            ControlPlaneErrorKind::ResourceInUse => "resource in use",
            ControlPlaneErrorKind::Validation => "validation",
            ControlPlaneErrorKind::Other => "other",
        }
    }
}

impl fmt::Display for ControlPlaneErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by table lifecycle operations.
#[derive(Debug, Error)]
pub enum DdlError {
    /// Unrecognized policy string or malformed settings.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The entity descriptor cannot produce a table definition.
    #[error("Invalid schema for '{domain_type}': {reason}")]
    InvalidSchema { domain_type: String, reason: String },

    /// Transport, auth or throttling failure from the store.
    #[error("Control plane error ({kind}): {message}")]
    ControlPlane {
        kind: ControlPlaneErrorKind,
        message: String,
    },

    #[error("Table '{table}' not found")]
    NotFound { table: String },

    /// The live table differs from the entity's expected definition.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(MismatchDetail),

    /// A poll wait was cancelled before the table converged.
    #[error("Couldn't wait to detect table {table}: wait was interrupted")]
    WaitInterrupted { table: String },

    #[error("Async runtime error: {0}")]
    Runtime(String),
}

impl DdlError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn invalid_schema(domain_type: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSchema {
            domain_type: domain_type.into(),
            reason: reason.into(),
        }
    }

    pub fn control_plane(kind: ControlPlaneErrorKind, msg: impl Into<String>) -> Self {
        Self::ControlPlane {
            kind,
            message: msg.into(),
        }
    }

    pub fn not_found(table: impl Into<String>) -> Self {
        Self::NotFound {
            table: table.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, DdlError::NotFound { .. })
    }
}

// ========== TYPED ERROR MAPPING ==========

/// Map non-service `SdkError` variants (dispatch failures, timeouts, etc.).
///
/// Returns `None` for `ServiceError`.
fn map_outer_sdk_error<E, R>(err: &SdkError<E, R>) -> Option<DdlError>
where
    E: fmt::Debug,
    R: fmt::Debug,
{
    use ControlPlaneErrorKind::*;

    match err {
        SdkError::DispatchFailure(dispatch) => {
            let msg = if dispatch.is_timeout() {
                "Connection timed out to DynamoDB. Check your network or endpoint."
            } else if dispatch.is_io() {
                "Connection failed to DynamoDB (I/O error). Check if the endpoint is reachable."
            } else {
                "Connection failed to DynamoDB. Check if the endpoint is reachable."
            };
            Some(DdlError::control_plane(Connection, msg))
        }
        SdkError::TimeoutError(_) => Some(DdlError::control_plane(
            Connection,
            "Connection timed out to DynamoDB. Check your network or endpoint.",
        )),
        SdkError::ConstructionFailure(err) => {
            let msg = format!("{:?}", err);
            if msg.contains("credentials") || msg.contains("Credentials") {
                Some(DdlError::control_plane(
                    Credentials,
                    "No AWS credentials found. Configure credentials via environment variables \
                    (AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY), AWS profile, or IAM role.",
                ))
            } else {
                Some(DdlError::control_plane(
                    Other,
                    format!("Failed to build request: {}", msg),
                ))
            }
        }
        SdkError::ResponseError(err) => Some(DdlError::control_plane(
            Other,
            format!("Invalid response from DynamoDB: {:?}", err),
        )),
        SdkError::ServiceError(_) => None,
        _ => Some(DdlError::control_plane(
            Other,
            format!("Unknown error from DynamoDB: {:?}", err),
        )),
    }
}

/// Map a DynamoDB service error code + message to a [`DdlError`].
fn map_dynamodb_code(
    code: Option<&str>,
    message: Option<&str>,
    display: &str,
    table: Option<&str>,
) -> DdlError {
    use ControlPlaneErrorKind::*;

    let detail = message.unwrap_or(display).to_string();

    match code {
        Some("ResourceNotFoundException") => match table {
            Some(t) => DdlError::not_found(t),
            None => DdlError::not_found("<unknown>"),
        },
        Some("ResourceInUseException") => {
            let msg = match table {
                Some(t) => format!("Table '{}' is in use: {}", t, detail),
                None => format!("Resource already in use: {}", detail),
            };
            DdlError::control_plane(ResourceInUse, msg)
        }
        Some("UnrecognizedClientException") => DdlError::control_plane(
            Credentials,
            "Invalid AWS credentials. Check your access key and secret.",
        ),
        Some("ExpiredTokenException") => DdlError::control_plane(
            Credentials,
            "AWS credentials have expired. Refresh your session token.",
        ),
        Some("AccessDeniedException") => {
            DdlError::control_plane(AccessDenied, format!("Access denied to DynamoDB: {}", detail))
        }
        Some(
            "ProvisionedThroughputExceededException"
            | "LimitExceededException"
            | "RequestLimitExceeded"
            | "ThrottlingException",
        ) => DdlError::control_plane(
            Throttled,
            format!("DynamoDB request rate or limit exceeded: {}", detail),
        ),
        Some("ValidationException") => DdlError::control_plane(Validation, detail),
        _ => DdlError::control_plane(Other, detail),
    }
}

/// Map DynamoDB control-plane errors using typed `SdkError` variants.
///
/// For `ServiceError`, uses `ProvideErrorMetadata` to get the error code and message.
/// `ResourceNotFoundException` becomes [`DdlError::NotFound`] naming `table`.
pub fn map_sdk_error<E, R>(err: SdkError<E, R>, table: Option<&str>) -> DdlError
where
    E: ProvideErrorMetadata + fmt::Debug + fmt::Display,
    R: fmt::Debug,
{
    if let Some(ddl_err) = map_outer_sdk_error(&err) {
        return ddl_err;
    }

    if let Some(service_err) = err.as_service_error() {
        let meta = ProvideErrorMetadata::meta(service_err);
        let display = service_err.to_string();
        return map_dynamodb_code(meta.code(), meta.message(), &display, table);
    }

    DdlError::control_plane(
        ControlPlaneErrorKind::Other,
        format!("Unexpected DynamoDB error: {:?}", err),
    )
}
