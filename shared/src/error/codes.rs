//! Unified error codes for the shop backend
//!
//! Error codes are shared between the server and API clients and are
//! organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Product / stock errors
//! - 9xxx: System errors

use http::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Token has expired
    TokenExpired = 1002,
    /// Token is invalid
    TokenInvalid = 1003,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order cannot be cancelled in its current status
    OrderNotCancellable = 4002,
    /// Requested order status transition is not allowed
    InvalidStatusTransition = 4003,
    /// Order contains no items
    EmptyOrder = 4004,

    // ==================== 5xxx: Payment ====================
    /// Payment not found
    PaymentNotFound = 5001,
    /// Payment is not in a pending state
    PaymentNotPending = 5002,
    /// Payment has expired
    PaymentExpired = 5003,

    // ==================== 6xxx: Product / Stock ====================
    /// Product not found
    ProductNotFound = 6001,
    /// Requested quantity exceeds available stock
    StockUnavailable = 6002,
    /// Stock is locked by a concurrent operation
    StockContended = 6003,
    /// Durable stock confirmation failed (depleted between reserve and confirm)
    StockConfirmFailed = 6004,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Stock cache error
    CacheError = 9003,
}

impl ErrorCode {
    /// Default human-readable message for this code
    pub fn message(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Unknown => "Unknown error",
            Self::ValidationFailed => "Validation failed",
            Self::NotFound => "Resource not found",
            Self::AlreadyExists => "Resource already exists",
            Self::InvalidRequest => "Invalid request",
            Self::NotAuthenticated => "Authentication required",
            Self::TokenExpired => "Token expired",
            Self::TokenInvalid => "Invalid token",
            Self::OrderNotFound => "Order not found",
            Self::OrderNotCancellable => "Order cannot be cancelled",
            Self::InvalidStatusTransition => "Invalid order status transition",
            Self::EmptyOrder => "Order contains no items",
            Self::PaymentNotFound => "Payment not found",
            Self::PaymentNotPending => "Payment is not pending",
            Self::PaymentExpired => "Payment has expired",
            Self::ProductNotFound => "Product not found",
            Self::StockUnavailable => "Insufficient stock",
            Self::StockContended => "Stock is busy, please retry",
            Self::StockConfirmFailed => "Stock confirmation failed",
            Self::InternalError => "Internal server error",
            Self::DatabaseError => "Database error",
            Self::CacheError => "Stock cache error",
        }
    }

    /// HTTP status code this error maps to
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,
            Self::ValidationFailed | Self::InvalidRequest | Self::EmptyOrder => {
                StatusCode::BAD_REQUEST
            }
            Self::NotAuthenticated | Self::TokenExpired | Self::TokenInvalid => {
                StatusCode::UNAUTHORIZED
            }
            Self::NotFound
            | Self::OrderNotFound
            | Self::PaymentNotFound
            | Self::ProductNotFound => StatusCode::NOT_FOUND,
            Self::AlreadyExists => StatusCode::CONFLICT,
            Self::OrderNotCancellable
            | Self::InvalidStatusTransition
            | Self::PaymentNotPending
            | Self::PaymentExpired
            | Self::StockUnavailable
            | Self::StockContended
            | Self::StockConfirmFailed => StatusCode::CONFLICT,
            Self::Unknown | Self::InternalError | Self::DatabaseError | Self::CacheError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", *self as u16)
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code as u16
    }
}

/// Error returned when a u16 does not map to a known [`ErrorCode`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid error code: {0}")]
pub struct InvalidErrorCode(pub u16);

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            0 => Self::Success,
            1 => Self::Unknown,
            2 => Self::ValidationFailed,
            3 => Self::NotFound,
            4 => Self::AlreadyExists,
            5 => Self::InvalidRequest,
            1001 => Self::NotAuthenticated,
            1002 => Self::TokenExpired,
            1003 => Self::TokenInvalid,
            4001 => Self::OrderNotFound,
            4002 => Self::OrderNotCancellable,
            4003 => Self::InvalidStatusTransition,
            4004 => Self::EmptyOrder,
            5001 => Self::PaymentNotFound,
            5002 => Self::PaymentNotPending,
            5003 => Self::PaymentExpired,
            6001 => Self::ProductNotFound,
            6002 => Self::StockUnavailable,
            6003 => Self::StockContended,
            6004 => Self::StockConfirmFailed,
            9001 => Self::InternalError,
            9002 => Self::DatabaseError,
            9003 => Self::CacheError,
            other => return Err(InvalidErrorCode(other)),
        };
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_u16() {
        for code in [
            ErrorCode::Success,
            ErrorCode::StockUnavailable,
            ErrorCode::OrderNotFound,
            ErrorCode::CacheError,
        ] {
            let raw: u16 = code.into();
            assert_eq!(ErrorCode::try_from(raw).unwrap(), code);
        }
    }

    #[test]
    fn test_unknown_code_rejected() {
        assert_eq!(ErrorCode::try_from(4999), Err(InvalidErrorCode(4999)));
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(
            ErrorCode::StockUnavailable.http_status(),
            StatusCode::CONFLICT
        );
        assert_eq!(ErrorCode::OrderNotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ErrorCode::DatabaseError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
