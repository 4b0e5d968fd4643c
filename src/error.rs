// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `edimax_plug` library.
//!
//! Failures are grouped by where they originate: value validation, transport
//! to the plug, decoding of the plug's replies, and device-side rejections.
//! The coordinator adds the lifecycle variants on top.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred while talking to the plug.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while parsing a response.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The plug answered but refused the request.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    /// The first poll performed during setup failed.
    #[error("setup failed: {0}")]
    SetupFailed(#[source] Box<Error>),

    /// A user-initiated operation (e.g. switching the plug) failed.
    #[error("failed to {operation}: {source}")]
    OperationFailed {
        /// Short description of what was attempted.
        operation: &'static str,
        /// The underlying cause.
        #[source]
        source: Box<Error>,
    },

    /// The coordinator has been torn down.
    #[error("coordinator is closed")]
    Closed,
}

impl Error {
    /// Returns the coarse category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Value(_) => ErrorKind::InvalidValue,
            Self::Protocol(_) => ErrorKind::Connection,
            Self::Parse(_) => ErrorKind::Parse,
            Self::Device(_) => ErrorKind::Device,
            Self::SetupFailed(_) => ErrorKind::SetupFailed,
            Self::OperationFailed { .. } => ErrorKind::OperationFailed,
            Self::Closed => ErrorKind::Closed,
        }
    }

    pub(crate) fn operation_failed(operation: &'static str, source: Error) -> Self {
        Self::OperationFailed {
            operation,
            source: Box::new(source),
        }
    }
}

/// Coarse error category, cheap to copy and store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The plug was unreachable, timed out, or rejected the credentials.
    Connection,
    /// A value outside the accepted domain was supplied.
    InvalidValue,
    /// The plug's reply could not be decoded.
    Parse,
    /// The plug refused the command.
    Device,
    /// Setup aborted because the first poll failed.
    SetupFailed,
    /// A user-initiated operation failed.
    OperationFailed,
    /// The coordinator was already torn down.
    Closed,
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// An invalid power state string was provided.
    #[error("invalid power state: {0}")]
    InvalidPowerState(String),
}

/// Errors related to communication with the plug.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed.
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Connection to the device failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Request timed out.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,
}

/// Errors related to parsing plug responses.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Expected element is missing from the response.
    #[error("missing field in response: {0}")]
    MissingField(String),

    /// Failed to parse a specific value.
    #[error("failed to parse {field}: {message}")]
    InvalidValue {
        /// The field that failed to parse.
        field: String,
        /// Description of the parsing failure.
        message: String,
    },
}

/// Errors reported by the plug itself.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Command was rejected by the device.
    #[error("command rejected: {0}")]
    CommandRejected(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
