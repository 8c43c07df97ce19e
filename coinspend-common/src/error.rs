//! Standardized error handling for Coinspend
//!
//! A single error taxonomy covers the whole spend path. Variants fall into two
//! groups:
//!
//! - Caller misuse detected before any I/O (`NoPayments`, `InvalidAmount`,
//!   `DustAmount`, `DustChange`, `NoChangeAddress`, `InvalidAddress`,
//!   `AmountOverflow`).
//! - Hard stops during signing or submission (`SigningKeyMissing`, `Signing`,
//!   `TransactionTooLarge`, `SubmissionRejected`, `Network`).
//!
//! Insufficient funds is deliberately absent: selection, building and both
//! orchestration phases report it as `Ok(None)` so callers can show one
//! generic "cannot send" outcome.
//!
//! # Usage
//!
//! ```
//! use coinspend_common::error::{ErrorCategory, SpendError};
//!
//! let err = SpendError::DustAmount { amount: 300, minimum: 546 };
//! assert_eq!(err.category(), ErrorCategory::Validation);
//! assert!(err.to_string().contains("300"));
//! ```

use std::io;
use thiserror::Error;

/// The main error type for spend attempts
#[derive(Debug, Error)]
pub enum SpendError {
    /// A payment request with no destinations
    #[error("Invalid request: at least one payment is required")]
    NoPayments,

    /// A payment amount of zero
    #[error("Invalid amount: payment to {address} must be greater than zero")]
    InvalidAmount { address: String },

    /// A payment amount below the dust threshold
    #[error("Dust output: {amount} satoshis (minimum is {minimum} satoshis)")]
    DustAmount { amount: u64, minimum: u64 },

    /// Change that would be below the dust threshold
    #[error("Dust change: {change} satoshis (minimum is {minimum} satoshis)")]
    DustChange { change: u64, minimum: u64 },

    /// Change is owed but there is nowhere to send it
    #[error("Invalid transaction: change of {change} satoshis owed but no change address supplied")]
    NoChangeAddress { change: u64 },

    /// Destination or change address that does not parse for the active network
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Summing amounts exceeded the representable range
    #[error("Amount math error: {0}")]
    AmountOverflow(String),

    /// Unspent output record that could not be decoded
    #[error("Invalid unspent output record: {0}")]
    InvalidRecord(String),

    /// No private key could be resolved for an input's owning address
    #[error("Signing key missing for input address {address}")]
    SigningKeyMissing { address: String },

    /// The external signer failed
    #[error("Signing error: {0}")]
    Signing(String),

    /// Serialized transaction exceeds the relay size guard
    #[error("Transaction too large: {length} hex characters (maximum is {max})")]
    TransactionTooLarge { length: usize, max: usize },

    /// The relay answered but did not accept the transaction
    #[error("Submission rejected: {0}")]
    SubmissionRejected(String),

    /// Network or transport failure talking to an external service
    #[error("Network error: {context}")]
    Network {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A spend worker stopped without delivering a result
    #[error("Spend worker failed: {0}")]
    Worker(String),
}

/// Type alias for a Result with SpendError
pub type SpendResult<T> = Result<T, SpendError>;

/// Error category for logging purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Caller misuse, detected before any I/O
    Validation,
    /// Key resolution or signing failures
    Signing,
    /// Relay refused or size guard tripped
    Submission,
    /// Transport and data-source failures
    Network,
    /// Configuration errors
    Config,
    /// Failures of the spend machinery itself
    Internal,
}

impl ErrorCategory {
    /// Convert the error category to a string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Validation => "Validation",
            ErrorCategory::Signing => "Signing",
            ErrorCategory::Submission => "Submission",
            ErrorCategory::Network => "Network",
            ErrorCategory::Config => "Config",
            ErrorCategory::Internal => "Internal",
        }
    }
}

impl SpendError {
    /// Get the category of this error for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            SpendError::NoPayments
            | SpendError::InvalidAmount { .. }
            | SpendError::DustAmount { .. }
            | SpendError::DustChange { .. }
            | SpendError::NoChangeAddress { .. }
            | SpendError::InvalidAddress(_)
            | SpendError::AmountOverflow(_) => ErrorCategory::Validation,
            SpendError::SigningKeyMissing { .. } | SpendError::Signing(_) => ErrorCategory::Signing,
            SpendError::TransactionTooLarge { .. } | SpendError::SubmissionRejected(_) => {
                ErrorCategory::Submission
            }
            SpendError::InvalidRecord(_) | SpendError::Network { .. } => ErrorCategory::Network,
            SpendError::Config(_) => ErrorCategory::Config,
            SpendError::Worker(_) => ErrorCategory::Internal,
        }
    }

    /// True for errors that indicate caller misuse rather than wallet state
    pub fn is_validation(&self) -> bool {
        self.category() == ErrorCategory::Validation
    }

    /// Get a sanitized message suitable for displaying to users
    ///
    /// Signing failures never echo addresses or signer internals.
    pub fn user_message(&self) -> String {
        match self {
            SpendError::SigningKeyMissing { .. } | SpendError::Signing(_) => {
                "Unable to sign this transaction".to_string()
            }
            SpendError::Network { context, .. } => format!("Network error: {}", context),
            SpendError::SubmissionRejected(_) => "The transaction was not accepted".to_string(),
            other => other.to_string(),
        }
    }

    /// Create a network error with context
    pub fn network<S: Into<String>>(context: S) -> Self {
        SpendError::Network {
            context: context.into(),
            source: None,
        }
    }

    /// Create a network error with context and source
    pub fn network_with_source<S, E>(context: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        SpendError::Network {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl From<io::Error> for SpendError {
    fn from(err: io::Error) -> Self {
        SpendError::network_with_source(format!("I/O error: {}", err), err)
    }
}

impl From<serde_json::Error> for SpendError {
    fn from(err: serde_json::Error) -> Self {
        SpendError::InvalidRecord(format!("JSON error: {}", err))
    }
}

impl From<hex::FromHexError> for SpendError {
    fn from(err: hex::FromHexError) -> Self {
        SpendError::InvalidRecord(format!("Hex error: {}", err))
    }
}

impl From<bitcoin::address::Error> for SpendError {
    fn from(err: bitcoin::address::Error) -> Self {
        SpendError::InvalidAddress(format!("Bitcoin error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories() {
        assert!(SpendError::InvalidAmount { address: "a".into() }.is_validation());
        assert!(SpendError::NoPayments.is_validation());
        assert!(SpendError::NoChangeAddress { change: 1_000 }.is_validation());
        assert_eq!(
            SpendError::SigningKeyMissing { address: "a".into() }.category(),
            ErrorCategory::Signing
        );
        assert_eq!(
            SpendError::TransactionTooLarge { length: 2, max: 1 }.category(),
            ErrorCategory::Submission
        );
        assert_eq!(SpendError::network("down").category().as_str(), "Network");
    }

    #[test]
    fn user_message_hides_signing_details() {
        let err = SpendError::SigningKeyMissing {
            address: "1BoatSLRHtKNngkdXEeobR76b53LETtpyT".into(),
        };
        assert!(!err.user_message().contains("1Boat"));
        assert!(err.to_string().contains("1Boat"));
    }
}
