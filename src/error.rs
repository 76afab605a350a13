//! Error types for attrbus.
//!
//! All errors are strongly typed using thiserror. Creation and publish fail
//! fast with these values; errors raised by subscription callbacks during a
//! fanout are never returned here but captured per subscriber in a
//! [`SubscriptionReport`](crate::SubscriptionReport).

use std::fmt;

use thiserror::Error;

use crate::value::Value;

/// The registry a naming error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryKind {
    /// The broker-wide client table.
    Client,
    /// The broker-wide attribute table.
    Attribute,
    /// A single client's subscription table.
    Subscription,
    /// A single client's timer table.
    Timer,
}

impl fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Client => "client",
            Self::Attribute => "attribute",
            Self::Subscription => "subscription",
            Self::Timer => "timer",
        };
        f.write_str(name)
    }
}

/// Rejections raised while coercing a raw value into its canonical form.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("unknown type: {definition} definition cannot accept a {actual} value")]
    UnknownType {
        definition: &'static str,
        actual: &'static str,
    },

    #[error("value {value} is below minimum {min}")]
    BelowMinimum {
        value: Value,
        min: Value,
    },

    #[error("value {value} is above maximum {max}")]
    AboveMaximum {
        value: Value,
        max: Value,
    },

    #[error("value {value} is not a finite number")]
    NotFinite {
        value: f64,
    },

    #[error("value {value} does not fit in a 64-bit signed integer")]
    IntegerOverflow {
        value: u64,
    },

    #[error("cannot parse {input:?} as {definition}")]
    Unparseable {
        definition: &'static str,
        input: String,
    },

    #[error("Name cannot be empty")]
    EmptyName,

    #[error("Invalid name '{name}': {reason}")]
    InvalidName {
        name: String,
        reason: &'static str,
    },

    #[error("Timer interval must be greater than zero")]
    ZeroInterval,
}

/// Top-level error type for broker operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BrokerError {
    #[error("duplicate {kind}: {name}")]
    DuplicateName {
        kind: RegistryKind,
        name: String,
    },

    #[error("{kind} not found: {name}")]
    NotFound {
        kind: RegistryKind,
        name: String,
    },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Attribute '{attribute}' rejected the value: {reason}")]
    AcceptRejected {
        attribute: String,
        reason: String,
    },

    #[error("mismatched definition: expected {expected}, datum was recorded as {actual}")]
    MismatchedDefinition {
        expected: &'static str,
        actual: String,
    },

    #[error("Client '{client}' is detached from its broker")]
    Detached {
        client: String,
    },

    #[error("Nested publish depth exceeded the limit of {limit}")]
    DepthExceeded {
        limit: usize,
    },

    #[error("Callback failed: {message}")]
    Callback {
        message: String,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
    },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl BrokerError {
    /// Creates a duplicate-name error.
    #[must_use]
    pub fn duplicate(kind: RegistryKind, name: impl Into<String>) -> Self {
        Self::DuplicateName {
            kind,
            name: name.into(),
        }
    }

    /// Creates a not-found error.
    #[must_use]
    pub fn not_found(kind: RegistryKind, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    /// Creates an error for a callback to return.
    #[must_use]
    pub fn callback(message: impl Into<String>) -> Self {
        Self::Callback {
            message: message.into(),
        }
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a name collision.
    #[must_use]
    pub const fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateName { .. })
    }

    /// Returns true if the named client, attribute, subscription or timer does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if a definition rejected the value.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if an accept callback vetoed the value.
    #[must_use]
    pub const fn is_accept_rejected(&self) -> bool {
        matches!(self, Self::AcceptRejected { .. })
    }
}

/// Result type alias for broker operations.
pub type BrokerResult<T> = Result<T, BrokerError>;
