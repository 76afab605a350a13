//! Source attribution for recorded values.
//!
//! Every update records who triggered it. A value can come from a client
//! acting directly, from a subscription callback republishing during a
//! fanout, or from a scheduled timer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::subscription::SubscriptionId;
use crate::timer::TimerId;

/// Who triggered an update.
///
/// The `Display` form is the stable identity shown in logs and reports:
/// `owner` for a client, `owner[filter]` for a subscription, and
/// `owner[timer:<id>]` for a timer.
///
/// # Examples
///
/// ```
/// use attrbus::{Source, SubscriptionId};
///
/// let source = Source::subscription("hall", "kitchen.>", SubscriptionId::new());
/// assert_eq!(source.client(), "hall");
/// assert_eq!(source.to_string(), "hall[kitchen.>]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Source {
    /// A client acting on its own behalf: a publish or a self-update.
    Client {
        client: String,
    },

    /// A subscription callback acting from inside a fanout.
    Subscription {
        client: String,
        filter: String,
        subscription_id: SubscriptionId,
    },

    /// A scheduled timer owned by a client.
    Timer {
        client: String,
        timer_id: TimerId,
    },
}

impl Source {
    /// Creates a client source.
    #[must_use]
    pub fn client_named(client: impl Into<String>) -> Self {
        Self::Client {
            client: client.into(),
        }
    }

    /// Creates a subscription source.
    #[must_use]
    pub fn subscription(
        client: impl Into<String>,
        filter: impl Into<String>,
        subscription_id: SubscriptionId,
    ) -> Self {
        Self::Subscription {
            client: client.into(),
            filter: filter.into(),
            subscription_id,
        }
    }

    /// Creates a timer source.
    #[must_use]
    pub fn timer(client: impl Into<String>, timer_id: TimerId) -> Self {
        Self::Timer {
            client: client.into(),
            timer_id,
        }
    }

    /// Name of the originating client.
    #[must_use]
    pub fn client(&self) -> &str {
        match self {
            Self::Client { client }
            | Self::Subscription { client, .. }
            | Self::Timer { client, .. } => client,
        }
    }

    /// Returns true if the update came from a subscription callback.
    #[must_use]
    pub const fn is_subscription(&self) -> bool {
        matches!(self, Self::Subscription { .. })
    }

    /// Returns true if the update came from a timer.
    #[must_use]
    pub const fn is_timer(&self) -> bool {
        matches!(self, Self::Timer { .. })
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client { client } => write!(f, "{client}"),
            Self::Subscription { client, filter, .. } => write!(f, "{client}[{filter}]"),
            Self::Timer { client, timer_id } => write!(f, "{client}[timer:{timer_id}]"),
        }
    }
}
