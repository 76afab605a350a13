//! Subscriptions: a filter plus a callback, owned by one client.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::client::{Client, Context};
use crate::datum::Datum;
use crate::error::BrokerResult;

/// Unique identifier for a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Create a new random subscription id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Callback invoked for every matching update: `(attribute name, datum, context)`.
pub type OnMessageFn = Arc<dyn Fn(&str, &Datum, &Context) -> BrokerResult<()> + Send + Sync>;

/// Stored form of a subscription inside its client's table.
#[derive(Clone)]
pub(crate) struct SubscriptionEntry {
    pub(crate) id: SubscriptionId,
    pub(crate) filter: String,
    pub(crate) callback: OnMessageFn,
}

/// Handle to a registered subscription.
#[derive(Clone)]
pub struct Subscription {
    id: SubscriptionId,
    filter: String,
    client: Client,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("filter", &self.filter)
            .field("client", &self.client.name())
            .finish()
    }
}

impl Subscription {
    pub(crate) fn new(id: SubscriptionId, filter: String, client: Client) -> Self {
        Self { id, filter, client }
    }

    /// Identity of this subscription.
    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Filter this subscription matches attribute names against.
    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Name of the owning client.
    #[must_use]
    pub fn client(&self) -> &str {
        self.client.name()
    }

    /// Removes the subscription from its client.
    ///
    /// A second cancel fails with `NotFound`. Fanouts already in flight may
    /// still deliver to it; later ones will not.
    pub fn cancel(&self) -> BrokerResult<()> {
        let id = self.id;
        self.client
            .subscriptions()
            .remove_if(self.filter.as_str(), |entry| entry.id == id)?;
        debug!(client = %self.client.name(), filter = %self.filter, "subscription canceled");
        Ok(())
    }
}
