//! Clients and the access context handed to callbacks.
//!
//! A client is a namespace: it owns a name, a subscription table, a timer
//! table, and every attribute created as `<client>.<name>`. Clients reach the
//! broker through a weak reference, so dropping the broker (or removing the
//! client from it) leaves outstanding handles detached rather than leaked.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::attribute::{AcceptFn, Attribute, AttributeBuilder};
use crate::broker::{Broker, BrokerShared};
use crate::datum::Datum;
use crate::definition::Definition;
use crate::error::{BrokerError, BrokerResult, RegistryKind, ValidationError};
use crate::registry::Registry;
use crate::report::SubscriptionReport;
use crate::source::Source;
use crate::subscription::{Subscription, SubscriptionEntry, SubscriptionId};
use crate::timer::{TimerId, TimerSchedule};
use crate::value::RawValue;

/// Callback run when a timer fires.
pub type OnTimerFn = Arc<dyn Fn(&Context) -> BrokerResult<()> + Send + Sync>;

pub(crate) struct ClientInner {
    name: String,
    broker: Weak<BrokerShared>,
    subscriptions: Registry<String, SubscriptionEntry>,
    timers: Registry<TimerId, TimerId>,
    detached: AtomicBool,
}

/// A named participant on the broker.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("name", &self.inner.name)
            .field("detached", &self.is_detached())
            .finish()
    }
}

impl Client {
    pub(crate) fn new(name: String, broker: Weak<BrokerShared>) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                name,
                broker,
                subscriptions: Registry::new(RegistryKind::Subscription),
                timers: Registry::new(RegistryKind::Timer),
                detached: AtomicBool::new(false),
            }),
        }
    }

    /// Unique name of this client; prefix of every attribute it owns.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Returns true once the client was removed or its broker dropped.
    #[must_use]
    pub fn is_detached(&self) -> bool {
        self.inner.detached.load(Ordering::Acquire) || self.inner.broker.strong_count() == 0
    }

    /// The broker this client belongs to.
    pub fn broker(&self) -> BrokerResult<Broker> {
        let detached = || BrokerError::Detached {
            client: self.inner.name.clone(),
        };
        if self.inner.detached.load(Ordering::Acquire) {
            return Err(detached());
        }
        self.inner
            .broker
            .upgrade()
            .map(Broker::from_shared)
            .ok_or_else(detached)
    }

    pub(crate) fn subscriptions(&self) -> &Registry<String, SubscriptionEntry> {
        &self.inner.subscriptions
    }

    pub(crate) fn timers(&self) -> &Registry<TimerId, TimerId> {
        &self.inner.timers
    }

    pub(crate) fn detach(&self) {
        self.inner.detached.store(true, Ordering::Release);
    }

    /// Registers `<client>.<name>` and announces its default value.
    ///
    /// Returns the attribute handle plus the reports of the initial fanout.
    pub fn create_attribute(
        &self,
        name: &str,
        definition: Option<Arc<dyn Definition>>,
        accept_fns: Vec<AcceptFn>,
    ) -> BrokerResult<(Attribute, Vec<SubscriptionReport>)> {
        self.broker()?.create_attribute(self, name, definition, accept_fns)
    }

    /// Starts a builder for `<client>.<name>`.
    #[must_use]
    pub fn attribute(&self, name: impl Into<String>) -> AttributeBuilder {
        AttributeBuilder::new(self.clone(), name.into())
    }

    /// Publishes to a fully qualified attribute name owned by any client.
    pub fn publish(&self, name: &str, value: impl Into<RawValue>) -> BrokerResult<Vec<SubscriptionReport>> {
        self.broker()?
            .publish(Source::client_named(self.name()), name, value.into())
    }

    /// Subscribes to every attribute whose name matches `filter`.
    ///
    /// Filters are unique per client; a second subscription on the same
    /// filter string fails with `DuplicateName`.
    pub fn subscribe<F>(&self, filter: &str, callback: F) -> BrokerResult<Subscription>
    where
        F: Fn(&str, &Datum, &Context) -> BrokerResult<()> + Send + Sync + 'static,
    {
        self.broker()?;
        let entry = SubscriptionEntry {
            id: SubscriptionId::new(),
            filter: filter.to_string(),
            callback: Arc::new(callback),
        };
        let id = entry.id;
        self.inner.subscriptions.insert_unique(filter.to_string(), entry)?;
        debug!(client = %self.name(), filter = %filter, "subscription created");
        Ok(Subscription::new(id, filter.to_string(), self.clone()))
    }

    /// Runs `callback` once at `at` (immediately if `at` has passed).
    pub fn schedule_at<F>(&self, at: DateTime<Utc>, callback: F) -> BrokerResult<TimerId>
    where
        F: Fn(&Context) -> BrokerResult<()> + Send + Sync + 'static,
    {
        self.schedule(TimerSchedule::At(at), Arc::new(callback))
    }

    /// Runs `callback` every `interval` until canceled.
    pub fn schedule_every<F>(&self, interval: Duration, callback: F) -> BrokerResult<TimerId>
    where
        F: Fn(&Context) -> BrokerResult<()> + Send + Sync + 'static,
    {
        if interval.is_zero() {
            return Err(ValidationError::ZeroInterval.into());
        }
        self.schedule(TimerSchedule::Every(interval), Arc::new(callback))
    }

    /// Cancels an outstanding timer owned by this client.
    pub fn cancel_timer(&self, id: TimerId) -> BrokerResult<()> {
        self.inner.timers.remove(&id)?;
        if let Ok(broker) = self.broker() {
            broker.cancel_timer(id);
        }
        debug!(client = %self.name(), timer = %id, "timer canceled");
        Ok(())
    }

    fn schedule(&self, schedule: TimerSchedule, callback: OnTimerFn) -> BrokerResult<TimerId> {
        let broker = self.broker()?;
        let id = TimerId::new();
        self.inner.timers.insert_unique(id, id)?;

        let one_shot = matches!(schedule, TimerSchedule::At(_));
        let weak = Arc::downgrade(&self.inner);
        let job = Box::new(move || {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let client = Client { inner };
            let live = if one_shot {
                client.inner.timers.remove(&id).is_ok()
            } else {
                matches!(client.inner.timers.get(&id), Ok(Some(_)))
            };
            if !live || client.is_detached() {
                return;
            }

            debug!(client = %client.name(), timer = %id, "timer fired");
            let ctx = Context::new(Source::timer(client.name(), id), client.clone());
            if let Err(error) = callback(&ctx) {
                warn!(client = %client.name(), timer = %id, %error, "timer callback failed");
            }
        });

        if let Err(error) = broker.schedule_timer(id, schedule, job) {
            let _ = self.inner.timers.remove(&id);
            return Err(error);
        }
        debug!(client = %self.name(), timer = %id, ?schedule, "timer scheduled");
        Ok(id)
    }
}

/// Access context handed to subscription and timer callbacks.
///
/// Anything published through a context is attributed to the context's
/// source (`owner[filter]` for a subscription, `owner[timer:id]` for a
/// timer) rather than to the original publisher.
#[derive(Clone)]
pub struct Context {
    source: Source,
    client: Client,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("source", &self.source)
            .finish()
    }
}

impl Context {
    pub(crate) fn new(source: Source, client: Client) -> Self {
        Self { source, client }
    }

    /// Identity any publish from this context is attributed to.
    #[must_use]
    pub const fn source(&self) -> &Source {
        &self.source
    }

    /// The real client behind this context, for subscribing or canceling.
    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }

    /// Publishes to a fully qualified attribute name, attributed to this context's source.
    pub fn publish(&self, name: &str, value: impl Into<RawValue>) -> BrokerResult<Vec<SubscriptionReport>> {
        self.client
            .broker()?
            .publish(self.source.clone(), name, value.into())
    }

    /// Same as [`Broker::list`].
    pub fn list(&self, filter: &str) -> BrokerResult<Vec<Datum>> {
        self.client.broker()?.list(filter)
    }

    /// Schedules a one-shot timer owned by the context's client.
    pub fn schedule_at<F>(&self, at: DateTime<Utc>, callback: F) -> BrokerResult<TimerId>
    where
        F: Fn(&Context) -> BrokerResult<()> + Send + Sync + 'static,
    {
        self.client.schedule_at(at, callback)
    }

    /// Schedules a repeating timer owned by the context's client.
    pub fn schedule_every<F>(&self, interval: Duration, callback: F) -> BrokerResult<TimerId>
    where
        F: Fn(&Context) -> BrokerResult<()> + Send + Sync + 'static,
    {
        self.client.schedule_every(interval, callback)
    }
}
