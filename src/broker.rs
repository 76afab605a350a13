//! Broker: creation, publish, fanout and listing across every table.
//!
//! Every traversal that can reach user code works on a snapshot taken under
//! a short read lock. No lock is held while a callback runs, so callbacks may
//! publish, subscribe, cancel or create clients on the same broker.

use std::cell::Cell;
use std::fmt;
use std::sync::{Arc, OnceLock};

use tracing::{debug, trace, warn};

use crate::attribute::{AcceptFn, Attribute, AttributeEntry};
use crate::client::{Client, Context};
use crate::config::BrokerConfig;
use crate::datum::Datum;
use crate::definition::Definition;
use crate::error::{BrokerError, BrokerResult, RegistryKind, ValidationError};
use crate::keymatch::key_match;
use crate::registry::Registry;
use crate::report::SubscriptionReport;
use crate::source::Source;
use crate::timer::{ThreadTimerService, TimerId, TimerJob, TimerSchedule, TimerService};
use crate::value::{RawValue, Value};

thread_local! {
    static PUBLISH_DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Counts nested publishes on the current thread for as long as it lives.
struct DepthGuard;

impl DepthGuard {
    fn enter(limit: usize) -> BrokerResult<Self> {
        PUBLISH_DEPTH.with(|depth| {
            let current = depth.get();
            if current >= limit {
                return Err(BrokerError::DepthExceeded { limit });
            }
            depth.set(current + 1);
            Ok(Self)
        })
    }
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        PUBLISH_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

/// Client and attribute local names: non-empty, no segment separator, no wildcards.
fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if name.contains('.') {
        return Err(ValidationError::InvalidName {
            name: name.to_string(),
            reason: "must not contain '.'",
        });
    }
    if name.contains(['*', '>']) {
        return Err(ValidationError::InvalidName {
            name: name.to_string(),
            reason: "must not contain wildcard characters",
        });
    }
    Ok(())
}

pub(crate) struct BrokerShared {
    config: BrokerConfig,
    attributes: Registry<String, Arc<AttributeEntry>>,
    values: Registry<String, Datum>,
    clients: Registry<String, Client>,
    timers: OnceLock<Arc<dyn TimerService>>,
}

/// Root of all broker state.
///
/// Cloning is cheap and every clone addresses the same broker. Clients only
/// hold a weak reference back, so the broker's state is released once the
/// last `Broker` handle is dropped.
#[derive(Clone)]
pub struct Broker {
    shared: Arc<BrokerShared>,
}

impl fmt::Debug for Broker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Broker")
            .field("config", &self.shared.config)
            .field("clients", &self.shared.clients.len().ok())
            .field("attributes", &self.shared.attributes.len().ok())
            .field("values", &self.shared.values.len().ok())
            .finish()
    }
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

impl Broker {
    /// Create a broker with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(BrokerConfig::default())
    }

    /// Create a broker with `config`; the timer thread, if ever needed, uses its settings.
    #[must_use]
    pub fn with_config(config: BrokerConfig) -> Self {
        Self::build(config, OnceLock::new())
    }

    /// Create a broker that schedules client timers on `service` instead of
    /// spawning the default timer thread.
    #[must_use]
    pub fn with_timer_service(config: BrokerConfig, service: Arc<dyn TimerService>) -> Self {
        Self::build(config, OnceLock::from(service))
    }

    fn build(config: BrokerConfig, timers: OnceLock<Arc<dyn TimerService>>) -> Self {
        Self {
            shared: Arc::new(BrokerShared {
                config,
                attributes: Registry::new(RegistryKind::Attribute),
                values: Registry::new(RegistryKind::Attribute),
                clients: Registry::new(RegistryKind::Client),
                timers,
            }),
        }
    }

    pub(crate) const fn from_shared(shared: Arc<BrokerShared>) -> Self {
        Self { shared }
    }

    /// Settings this broker was built with.
    #[must_use]
    pub fn config(&self) -> &BrokerConfig {
        &self.shared.config
    }

    /// Registers a new client. Fails with `DuplicateName` if the name is taken.
    pub fn create_client(&self, name: &str) -> BrokerResult<Client> {
        validate_name(name)?;
        let client = Client::new(name.to_string(), Arc::downgrade(&self.shared));
        self.shared
            .clients
            .insert_unique(name.to_string(), client.clone())?;
        debug!(client = %name, "client created");
        Ok(client)
    }

    /// Looks up a registered client by name.
    pub fn client(&self, name: &str) -> BrokerResult<Client> {
        self.shared
            .clients
            .get(name)?
            .ok_or_else(|| BrokerError::not_found(RegistryKind::Client, name))
    }

    /// Removes a client, canceling its subscriptions and timers.
    ///
    /// Returns one report per canceled subscription. Attributes the client
    /// owns, and their values, are left in place. Handles to the removed
    /// client fail with `Detached` from then on.
    pub fn remove_client(&self, name: &str) -> BrokerResult<Vec<SubscriptionReport>> {
        let client = self.shared.clients.remove(name)?;
        client.detach();

        let reports: Vec<SubscriptionReport> = client
            .subscriptions()
            .drain()?
            .into_iter()
            .map(|entry| {
                SubscriptionReport::new(Source::subscription(name, &entry.filter, entry.id), None)
            })
            .collect();

        let timers = client.timers().drain()?;
        for id in &timers {
            self.cancel_timer(*id);
        }

        debug!(
            client = %name,
            subscriptions = reports.len(),
            timers = timers.len(),
            "client removed"
        );
        Ok(reports)
    }

    /// Every recorded datum whose name matches `filter`, in no particular order.
    ///
    /// Reads the value table only, so values of canceled attributes are included.
    pub fn list(&self, filter: &str) -> BrokerResult<Vec<Datum>> {
        self.shared
            .values
            .snapshot_where(|name, _| key_match(name, filter))
    }

    /// The datum recorded under an exact attribute name.
    pub fn value(&self, name: &str) -> BrokerResult<Option<Datum>> {
        self.shared.values.get(name)
    }

    pub(crate) fn create_attribute(
        &self,
        owner: &Client,
        local: &str,
        definition: Option<Arc<dyn Definition>>,
        accept: Vec<AcceptFn>,
    ) -> BrokerResult<(Attribute, Vec<SubscriptionReport>)> {
        validate_name(local)?;
        let name = format!("{}.{}", owner.name(), local);
        let initial = match &definition {
            Some(def) => def.transform(def.default_value())?,
            None => Value::Null,
        };
        let _depth = DepthGuard::enter(self.shared.config.max_publish_depth)?;

        let entry = Arc::new(AttributeEntry {
            name: name.clone(),
            owner: owner.name().to_string(),
            definition,
            accept,
        });
        self.shared.attributes.insert_unique(name, Arc::clone(&entry))?;
        debug!(
            client = %owner.name(),
            attribute = %entry.name,
            value = %initial,
            "attribute created"
        );

        let reports = self.record_and_fanout(&entry, initial, Source::client_named(owner.name()))?;
        Ok((Attribute::new(entry, owner.clone()), reports))
    }

    pub(crate) fn publish(
        &self,
        source: Source,
        name: &str,
        raw: RawValue,
    ) -> BrokerResult<Vec<SubscriptionReport>> {
        let _depth = DepthGuard::enter(self.shared.config.max_publish_depth).inspect_err(|_| {
            warn!(source = %source, attribute = %name, "publish refused: nesting too deep");
        })?;

        let entry = self
            .shared
            .attributes
            .get(name)?
            .ok_or_else(|| BrokerError::not_found(RegistryKind::Attribute, name))?;
        let value = transform(&entry, raw)?;

        if let Some(def) = &entry.definition {
            def.accept(&value).map_err(|reason| {
                warn!(source = %source, attribute = %name, %reason, "definition rejected value");
                BrokerError::AcceptRejected {
                    attribute: name.to_string(),
                    reason,
                }
            })?;
        }
        for accept in &entry.accept {
            accept(&source, &value).map_err(|error| {
                warn!(source = %source, attribute = %name, %error, "accept callback rejected value");
                BrokerError::AcceptRejected {
                    attribute: name.to_string(),
                    reason: error.to_string(),
                }
            })?;
        }

        debug!(source = %source, attribute = %name, value = %value, "publish");
        self.record_and_fanout(&entry, value, source)
    }

    pub(crate) fn update_attribute(
        &self,
        owner: &Client,
        entry: &Arc<AttributeEntry>,
        raw: RawValue,
    ) -> BrokerResult<Vec<SubscriptionReport>> {
        let _depth = DepthGuard::enter(self.shared.config.max_publish_depth)?;

        let registered = self
            .shared
            .attributes
            .get(entry.name.as_str())?
            .is_some_and(|current| Arc::ptr_eq(&current, entry));
        if !registered {
            return Err(BrokerError::not_found(RegistryKind::Attribute, entry.name.as_str()));
        }

        let value = transform(entry, raw)?;
        debug!(client = %owner.name(), attribute = %entry.name, value = %value, "self-update");
        self.record_and_fanout(entry, value, Source::client_named(owner.name()))
    }

    pub(crate) fn cancel_attribute(&self, entry: &Arc<AttributeEntry>) -> BrokerResult<()> {
        self.shared
            .attributes
            .remove_if(entry.name.as_str(), |current| Arc::ptr_eq(current, entry))?;
        debug!(client = %entry.owner, attribute = %entry.name, "attribute canceled");
        Ok(())
    }

    pub(crate) fn schedule_timer(
        &self,
        id: TimerId,
        schedule: TimerSchedule,
        job: TimerJob,
    ) -> BrokerResult<()> {
        self.timer_service()?.schedule(id, schedule, job)
    }

    pub(crate) fn cancel_timer(&self, id: TimerId) {
        if let Some(service) = self.shared.timers.get() {
            if !service.cancel(id) {
                warn!(timer = %id, "timer service did not take the cancel request");
            }
        }
    }

    fn timer_service(&self) -> BrokerResult<Arc<dyn TimerService>> {
        if let Some(service) = self.shared.timers.get() {
            return Ok(Arc::clone(service));
        }
        let spawned: Arc<dyn TimerService> = Arc::new(ThreadTimerService::spawn(&self.shared.config)?);
        Ok(Arc::clone(self.shared.timers.get_or_init(|| spawned)))
    }

    fn record_and_fanout(
        &self,
        entry: &AttributeEntry,
        value: Value,
        source: Source,
    ) -> BrokerResult<Vec<SubscriptionReport>> {
        let datum = Datum::new(
            entry.owner.as_str(),
            entry.name.as_str(),
            entry.definition.clone(),
            value,
            source,
        );
        self.shared.values.upsert(entry.name.clone(), datum.clone())?;
        self.fanout(entry, &datum)
    }

    fn fanout(&self, entry: &AttributeEntry, datum: &Datum) -> BrokerResult<Vec<SubscriptionReport>> {
        // Snapshot every matching subscription before the first callback runs.
        let mut targets = Vec::new();
        for client in self.shared.clients.snapshot()? {
            if client.name() == entry.owner || client.is_detached() {
                continue;
            }
            for sub in client.subscriptions().snapshot()? {
                if key_match(&entry.name, &sub.filter) {
                    targets.push((client.clone(), sub));
                }
            }
        }

        let mut reports = Vec::with_capacity(targets.len());
        for (client, sub) in targets {
            let source = Source::subscription(client.name(), sub.filter.as_str(), sub.id);
            let ctx = Context::new(source.clone(), client);
            let error = (sub.callback)(&entry.name, datum, &ctx).err();

            match &error {
                Some(error) => {
                    warn!(source = %source, attribute = %entry.name, %error, "subscription callback failed");
                }
                None => trace!(source = %source, attribute = %entry.name, "delivered"),
            }
            reports.push(SubscriptionReport::new(source, error));
        }

        debug!(attribute = %entry.name, reports = reports.len(), "fanout complete");
        Ok(reports)
    }
}

fn transform(entry: &AttributeEntry, raw: RawValue) -> BrokerResult<Value> {
    match &entry.definition {
        Some(def) => Ok(def.transform(raw)?),
        None => Ok(raw.into_value()),
    }
}
