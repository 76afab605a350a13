//! Attributes: named, owned, optionally validated value slots.

use std::fmt;
use std::sync::Arc;

use crate::client::Client;
use crate::datum::Datum;
use crate::definition::Definition;
use crate::error::BrokerResult;
use crate::report::SubscriptionReport;
use crate::source::Source;
use crate::value::{RawValue, Value};

/// Veto callback run on every external publish, after the definition
/// accepted the value. Returning an error refuses the publish.
pub type AcceptFn = Arc<dyn Fn(&Source, &Value) -> BrokerResult<()> + Send + Sync>;

/// Registered form of an attribute in the broker's attribute table.
pub(crate) struct AttributeEntry {
    pub(crate) name: String,
    pub(crate) owner: String,
    pub(crate) definition: Option<Arc<dyn Definition>>,
    pub(crate) accept: Vec<AcceptFn>,
}

impl fmt::Debug for AttributeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeEntry")
            .field("name", &self.name)
            .field("owner", &self.owner)
            .field("definition", &self.definition)
            .field("accept", &self.accept.len())
            .finish()
    }
}

/// Handle held by the owning client.
#[derive(Clone)]
pub struct Attribute {
    entry: Arc<AttributeEntry>,
    owner: Client,
}

impl fmt::Debug for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.entry.name)
            .field("owner", &self.entry.owner)
            .finish()
    }
}

impl Attribute {
    pub(crate) fn new(entry: Arc<AttributeEntry>, owner: Client) -> Self {
        Self { entry, owner }
    }

    /// Fully qualified name, `<owner>.<local>`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.entry.name
    }

    /// Name of the owning client.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.entry.owner
    }

    /// Definition values are validated against, if any.
    #[must_use]
    pub fn definition(&self) -> Option<&dyn Definition> {
        self.entry.definition.as_deref()
    }

    /// Last recorded datum under this attribute's name.
    pub fn value(&self) -> BrokerResult<Option<Datum>> {
        self.owner.broker()?.value(&self.entry.name)
    }

    /// Owner-side update: validated by the definition, not by accept callbacks.
    ///
    /// Fails with `NotFound` once the attribute has been canceled.
    pub fn update(&self, value: impl Into<RawValue>) -> BrokerResult<Vec<SubscriptionReport>> {
        self.owner
            .broker()?
            .update_attribute(&self.owner, &self.entry, value.into())
    }

    /// Removes the attribute from the broker. Its last datum stays listable.
    ///
    /// A second cancel fails with `NotFound`, as does canceling a handle whose
    /// name has since been re-created by a newer attribute.
    pub fn cancel(&self) -> BrokerResult<()> {
        self.owner.broker()?.cancel_attribute(&self.entry)
    }
}

/// Builder returned by [`Client::attribute`].
#[must_use]
pub struct AttributeBuilder {
    client: Client,
    name: String,
    definition: Option<Arc<dyn Definition>>,
    accept: Vec<AcceptFn>,
}

impl fmt::Debug for AttributeBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeBuilder")
            .field("client", &self.client.name())
            .field("name", &self.name)
            .field("definition", &self.definition)
            .finish_non_exhaustive()
    }
}

impl AttributeBuilder {
    pub(crate) fn new(client: Client, name: String) -> Self {
        Self {
            client,
            name,
            definition: None,
            accept: Vec::new(),
        }
    }

    /// Validates every value through `definition`.
    pub fn definition(mut self, definition: impl Definition) -> Self {
        self.definition = Some(Arc::new(definition));
        self
    }

    /// Appends an accept callback; callbacks run in the order added.
    pub fn on_accept<F>(mut self, accept: F) -> Self
    where
        F: Fn(&Source, &Value) -> BrokerResult<()> + Send + Sync + 'static,
    {
        self.accept.push(Arc::new(accept));
        self
    }

    /// Registers the attribute; see [`Client::create_attribute`].
    pub fn create(self) -> BrokerResult<(Attribute, Vec<SubscriptionReport>)> {
        self.client
            .create_attribute(&self.name, self.definition, self.accept)
    }
}
