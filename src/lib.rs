//! # attrbus - In-process attribute broker
//!
//! attrbus keeps a set of named, typed values ("attributes") owned by named
//! clients, and pushes every change to the other clients whose subscription
//! filters match the attribute's name.
//!
//! ## Core Concepts
//!
//! - **Client**: a namespace; attributes it creates are named `<client>.<name>`
//! - **Attribute**: a value slot, optionally guarded by a [`Definition`] and accept callbacks
//! - **Datum**: the last recorded value for a name, kept after the attribute is canceled
//! - **Subscription**: a dot-segmented filter (`*` one segment, `>` the rest) plus a callback
//! - **SubscriptionReport**: the outcome of one delivery during a fanout
//!
//! A client never receives fanout for attributes it owns. Fanout is
//! synchronous: `publish` returns once every matching callback has run.
//!
//! ## Usage
//!
//! ```rust
//! use attrbus::{Broker, IntegerDefinition, Value};
//!
//! let broker = Broker::new();
//! let thermostat = broker.create_client("thermostat")?;
//! let display = broker.create_client("display")?;
//!
//! display.subscribe("thermostat.>", |name, datum, _ctx| {
//!     println!("{name} = {}", datum.value());
//!     Ok(())
//! })?;
//!
//! let (temp, reports) = thermostat
//!     .attribute("temp")
//!     .definition(IntegerDefinition::bounded(-40, 60, 20))
//!     .create()?;
//! assert_eq!(reports.len(), 1);
//!
//! temp.update(21)?;
//! assert_eq!(temp.value()?.map(|d| d.value().clone()), Some(Value::Int(21)));
//! # Ok::<(), attrbus::BrokerError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod attribute;
pub mod broker;
pub mod client;
pub mod config;
pub mod datum;
pub mod definition;
pub mod error;
pub mod keymatch;
mod registry;
pub mod report;
pub mod source;
pub mod subscription;
pub mod timer;
pub mod value;

pub use attribute::{AcceptFn, Attribute, AttributeBuilder};
pub use broker::Broker;
pub use client::{Client, Context, OnTimerFn};
pub use config::BrokerConfig;
pub use datum::Datum;
pub use definition::{BooleanDefinition, Definition, DoubleDefinition, IntegerDefinition, StringDefinition};
pub use error::{BrokerError, BrokerResult, RegistryKind, ValidationError};
pub use keymatch::key_match;
pub use report::SubscriptionReport;
pub use source::Source;
pub use subscription::{OnMessageFn, Subscription, SubscriptionId};
pub use timer::{ThreadTimerService, TimerId, TimerJob, TimerSchedule, TimerService};
pub use value::{RawValue, Value};
