//! Per-subscriber outcome of a fanout.

use crate::error::BrokerError;
use crate::source::Source;

/// Outcome of delivering one update to one subscription.
///
/// A fanout produces one report per matching subscription, whether or not the
/// callback succeeded. Callback errors never fail the publish itself; callers
/// that care have to look at every report.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionReport {
    /// Derived identity of the subscription, `owner[filter]`.
    pub source: Source,
    /// Error returned by the callback, if any.
    pub error: Option<BrokerError>,
}

impl SubscriptionReport {
    /// Builds a report for one delivery.
    #[must_use]
    pub const fn new(source: Source, error: Option<BrokerError>) -> Self {
        Self { source, error }
    }

    /// Returns true if the callback accepted the update.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::SubscriptionId;

    #[test]
    fn test_report_outcome() {
        let source = Source::subscription("owner2", ">", SubscriptionId::new());
        let ok = SubscriptionReport::new(source.clone(), None);
        assert!(ok.is_ok());

        let failed = SubscriptionReport::new(source, Some(BrokerError::callback("offline")));
        assert!(!failed.is_ok());
        assert_eq!(failed.source.to_string(), "owner2[>]");
    }
}
