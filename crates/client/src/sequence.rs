//! Last-issued-wins ordering for concurrent fetches of the same resource.
//!
//! Every fetch draws a [`Ticket`] before it is sent. When its response arrives the ticket is
//! offered back: it is accepted only if no ticket issued later for the same resource has
//! already been accepted. A slow earlier response therefore never overwrites a newer one.

use std::collections::HashMap;
use std::sync::Mutex;

use telemed_core::Resource;

/// Outcome of a sequenced fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Fresh(T),
    /// A later request for the same resource already delivered its result.
    Stale,
}

impl<T> Fetched<T> {
    pub fn fresh(self) -> Option<T> {
        match self {
            Fetched::Fresh(value) => Some(value),
            Fetched::Stale => None,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Fetched::Stale)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub resource: Resource,
    pub seq: u64,
}

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    issued: u64,
    accepted: u64,
}

#[derive(Debug, Default)]
pub struct RequestSequencer {
    counters: Mutex<HashMap<Resource, Counters>>,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self, resource: Resource) -> Ticket {
        let mut counters = self
            .counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let entry = counters.entry(resource).or_default();
        entry.issued += 1;
        Ticket {
            resource,
            seq: entry.issued,
        }
    }

    /// True if the ticket's response should be kept.
    pub fn accept(&self, ticket: Ticket) -> bool {
        let mut counters = self
            .counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let entry = counters.entry(ticket.resource).or_default();
        if ticket.seq > entry.accepted {
            entry.accepted = ticket.seq;
            true
        } else {
            false
        }
    }

    /// Marks every ticket issued so far for `resource` as stale. Tickets issued afterwards are
    /// accepted as usual.
    pub fn supersede(&self, resource: Resource) {
        let mut counters = self
            .counters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let entry = counters.entry(resource).or_default();
        entry.issued += 1;
        entry.accepted = entry.issued;
    }

    /// Wraps `value` according to [`RequestSequencer::accept`].
    pub fn settle<T>(&self, ticket: Ticket, value: T) -> Fetched<T> {
        if self.accept(ticket) {
            Fetched::Fresh(value)
        } else {
            tracing::warn!(
                resource = %ticket.resource,
                seq = ticket.seq,
                "discarding stale response"
            );
            Fetched::Stale
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_order_responses_are_all_fresh() {
        let seq = RequestSequencer::new();
        let a = seq.issue(Resource::Appointments);
        assert!(seq.accept(a));
        let b = seq.issue(Resource::Appointments);
        assert!(seq.accept(b));
    }

    #[test]
    fn test_slow_earlier_response_is_stale() {
        let seq = RequestSequencer::new();
        let first = seq.issue(Resource::Appointments);
        let second = seq.issue(Resource::Appointments);
        assert_eq!(seq.settle(second, "new"), Fetched::Fresh("new"));
        assert_eq!(seq.settle(first, "old"), Fetched::Stale);
    }

    #[test]
    fn test_resources_are_sequenced_independently() {
        let seq = RequestSequencer::new();
        let appointments = seq.issue(Resource::Appointments);
        let reminders = seq.issue(Resource::Reminders);
        let later = seq.issue(Resource::Appointments);
        assert!(seq.accept(later));
        assert!(seq.accept(reminders));
        assert!(!seq.accept(appointments));
    }

    #[test]
    fn test_supersede_stales_tickets_in_flight() {
        let seq = RequestSequencer::new();
        let in_flight = seq.issue(Resource::Records);
        seq.supersede(Resource::Records);
        assert_eq!(seq.settle(in_flight, "before"), Fetched::Stale);

        let next = seq.issue(Resource::Records);
        assert_eq!(seq.settle(next, "after"), Fetched::Fresh("after"));
        let other = seq.issue(Resource::Users);
        assert!(seq.accept(other));
    }

    #[test]
    fn test_ticket_is_accepted_once() {
        let seq = RequestSequencer::new();
        let t = seq.issue(Resource::Users);
        assert!(seq.accept(t));
        assert!(!seq.accept(t));
    }
}
