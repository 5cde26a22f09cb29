//! Virtual-time Timer Scheduler
//!
//! Replaces ad-hoc repeating callbacks with an explicit timer table. Timers
//! are identified by [`Ticket`] handles that can be cancelled any number of
//! times. Time only moves when the owner calls [`Scheduler::pop_due`], so the
//! whole game loop stays deterministic and testable without a real clock.

use std::collections::BTreeMap;

/// Handle for a scheduled timer.
///
/// Tickets are never reused within one scheduler, so a stale ticket from a
/// previous run can be told apart from a live one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    /// Raw ticket number.
    pub fn id(&self) -> u64 {
        self.0
    }
}

#[derive(Clone, Debug)]
struct TimerEntry<K> {
    kind: K,
    due_ms: u64,
    /// `None` for one-shot timeouts.
    period_ms: Option<u64>,
}

/// A timer that came due.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fired<K> {
    /// Ticket of the timer that fired.
    pub ticket: Ticket,
    /// What the timer was scheduled for.
    pub kind: K,
    /// Scheduled firing time (not the time it was observed).
    pub at_ms: u64,
}

/// Timer table keyed by ticket.
#[derive(Clone, Debug)]
pub struct Scheduler<K> {
    next_ticket: u64,
    timers: BTreeMap<Ticket, TimerEntry<K>>,
}

impl<K> Default for Scheduler<K> {
    fn default() -> Self {
        Self {
            next_ticket: 1,
            timers: BTreeMap::new(),
        }
    }
}

impl<K: Clone> Scheduler<K> {
    /// Create an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    fn issue(&mut self) -> Ticket {
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        ticket
    }

    /// Fire `kind` every `period_ms`, first at `now_ms + period_ms`.
    ///
    /// A zero period is clamped to 1ms so an interval can never starve the loop.
    pub fn schedule_interval(&mut self, kind: K, period_ms: u64, now_ms: u64) -> Ticket {
        let period = period_ms.max(1);
        let ticket = self.issue();
        self.timers.insert(ticket, TimerEntry {
            kind,
            due_ms: now_ms + period,
            period_ms: Some(period),
        });
        ticket
    }

    /// Fire `kind` once at `now_ms + delay_ms`.
    pub fn schedule_timeout(&mut self, kind: K, delay_ms: u64, now_ms: u64) -> Ticket {
        let ticket = self.issue();
        self.timers.insert(ticket, TimerEntry {
            kind,
            due_ms: now_ms + delay_ms,
            period_ms: None,
        });
        ticket
    }

    /// Cancel a timer. Returns false if it was already gone.
    pub fn cancel(&mut self, ticket: Ticket) -> bool {
        self.timers.remove(&ticket).is_some()
    }

    /// Cancel an optional ticket, leaving `None` behind.
    pub fn cancel_slot(&mut self, slot: &mut Option<Ticket>) {
        if let Some(ticket) = slot.take() {
            self.cancel(ticket);
        }
    }

    /// Cancel every timer.
    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    /// Whether `ticket` is still scheduled.
    pub fn is_active(&self, ticket: Ticket) -> bool {
        self.timers.contains_key(&ticket)
    }

    /// Next due time of `ticket`.
    pub fn due_ms(&self, ticket: Ticket) -> Option<u64> {
        self.timers.get(&ticket).map(|t| t.due_ms)
    }

    /// Number of live timers.
    pub fn len(&self) -> usize {
        self.timers.len()
    }

    /// True if no timers are scheduled.
    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Live tickets in ascending order.
    pub fn tickets(&self) -> Vec<Ticket> {
        self.timers.keys().copied().collect()
    }

    /// Earliest due time, if any timer is scheduled.
    pub fn next_due_ms(&self) -> Option<u64> {
        self.timers.values().map(|t| t.due_ms).min()
    }

    /// Pop the earliest timer due at or before `until_ms`.
    ///
    /// Ties are broken by ticket order. Intervals are re-armed one period
    /// after their scheduled time, so a late caller catches up firing by
    /// firing instead of skipping.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<Fired<K>> {
        let (ticket, due_ms) = self.timers.iter()
            .filter(|(_, t)| t.due_ms <= until_ms)
            .map(|(ticket, t)| (*ticket, t.due_ms))
            .min_by_key(|(ticket, due)| (*due, *ticket))?;

        let entry = self.timers.get_mut(&ticket)?;
        let kind = entry.kind.clone();

        match entry.period_ms {
            Some(period) => entry.due_ms = due_ms + period,
            None => {
                self.timers.remove(&ticket);
            }
        }

        Some(Fired { ticket, kind, at_ms: due_ms })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq)]
    enum Kind {
        A,
        B,
    }

    fn drain(s: &mut Scheduler<Kind>, until: u64) -> Vec<Fired<Kind>> {
        std::iter::from_fn(|| s.pop_due(until)).collect()
    }

    #[test]
    fn test_interval_fires_each_period() {
        let mut s = Scheduler::new();
        let t = s.schedule_interval(Kind::A, 50, 0);

        let fired = drain(&mut s, 160);
        let times: Vec<u64> = fired.iter().map(|f| f.at_ms).collect();
        assert_eq!(times, vec![50, 100, 150]);
        assert!(fired.iter().all(|f| f.ticket == t));
        assert!(s.is_active(t));
    }

    #[test]
    fn test_timeout_fires_once() {
        let mut s = Scheduler::new();
        let t = s.schedule_timeout(Kind::B, 100, 0);

        assert!(drain(&mut s, 99).is_empty());
        let fired = drain(&mut s, 1000);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].at_ms, 100);
        assert!(!s.is_active(t));
    }

    #[test]
    fn test_fires_in_time_then_ticket_order() {
        let mut s = Scheduler::new();
        let a = s.schedule_interval(Kind::A, 20, 0);
        let b = s.schedule_interval(Kind::B, 50, 0);

        let fired = drain(&mut s, 60);
        let order: Vec<(u64, Ticket)> = fired.iter().map(|f| (f.at_ms, f.ticket)).collect();
        assert_eq!(order, vec![(20, a), (40, a), (50, b), (60, a)]);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut s = Scheduler::new();
        let t = s.schedule_interval(Kind::A, 10, 0);

        assert!(s.cancel(t));
        assert!(!s.cancel(t));
        assert!(!s.cancel(t));
        assert!(drain(&mut s, 1000).is_empty());
    }

    #[test]
    fn test_cancel_slot() {
        let mut s = Scheduler::new();
        let mut slot = Some(s.schedule_timeout(Kind::A, 10, 0));
        s.cancel_slot(&mut slot);
        assert!(slot.is_none());
        s.cancel_slot(&mut slot);
        assert!(s.is_empty());
    }

    #[test]
    fn test_tickets_never_reused() {
        let mut s = Scheduler::new();
        let first = s.schedule_interval(Kind::A, 10, 0);
        s.cancel_all();
        let second = s.schedule_interval(Kind::A, 10, 0);
        assert_ne!(first, second);
        assert!(second > first);
    }

    #[test]
    fn test_zero_period_clamped() {
        let mut s = Scheduler::new();
        s.schedule_interval(Kind::A, 0, 0);
        assert_eq!(drain(&mut s, 3).len(), 3);
    }

    #[test]
    fn test_next_due() {
        let mut s = Scheduler::new();
        assert_eq!(s.next_due_ms(), None);
        s.schedule_timeout(Kind::A, 70, 5);
        s.schedule_interval(Kind::B, 30, 10);
        assert_eq!(s.next_due_ms(), Some(40));
    }
}
