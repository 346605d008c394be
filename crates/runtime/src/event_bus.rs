use std::collections::BTreeMap;

use tracing::debug;

/// Camera movement notification.
///
/// `amount` is the normalized magnitude of the change, when the source
/// measured one.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraChanged {
    pub frame_index: u64,
    pub amount: Option<f64>,
}

impl CameraChanged {
    pub fn new(frame_index: u64, amount: Option<f64>) -> Self {
        Self { frame_index, amount }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(u64);

/// Registration handle returned by [`EventBus::subscribe`].
///
/// Not `Clone`: [`EventBus::unsubscribe`] consumes it, so a subscription can be
/// released at most once.
#[derive(Debug, PartialEq, Eq)]
pub struct Subscription {
    id: SubscriberId,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }
}

/// Typed pull-based event bus.
///
/// Every subscriber owns a cursor into the event log; `poll` returns the events
/// published since that subscriber last polled. Events every subscriber has
/// seen are dropped.
#[derive(Debug)]
pub struct EventBus<E> {
    next_id: u64,
    /// Sequence number of `events[0]`.
    base_seq: u64,
    events: Vec<E>,
    cursors: BTreeMap<SubscriberId, u64>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self {
            next_id: 0,
            base_seq: 0,
            events: Vec::new(),
            cursors: BTreeMap::new(),
        }
    }
}

impl<E: Clone> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new subscriber. It only sees events published after this call.
    ///
    /// Events are retained until every live subscriber has polled past them, so a
    /// subscription that is never polled or unsubscribed pins the backlog.
    pub fn subscribe(&mut self) -> Subscription {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;
        self.cursors.insert(id, self.end_seq());
        debug!(subscriber = id.0, "event bus subscribe");
        Subscription { id }
    }

    pub fn unsubscribe(&mut self, subscription: Subscription) {
        if self.cursors.remove(&subscription.id).is_some() {
            debug!(subscriber = subscription.id.0, "event bus unsubscribe");
        }
        self.compact();
    }

    pub fn is_subscribed(&self, subscription: &Subscription) -> bool {
        self.cursors.contains_key(&subscription.id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.cursors.len()
    }

    /// Appends an event. With no subscribers the event is discarded.
    pub fn publish(&mut self, event: E) {
        if self.cursors.is_empty() {
            self.base_seq += 1;
            return;
        }
        self.events.push(event);
    }

    /// Returns the events this subscriber has not seen yet, oldest first.
    pub fn poll(&mut self, subscription: &Subscription) -> Vec<E> {
        let end = self.end_seq();
        let Some(cursor) = self.cursors.get_mut(&subscription.id) else {
            return Vec::new();
        };
        let start = (*cursor - self.base_seq) as usize;
        *cursor = end;
        let out = self.events[start..].to_vec();
        self.compact();
        out
    }

    /// Number of retained events, across all subscribers.
    pub fn pending_len(&self) -> usize {
        self.events.len()
    }

    fn end_seq(&self) -> u64 {
        self.base_seq + self.events.len() as u64
    }

    fn compact(&mut self) {
        let Some(min_cursor) = self.cursors.values().copied().min() else {
            self.base_seq = self.end_seq();
            self.events.clear();
            return;
        };
        let consumed = (min_cursor - self.base_seq) as usize;
        if consumed > 0 {
            self.events.drain(..consumed);
            self.base_seq = min_cursor;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CameraChanged, EventBus};

    #[test]
    fn subscribers_only_see_later_events() {
        let mut bus = EventBus::new();
        bus.publish(CameraChanged::new(0, Some(1.0)));
        let sub = bus.subscribe();
        bus.publish(CameraChanged::new(1, None));

        let got = bus.poll(&sub);
        assert_eq!(got, vec![CameraChanged::new(1, None)]);
        assert!(bus.poll(&sub).is_empty());
    }

    #[test]
    fn events_are_retained_until_every_subscriber_polls() {
        let mut bus = EventBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();
        bus.publish(CameraChanged::new(3, Some(0.5)));
        bus.publish(CameraChanged::new(4, Some(0.7)));

        assert_eq!(bus.poll(&a).len(), 2);
        assert_eq!(bus.pending_len(), 2);
        bus.publish(CameraChanged::new(5, None));
        assert_eq!(bus.poll(&b).len(), 3);
        assert_eq!(bus.pending_len(), 1);
        assert_eq!(bus.poll(&a), vec![CameraChanged::new(5, None)]);
        assert_eq!(bus.pending_len(), 0);
    }

    #[test]
    fn unsubscribe_releases_retained_events() {
        let mut bus = EventBus::new();
        let a = bus.subscribe();
        bus.publish(CameraChanged::new(0, None));
        assert!(bus.is_subscribed(&a));

        bus.unsubscribe(a);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.pending_len(), 0);

        bus.publish(CameraChanged::new(1, None));
        assert_eq!(bus.pending_len(), 0);
    }
}
