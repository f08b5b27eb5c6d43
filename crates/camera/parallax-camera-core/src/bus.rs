//! Synchronous publish/subscribe bus with a closed set of topics.
//!
//! Handlers run on the publishing thread. A publish issued from inside a
//! handler is queued and delivered after the current event finishes, so
//! delivery order is always publish order and handlers never reenter.
//!
//! A component that both publishes and subscribes registers a
//! [`PublisherId`]; events it publishes under that id skip its own handlers
//! but reach everyone else.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::error::CameraError;
use crate::pose::{Pose, PoseSource};
use crate::store::InteractionKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Topic {
    InteractionStart,
    InteractionEnd,
    PoseChanged,
    SystemError,
    SystemInitialized,
    SystemDisposed,
    SystemPaused,
    SystemResumed,
    MotionResumeRequested,
}

impl Topic {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InteractionStart => "input:interaction-start",
            Self::InteractionEnd => "input:interaction-end",
            Self::PoseChanged => "camera:pose-changed",
            Self::SystemError => "system:error",
            Self::SystemInitialized => "system:initialized",
            Self::SystemDisposed => "system:disposed",
            Self::SystemPaused => "system:paused",
            Self::SystemResumed => "system:resumed",
            Self::MotionResumeRequested => "motion:resume-requested",
        }
    }
}

/// Every message the bus carries, tagged by topic on the wire:
/// `{"topic":"camera:pose-changed","pose":{...},"source":"user"}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "topic")]
pub enum BusEvent {
    #[serde(rename = "input:interaction-start")]
    InteractionStart {
        #[serde(rename = "type", default)]
        kind: InteractionKind,
    },
    #[serde(rename = "input:interaction-end")]
    InteractionEnd,
    #[serde(rename = "camera:pose-changed")]
    PoseChanged { pose: Pose, source: PoseSource },
    #[serde(rename = "system:error")]
    SystemError {
        message: String,
        #[serde(default)]
        recoverable: bool,
    },
    #[serde(rename = "system:initialized")]
    SystemInitialized,
    #[serde(rename = "system:disposed")]
    SystemDisposed,
    #[serde(rename = "system:paused")]
    SystemPaused {
        #[serde(rename = "atMs")]
        at_ms: f64,
    },
    #[serde(rename = "system:resumed")]
    SystemResumed {
        #[serde(rename = "pausedForMs")]
        paused_for_ms: f64,
    },
    #[serde(rename = "motion:resume-requested")]
    MotionResumeRequested {
        #[serde(default)]
        immediate: bool,
    },
}

impl BusEvent {
    pub fn topic(&self) -> Topic {
        match self {
            Self::InteractionStart { .. } => Topic::InteractionStart,
            Self::InteractionEnd => Topic::InteractionEnd,
            Self::PoseChanged { .. } => Topic::PoseChanged,
            Self::SystemError { .. } => Topic::SystemError,
            Self::SystemInitialized => Topic::SystemInitialized,
            Self::SystemDisposed => Topic::SystemDisposed,
            Self::SystemPaused { .. } => Topic::SystemPaused,
            Self::SystemResumed { .. } => Topic::SystemResumed,
            Self::MotionResumeRequested { .. } => Topic::MotionResumeRequested,
        }
    }

    pub fn to_json(&self) -> Result<String, CameraError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, CameraError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct SubscriptionId(pub u64);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct PublisherId(pub u64);

pub type Handler = Box<dyn FnMut(&BusEvent) + Send>;

struct Entry {
    id: SubscriptionId,
    topic: Topic,
    owner: Option<PublisherId>,
    handler: Handler,
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    next_publisher: u64,
    subscribers: Vec<Entry>,
    queue: VecDeque<(BusEvent, Option<PublisherId>)>,
    dispatching: bool,
    /// Entries taken out for the event being delivered.
    in_flight: Vec<(SubscriptionId, Topic)>,
    /// Disposed while in flight; dropped when the entries come back.
    removed: HashSet<SubscriptionId>,
}

/// Cloneable handle; clones share subscribers.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<BusInner>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("EventBus")
            .field("subscribers", &(inner.subscribers.len() + inner.in_flight.len()))
            .field("queued", &inner.queue.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BusInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn register_publisher(&self) -> PublisherId {
        let mut inner = self.lock();
        let id = PublisherId(inner.next_publisher);
        inner.next_publisher = inner.next_publisher.wrapping_add(1);
        id
    }

    pub fn subscribe<F>(&self, topic: Topic, handler: F) -> Subscription
    where
        F: FnMut(&BusEvent) + Send + 'static,
    {
        self.add_subscriber(None, topic, Box::new(handler))
    }

    /// Subscribe on behalf of `owner`; events `owner` publishes via
    /// [`EventBus::publish_as`] are not delivered to this handler.
    pub fn subscribe_as<F>(&self, owner: PublisherId, topic: Topic, handler: F) -> Subscription
    where
        F: FnMut(&BusEvent) + Send + 'static,
    {
        self.add_subscriber(Some(owner), topic, Box::new(handler))
    }

    fn add_subscriber(&self, owner: Option<PublisherId>, topic: Topic, handler: Handler) -> Subscription {
        let mut inner = self.lock();
        let id = SubscriptionId(inner.next_id);
        inner.next_id = inner.next_id.wrapping_add(1);
        inner.subscribers.push(Entry {
            id,
            topic,
            owner,
            handler,
        });
        Subscription {
            id,
            topic,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver `event` to every subscriber of its topic, in subscription order.
    pub fn publish(&self, event: BusEvent) {
        self.dispatch(event, None);
    }

    /// Like [`EventBus::publish`], skipping handlers subscribed under `origin`.
    pub fn publish_as(&self, origin: PublisherId, event: BusEvent) {
        self.dispatch(event, Some(origin));
    }

    fn dispatch(&self, event: BusEvent, origin: Option<PublisherId>) {
        {
            let mut inner = self.lock();
            inner.queue.push_back((event, origin));
            if inner.dispatching {
                return;
            }
            inner.dispatching = true;
        }

        loop {
            let (event, origin, mut taken) = {
                let mut inner = self.lock();
                let Some((event, origin)) = inner.queue.pop_front() else {
                    inner.dispatching = false;
                    inner.removed.clear();
                    break;
                };
                let topic = event.topic();
                let (taken, kept): (Vec<Entry>, Vec<Entry>) = std::mem::take(&mut inner.subscribers)
                    .into_iter()
                    .partition(|e| e.topic == topic);
                inner.subscribers = kept;
                inner.in_flight = taken.iter().map(|e| (e.id, e.topic)).collect();
                (event, origin, taken)
            };

            for entry in taken.iter_mut() {
                if origin.is_some() && entry.owner == origin {
                    continue;
                }
                if self.lock().removed.contains(&entry.id) {
                    continue;
                }
                (entry.handler)(&event);
            }

            let mut inner = self.lock();
            inner.in_flight.clear();
            let removed = std::mem::take(&mut inner.removed);
            taken.retain(|e| !removed.contains(&e.id));
            inner.subscribers.extend(taken);
            inner.subscribers.sort_by_key(|e| e.id.0);
        }
    }

    /// Parse a topic-tagged JSON payload and publish it.
    pub fn publish_json(&self, json: &str) -> Result<(), CameraError> {
        let event = BusEvent::from_json(json).map_err(|e| {
            log::warn!("dropping malformed bus payload: {e}");
            e
        })?;
        self.publish(event);
        Ok(())
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        let inner = self.lock();
        let resting = inner.subscribers.iter().filter(|e| e.topic == topic).count();
        let flying = inner
            .in_flight
            .iter()
            .filter(|(id, t)| *t == topic && !inner.removed.contains(id))
            .count();
        resting + flying
    }

    pub fn total_subscribers(&self) -> usize {
        let inner = self.lock();
        let flying = inner
            .in_flight
            .iter()
            .filter(|(id, _)| !inner.removed.contains(id))
            .count();
        inner.subscribers.len() + flying
    }

    fn unsubscribe(inner: &Mutex<BusInner>, id: SubscriptionId) -> bool {
        let mut inner = inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pos) = inner.subscribers.iter().position(|e| e.id == id) {
            inner.subscribers.remove(pos);
            return true;
        }
        if inner.in_flight.iter().any(|(i, _)| *i == id) {
            return inner.removed.insert(id);
        }
        false
    }
}

/// Disposer returned by [`EventBus::subscribe`]. Dropping it does not
/// unsubscribe; call [`Subscription::dispose`].
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    topic: Topic,
    bus: Weak<Mutex<BusInner>>,
}

impl Subscription {
    #[inline]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    #[inline]
    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Remove the handler. Returns `false` when it was already removed or the
    /// bus is gone.
    pub fn dispose(&self) -> bool {
        match self.bus.upgrade() {
            Some(inner) => EventBus::unsubscribe(&inner, self.id),
            None => false,
        }
    }
}

impl std::fmt::Debug for BusInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BusInner")
            .field("subscribers", &self.subscribers.len())
            .field("dispatching", &self.dispatching)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn delivers_by_topic_and_disposes_idempotently() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let h = hits.clone();
        let sub = bus.subscribe(Topic::InteractionEnd, move |_| {
            h.fetch_add(1, Ordering::SeqCst);
        });
        bus.publish(BusEvent::InteractionEnd);
        bus.publish(BusEvent::SystemInitialized);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        assert!(sub.dispose());
        assert!(!sub.dispose());
        bus.publish(BusEvent::InteractionEnd);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(bus.subscriber_count(Topic::InteractionEnd), 0);
    }

    #[test]
    fn publish_from_handler_is_queued_not_reentrant() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let (b, o) = (bus.clone(), order.clone());
        let _a = bus.subscribe(Topic::InteractionStart, move |_| {
            o.lock().unwrap().push("start");
            b.publish(BusEvent::InteractionEnd);
            o.lock().unwrap().push("start-done");
        });
        let o = order.clone();
        let _b = bus.subscribe(Topic::InteractionEnd, move |_| {
            o.lock().unwrap().push("end");
        });

        bus.publish(BusEvent::InteractionStart {
            kind: InteractionKind::Rotate,
        });
        assert_eq!(*order.lock().unwrap(), vec!["start", "start-done", "end"]);
    }

    #[test]
    fn publisher_skips_only_its_own_handlers() {
        let bus = EventBus::new();
        let me = bus.register_publisher();
        assert_ne!(me, bus.register_publisher());
        let mine = Arc::new(AtomicUsize::new(0));
        let theirs = Arc::new(AtomicUsize::new(0));

        let m = mine.clone();
        let _own = bus.subscribe_as(me, Topic::InteractionStart, move |_| {
            m.fetch_add(1, Ordering::SeqCst);
        });
        let (t, relay) = (theirs.clone(), bus.clone());
        let _other = bus.subscribe(Topic::InteractionStart, move |_| {
            if t.fetch_add(1, Ordering::SeqCst) == 0 {
                // a reaction published during our dispatch still reaches us
                relay.publish(BusEvent::InteractionStart {
                    kind: InteractionKind::Pan,
                });
            }
        });

        bus.publish_as(me, BusEvent::InteractionStart {
            kind: InteractionKind::Rotate,
        });
        assert_eq!(mine.load(Ordering::SeqCst), 1);
        assert_eq!(theirs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn handler_can_dispose_itself() {
        let bus = EventBus::new();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));
        let hits = Arc::new(AtomicUsize::new(0));
        let (s, h) = (slot.clone(), hits.clone());
        let sub = bus.subscribe(Topic::SystemDisposed, move |_| {
            h.fetch_add(1, Ordering::SeqCst);
            if let Some(sub) = s.lock().unwrap().as_ref() {
                sub.dispose();
            }
        });
        *slot.lock().unwrap() = Some(sub);
        bus.publish(BusEvent::SystemDisposed);
        bus.publish(BusEvent::SystemDisposed);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(bus.subscriber_count(Topic::SystemDisposed), 0);
    }

    #[test]
    fn json_uses_topic_tags() {
        let event = BusEvent::SystemError {
            message: "gpu lost".into(),
            recoverable: false,
        };
        let json = event.to_json().unwrap();
        assert!(json.contains(r#""topic":"system:error""#));
        assert_eq!(BusEvent::from_json(&json).unwrap(), event);

        let start = BusEvent::from_json(r#"{"topic":"input:interaction-start","type":"pan"}"#).unwrap();
        assert_eq!(start, BusEvent::InteractionStart { kind: InteractionKind::Pan });

        let bus = EventBus::new();
        assert!(bus.publish_json(r#"{"topic":"camera:pose-changed","pose":42}"#).is_err());
        assert!(bus.publish_json(r#"{"topic":"nope"}"#).is_err());
    }
}
