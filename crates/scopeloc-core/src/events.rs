use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;

use crate::host::{HostNodeId, SceneId};
use crate::scope::ScopeId;

/// Scope-tree lifecycle notifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeEvent {
    /// A global scope was spawned on a fresh host container.
    GlobalCreated { scope: ScopeId, host: HostNodeId },
    GlobalConfigured { scope: ScopeId, persistent: bool },
    SceneConfigured { scope: ScopeId, scene: SceneId },
    ScopeDestroyed { scope: ScopeId },
    Reset,
}

/// Multicast hub: every subscriber gets its own unbounded queue.
///
/// Publishing never blocks; queues whose receiver was dropped are discarded on
/// the next publish.
#[derive(Default)]
pub(crate) struct EventHub {
    subscribers: Mutex<Vec<Sender<ScopeEvent>>>,
}

impl EventHub {
    pub(crate) fn subscribe(&self) -> ScopeEvents {
        let (tx, rx) = unbounded();
        self.subscribers.lock().push(tx);
        ScopeEvents { rx }
    }

    pub(crate) fn publish(&self, ev: ScopeEvent) {
        let mut subs = self.subscribers.lock();
        subs.retain(|tx| tx.send(ev.clone()).is_ok());
    }
}

/// Receiving end of one subscription.
pub struct ScopeEvents {
    rx: Receiver<ScopeEvent>,
}

impl ScopeEvents {
    #[inline]
    pub fn try_recv(&self) -> Option<ScopeEvent> {
        self.rx.try_recv().ok()
    }

    #[inline]
    pub fn drain_into(&self, out: &mut Vec<ScopeEvent>) {
        while let Ok(ev) = self.rx.try_recv() {
            out.push(ev);
        }
    }

    pub fn drain(&self) -> Vec<ScopeEvent> {
        let mut out = Vec::new();
        self.drain_into(&mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_subscriber_sees_every_event() {
        let hub = EventHub::default();
        let a = hub.subscribe();
        let b = hub.subscribe();

        hub.publish(ScopeEvent::Reset);

        assert_eq!(a.try_recv(), Some(ScopeEvent::Reset));
        assert_eq!(b.drain(), vec![ScopeEvent::Reset]);
        assert_eq!(a.try_recv(), None);
    }

    #[test]
    fn dropped_subscribers_are_pruned() {
        let hub = EventHub::default();
        let keep = hub.subscribe();
        drop(hub.subscribe());

        hub.publish(ScopeEvent::Reset);

        assert_eq!(hub.subscribers.lock().len(), 1);
        assert_eq!(keep.drain().len(), 1);
    }
}
