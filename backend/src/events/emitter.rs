//! Listener storage with two-phase commit
//!
//! The emitter itself never calls handlers: the owner calls
//! [`EventEmitter::begin_dispatch`] to get a snapshot, invokes the handlers
//! with whatever context it can lend them, then calls
//! [`EventEmitter::end_dispatch`]. Registration changes made in between are
//! queued and applied when the outermost dispatch ends.

use super::types::EntityEvent;
use std::collections::BTreeMap;

/// Identifies one registration, for [`EventEmitter::off`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandlerId(pub u64);

#[derive(Clone)]
struct Listener<H> {
    id: HandlerId,
    handler: H,
    once: bool,
    /// A `once` listener already handed out for dispatch
    spent: bool,
}

enum PendingChange<H> {
    Add {
        event: EntityEvent,
        listener: Listener<H>,
    },
    Remove {
        event: EntityEvent,
        id: HandlerId,
    },
}

/// Ordered handlers per event name
pub struct EventEmitter<H> {
    listeners: BTreeMap<EntityEvent, Vec<Listener<H>>>,
    pending: Vec<PendingChange<H>>,
    dispatch_depth: usize,
    next_id: u64,
}

impl<H: Clone> EventEmitter<H> {
    pub fn new() -> Self {
        Self {
            listeners: BTreeMap::new(),
            pending: Vec::new(),
            dispatch_depth: 0,
            next_id: 1,
        }
    }

    /// Register `handler` for every future `event`
    pub fn on(&mut self, event: EntityEvent, handler: H) -> HandlerId {
        self.register(event, handler, false)
    }

    /// Register `handler` for the next `event` only
    pub fn once(&mut self, event: EntityEvent, handler: H) -> HandlerId {
        self.register(event, handler, true)
    }

    /// Unregister a handler; unknown ids are ignored
    pub fn off(&mut self, event: &EntityEvent, id: HandlerId) {
        if self.is_dispatching() {
            self.pending.push(PendingChange::Remove {
                event: event.clone(),
                id,
            });
        } else {
            self.remove(event, id);
        }
    }

    /// Whether handlers are currently running
    pub fn is_dispatching(&self) -> bool {
        self.dispatch_depth > 0
    }

    /// Live handlers for `event` (queued changes not included)
    pub fn listener_count(&self, event: &EntityEvent) -> usize {
        self.listeners
            .get(event)
            .map_or(0, |list| list.iter().filter(|l| !l.spent).count())
    }

    /// Number of registration changes waiting for the dispatch to end
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Open a dispatch and snapshot the handlers for `event`
    ///
    /// `once` handlers in the snapshot are marked spent (so nested dispatches
    /// skip them) and their removal is queued.
    pub fn begin_dispatch(&mut self, event: &EntityEvent) -> Vec<(HandlerId, H)> {
        self.dispatch_depth += 1;

        let mut snapshot = Vec::new();
        let mut spent = Vec::new();
        if let Some(list) = self.listeners.get_mut(event) {
            for listener in list.iter_mut().filter(|l| !l.spent) {
                snapshot.push((listener.id, listener.handler.clone()));
                if listener.once {
                    listener.spent = true;
                    spent.push(listener.id);
                }
            }
        }
        for id in spent {
            self.pending.push(PendingChange::Remove {
                event: event.clone(),
                id,
            });
        }
        snapshot
    }

    /// Close a dispatch; the outermost close commits queued changes in order
    pub fn end_dispatch(&mut self) {
        self.dispatch_depth = self.dispatch_depth.saturating_sub(1);
        if self.dispatch_depth > 0 {
            return;
        }
        for change in std::mem::take(&mut self.pending) {
            match change {
                PendingChange::Add { event, listener } => {
                    self.listeners.entry(event).or_default().push(listener);
                }
                PendingChange::Remove { event, id } => self.remove(&event, id),
            }
        }
    }

    fn register(&mut self, event: EntityEvent, handler: H, once: bool) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        let listener = Listener {
            id,
            handler,
            once,
            spent: false,
        };
        if self.is_dispatching() {
            self.pending.push(PendingChange::Add { event, listener });
        } else {
            self.listeners.entry(event).or_default().push(listener);
        }
        id
    }

    fn remove(&mut self, event: &EntityEvent, id: HandlerId) {
        if let Some(list) = self.listeners.get_mut(event) {
            list.retain(|l| l.id != id);
            if list.is_empty() {
                self.listeners.remove(event);
            }
        }
    }
}

impl<H: Clone> Default for EventEmitter<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> std::fmt::Debug for EventEmitter<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("events", &self.listeners.keys().collect::<Vec<_>>())
            .field("pending", &self.pending.len())
            .field("dispatch_depth", &self.dispatch_depth)
            .finish()
    }
}
