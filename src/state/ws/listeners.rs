use std::collections::HashMap;
use std::sync::Arc;

use super::types::EntityEvent;

pub type Callback = Arc<dyn Fn(&EntityEvent) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Event name to callbacks, kept in registration order.
#[derive(Default)]
pub struct Listeners {
    next_id: u64,
    by_event: HashMap<String, Vec<(ListenerId, Callback)>>,
}

impl Listeners {
    pub fn on(&mut self, event: &str, callback: Callback) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);

        self.by_event
            .entry(event.to_string())
            .or_default()
            .push((id, callback));

        id
    }

    pub fn off(&mut self, event: &str, id: ListenerId) -> bool {
        let Some(callbacks) = self.by_event.get_mut(event) else {
            return false;
        };

        let before = callbacks.len();
        callbacks.retain(|(listener, _)| *listener != id);
        let removed = callbacks.len() != before;

        if callbacks.is_empty() {
            self.by_event.remove(event);
        }

        removed
    }

    /// Callbacks registered for exactly `event`.
    pub fn get(&self, event: &str) -> Vec<Callback> {
        self.by_event
            .get(event)
            .map(|callbacks| callbacks.iter().map(|(_, cb)| cb.clone()).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.by_event.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_event.is_empty()
    }
}
