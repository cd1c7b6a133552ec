//! Ordered callback lists
//!
//! Key principles:
//! - Handlers run in the order they were added
//! - Every handler gets a [`HandlerId`] that removes exactly that handler
//! - Removing a handler never reorders the others

use crate::foundation::collections::{new_key_type, OrderedSlotMap};

new_key_type! {
    /// Handle returned when a callback is registered
    pub struct HandlerId;
}

/// Ordered list of boxed callbacks of type `F`
pub struct HandlerList<F: ?Sized> {
    handlers: OrderedSlotMap<HandlerId, Box<F>>,
}

impl<F: ?Sized> HandlerList<F> {
    /// Create an empty list
    pub fn new() -> Self {
        Self {
            handlers: OrderedSlotMap::new(),
        }
    }

    /// Register a handler at the end of the list
    pub fn add(&mut self, handler: Box<F>) -> HandlerId {
        self.handlers.insert(handler)
    }

    /// Unregister a handler, returning whether it was present
    pub fn remove(&mut self, id: HandlerId) -> bool {
        self.handlers.remove(id).is_some()
    }

    /// Whether the handler is still registered
    pub fn contains(&self, id: HandlerId) -> bool {
        self.handlers.contains_key(id)
    }

    /// Number of handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Handlers in registration order
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Box<F>> + '_ {
        self.handlers.values_mut()
    }

    /// Drop every handler
    pub fn clear(&mut self) {
        self.handlers.drain().for_each(drop);
    }
}

impl<F: ?Sized> Default for HandlerList<F> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Callback = dyn FnMut(u32) -> bool;

    #[test]
    fn test_handlers_run_in_order_and_remove_by_id() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut list: HandlerList<Callback> = HandlerList::new();

        let ids: Vec<HandlerId> = (0..3)
            .map(|n| {
                let seen = seen.clone();
                list.add(Box::new(move |value| {
                    seen.borrow_mut().push((n, value));
                    true
                }))
            })
            .collect();

        assert!(list.remove(ids[1]));
        assert!(!list.remove(ids[1]));
        assert!(list.contains(ids[2]));

        for handler in list.iter_mut() {
            handler(9);
        }
        assert_eq!(*seen.borrow(), vec![(0, 9), (2, 9)]);
    }

    #[test]
    fn test_short_circuit_with_all() {
        let mut list: HandlerList<Callback> = HandlerList::new();
        let calls = Rc::new(RefCell::new(0));
        for verdict in [true, false, true] {
            let calls = calls.clone();
            list.add(Box::new(move |_| {
                *calls.borrow_mut() += 1;
                verdict
            }));
        }

        assert!(!list.iter_mut().all(|handler| handler(0)));
        assert_eq!(*calls.borrow(), 2);

        list.clear();
        assert!(list.is_empty());
    }
}
