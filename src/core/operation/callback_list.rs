//=========================================================================
// Callback List
//=========================================================================
//
// Ordered list of one-shot continuation handlers.
//
// Operations push handlers here while non-terminal. The terminal
// transition drains the list exactly once, after the state has been
// written, so handlers never observe a half-finished transition.
//
//=========================================================================

//=== CallbackList ========================================================

/// Ordered list of boxed one-shot handlers.
///
/// `F` is the unsized handler type, e.g. `dyn FnOnce(Option<&OperationError>)`.
pub struct CallbackList<F: ?Sized> {
    handlers: Vec<Box<F>>,
}

impl<F: ?Sized> CallbackList<F> {
    /// Creates a new empty list.
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Appends a handler. Handlers fire in push order.
    pub fn push(&mut self, handler: Box<F>) {
        self.handlers.push(handler);
    }

    /// Returns true if no handler is queued.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Returns the number of queued handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Drops every queued handler without firing it.
    pub fn clear(&mut self) {
        self.handlers.clear()
    }

    /// Takes every queued handler, leaving the list empty.
    ///
    /// The caller fires the returned handlers once its own borrows are
    /// released.
    pub fn take(&mut self) -> Vec<Box<F>> {
        std::mem::take(&mut self.handlers)
    }
}

impl<F: ?Sized> Default for CallbackList<F> {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================
// Unit Tests
//=========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Handler = dyn FnOnce(u32);

    #[test]
    fn new_list_is_empty() {
        let list: CallbackList<Handler> = CallbackList::new();
        assert!(list.is_empty());
        assert_eq!(list.len(), 0);
    }

    #[test]
    fn take_preserves_push_order_and_empties() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut list: CallbackList<Handler> = CallbackList::new();

        for tag in 0..3 {
            let seen = Rc::clone(&seen);
            list.push(Box::new(move |value| seen.borrow_mut().push((tag, value))));
        }
        assert_eq!(list.len(), 3);

        for handler in list.take() {
            handler(7);
        }

        assert!(list.is_empty());
        assert_eq!(*seen.borrow(), vec![(0, 7), (1, 7), (2, 7)]);
    }

    #[test]
    fn clear_drops_without_firing() {
        let fired = Rc::new(RefCell::new(false));
        let mut list: CallbackList<Handler> = CallbackList::new();
        let flag = Rc::clone(&fired);
        list.push(Box::new(move |_| *flag.borrow_mut() = true));

        list.clear();

        assert!(list.is_empty());
        assert!(!*fired.borrow());
    }
}
