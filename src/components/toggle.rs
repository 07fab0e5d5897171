use std::cell::RefCell;
use std::fmt;
use std::mem;

type Listener = Box<dyn FnMut(bool)>;

/// On/off switch that notifies listeners when its value changes
pub struct Toggle {
    is_on: bool,
    listeners: Vec<Listener>,
}

impl Toggle {
    pub fn new(is_on: bool) -> Self {
        Toggle {
            is_on,
            listeners: Vec::new(),
        }
    }

    pub fn is_on(&self) -> bool {
        self.is_on
    }

    /// Registers a change listener
    pub fn on_value_changed(&mut self, listener: impl FnMut(bool) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Sets the value, notifying listeners only if it changed
    pub fn set_is_on(&mut self, is_on: bool) {
        if self.is_on != is_on {
            self.is_on = is_on;
            self.notify();
        }
    }

    pub fn set_without_notify(&mut self, is_on: bool) {
        self.is_on = is_on;
    }

    /// Fires every listener with the current value
    pub fn notify(&mut self) {
        let value = self.is_on;
        for listener in &mut self.listeners {
            listener(value);
        }
    }

    /// Fires a shared toggle's listeners with no borrow held
    ///
    /// Listeners may read or set the toggle they listen to. Listeners added
    /// while firing are kept after the existing ones.
    pub fn notify_shared(toggle: &RefCell<Toggle>) {
        let (value, mut listeners) = {
            let mut inner = toggle.borrow_mut();
            (inner.is_on, mem::take(&mut inner.listeners))
        };
        for listener in &mut listeners {
            listener(value);
        }
        let mut inner = toggle.borrow_mut();
        listeners.append(&mut inner.listeners);
        inner.listeners = listeners;
    }
}

impl fmt::Debug for Toggle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Toggle")
            .field("is_on", &self.is_on)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for Toggle {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_listener_only_fires_on_change() {
        let calls = Rc::new(Cell::new(0));
        let mut toggle = Toggle::new(false);
        let counter = calls.clone();
        toggle.on_value_changed(move |_| counter.set(counter.get() + 1));

        toggle.set_is_on(false);
        assert_eq!(calls.get(), 0);

        toggle.set_is_on(true);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_shared_listener_can_read_its_toggle() {
        let toggle = Rc::new(RefCell::new(Toggle::new(true)));
        let seen = Rc::new(Cell::new(None));
        let weak = Rc::downgrade(&toggle);
        let record = seen.clone();
        toggle.borrow_mut().on_value_changed(move |_| {
            let toggle = weak.upgrade().unwrap();
            record.set(Some(toggle.borrow().is_on()));
        });

        Toggle::notify_shared(&toggle);

        assert_eq!(seen.get(), Some(true));
        assert_eq!(toggle.borrow().listeners.len(), 1);
    }
}
