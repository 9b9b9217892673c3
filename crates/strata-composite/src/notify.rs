//! Redraw notification after a rebuild.

use std::fmt;

/// Counts rebuilds and forwards each one to an optional host callback.
#[derive(Default)]
pub struct RedrawNotifier {
    callback: Option<Box<dyn FnMut()>>,
    count: u64,
}

impl RedrawNotifier {
    /// Installs the callback invoked after every rebuild, replacing any previous one.
    pub fn set_callback(&mut self, callback: impl FnMut() + 'static) {
        self.callback = Some(Box::new(callback));
    }

    /// Removes the callback.
    pub fn clear_callback(&mut self) {
        self.callback = None;
    }

    /// Records a rebuild and requests a redraw.
    pub fn notify(&mut self) {
        self.count += 1;
        if let Some(callback) = self.callback.as_mut() {
            callback();
        }
    }

    /// Number of rebuilds so far.
    pub fn count(&self) -> u64 {
        self.count
    }
}

impl fmt::Debug for RedrawNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedrawNotifier")
            .field("has_callback", &self.callback.is_some())
            .field("count", &self.count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    #[test]
    fn test_notify_counts_and_calls() {
        let calls = Rc::new(Cell::new(0));
        let mut notifier = RedrawNotifier::default();
        notifier.notify();
        assert_eq!(notifier.count(), 1);

        let seen = Rc::clone(&calls);
        notifier.set_callback(move || seen.set(seen.get() + 1));
        notifier.notify();
        notifier.notify();
        assert_eq!(notifier.count(), 3);
        assert_eq!(calls.get(), 2);

        notifier.clear_callback();
        notifier.notify();
        assert_eq!(calls.get(), 2);
    }
}
