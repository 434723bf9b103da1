use std::fmt;

use crate::canvas::LogicalSize;

type ResizeCallback = Box<dyn FnMut(LogicalSize)>;

/// Change detector for the CSS size of a panel.
///
/// The host calls `observe` from its layout pass (every frame is fine);
/// the callback only runs when the size differs from the last one seen.
/// The first observation always counts as a change.
pub struct ResizeObserver {
    last: Option<LogicalSize>,
    callback: Option<ResizeCallback>,
}

impl ResizeObserver {
    /// Returns whether the callback ran.
    pub fn observe(&mut self, size: LogicalSize) -> bool {
        let Some(callback) = self.callback.as_mut() else {
            return false;
        };
        if self.last == Some(size) {
            return false;
        }
        self.last = Some(size);
        callback(size);
        true
    }

    pub fn last_size(&self) -> Option<LogicalSize> {
        self.last
    }

    pub fn is_connected(&self) -> bool {
        self.callback.is_some()
    }

    /// Stop all future callbacks.
    pub fn disconnect(&mut self) {
        self.callback = None;
    }
}

impl fmt::Debug for ResizeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResizeObserver")
            .field("last", &self.last)
            .field("connected", &self.is_connected())
            .finish()
    }
}

pub fn watch_for_resize(callback: impl FnMut(LogicalSize) + 'static) -> ResizeObserver {
    ResizeObserver {
        last: None,
        callback: Some(Box::new(callback)),
    }
}
