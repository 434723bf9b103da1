use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::scheduler::{CanvasScheduler, FlamegraphEvent};

/// Fans one gesture out to every linked panel.
///
/// Holds schedulers weakly: a panel that is dropped without unregistering
/// simply stops receiving events. Fan-out order across schedulers is
/// registration order today, but callers must not rely on it.
#[derive(Debug, Default)]
pub struct CanvasPoolManager {
    schedulers: RefCell<Vec<Weak<CanvasScheduler>>>,
}

impl CanvasPoolManager {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn register_scheduler(&self, scheduler: &Rc<CanvasScheduler>) {
        let mut schedulers = self.schedulers.borrow_mut();
        schedulers.retain(|s| s.strong_count() > 0);
        let weak = Rc::downgrade(scheduler);
        if !schedulers.iter().any(|s| Weak::ptr_eq(s, &weak)) {
            schedulers.push(weak);
        }
    }

    pub fn unregister_scheduler(&self, scheduler: &Rc<CanvasScheduler>) {
        let weak = Rc::downgrade(scheduler);
        self.schedulers
            .borrow_mut()
            .retain(|s| s.strong_count() > 0 && !Weak::ptr_eq(s, &weak));
    }

    /// Deliver `event` to every registered scheduler's own bus.
    pub fn dispatch(&self, event: &FlamegraphEvent) {
        for scheduler in self.live() {
            scheduler.dispatch(event);
        }
    }

    /// Ask every registered scheduler for a frame.
    pub fn draw(&self) {
        for scheduler in self.live() {
            scheduler.draw();
        }
    }

    pub fn len(&self) -> usize {
        self.schedulers
            .borrow()
            .iter()
            .filter(|s| s.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn live(&self) -> Vec<Rc<CanvasScheduler>> {
        self.schedulers
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::{EventHandler, EventKind};
    use std::cell::Cell;

    fn counting(scheduler: &CanvasScheduler) -> Rc<Cell<u32>> {
        let count = Rc::new(Cell::new(0));
        let handler: EventHandler = {
            let count = Rc::clone(&count);
            Rc::new(move |_| count.set(count.get() + 1))
        };
        scheduler.on(EventKind::ResetZoom, handler);
        count
    }

    #[test]
    fn dispatch_fans_out_to_every_scheduler() {
        let pool = CanvasPoolManager::new();
        let a = CanvasScheduler::polling();
        let b = CanvasScheduler::polling();
        let (ca, cb) = (counting(&a), counting(&b));
        pool.register_scheduler(&a);
        pool.register_scheduler(&b);
        pool.register_scheduler(&a);
        assert_eq!(pool.len(), 2);

        pool.dispatch(&FlamegraphEvent::ResetZoom);
        assert_eq!((ca.get(), cb.get()), (1, 1));

        pool.unregister_scheduler(&a);
        pool.dispatch(&FlamegraphEvent::ResetZoom);
        assert_eq!((ca.get(), cb.get()), (1, 2));
    }

    #[test]
    fn dropped_schedulers_fall_out() {
        let pool = CanvasPoolManager::new();
        let a = CanvasScheduler::polling();
        pool.register_scheduler(&a);
        drop(a);
        assert!(pool.is_empty());
        pool.dispatch(&FlamegraphEvent::ResetZoom);
    }

    #[test]
    fn draw_requests_a_frame_everywhere() {
        let pool = CanvasPoolManager::new();
        let a = CanvasScheduler::polling();
        let b = CanvasScheduler::polling();
        pool.register_scheduler(&a);
        pool.register_scheduler(&b);
        pool.draw();
        assert!(a.has_pending_frame() && b.has_pending_frame());
    }
}
