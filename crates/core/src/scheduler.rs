use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use flame_canvas_protocol::{Mat3, Rect};

use crate::model::{FlamegraphFrame, FrameKey};

pub type FrameCallback = Rc<dyn Fn()>;
pub type EventHandler = Rc<dyn Fn(&FlamegraphEvent)>;

/// Signals exchanged between the controller, renderers and linked panels.
#[derive(Debug, Clone, PartialEq)]
pub enum FlamegraphEvent {
    SetConfigView(Rect),
    TransformConfigView(Mat3),
    ResetZoom,
    ZoomIntoFrame(FlamegraphFrame),
    /// Emphasize every node of one symbol (`None` clears).
    HighlightFrame(Option<FrameKey>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    SetConfigView,
    TransformConfigView,
    ResetZoom,
    ZoomIntoFrame,
    HighlightFrame,
}

impl FlamegraphEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            FlamegraphEvent::SetConfigView(_) => EventKind::SetConfigView,
            FlamegraphEvent::TransformConfigView(_) => EventKind::TransformConfigView,
            FlamegraphEvent::ResetZoom => EventKind::ResetZoom,
            FlamegraphEvent::ZoomIntoFrame(_) => EventKind::ZoomIntoFrame,
            FlamegraphEvent::HighlightFrame(_) => EventKind::HighlightFrame,
        }
    }
}

/// Host hook standing in for `requestAnimationFrame`.
///
/// `request_frame` asks the host to call `CanvasScheduler::tick` once
/// before its next paint. The scheduler never calls it twice for one
/// pending frame.
pub trait FrameRequester {
    fn request_frame(&self);

    fn cancel_frame(&self) {}
}

/// Requester for hosts that poll `has_pending_frame` on their own loop.
#[derive(Debug, Default)]
pub struct PollingRequester {
    requests: Cell<u64>,
}

impl PollingRequester {
    /// How many frames have been requested so far.
    pub fn requests(&self) -> u64 {
        self.requests.get()
    }
}

impl FrameRequester for PollingRequester {
    fn request_frame(&self) {
        self.requests.set(self.requests.get() + 1);
    }
}

/// Per-panel draw coordinator and event bus.
///
/// Before-frame callbacks run in registration order, then after-frame
/// callbacks in registration order; later callbacks paint over earlier
/// ones. `draw` coalesces: any number of calls before the host's next
/// `tick` produce exactly one frame.
///
/// Single-threaded by construction (`Rc`); callbacks may re-enter the
/// scheduler (register, dispatch, draw) because the lists are snapshotted
/// before they are walked.
pub struct CanvasScheduler {
    before_frame: RefCell<Vec<FrameCallback>>,
    after_frame: RefCell<Vec<FrameCallback>>,
    handlers: RefCell<HashMap<EventKind, Vec<EventHandler>>>,
    requester: Rc<dyn FrameRequester>,
    pending: Cell<bool>,
    frames_drawn: Cell<u64>,
}

impl CanvasScheduler {
    pub fn new(requester: Rc<dyn FrameRequester>) -> Rc<Self> {
        Rc::new(Self {
            before_frame: RefCell::new(Vec::new()),
            after_frame: RefCell::new(Vec::new()),
            handlers: RefCell::new(HashMap::new()),
            requester,
            pending: Cell::new(false),
            frames_drawn: Cell::new(0),
        })
    }

    /// Scheduler driven by a host loop that polls `has_pending_frame`.
    pub fn polling() -> Rc<Self> {
        Self::new(Rc::new(PollingRequester::default()))
    }

    pub fn register_before_frame_callback(&self, cb: FrameCallback) {
        push_unique(&mut self.before_frame.borrow_mut(), cb);
    }

    pub fn unregister_before_frame_callback(&self, cb: &FrameCallback) {
        self.before_frame
            .borrow_mut()
            .retain(|c| !Rc::ptr_eq(c, cb));
    }

    pub fn register_after_frame_callback(&self, cb: FrameCallback) {
        push_unique(&mut self.after_frame.borrow_mut(), cb);
    }

    pub fn unregister_after_frame_callback(&self, cb: &FrameCallback) {
        self.after_frame
            .borrow_mut()
            .retain(|c| !Rc::ptr_eq(c, cb));
    }

    /// Schedule one frame. Calls made while a frame is already pending are
    /// folded into it.
    pub fn draw(&self) {
        if self.pending.replace(true) {
            log::trace!("draw coalesced into pending frame");
            return;
        }
        self.requester.request_frame();
    }

    pub fn has_pending_frame(&self) -> bool {
        self.pending.get()
    }

    /// Host animation-frame entry point. Runs the pending frame, if any;
    /// returns whether a frame was drawn.
    pub fn tick(&self) -> bool {
        if !self.pending.replace(false) {
            return false;
        }
        self.run_frame();
        true
    }

    /// Run all callbacks now. Any pending frame is cancelled since its
    /// content is produced here.
    pub fn draw_sync(&self) {
        if self.pending.replace(false) {
            self.requester.cancel_frame();
        }
        self.run_frame();
    }

    /// Frames executed since construction.
    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn.get()
    }

    pub fn on(&self, kind: EventKind, handler: EventHandler) {
        let mut handlers = self.handlers.borrow_mut();
        push_unique(handlers.entry(kind).or_default(), handler);
    }

    pub fn off(&self, kind: EventKind, handler: &EventHandler) {
        if let Some(list) = self.handlers.borrow_mut().get_mut(&kind) {
            list.retain(|h| !Rc::ptr_eq(h, handler));
        }
    }

    /// Deliver `event` to every handler of its kind, in registration order.
    pub fn dispatch(&self, event: &FlamegraphEvent) {
        let handlers: Vec<EventHandler> = self
            .handlers
            .borrow()
            .get(&event.kind())
            .cloned()
            .unwrap_or_default();
        for handler in handlers {
            handler(event);
        }
    }

    /// Drop every callback and handler and cancel the pending frame.
    pub fn dispose(&self) {
        self.before_frame.borrow_mut().clear();
        self.after_frame.borrow_mut().clear();
        self.handlers.borrow_mut().clear();
        if self.pending.replace(false) {
            self.requester.cancel_frame();
        }
        log::debug!("scheduler disposed after {} frames", self.frames_drawn.get());
    }

    fn run_frame(&self) {
        let before: Vec<FrameCallback> = self.before_frame.borrow().clone();
        for cb in before {
            cb();
        }
        let after: Vec<FrameCallback> = self.after_frame.borrow().clone();
        for cb in after {
            cb();
        }
        self.frames_drawn.set(self.frames_drawn.get() + 1);
    }
}

impl fmt::Debug for CanvasScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CanvasScheduler")
            .field("before_frame", &self.before_frame.borrow().len())
            .field("after_frame", &self.after_frame.borrow().len())
            .field("pending", &self.pending.get())
            .field("frames_drawn", &self.frames_drawn.get())
            .finish()
    }
}

fn push_unique<T: ?Sized>(list: &mut Vec<Rc<T>>, item: Rc<T>) {
    if !list.iter().any(|existing| Rc::ptr_eq(existing, &item)) {
        list.push(item);
    }
}
