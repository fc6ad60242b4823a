use std::collections::VecDeque;

/// A discrete window or input event as the frame loop sees it.
///
/// Platform layers translate their native events into these; anything the
/// viewer does not react to becomes `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerEvent {
    /// The user asked to close the window.
    Close,
    /// Some key went down. Carries no key: the held set is sampled instead.
    KeyPressed,
    /// The drawable area changed size, in physical pixels.
    Resized { width: u32, height: u32 },
    /// Anything else.
    Other,
}

/// Non-blocking FIFO source of viewer events.
pub trait EventSource {
    /// Next pending event, or `None` when the queue is empty right now.
    fn poll_event(&mut self) -> Option<ViewerEvent>;
}

/// In-memory event FIFO filled by the platform layer between frames.
#[derive(Debug, Default)]
pub struct EventQueue {
    pending: VecDeque<ViewerEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: ViewerEvent) {
        tracing::trace!(?event, "event queued");
        self.pending.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl EventSource for EventQueue {
    fn poll_event(&mut self) -> Option<ViewerEvent> {
        self.pending.pop_front()
    }
}

impl<I: Iterator<Item = ViewerEvent>> EventSource for std::iter::Fuse<I> {
    fn poll_event(&mut self) -> Option<ViewerEvent> {
        self.next()
    }
}
