//! Surface size and resize notification.
//!
//! The host owns a [`ResizeEvents`] and calls [`emit`](ResizeEvents::emit)
//! whenever the window changes size. Interested parties hold a
//! [`ResizeSubscription`], which keeps only the latest size until it is
//! taken. Dropping the subscription (or calling
//! [`unsubscribe`](ResizeSubscription::unsubscribe)) detaches it.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Drawable size in physical pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height, or 1 for a degenerate size.
    pub fn aspect(&self) -> f32 {
        if self.width == 0 || self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl From<winit::dpi::PhysicalSize<u32>> for SurfaceSize {
    fn from(size: winit::dpi::PhysicalSize<u32>) -> Self {
        Self::new(size.width, size.height)
    }
}

type Slot = Cell<Option<SurfaceSize>>;

/// Broadcasts surface sizes to live subscriptions.
#[derive(Debug, Default)]
pub struct ResizeEvents {
    slots: RefCell<Vec<Weak<Slot>>>,
}

impl ResizeEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> ResizeSubscription {
        let slot = Rc::new(Cell::new(None));
        self.slots.borrow_mut().push(Rc::downgrade(&slot));
        ResizeSubscription { slot }
    }

    /// Deliver `size` to every live subscription, pruning dropped ones.
    pub fn emit(&self, size: SurfaceSize) {
        self.slots.borrow_mut().retain(|slot| match slot.upgrade() {
            Some(slot) => {
                slot.set(Some(size));
                true
            }
            None => false,
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.slots
            .borrow()
            .iter()
            .filter(|slot| slot.strong_count() > 0)
            .count()
    }
}

/// The receiving end of a [`ResizeEvents`].
#[derive(Debug)]
pub struct ResizeSubscription {
    slot: Rc<Slot>,
}

impl ResizeSubscription {
    /// The most recent size emitted since the last call, if any.
    pub fn take(&self) -> Option<SurfaceSize> {
        self.slot.take()
    }

    pub fn unsubscribe(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_the_latest_size() {
        let events = ResizeEvents::new();
        let sub = events.subscribe();
        assert_eq!(sub.take(), None);

        events.emit(SurfaceSize::new(800, 600));
        events.emit(SurfaceSize::new(1024, 768));
        assert_eq!(sub.take(), Some(SurfaceSize::new(1024, 768)));
        assert_eq!(sub.take(), None);
    }

    #[test]
    fn unsubscribed_receivers_are_pruned() {
        let events = ResizeEvents::new();
        let a = events.subscribe();
        let b = events.subscribe();
        assert_eq!(events.subscriber_count(), 2);

        a.unsubscribe();
        events.emit(SurfaceSize::new(10, 10));
        assert_eq!(events.subscriber_count(), 1);
        assert_eq!(b.take(), Some(SurfaceSize::new(10, 10)));
    }

    #[test]
    fn aspect_of_degenerate_size_is_one() {
        assert_eq!(SurfaceSize::new(1600, 800).aspect(), 2.0);
        assert_eq!(SurfaceSize::new(0, 800).aspect(), 1.0);
    }
}
