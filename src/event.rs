//! Driver notifications and decoded soft-button events.
//!
//! Backends receive notifications on a driver-owned thread. They only push a
//! [`DriverEvent`] into an [`EventSink`]; the session drains the matching
//! receiver on its own thread and turns events into [`SessionEvent`]s.
//!
//! ## Soft-button bitmask
//! - `1` select, `2` up, `4` down; combinations are a plain bitwise OR (`0..=7`).
//! - Values outside `0..=7` decode to "nothing pressed".

use crate::device::{DeviceHandle, PageId};
use std::fmt;
use std::sync::mpsc::{self, Receiver, SendError, Sender};
use std::time::Instant;

/// Select soft-button bit.
pub const SOFTBUTTON_SELECT: u32 = 0x0000_0001;
/// Up (scroll wheel up) soft-button bit.
pub const SOFTBUTTON_UP: u32 = 0x0000_0002;
/// Down (scroll wheel down) soft-button bit.
pub const SOFTBUTTON_DOWN: u32 = 0x0000_0004;

/// Raw notification as delivered by a backend callback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DriverEvent {
    /// A unit was attached (`added`) or detached.
    Device { device: DeviceHandle, added: bool },
    /// The user switched pages on the unit.
    Page {
        device: DeviceHandle,
        page: PageId,
        active: bool,
    },
    /// Soft-button state changed; `buttons` is the raw bitmask.
    SoftButtons { device: DeviceHandle, buttons: u32 },
}

/// A notification together with the moment the callback delivered it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueuedEvent {
    pub at: Instant,
    pub event: DriverEvent,
}

/// Sending half of the notification queue.
///
/// Cheap to clone; each backend registration keeps its own copy.
#[derive(Clone, Debug)]
pub struct EventSink(Sender<QueuedEvent>);

impl EventSink {
    /// New queue: the sink goes to the backend, the receiver stays with the session.
    pub fn channel() -> (EventSink, Receiver<QueuedEvent>) {
        let (tx, rx) = mpsc::channel();
        (EventSink(tx), rx)
    }

    /// Enqueue a notification stamped with its arrival time. Fails only once
    /// the receiving session is gone.
    pub fn send(&self, event: DriverEvent) -> Result<(), SendError<QueuedEvent>> {
        self.0.send(QueuedEvent {
            at: Instant::now(),
            event,
        })
    }
}

/// Decoded soft-button state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ButtonEvent {
    pub select: bool,
    pub up: bool,
    pub down: bool,
}

impl ButtonEvent {
    pub const SELECT: ButtonEvent = ButtonEvent {
        select: true,
        up: false,
        down: false,
    };
    pub const UP: ButtonEvent = ButtonEvent {
        select: false,
        up: true,
        down: false,
    };
    pub const DOWN: ButtonEvent = ButtonEvent {
        select: false,
        up: false,
        down: true,
    };

    /// Decode a driver bitmask. Anything outside `0..=7` decodes to no buttons.
    pub fn from_mask(mask: u32) -> Self {
        if mask > 7 {
            return ButtonEvent::default();
        }
        ButtonEvent {
            select: mask & SOFTBUTTON_SELECT != 0,
            up: mask & SOFTBUTTON_UP != 0,
            down: mask & SOFTBUTTON_DOWN != 0,
        }
    }

    /// Re-encode as a bitmask.
    pub fn mask(self) -> u32 {
        let mut mask = 0;
        if self.select {
            mask |= SOFTBUTTON_SELECT;
        }
        if self.up {
            mask |= SOFTBUTTON_UP;
        }
        if self.down {
            mask |= SOFTBUTTON_DOWN;
        }
        mask
    }

    /// `true` for a release (no button held).
    pub fn is_empty(self) -> bool {
        !(self.select || self.up || self.down)
    }
}

impl fmt::Display for ButtonEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "select={} up={} down={}",
            self.select, self.up, self.down
        )
    }
}

/// What a dispatched notification meant to the session owner.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// Buttons passed the debounce window.
    Buttons(ButtonEvent),
    /// A page became active and its buffer was replayed.
    PageActivated(PageId),
    /// A page stopped being active; its buffer is retained.
    PageDeactivated(PageId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_every_mask_in_range() {
        for mask in 0..=7u32 {
            let b = ButtonEvent::from_mask(mask);
            assert_eq!(b.mask(), mask);
        }
        assert_eq!(ButtonEvent::from_mask(1), ButtonEvent::SELECT);
        assert_eq!(ButtonEvent::from_mask(2), ButtonEvent::UP);
        assert_eq!(ButtonEvent::from_mask(4), ButtonEvent::DOWN);
        assert!(ButtonEvent::from_mask(0).is_empty());
    }

    #[test]
    fn out_of_range_mask_is_empty() {
        assert!(ButtonEvent::from_mask(8).is_empty());
        assert!(ButtonEvent::from_mask(0x0F).is_empty());
        assert!(ButtonEvent::from_mask(u32::MAX).is_empty());
    }

    #[test]
    fn sink_delivers_in_order() {
        let (sink, rx) = EventSink::channel();
        let dev = DeviceHandle(1);
        sink.send(DriverEvent::SoftButtons { device: dev, buttons: 2 })
            .unwrap();
        sink.clone()
            .send(DriverEvent::Page {
                device: dev,
                page: 0,
                active: true,
            })
            .unwrap();
        let first = rx.recv().unwrap();
        let second = rx.recv().unwrap();
        assert!(matches!(first.event, DriverEvent::SoftButtons { buttons: 2, .. }));
        assert!(matches!(second.event, DriverEvent::Page { active: true, .. }));
        assert!(first.at <= second.at);
    }
}
