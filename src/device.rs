//! The driver capability consumed by [`Session`](crate::session::Session).
//!
//! A [`DeviceDriver`] is a thin, handle-based wrapper over the vendor driver.
//! Backends translate each call to the native API and map its result code with
//! [`DriverCode::check`](crate::error::DriverCode::check). Asynchronous
//! notifications are delivered through an [`EventSink`] handed to the
//! `register_*` calls; backends must never call back into the session directly.

use crate::error::DriverCode;
use crate::event::EventSink;
use std::fmt;
use std::path::Path;

/// Result of a single driver call.
pub type DriverResult = Result<(), DriverCode>;

/// Opaque identifier of one connected unit, as reported by the driver.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceHandle(pub usize);

impl fmt::Debug for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceHandle(0x{:x})", self.0)
    }
}

/// Page identifier passed to the driver.
pub type PageId = u32;

/// Vendor driver capability.
///
/// All calls are made from the thread that owns the session.
pub trait DeviceDriver {
    fn initialize(&mut self, application_name: &str) -> DriverResult;
    fn deinitialize(&mut self) -> DriverResult;

    /// Register for device arrival/removal notifications.
    fn register_device_callback(&mut self, sink: EventSink) -> DriverResult;

    /// Synchronously report every currently attached device to `found`.
    fn enumerate(&mut self, found: &mut dyn FnMut(DeviceHandle)) -> DriverResult;

    fn register_softbutton_callback(&mut self, device: DeviceHandle, sink: EventSink)
        -> DriverResult;
    fn register_page_callback(&mut self, device: DeviceHandle, sink: EventSink) -> DriverResult;

    fn add_page(&mut self, device: DeviceHandle, page: PageId, active: bool) -> DriverResult;
    fn remove_page(&mut self, device: DeviceHandle, page: PageId) -> DriverResult;
    fn set_string(&mut self, device: DeviceHandle, page: PageId, line: u32, text: &str)
        -> DriverResult;
    fn set_led(&mut self, device: DeviceHandle, page: PageId, led: u32, on: bool) -> DriverResult;

    /// Activate a profile file, or clear the active profile with `None`.
    fn set_profile(&mut self, device: DeviceHandle, profile: Option<&Path>) -> DriverResult;
}

impl<D: DeviceDriver + ?Sized> DeviceDriver for Box<D> {
    fn initialize(&mut self, application_name: &str) -> DriverResult {
        (**self).initialize(application_name)
    }
    fn deinitialize(&mut self) -> DriverResult {
        (**self).deinitialize()
    }
    fn register_device_callback(&mut self, sink: EventSink) -> DriverResult {
        (**self).register_device_callback(sink)
    }
    fn enumerate(&mut self, found: &mut dyn FnMut(DeviceHandle)) -> DriverResult {
        (**self).enumerate(found)
    }
    fn register_softbutton_callback(
        &mut self,
        device: DeviceHandle,
        sink: EventSink,
    ) -> DriverResult {
        (**self).register_softbutton_callback(device, sink)
    }
    fn register_page_callback(&mut self, device: DeviceHandle, sink: EventSink) -> DriverResult {
        (**self).register_page_callback(device, sink)
    }
    fn add_page(&mut self, device: DeviceHandle, page: PageId, active: bool) -> DriverResult {
        (**self).add_page(device, page, active)
    }
    fn remove_page(&mut self, device: DeviceHandle, page: PageId) -> DriverResult {
        (**self).remove_page(device, page)
    }
    fn set_string(
        &mut self,
        device: DeviceHandle,
        page: PageId,
        line: u32,
        text: &str,
    ) -> DriverResult {
        (**self).set_string(device, page, line, text)
    }
    fn set_led(&mut self, device: DeviceHandle, page: PageId, led: u32, on: bool) -> DriverResult {
        (**self).set_led(device, page, led, on)
    }
    fn set_profile(&mut self, device: DeviceHandle, profile: Option<&Path>) -> DriverResult {
        (**self).set_profile(device, profile)
    }
}
