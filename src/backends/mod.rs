//! Driver backends for `stickmfd`.
//!
//! Implementations of [`DeviceDriver`](crate::device::DeviceDriver):
//! - [`virtual_driver::VirtualDriver`]: in-memory, records calls; always built.
//! - `windows::DirectOutputDriver`: the DirectOutput SDK (Windows only).
//!
//! # Feature flags
//! - **`hid`**: USB presence probe for MFD units via `hidapi` (Windows, default).

pub mod usb;
pub mod virtual_driver;

#[cfg(target_os = "windows")]
#[cfg_attr(docsrs, doc(cfg(target_os = "windows")))]
pub mod windows;

pub use virtual_driver::VirtualDriver;
