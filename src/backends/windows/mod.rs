#![cfg(target_os = "windows")]

//! Windows backends.
//!
//! - **DirectOutput**: the vendor SDK DLL, loaded at runtime with
//!   `LoadLibraryW`/`GetProcAddress` (no import library needed)
//! - **HID presence** (`hid` feature): checks whether an MFD unit is attached
//!   on USB when DirectOutput reports none
//!
//! Most users only need [`DirectOutputDriver::load`] and a
//! [`Session`](crate::session::Session).

pub mod direct_output;
#[cfg(feature = "hid")]
#[cfg_attr(docsrs, doc(cfg(feature = "hid")))]
pub mod hid_presence;
pub mod library;

pub use direct_output::DirectOutputDriver;
pub use library::{default_dll_path, locate};
