//! stickmfd: multi-function display sessions for HOTAS devices.
//!
//! Drives the three-line MFD and LED panel of a Saitek/Logitech X52 Pro
//! through the vendor DirectOutput driver, and layers soft-button navigation
//! (scrollable list, paged detail view) on top.

pub mod backends;
pub mod config;
pub mod content;
pub mod device;
pub mod error;
pub mod event;
pub mod leds;
pub mod mfd;
pub mod nav;
pub mod page;
pub mod session;

pub use config::Config;
pub use content::{Content, ContentMapping, ContentSource, FileContent, StaticContent};
pub use device::*;
pub use error::{DriverCode, Error, Result};
pub use event::*;
pub use leds::{Indicator, LedColour};
pub use mfd::{Mfd, MfdOptions};
pub use nav::{Mode, NavigationController, NavigationState};
pub use page::{Page, PageHandle};
pub use session::Session;
