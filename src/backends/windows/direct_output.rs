//! DirectOutput (`DirectOutput.dll`) backend.
//!
//! Wraps the Saitek/Logitech DirectOutput SDK as a
//! [`DeviceDriver`](crate::device::DeviceDriver).
//!
//! ## Callbacks
//! The SDK invokes callbacks on its own thread with a caller-chosen context
//! pointer. Each registration gets a boxed [`EventSink`] whose address is the
//! context; one `extern "system"` trampoline per callback kind casts it back
//! and enqueues a [`DriverEvent`]. The boxes live in this struct until
//! `deinitialize` returns, after which the SDK no longer calls back.
//!
//! Enumeration is synchronous: its context is a pointer to the caller's
//! visitor closure, valid only for the duration of `DirectOutput_Enumerate`.

#![cfg(target_os = "windows")]

use super::library::Library;
use crate::device::{DeviceDriver, DeviceHandle, DriverResult, PageId};
use crate::error::{DriverCode, Result};
use crate::event::{DriverEvent, EventSink};
use std::ffi::c_void;
use std::os::windows::ffi::OsStrExt;
use std::path::Path;

/// `dwFlags` for `DirectOutput_AddPage`: make the new page active.
const FLAG_SET_AS_ACTIVE: u32 = 0x0000_0001;

type HResult = i32;

type PfnDeviceChange = unsafe extern "system" fn(h_device: *mut c_void, added: bool, ctx: *mut c_void);
type PfnEnumerate = unsafe extern "system" fn(h_device: *mut c_void, ctx: *mut c_void);
type PfnPageChange =
    unsafe extern "system" fn(h_device: *mut c_void, page: u32, set_active: bool, ctx: *mut c_void);
type PfnSoftButtonChange =
    unsafe extern "system" fn(h_device: *mut c_void, buttons: u32, ctx: *mut c_void);

/// Resolved SDK entry points.
struct Api {
    initialize: unsafe extern "system" fn(app_name: *const u16) -> HResult,
    deinitialize: unsafe extern "system" fn() -> HResult,
    register_device_callback:
        unsafe extern "system" fn(f: PfnDeviceChange, ctx: *mut c_void) -> HResult,
    enumerate: unsafe extern "system" fn(f: PfnEnumerate, ctx: *mut c_void) -> HResult,
    register_page_callback:
        unsafe extern "system" fn(h: *mut c_void, f: PfnPageChange, ctx: *mut c_void) -> HResult,
    register_soft_button_callback: unsafe extern "system" fn(
        h: *mut c_void,
        f: PfnSoftButtonChange,
        ctx: *mut c_void,
    ) -> HResult,
    add_page: unsafe extern "system" fn(h: *mut c_void, page: u32, flags: u32) -> HResult,
    remove_page: unsafe extern "system" fn(h: *mut c_void, page: u32) -> HResult,
    set_led: unsafe extern "system" fn(h: *mut c_void, page: u32, led: u32, value: u32) -> HResult,
    set_string: unsafe extern "system" fn(
        h: *mut c_void,
        page: u32,
        line: u32,
        len: u32,
        text: *const u16,
    ) -> HResult,
    set_profile: unsafe extern "system" fn(h: *mut c_void, len: u32, path: *const u16) -> HResult,
}

macro_rules! resolve {
    ($lib:expr, $name:literal) => {{
        let ptr = $lib.symbol(concat!($name, "\0"))?;
        // SAFETY: the export has the documented DirectOutput signature.
        unsafe { std::mem::transmute::<*const c_void, _>(ptr) }
    }};
}

impl Api {
    fn load(lib: &Library) -> std::result::Result<Self, crate::error::LibraryError> {
        Ok(Self {
            initialize: resolve!(lib, "DirectOutput_Initialize"),
            deinitialize: resolve!(lib, "DirectOutput_Deinitialize"),
            register_device_callback: resolve!(lib, "DirectOutput_RegisterDeviceCallback"),
            enumerate: resolve!(lib, "DirectOutput_Enumerate"),
            register_page_callback: resolve!(lib, "DirectOutput_RegisterPageCallback"),
            register_soft_button_callback: resolve!(lib, "DirectOutput_RegisterSoftButtonCallback"),
            add_page: resolve!(lib, "DirectOutput_AddPage"),
            remove_page: resolve!(lib, "DirectOutput_RemovePage"),
            set_led: resolve!(lib, "DirectOutput_SetLed"),
            set_string: resolve!(lib, "DirectOutput_SetString"),
            set_profile: resolve!(lib, "DirectOutput_SetProfile"),
        })
    }
}

fn wide(s: impl AsRef<std::ffi::OsStr>) -> Vec<u16> {
    s.as_ref().encode_wide().collect()
}

fn handle_ptr(device: DeviceHandle) -> *mut c_void {
    device.0 as *mut c_void
}

unsafe extern "system" fn on_device_change(h_device: *mut c_void, added: bool, ctx: *mut c_void) {
    let sink = &*(ctx as *const EventSink);
    let device = DeviceHandle(h_device as usize);
    tracing::debug!(?device, added, "DirectOutput device callback");
    let _ = sink.send(DriverEvent::Device { device, added });
}

unsafe extern "system" fn on_enumerate(h_device: *mut c_void, ctx: *mut c_void) {
    let found = &mut *(ctx as *mut &mut dyn FnMut(DeviceHandle));
    found(DeviceHandle(h_device as usize));
}

unsafe extern "system" fn on_page_change(
    h_device: *mut c_void,
    page: u32,
    set_active: bool,
    ctx: *mut c_void,
) {
    let sink = &*(ctx as *const EventSink);
    let _ = sink.send(DriverEvent::Page {
        device: DeviceHandle(h_device as usize),
        page,
        active: set_active,
    });
}

unsafe extern "system" fn on_soft_button_change(h_device: *mut c_void, buttons: u32, ctx: *mut c_void) {
    let sink = &*(ctx as *const EventSink);
    let _ = sink.send(DriverEvent::SoftButtons {
        device: DeviceHandle(h_device as usize),
        buttons,
    });
}

/// DirectOutput-backed driver.
pub struct DirectOutputDriver {
    api: Api,
    /// Callback contexts; addresses handed to the SDK.
    sinks: Vec<Box<EventSink>>,
    // Declared last: the module is unloaded after everything above is dropped.
    library: Library,
}

impl DirectOutputDriver {
    /// Load the SDK from `explicit` or the default install location.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = super::library::locate(explicit);
        let library = Library::load(&path)?;
        let api = Api::load(&library)?;
        tracing::info!(path = %library.path().display(), "DirectOutput ready");
        Ok(Self {
            api,
            sinks: Vec::new(),
            library,
        })
    }

    /// Where the SDK was loaded from.
    pub fn library_path(&self) -> &Path {
        self.library.path()
    }

    fn keep(&mut self, sink: EventSink) -> *mut c_void {
        let boxed = Box::new(sink);
        let ptr = &*boxed as *const EventSink as *mut c_void;
        self.sinks.push(boxed);
        ptr
    }
}

fn check(call: &'static str, raw: HResult) -> DriverResult {
    tracing::trace!(call, raw, "DirectOutput call");
    DriverCode::check(raw)
}

impl DeviceDriver for DirectOutputDriver {
    fn initialize(&mut self, application_name: &str) -> DriverResult {
        let mut name = wide(application_name);
        name.push(0);
        check("Initialize", unsafe { (self.api.initialize)(name.as_ptr()) })
    }

    fn deinitialize(&mut self) -> DriverResult {
        let result = check("Deinitialize", unsafe { (self.api.deinitialize)() });
        // No callbacks after deinitialize; contexts can go.
        self.sinks.clear();
        result
    }

    fn register_device_callback(&mut self, sink: EventSink) -> DriverResult {
        let ctx = self.keep(sink);
        check("RegisterDeviceCallback", unsafe {
            (self.api.register_device_callback)(on_device_change, ctx)
        })
    }

    fn enumerate(&mut self, found: &mut dyn FnMut(DeviceHandle)) -> DriverResult {
        let mut visitor: &mut dyn FnMut(DeviceHandle) = found;
        let ctx = &mut visitor as *mut &mut dyn FnMut(DeviceHandle) as *mut c_void;
        check("Enumerate", unsafe { (self.api.enumerate)(on_enumerate, ctx) })
    }

    fn register_softbutton_callback(
        &mut self,
        device: DeviceHandle,
        sink: EventSink,
    ) -> DriverResult {
        let ctx = self.keep(sink);
        check("RegisterSoftButtonCallback", unsafe {
            (self.api.register_soft_button_callback)(handle_ptr(device), on_soft_button_change, ctx)
        })
    }

    fn register_page_callback(&mut self, device: DeviceHandle, sink: EventSink) -> DriverResult {
        let ctx = self.keep(sink);
        check("RegisterPageCallback", unsafe {
            (self.api.register_page_callback)(handle_ptr(device), on_page_change, ctx)
        })
    }

    fn add_page(&mut self, device: DeviceHandle, page: PageId, active: bool) -> DriverResult {
        let flags = if active { FLAG_SET_AS_ACTIVE } else { 0 };
        check("AddPage", unsafe {
            (self.api.add_page)(handle_ptr(device), page, flags)
        })
    }

    fn remove_page(&mut self, device: DeviceHandle, page: PageId) -> DriverResult {
        check("RemovePage", unsafe {
            (self.api.remove_page)(handle_ptr(device), page)
        })
    }

    fn set_string(
        &mut self,
        device: DeviceHandle,
        page: PageId,
        line: u32,
        text: &str,
    ) -> DriverResult {
        let text = wide(text);
        check("SetString", unsafe {
            (self.api.set_string)(handle_ptr(device), page, line, text.len() as u32, text.as_ptr())
        })
    }

    fn set_led(&mut self, device: DeviceHandle, page: PageId, led: u32, on: bool) -> DriverResult {
        check("SetLed", unsafe {
            (self.api.set_led)(handle_ptr(device), page, led, u32::from(on))
        })
    }

    fn set_profile(&mut self, device: DeviceHandle, profile: Option<&Path>) -> DriverResult {
        let raw = match profile {
            Some(path) => {
                let mut text = wide(path.as_os_str());
                let len = text.len() as u32;
                text.push(0);
                unsafe { (self.api.set_profile)(handle_ptr(device), len, text.as_ptr()) }
            }
            None => unsafe { (self.api.set_profile)(handle_ptr(device), 0, std::ptr::null()) },
        };
        check("SetProfile", raw)
    }
}
