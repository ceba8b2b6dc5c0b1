//! In-memory DirectOutput stand-in.
//!
//! [`VirtualDriver`] records every call, can be told to fail a given call with
//! a driver code, and lets the host feed soft-button, page and hot-plug
//! notifications as if they came from the unit.
//!
//! Clones share state: keep one clone as a probe after moving the other into a
//! [`Session`](crate::session::Session).

use crate::device::{DeviceDriver, DeviceHandle, DriverResult, PageId};
use crate::error::DriverCode;
use crate::event::{DriverEvent, EventSink};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Handle reported for the first virtual unit.
pub const FIRST_HANDLE: DeviceHandle = DeviceHandle(0x5a17_0001);

/// Driver entry points, for failure injection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DriverOp {
    Initialize,
    Deinitialize,
    RegisterDeviceCallback,
    Enumerate,
    RegisterSoftButtonCallback,
    RegisterPageCallback,
    AddPage,
    RemovePage,
    SetString,
    SetLed,
    SetProfile,
}

/// One recorded driver call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DriverCall {
    Initialize(String),
    Deinitialize,
    RegisterDeviceCallback,
    Enumerate,
    RegisterSoftButtonCallback(DeviceHandle),
    RegisterPageCallback(DeviceHandle),
    AddPage { page: PageId, active: bool },
    RemovePage(PageId),
    SetString { page: PageId, line: u32, text: String },
    SetLed { page: PageId, led: u32, on: bool },
    SetProfile(Option<PathBuf>),
}

impl DriverCall {
    fn op(&self) -> DriverOp {
        match self {
            DriverCall::Initialize(_) => DriverOp::Initialize,
            DriverCall::Deinitialize => DriverOp::Deinitialize,
            DriverCall::RegisterDeviceCallback => DriverOp::RegisterDeviceCallback,
            DriverCall::Enumerate => DriverOp::Enumerate,
            DriverCall::RegisterSoftButtonCallback(_) => DriverOp::RegisterSoftButtonCallback,
            DriverCall::RegisterPageCallback(_) => DriverOp::RegisterPageCallback,
            DriverCall::AddPage { .. } => DriverOp::AddPage,
            DriverCall::RemovePage(_) => DriverOp::RemovePage,
            DriverCall::SetString { .. } => DriverOp::SetString,
            DriverCall::SetLed { .. } => DriverOp::SetLed,
            DriverCall::SetProfile(_) => DriverOp::SetProfile,
        }
    }
}

#[derive(Debug, Default)]
struct VirtualState {
    devices: Vec<DeviceHandle>,
    initialized: bool,
    calls: Vec<DriverCall>,
    failures: HashMap<DriverOp, DriverCode>,
    device_sink: Option<EventSink>,
    button_sinks: HashMap<DeviceHandle, EventSink>,
    page_sinks: HashMap<DeviceHandle, EventSink>,
    /// Registered pages per device; `true` = active.
    pages: BTreeMap<PageId, bool>,
}

#[derive(Clone, Debug, Default)]
pub struct VirtualDriver {
    state: Arc<Mutex<VirtualState>>,
}

impl VirtualDriver {
    /// One attached unit.
    pub fn new() -> Self {
        Self::with_devices(1)
    }

    /// `count` attached units with distinct handles.
    pub fn with_devices(count: usize) -> Self {
        let driver = Self::default();
        driver.lock().devices = (0..count).map(|i| DeviceHandle(FIRST_HANDLE.0 + i)).collect();
        driver
    }

    /// Units reported by enumeration, in order. Repeats are reported as
    /// given, the way the driver may list one unit more than once.
    pub fn with_handles(handles: &[DeviceHandle]) -> Self {
        let driver = Self::default();
        driver.lock().devices = handles.to_vec();
        driver
    }

    fn lock(&self) -> MutexGuard<'_, VirtualState> {
        // A panicking test thread must not hide the recorded calls from the rest.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make every later call of `op` fail with `code`.
    pub fn fail_on(&self, op: DriverOp, code: DriverCode) {
        self.lock().failures.insert(op, code);
    }

    pub fn clear_failures(&self) {
        self.lock().failures.clear();
    }

    /// Snapshot of all recorded calls, oldest first.
    pub fn calls(&self) -> Vec<DriverCall> {
        self.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn is_initialized(&self) -> bool {
        self.lock().initialized
    }

    /// Pages currently registered, with their active flag.
    pub fn registered_pages(&self) -> BTreeMap<PageId, bool> {
        self.lock().pages.clone()
    }

    /// Most recent string written to `page`/`line`.
    pub fn last_line(&self, page: PageId, line: u32) -> Option<String> {
        self.lock().calls.iter().rev().find_map(|c| match c {
            DriverCall::SetString { page: p, line: l, text } if *p == page && *l == line => {
                Some(text.clone())
            }
            _ => None,
        })
    }

    /// The three most recent lines written to `page`.
    pub fn screen(&self, page: PageId) -> [Option<String>; 3] {
        [
            self.last_line(page, 0),
            self.last_line(page, 1),
            self.last_line(page, 2),
        ]
    }

    fn first_device(&self) -> Option<DeviceHandle> {
        self.lock().devices.first().copied()
    }

    /// Simulate a soft-button change on the first unit. Returns `false` if no
    /// soft-button callback is registered.
    pub fn press(&self, buttons: u32) -> bool {
        let Some(device) = self.first_device() else {
            return false;
        };
        let state = self.lock();
        match state.button_sinks.get(&device) {
            Some(sink) => sink
                .send(DriverEvent::SoftButtons { device, buttons })
                .is_ok(),
            None => false,
        }
    }

    /// Simulate the user paging on the first unit.
    pub fn switch_page(&self, page: PageId, active: bool) -> bool {
        let Some(device) = self.first_device() else {
            return false;
        };
        let mut state = self.lock();
        if let Some(flag) = state.pages.get_mut(&page) {
            *flag = active;
        }
        match state.page_sinks.get(&device) {
            Some(sink) => sink
                .send(DriverEvent::Page {
                    device,
                    page,
                    active,
                })
                .is_ok(),
            None => false,
        }
    }

    /// Simulate a unit being attached with `device` as its handle.
    pub fn plug(&self, device: DeviceHandle) -> bool {
        let mut state = self.lock();
        if !state.devices.contains(&device) {
            state.devices.push(device);
        }
        Self::notify_device(&state, device, true)
    }

    /// Simulate the first unit being detached.
    pub fn unplug(&self) -> bool {
        let mut state = self.lock();
        if state.devices.is_empty() {
            return false;
        }
        let device = state.devices.remove(0);
        Self::notify_device(&state, device, false)
    }

    fn notify_device(state: &VirtualState, device: DeviceHandle, added: bool) -> bool {
        match &state.device_sink {
            Some(sink) => sink.send(DriverEvent::Device { device, added }).is_ok(),
            None => false,
        }
    }

    /// Record `call`, then fail it if injected, else run `apply`.
    fn record(
        &mut self,
        call: DriverCall,
        apply: impl FnOnce(&mut VirtualState) -> DriverResult,
    ) -> DriverResult {
        let mut state = self.lock();
        let op = call.op();
        state.calls.push(call);
        if let Some(code) = state.failures.get(&op) {
            return Err(*code);
        }
        if op != DriverOp::Initialize && !state.initialized {
            return Err(DriverCode::InvalidHandle);
        }
        apply(&mut state)
    }

    fn check_device(state: &VirtualState, device: DeviceHandle) -> DriverResult {
        if state.devices.contains(&device) {
            Ok(())
        } else {
            Err(DriverCode::InvalidHandle)
        }
    }
}

impl DeviceDriver for VirtualDriver {
    fn initialize(&mut self, application_name: &str) -> DriverResult {
        self.record(DriverCall::Initialize(application_name.to_string()), |s| {
            s.initialized = true;
            Ok(())
        })
    }

    fn deinitialize(&mut self) -> DriverResult {
        self.record(DriverCall::Deinitialize, |s| {
            s.initialized = false;
            s.device_sink = None;
            s.button_sinks.clear();
            s.page_sinks.clear();
            s.pages.clear();
            Ok(())
        })
    }

    fn register_device_callback(&mut self, sink: EventSink) -> DriverResult {
        self.record(DriverCall::RegisterDeviceCallback, |s| {
            s.device_sink = Some(sink);
            Ok(())
        })
    }

    fn enumerate(&mut self, found: &mut dyn FnMut(DeviceHandle)) -> DriverResult {
        let devices = {
            let devices = self.lock().devices.clone();
            self.record(DriverCall::Enumerate, |_| Ok(()))?;
            devices
        };
        for device in devices {
            found(device);
        }
        Ok(())
    }

    fn register_softbutton_callback(
        &mut self,
        device: DeviceHandle,
        sink: EventSink,
    ) -> DriverResult {
        self.record(DriverCall::RegisterSoftButtonCallback(device), |s| {
            Self::check_device(s, device)?;
            s.button_sinks.insert(device, sink);
            Ok(())
        })
    }

    fn register_page_callback(&mut self, device: DeviceHandle, sink: EventSink) -> DriverResult {
        self.record(DriverCall::RegisterPageCallback(device), |s| {
            Self::check_device(s, device)?;
            s.page_sinks.insert(device, sink);
            Ok(())
        })
    }

    fn add_page(&mut self, device: DeviceHandle, page: PageId, active: bool) -> DriverResult {
        self.record(DriverCall::AddPage { page, active }, |s| {
            Self::check_device(s, device)?;
            if s.pages.contains_key(&page) {
                return Err(DriverCode::InvalidArgument);
            }
            if active {
                s.pages.values_mut().for_each(|a| *a = false);
            }
            s.pages.insert(page, active);
            Ok(())
        })
    }

    fn remove_page(&mut self, device: DeviceHandle, page: PageId) -> DriverResult {
        self.record(DriverCall::RemovePage(page), |s| {
            Self::check_device(s, device)?;
            s.pages
                .remove(&page)
                .map(|_| ())
                .ok_or(DriverCode::InvalidArgument)
        })
    }

    fn set_string(
        &mut self,
        device: DeviceHandle,
        page: PageId,
        line: u32,
        text: &str,
    ) -> DriverResult {
        let call = DriverCall::SetString {
            page,
            line,
            text: text.to_string(),
        };
        self.record(call, |s| {
            Self::check_device(s, device)?;
            if line > 2 || !s.pages.contains_key(&page) {
                return Err(DriverCode::InvalidArgument);
            }
            Ok(())
        })
    }

    fn set_led(&mut self, device: DeviceHandle, page: PageId, led: u32, on: bool) -> DriverResult {
        self.record(DriverCall::SetLed { page, led, on }, |s| {
            Self::check_device(s, device)?;
            if led >= crate::leds::LED_COUNT as u32 || !s.pages.contains_key(&page) {
                return Err(DriverCode::InvalidArgument);
            }
            Ok(())
        })
    }

    fn set_profile(&mut self, device: DeviceHandle, profile: Option<&Path>) -> DriverResult {
        self.record(DriverCall::SetProfile(profile.map(Path::to_path_buf)), |s| {
            Self::check_device(s, device)
        })
    }
}
