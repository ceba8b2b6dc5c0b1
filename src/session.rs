//! Device session: one driver connection, its pages, and its notification queue.
//!
//! [`Session::open`] brings the driver up and binds exactly one device.
//! After that, the session is the only writer to the device: every page and LED
//! write goes through it, and every driver notification is drained from its
//! queue on the owner's thread.
//!
//! # Failure policy
//! Driver errors are not retried. A failed page add/remove or display/LED write
//! closes the session before the error is returned; later calls fail with
//! [`Error::DeviceGone`]. Validation errors (bad line/LED index, unknown page)
//! leave the session open.
//!
//! # Teardown
//! [`Session::close`] is idempotent and runs on drop.

use crate::device::{DeviceDriver, DeviceHandle, PageId};
use crate::error::{Error, Result};
use crate::event::{ButtonEvent, DriverEvent, EventSink, QueuedEvent, SessionEvent};
use crate::leds::{Indicator, LedColour};
use crate::page::{Page, PageHandle, PageOutput, LINE_COUNT};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::time::{Duration, Instant};

/// Default soft-button debounce window.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

/// Session-wide debounce clock over monotonic milliseconds.
#[derive(Clone, Debug)]
pub struct Debounce {
    window_ms: u64,
    last_accepted: Option<u64>,
}

impl Debounce {
    pub fn new(window: Duration) -> Self {
        Self {
            window_ms: window.as_millis() as u64,
            last_accepted: None,
        }
    }

    /// Accept an event at `now_ms` unless it falls inside the window of the last accepted one.
    pub fn accept(&mut self, now_ms: u64) -> bool {
        if let Some(last) = self.last_accepted {
            if now_ms.saturating_sub(last) < self.window_ms {
                return false;
            }
        }
        self.last_accepted = Some(now_ms);
        true
    }
}

/// Driver + handle pair that pages write through.
struct DriverLink<'a, D: DeviceDriver> {
    driver: &'a mut D,
    device: DeviceHandle,
}

impl<D: DeviceDriver> PageOutput for DriverLink<'_, D> {
    fn set_string(&mut self, page: PageId, line: usize, text: &str) -> Result<()> {
        tracing::trace!(page, line, text, "set_string");
        self.driver
            .set_string(self.device, page, line as u32, text)
            .map_err(Error::driver("set_string"))
    }

    fn set_led(&mut self, page: PageId, led: usize, on: bool) -> Result<()> {
        tracing::trace!(page, led, on, "set_led");
        self.driver
            .set_led(self.device, page, led as u32, on)
            .map_err(Error::driver("set_led"))
    }
}

pub struct Session<D: DeviceDriver> {
    driver: D,
    /// `None` once closed.
    device: Option<DeviceHandle>,
    pages: BTreeMap<PageId, Page>,
    next_page_id: PageId,
    events: Receiver<QueuedEvent>,
    debounce: Debounce,
    epoch: Instant,
}

impl<D: DeviceDriver> Session<D> {
    /// Initialize `driver`, bind the single attached device and register callbacks.
    ///
    /// On failure after `initialize`, the driver is deinitialized before returning.
    pub fn open(driver: D, application_name: &str) -> Result<Self> {
        Self::open_with_debounce(driver, application_name, DEFAULT_DEBOUNCE)
    }

    pub fn open_with_debounce(
        mut driver: D,
        application_name: &str,
        debounce: Duration,
    ) -> Result<Self> {
        tracing::info!(application_name, "opening device session");
        let epoch = Instant::now();
        driver
            .initialize(application_name)
            .map_err(Error::driver("initialize"))?;

        let (sink, events) = EventSink::channel();
        let device = match Self::bind(&mut driver, &sink) {
            Ok(device) => device,
            Err(e) => {
                tracing::warn!(error = %e, "session open failed; deinitializing");
                if let Err(code) = driver.deinitialize() {
                    tracing::warn!(%code, "deinitialize after failed open");
                }
                return Err(e);
            }
        };
        tracing::info!(?device, "device session open");

        Ok(Self {
            driver,
            device: Some(device),
            pages: BTreeMap::new(),
            next_page_id: 0,
            events,
            debounce: Debounce::new(debounce),
            epoch,
        })
    }

    fn bind(driver: &mut D, sink: &EventSink) -> Result<DeviceHandle> {
        driver
            .register_device_callback(sink.clone())
            .map_err(Error::driver("register_device_callback"))?;

        let mut found: Vec<DeviceHandle> = Vec::new();
        driver
            .enumerate(&mut |device| {
                tracing::debug!(?device, "enumerated device");
                if !found.contains(&device) {
                    found.push(device);
                }
            })
            .map_err(Error::driver("enumerate"))?;

        let device = match found.as_slice() {
            [] => return Err(Error::NoDeviceFound),
            [one] => *one,
            many => return Err(Error::TooManyDevices(many.len())),
        };

        driver
            .register_softbutton_callback(device, sink.clone())
            .map_err(Error::driver("register_softbutton_callback"))?;
        driver
            .register_page_callback(device, sink.clone())
            .map_err(Error::driver("register_page_callback"))?;
        Ok(device)
    }

    pub fn is_open(&self) -> bool {
        self.device.is_some()
    }

    pub fn device(&self) -> Option<DeviceHandle> {
        self.device
    }

    /// Milliseconds since the session opened (the debounce clock).
    pub fn now_ms(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    /// `at` on the debounce clock.
    fn clock_ms(&self, at: Instant) -> u64 {
        at.saturating_duration_since(self.epoch).as_millis() as u64
    }

    /// Dispatch a queued notification at the time it arrived.
    fn dispatch_queued(&mut self, queued: QueuedEvent) -> Result<Option<SessionEvent>> {
        let at = self.clock_ms(queued.at);
        self.dispatch_at(queued.event, at)
    }

    /// Borrow the driver, e.g. to inspect a test backend.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    fn live_device(&self) -> Result<DeviceHandle> {
        self.device.ok_or(Error::DeviceGone)
    }

    /// Close on fatal errors, pass everything else through.
    fn escalate<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if e.is_fatal() {
                tracing::error!(error = %e, "fatal device error; closing session");
                self.close();
            }
        }
        result
    }

    /// Register a new page. Ids are assigned sequentially from 0.
    pub fn add_page(&mut self, name: &str, active: bool) -> Result<PageHandle> {
        let device = self.live_device()?;
        let id = self.next_page_id;
        tracing::info!(page = id, name, active, "add page");
        let added = self
            .driver
            .add_page(device, id, active)
            .map_err(Error::driver("add_page"));
        self.escalate(added)?;

        self.next_page_id += 1;
        self.pages.insert(id, Page::new(id, name, active));
        Ok(PageHandle::new(id))
    }

    /// Deregister and drop a page.
    pub fn remove_page(&mut self, handle: PageHandle) -> Result<()> {
        let device = self.live_device()?;
        let id = handle.id();
        if !self.pages.contains_key(&id) {
            return Err(Error::UnknownPage(id));
        }
        tracing::info!(page = id, "remove page");
        let removed = self
            .driver
            .remove_page(device, id)
            .map_err(Error::driver("remove_page"));
        self.pages.remove(&id);
        self.escalate(removed)
    }

    pub fn page(&self, handle: &PageHandle) -> Option<&Page> {
        self.pages.get(&handle.id())
    }

    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.values()
    }

    /// Run `f` against a page with the driver link, closing the session on fatal errors.
    fn with_page<T>(
        &mut self,
        id: PageId,
        f: impl FnOnce(&mut Page, &mut dyn PageOutput) -> Result<T>,
    ) -> Result<T> {
        let device = self.live_device()?;
        let page = self.pages.get_mut(&id).ok_or(Error::UnknownPage(id))?;
        let mut link = DriverLink {
            driver: &mut self.driver,
            device,
        };
        let result = f(page, &mut link);
        self.escalate(result)
    }

    pub fn write_line(
        &mut self,
        page: &PageHandle,
        index: usize,
        text: impl Into<String>,
    ) -> Result<()> {
        let text = text.into();
        self.with_page(page.id(), |p, out| p.write_line(out, index, text))
    }

    /// Write all three lines, top to bottom.
    pub fn display(&mut self, page: &PageHandle, lines: [&str; LINE_COUNT]) -> Result<()> {
        self.with_page(page.id(), |p, out| {
            for (index, text) in lines.iter().enumerate() {
                p.write_line(out, index, *text)?;
            }
            Ok(())
        })
    }

    pub fn set_led(&mut self, page: &PageHandle, index: usize, on: bool) -> Result<()> {
        self.with_page(page.id(), |p, out| p.set_led(out, index, on))
    }

    pub fn set_led_colour(
        &mut self,
        page: &PageHandle,
        colour: LedColour,
        red_led: usize,
        green_led: usize,
    ) -> Result<()> {
        self.with_page(page.id(), |p, out| {
            p.set_led_colour(out, colour, red_led, green_led)
        })
    }

    pub fn set_indicator(
        &mut self,
        page: &PageHandle,
        indicator: Indicator,
        colour: LedColour,
    ) -> Result<()> {
        self.with_page(page.id(), |p, out| p.set_indicator(out, indicator, colour))
    }

    /// Replay a page's buffer to the device.
    pub fn refresh(&mut self, page: &PageHandle) -> Result<()> {
        self.with_page(page.id(), |p, out| p.refresh(out))
    }

    /// Activate a profile file (made absolute), or clear it with `None`.
    ///
    /// A failure is returned but does not close the session.
    pub fn set_profile(&mut self, profile: Option<&Path>) -> Result<()> {
        let device = self.live_device()?;
        let absolute = match profile {
            Some(p) if p.is_relative() => Some(
                std::env::current_dir()
                    .map(|cwd| cwd.join(p))
                    .unwrap_or_else(|_| p.to_path_buf()),
            ),
            Some(p) => Some(p.to_path_buf()),
            None => None,
        };
        tracing::info!(profile = ?absolute, "set profile");
        self.driver
            .set_profile(device, absolute.as_deref())
            .map_err(Error::driver("set_profile"))
    }

    /// Remove every page, deinitialize the driver and invalidate the handle.
    ///
    /// Safe to call any number of times; only the first call touches the driver.
    pub fn close(&mut self) {
        let Some(device) = self.device.take() else {
            return;
        };
        tracing::info!(?device, pages = self.pages.len(), "closing device session");
        for id in self.pages.keys() {
            if let Err(code) = self.driver.remove_page(device, *id) {
                tracing::warn!(page = *id, %code, "remove_page during close");
            }
        }
        self.pages.clear();
        if let Err(code) = self.driver.deinitialize() {
            tracing::warn!(%code, "deinitialize during close");
        }
    }

    /// Apply one notification at the current session clock.
    pub fn dispatch(&mut self, event: DriverEvent) -> Result<Option<SessionEvent>> {
        let now = self.now_ms();
        self.dispatch_at(event, now)
    }

    /// Apply one notification at an explicit debounce time.
    pub fn dispatch_at(&mut self, event: DriverEvent, now_ms: u64) -> Result<Option<SessionEvent>> {
        let ours = self.live_device()?;
        match event {
            DriverEvent::Device { device, added } => {
                if device != ours {
                    if added {
                        tracing::warn!(?device, "second device attached; ignoring (one device supported)");
                    }
                    return Ok(None);
                }
                if added {
                    return Ok(None);
                }
                tracing::error!(?device, "device removed");
                self.close();
                Err(Error::DeviceGone)
            }
            DriverEvent::Page {
                device,
                page,
                active,
            } => {
                if device != ours {
                    return Ok(None);
                }
                let Some(p) = self.pages.get_mut(&page) else {
                    tracing::debug!(page, active, "notification for unknown page");
                    return Ok(None);
                };
                p.set_active(active);
                if !active {
                    tracing::debug!(page, "page deactivated");
                    return Ok(Some(SessionEvent::PageDeactivated(page)));
                }
                tracing::debug!(page, "page activated; refreshing");
                self.with_page(page, |p, out| p.refresh(out))?;
                Ok(Some(SessionEvent::PageActivated(page)))
            }
            DriverEvent::SoftButtons { device, buttons } => {
                if device != ours {
                    return Ok(None);
                }
                if !self.debounce.accept(now_ms) {
                    tracing::debug!(buttons, now_ms, "soft buttons debounced");
                    return Ok(None);
                }
                let decoded = ButtonEvent::from_mask(buttons);
                tracing::debug!(%decoded, "soft buttons");
                Ok(Some(SessionEvent::Buttons(decoded)))
            }
        }
    }

    /// Drain every queued notification without blocking. Buttons are debounced
    /// on their arrival time, not on when they are drained.
    pub fn poll_events(&mut self) -> Result<Vec<SessionEvent>> {
        self.live_device()?;
        let mut out = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(queued) => {
                    if let Some(ev) = self.dispatch_queued(queued)? {
                        out.push(ev);
                    }
                }
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => return Ok(out),
            }
        }
    }

    /// Block up to `timeout` for the next notification that means something.
    pub fn wait_event(&mut self, timeout: Duration) -> Result<Option<SessionEvent>> {
        self.live_device()?;
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.events.recv_timeout(remaining) {
                Ok(queued) => {
                    if let Some(ev) = self.dispatch_queued(queued)? {
                        return Ok(Some(ev));
                    }
                }
                Err(RecvTimeoutError::Timeout) => return Ok(None),
                Err(RecvTimeoutError::Disconnected) => {
                    // Backend dropped its sinks; nothing will arrive.
                    std::thread::sleep(remaining);
                    return Ok(None);
                }
            }
        }
    }
}

impl<D: DeviceDriver> Drop for Session<D> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<D: DeviceDriver> std::fmt::Debug for Session<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("device", &self.device)
            .field("pages", &self.pages.len())
            .field("next_page_id", &self.next_page_id)
            .finish()
    }
}
