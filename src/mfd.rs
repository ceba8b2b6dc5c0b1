//! MFD façade: one session, one page, one navigation controller.
//!
//! [`Mfd`] wires the pieces the way a host normally wants them:
//! - on construction it adds an active page, loads the content source, applies
//!   the source's profile and shows the first view;
//! - [`Mfd::pump`] drains queued notifications, feeds accepted soft-button
//!   events to the navigation controller and re-renders;
//! - [`Mfd::run`] blocks on the queue until asked to stop.
//!
//! Driver failures surface as fatal errors; the session is already closed when
//! they reach the caller.

use crate::config::Config;
use crate::content::ContentSource;
use crate::device::{DeviceDriver, PageId};
use crate::error::Result;
use crate::event::{ButtonEvent, SessionEvent};
use crate::leds::{Indicator, LedColour, LED_COUNT};
use crate::nav::{NavigationController, Outcome};
use crate::page::{PageHandle, LINE_COUNT};
use crate::session::Session;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Frame time of the attention animation.
pub const ATTENTION_FRAME: Duration = Duration::from_millis(20);

/// How long [`Mfd::run`] waits on the queue before re-checking its stop flag.
const RUN_POLL: Duration = Duration::from_millis(100);

/// Construction options.
#[derive(Clone, Debug)]
pub struct MfdOptions {
    pub page_name: String,
    pub placeholder: String,
    /// Overrides the content source's profile.
    pub profile: Option<PathBuf>,
}

impl Default for MfdOptions {
    fn default() -> Self {
        let cfg = Config::default();
        Self {
            page_name: cfg.page_name,
            placeholder: cfg.placeholder,
            profile: None,
        }
    }
}

impl From<&Config> for MfdOptions {
    fn from(cfg: &Config) -> Self {
        Self {
            page_name: cfg.page_name.clone(),
            placeholder: cfg.placeholder.clone(),
            profile: cfg.profile.clone(),
        }
    }
}

pub struct Mfd<D: DeviceDriver> {
    session: Session<D>,
    page: PageHandle,
    nav: NavigationController,
    /// Entry chosen last in a list-only view.
    chosen: Option<String>,
}

impl<D: DeviceDriver> Mfd<D> {
    pub fn new(
        mut session: Session<D>,
        source: &mut dyn ContentSource,
        options: MfdOptions,
    ) -> Result<Self> {
        let page = session.add_page(&options.page_name, true)?;
        let content = source.load()?;
        let nav = NavigationController::from_content(content).with_placeholder(options.placeholder);

        if let Some(profile) = options.profile.or_else(|| source.profile()) {
            // Profile failures are reported but not fatal.
            if let Err(e) = session.set_profile(Some(&profile)) {
                tracing::warn!(error = %e, profile = %profile.display(), "could not set profile");
            }
        }

        let mut mfd = Self {
            session,
            page,
            nav,
            chosen: None,
        };
        mfd.show()?;
        Ok(mfd)
    }

    pub fn session(&self) -> &Session<D> {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session<D> {
        &mut self.session
    }

    pub fn page_id(&self) -> PageId {
        self.page.id()
    }

    pub fn navigation(&self) -> &NavigationController {
        &self.nav
    }

    pub fn chosen(&self) -> Option<&str> {
        self.chosen.as_deref()
    }

    /// Render the navigation state onto the page.
    pub fn show(&mut self) -> Result<()> {
        let [a, b, c] = self.nav.render();
        self.session
            .display(&self.page, [a.as_str(), b.as_str(), c.as_str()])
    }

    /// Write three lines, then optionally hold them for `delay`.
    pub fn display(&mut self, lines: [&str; LINE_COUNT], delay: Option<Duration>) -> Result<()> {
        self.session.display(&self.page, lines)?;
        if let Some(delay) = delay {
            std::thread::sleep(delay);
        }
        Ok(())
    }

    pub fn set_indicator(&mut self, indicator: Indicator, colour: LedColour) -> Result<()> {
        self.session.set_indicator(&self.page, indicator, colour)
    }

    /// Apply decoded buttons and re-render if the view accepted them.
    pub fn press(&mut self, buttons: ButtonEvent) -> Result<Outcome> {
        let outcome = self.nav.apply(buttons);
        if let Some(entry) = &outcome.chosen {
            tracing::info!(%entry, "entry chosen");
            self.chosen = Some(entry.clone());
        }
        if outcome.accepted {
            self.show()?;
        }
        Ok(outcome)
    }

    /// React to one session event.
    pub fn handle(&mut self, event: SessionEvent) -> Result<()> {
        match event {
            SessionEvent::Buttons(buttons) => {
                self.press(buttons)?;
            }
            // The session already replayed the buffer, which holds the last render.
            SessionEvent::PageActivated(_) | SessionEvent::PageDeactivated(_) => {}
        }
        Ok(())
    }

    /// Drain queued notifications. Returns how many events were handled.
    pub fn pump(&mut self) -> Result<usize> {
        let events = self.session.poll_events()?;
        for event in &events {
            self.handle(*event)?;
        }
        Ok(events.len())
    }

    /// Process notifications until `stop` is set. Returns early on fatal errors.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<()> {
        while !stop.load(Ordering::Relaxed) {
            if let Some(event) = self.session.wait_event(RUN_POLL)? {
                self.handle(event)?;
            }
        }
        Ok(())
    }

    /// Flash all LEDs for `duration`, or until `cancel` is set.
    ///
    /// On frame `i`, LED `n` is lit iff `(i + n) % 4 != 0`.
    pub fn attention(&mut self, duration: Duration, cancel: &AtomicBool) -> Result<()> {
        let cutoff = Instant::now() + duration;
        let mut frame = 0usize;
        while Instant::now() <= cutoff && !cancel.load(Ordering::Relaxed) {
            for led in 0..LED_COUNT {
                self.session
                    .set_led(&self.page, led, attention_level(frame, led))?;
            }
            frame += 1;
            std::thread::sleep(ATTENTION_FRAME);
        }
        Ok(())
    }

    /// Close the session (idempotent; also happens on drop).
    pub fn finish(&mut self) {
        self.session.close();
    }
}

fn attention_level(frame: usize, led: usize) -> bool {
    (frame + led) % 4 != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attention_pattern_rotates() {
        let f0: Vec<bool> = (0..8).map(|led| attention_level(0, led)).collect();
        assert_eq!(f0, [false, true, true, true, false, true, true, true]);
        let f1: Vec<bool> = (0..4).map(|led| attention_level(1, led)).collect();
        assert_eq!(f1, [true, true, true, false]);
    }
}
