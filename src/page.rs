//! Buffered MFD page.
//!
//! A [`Page`] owns three text lines and an LED table. Every write lands in the
//! buffer first and is forwarded to the device only while the page is active,
//! so a later [`Page::refresh`] can replay the exact state after the user pages
//! back to it.
//!
//! Pages do not hold the driver. Callers pass a [`PageOutput`] per call; inside
//! the crate that is the session's driver link.

use crate::device::PageId;
use crate::error::{Error, Result};
use crate::leds::{Indicator, LedColour, LedSlot, LED_COUNT};

/// Number of text lines on the MFD.
pub const LINE_COUNT: usize = 3;

/// Where an active page sends its writes.
pub trait PageOutput {
    fn set_string(&mut self, page: PageId, line: usize, text: &str) -> Result<()>;
    fn set_led(&mut self, page: PageId, led: usize, on: bool) -> Result<()>;
}

/// Ownership token for a page registered with a session.
///
/// Not `Clone`: removing the page consumes it.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct PageHandle {
    id: PageId,
}

impl PageHandle {
    pub(crate) fn new(id: PageId) -> Self {
        Self { id }
    }

    pub fn id(&self) -> PageId {
        self.id
    }
}

#[derive(Clone, Debug)]
pub struct Page {
    id: PageId,
    name: String,
    lines: [String; LINE_COUNT],
    /// `None` = never set (treated as off, not replayed).
    leds: [Option<bool>; LED_COUNT],
    active: bool,
}

impl Page {
    pub fn new(id: PageId, name: impl Into<String>, active: bool) -> Self {
        Self {
            id,
            name: name.into(),
            lines: Default::default(),
            leds: [None; LED_COUNT],
            active,
        }
    }

    pub fn id(&self) -> PageId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Buffered line `index`, if in range.
    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub fn lines(&self) -> &[String; LINE_COUNT] {
        &self.lines
    }

    /// Buffered LED state (`false` when never set).
    pub fn led(&self, index: usize) -> bool {
        self.leds.get(index).copied().flatten().unwrap_or(false)
    }

    /// LEDs that have been set, in index order.
    pub fn buffered_leds(&self) -> impl Iterator<Item = (usize, bool)> + '_ {
        self.leds
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|on| (i, on)))
    }

    pub fn write_line(
        &mut self,
        out: &mut dyn PageOutput,
        index: usize,
        text: impl Into<String>,
    ) -> Result<()> {
        if index >= LINE_COUNT {
            return Err(Error::InvalidLineIndex(index));
        }
        let text = text.into();
        self.lines[index] = text;
        if self.active {
            out.set_string(self.id, index, &self.lines[index])?;
        }
        Ok(())
    }

    pub fn set_led(&mut self, out: &mut dyn PageOutput, index: usize, on: bool) -> Result<()> {
        let slot = self
            .leds
            .get_mut(index)
            .ok_or(Error::InvalidLedIndex(index))?;
        *slot = Some(on);
        if self.active {
            out.set_led(self.id, index, on)?;
        }
        Ok(())
    }

    /// Drive a red/green pair as one bicolor indicator.
    pub fn set_led_colour(
        &mut self,
        out: &mut dyn PageOutput,
        colour: LedColour,
        red_led: usize,
        green_led: usize,
    ) -> Result<()> {
        let (red, green) = colour.levels();
        self.set_led(out, red_led, red)?;
        self.set_led(out, green_led, green)
    }

    /// Set a named indicator. Single LEDs are lit for any colour except `Off`.
    pub fn set_indicator(
        &mut self,
        out: &mut dyn PageOutput,
        indicator: Indicator,
        colour: LedColour,
    ) -> Result<()> {
        match indicator.slot() {
            LedSlot::Single(led) => self.set_led(out, led, colour != LedColour::Off),
            LedSlot::Pair { red, green } => self.set_led_colour(out, colour, red, green),
        }
    }

    /// Re-send every line, then every buffered LED, regardless of `active`.
    pub fn refresh(&self, out: &mut dyn PageOutput) -> Result<()> {
        for (index, text) in self.lines.iter().enumerate() {
            out.set_string(self.id, index, text)?;
        }
        for (led, on) in self.buffered_leds() {
            out.set_led(self.id, led, on)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DriverCode;

    #[derive(Debug, PartialEq)]
    enum Write {
        Line(usize, String),
        Led(usize, bool),
    }

    #[derive(Default)]
    struct Recorder {
        writes: Vec<Write>,
        fail: bool,
    }

    impl PageOutput for Recorder {
        fn set_string(&mut self, _page: PageId, line: usize, text: &str) -> Result<()> {
            if self.fail {
                return Err(Error::driver("set_string")(DriverCode::PageNotActive));
            }
            self.writes.push(Write::Line(line, text.to_string()));
            Ok(())
        }

        fn set_led(&mut self, _page: PageId, led: usize, on: bool) -> Result<()> {
            if self.fail {
                return Err(Error::driver("set_led")(DriverCode::PageNotActive));
            }
            self.writes.push(Write::Led(led, on));
            Ok(())
        }
    }

    #[test]
    fn inactive_page_only_buffers() {
        let mut out = Recorder::default();
        let mut page = Page::new(1, "Other", false);
        page.write_line(&mut out, 0, "hello").unwrap();
        page.set_led(&mut out, 3, true).unwrap();
        assert!(out.writes.is_empty());
        assert_eq!(page.line(0), Some("hello"));
        assert!(page.led(3));
    }

    #[test]
    fn active_page_forwards_writes() {
        let mut out = Recorder::default();
        let mut page = Page::new(0, "MFD", true);
        page.write_line(&mut out, 2, "bottom").unwrap();
        page.set_led(&mut out, 19, true).unwrap();
        assert_eq!(
            out.writes,
            vec![Write::Line(2, "bottom".into()), Write::Led(19, true)]
        );
    }

    #[test]
    fn invalid_line_leaves_buffer_unchanged() {
        let mut out = Recorder::default();
        let mut page = Page::new(0, "MFD", true);
        page.write_line(&mut out, 0, "keep").unwrap();
        let err = page.write_line(&mut out, 5, "FAIL").unwrap_err();
        assert!(matches!(err, Error::InvalidLineIndex(5)));
        assert_eq!(page.lines(), &["keep".to_string(), String::new(), String::new()]);
        assert_eq!(out.writes.len(), 1);
    }

    #[test]
    fn invalid_led_is_rejected() {
        let mut out = Recorder::default();
        let mut page = Page::new(0, "MFD", true);
        assert!(matches!(
            page.set_led(&mut out, LED_COUNT, true),
            Err(Error::InvalidLedIndex(20))
        ));
    }

    #[test]
    fn refresh_replays_lines_then_leds_in_order() {
        let mut out = Recorder::default();
        let mut page = Page::new(0, "MFD", false);
        page.set_led(&mut out, 7, true).unwrap();
        page.write_line(&mut out, 1, "mid").unwrap();
        page.set_led(&mut out, 2, false).unwrap();
        page.write_line(&mut out, 1, "middle").unwrap();

        page.refresh(&mut out).unwrap();
        assert_eq!(
            out.writes,
            vec![
                Write::Line(0, String::new()),
                Write::Line(1, "middle".into()),
                Write::Line(2, String::new()),
                Write::Led(2, false),
                Write::Led(7, true),
            ]
        );
    }

    #[test]
    fn colour_helpers_drive_pairs() {
        let mut out = Recorder::default();
        let mut page = Page::new(0, "MFD", true);
        page.set_led_colour(&mut out, LedColour::Orange, 1, 2).unwrap();
        page.set_indicator(&mut out, Indicator::Clutch, LedColour::Green)
            .unwrap();
        page.set_indicator(&mut out, Indicator::Fire, LedColour::Red)
            .unwrap();
        assert_eq!(
            out.writes,
            vec![
                Write::Led(1, true),
                Write::Led(2, true),
                Write::Led(17, false),
                Write::Led(18, true),
                Write::Led(0, true),
            ]
        );
    }

    #[test]
    fn pages_do_not_share_buffers() {
        let mut out = Recorder::default();
        let mut a = Page::new(0, "A", false);
        let b = Page::new(1, "B", false);
        a.write_line(&mut out, 0, "only a").unwrap();
        a.set_led(&mut out, 0, true).unwrap();
        assert_eq!(b.line(0), Some(""));
        assert!(!b.led(0));
    }

    #[test]
    fn write_failure_propagates() {
        let mut out = Recorder {
            fail: true,
            ..Default::default()
        };
        let mut page = Page::new(0, "MFD", true);
        let err = page.write_line(&mut out, 0, "x").unwrap_err();
        assert!(err.is_fatal());
    }
}
