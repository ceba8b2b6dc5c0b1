//! Session lifecycle and dispatch against the virtual driver.

use stickmfd::backends::virtual_driver::{DriverCall, DriverOp, VirtualDriver, FIRST_HANDLE};
use stickmfd::{
    ButtonEvent, DeviceHandle, DriverCode, DriverEvent, Error, LedColour, Session, SessionEvent,
};

fn open() -> (Session<VirtualDriver>, VirtualDriver) {
    let driver = VirtualDriver::new();
    let probe = driver.clone();
    let session = Session::open(driver, "test").expect("open session");
    probe.clear_calls();
    (session, probe)
}

#[test]
fn open_registers_in_order() {
    let driver = VirtualDriver::new();
    let probe = driver.clone();
    let session = Session::open(driver, "TradeDangerous").unwrap();
    assert_eq!(session.device(), Some(FIRST_HANDLE));
    assert_eq!(
        probe.calls(),
        vec![
            DriverCall::Initialize("TradeDangerous".into()),
            DriverCall::RegisterDeviceCallback,
            DriverCall::Enumerate,
            DriverCall::RegisterSoftButtonCallback(FIRST_HANDLE),
            DriverCall::RegisterPageCallback(FIRST_HANDLE),
        ]
    );
}

#[test]
fn open_without_device_deinitializes() {
    let driver = VirtualDriver::with_devices(0);
    let probe = driver.clone();
    let err = Session::open(driver, "test").unwrap_err();
    assert!(matches!(err, Error::NoDeviceFound));
    assert_eq!(probe.calls().last(), Some(&DriverCall::Deinitialize));
    assert!(!probe.is_initialized());
}

#[test]
fn open_with_two_devices_fails() {
    let driver = VirtualDriver::with_devices(2);
    let probe = driver.clone();
    let err = Session::open(driver, "test").unwrap_err();
    assert!(matches!(err, Error::TooManyDevices(2)));
    assert!(!probe.is_initialized());
}

#[test]
fn repeated_handle_counts_as_one_device() {
    let driver = VirtualDriver::with_handles(&[FIRST_HANDLE, FIRST_HANDLE]);
    let probe = driver.clone();
    let session = Session::open(driver, "test").unwrap();
    assert_eq!(session.device(), Some(FIRST_HANDLE));
    assert!(probe
        .calls()
        .contains(&DriverCall::RegisterPageCallback(FIRST_HANDLE)));
}

#[test]
fn repeated_handles_still_count_distinct_units() {
    let other = DeviceHandle(0xbeef);
    let driver = VirtualDriver::with_handles(&[FIRST_HANDLE, other, FIRST_HANDLE]);
    let err = Session::open(driver, "test").unwrap_err();
    assert!(matches!(err, Error::TooManyDevices(2)));
}

#[test]
fn open_unwinds_on_registration_failure() {
    let driver = VirtualDriver::new();
    let probe = driver.clone();
    probe.fail_on(DriverOp::RegisterPageCallback, DriverCode::InvalidHandle);
    let err = Session::open(driver, "test").unwrap_err();
    assert!(matches!(
        err,
        Error::Driver {
            call: "register_page_callback",
            code: DriverCode::InvalidHandle
        }
    ));
    assert_eq!(probe.calls().last(), Some(&DriverCall::Deinitialize));
}

#[test]
fn failed_initialize_skips_deinitialize() {
    let driver = VirtualDriver::new();
    let probe = driver.clone();
    probe.fail_on(DriverOp::Initialize, DriverCode::OutOfMemory);
    assert!(Session::open(driver, "test").is_err());
    assert_eq!(probe.calls(), vec![DriverCall::Initialize("test".into())]);
}

#[test]
fn page_ids_are_sequential() {
    let (mut session, probe) = open();
    let a = session.add_page("A", true).unwrap();
    let b = session.add_page("A", false).unwrap();
    assert_eq!((a.id(), b.id()), (0, 1));
    assert_eq!(
        probe.calls(),
        vec![
            DriverCall::AddPage { page: 0, active: true },
            DriverCall::AddPage { page: 1, active: false },
        ]
    );
    assert_eq!(session.page(&b).unwrap().name(), "A");
}

#[test]
fn inactive_page_writes_are_buffered_until_activation() {
    let (mut session, probe) = open();
    let _main = session.add_page("Main", true).unwrap();
    let other = session.add_page("Other", false).unwrap();
    probe.clear_calls();

    session.write_line(&other, 0, "Second Page").unwrap();
    session.set_led(&other, 4, true).unwrap();
    assert!(probe.calls().is_empty());

    let ev = session
        .dispatch_at(
            DriverEvent::Page {
                device: FIRST_HANDLE,
                page: other.id(),
                active: true,
            },
            0,
        )
        .unwrap();
    assert_eq!(ev, Some(SessionEvent::PageActivated(1)));
    assert!(session.page(&other).unwrap().is_active());
    assert_eq!(
        probe.calls(),
        vec![
            DriverCall::SetString { page: 1, line: 0, text: "Second Page".into() },
            DriverCall::SetString { page: 1, line: 1, text: String::new() },
            DriverCall::SetString { page: 1, line: 2, text: String::new() },
            DriverCall::SetLed { page: 1, led: 4, on: true },
        ]
    );
}

#[test]
fn deactivation_keeps_buffer() {
    let (mut session, probe) = open();
    let page = session.add_page("Main", true).unwrap();
    session.write_line(&page, 1, "kept").unwrap();
    probe.clear_calls();

    let ev = session
        .dispatch_at(
            DriverEvent::Page {
                device: FIRST_HANDLE,
                page: page.id(),
                active: false,
            },
            0,
        )
        .unwrap();
    assert_eq!(ev, Some(SessionEvent::PageDeactivated(0)));
    session.write_line(&page, 2, "later").unwrap();
    assert!(probe.calls().is_empty());
    assert_eq!(session.page(&page).unwrap().line(1), Some("kept"));
    assert_eq!(session.page(&page).unwrap().line(2), Some("later"));
}

#[test]
fn refresh_round_trips_last_written_state() {
    let (mut session, probe) = open();
    let page = session.add_page("Main", true).unwrap();
    session.display(&page, ["one", "two", "three"]).unwrap();
    session.write_line(&page, 1, "TWO").unwrap();
    session.set_led_colour(&page, LedColour::Green, 1, 2).unwrap();
    session.set_led(&page, 0, true).unwrap();
    probe.clear_calls();

    session.refresh(&page).unwrap();
    assert_eq!(
        probe.calls(),
        vec![
            DriverCall::SetString { page: 0, line: 0, text: "one".into() },
            DriverCall::SetString { page: 0, line: 1, text: "TWO".into() },
            DriverCall::SetString { page: 0, line: 2, text: "three".into() },
            DriverCall::SetLed { page: 0, led: 0, on: true },
            DriverCall::SetLed { page: 0, led: 1, on: false },
            DriverCall::SetLed { page: 0, led: 2, on: true },
        ]
    );
}

#[test]
fn invalid_line_index_is_recoverable() {
    let (mut session, probe) = open();
    let page = session.add_page("Main", true).unwrap();
    session.write_line(&page, 0, "Test String").unwrap();
    probe.clear_calls();

    let err = session.write_line(&page, 5, "FAIL").unwrap_err();
    assert!(matches!(err, Error::InvalidLineIndex(5)));
    assert!(session.is_open());
    assert!(probe.calls().is_empty());
    assert_eq!(session.page(&page).unwrap().line(0), Some("Test String"));
    session.write_line(&page, 1, "still works").unwrap();
}

#[test]
fn write_failure_tears_session_down() {
    let (mut session, probe) = open();
    let page = session.add_page("Main", true).unwrap();
    probe.fail_on(DriverOp::SetString, DriverCode::PageNotActive);

    let err = session.write_line(&page, 0, "x").unwrap_err();
    assert!(matches!(
        err,
        Error::Driver {
            call: "set_string",
            code: DriverCode::PageNotActive
        }
    ));
    assert!(!session.is_open());
    assert!(!probe.is_initialized());
    assert!(matches!(
        session.write_line(&page, 0, "y"),
        Err(Error::DeviceGone)
    ));
}

#[test]
fn remove_page_failure_is_fatal() {
    let (mut session, probe) = open();
    let page = session.add_page("Main", true).unwrap();
    probe.fail_on(DriverOp::RemovePage, DriverCode::InvalidArgument);
    assert!(session.remove_page(page).is_err());
    assert!(!session.is_open());
    assert!(matches!(session.add_page("x", true), Err(Error::DeviceGone)));
}

#[test]
fn remove_page_deregisters() {
    let (mut session, probe) = open();
    let keep = session.add_page("Keep", true).unwrap();
    let gone = session.add_page("Gone", false).unwrap();
    session.remove_page(gone).unwrap();
    assert_eq!(session.pages().count(), 1);
    assert_eq!(probe.registered_pages().keys().copied().collect::<Vec<_>>(), vec![keep.id()]);
}

#[test]
fn close_is_idempotent() {
    let (mut session, probe) = open();
    session.add_page("A", true).unwrap();
    session.add_page("B", false).unwrap();
    probe.clear_calls();

    session.close();
    let once = probe.calls();
    assert_eq!(
        once,
        vec![
            DriverCall::RemovePage(0),
            DriverCall::RemovePage(1),
            DriverCall::Deinitialize,
        ]
    );
    session.close();
    assert_eq!(probe.calls(), once);
    assert!(!session.is_open());
}

#[test]
fn drop_closes_session() {
    let (mut session, probe) = open();
    session.add_page("A", true).unwrap();
    drop(session);
    assert!(!probe.is_initialized());
    assert!(probe.registered_pages().is_empty());
}

#[test]
fn buttons_are_debounced() {
    let (mut session, _probe) = open();
    let press = |buttons| DriverEvent::SoftButtons {
        device: FIRST_HANDLE,
        buttons,
    };
    assert_eq!(
        session.dispatch_at(press(4), 1_000).unwrap(),
        Some(SessionEvent::Buttons(ButtonEvent::DOWN))
    );
    assert_eq!(session.dispatch_at(press(4), 1_150).unwrap(), None);
    assert_eq!(
        session.dispatch_at(press(2), 1_200).unwrap(),
        Some(SessionEvent::Buttons(ButtonEvent::UP))
    );
}

#[test]
fn debounce_uses_arrival_time() {
    let (mut session, probe) = open();
    assert!(probe.press(2));
    std::thread::sleep(std::time::Duration::from_millis(250));
    assert!(probe.press(4));
    assert!(probe.press(4));
    std::thread::sleep(std::time::Duration::from_millis(250));
    assert_eq!(
        session.poll_events().unwrap(),
        vec![
            SessionEvent::Buttons(ButtonEvent::UP),
            SessionEvent::Buttons(ButtonEvent::DOWN),
        ]
    );
}

#[test]
fn out_of_range_mask_decodes_empty() {
    let (mut session, _probe) = open();
    let ev = session
        .dispatch_at(
            DriverEvent::SoftButtons {
                device: FIRST_HANDLE,
                buttons: 9,
            },
            0,
        )
        .unwrap();
    assert_eq!(ev, Some(SessionEvent::Buttons(ButtonEvent::default())));
}

#[test]
fn queued_notifications_are_drained() {
    let (mut session, probe) = open();
    session.add_page("Main", true).unwrap();
    assert!(probe.press(1));
    assert!(probe.switch_page(0, false));
    let events = session.poll_events().unwrap();
    assert_eq!(
        events,
        vec![
            SessionEvent::Buttons(ButtonEvent::SELECT),
            SessionEvent::PageDeactivated(0),
        ]
    );
    assert!(session.poll_events().unwrap().is_empty());
}

#[test]
fn unplug_ends_session() {
    let (mut session, probe) = open();
    assert!(probe.unplug());
    assert!(matches!(session.poll_events(), Err(Error::DeviceGone)));
    assert!(!session.is_open());
    assert!(matches!(session.poll_events(), Err(Error::DeviceGone)));
}

#[test]
fn second_device_is_ignored() {
    let (mut session, probe) = open();
    assert!(probe.plug(DeviceHandle(0xbeef)));
    assert!(session.poll_events().unwrap().is_empty());
    assert!(session.is_open());
}

#[test]
fn profile_failure_is_not_fatal() {
    let (mut session, probe) = open();
    probe.fail_on(DriverOp::SetProfile, DriverCode::NotImplemented);
    assert!(session.set_profile(None).is_err());
    assert!(session.is_open());
    probe.clear_failures();
    let profile = std::env::temp_dir().join("x52.pr0");
    session.set_profile(Some(&profile)).unwrap();
    assert_eq!(
        probe.calls().last(),
        Some(&DriverCall::SetProfile(Some(profile)))
    );
}
