use std::time::Duration;
use stickmfd::backends::virtual_driver::VirtualDriver;
use stickmfd::{ButtonEvent, Mfd, MfdOptions, Session, StaticContent};

fn main() -> stickmfd::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stickmfd=debug".into()),
        )
        .init();

    // The probe clone watches what the session writes to the "device".
    let driver = VirtualDriver::new();
    let probe = driver.clone();

    let session = Session::open(driver, "virtual-demo")?;
    let mut content = StaticContent::grouped([
        ("Alpha", vec!["a1", "a2"]),
        ("Beta", vec!["b1", "b2", "b3"]),
        ("Gamma", vec!["g1"]),
    ]);
    let mut mfd = Mfd::new(session, &mut content, MfdOptions::default())?;
    print_screen(&probe, "start");

    // Scripted presses, spaced past the debounce window.
    for (label, mask) in [
        ("down", ButtonEvent::DOWN),
        ("select", ButtonEvent::SELECT),
        ("down", ButtonEvent::DOWN),
        ("down", ButtonEvent::DOWN),
        ("select", ButtonEvent::SELECT),
        ("up", ButtonEvent::UP),
    ] {
        probe.press(mask.mask());
        mfd.pump()?;
        print_screen(&probe, label);
        std::thread::sleep(Duration::from_millis(250));
    }

    mfd.finish();
    println!("{} driver calls recorded", probe.calls().len());
    Ok(())
}

fn print_screen(probe: &VirtualDriver, label: &str) {
    println!("[{label}]");
    for line in probe.screen(0) {
        println!("  |{:<16}|", line.unwrap_or_default());
    }
}
