//! Browse a content file on a real X52 Pro.
//!
//! Usage: `pageable [config.toml]`. Without a config, a small built-in page
//! set is shown. Runs for a minute, or until an entry of a flat list is chosen.

#[cfg(target_os = "windows")]
fn main() -> stickmfd::Result<()> {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use stickmfd::backends::windows::DirectOutputDriver;
    use stickmfd::{
        Config, ContentSource, FileContent, Indicator, LedColour, Mfd, MfdOptions, Session,
        StaticContent,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stickmfd=info".into()),
        )
        .init();

    let cfg = match std::env::args().nth(1) {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let driver = DirectOutputDriver::load(cfg.driver_path.as_deref())?;
    let session = Session::open_with_debounce(driver, &cfg.application_name, cfg.debounce())?;

    let mut source: Box<dyn ContentSource> = match &cfg.content {
        Some(path) => Box::new(FileContent::new(path)),
        None => Box::new(StaticContent::grouped([
            ("Page 1", vec!["-- 1 -----------", "Line 1", "Line 2"]),
            ("Page 2", vec!["-- 2 -----------", "Line 1", "Line 2", "Line 3"]),
            ("Page 3", vec!["-- 3 -----------", "Line 1"]),
        ])),
    };
    let mut mfd = Mfd::new(session, source.as_mut(), MfdOptions::from(&cfg))?;

    let stop = Arc::new(AtomicBool::new(false));
    mfd.attention(Duration::from_millis(600), &stop)?;
    mfd.set_indicator(Indicator::Fire, LedColour::Green)?;
    mfd.set_indicator(Indicator::FireA, LedColour::Green)?;
    mfd.show()?;

    let timer = Arc::clone(&stop);
    std::thread::spawn(move || {
        std::thread::sleep(Duration::from_secs(60));
        timer.store(true, Ordering::Relaxed);
    });

    while !stop.load(Ordering::Relaxed) {
        mfd.pump()?;
        if let Some(entry) = mfd.chosen() {
            println!("chosen: {entry}");
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
    }

    mfd.finish();
    Ok(())
}

#[cfg(not(target_os = "windows"))]
fn main() {
    println!("DirectOutput is Windows-only; try `cargo run --example virtual_demo`.");
}
