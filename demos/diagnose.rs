//! Why is no MFD found? Checks the DLL location and the USB bus.

#[cfg(target_os = "windows")]
fn main() {
    use stickmfd::backends::windows::{default_dll_path, DirectOutputDriver};
    use stickmfd::{DeviceDriver, DeviceHandle};

    let dll = default_dll_path();
    println!("DirectOutput.dll: {} (exists={})", dll.display(), dll.exists());

    match DirectOutputDriver::load(None) {
        Ok(mut driver) => {
            println!("loaded from {}", driver.library_path().display());
            let mut found: Vec<DeviceHandle> = Vec::new();
            let listed = driver
                .initialize("stickmfd-diagnose")
                .and_then(|_| driver.enumerate(&mut |h| found.push(h)));
            match listed {
                Ok(()) => println!("DirectOutput devices: {found:?}"),
                Err(code) => println!("DirectOutput enumerate failed: {code}"),
            }
            let _ = driver.deinitialize();
        }
        Err(e) => println!("DirectOutput unavailable: {e}"),
    }

    #[cfg(feature = "hid")]
    match stickmfd::backends::windows::hid_presence::attached_units() {
        Ok(units) if units.is_empty() => println!("USB: no MFD unit attached"),
        Ok(units) => {
            for u in units {
                println!(
                    "USB: {} VID:PID={:04x}:{:04x} ser={:?} path={}",
                    u.model().unwrap_or("unknown"),
                    u.vid,
                    u.pid,
                    u.serial_number,
                    u.path
                );
            }
        }
        Err(e) => println!("USB probe failed: {e}"),
    }
}

#[cfg(not(target_os = "windows"))]
fn main() {
    println!("DirectOutput is Windows-only; nothing to diagnose here.");
}
