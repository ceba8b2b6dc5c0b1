//! USB presence check for MFD units (via `hidapi`).
//!
//! DirectOutput only reports units once its service is installed and running.
//! When a session fails with [`Error::NoDeviceFound`](crate::Error::NoDeviceFound),
//! this probe tells the host whether the stick is physically attached, so it
//! can say "plug it in" vs. "install the driver".

#![cfg(all(target_os = "windows", feature = "hid"))]

use crate::backends::usb::{is_mfd_unit, UnitInfo};
use hidapi::{DeviceInfo, HidApi};

fn unit_info(info: &DeviceInfo) -> UnitInfo {
    UnitInfo {
        vid: info.vendor_id(),
        pid: info.product_id(),
        product_string: info.product_string().map(|s| s.to_string()),
        serial_number: info.serial_number().map(|s| s.to_string()),
        path: info.path().to_string_lossy().to_string(),
    }
}

/// List attached MFD-capable units, one entry per physical unit.
pub fn probe_units(api: &HidApi) -> Vec<UnitInfo> {
    let mut out: Vec<UnitInfo> = Vec::new();
    for info in api.device_list() {
        if !is_mfd_unit(info.vendor_id(), info.product_id()) {
            continue;
        }
        let unit = unit_info(info);
        // Composite devices list one entry per HID interface.
        if out.iter().any(|u| u.same_unit(&unit)) {
            continue;
        }
        tracing::debug!(vid = unit.vid, pid = unit.pid, path = %unit.path, "MFD unit on USB");
        out.push(unit);
    }
    out
}

/// [`probe_units`] with a fresh `HidApi` context.
pub fn attached_units() -> Result<Vec<UnitInfo>, hidapi::HidError> {
    let api = HidApi::new()?;
    Ok(probe_units(&api))
}
