//! USB identities of MFD-capable units.
//!
//! Platform-neutral half of the presence probe: the VID/PID table and the
//! record type. The Windows `hidapi` walk lives in `windows::hid_presence`.

use serde::{Deserialize, Serialize};

/// Saitek (now Logitech) USB vendor id.
pub const SAITEK_VID: u16 = 0x06a3;
/// X52 Pro flight system.
pub const X52_PRO_PID: u16 = 0x0762;

/// `(vid, pid, model)` of units whose MFD DirectOutput can drive.
pub const KNOWN_UNITS: &[(u16, u16, &str)] = &[(SAITEK_VID, X52_PRO_PID, "X52 Pro")];

pub fn is_mfd_unit(vid: u16, pid: u16) -> bool {
    KNOWN_UNITS.iter().any(|&(v, p, _)| v == vid && p == pid)
}

pub fn model_name(vid: u16, pid: u16) -> Option<&'static str> {
    KNOWN_UNITS
        .iter()
        .find(|&&(v, p, _)| v == vid && p == pid)
        .map(|&(_, _, name)| name)
}

/// One unit seen on the USB bus.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitInfo {
    pub vid: u16,
    pub pid: u16,
    pub product_string: Option<String>,
    pub serial_number: Option<String>,
    /// OS path of the first interface seen; opaque, for diagnostics.
    pub path: String,
}

impl UnitInfo {
    /// Same physical unit (matching ids and serial, when the serial is known).
    pub fn same_unit(&self, other: &UnitInfo) -> bool {
        self.vid == other.vid
            && self.pid == other.pid
            && match (&self.serial_number, &other.serial_number) {
                (Some(a), Some(b)) => a == b,
                _ => self.path == other.path,
            }
    }

    pub fn model(&self) -> Option<&'static str> {
        model_name(self.vid, self.pid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit(serial: Option<&str>, path: &str) -> UnitInfo {
        UnitInfo {
            vid: SAITEK_VID,
            pid: X52_PRO_PID,
            product_string: Some("Saitek X52 Pro Flight Control System".into()),
            serial_number: serial.map(str::to_string),
            path: path.into(),
        }
    }

    #[test]
    fn recognises_x52_pro_only() {
        assert!(is_mfd_unit(0x06a3, 0x0762));
        assert!(!is_mfd_unit(0x06a3, 0x075c));
        assert_eq!(model_name(SAITEK_VID, X52_PRO_PID), Some("X52 Pro"));
    }

    #[test]
    fn interfaces_of_one_unit_collapse() {
        let a = unit(Some("0001"), "\\\\?\\hid#mi_00");
        let b = unit(Some("0001"), "\\\\?\\hid#mi_01");
        let c = unit(Some("0002"), "\\\\?\\hid#mi_00");
        assert!(a.same_unit(&b));
        assert!(!a.same_unit(&c));
        assert!(unit(None, "p").same_unit(&unit(None, "p")));
        assert!(!unit(None, "p").same_unit(&unit(None, "q")));
    }
}
