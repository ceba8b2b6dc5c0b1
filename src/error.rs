//! Error types and DirectOutput result codes.
//!
//! Every driver call reports an `HRESULT`-style code. [`DriverCode`] gives the
//! non-success codes names; [`Error`] is the crate-wide error returned by the
//! session, pages and backends.
//!
//! # Fatal vs. recoverable
//! Driver failures after the session is open are treated as fatal: the session
//! tears itself down before the error reaches the caller (see
//! [`Error::is_fatal`]). Validation errors such as [`Error::InvalidLineIndex`]
//! leave the session untouched.

use std::fmt;
use std::path::PathBuf;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Raw DirectOutput success code (`S_OK`).
pub const S_OK: i32 = 0x0000_0000;
/// `E_HANDLE`: invalid device handle, or DirectOutput not initialized.
pub const E_HANDLE: i32 = 0x8007_0006_u32 as i32;
/// `E_INVALIDARG`: an argument (page id, LED id, string id) is invalid.
pub const E_INVALIDARG: i32 = 0x8007_0057_u32 as i32;
/// `E_OUTOFMEMORY`: the driver ran out of memory.
pub const E_OUTOFMEMORY: i32 = 0x8007_000E_u32 as i32;
/// `E_PAGENOTACTIVE`: the page is not the active page.
pub const E_PAGENOTACTIVE: i32 = 0xFF04_0001_u32 as i32;
/// `E_BUFFERTOOSMALL`: a caller-supplied buffer was too small.
pub const E_BUFFERTOOSMALL: i32 = 0xFF04_0000_u32 as i32;
/// `E_NOTIMPL`: the call is not implemented by the driver.
pub const E_NOTIMPL: i32 = 0x8000_4001_u32 as i32;

/// A non-success code returned by a driver call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DriverCode {
    InvalidHandle,
    InvalidArgument,
    OutOfMemory,
    PageNotActive,
    BufferTooSmall,
    NotImplemented,
    /// Any code the driver documentation does not name; the raw value is kept for diagnostics.
    Other(i32),
}

impl DriverCode {
    /// Map a raw driver return value. `S_OK` maps to `Ok(())`.
    pub fn check(raw: i32) -> std::result::Result<(), DriverCode> {
        match raw {
            S_OK => Ok(()),
            E_HANDLE => Err(DriverCode::InvalidHandle),
            E_INVALIDARG => Err(DriverCode::InvalidArgument),
            E_OUTOFMEMORY => Err(DriverCode::OutOfMemory),
            E_PAGENOTACTIVE => Err(DriverCode::PageNotActive),
            E_BUFFERTOOSMALL => Err(DriverCode::BufferTooSmall),
            E_NOTIMPL => Err(DriverCode::NotImplemented),
            other => Err(DriverCode::Other(other)),
        }
    }

    /// The raw code as the driver reported it.
    pub fn raw(self) -> i32 {
        match self {
            DriverCode::InvalidHandle => E_HANDLE,
            DriverCode::InvalidArgument => E_INVALIDARG,
            DriverCode::OutOfMemory => E_OUTOFMEMORY,
            DriverCode::PageNotActive => E_PAGENOTACTIVE,
            DriverCode::BufferTooSmall => E_BUFFERTOOSMALL,
            DriverCode::NotImplemented => E_NOTIMPL,
            DriverCode::Other(raw) => raw,
        }
    }
}

impl fmt::Display for DriverCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            DriverCode::InvalidHandle => "invalid device handle",
            DriverCode::InvalidArgument => "invalid argument",
            DriverCode::OutOfMemory => "out of memory",
            DriverCode::PageNotActive => "page not active",
            DriverCode::BufferTooSmall => "buffer too small",
            DriverCode::NotImplemented => "not implemented",
            DriverCode::Other(_) => "unspecified driver error",
        };
        write!(f, "{msg} (0x{:08x})", self.raw() as u32)
    }
}

/// Why the driver library could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("specified file does not exist: {}", .0.display())]
    NotFound(PathBuf),
    #[error("possible 32/64-bit mismatch between this process and {}; install both driver variants", .0.display())]
    BadImage(PathBuf),
    #[error("missing export `{0}`")]
    MissingSymbol(&'static str),
    #[error("unspecified error loading {} (os error {code})", .path.display())]
    Os { path: PathBuf, code: u32 },
}

/// Configuration and content-file errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported content file extension: {}", .0.display())]
    UnsupportedFormat(PathBuf),
}

/// Errors surfaced by sessions, pages and backends.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Enumeration reported no device.
    #[error("no compatible device found")]
    NoDeviceFound,

    /// Enumeration reported more than one distinct device; only one is supported.
    #[error("too many devices present ({0} found, one supported)")]
    TooManyDevices(usize),

    /// A driver call returned a non-success code.
    #[error("driver call `{call}` failed: {code}")]
    Driver { call: &'static str, code: DriverCode },

    /// The display has exactly three lines.
    #[error("line index {0} out of range (0..=2)")]
    InvalidLineIndex(usize),

    /// LED index beyond the device's LED count.
    #[error("LED index {0} out of range")]
    InvalidLedIndex(usize),

    /// The page handle does not belong to this session (or was already removed).
    #[error("unknown page {0}")]
    UnknownPage(u32),

    /// The session was closed, torn down, or the device went away.
    #[error("device session is closed")]
    DeviceGone,

    #[error("unable to load DirectOutput library: {0}")]
    Library(#[from] LibraryError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Wrap a driver code with the name of the call that produced it.
    pub fn driver(call: &'static str) -> impl FnOnce(DriverCode) -> Error {
        move |code| Error::Driver { call, code }
    }

    /// `true` for errors that end the session.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Driver { .. } | Error::DeviceGone)
    }
}
