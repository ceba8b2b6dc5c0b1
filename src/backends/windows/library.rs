//! Locating and loading `DirectOutput.dll`.
//!
//! ## Search order
//! 1. An explicit path (from configuration), if given.
//! 2. `%ProgramFiles%\Logitech\DirectOutput\DirectOutput.dll`. A 32-bit process
//!    on 64-bit Windows looks under `%ProgramFiles(x86)%` instead.
//! 3. `.\Logitech\DirectOutput\DirectOutput.dll` relative to the working directory.

#![cfg(target_os = "windows")]

use crate::error::LibraryError;
use std::ffi::c_void;
use std::os::windows::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use windows_sys::Win32::Foundation::{FreeLibrary, GetLastError, HMODULE};
use windows_sys::Win32::System::LibraryLoader::{GetProcAddress, LoadLibraryW};

const DLL_SUBPATH: &str = r"Logitech\DirectOutput\DirectOutput.dll";

const ERROR_MOD_NOT_FOUND: u32 = 126;
const ERROR_BAD_EXE_FORMAT: u32 = 193;

/// Default install location for this process's bitness.
pub fn default_dll_path() -> PathBuf {
    let wow64 = cfg!(target_pointer_width = "32")
        && std::env::var_os("PROCESSOR_ARCHITEW6432").is_some();
    let var = if wow64 { "ProgramFiles(x86)" } else { "ProgramFiles" };
    let installed = std::env::var_os(var)
        .map(|dir| PathBuf::from(dir).join(DLL_SUBPATH));

    match installed {
        Some(path) if path.is_file() => path,
        _ => Path::new(".").join(DLL_SUBPATH),
    }
}

/// Resolve the DLL path: `explicit` wins, otherwise [`default_dll_path`].
pub fn locate(explicit: Option<&Path>) -> PathBuf {
    explicit.map(Path::to_path_buf).unwrap_or_else(default_dll_path)
}

/// Owned module handle; freed on drop.
pub(crate) struct Library {
    module: HMODULE,
    path: PathBuf,
}

// The module handle is process-global; it is only read after load.
unsafe impl Send for Library {}

impl Library {
    pub(crate) fn load(path: &Path) -> Result<Self, LibraryError> {
        let wide: Vec<u16> = path
            .as_os_str()
            .encode_wide()
            .chain(std::iter::once(0))
            .collect();
        let module = unsafe { LoadLibraryW(wide.as_ptr()) };
        if module.is_null() {
            let code = unsafe { GetLastError() };
            tracing::warn!(path = %path.display(), code, "LoadLibraryW failed");
            return Err(match code {
                ERROR_MOD_NOT_FOUND => LibraryError::NotFound(path.to_path_buf()),
                ERROR_BAD_EXE_FORMAT => LibraryError::BadImage(path.to_path_buf()),
                _ => LibraryError::Os {
                    path: path.to_path_buf(),
                    code,
                },
            });
        }
        tracing::debug!(path = %path.display(), "loaded DirectOutput library");
        Ok(Self {
            module,
            path: path.to_path_buf(),
        })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Look up an export. `name` must be NUL-terminated.
    pub(crate) fn symbol(&self, name: &'static str) -> Result<*const c_void, LibraryError> {
        debug_assert!(name.ends_with('\0'));
        let proc = unsafe { GetProcAddress(self.module, name.as_ptr()) };
        match proc {
            Some(f) => Ok(f as *const c_void),
            None => Err(LibraryError::MissingSymbol(name.trim_end_matches('\0'))),
        }
    }
}

impl Drop for Library {
    fn drop(&mut self) {
        unsafe {
            FreeLibrary(self.module);
        }
    }
}
