use std::ffi::CString;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::fs::FileTypeExt;
use std::path::Path;

use crate::error::StartupError;

/// Permissions for a freshly created fifo (owner read/write).
const FIFO_MODE: libc::mode_t = 0o600;

/// Outcome of [`provision`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provisioned {
    Created,
    AlreadyPresent,
}

/// Create the fifo at `path` unless one is already there.
///
/// An existing fifo counts as success. An existing non-fifo file, or any
/// other failure to create the node, is a startup error.
pub fn provision(path: &Path) -> Result<Provisioned, StartupError> {
    match mkfifo(path) {
        Ok(()) => {
            tracing::info!(path = %path.display(), "fifo created");
            Ok(Provisioned::Created)
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            let metadata = std::fs::metadata(path).map_err(|source| StartupError::Provision {
                path: path.to_path_buf(),
                source,
            })?;
            if !metadata.file_type().is_fifo() {
                return Err(StartupError::NotAFifo {
                    path: path.to_path_buf(),
                });
            }
            tracing::debug!(path = %path.display(), "fifo already provisioned");
            Ok(Provisioned::AlreadyPresent)
        }
        Err(source) => Err(StartupError::Provision {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn mkfifo(path: &Path) -> io::Result<()> {
    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "path contains a nul byte"))?;
    // SAFETY: `c_path` is a valid nul-terminated string that outlives the call.
    let rc = unsafe { libc::mkfifo(c_path.as_ptr(), FIFO_MODE) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}
