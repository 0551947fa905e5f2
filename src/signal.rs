//! Ctrl-C / SIGTERM handling.
//!
//! The first signal sets the shared shutdown flag so the recorder loop can
//! finish the current recording and exit cleanly.  A second signal exits
//! immediately with status 130.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use anyhow::Result;

static SHUTDOWN: OnceLock<Arc<AtomicBool>> = OnceLock::new();

#[cfg(unix)]
extern "C" fn handle_shutdown(_: libc::c_int) {
    if let Some(flag) = SHUTDOWN.get() {
        if flag.swap(true, Ordering::SeqCst) {
            // SAFETY: _exit is async-signal-safe.
            unsafe { libc::_exit(130) };
        }
    }
}

/// Install handlers for SIGINT and SIGTERM and return the flag they set.
///
/// Calling this more than once returns the same flag.
pub fn install_shutdown_handler() -> Result<Arc<AtomicBool>> {
    if let Some(flag) = SHUTDOWN.get() {
        return Ok(Arc::clone(flag));
    }
    let flag = Arc::clone(SHUTDOWN.get_or_init(|| Arc::new(AtomicBool::new(false))));

    #[cfg(unix)]
    unsafe {
        // SAFETY: handle_shutdown only touches an already-initialised
        // OnceLock and an atomic, and calls _exit; all async-signal-safe.
        let handler = handle_shutdown as *const () as libc::sighandler_t;
        for sig in [libc::SIGINT, libc::SIGTERM] {
            if libc::signal(sig, handler) == libc::SIG_ERR {
                anyhow::bail!("failed to install handler for signal {sig}");
            }
        }
    }

    #[cfg(not(unix))]
    log::warn!("signal handling not supported on this platform; Ctrl-C exits without flushing");

    Ok(flag)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
