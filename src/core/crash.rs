//! Crash capture for [`Backend::CrashCapture`](super::Backend::CrashCapture)
//!
//! Handlers for SIGSEGV, SIGILL, SIGFPE and SIGABRT (plus a panic hook) are
//! installed once per process. Each handler appends a report to the FATAL
//! file of the most recent session, restores the default disposition and
//! lets the signal terminate the process.
//!
//! The signal handler never allocates or takes a lock: it only uses
//! async-signal-safe calls and, on glibc, raw frame addresses from
//! `backtrace(3)`. Symbolized backtraces are left to the panic hook.
//!
//! The report path is kept behind an `AtomicPtr` so the handler never takes a
//! lock. Replaced paths are never freed, since a handler on another thread
//! may still be reading the old one.

use std::ffi::{CStr, CString};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicPtr, Ordering};
use std::sync::Once;

static INSTALL: Once = Once::new();
static INSTALLED: AtomicBool = AtomicBool::new(false);
/// Set by the first handler invocation; a nested fatal signal skips the report
#[cfg(unix)]
static HANDLING: AtomicBool = AtomicBool::new(false);
static REPORT_PATH: AtomicPtr<libc::c_char> = AtomicPtr::new(std::ptr::null_mut());

/// Signals intercepted by the crash handler
#[cfg(unix)]
pub const CAPTURED_SIGNALS: [libc::c_int; 4] =
    [libc::SIGSEGV, libc::SIGILL, libc::SIGFPE, libc::SIGABRT];

/// `<dir>/<program>_FATAL_<stamp>.log`
pub fn report_path_for(dir: &Path, program: &str, stamp: &str) -> PathBuf {
    dir.join(format!("{}_FATAL_{}.log", program, stamp))
}

/// Point crash reports at `report_path` and install the handlers if this is
/// the first call in the process. Returns `true` when this call installed them.
pub fn install(report_path: &Path) -> bool {
    set_report_path(report_path);

    let mut installed_now = false;
    INSTALL.call_once(|| {
        frames::prepare();
        install_signal_handlers();
        install_panic_hook();
        INSTALLED.store(true, Ordering::SeqCst);
        installed_now = true;
    });
    installed_now
}

pub fn is_installed() -> bool {
    INSTALLED.load(Ordering::SeqCst)
}

/// Current report destination, if any session configured one
pub fn report_path() -> Option<PathBuf> {
    let ptr = REPORT_PATH.load(Ordering::SeqCst);
    if ptr.is_null() {
        return None;
    }
    // SAFETY: non-null values come from CString::into_raw and are never freed
    let path = unsafe { CStr::from_ptr(ptr) };
    Some(PathBuf::from(path.to_string_lossy().into_owned()))
}

fn set_report_path(path: &Path) {
    let Ok(c_path) = CString::new(path.to_string_lossy().into_owned()) else {
        eprintln!(
            "[LOGGER WARNING] Crash report path '{}' contains a NUL byte; keeping the previous one",
            path.display()
        );
        return;
    };
    let _previous = REPORT_PATH.swap(c_path.into_raw(), Ordering::SeqCst);
}

fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        if let Some(path) = report_path() {
            if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&path) {
                let _ = writeln!(file, "*** panic on thread {:?}: {} ***", std::thread::current().name(), info);
                let _ = writeln!(file, "{}", std::backtrace::Backtrace::force_capture());
            }
        }
        previous(info);
    }));
}

#[cfg(unix)]
fn install_signal_handlers() {
    for signal in CAPTURED_SIGNALS {
        // SAFETY: sigaction is given a zero-initialized struct with a valid
        // extern "C" handler and an emptied mask
        unsafe {
            let mut action: libc::sigaction = std::mem::zeroed();
            action.sa_sigaction = handle_fatal_signal as libc::sighandler_t;
            libc::sigemptyset(&mut action.sa_mask);
            action.sa_flags = libc::SA_RESETHAND;
            if libc::sigaction(signal, &action, std::ptr::null_mut()) != 0 {
                eprintln!(
                    "[LOGGER WARNING] Failed to install crash handler for {}",
                    signal_name(signal)
                );
            }
        }
    }
}

#[cfg(not(unix))]
fn install_signal_handlers() {}

#[cfg(unix)]
fn signal_name(signal: libc::c_int) -> &'static str {
    match signal {
        libc::SIGSEGV => "SIGSEGV",
        libc::SIGILL => "SIGILL",
        libc::SIGFPE => "SIGFPE",
        libc::SIGABRT => "SIGABRT",
        _ => "UNKNOWN SIGNAL",
    }
}

#[cfg(unix)]
fn write_raw(fd: libc::c_int, bytes: &[u8]) {
    let mut rest = bytes;
    while !rest.is_empty() {
        // SAFETY: pointer and length describe a live slice
        let n = unsafe { libc::write(fd, rest.as_ptr().cast(), rest.len()) };
        if n <= 0 {
            return;
        }
        rest = &rest[n as usize..];
    }
}

/// Decimal rendering into a stack buffer (no allocation)
#[cfg(unix)]
fn format_decimal(mut value: u64, buf: &mut [u8; 20]) -> &[u8] {
    let mut pos = buf.len();
    loop {
        pos -= 1;
        buf[pos] = b'0' + (value % 10) as u8;
        value /= 10;
        if value == 0 {
            break;
        }
    }
    &buf[pos..]
}

#[cfg(unix)]
extern "C" fn handle_fatal_signal(signal: libc::c_int) {
    if !HANDLING.swap(true, Ordering::SeqCst) {
        write_report(signal);
    }

    // SA_RESETHAND restored the default action; deliver the signal again
    // SAFETY: raise is async-signal-safe
    unsafe {
        libc::raise(signal);
    }
}

#[cfg(unix)]
fn write_report(signal: libc::c_int) {
    let name = signal_name(signal);
    let mut digits = [0u8; 20];
    // SAFETY: getpid is async-signal-safe
    let pid = format_decimal(unsafe { libc::getpid() } as u64, &mut digits);

    let path = REPORT_PATH.load(Ordering::SeqCst);
    if !path.is_null() {
        // SAFETY: path is a NUL-terminated string that is never freed
        let fd = unsafe {
            libc::open(
                path,
                libc::O_WRONLY | libc::O_CREAT | libc::O_APPEND,
                0o644 as libc::c_uint,
            )
        };
        if fd >= 0 {
            write_raw(fd, b"*** ");
            write_raw(fd, name.as_bytes());
            write_raw(fd, b" received by PID ");
            write_raw(fd, pid);
            write_raw(fd, b" ***\n");
            frames::write_to(fd);
            // SAFETY: fd was opened above
            unsafe { libc::close(fd) };
        }
    }

    write_raw(libc::STDERR_FILENO, b"*** ");
    write_raw(libc::STDERR_FILENO, name.as_bytes());
    write_raw(libc::STDERR_FILENO, b" received, terminating ***\n");
}

/// Stack frames for the signal report
#[cfg(all(target_os = "linux", target_env = "gnu"))]
mod frames {
    use super::write_raw;

    const MAX_FRAMES: usize = 64;

    extern "C" {
        fn backtrace(buffer: *mut *mut libc::c_void, size: libc::c_int) -> libc::c_int;
        fn backtrace_symbols_fd(buffer: *const *mut libc::c_void, size: libc::c_int, fd: libc::c_int);
    }

    /// glibc loads its unwinder lazily, which allocates; do it outside the handler
    pub(super) fn prepare() {
        let mut buffer = [std::ptr::null_mut(); MAX_FRAMES];
        // SAFETY: buffer holds MAX_FRAMES entries
        unsafe {
            backtrace(buffer.as_mut_ptr(), MAX_FRAMES as libc::c_int);
        }
    }

    /// Write one `binary(+offset) [address]` line per frame
    pub(super) fn write_to(fd: libc::c_int) {
        let mut buffer = [std::ptr::null_mut(); MAX_FRAMES];
        // SAFETY: buffer holds MAX_FRAMES entries; backtrace_symbols_fd
        // writes straight to fd without allocating
        unsafe {
            let depth = backtrace(buffer.as_mut_ptr(), MAX_FRAMES as libc::c_int);
            backtrace_symbols_fd(buffer.as_ptr(), depth, fd);
        }
        write_raw(fd, b"\n");
    }
}

#[cfg(all(unix, not(all(target_os = "linux", target_env = "gnu"))))]
mod frames {
    use super::write_raw;

    pub(super) fn prepare() {}

    pub(super) fn write_to(fd: libc::c_int) {
        write_raw(fd, b"(stack frames unavailable on this platform)\n");
    }
}

#[cfg(not(unix))]
mod frames {
    pub(super) fn prepare() {}
}
