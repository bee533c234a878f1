//! Modal message display

/// Show a modal message and block until the user dismisses it.
///
/// Uses `MessageBoxW` on Windows. Other platforms have no system-wide modal
/// primitive, so the message goes to stderr instead. The dialog's result
/// code is ignored.
#[cfg(windows)]
pub fn show_message(title: &str, body: &str) {
    use windows_sys::Win32::UI::WindowsAndMessaging::{MB_OK, MessageBoxW};

    let text = wide(body);
    let caption = wide(title);
    // SAFETY: both buffers are nul-terminated and outlive the call.
    unsafe {
        MessageBoxW(std::ptr::null_mut(), text.as_ptr(), caption.as_ptr(), MB_OK);
    }
}

#[cfg(not(windows))]
pub fn show_message(title: &str, body: &str) {
    tracing::debug!(title, "No modal dialog on this platform, writing to stderr");
    eprintln!("[{}] {}", title, body);
}

#[cfg(windows)]
fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}
