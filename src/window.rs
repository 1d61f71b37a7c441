use tracing::warn;
use windows::core::PCWSTR;
use windows::Win32::Foundation::{HINSTANCE, HWND, LPARAM, LRESULT, WPARAM};
use windows::Win32::Graphics::Gdi::UpdateWindow;
use windows::Win32::System::LibraryLoader::GetModuleHandleW;
use windows::Win32::UI::WindowsAndMessaging::*;

use crate::config::WindowConfig;
use crate::error::HostError;
use crate::state::RenderState;
use crate::util;

pub(crate) fn wide_string(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Registered window class. The class name buffer lives as long as the
/// registration; dropping unregisters, so the name can be reused by a later
/// instance.
pub(crate) struct WindowClass {
    name: Vec<u16>,
    instance: HINSTANCE,
}

impl WindowClass {
    pub fn register(config: &WindowConfig) -> Result<Self, HostError> {
        let name = wide_string(&config.class_name);
        let module = unsafe { GetModuleHandleW(None) }.map_err(HostError::ClassRegistration)?;
        let instance = HINSTANCE(module.0);
        let class = WNDCLASSEXW {
            cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
            style: config.class_style,
            lpfnWndProc: config.wnd_proc.or(Some(default_wnd_proc)),
            hInstance: instance,
            hIcon: config.icon,
            hIconSm: config.small_icon,
            lpszClassName: PCWSTR(name.as_ptr()),
            ..Default::default()
        };
        if unsafe { RegisterClassExW(&class) } == 0 {
            return Err(HostError::ClassRegistration(windows::core::Error::from_win32()));
        }
        Ok(Self { name, instance })
    }

    pub fn name_ptr(&self) -> PCWSTR {
        PCWSTR(self.name.as_ptr())
    }
}

impl Drop for WindowClass {
    fn drop(&mut self) {
        if let Err(e) = unsafe { UnregisterClassW(self.name_ptr(), Some(self.instance)) } {
            warn!("window class unregister failed: {e}");
        }
    }
}

/// Top-level window plus its class registration.
pub(crate) struct Window {
    hwnd: HWND,
    class: WindowClass,
}

impl Window {
    pub fn create(config: &WindowConfig) -> Result<Self, HostError> {
        let class = WindowClass::register(config)?;
        let title = wide_string(&config.title);
        let (x, y) = config.position;
        let (width, height) = config.size;
        let hwnd = unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE::default(),
                class.name_ptr(),
                PCWSTR(title.as_ptr()),
                config.window_style,
                x,
                y,
                width,
                height,
                None,
                None,
                Some(class.instance),
                None,
            )
        }
        .map_err(HostError::WindowCreation)?;
        Ok(Self { hwnd, class })
    }

    pub fn hwnd(&self) -> HWND {
        self.hwnd
    }

    pub fn show(&self, command: SHOW_WINDOW_CMD) {
        unsafe {
            let _ = ShowWindow(self.hwnd, command);
            let _ = UpdateWindow(self.hwnd);
        }
    }

    /// Parks the per-window state where the window procedure can reach it.
    /// The pointee must stay at a stable address until detach or drop.
    pub fn attach_state(&self, state: *mut RenderState) {
        unsafe { SetWindowLongPtrW(self.hwnd, GWLP_USERDATA, state as isize) };
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        unsafe {
            SetWindowLongPtrW(self.hwnd, GWLP_USERDATA, 0);
            let _ = DestroyWindow(self.hwnd);
            // destruction posts a quit through our procedure; a later window
            // on this thread must not inherit it
            let mut msg = MSG::default();
            while PeekMessageW(&mut msg, None, WM_QUIT, WM_QUIT, PM_REMOVE).as_bool() {}
        }
    }
}

fn render_state(hwnd: HWND) -> Option<&'static mut RenderState> {
    let ptr = unsafe { GetWindowLongPtrW(hwnd, GWLP_USERDATA) } as *mut RenderState;
    unsafe { ptr.as_mut() }
}

/// Window procedure installed by default. Offers each message to the GUI
/// first, then handles resize, close, and destroy. Custom procedures set via
/// [`WindowConfig`](crate::WindowConfig) usually delegate to this for
/// everything they do not handle themselves.
pub unsafe extern "system" fn default_wnd_proc(
    hwnd: HWND,
    msg: u32,
    wparam: WPARAM,
    lparam: LPARAM,
) -> LRESULT {
    if let Some(state) = render_state(hwnd) {
        if state.handle_message(msg, wparam, lparam) {
            return LRESULT(1);
        }
    }
    match msg {
        WM_SIZE => {
            if wparam.0 as u32 != SIZE_MINIMIZED {
                if let Some(state) = render_state(hwnd) {
                    state.resize(
                        util::loword(lparam.0) as u32,
                        util::hiword(lparam.0) as u32,
                    );
                }
            }
            LRESULT(0)
        }
        // no menu on ALT
        WM_SYSCOMMAND if (wparam.0 & 0xfff0) == SC_KEYMENU as usize => LRESULT(0),
        WM_CLOSE => {
            let _ = DestroyWindow(hwnd);
            LRESULT(0)
        }
        WM_DESTROY => {
            PostQuitMessage(0);
            LRESULT(0)
        }
        _ => DefWindowProcW(hwnd, msg, wparam, lparam),
    }
}

/// Loads an icon embedded in the executable's resources, for
/// [`WindowConfig::with_icon`](crate::WindowConfig::with_icon).
pub fn load_icon(resource_id: u16, width: i32, height: i32) -> Option<HICON> {
    let module = unsafe { GetModuleHandleW(None) }.ok()?;
    let handle = unsafe {
        LoadImageW(
            Some(HINSTANCE(module.0)),
            PCWSTR(resource_id as usize as *const u16),
            IMAGE_ICON,
            width,
            height,
            LR_DEFAULTCOLOR,
        )
    }
    .ok()?;
    Some(HICON(handle.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_strings_are_nul_terminated_utf16() {
        let wide = wide_string("ab");
        assert_eq!(wide, vec![0x61, 0x62, 0]);
        assert_eq!(wide_string("").len(), 1);
        // surrogate pairs survive the conversion
        let wide = wide_string("a\u{1F600}");
        assert_eq!(wide.len(), 4);
        assert_eq!(*wide.last().unwrap(), 0);
    }

    #[test]
    fn wndproc_routes_messages_without_attached_state() {
        // no per-window state: the ALT menu is still swallowed, size claims
        // the message, and anything else defers to the system
        let swallowed = unsafe {
            default_wnd_proc(
                HWND::default(),
                WM_SYSCOMMAND,
                WPARAM(SC_KEYMENU as usize),
                LPARAM(0),
            )
        };
        assert_eq!(swallowed, LRESULT(0));
        let sized = unsafe {
            default_wnd_proc(HWND::default(), WM_SIZE, WPARAM(0), LPARAM((480 << 16) | 640))
        };
        assert_eq!(sized, LRESULT(0));
        let deferred =
            unsafe { default_wnd_proc(HWND::default(), WM_NULL, WPARAM(0), LPARAM(0)) };
        assert_eq!(deferred, LRESULT(0));
    }
}
