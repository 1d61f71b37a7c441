use std::time::Instant;

use imgui::{sys, BackendFlags, ConfigFlags, Context, MouseButton};
use windows::Win32::Foundation::{HWND, LPARAM, POINT, RECT, WPARAM};
use windows::Win32::Graphics::Gdi::ClientToScreen;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetKeyState, ReleaseCapture, SetCapture, TrackMouseEvent, TME_LEAVE, TRACKMOUSEEVENT,
    VIRTUAL_KEY, VK_CONTROL, VK_LWIN, VK_MENU, VK_RWIN, VK_SHIFT,
};
use windows::Win32::UI::WindowsAndMessaging::*;

use crate::{keys, util};

/// Win32 side of the GUI: translates the window's message stream into io
/// events and keeps the per-frame io fields (display size, delta time,
/// cursor shape) in sync.
pub(crate) struct Win32Platform {
    hwnd: HWND,
    last_frame: Instant,
    mouse_tracked: bool,
    buttons_down: u32,
    pending_high_surrogate: Option<u16>,
}

impl Win32Platform {
    pub fn new(hwnd: HWND, ctx: &mut Context) -> Self {
        let io = ctx.io_mut();
        io.backend_flags.insert(BackendFlags::HAS_MOUSE_CURSORS);
        io.backend_flags.insert(BackendFlags::HAS_SET_MOUSE_POS);
        Self {
            hwnd,
            last_frame: Instant::now(),
            mouse_tracked: false,
            buttons_down: 0,
            pending_high_surrogate: None,
        }
    }

    /// Refreshes the io fields a new frame reads: client-area display size,
    /// a strictly positive delta time, and an OS cursor move when the GUI
    /// asked for one.
    pub fn prepare_frame(&mut self, io: &mut imgui::Io) {
        let mut rect = RECT::default();
        if unsafe { GetClientRect(self.hwnd, &mut rect) }.is_ok() {
            io.display_size = [
                (rect.right - rect.left) as f32,
                (rect.bottom - rect.top) as f32,
            ];
        }

        let now = Instant::now();
        io.delta_time = now.duration_since(self.last_frame).as_secs_f32().max(f32::EPSILON);
        self.last_frame = now;

        if io.want_set_mouse_pos {
            let mut pos = POINT {
                x: io.mouse_pos[0] as i32,
                y: io.mouse_pos[1] as i32,
            };
            unsafe {
                if ClientToScreen(self.hwnd, &mut pos).as_bool() {
                    let _ = SetCursorPos(pos.x, pos.y);
                }
            }
        }
    }

    /// Feeds one window message into the GUI. Returns `true` only when the
    /// message was fully handled here and the window procedure should report
    /// it done (the cursor-shape case); input events otherwise flow into the
    /// GUI *and* on to the window's own handling.
    pub fn handle_message(
        &mut self,
        ctx: &mut Context,
        msg: u32,
        wparam: WPARAM,
        lparam: LPARAM,
    ) -> bool {
        let io = ctx.io_mut();
        match msg {
            WM_MOUSEMOVE => {
                self.track_mouse_leave();
                io.add_mouse_pos_event([
                    util::x_lparam(lparam.0) as f32,
                    util::y_lparam(lparam.0) as f32,
                ]);
            }
            WM_MOUSELEAVE => {
                self.mouse_tracked = false;
                io.add_mouse_pos_event([-f32::MAX, -f32::MAX]);
            }
            WM_LBUTTONDOWN | WM_LBUTTONDBLCLK | WM_RBUTTONDOWN | WM_RBUTTONDBLCLK
            | WM_MBUTTONDOWN | WM_MBUTTONDBLCLK | WM_XBUTTONDOWN | WM_XBUTTONDBLCLK => {
                if let Some((button, index)) = mouse_button(msg, wparam) {
                    // keep receiving mouse messages while a drag leaves the window
                    if self.buttons_down == 0 {
                        unsafe { SetCapture(self.hwnd) };
                    }
                    self.buttons_down |= 1 << index;
                    io.add_mouse_button_event(button, true);
                }
            }
            WM_LBUTTONUP | WM_RBUTTONUP | WM_MBUTTONUP | WM_XBUTTONUP => {
                if let Some((button, index)) = mouse_button(msg, wparam) {
                    self.buttons_down &= !(1 << index);
                    if self.buttons_down == 0 {
                        unsafe { let _ = ReleaseCapture(); }
                    }
                    io.add_mouse_button_event(button, false);
                }
            }
            WM_MOUSEWHEEL => {
                let delta = util::signed_hiword(wparam.0) as f32 / WHEEL_DELTA as f32;
                io.add_mouse_wheel_event([0.0, delta]);
            }
            WM_MOUSEHWHEEL => {
                let delta = util::signed_hiword(wparam.0) as f32 / WHEEL_DELTA as f32;
                io.add_mouse_wheel_event([-delta, 0.0]);
            }
            WM_KEYDOWN | WM_SYSKEYDOWN | WM_KEYUP | WM_SYSKEYUP => {
                let down = matches!(msg, WM_KEYDOWN | WM_SYSKEYDOWN);
                update_modifiers();
                if let Some(key) = keys::map_virtual_key(VIRTUAL_KEY(wparam.0 as u16), lparam.0) {
                    io.add_key_event(key, down);
                }
            }
            WM_CHAR => self.push_character(io, wparam.0 as u32),
            WM_SETFOCUS | WM_KILLFOCUS => unsafe {
                sys::ImGuiIO_AddFocusEvent(sys::igGetIO(), msg == WM_SETFOCUS);
            },
            WM_SETCURSOR => {
                if util::loword(lparam.0) as u32 == HTCLIENT && update_mouse_cursor(io) {
                    return true;
                }
            }
            _ => {}
        }
        false
    }

    fn track_mouse_leave(&mut self) {
        if self.mouse_tracked {
            return;
        }
        let mut track = TRACKMOUSEEVENT {
            cbSize: std::mem::size_of::<TRACKMOUSEEVENT>() as u32,
            dwFlags: TME_LEAVE,
            hwndTrack: self.hwnd,
            dwHoverTime: 0,
        };
        if unsafe { TrackMouseEvent(&mut track) }.is_ok() {
            self.mouse_tracked = true;
        }
    }

    fn push_character(&mut self, io: &mut imgui::Io, code: u32) {
        if (0xD800..=0xDBFF).contains(&code) {
            self.pending_high_surrogate = Some(code as u16);
            return;
        }
        let code = if (0xDC00..=0xDFFF).contains(&code) {
            let Some(high) = self.pending_high_surrogate.take() else {
                return;
            };
            0x10000 + (((high as u32 - 0xD800) << 10) | (code - 0xDC00))
        } else {
            code
        };
        if let Some(c) = char::from_u32(code) {
            io.add_input_character(c);
        }
    }
}

fn mouse_button(msg: u32, wparam: WPARAM) -> Option<(MouseButton, u8)> {
    match msg {
        WM_LBUTTONDOWN | WM_LBUTTONDBLCLK | WM_LBUTTONUP => Some((MouseButton::Left, 0)),
        WM_RBUTTONDOWN | WM_RBUTTONDBLCLK | WM_RBUTTONUP => Some((MouseButton::Right, 1)),
        WM_MBUTTONDOWN | WM_MBUTTONDBLCLK | WM_MBUTTONUP => Some((MouseButton::Middle, 2)),
        WM_XBUTTONDOWN | WM_XBUTTONDBLCLK | WM_XBUTTONUP => {
            if util::hiword(wparam.0 as isize) == 1 {
                Some((MouseButton::Extra1, 3))
            } else {
                Some((MouseButton::Extra2, 4))
            }
        }
        _ => None,
    }
}

/// The safe binding has no event API for the modifier key slots, so they go
/// through the C layer, sampled from the real keyboard state.
fn update_modifiers() {
    unsafe {
        let io = sys::igGetIO();
        sys::ImGuiIO_AddKeyEvent(io, sys::ImGuiMod_Ctrl as _, key_down(VK_CONTROL));
        sys::ImGuiIO_AddKeyEvent(io, sys::ImGuiMod_Shift as _, key_down(VK_SHIFT));
        sys::ImGuiIO_AddKeyEvent(io, sys::ImGuiMod_Alt as _, key_down(VK_MENU));
        sys::ImGuiIO_AddKeyEvent(
            io,
            sys::ImGuiMod_Super as _,
            key_down(VK_LWIN) || key_down(VK_RWIN),
        );
    }
}

fn key_down(vk: VIRTUAL_KEY) -> bool {
    (unsafe { GetKeyState(vk.0 as i32) }) < 0
}

fn update_mouse_cursor(io: &imgui::Io) -> bool {
    if io.config_flags.contains(ConfigFlags::NO_MOUSE_CURSOR_CHANGE) {
        return false;
    }
    let cursor = unsafe { sys::igGetMouseCursor() };
    if io.mouse_draw_cursor || cursor == sys::ImGuiMouseCursor_None {
        unsafe { SetCursor(None) };
    } else {
        let idc = match cursor {
            sys::ImGuiMouseCursor_TextInput => IDC_IBEAM,
            sys::ImGuiMouseCursor_ResizeAll => IDC_SIZEALL,
            sys::ImGuiMouseCursor_ResizeNS => IDC_SIZENS,
            sys::ImGuiMouseCursor_ResizeEW => IDC_SIZEWE,
            sys::ImGuiMouseCursor_ResizeNESW => IDC_SIZENESW,
            sys::ImGuiMouseCursor_ResizeNWSE => IDC_SIZENWSE,
            sys::ImGuiMouseCursor_Hand => IDC_HAND,
            sys::ImGuiMouseCursor_NotAllowed => IDC_NO,
            _ => IDC_ARROW,
        };
        if let Ok(handle) = unsafe { LoadCursorW(None, idc) } {
            unsafe { SetCursor(Some(handle)) };
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn button_identity_follows_the_message() {
        assert_eq!(mouse_button(WM_LBUTTONDOWN, WPARAM(0)), Some((MouseButton::Left, 0)));
        assert_eq!(mouse_button(WM_RBUTTONUP, WPARAM(0)), Some((MouseButton::Right, 1)));
        assert_eq!(mouse_button(WM_MBUTTONDBLCLK, WPARAM(0)), Some((MouseButton::Middle, 2)));
        assert_eq!(mouse_button(WM_MOUSEMOVE, WPARAM(0)), None);
    }

    #[test]
    fn xbutton_identity_comes_from_the_wparam_high_word() {
        assert_eq!(
            mouse_button(WM_XBUTTONDOWN, WPARAM(1 << 16)),
            Some((MouseButton::Extra1, 3))
        );
        assert_eq!(
            mouse_button(WM_XBUTTONUP, WPARAM(2 << 16)),
            Some((MouseButton::Extra2, 4))
        );
    }
}
