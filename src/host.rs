use imgui::Textures;
use tracing::error;
use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Direct3D9::IDirect3DBaseTexture9;
use windows::Win32::UI::WindowsAndMessaging::{
    DispatchMessageW, PeekMessageW, TranslateMessage, MSG, PM_REMOVE, WM_QUIT,
};

use crate::config::{StylePreset, WindowConfig};
use crate::state::RenderState;
use crate::window::Window;

/// One window, one Direct3D 9 device, one GUI context, driven by a
/// non-blocking message pump.
///
/// Field order is teardown order: the render state goes before the window, so
/// the backends, the GUI context and the device are released while the window
/// still exists, and the window cleans its user-data slot before destroying
/// itself.
pub struct ImguiHost {
    state: Box<RenderState>,
    window: Option<Window>,
    msg: MSG,
    vsync: bool,
}

impl ImguiHost {
    /// Builds the window, the device, the GUI context and both backends, in
    /// that order. Failures do not propagate: each phase logs and the host
    /// runs degraded, observable through
    /// [`window_handle`](Self::window_handle), [`has_device`](Self::has_device)
    /// and [`has_gui_context`](Self::has_gui_context).
    pub fn new(config: WindowConfig) -> Self {
        let window = match Window::create(&config) {
            Ok(window) => Some(window),
            Err(e) => {
                error!("window creation failed, host runs degraded: {e}");
                None
            }
        };
        let hwnd = window.as_ref().map(Window::hwnd).unwrap_or_default();
        let mut state = Box::new(RenderState::new(hwnd));
        if let Some(window) = &window {
            state.init_device(config.vsync);
            window.show(config.show_command);
            state.init_context(config.style_preset);
            state.init_backends();
            // the box gives the pointer a stable address for the lifetime of
            // the window
            window.attach_state(&mut *state);
        }
        Self {
            state,
            window,
            msg: MSG::default(),
            vsync: config.vsync,
        }
    }

    /// Pumps one queued message through the window procedure, without
    /// blocking. Returns `false` once the quit message arrives (the window
    /// was closed or destroyed) or when the host has no window; `true`
    /// otherwise, including when the queue was empty.
    pub fn process_message(&mut self) -> bool {
        if self.window.is_none() {
            return false;
        }
        if unsafe { PeekMessageW(&mut self.msg, None, 0, 0, PM_REMOVE) }.as_bool() {
            if self.msg.message == WM_QUIT {
                return false;
            }
            unsafe {
                let _ = TranslateMessage(&self.msg);
                DispatchMessageW(&self.msg);
            }
        }
        true
    }

    /// Opens the GUI frame and hands out the frame handle. `None` while the
    /// device, the GUI context or a backend is missing, which includes the
    /// frames spent waiting for a lost device to become resettable.
    pub fn start_frame(&mut self) -> Option<&mut imgui::Ui> {
        self.state.start_frame()
    }

    /// Renders and presents the frame opened by
    /// [`start_frame`](Self::start_frame). A present that finds the device
    /// lost resets it as soon as the runtime allows. Without an open frame
    /// this does nothing.
    pub fn end_frame(&mut self) {
        self.state.end_frame();
    }

    /// Clears the back buffer to an opaque color. In the frame loop this runs
    /// after [`end_frame`](Self::end_frame) and paints the canvas the next
    /// frame draws onto.
    pub fn set_background_color(&mut self, r: u8, g: u8, b: u8) {
        self.state.set_background_color(r, g, b);
    }

    /// Switches the GUI color scheme at runtime.
    pub fn set_style(&mut self, preset: StylePreset) {
        self.state.set_style(preset);
    }

    /// Releases the GUI device objects, resets the device against the current
    /// back-buffer size and rebuilds them. Runs automatically on resize and
    /// on recoverable device loss; exposed for hosts that trigger resets
    /// themselves.
    pub fn reset_device(&mut self) {
        self.state.reset_device();
    }

    /// Releases the device and everything created on it. Idempotent.
    pub fn clear_device(&mut self) {
        self.state.clear_device();
    }

    /// Builds a fresh device and renderer after
    /// [`clear_device`](Self::clear_device), with the vsync choice from
    /// construction. Does nothing while a device is present.
    pub fn create_device(&mut self) {
        self.state.create_device(self.vsync);
    }

    pub fn window_handle(&self) -> Option<HWND> {
        self.window.as_ref().map(Window::hwnd)
    }

    /// The last message pulled from the queue.
    pub fn msg(&self) -> &MSG {
        &self.msg
    }

    pub fn vsync(&self) -> bool {
        self.vsync
    }

    pub fn has_device(&self) -> bool {
        self.state.has_device()
    }

    pub fn has_gui_context(&self) -> bool {
        self.state.has_gui_context()
    }

    /// Current back-buffer dimensions, `None` without a device. Zero until
    /// the first resize; the runtime then sizes the buffer from the window.
    pub fn back_buffer_size(&self) -> Option<(u32, u32)> {
        self.state.back_buffer_size()
    }

    /// Registry tying GUI texture ids to device textures, for hosts that draw
    /// their own images. `None` until the renderer backend exists.
    pub fn textures_mut(&mut self) -> Option<&mut Textures<IDirect3DBaseTexture9>> {
        self.state.textures_mut()
    }
}
