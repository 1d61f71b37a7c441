use std::sync::atomic::{AtomicBool, Ordering};

use imgui::Textures;
use tracing::{debug, error, warn};
use windows::Win32::Foundation::{HWND, LPARAM, WPARAM};
use windows::Win32::Graphics::Direct3D9::{D3DERR_DEVICELOST, IDirect3DBaseTexture9};

use crate::config::StylePreset;
use crate::device::Device;
use crate::error::HostError;
use crate::platform::Win32Platform;
use crate::renderer::D3d9Renderer;

static CONTEXT_ALIVE: AtomicBool = AtomicBool::new(false);

/// Owner of the process-wide GUI context. The binding aborts the process on
/// a duplicate context, so the claim is checked here instead and released on
/// drop, letting a later host create a context of its own.
pub(crate) struct GuiContext {
    imgui: imgui::Context,
}

impl GuiContext {
    pub fn acquire() -> Result<Self, HostError> {
        if CONTEXT_ALIVE
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(HostError::ContextExists);
        }
        let mut imgui = imgui::Context::create();
        // a library should not scatter layout files over the host's cwd
        imgui.set_ini_filename(None);
        Ok(Self { imgui })
    }
}

impl Drop for GuiContext {
    fn drop(&mut self) {
        CONTEXT_ALIVE.store(false, Ordering::Release);
    }
}

impl std::ops::Deref for GuiContext {
    type Target = imgui::Context;

    fn deref(&self) -> &Self::Target {
        &self.imgui
    }
}

impl std::ops::DerefMut for GuiContext {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.imgui
    }
}

pub(crate) fn apply_style(ctx: &mut imgui::Context, preset: StylePreset) {
    let style = ctx.style_mut();
    match preset {
        StylePreset::Classic => {
            style.use_classic_colors();
        }
        StylePreset::Dark => {
            style.use_dark_colors();
        }
        StylePreset::Light => {
            style.use_light_colors();
        }
    }
}

/// The moving parts behind one window, reachable from the window procedure
/// through the window's user-data slot. Every operation degrades to a logged
/// no-op when a part it needs failed to initialize.
///
/// Field order is teardown order: backends before the context, the context
/// before the device.
pub(crate) struct RenderState {
    renderer: Option<D3d9Renderer>,
    platform: Option<Win32Platform>,
    gui: Option<GuiContext>,
    device: Option<Device>,
    hwnd: HWND,
    frame_open: bool,
}

impl RenderState {
    pub fn new(hwnd: HWND) -> Self {
        Self {
            renderer: None,
            platform: None,
            gui: None,
            device: None,
            hwnd,
            frame_open: false,
        }
    }

    pub fn init_device(&mut self, vsync: bool) {
        if self.device.is_some() {
            debug!("device already present");
            return;
        }
        match Device::create(self.hwnd, vsync) {
            Ok(device) => self.device = Some(device),
            Err(e) => error!("device creation failed, rendering disabled: {e}"),
        }
    }

    pub fn init_context(&mut self, preset: StylePreset) {
        match GuiContext::acquire() {
            Ok(mut gui) => {
                apply_style(&mut gui, preset);
                self.gui = Some(gui);
            }
            Err(e) => error!("GUI context init failed: {e}"),
        }
    }

    /// Builds the platform and renderer backends. Both need the context, the
    /// renderer also the device.
    pub fn init_backends(&mut self) {
        let Some(gui) = self.gui.as_mut() else {
            warn!("GUI backends skipped: no context");
            return;
        };
        if self.device.is_none() {
            warn!("GUI backends skipped: no device");
            return;
        }
        self.platform = Some(Win32Platform::new(self.hwnd, gui));
        self.init_renderer();
    }

    fn init_renderer(&mut self) {
        let (Some(device), Some(gui)) = (self.device.as_ref(), self.gui.as_mut()) else {
            return;
        };
        match D3d9Renderer::new(device.raw(), gui) {
            Ok(renderer) => self.renderer = Some(renderer),
            Err(e) => error!("renderer backend init failed: {e}"),
        }
    }

    /// Opens a frame and hands out the GUI handle, or `None` while any
    /// prerequisite (device, context, backends) is missing.
    pub fn start_frame(&mut self) -> Option<&mut imgui::Ui> {
        if self.device.is_none() || self.renderer.is_none() {
            return None;
        }
        let (Some(gui), Some(platform)) = (self.gui.as_mut(), self.platform.as_mut()) else {
            return None;
        };
        platform.prepare_frame(gui.io_mut());
        self.frame_open = true;
        Some(gui.new_frame())
    }

    /// Renders and presents the open frame. A present that reports the device
    /// lost and ready for reset triggers one reset attempt.
    pub fn end_frame(&mut self) {
        if !self.frame_open {
            return;
        }
        self.frame_open = false;
        let (Some(gui), Some(device), Some(renderer)) = (
            self.gui.as_mut(),
            self.device.as_ref(),
            self.renderer.as_mut(),
        ) else {
            return;
        };
        let draw_data = gui.render();
        if device.begin_scene() {
            if let Err(e) = renderer.render(draw_data) {
                warn!("draw data submission failed: {e}");
            }
            device.end_scene();
        }
        if let Err(e) = device.present() {
            if e.code() == D3DERR_DEVICELOST && device.needs_reset() {
                debug!("device lost and ready for reset");
                self.reset_device();
            } else {
                warn!("present failed: {e}");
            }
        }
    }

    /// Full reset cycle: release the default-pool resources, reset the
    /// device, recreate the resources. Used by the resize path and by
    /// `end_frame` after a recoverable device loss.
    pub fn reset_device(&mut self) {
        let Some(device) = self.device.as_mut() else {
            warn!("device reset skipped: no device");
            return;
        };
        if let (Some(renderer), Some(gui)) = (self.renderer.as_mut(), self.gui.as_mut()) {
            renderer.invalidate_device_objects(gui);
        }
        if device.reset() {
            if let (Some(renderer), Some(gui)) = (self.renderer.as_mut(), self.gui.as_mut()) {
                if let Err(e) = renderer.create_device_objects(gui) {
                    error!("device objects not recreated after reset: {e}");
                }
            }
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        let Some(device) = self.device.as_mut() else {
            return;
        };
        device.resize(width, height);
        debug!("resize to {width}x{height}, resetting device");
        self.reset_device();
    }

    /// Releases the device and the renderer bound to it. Safe to call
    /// repeatedly; later calls find nothing to release.
    pub fn clear_device(&mut self) {
        if let (Some(renderer), Some(gui)) = (self.renderer.as_mut(), self.gui.as_mut()) {
            renderer.invalidate_device_objects(gui);
        }
        self.renderer = None;
        if self.device.take().is_some() {
            debug!("graphics device released");
        }
    }

    /// Recreates a previously cleared device together with its renderer.
    pub fn create_device(&mut self, vsync: bool) {
        if self.device.is_some() {
            debug!("device already present");
            return;
        }
        self.renderer = None;
        self.init_device(vsync);
        if self.device.is_some() && self.platform.is_some() {
            self.init_renderer();
        }
    }

    pub fn set_background_color(&mut self, r: u8, g: u8, b: u8) {
        match self.device.as_ref() {
            Some(device) => device.clear(r, g, b),
            None => debug!("background clear skipped: no device"),
        }
    }

    pub fn set_style(&mut self, preset: StylePreset) {
        match self.gui.as_mut() {
            Some(gui) => apply_style(gui, preset),
            None => warn!("style change skipped: no GUI context"),
        }
    }

    pub fn handle_message(&mut self, msg: u32, wparam: WPARAM, lparam: LPARAM) -> bool {
        let (Some(platform), Some(gui)) = (self.platform.as_mut(), self.gui.as_mut()) else {
            return false;
        };
        platform.handle_message(gui, msg, wparam, lparam)
    }

    pub fn has_device(&self) -> bool {
        self.device.is_some()
    }

    pub fn has_gui_context(&self) -> bool {
        self.gui.is_some()
    }

    pub fn back_buffer_size(&self) -> Option<(u32, u32)> {
        self.device.as_ref().map(Device::back_buffer_size)
    }

    /// Registry for host textures referenced from the GUI.
    pub fn textures_mut(&mut self) -> Option<&mut Textures<IDirect3DBaseTexture9>> {
        self.renderer.as_mut().map(D3d9Renderer::textures_mut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_claim_is_exclusive_until_dropped() {
        let first = GuiContext::acquire().expect("first claim");
        assert!(matches!(GuiContext::acquire(), Err(HostError::ContextExists)));
        drop(first);
        let again = GuiContext::acquire().expect("claim after release");
        drop(again);
    }
}
