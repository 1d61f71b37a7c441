use tracing::warn;
use windows::core::BOOL;
use windows::Win32::Foundation::HWND;
use windows::Win32::Graphics::Direct3D9::*;

use crate::error::HostError;
use crate::util::d3d_color;

/// Direct3D 9 runtime and device pair, plus the presentation parameters the
/// device was created with. The parameters are mutated on resize and handed
/// back to `Reset`, so they always describe the current back buffer.
pub(crate) struct Device {
    // the runtime outlives the device it created
    _d3d9: IDirect3D9,
    device: IDirect3DDevice9,
    params: D3DPRESENT_PARAMETERS,
}

impl Device {
    pub fn create(hwnd: HWND, vsync: bool) -> Result<Self, HostError> {
        let d3d9 =
            unsafe { Direct3DCreate9(D3D_SDK_VERSION) }.ok_or(HostError::Direct3DUnavailable)?;
        let mut params = present_parameters(vsync);
        let mut device = None;
        unsafe {
            d3d9.CreateDevice(
                D3DADAPTER_DEFAULT,
                D3DDEVTYPE_HAL,
                hwnd,
                D3DCREATE_HARDWARE_VERTEXPROCESSING as u32,
                &mut params,
                &mut device,
            )
        }
        .map_err(HostError::DeviceCreation)?;
        let device =
            device.ok_or_else(|| HostError::DeviceCreation(windows::core::Error::empty()))?;
        Ok(Self { _d3d9: d3d9, device, params })
    }

    /// Resets the device against the current presentation parameters. All
    /// default-pool resources must have been released beforehand; the runtime
    /// answers a reset with live device objects with `D3DERR_INVALIDCALL`,
    /// which is unrecoverable and aborts the process.
    ///
    /// Returns `true` when the device is usable again. Any other failure is
    /// logged and retried after a later present reports the device lost.
    pub fn reset(&mut self) -> bool {
        match unsafe { self.device.Reset(&mut self.params) } {
            Ok(()) => true,
            Err(e) if e.code() == D3DERR_INVALIDCALL => {
                panic!("device reset rejected as an invalid call; a device object was still alive")
            }
            Err(e) => {
                warn!("device reset failed, retrying after the next present: {e}");
                false
            }
        }
    }

    /// Records a new back-buffer size for the next reset.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.params.BackBufferWidth = width;
        self.params.BackBufferHeight = height;
    }

    pub fn begin_scene(&self) -> bool {
        unsafe { self.device.BeginScene() }.is_ok()
    }

    pub fn end_scene(&self) {
        if let Err(e) = unsafe { self.device.EndScene() } {
            warn!("EndScene failed: {e}");
        }
    }

    pub fn present(&self) -> windows::core::Result<()> {
        unsafe {
            self.device
                .Present(std::ptr::null(), std::ptr::null(), None, std::ptr::null())
        }
    }

    /// True when a lost device is ready to be reset.
    pub fn needs_reset(&self) -> bool {
        matches!(
            unsafe { self.device.TestCooperativeLevel() },
            Err(e) if e.code() == D3DERR_DEVICENOTRESET
        )
    }

    /// Clears the back buffer to an opaque color with depth writes, alpha
    /// blending, and scissoring off, so the whole surface is painted.
    pub fn clear(&self, r: u8, g: u8, b: u8) {
        unsafe {
            let _ = self.device.SetRenderState(D3DRS_ZENABLE, 0);
            let _ = self.device.SetRenderState(D3DRS_ALPHABLENDENABLE, 0);
            let _ = self.device.SetRenderState(D3DRS_SCISSORTESTENABLE, 0);
            let _ = self.device.Clear(
                0,
                std::ptr::null(),
                (D3DCLEAR_TARGET | D3DCLEAR_ZBUFFER) as u32,
                d3d_color(r, g, b, 255),
                1.0,
                0,
            );
        }
    }

    pub fn back_buffer_size(&self) -> (u32, u32) {
        (self.params.BackBufferWidth, self.params.BackBufferHeight)
    }

    pub fn raw(&self) -> &IDirect3DDevice9 {
        &self.device
    }
}

/// Windowed-mode presentation parameters: discard swap effect, back buffer in
/// the current display format, a 16-bit depth buffer, and a presentation
/// interval picked by the vsync flag. The device window is left unset; the
/// focus window given to `CreateDevice` covers it.
fn present_parameters(vsync: bool) -> D3DPRESENT_PARAMETERS {
    D3DPRESENT_PARAMETERS {
        Windowed: BOOL(1),
        SwapEffect: D3DSWAPEFFECT_DISCARD,
        BackBufferFormat: D3DFMT_UNKNOWN,
        EnableAutoDepthStencil: BOOL(1),
        AutoDepthStencilFormat: D3DFMT_D16,
        PresentationInterval: if vsync {
            D3DPRESENT_INTERVAL_ONE as u32
        } else {
            D3DPRESENT_INTERVAL_IMMEDIATE as u32
        },
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presentation_parameters_follow_the_vsync_flag() {
        let params = present_parameters(true);
        assert_eq!(params.PresentationInterval, D3DPRESENT_INTERVAL_ONE as u32);
        let params = present_parameters(false);
        assert_eq!(params.PresentationInterval, D3DPRESENT_INTERVAL_IMMEDIATE as u32);
    }

    #[test]
    fn presentation_parameters_describe_a_windowed_swap_chain() {
        let params = present_parameters(true);
        assert_eq!(params.Windowed, BOOL(1));
        assert_eq!(params.SwapEffect, D3DSWAPEFFECT_DISCARD);
        assert_eq!(params.BackBufferFormat, D3DFMT_UNKNOWN);
        assert_eq!(params.EnableAutoDepthStencil, BOOL(1));
        assert_eq!(params.AutoDepthStencilFormat, D3DFMT_D16);
        // zero until the first explicit resize; the runtime sizes the back
        // buffer from the window
        assert_eq!(params.BackBufferWidth, 0);
        assert_eq!(params.BackBufferHeight, 0);
    }
}
