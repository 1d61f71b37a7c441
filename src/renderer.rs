use imgui::{BackendFlags, Context, DrawCmd, DrawData, DrawIdx, TextureId, Textures};
use tracing::debug;
use windows::Win32::Foundation::RECT;
use windows::Win32::Graphics::Direct3D::{D3DMATRIX, D3DMATRIX_0};
use windows::Win32::Graphics::Direct3D9::*;

use crate::error::HostError;
use crate::util::d3d_color;

// growth slack keeps buffer recreation rare while widgets come and go
const VERTEX_BUFFER_SLACK: usize = 5000;
const INDEX_BUFFER_SLACK: usize = 10000;

const FVF_GUI: u32 = (D3DFVF_XYZ | D3DFVF_DIFFUSE | D3DFVF_TEX1) as u32;

// the world transform index is a macro in the C headers, not an enum value
const D3DTS_WORLD: D3DTRANSFORMSTATETYPE = D3DTRANSFORMSTATETYPE(256);

#[repr(C)]
struct GuiVertex {
    pos: [f32; 3],
    color: u32,
    uv: [f32; 2],
}

/// Draws GUI output through the fixed-function pipeline: dynamic write-only
/// vertex/index buffers, the font atlas as an `A8R8G8B8` texture, scissored
/// triangle lists, and a full pipeline-state backup around the pass.
///
/// Everything it allocates lives in the default pool, so the device reset
/// cycle is `invalidate_device_objects` -> reset -> `create_device_objects`.
pub(crate) struct D3d9Renderer {
    device: IDirect3DDevice9,
    vertex_buffer: Option<IDirect3DVertexBuffer9>,
    index_buffer: Option<IDirect3DIndexBuffer9>,
    vertex_capacity: usize,
    index_capacity: usize,
    textures: Textures<IDirect3DBaseTexture9>,
    font_texture: Option<TextureId>,
}

impl D3d9Renderer {
    pub fn new(device: &IDirect3DDevice9, ctx: &mut Context) -> Result<Self, HostError> {
        ctx.io_mut().backend_flags.insert(BackendFlags::RENDERER_HAS_VTX_OFFSET);
        let mut renderer = Self {
            device: device.clone(),
            vertex_buffer: None,
            index_buffer: None,
            vertex_capacity: 0,
            index_capacity: 0,
            textures: Textures::new(),
            font_texture: None,
        };
        renderer.create_device_objects(ctx)?;
        Ok(renderer)
    }

    /// (Re)creates the default-pool resources. Called at init and after every
    /// successful device reset; the buffers themselves are grown lazily.
    pub fn create_device_objects(&mut self, ctx: &mut Context) -> Result<(), HostError> {
        if self.font_texture.is_none() {
            self.upload_font_atlas(ctx)?;
        }
        Ok(())
    }

    /// Releases every default-pool resource so the device can be reset.
    pub fn invalidate_device_objects(&mut self, ctx: &mut Context) {
        self.vertex_buffer = None;
        self.vertex_capacity = 0;
        self.index_buffer = None;
        self.index_capacity = 0;
        if let Some(id) = self.font_texture.take() {
            self.textures.remove(id);
            ctx.fonts().tex_id = TextureId::new(0);
        }
    }

    /// Registry for textures the host wants to reference from the GUI, beyond
    /// the font atlas.
    pub fn textures_mut(&mut self) -> &mut Textures<IDirect3DBaseTexture9> {
        &mut self.textures
    }

    pub fn render(&mut self, draw_data: &DrawData) -> Result<(), HostError> {
        if draw_data.display_size[0] <= 0.0 || draw_data.display_size[1] <= 0.0 {
            return Ok(());
        }
        if draw_data.total_vtx_count <= 0 || draw_data.total_idx_count <= 0 {
            return Ok(());
        }
        self.ensure_buffers(
            draw_data.total_vtx_count as usize,
            draw_data.total_idx_count as usize,
        )?;
        self.upload_draw_data(draw_data)?;

        // capture the host's pipeline state so the pass leaves no trace
        let mut state_block = None;
        unsafe { self.device.CreateStateBlock(D3DSBT_ALL, &mut state_block) }
            .map_err(HostError::RendererResources)?;
        let Some(state_block) = state_block else {
            return Ok(());
        };
        if unsafe { state_block.Capture() }.is_err() {
            return Ok(());
        }
        // the state block does not cover the fixed-function transforms
        let mut last_world = D3DMATRIX::default();
        let mut last_view = D3DMATRIX::default();
        let mut last_projection = D3DMATRIX::default();
        unsafe {
            let _ = self.device.GetTransform(D3DTS_WORLD, &mut last_world);
            let _ = self.device.GetTransform(D3DTS_VIEW, &mut last_view);
            let _ = self.device.GetTransform(D3DTS_PROJECTION, &mut last_projection);
        }

        self.setup_render_state(draw_data);
        self.replay_commands(draw_data);

        unsafe {
            let _ = self.device.SetTransform(D3DTS_WORLD, &last_world);
            let _ = self.device.SetTransform(D3DTS_VIEW, &last_view);
            let _ = self.device.SetTransform(D3DTS_PROJECTION, &last_projection);
            let _ = state_block.Apply();
        }
        Ok(())
    }

    fn ensure_buffers(&mut self, vertices: usize, indices: usize) -> Result<(), HostError> {
        if self.vertex_buffer.is_none() || self.vertex_capacity < vertices {
            self.vertex_buffer = None;
            self.vertex_capacity = vertices + VERTEX_BUFFER_SLACK;
            let mut buffer = None;
            unsafe {
                self.device.CreateVertexBuffer(
                    (self.vertex_capacity * std::mem::size_of::<GuiVertex>()) as u32,
                    (D3DUSAGE_DYNAMIC | D3DUSAGE_WRITEONLY) as u32,
                    FVF_GUI,
                    D3DPOOL_DEFAULT,
                    &mut buffer,
                    std::ptr::null_mut(),
                )
            }
            .map_err(HostError::RendererResources)?;
            self.vertex_buffer = buffer;
        }
        if self.index_buffer.is_none() || self.index_capacity < indices {
            self.index_buffer = None;
            self.index_capacity = indices + INDEX_BUFFER_SLACK;
            let mut buffer = None;
            unsafe {
                self.device.CreateIndexBuffer(
                    (self.index_capacity * std::mem::size_of::<DrawIdx>()) as u32,
                    (D3DUSAGE_DYNAMIC | D3DUSAGE_WRITEONLY) as u32,
                    D3DFMT_INDEX16,
                    D3DPOOL_DEFAULT,
                    &mut buffer,
                    std::ptr::null_mut(),
                )
            }
            .map_err(HostError::RendererResources)?;
            self.index_buffer = buffer;
        }
        Ok(())
    }

    fn upload_draw_data(&mut self, draw_data: &DrawData) -> Result<(), HostError> {
        let (Some(vb), Some(ib)) = (self.vertex_buffer.as_ref(), self.index_buffer.as_ref())
        else {
            return Ok(());
        };
        let mut vtx_dst: *mut GuiVertex = std::ptr::null_mut();
        let mut idx_dst: *mut DrawIdx = std::ptr::null_mut();
        unsafe {
            vb.Lock(
                0,
                (draw_data.total_vtx_count as usize * std::mem::size_of::<GuiVertex>()) as u32,
                &mut vtx_dst as *mut _ as *mut *mut std::ffi::c_void,
                D3DLOCK_DISCARD as u32,
            )
            .map_err(HostError::RendererResources)?;
            if let Err(e) = ib.Lock(
                0,
                (draw_data.total_idx_count as usize * std::mem::size_of::<DrawIdx>()) as u32,
                &mut idx_dst as *mut _ as *mut *mut std::ffi::c_void,
                D3DLOCK_DISCARD as u32,
            ) {
                let _ = vb.Unlock();
                return Err(HostError::RendererResources(e));
            }
            for draw_list in draw_data.draw_lists() {
                for vertex in draw_list.vtx_buffer() {
                    *vtx_dst = GuiVertex {
                        pos: [vertex.pos[0], vertex.pos[1], 0.0],
                        color: d3d_color(vertex.col[0], vertex.col[1], vertex.col[2], vertex.col[3]),
                        uv: [vertex.uv[0], vertex.uv[1]],
                    };
                    vtx_dst = vtx_dst.add(1);
                }
                let indices = draw_list.idx_buffer();
                std::ptr::copy_nonoverlapping(indices.as_ptr(), idx_dst, indices.len());
                idx_dst = idx_dst.add(indices.len());
            }
            let _ = vb.Unlock();
            let _ = ib.Unlock();
        }
        Ok(())
    }

    fn setup_render_state(&self, draw_data: &DrawData) {
        let device = &self.device;
        let viewport = D3DVIEWPORT9 {
            X: 0,
            Y: 0,
            Width: draw_data.display_size[0] as u32,
            Height: draw_data.display_size[1] as u32,
            MinZ: 0.0,
            MaxZ: 1.0,
        };
        unsafe {
            let _ = device.SetViewport(&viewport);
            let _ = device.SetPixelShader(None);
            let _ = device.SetVertexShader(None);
            let _ = device.SetRenderState(D3DRS_FILLMODE, D3DFILL_SOLID.0 as u32);
            let _ = device.SetRenderState(D3DRS_SHADEMODE, D3DSHADE_GOURAUD.0 as u32);
            let _ = device.SetRenderState(D3DRS_ZWRITEENABLE, 0);
            let _ = device.SetRenderState(D3DRS_ALPHATESTENABLE, 0);
            let _ = device.SetRenderState(D3DRS_CULLMODE, D3DCULL_NONE.0 as u32);
            let _ = device.SetRenderState(D3DRS_ZENABLE, 0);
            let _ = device.SetRenderState(D3DRS_ALPHABLENDENABLE, 1);
            let _ = device.SetRenderState(D3DRS_BLENDOP, D3DBLENDOP_ADD.0 as u32);
            let _ = device.SetRenderState(D3DRS_SRCBLEND, D3DBLEND_SRCALPHA.0 as u32);
            let _ = device.SetRenderState(D3DRS_DESTBLEND, D3DBLEND_INVSRCALPHA.0 as u32);
            let _ = device.SetRenderState(D3DRS_SEPARATEALPHABLENDENABLE, 1);
            let _ = device.SetRenderState(D3DRS_SRCBLENDALPHA, D3DBLEND_ONE.0 as u32);
            let _ = device.SetRenderState(D3DRS_DESTBLENDALPHA, D3DBLEND_INVSRCALPHA.0 as u32);
            let _ = device.SetRenderState(D3DRS_SCISSORTESTENABLE, 1);
            let _ = device.SetRenderState(D3DRS_FOGENABLE, 0);
            let _ = device.SetRenderState(D3DRS_RANGEFOGENABLE, 0);
            let _ = device.SetRenderState(D3DRS_SPECULARENABLE, 0);
            let _ = device.SetRenderState(D3DRS_STENCILENABLE, 0);
            let _ = device.SetRenderState(D3DRS_CLIPPING, 1);
            let _ = device.SetRenderState(D3DRS_LIGHTING, 0);
            let _ = device.SetTextureStageState(0, D3DTSS_COLOROP, D3DTOP_MODULATE.0 as u32);
            let _ = device.SetTextureStageState(0, D3DTSS_COLORARG1, D3DTA_TEXTURE as u32);
            let _ = device.SetTextureStageState(0, D3DTSS_COLORARG2, D3DTA_DIFFUSE as u32);
            let _ = device.SetTextureStageState(0, D3DTSS_ALPHAOP, D3DTOP_MODULATE.0 as u32);
            let _ = device.SetTextureStageState(0, D3DTSS_ALPHAARG1, D3DTA_TEXTURE as u32);
            let _ = device.SetTextureStageState(0, D3DTSS_ALPHAARG2, D3DTA_DIFFUSE as u32);
            let _ = device.SetSamplerState(0, D3DSAMP_MINFILTER, D3DTEXF_LINEAR.0 as u32);
            let _ = device.SetSamplerState(0, D3DSAMP_MAGFILTER, D3DTEXF_LINEAR.0 as u32);

            let identity = matrix(IDENTITY);
            let projection =
                matrix(projection_matrix(draw_data.display_pos, draw_data.display_size));
            let _ = device.SetTransform(D3DTS_WORLD, &identity);
            let _ = device.SetTransform(D3DTS_VIEW, &identity);
            let _ = device.SetTransform(D3DTS_PROJECTION, &projection);

            let _ = device.SetStreamSource(
                0,
                self.vertex_buffer.as_ref(),
                0,
                std::mem::size_of::<GuiVertex>() as u32,
            );
            let _ = device.SetIndices(self.index_buffer.as_ref());
            let _ = device.SetFVF(FVF_GUI);
        }
    }

    fn replay_commands(&self, draw_data: &DrawData) {
        let clip_off = draw_data.display_pos;
        let mut global_vtx_offset = 0usize;
        let mut global_idx_offset = 0usize;
        for draw_list in draw_data.draw_lists() {
            for command in draw_list.commands() {
                match command {
                    DrawCmd::Elements { count, cmd_params } => {
                        let clip_min = [
                            cmd_params.clip_rect[0] - clip_off[0],
                            cmd_params.clip_rect[1] - clip_off[1],
                        ];
                        let clip_max = [
                            cmd_params.clip_rect[2] - clip_off[0],
                            cmd_params.clip_rect[3] - clip_off[1],
                        ];
                        if clip_max[0] <= clip_min[0] || clip_max[1] <= clip_min[1] {
                            continue;
                        }
                        let Some(texture) = self.textures.get(cmd_params.texture_id) else {
                            debug!(
                                "skipping draw command with unregistered texture id {}",
                                cmd_params.texture_id.id()
                            );
                            continue;
                        };
                        let scissor = RECT {
                            left: clip_min[0] as i32,
                            top: clip_min[1] as i32,
                            right: clip_max[0] as i32,
                            bottom: clip_max[1] as i32,
                        };
                        unsafe {
                            let _ = self.device.SetTexture(0, texture);
                            let _ = self.device.SetScissorRect(&scissor);
                            let _ = self.device.DrawIndexedPrimitive(
                                D3DPT_TRIANGLELIST,
                                (global_vtx_offset + cmd_params.vtx_offset) as i32,
                                0,
                                draw_list.vtx_buffer().len() as u32,
                                (global_idx_offset + cmd_params.idx_offset) as u32,
                                count as u32 / 3,
                            );
                        }
                    }
                    DrawCmd::ResetRenderState => self.setup_render_state(draw_data),
                    DrawCmd::RawCallback { .. } => {
                        debug!("raw draw-list callbacks are not supported");
                    }
                }
            }
            global_idx_offset += draw_list.idx_buffer().len();
            global_vtx_offset += draw_list.vtx_buffer().len();
        }
    }

    fn upload_font_atlas(&mut self, ctx: &mut Context) -> Result<(), HostError> {
        let fonts = ctx.fonts();
        let atlas = fonts.build_rgba32_texture();
        let mut texture: Option<IDirect3DTexture9> = None;
        unsafe {
            self.device.CreateTexture(
                atlas.width,
                atlas.height,
                1,
                D3DUSAGE_DYNAMIC as u32,
                D3DFMT_A8R8G8B8,
                D3DPOOL_DEFAULT,
                &mut texture,
                std::ptr::null_mut(),
            )
        }
        .map_err(HostError::RendererResources)?;
        let texture =
            texture.ok_or_else(|| HostError::RendererResources(windows::core::Error::empty()))?;

        let mut locked = D3DLOCKED_RECT::default();
        unsafe { texture.LockRect(0, &mut locked, std::ptr::null(), 0) }
            .map_err(HostError::RendererResources)?;
        let width = atlas.width as usize;
        for y in 0..atlas.height as usize {
            let src = &atlas.data[y * width * 4..][..width * 4];
            let dst = unsafe {
                std::slice::from_raw_parts_mut(
                    (locked.pBits as *mut u8).add(y * locked.Pitch as usize),
                    width * 4,
                )
            };
            rgba_to_bgra(src, dst);
        }
        unsafe { texture.UnlockRect(0) }.map_err(HostError::RendererResources)?;

        let id = self.textures.insert(texture.into());
        ctx.fonts().tex_id = id;
        self.font_texture = Some(id);
        Ok(())
    }
}

fn rgba_to_bgra(src: &[u8], dst: &mut [u8]) {
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        d[0] = s[2];
        d[1] = s[1];
        d[2] = s[0];
        d[3] = s[3];
    }
}

fn matrix(m: [f32; 16]) -> D3DMATRIX {
    D3DMATRIX {
        Anonymous: D3DMATRIX_0 { m },
    }
}

#[rustfmt::skip]
const IDENTITY: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 1.0, 0.0,
    0.0, 0.0, 0.0, 1.0,
];

/// Orthographic projection over the display rectangle, with the half-pixel
/// offset the fixed-function pipeline needs for texel-exact text.
#[rustfmt::skip]
fn projection_matrix(display_pos: [f32; 2], display_size: [f32; 2]) -> [f32; 16] {
    let l = display_pos[0] + 0.5;
    let r = display_pos[0] + display_size[0] + 0.5;
    let t = display_pos[1] + 0.5;
    let b = display_pos[1] + display_size[1] + 0.5;
    [
        2.0 / (r - l),       0.0,                 0.0, 0.0,
        0.0,                 2.0 / (t - b),       0.0, 0.0,
        0.0,                 0.0,                 0.5, 0.0,
        (l + r) / (l - r),   (t + b) / (b - t),   0.5, 1.0,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_layout_matches_the_declared_fvf() {
        // XYZ (12 bytes) + DIFFUSE (4) + TEX1 (8)
        assert_eq!(std::mem::size_of::<GuiVertex>(), 24);
        assert_eq!(FVF_GUI, 0x142);
    }

    #[test]
    fn projection_maps_the_display_rect_to_clip_space() {
        let m = projection_matrix([0.0, 0.0], [800.0, 600.0]);
        assert!((m[0] - 2.0 / 800.0).abs() < 1e-6);
        assert!((m[5] + 2.0 / 600.0).abs() < 1e-6);
        // translation lands the top-left corner at (-1, 1)
        assert!((m[12] + 1.0).abs() < 0.01);
        assert!((m[13] - 1.0).abs() < 0.01);
        assert_eq!(m[10], 0.5);
        assert_eq!(m[15], 1.0);
    }

    #[test]
    fn font_pixels_swizzle_to_bgra() {
        let src = [1u8, 2, 3, 4, 5, 6, 7, 8];
        let mut dst = [0u8; 8];
        rgba_to_bgra(&src, &mut dst);
        assert_eq!(dst, [3, 2, 1, 4, 7, 6, 5, 8]);
    }
}
