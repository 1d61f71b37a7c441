use windows::Win32::UI::WindowsAndMessaging::{
    CS_CLASSDC, HICON, SW_SHOW, SHOW_WINDOW_CMD, WINDOW_STYLE, WNDCLASS_STYLES, WNDPROC,
    WS_OVERLAPPEDWINDOW,
};

/// Built-in color schemes of the GUI library.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StylePreset {
    Classic,
    #[default]
    Dark,
    Light,
}

/// Everything the host decides up front: window appearance, device vsync,
/// and optionally a replacement window procedure.
///
/// The defaults reproduce a plain 1280x720 overlapped window with vsync on.
#[derive(Clone, Debug)]
pub struct WindowConfig {
    pub title: String,
    pub class_name: String,
    pub position: (i32, i32),
    pub size: (i32, i32),
    pub class_style: WNDCLASS_STYLES,
    pub window_style: WINDOW_STYLE,
    pub show_command: SHOW_WINDOW_CMD,
    pub icon: HICON,
    pub small_icon: HICON,
    pub vsync: bool,
    pub style_preset: StylePreset,
    /// Replacement window procedure. `None` installs the crate's
    /// [`default_wnd_proc`](crate::default_wnd_proc); a replacement usually
    /// delegates to it for the messages it does not care about.
    pub wnd_proc: WNDPROC,
}

impl WindowConfig {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            class_name: "imgui_dx9_host".to_string(),
            position: (0, 0),
            size: (1280, 720),
            class_style: CS_CLASSDC,
            window_style: WS_OVERLAPPEDWINDOW,
            show_command: SW_SHOW,
            icon: HICON::default(),
            small_icon: HICON::default(),
            vsync: true,
            style_preset: StylePreset::default(),
            wnd_proc: None,
        }
    }

    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = class_name.into();
        self
    }

    pub fn with_position(mut self, x: i32, y: i32) -> Self {
        self.position = (x, y);
        self
    }

    pub fn with_size(mut self, width: i32, height: i32) -> Self {
        self.size = (width, height);
        self
    }

    pub fn with_class_style(mut self, style: WNDCLASS_STYLES) -> Self {
        self.class_style = style;
        self
    }

    pub fn with_window_style(mut self, style: WINDOW_STYLE) -> Self {
        self.window_style = style;
        self
    }

    pub fn with_show_command(mut self, command: SHOW_WINDOW_CMD) -> Self {
        self.show_command = command;
        self
    }

    pub fn with_icon(mut self, icon: HICON) -> Self {
        self.icon = icon;
        self
    }

    pub fn with_small_icon(mut self, icon: HICON) -> Self {
        self.small_icon = icon;
        self
    }

    pub fn with_vsync(mut self, vsync: bool) -> Self {
        self.vsync = vsync;
        self
    }

    pub fn with_style(mut self, preset: StylePreset) -> Self {
        self.style_preset = preset;
        self
    }

    pub fn with_wnd_proc(
        mut self,
        wnd_proc: unsafe extern "system" fn(
            windows::Win32::Foundation::HWND,
            u32,
            windows::Win32::Foundation::WPARAM,
            windows::Win32::Foundation::LPARAM,
        ) -> windows::Win32::Foundation::LRESULT,
    ) -> Self {
        self.wnd_proc = Some(wnd_proc);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_plain_window() {
        let config = WindowConfig::new("demo");
        assert_eq!(config.title, "demo");
        assert_eq!(config.size, (1280, 720));
        assert_eq!(config.position, (0, 0));
        assert_eq!(config.class_style, CS_CLASSDC);
        assert_eq!(config.window_style, WS_OVERLAPPEDWINDOW);
        assert!(config.vsync);
        assert_eq!(config.style_preset, StylePreset::Dark);
        assert!(config.wnd_proc.is_none());
        assert!(config.icon.is_invalid());
    }

    #[test]
    fn builders_override_fields() {
        let config = WindowConfig::new("demo")
            .with_class_name("demo_class")
            .with_size(800, 600)
            .with_position(10, 20)
            .with_vsync(false)
            .with_style(StylePreset::Light);
        assert_eq!(config.class_name, "demo_class");
        assert_eq!(config.size, (800, 600));
        assert_eq!(config.position, (10, 20));
        assert!(!config.vsync);
        assert_eq!(config.style_preset, StylePreset::Light);
    }
}
