#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

#[cfg(windows)]
fn main() -> anyhow::Result<()> {
    use imgui_dx9_host::{ImguiHost, StylePreset, WindowConfig};
    use tracing::info;

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();
    info!("starting demo window");

    let mut host = ImguiHost::new(
        WindowConfig::new("imgui-dx9-host demo")
            .with_size(1280, 800)
            .with_style(StylePreset::Dark),
    );
    let vsync = host.vsync();

    let mut demo_open = true;
    while host.process_message() {
        if let Some(ui) = host.start_frame() {
            if demo_open {
                ui.show_demo_window(&mut demo_open);
            }
            ui.window("status")
                .size([260.0, 90.0], imgui_dx9_host::imgui::Condition::FirstUseEver)
                .build(|| {
                    ui.text(format!("{:.1} fps", ui.io().framerate));
                    ui.text(if vsync { "vsync on" } else { "vsync off" });
                });
        }
        host.end_frame();
        host.set_background_color(105, 105, 105);
    }
    info!("quit message received, shutting down");
    Ok(())
}

#[cfg(not(windows))]
fn main() {}
