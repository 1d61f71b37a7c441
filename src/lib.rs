//! A Win32 window, a Direct3D 9 device and a Dear ImGui frame loop bundled
//! into one struct. [`ImguiHost`] owns the whole stack; the per-frame surface
//! is three calls:
//!
//! ```no_run
//! # #[cfg(windows)] {
//! use imgui_dx9_host::{ImguiHost, WindowConfig};
//!
//! let mut host = ImguiHost::new(WindowConfig::new("demo"));
//! while host.process_message() {
//!     if let Some(ui) = host.start_frame() {
//!         ui.text("hello");
//!     }
//!     host.end_frame();
//! }
//! # }
//! ```
//!
//! Construction never fails: a host whose window, device or GUI context could
//! not be built logs the failure and degrades, with `process_message`
//! returning `false` or `start_frame` returning `None`.

pub mod util;

#[cfg(windows)]
pub mod config;
#[cfg(windows)]
pub mod device;
#[cfg(windows)]
pub mod error;
#[cfg(windows)]
pub mod host;
#[cfg(windows)]
mod keys;
#[cfg(windows)]
mod platform;
#[cfg(windows)]
mod renderer;
#[cfg(windows)]
mod state;
#[cfg(windows)]
pub mod window;

#[cfg(windows)]
pub use config::{StylePreset, WindowConfig};
#[cfg(windows)]
pub use error::HostError;
#[cfg(windows)]
pub use host::ImguiHost;
#[cfg(windows)]
pub use window::{default_wnd_proc, load_icon};

#[cfg(windows)]
pub use imgui;
