#![cfg(windows)]

//! Lifecycle tests against the live Win32 message queue. Windows, classes and
//! the GUI context are process-wide, so everything runs under one lock, each
//! test with its own class name. Device creation can fail on machines without
//! a usable adapter; tests only rely on it after checking `has_device`.

use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use imgui_dx9_host::{default_wnd_proc, ImguiHost, WindowConfig};
use windows::Win32::Foundation::{LPARAM, WPARAM};
use windows::Win32::UI::WindowsAndMessaging::{PostMessageW, SW_HIDE, WM_CLOSE, WM_SIZE};

fn serial() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

fn hidden(title: &str, class: &str) -> ImguiHost {
    ImguiHost::new(
        WindowConfig::new(title)
            .with_class_name(class)
            .with_show_command(SW_HIDE),
    )
}

#[test]
fn construction_yields_a_window_and_a_gui_context() {
    let _guard = serial();
    let mut host = hidden("construction", "host_test_construction");
    assert!(host.window_handle().is_some());
    assert!(host.has_gui_context());
    assert!(host.process_message());
}

#[test]
fn close_message_stops_the_pump() {
    let _guard = serial();
    let mut host = hidden("close", "host_test_close");
    let hwnd = host.window_handle().expect("window");
    unsafe { PostMessageW(Some(hwnd), WM_CLOSE, WPARAM(0), LPARAM(0)) }.expect("post close");
    let mut stopped = false;
    for _ in 0..100 {
        if !host.process_message() {
            stopped = true;
            break;
        }
    }
    assert!(stopped, "pump kept running after the window was closed");
}

#[test]
fn colliding_class_names_degrade_the_second_host() {
    let _guard = serial();
    let first = hidden("first", "host_test_collision");
    let mut second = hidden("second", "host_test_collision");
    assert!(first.window_handle().is_some());
    assert!(second.window_handle().is_none());
    assert!(!second.process_message());
    assert!(second.start_frame().is_none());
}

#[test]
fn gui_context_is_exclusive_across_hosts() {
    let _guard = serial();
    let first = hidden("holder", "host_test_ctx_holder");
    let mut second = hidden("contender", "host_test_ctx_contender");
    assert!(first.has_gui_context());
    assert!(second.window_handle().is_some());
    assert!(!second.has_gui_context());
    assert!(second.start_frame().is_none());
    drop(first);
    let third = hidden("late", "host_test_ctx_late");
    assert!(third.has_gui_context());
}

#[test]
fn size_message_updates_the_back_buffer() {
    let _guard = serial();
    let host = hidden("resize", "host_test_resize");
    if !host.has_device() {
        eprintln!("no device in this environment, skipping");
        return;
    }
    let hwnd = host.window_handle().expect("window");
    // width in the low word, height in the high word
    let lparam = LPARAM((480isize << 16) | 640);
    unsafe { default_wnd_proc(hwnd, WM_SIZE, WPARAM(0), lparam) };
    assert_eq!(host.back_buffer_size(), Some((640, 480)));
}

#[test]
fn clear_device_is_idempotent_and_reversible() {
    let _guard = serial();
    let mut host = hidden("clear", "host_test_clear");
    let had_device = host.has_device();
    host.clear_device();
    assert!(!host.has_device());
    assert!(host.start_frame().is_none());
    host.clear_device();
    assert!(!host.has_device());
    host.create_device();
    assert_eq!(host.has_device(), had_device);
    if had_device {
        assert!(host.start_frame().is_some());
        host.end_frame();
    }
}

#[test]
fn dropped_host_releases_its_class_and_quit_message() {
    let _guard = serial();
    let first = hidden("reborn", "host_test_reborn");
    assert!(first.window_handle().is_some());
    drop(first);
    let mut second = hidden("reborn again", "host_test_reborn");
    assert!(second.window_handle().is_some());
    assert!(second.has_gui_context());
    assert!(second.process_message());
}
