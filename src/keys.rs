use imgui::Key;
use windows::Win32::UI::Input::KeyboardAndMouse::*;

/// Extended-key flag from bit 24 of a key message lparam. Distinguishes the
/// right control/alt keys and the keypad enter key.
fn extended(lparam: isize) -> bool {
    (lparam >> 24) & 1 == 1
}

/// Hardware scancode from bits 16..24 of a key message lparam.
fn scancode(lparam: isize) -> u8 {
    ((lparam >> 16) & 0xff) as u8
}

/// Maps a virtual key plus its key-message lparam to the GUI key identity.
/// Returns `None` for keys the GUI has no slot for.
pub(crate) fn map_virtual_key(vk: VIRTUAL_KEY, lparam: isize) -> Option<Key> {
    let key = match vk {
        VK_TAB => Key::Tab,
        VK_LEFT => Key::LeftArrow,
        VK_RIGHT => Key::RightArrow,
        VK_UP => Key::UpArrow,
        VK_DOWN => Key::DownArrow,
        VK_PRIOR => Key::PageUp,
        VK_NEXT => Key::PageDown,
        VK_HOME => Key::Home,
        VK_END => Key::End,
        VK_INSERT => Key::Insert,
        VK_DELETE => Key::Delete,
        VK_BACK => Key::Backspace,
        VK_SPACE => Key::Space,
        VK_RETURN if extended(lparam) => Key::KeypadEnter,
        VK_RETURN => Key::Enter,
        VK_ESCAPE => Key::Escape,
        VK_CONTROL if extended(lparam) => Key::RightCtrl,
        VK_CONTROL => Key::LeftCtrl,
        // both shifts report the same virtual key; the scancode tells them apart
        VK_SHIFT if scancode(lparam) == 0x36 => Key::RightShift,
        VK_SHIFT => Key::LeftShift,
        VK_MENU if extended(lparam) => Key::RightAlt,
        VK_MENU => Key::LeftAlt,
        VK_LWIN => Key::LeftSuper,
        VK_RWIN => Key::RightSuper,
        VK_APPS => Key::Menu,
        VK_OEM_7 => Key::Apostrophe,
        VK_OEM_COMMA => Key::Comma,
        VK_OEM_MINUS => Key::Minus,
        VK_OEM_PERIOD => Key::Period,
        VK_OEM_2 => Key::Slash,
        VK_OEM_1 => Key::Semicolon,
        VK_OEM_PLUS => Key::Equal,
        VK_OEM_4 => Key::LeftBracket,
        VK_OEM_5 => Key::Backslash,
        VK_OEM_6 => Key::RightBracket,
        VK_OEM_3 => Key::GraveAccent,
        VK_CAPITAL => Key::CapsLock,
        VK_SCROLL => Key::ScrollLock,
        VK_NUMLOCK => Key::NumLock,
        VK_SNAPSHOT => Key::PrintScreen,
        VK_PAUSE => Key::Pause,
        VK_NUMPAD0 => Key::Keypad0,
        VK_NUMPAD1 => Key::Keypad1,
        VK_NUMPAD2 => Key::Keypad2,
        VK_NUMPAD3 => Key::Keypad3,
        VK_NUMPAD4 => Key::Keypad4,
        VK_NUMPAD5 => Key::Keypad5,
        VK_NUMPAD6 => Key::Keypad6,
        VK_NUMPAD7 => Key::Keypad7,
        VK_NUMPAD8 => Key::Keypad8,
        VK_NUMPAD9 => Key::Keypad9,
        VK_DECIMAL => Key::KeypadDecimal,
        VK_DIVIDE => Key::KeypadDivide,
        VK_MULTIPLY => Key::KeypadMultiply,
        VK_SUBTRACT => Key::KeypadSubtract,
        VK_ADD => Key::KeypadAdd,
        VK_0 => Key::Alpha0,
        VK_1 => Key::Alpha1,
        VK_2 => Key::Alpha2,
        VK_3 => Key::Alpha3,
        VK_4 => Key::Alpha4,
        VK_5 => Key::Alpha5,
        VK_6 => Key::Alpha6,
        VK_7 => Key::Alpha7,
        VK_8 => Key::Alpha8,
        VK_9 => Key::Alpha9,
        VK_A => Key::A,
        VK_B => Key::B,
        VK_C => Key::C,
        VK_D => Key::D,
        VK_E => Key::E,
        VK_F => Key::F,
        VK_G => Key::G,
        VK_H => Key::H,
        VK_I => Key::I,
        VK_J => Key::J,
        VK_K => Key::K,
        VK_L => Key::L,
        VK_M => Key::M,
        VK_N => Key::N,
        VK_O => Key::O,
        VK_P => Key::P,
        VK_Q => Key::Q,
        VK_R => Key::R,
        VK_S => Key::S,
        VK_T => Key::T,
        VK_U => Key::U,
        VK_V => Key::V,
        VK_W => Key::W,
        VK_X => Key::X,
        VK_Y => Key::Y,
        VK_Z => Key::Z,
        VK_F1 => Key::F1,
        VK_F2 => Key::F2,
        VK_F3 => Key::F3,
        VK_F4 => Key::F4,
        VK_F5 => Key::F5,
        VK_F6 => Key::F6,
        VK_F7 => Key::F7,
        VK_F8 => Key::F8,
        VK_F9 => Key::F9,
        VK_F10 => Key::F10,
        VK_F11 => Key::F11,
        VK_F12 => Key::F12,
        _ => return None,
    };
    Some(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXTENDED_BIT: isize = 1 << 24;

    #[test]
    fn plain_keys_map_directly() {
        assert_eq!(map_virtual_key(VK_TAB, 0), Some(Key::Tab));
        assert_eq!(map_virtual_key(VK_A, 0), Some(Key::A));
        assert_eq!(map_virtual_key(VK_9, 0), Some(Key::Alpha9));
        assert_eq!(map_virtual_key(VK_F12, 0), Some(Key::F12));
    }

    #[test]
    fn extended_bit_selects_right_hand_keys() {
        assert_eq!(map_virtual_key(VK_CONTROL, 0), Some(Key::LeftCtrl));
        assert_eq!(map_virtual_key(VK_CONTROL, EXTENDED_BIT), Some(Key::RightCtrl));
        assert_eq!(map_virtual_key(VK_MENU, EXTENDED_BIT), Some(Key::RightAlt));
        assert_eq!(map_virtual_key(VK_RETURN, 0), Some(Key::Enter));
        assert_eq!(map_virtual_key(VK_RETURN, EXTENDED_BIT), Some(Key::KeypadEnter));
    }

    #[test]
    fn shift_sides_split_on_scancode() {
        assert_eq!(map_virtual_key(VK_SHIFT, 0x2A << 16), Some(Key::LeftShift));
        assert_eq!(map_virtual_key(VK_SHIFT, 0x36 << 16), Some(Key::RightShift));
    }

    #[test]
    fn unknown_keys_are_dropped() {
        assert_eq!(map_virtual_key(VIRTUAL_KEY(0xFF), 0), None);
        assert_eq!(map_virtual_key(VK_PROCESSKEY, 0), None);
    }
}
