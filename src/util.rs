//! Bit-level helpers for Win32 message payloads and packed colors.

/// Low-order word of a message payload. `WM_SIZE` carries the new client
/// width here.
pub fn loword(value: isize) -> u16 {
    (value as usize & 0xffff) as u16
}

/// High-order word of a message payload. `WM_SIZE` carries the new client
/// height here.
pub fn hiword(value: isize) -> u16 {
    ((value as usize >> 16) & 0xffff) as u16
}

/// Signed client-area x coordinate from a mouse message lparam. Negative
/// while the mouse is captured and dragged left of the client area.
pub fn x_lparam(value: isize) -> i32 {
    loword(value) as i16 as i32
}

/// Signed client-area y coordinate from a mouse message lparam.
pub fn y_lparam(value: isize) -> i32 {
    hiword(value) as i16 as i32
}

/// Signed high word of a wparam, as carried by wheel and xbutton messages.
pub fn signed_hiword(value: usize) -> i16 {
    ((value >> 16) & 0xffff) as i16
}

/// Packs channel bytes into a `D3DCOLOR` (ARGB) dword.
pub fn d3d_color(r: u8, g: u8, b: u8, a: u8) -> u32 {
    ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_split_a_size_payload() {
        let lparam = ((480usize << 16) | 640) as isize;
        assert_eq!(loword(lparam), 640);
        assert_eq!(hiword(lparam), 480);
    }

    #[test]
    fn mouse_coordinates_are_sign_extended() {
        let lparam = ((100usize << 16) | (-5i16 as u16 as usize)) as isize;
        assert_eq!(x_lparam(lparam), -5);
        assert_eq!(y_lparam(lparam), 100);

        let lparam = (((-12i16 as u16 as usize) << 16) | 30) as isize;
        assert_eq!(x_lparam(lparam), 30);
        assert_eq!(y_lparam(lparam), -12);
    }

    #[test]
    fn wheel_rotation_keeps_its_sign() {
        let wparam = ((-120i16 as u16 as usize) << 16) | 0x0008;
        assert_eq!(signed_hiword(wparam), -120);
        assert_eq!(signed_hiword((120usize << 16) | 0x0008), 120);
    }

    #[test]
    fn color_packs_as_argb() {
        assert_eq!(d3d_color(105, 105, 105, 255), 0xFF69_6969);
        assert_eq!(d3d_color(0x12, 0x34, 0x56, 0x78), 0x7812_3456);
        assert_eq!(d3d_color(255, 0, 0, 0), 0x00FF_0000);
    }
}
