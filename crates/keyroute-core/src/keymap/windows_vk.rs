//! Windows Virtual Key (VK) codes and their human-readable names.
//!
//! Reference: Windows Virtual-Key Codes (winuser.h).
//! Windows VK codes range from 0x00 to 0xFF.
//!
//! # What is a Windows Virtual Key (VK) code? (for beginners)
//!
//! Windows assigns each keyboard key a number called a "Virtual Key code".
//! These are defined in `<winuser.h>` and named `VK_*` (e.g., `VK_RETURN = 0x0D`,
//! `VK_SPACE = 0x20`).  They are "virtual" because they represent *logical* keys
//! rather than physical scan codes: pressing the letter A on any keyboard layout
//! always produces `VK_A = 0x41`.
//!
//! Mouse buttons have VK codes too (`VK_LBUTTON = 0x01` …); the mouse hook
//! reports button events using them so that key filters work for both
//! device classes.
//!
//! # How this table works
//!
//! `VK_NAME_TABLE` is a static array of 256 optional names,
//! indexed by VK code.  Position 0x41 holds `"A"`.  Codes without a
//! conventional name hold `None` and are rendered as hex.

pub const VK_LBUTTON: u32 = 0x01;
pub const VK_RBUTTON: u32 = 0x02;
pub const VK_MBUTTON: u32 = 0x04;
pub const VK_XBUTTON1: u32 = 0x05;
pub const VK_XBUTTON2: u32 = 0x06;
pub const VK_BACK: u32 = 0x08;
pub const VK_TAB: u32 = 0x09;
pub const VK_RETURN: u32 = 0x0D;
pub const VK_SHIFT: u32 = 0x10;
pub const VK_CONTROL: u32 = 0x11;
pub const VK_MENU: u32 = 0x12;
pub const VK_PAUSE: u32 = 0x13;
pub const VK_CAPITAL: u32 = 0x14;
/// The default disengage key.
pub const VK_ESCAPE: u32 = 0x1B;
pub const VK_SPACE: u32 = 0x20;
pub const VK_LEFT: u32 = 0x25;
pub const VK_UP: u32 = 0x26;
pub const VK_RIGHT: u32 = 0x27;
pub const VK_DOWN: u32 = 0x28;
pub const VK_F1: u32 = 0x70;
pub const VK_SCROLL: u32 = 0x91;

/// Returns the conventional name of `vk`, if it has one.
pub fn vk_name(vk: u32) -> Option<&'static str> {
    usize::try_from(vk)
        .ok()
        .and_then(|idx| VK_NAME_TABLE.get(idx))
        .copied()
        .flatten()
}

/// Looks up a VK code by name, ignoring ASCII case.
pub fn vk_from_name(name: &str) -> Option<u32> {
    // Linear scan is acceptable: names are only parsed at startup.
    VK_NAME_TABLE
        .iter()
        .position(|entry| entry.is_some_and(|n| n.eq_ignore_ascii_case(name)))
        .map(|idx| idx as u32)
        .or_else(|| alias(name))
}

/// Alternative spellings accepted on input but never produced on output.
fn alias(name: &str) -> Option<u32> {
    let code = match name.to_ascii_lowercase().as_str() {
        "esc" => VK_ESCAPE,
        "enter" => VK_RETURN,
        "backspace" => VK_BACK,
        "ctrl" => VK_CONTROL,
        "alt" => VK_MENU,
        "capslock" => VK_CAPITAL,
        "scrolllock" => VK_SCROLL,
        "lmb" => VK_LBUTTON,
        "rmb" => VK_RBUTTON,
        "mmb" => VK_MBUTTON,
        _ => return None,
    };
    Some(code)
}

/// VK → name table indexed by VK code (0x00–0xFF).
static VK_NAME_TABLE: [Option<&'static str>; 256] = {
    let mut t: [Option<&'static str>; 256] = [None; 256];

    // ── Mouse buttons ─────────────────────────────────────────────────────────
    t[0x01] = Some("LButton");
    t[0x02] = Some("RButton");
    t[0x04] = Some("MButton");
    t[0x05] = Some("XButton1");
    t[0x06] = Some("XButton2");

    // ── Editing and control ───────────────────────────────────────────────────
    t[0x08] = Some("Back");
    t[0x09] = Some("Tab");
    t[0x0D] = Some("Return");
    t[0x10] = Some("Shift");
    t[0x11] = Some("Control");
    t[0x12] = Some("Menu");
    t[0x13] = Some("Pause");
    t[0x14] = Some("Capital");
    t[0x1B] = Some("Escape");
    t[0x20] = Some("Space");

    // ── Navigation ────────────────────────────────────────────────────────────
    t[0x21] = Some("PageUp");
    t[0x22] = Some("PageDown");
    t[0x23] = Some("End");
    t[0x24] = Some("Home");
    t[0x25] = Some("Left");
    t[0x26] = Some("Up");
    t[0x27] = Some("Right");
    t[0x28] = Some("Down");
    t[0x2C] = Some("Snapshot");
    t[0x2D] = Some("Insert");
    t[0x2E] = Some("Delete");

    // ── Digits (VK_0=0x30 … VK_9=0x39) ────────────────────────────────────────
    t[0x30] = Some("0");
    t[0x31] = Some("1");
    t[0x32] = Some("2");
    t[0x33] = Some("3");
    t[0x34] = Some("4");
    t[0x35] = Some("5");
    t[0x36] = Some("6");
    t[0x37] = Some("7");
    t[0x38] = Some("8");
    t[0x39] = Some("9");

    // ── Alphabet keys (VK_A=0x41 … VK_Z=0x5A) ─────────────────────────────────
    t[0x41] = Some("A");
    t[0x42] = Some("B");
    t[0x43] = Some("C");
    t[0x44] = Some("D");
    t[0x45] = Some("E");
    t[0x46] = Some("F");
    t[0x47] = Some("G");
    t[0x48] = Some("H");
    t[0x49] = Some("I");
    t[0x4A] = Some("J");
    t[0x4B] = Some("K");
    t[0x4C] = Some("L");
    t[0x4D] = Some("M");
    t[0x4E] = Some("N");
    t[0x4F] = Some("O");
    t[0x50] = Some("P");
    t[0x51] = Some("Q");
    t[0x52] = Some("R");
    t[0x53] = Some("S");
    t[0x54] = Some("T");
    t[0x55] = Some("U");
    t[0x56] = Some("V");
    t[0x57] = Some("W");
    t[0x58] = Some("X");
    t[0x59] = Some("Y");
    t[0x5A] = Some("Z");

    // ── Windows keys ──────────────────────────────────────────────────────────
    t[0x5B] = Some("LWin");
    t[0x5C] = Some("RWin");
    t[0x5D] = Some("Apps");

    // ── Numpad ────────────────────────────────────────────────────────────────
    t[0x60] = Some("Numpad0");
    t[0x61] = Some("Numpad1");
    t[0x62] = Some("Numpad2");
    t[0x63] = Some("Numpad3");
    t[0x64] = Some("Numpad4");
    t[0x65] = Some("Numpad5");
    t[0x66] = Some("Numpad6");
    t[0x67] = Some("Numpad7");
    t[0x68] = Some("Numpad8");
    t[0x69] = Some("Numpad9");
    t[0x6A] = Some("Multiply");
    t[0x6B] = Some("Add");
    t[0x6D] = Some("Subtract");
    t[0x6E] = Some("Decimal");
    t[0x6F] = Some("Divide");

    // ── Function keys (VK_F1=0x70 … VK_F12=0x7B) ──────────────────────────────
    t[0x70] = Some("F1");
    t[0x71] = Some("F2");
    t[0x72] = Some("F3");
    t[0x73] = Some("F4");
    t[0x74] = Some("F5");
    t[0x75] = Some("F6");
    t[0x76] = Some("F7");
    t[0x77] = Some("F8");
    t[0x78] = Some("F9");
    t[0x79] = Some("F10");
    t[0x7A] = Some("F11");
    t[0x7B] = Some("F12");

    // ── Locks and side-specific modifiers ─────────────────────────────────────
    t[0x90] = Some("NumLock");
    t[0x91] = Some("Scroll");
    t[0xA0] = Some("LShift");
    t[0xA1] = Some("RShift");
    t[0xA2] = Some("LControl");
    t[0xA3] = Some("RControl");
    t[0xA4] = Some("LMenu");
    t[0xA5] = Some("RMenu");

    t
};
