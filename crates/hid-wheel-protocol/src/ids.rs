//! Identity and wire constants for the emulated wheel.

#![deny(static_mut_refs)]

/// USB vendor ID advertised by the virtual wheel (Logitech).
pub const WHEEL_VENDOR_ID: u16 = 0x046D;

/// USB product ID advertised by the virtual wheel (G29, PlayStation mode).
///
/// Matches kernel `USB_DEVICE_ID_LOGITECH_G29_WHEEL = 0xc24f`; games that
/// special-case the G29 will recognize the virtual device by this PID.
pub const WHEEL_PRODUCT_ID: u16 = 0xC24F;

/// Command bytes recognized in the FFB output stream.
///
/// The first byte of every packet selects the command; payload layout is
/// documented per-command in [`crate::command`].
pub mod commands {
    /// Set constant force. Magnitude in byte 2, unsigned, 0x80 = center.
    pub const CONSTANT_FORCE: u8 = 0x11;
    /// Stop force output.
    pub const STOP_FORCE: u8 = 0x13;
    /// Enable the default autocenter spring.
    pub const DEFAULT_AUTOCENTER: u8 = 0x14;
    /// Disable the autocenter spring.
    pub const DISABLE_AUTOCENTER: u8 = 0xF5;
    /// Configure autocenter spring strength.
    pub const SET_AUTOCENTER: u8 = 0xFE;
    /// Sub-command expected in byte 1 of a `SET_AUTOCENTER` packet.
    pub const SET_AUTOCENTER_SPRING: u8 = 0x0D;
}

/// Scale factors between raw wire counts and engine units.
pub mod scaling {
    /// Commanded-force units per raw magnitude count.
    pub const FORCE_SCALE: i32 = 48;
    /// Commanded-force clamp, pre-shaping.
    pub const FORCE_LIMIT: i16 = 10_000;
    /// Spring strength applied by `DEFAULT_AUTOCENTER` when none is configured.
    pub const DEFAULT_AUTOCENTER_STRENGTH: i16 = 1024;
    /// Spring-strength units per raw `SET_AUTOCENTER` count.
    pub const AUTOCENTER_SCALE: i16 = 16;
}
