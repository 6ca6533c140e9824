//! GPIO |     Function     |      Notes
//! -----+------------------+----------------------------------
//!  9   | Keypad B0 (BOOT) | Active LOW, internal pullup, strapping pin
//!  5   | Keypad B1        | Active LOW, internal pullup
//!  6   | Keypad B2        | Active LOW, internal pullup
//! 20   | UART0 RX         | esp-println console
//! 21   | UART0 TX         | esp-println console

// ----- Keypad -----
pub const BTN_B0: u8 = 9;
pub const BTN_B1: u8 = 5;
pub const BTN_B2: u8 = 6;

pub const KEYPAD_PINS: [u8; 3] = [BTN_B0, BTN_B1, BTN_B2];
