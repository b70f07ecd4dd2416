//! Output drivers

pub mod relay;
pub mod shift_register;

pub use relay::Relay;
pub use shift_register::{ShiftRegister74595, ShiftRegisterError};
