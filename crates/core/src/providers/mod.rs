pub mod metalpriceapi;
pub mod royal_mint;
pub mod traits;
