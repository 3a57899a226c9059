pub mod addresses;
pub mod ports;
