//! BlueZ transport, through the `bluer` crate.

mod adapter;
mod device;
mod error;

pub use adapter::BluezTransport;
pub use device::BluezLink;
