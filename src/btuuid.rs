//! `Uuid` helpers for the Bluetooth SIG assigned numbers this crate talks to

use uuid::Uuid;

/// This is the Bluetooth Base UUID. It is used with 16-bit and 32-bit UUIDs
/// [defined](https://www.bluetooth.com/specifications/assigned-numbers/) by the Bluetooth SIG.
pub const BLUETOOTH_BASE_UUID: u128 = 0x00000000_0000_1000_8000_00805f9b34fb;

/// Const function to create a 16-bit Bluetooth UUID
pub const fn bluetooth_uuid_from_u16(uuid: u16) -> Uuid {
    Uuid::from_u128(((uuid as u128) << 96) | BLUETOOTH_BASE_UUID)
}

/// Extension trait for [uuid::Uuid] with helper methods for dealing with Bluetooth 16-bit UUIDs
pub trait BluetoothUuidExt: private::Sealed {
    /// Returns `true` if self is a valid 16-bit Bluetooth UUID
    fn is_u16_uuid(&self) -> bool;

    /// Tries to convert self into a 16-bit Bluetooth UUID
    fn try_to_u16(&self) -> Option<u16>;
}

impl BluetoothUuidExt for Uuid {
    fn is_u16_uuid(&self) -> bool {
        let u = self.as_u128();
        (u & ((1 << 96) - 1)) == BLUETOOTH_BASE_UUID && (((u >> 96) as u32) & 0xffff0000) == 0
    }

    fn try_to_u16(&self) -> Option<u16> {
        let u = self.as_u128();
        self.is_u16_uuid().then(|| (u >> 96) as u16)
    }
}

/// Short form used in log lines: `0x2a37` for SIG-assigned UUIDs, the full UUID otherwise.
pub fn short_name(uuid: &Uuid) -> String {
    match uuid.try_to_u16() {
        Some(short) => format!("{short:#06x}"),
        None => uuid.to_string(),
    }
}

mod private {
    use uuid::Uuid;

    pub trait Sealed {}

    impl Sealed for Uuid {}
}

/// Bluetooth GATT Service 16-bit UUIDs
pub mod services {
    use uuid::Uuid;

    use super::bluetooth_uuid_from_u16;

    /// Heart Rate service, 0x180D.
    pub const HEART_RATE: Uuid = bluetooth_uuid_from_u16(0x180D);
}

/// Bluetooth GATT Characteristic 16-bit UUIDs
pub mod characteristics {
    use uuid::Uuid;

    use super::bluetooth_uuid_from_u16;

    /// Heart Rate Measurement, 0x2A37.
    pub const HEART_RATE_MEASUREMENT: Uuid = bluetooth_uuid_from_u16(0x2A37);
}
