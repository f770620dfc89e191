//! Device-scoped binary cache keys.
//!
//! A key can only be built from a full [`CacheKey`], so every stored entry
//! is namespaced by its device. All entries of one device share a prefix,
//! which lets the LMDB backend find them with a prefix scan.

use nodedeck_core::{CacheError, CacheKey, DeviceId};

/// Separator byte between the device identifier and the data type.
///
/// 0xFF never occurs in UTF-8, so it cannot collide with device bytes.
const SEPARATOR: u8 = 0xFF;

/// Length of the little-endian device length header.
const LEN_HEADER: usize = 2;

/// A cache key encoded for byte-oriented storage.
///
/// # Binary Format
///
/// - Bytes 0-1: device identifier length `n` (u16, little endian)
/// - Bytes 2..2+n: device identifier (UTF-8)
/// - Byte 2+n: separator (0xFF)
/// - Byte 3+n: data type discriminant
///
/// The length header makes prefixes unambiguous: the prefix for device `a`
/// never matches keys of device `ab`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeviceScopedKey {
    key: CacheKey,
}

impl DeviceScopedKey {
    /// Wrap a cache key for encoding.
    ///
    /// Fails if the device identifier does not fit the length header.
    pub fn new(key: &CacheKey) -> Result<Self, CacheError> {
        check_device_len(&key.device)?;
        Ok(Self { key: key.clone() })
    }

    /// Encode this key for storage.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Self::prefix_bytes(&self.key.device);
        bytes.push(self.key.data_type.as_byte());
        bytes
    }

    /// Create a prefix for scanning all keys belonging to a device.
    pub fn device_prefix(device: &DeviceId) -> Result<Vec<u8>, CacheError> {
        check_device_len(device)?;
        Ok(Self::prefix_bytes(device))
    }

    fn prefix_bytes(device: &DeviceId) -> Vec<u8> {
        let device_bytes = device.as_str().as_bytes();
        let mut bytes = Vec::with_capacity(LEN_HEADER + device_bytes.len() + 2);
        bytes.extend_from_slice(&(device_bytes.len() as u16).to_le_bytes());
        bytes.extend_from_slice(device_bytes);
        bytes.push(SEPARATOR);
        bytes
    }
}

fn check_device_len(device: &DeviceId) -> Result<(), CacheError> {
    if device.as_str().len() > u16::MAX as usize {
        return Err(CacheError::Encode {
            reason: format!(
                "device identifier is {} bytes, limit is {}",
                device.as_str().len(),
                u16::MAX
            ),
        });
    }
    Ok(())
}
