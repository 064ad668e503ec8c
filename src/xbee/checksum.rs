//! # XBee API Checksum
//!
//! 8-bit checksum over the length-counted region of a frame
//! (frame type through end of payload).
//!
//! **Compute**: `0xFF - (sum of bytes mod 256)`
//! **Verify**: `(sum of bytes + checksum) mod 256 == 0xFF`

/// Value the running sum must reach when the checksum byte is included
const CHECKSUM_VALID: u8 = 0xFF;

/// Calculate the checksum for a frame's length-counted bytes
///
/// # Arguments
///
/// * `data` - Byte slice from the frame type through the end of the payload
///
/// # Examples
///
/// ```
/// use ship_link::xbee::checksum::checksum;
///
/// let data = [0x01, 0x01, 0x86, 0x21, 0x00, 0x02];
/// assert_eq!(checksum(&data), 0x54);
/// ```
pub fn checksum(data: &[u8]) -> u8 {
    CHECKSUM_VALID.wrapping_sub(sum(data))
}

/// Verify a received checksum byte against the frame's length-counted bytes
pub fn verify(data: &[u8], received: u8) -> bool {
    sum(data).wrapping_add(received) == CHECKSUM_VALID
}

fn sum(data: &[u8]) -> u8 {
    data.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Running checksum for byte-at-a-time reception
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChecksumAccumulator {
    sum: u8,
}

impl ChecksumAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one length-counted byte
    pub fn push(&mut self, byte: u8) {
        self.sum = self.sum.wrapping_add(byte);
    }

    /// Checksum the bytes pushed so far would need
    pub fn expected(&self) -> u8 {
        CHECKSUM_VALID.wrapping_sub(self.sum)
    }

    /// Check a received checksum byte
    pub fn verify(&self, received: u8) -> bool {
        self.sum.wrapping_add(received) == CHECKSUM_VALID
    }

    pub fn reset(&mut self) {
        self.sum = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_empty() {
        assert_eq!(checksum(&[]), 0xFF);
        assert!(verify(&[], 0xFF));
    }

    #[test]
    fn test_checksum_known_vector() {
        // XBee reference frame: 7E 00 0A 01 01 50 01 00 48 65 6C 6C 6F B8
        let data = [0x01, 0x01, 0x50, 0x01, 0x00, 0x48, 0x65, 0x6C, 0x6C, 0x6F];
        assert_eq!(checksum(&data), 0xB8);
        assert!(verify(&data, 0xB8));
    }

    #[test]
    fn test_checksum_wraps() {
        // 0xFF + 0xFF + 0x03 = 0x201 -> low byte 0x01
        let data = [0xFF, 0xFF, 0x03];
        assert_eq!(checksum(&data), 0xFE);
    }

    #[test]
    fn test_verify_rejects_wrong_checksum() {
        let data = [0x81, 0x28, 0x86, 0x21];
        let good = checksum(&data);
        assert!(verify(&data, good));
        assert!(!verify(&data, good.wrapping_add(1)));
    }

    #[test]
    fn test_accumulator_matches_slice() {
        let data = [0x81, 0x28, 0x86, 0x21, 0x20, 0x86, 0x00, 0x03, 0x01, 0x00];
        let mut acc = ChecksumAccumulator::new();
        for &b in &data {
            acc.push(b);
        }
        assert_eq!(acc.expected(), checksum(&data));
        assert!(acc.verify(checksum(&data)));

        acc.reset();
        assert_eq!(acc.expected(), 0xFF);
    }

    #[test]
    fn test_checksum_changes_with_data() {
        let data1 = [0x01, 0x01, 0x86, 0x21, 0x00, 0x02];
        let data2 = [0x01, 0x01, 0x86, 0x21, 0x00, 0x03];
        assert_ne!(checksum(&data1), checksum(&data2));
    }
}
