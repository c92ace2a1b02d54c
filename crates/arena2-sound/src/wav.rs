//! RIFF/WAVE headers for raw sound samples.
//!
//! Samples are stored headerless: 8-bit unsigned mono PCM at 11025 Hz.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Sample rate of every stored sound.
pub const SAMPLE_RATE: u32 = 11025;

/// Size of a canonical PCM WAV header.
pub const WAV_HEADER_SIZE: usize = 44;

/// Canonical 44-byte PCM WAV header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct WavHeader {
    pub riff: [u8; 4],
    /// Payload length + 36.
    pub riff_size: u32,
    pub wave: [u8; 4],
    pub fmt: [u8; 4],
    pub fmt_size: u32,
    pub format: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    pub data: [u8; 4],
    pub data_size: u32,
}

impl WavHeader {
    /// Header for `payload_len` bytes of 8-bit mono samples.
    pub const fn new(payload_len: u32) -> Self {
        Self {
            riff: *b"RIFF",
            riff_size: payload_len.wrapping_add(36),
            wave: *b"WAVE",
            fmt: *b"fmt ",
            fmt_size: 16,
            format: 1,
            channels: 1,
            sample_rate: SAMPLE_RATE,
            byte_rate: SAMPLE_RATE,
            block_align: 1,
            bits_per_sample: 8,
            data: *b"data",
            data_size: payload_len,
        }
    }
}

/// Serialized WAV header for a payload of `payload_len` bytes.
pub fn wav_header(payload_len: u32) -> [u8; WAV_HEADER_SIZE] {
    let mut out = [0u8; WAV_HEADER_SIZE];
    out.copy_from_slice(WavHeader::new(payload_len).as_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_size() {
        assert_eq!(std::mem::size_of::<WavHeader>(), WAV_HEADER_SIZE);
    }

    #[test]
    fn test_header_fields() {
        let header = wav_header(1000);

        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes(header[4..8].try_into().unwrap()), 1036);
        assert_eq!(&header[8..16], b"WAVEfmt ");
        assert_eq!(u32::from_le_bytes(header[16..20].try_into().unwrap()), 16);
        assert_eq!(u16::from_le_bytes(header[20..22].try_into().unwrap()), 1);
        assert_eq!(u16::from_le_bytes(header[22..24].try_into().unwrap()), 1);
        assert_eq!(u32::from_le_bytes(header[24..28].try_into().unwrap()), 11025);
        assert_eq!(u32::from_le_bytes(header[28..32].try_into().unwrap()), 11025);
        assert_eq!(u16::from_le_bytes(header[32..34].try_into().unwrap()), 1);
        assert_eq!(u16::from_le_bytes(header[34..36].try_into().unwrap()), 8);
        assert_eq!(&header[36..40], b"data");
        assert_eq!(u32::from_le_bytes(header[40..44].try_into().unwrap()), 1000);
    }

    #[test]
    fn test_parse_back() {
        let bytes = wav_header(7);
        let header = WavHeader::read_from_bytes(&bytes).unwrap();
        assert_eq!(header, WavHeader::new(7));
    }
}
