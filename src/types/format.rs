//! Stream format definitions

use std::io::Cursor;

use byteorder::{NativeEndian, ReadBytesExt};
use bytes::BufMut;

use crate::error::four_cc;

/// `kAudioFormatLinearPCM`
pub const FORMAT_LINEAR_PCM: u32 = four_cc(b"lpcm");
/// `kAudioFormatFlagIsFloat`
pub const FLAG_IS_FLOAT: u32 = 1 << 0;
/// `kAudioFormatFlagIsPacked`
pub const FLAG_IS_PACKED: u32 = 1 << 3;

/// Stream format, serialized as an `AudioStreamBasicDescription`
///
/// The device only ever runs 32-bit float, packed, interleaved PCM; the
/// sample rate and channel count are what varies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreamFormat {
    /// Frames per second
    pub sample_rate: f64,
    /// Format id (always linear PCM)
    pub format_id: u32,
    /// Format flags
    pub format_flags: u32,
    /// Bytes per packet
    pub bytes_per_packet: u32,
    /// Frames per packet
    pub frames_per_packet: u32,
    /// Bytes per frame
    pub bytes_per_frame: u32,
    /// Interleaved channel count
    pub channels_per_frame: u32,
    /// Bits per channel sample
    pub bits_per_channel: u32,
}

impl StreamFormat {
    /// Serialized size of an `AudioStreamBasicDescription`
    pub const ENCODED_LEN: usize = 40;
    /// Serialized size of an `AudioStreamRangedDescription`
    pub const RANGED_ENCODED_LEN: usize = Self::ENCODED_LEN + 16;

    /// Native float32 interleaved format
    #[must_use]
    pub fn float32(sample_rate: f64, channels: u32) -> Self {
        let bytes_per_frame = 4 * channels;
        Self {
            sample_rate,
            format_id: FORMAT_LINEAR_PCM,
            format_flags: FLAG_IS_FLOAT | FLAG_IS_PACKED,
            bytes_per_packet: bytes_per_frame,
            frames_per_packet: 1,
            bytes_per_frame,
            channels_per_frame: channels,
            bits_per_channel: 32,
        }
    }

    /// Check whether this is the float32 layout for `channels` channels,
    /// ignoring the sample rate
    #[must_use]
    pub fn is_float32_layout(&self, channels: u32) -> bool {
        let expected = Self::float32(self.sample_rate, channels);
        self.format_id == expected.format_id
            && self.format_flags == expected.format_flags
            && self.bytes_per_packet == expected.bytes_per_packet
            && self.frames_per_packet == expected.frames_per_packet
            && self.bytes_per_frame == expected.bytes_per_frame
            && self.channels_per_frame == expected.channels_per_frame
            && self.bits_per_channel == expected.bits_per_channel
    }

    /// Append the `AudioStreamBasicDescription` bytes to `buf`
    pub fn encode_into(&self, buf: &mut impl BufMut) {
        buf.put_f64_ne(self.sample_rate);
        buf.put_u32_ne(self.format_id);
        buf.put_u32_ne(self.format_flags);
        buf.put_u32_ne(self.bytes_per_packet);
        buf.put_u32_ne(self.frames_per_packet);
        buf.put_u32_ne(self.bytes_per_frame);
        buf.put_u32_ne(self.channels_per_frame);
        buf.put_u32_ne(self.bits_per_channel);
        // mReserved
        buf.put_u32_ne(0);
    }

    /// Parse an `AudioStreamBasicDescription`
    ///
    /// Returns `None` if `data` is shorter than [`Self::ENCODED_LEN`].
    #[must_use]
    pub fn decode(data: &[u8]) -> Option<Self> {
        if data.len() < Self::ENCODED_LEN {
            return None;
        }
        let mut rdr = Cursor::new(data);
        Some(Self {
            sample_rate: rdr.read_f64::<NativeEndian>().ok()?,
            format_id: rdr.read_u32::<NativeEndian>().ok()?,
            format_flags: rdr.read_u32::<NativeEndian>().ok()?,
            bytes_per_packet: rdr.read_u32::<NativeEndian>().ok()?,
            frames_per_packet: rdr.read_u32::<NativeEndian>().ok()?,
            bytes_per_frame: rdr.read_u32::<NativeEndian>().ok()?,
            channels_per_frame: rdr.read_u32::<NativeEndian>().ok()?,
            bits_per_channel: rdr.read_u32::<NativeEndian>().ok()?,
        })
    }
}
