//! Property payloads and their wire encoding

use bytes::{BufMut, Bytes, BytesMut};

use crate::types::{ObjectId, StreamFormat};

/// A property value as the host sees it
///
/// Scalars and arrays are encoded native-endian, exactly as the matching C
/// types are laid out. Strings are encoded as UTF-8; turning them into
/// `CFString`s is the adapter's job.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// `UInt32` (also used for `Boolean`-valued properties and class ids)
    U32(u32),
    /// `Float32`
    F32(f32),
    /// `Float64`
    F64(f64),
    /// `UInt32[]`
    U32List(Vec<u32>),
    /// `AudioObjectID[]`
    ObjectList(Vec<ObjectId>),
    /// `AudioValueRange[]`
    Ranges(Vec<(f64, f64)>),
    /// `AudioStreamBasicDescription`
    Format(StreamFormat),
    /// `AudioStreamRangedDescription[]`
    RangedFormats(Vec<(StreamFormat, f64, f64)>),
    /// String payload
    Text(String),
}

impl PropertyValue {
    /// Boolean as the host encodes it
    #[must_use]
    pub fn flag(value: bool) -> Self {
        Self::U32(u32::from(value))
    }

    /// Number of bytes [`encode`](Self::encode) produces
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        match self {
            Self::U32(_) | Self::F32(_) => 4,
            Self::F64(_) => 8,
            Self::U32List(v) => v.len() * 4,
            Self::ObjectList(v) => v.len() * 4,
            Self::Ranges(v) => v.len() * 16,
            Self::Format(_) => StreamFormat::ENCODED_LEN,
            Self::RangedFormats(v) => v.len() * StreamFormat::RANGED_ENCODED_LEN,
            Self::Text(s) => s.len(),
        }
    }

    /// Encode into host wire bytes
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        match self {
            Self::U32(v) => buf.put_u32_ne(*v),
            Self::F32(v) => buf.put_f32_ne(*v),
            Self::F64(v) => buf.put_f64_ne(*v),
            Self::U32List(v) => {
                for item in v {
                    buf.put_u32_ne(*item);
                }
            }
            Self::ObjectList(v) => {
                for id in v {
                    buf.put_u32_ne(id.0);
                }
            }
            Self::Ranges(v) => {
                for (min, max) in v {
                    buf.put_f64_ne(*min);
                    buf.put_f64_ne(*max);
                }
            }
            Self::Format(format) => format.encode_into(&mut buf),
            Self::RangedFormats(v) => {
                for (format, min, max) in v {
                    format.encode_into(&mut buf);
                    buf.put_f64_ne(*min);
                    buf.put_f64_ne(*max);
                }
            }
            Self::Text(s) => buf.put_slice(s.as_bytes()),
        }
        buf.freeze()
    }
}
