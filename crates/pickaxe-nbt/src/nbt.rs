use bytes::{Buf, BufMut, BytesMut};

/// NBT tag type IDs.
pub const TAG_END: u8 = 0;
pub const TAG_BYTE: u8 = 1;
pub const TAG_SHORT: u8 = 2;
pub const TAG_INT: u8 = 3;
pub const TAG_LONG: u8 = 4;
pub const TAG_FLOAT: u8 = 5;
pub const TAG_DOUBLE: u8 = 6;
pub const TAG_BYTE_ARRAY: u8 = 7;
pub const TAG_STRING: u8 = 8;
pub const TAG_LIST: u8 = 9;
pub const TAG_COMPOUND: u8 = 10;
pub const TAG_INT_ARRAY: u8 = 11;
pub const TAG_LONG_ARRAY: u8 = 12;

/// An NBT value.
#[derive(Debug, Clone, PartialEq)]
pub enum NbtValue {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(Vec<NbtValue>),
    Compound(Vec<(String, NbtValue)>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl NbtValue {
    pub fn tag_id(&self) -> u8 {
        match self {
            NbtValue::Byte(_) => TAG_BYTE,
            NbtValue::Short(_) => TAG_SHORT,
            NbtValue::Int(_) => TAG_INT,
            NbtValue::Long(_) => TAG_LONG,
            NbtValue::Float(_) => TAG_FLOAT,
            NbtValue::Double(_) => TAG_DOUBLE,
            NbtValue::ByteArray(_) => TAG_BYTE_ARRAY,
            NbtValue::String(_) => TAG_STRING,
            NbtValue::List(_) => TAG_LIST,
            NbtValue::Compound(_) => TAG_COMPOUND,
            NbtValue::IntArray(_) => TAG_INT_ARRAY,
            NbtValue::LongArray(_) => TAG_LONG_ARRAY,
        }
    }

    /// Write this value as a root compound tag (with empty name) for network protocol.
    pub fn write_root_network(&self, buf: &mut BytesMut) {
        // Network NBT in 1.20.2+: root compound tag with type byte, but NO name
        buf.put_u8(self.tag_id());
        self.write_payload(buf);
    }

    /// Write this value as a full named root tag (for files).
    pub fn write_root_named(&self, name: &str, buf: &mut BytesMut) {
        buf.put_u8(self.tag_id());
        write_nbt_string(name, buf);
        self.write_payload(buf);
    }

    /// Write just the payload (no tag type or name).
    pub fn write_payload(&self, buf: &mut BytesMut) {
        match self {
            NbtValue::Byte(v) => buf.put_i8(*v),
            NbtValue::Short(v) => buf.put_i16(*v),
            NbtValue::Int(v) => buf.put_i32(*v),
            NbtValue::Long(v) => buf.put_i64(*v),
            NbtValue::Float(v) => buf.put_f32(*v),
            NbtValue::Double(v) => buf.put_f64(*v),
            NbtValue::ByteArray(v) => {
                buf.put_i32(v.len() as i32);
                for b in v {
                    buf.put_i8(*b);
                }
            }
            NbtValue::String(v) => {
                write_nbt_string(v, buf);
            }
            NbtValue::List(v) => {
                if v.is_empty() {
                    buf.put_u8(TAG_END);
                    buf.put_i32(0);
                } else {
                    buf.put_u8(v[0].tag_id());
                    buf.put_i32(v.len() as i32);
                    for item in v {
                        item.write_payload(buf);
                    }
                }
            }
            NbtValue::Compound(entries) => {
                for (name, value) in entries {
                    buf.put_u8(value.tag_id());
                    write_nbt_string(name, buf);
                    value.write_payload(buf);
                }
                buf.put_u8(TAG_END);
            }
            NbtValue::IntArray(v) => {
                buf.put_i32(v.len() as i32);
                for i in v {
                    buf.put_i32(*i);
                }
            }
            NbtValue::LongArray(v) => {
                buf.put_i32(v.len() as i32);
                for l in v {
                    buf.put_i64(*l);
                }
            }
        }
    }

    /// If this is a `Compound`, look up an entry by name.
    pub fn get(&self, key: &str) -> Option<&NbtValue> {
        match self {
            NbtValue::Compound(entries) => {
                entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
            }
            _ => None,
        }
    }

    pub fn as_compound(&self) -> Option<&[(String, NbtValue)]> {
        match self {
            NbtValue::Compound(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            NbtValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_short(&self) -> Option<i16> {
        match self {
            NbtValue::Short(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            NbtValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_byte_array(&self) -> Option<&[i8]> {
        match self {
            NbtValue::ByteArray(v) => Some(v),
            _ => None,
        }
    }
}

fn write_nbt_string(s: &str, buf: &mut BytesMut) {
    let bytes = s.as_bytes();
    buf.put_u16(bytes.len() as u16);
    buf.put_slice(bytes);
}

/// Helper macro for building compound tags.
#[macro_export]
macro_rules! nbt_compound {
    ($($key:expr => $val:expr),* $(,)?) => {
        $crate::NbtValue::Compound(vec![
            $(($key.into(), $val)),*
        ])
    };
}

/// Helper macro for building list tags.
#[macro_export]
macro_rules! nbt_list {
    ($($val:expr),* $(,)?) => {
        $crate::NbtValue::List(vec![$($val),*])
    };
}

#[derive(Debug, thiserror::Error)]
pub enum NbtError {
    #[error("unexpected end of NBT data")]
    Eof,
    #[error("unknown NBT tag id {0}")]
    UnknownTag(u8),
    #[error("root tag is not a Compound (got tag {0})")]
    RootNotCompound(u8),
    #[error("negative array/list length: {0}")]
    NegativeLength(i32),
    #[error("malformed UTF-8 in NBT string or name")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

pub type NbtResult<T> = Result<T, NbtError>;

fn require(buf: &impl Buf, n: usize) -> NbtResult<()> {
    if buf.remaining() < n {
        Err(NbtError::Eof)
    } else {
        Ok(())
    }
}

fn read_i8(buf: &mut impl Buf) -> NbtResult<i8> {
    require(buf, 1)?;
    Ok(buf.get_i8())
}

fn read_i16(buf: &mut impl Buf) -> NbtResult<i16> {
    require(buf, 2)?;
    Ok(buf.get_i16())
}

fn read_i32(buf: &mut impl Buf) -> NbtResult<i32> {
    require(buf, 4)?;
    Ok(buf.get_i32())
}

fn read_i64(buf: &mut impl Buf) -> NbtResult<i64> {
    require(buf, 8)?;
    Ok(buf.get_i64())
}

fn read_f32(buf: &mut impl Buf) -> NbtResult<f32> {
    require(buf, 4)?;
    Ok(buf.get_f32())
}

fn read_f64(buf: &mut impl Buf) -> NbtResult<f64> {
    require(buf, 8)?;
    Ok(buf.get_f64())
}

fn read_nbt_string(buf: &mut impl Buf) -> NbtResult<String> {
    require(buf, 2)?;
    let len = buf.get_u16() as usize;
    require(buf, len)?;
    let mut bytes = vec![0u8; len];
    buf.copy_to_slice(&mut bytes);
    Ok(String::from_utf8(bytes)?)
}

/// Read a whole NBT document: a one-byte Compound tag, its (usually empty)
/// name, then the recursively-read Compound payload.
pub fn read_document(buf: &mut impl Buf) -> NbtResult<NbtValue> {
    let tag = read_i8(buf)? as u8;
    if tag != TAG_COMPOUND {
        return Err(NbtError::RootNotCompound(tag));
    }
    let _root_name = read_nbt_string(buf)?;
    read_payload(buf, tag)
}

fn read_payload(buf: &mut impl Buf, tag: u8) -> NbtResult<NbtValue> {
    match tag {
        TAG_BYTE => Ok(NbtValue::Byte(read_i8(buf)?)),
        TAG_SHORT => Ok(NbtValue::Short(read_i16(buf)?)),
        TAG_INT => Ok(NbtValue::Int(read_i32(buf)?)),
        TAG_LONG => Ok(NbtValue::Long(read_i64(buf)?)),
        TAG_FLOAT => Ok(NbtValue::Float(read_f32(buf)?)),
        TAG_DOUBLE => Ok(NbtValue::Double(read_f64(buf)?)),
        TAG_BYTE_ARRAY => {
            let len = read_i32(buf)?;
            if len < 0 {
                return Err(NbtError::NegativeLength(len));
            }
            let mut v = Vec::with_capacity(len as usize);
            for _ in 0..len {
                v.push(read_i8(buf)?);
            }
            Ok(NbtValue::ByteArray(v))
        }
        TAG_STRING => Ok(NbtValue::String(read_nbt_string(buf)?)),
        TAG_LIST => {
            let elem_tag = read_i8(buf)? as u8;
            let len = read_i32(buf)?;
            if len < 0 {
                return Err(NbtError::NegativeLength(len));
            }
            if elem_tag == TAG_END {
                // End-tagged empty list; non-zero length is tolerated and ignored,
                // since an End payload carries no bytes to read.
                return Ok(NbtValue::List(Vec::new()));
            }
            if elem_tag > TAG_LONG_ARRAY {
                return Err(NbtError::UnknownTag(elem_tag));
            }
            let mut v = Vec::with_capacity(len as usize);
            for _ in 0..len {
                v.push(read_payload(buf, elem_tag)?);
            }
            Ok(NbtValue::List(v))
        }
        TAG_COMPOUND => {
            let mut entries = Vec::new();
            loop {
                let entry_tag = read_i8(buf)? as u8;
                if entry_tag == TAG_END {
                    break;
                }
                if entry_tag > TAG_LONG_ARRAY {
                    return Err(NbtError::UnknownTag(entry_tag));
                }
                let name = read_nbt_string(buf)?;
                let value = read_payload(buf, entry_tag)?;
                entries.push((name, value));
            }
            Ok(NbtValue::Compound(entries))
        }
        TAG_INT_ARRAY => {
            let len = read_i32(buf)?;
            if len < 0 {
                return Err(NbtError::NegativeLength(len));
            }
            let mut v = Vec::with_capacity(len as usize);
            for _ in 0..len {
                v.push(read_i32(buf)?);
            }
            Ok(NbtValue::IntArray(v))
        }
        TAG_LONG_ARRAY => {
            let len = read_i32(buf)?;
            if len < 0 {
                return Err(NbtError::NegativeLength(len));
            }
            let mut v = Vec::with_capacity(len as usize);
            for _ in 0..len {
                v.push(read_i64(buf)?);
            }
            Ok(NbtValue::LongArray(v))
        }
        other => Err(NbtError::UnknownTag(other)),
    }
}

/// Read an NBT document from a complete in-memory byte slice.
pub fn read_document_from_slice(bytes: &[u8]) -> NbtResult<NbtValue> {
    let mut buf = bytes;
    read_document(&mut buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_simple_compound() {
        let nbt = NbtValue::Compound(vec![
            ("name".into(), NbtValue::String("test".into())),
            ("value".into(), NbtValue::Int(42)),
        ]);
        let mut buf = BytesMut::new();
        nbt.write_root_network(&mut buf);
        // Should start with TAG_COMPOUND (10)
        assert_eq!(buf[0], TAG_COMPOUND);
    }

    #[test]
    fn test_long_array() {
        let nbt = NbtValue::LongArray(vec![1, 2, 3]);
        let mut buf = BytesMut::new();
        nbt.write_payload(&mut buf);
        // 4 bytes length (3) + 3 * 8 bytes = 28 bytes
        assert_eq!(buf.len(), 28);
    }

    // Scenario S5 from the spec: "hello world" NBT document.
    #[test]
    fn s5_nbt_hello_world() {
        let bytes: [u8; 32] = [
            0x0A, 0x00, 0x0B, 0x68, 0x65, 0x6C, 0x6C, 0x6F, 0x20, 0x77, 0x6F, 0x72, 0x6C, 0x64,
            0x08, 0x00, 0x04, 0x6E, 0x61, 0x6D, 0x65, 0x00, 0x09, 0x42, 0x61, 0x6E, 0x61, 0x6E,
            0x72, 0x61, 0x6D, 0x61,
        ];
        let value = read_document_from_slice(&bytes).unwrap();
        match &value {
            NbtValue::Compound(entries) => {
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].0, "name");
                assert_eq!(entries[0].1, NbtValue::String("Bananrama".into()));
            }
            _ => panic!("expected compound"),
        }
    }

    #[test]
    fn write_then_read_roundtrip() {
        let nbt = NbtValue::Compound(vec![
            ("b".into(), NbtValue::Byte(-5)),
            ("s".into(), NbtValue::Short(1234)),
            ("i".into(), NbtValue::Int(-99999)),
            ("l".into(), NbtValue::Long(123456789012)),
            ("f".into(), NbtValue::Float(1.5)),
            ("d".into(), NbtValue::Double(2.5)),
            ("ba".into(), NbtValue::ByteArray(vec![1, -2, 3])),
            ("str".into(), NbtValue::String("hi".into())),
            (
                "list".into(),
                NbtValue::List(vec![NbtValue::Int(1), NbtValue::Int(2)]),
            ),
            ("empty_list".into(), NbtValue::List(vec![])),
            ("ia".into(), NbtValue::IntArray(vec![1, 2, 3])),
            ("la".into(), NbtValue::LongArray(vec![1, 2, 3])),
            (
                "nested".into(),
                NbtValue::Compound(vec![("x".into(), NbtValue::Byte(9))]),
            ),
        ]);

        let mut buf = BytesMut::new();
        nbt.write_root_named("root", &mut buf);
        let decoded = read_document_from_slice(&buf).unwrap();
        assert_eq!(decoded, nbt);
    }

    #[test]
    fn empty_compound_decodes_from_leading_end_tag() {
        // TAG_COMPOUND, empty name, immediate TAG_END.
        let bytes = [0x0A, 0x00, 0x00, 0x00];
        let value = read_document_from_slice(&bytes).unwrap();
        assert_eq!(value, NbtValue::Compound(vec![]));
    }

    #[test]
    fn non_compound_root_is_rejected() {
        let bytes = [TAG_INT, 0x00, 0x00];
        assert!(read_document_from_slice(&bytes).is_err());
    }

    #[test]
    fn negative_array_length_is_rejected() {
        // TAG_COMPOUND, empty name, entry tag=ByteArray, name "a", length -1
        let mut buf = BytesMut::new();
        buf.put_u8(TAG_COMPOUND);
        buf.put_u16(0);
        buf.put_u8(TAG_BYTE_ARRAY);
        buf.put_u16(1);
        buf.put_u8(b'a');
        buf.put_i32(-1);
        assert!(read_document_from_slice(&buf).is_err());
    }

    #[test]
    fn truncated_stream_is_rejected() {
        let bytes = [0x0A, 0x00];
        assert!(read_document_from_slice(&bytes).is_err());
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let mut buf = BytesMut::new();
        buf.put_u8(TAG_COMPOUND);
        buf.put_u16(0);
        buf.put_u8(99); // unknown tag
        buf.put_u16(0); // name
        assert!(read_document_from_slice(&buf).is_err());
    }
}
