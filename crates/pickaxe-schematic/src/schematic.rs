use pickaxe_nbt::NbtValue;
use pickaxe_types::{BlockState, BlockStateParseError};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchematicError {
    #[error("unsupported schematic version")]
    UnsupportedVersion,
    #[error("missing required field {0:?}")]
    MissingField(String),
    #[error("invalid palette key {0:?}: {1}")]
    InvalidPaletteKey(String, BlockStateParseError),
    #[error("VarInt in BlockData ran past the end of the buffer")]
    TruncatedBlockData,
}

/// A decoded Sponge Schematic v2 voxel region.
#[derive(Debug, Clone, PartialEq)]
pub struct Schematic {
    pub data_version: i32,
    pub width: u16,
    pub height: u16,
    pub length: u16,
    /// Palette index -> block state.
    pub palette: HashMap<i32, BlockState>,
    /// Flat, row-major (x + z*W + y*W*L) sequence of palette indices.
    pub block_indices: Vec<i32>,
}

impl Schematic {
    /// Decode a schematic from an already-parsed NBT root Compound.
    pub fn decode(root: &NbtValue) -> Result<Self, SchematicError> {
        let version = root.get("Version").and_then(NbtValue::as_int);
        if version != Some(2) {
            return Err(SchematicError::UnsupportedVersion);
        }

        let data_version = require_int(root, "DataVersion")?;
        let width = require_short(root, "Width")? as u16;
        let height = require_short(root, "Height")? as u16;
        let length = require_short(root, "Length")? as u16;

        let palette_entries = root
            .get("Palette")
            .and_then(NbtValue::as_compound)
            .ok_or_else(|| SchematicError::MissingField("Palette".to_string()))?;

        let mut palette = HashMap::with_capacity(palette_entries.len());
        for (key, value) in palette_entries {
            let index = value
                .as_int()
                .ok_or_else(|| SchematicError::MissingField(format!("Palette.{key}")))?;
            let block_state = BlockState::from_str(key)
                .map_err(|e| SchematicError::InvalidPaletteKey(key.clone(), e))?;
            palette.insert(index, block_state);
        }

        let block_data_bytes = root
            .get("BlockData")
            .and_then(NbtValue::as_byte_array)
            .ok_or_else(|| SchematicError::MissingField("BlockData".to_string()))?;
        let block_indices = decode_block_data(block_data_bytes)?;

        Ok(Schematic {
            data_version,
            width,
            height,
            length,
            palette,
            block_indices,
        })
    }

    /// Flat-array offset for `(x, y, z)`, or `None` if out of bounds.
    pub fn index_of(&self, x: usize, y: usize, z: usize) -> Option<usize> {
        if x >= self.width as usize || y >= self.height as usize || z >= self.length as usize {
            return None;
        }
        Some(x + z * self.width as usize + y * self.width as usize * self.length as usize)
    }

    /// The block state at `(x, y, z)`, or `None` if out of bounds or the
    /// palette index there is unknown.
    pub fn block_at(&self, x: usize, y: usize, z: usize) -> Option<&BlockState> {
        let index = self.index_of(x, y, z)?;
        let palette_index = *self.block_indices.get(index)?;
        self.palette.get(&palette_index)
    }
}

fn require_int(root: &NbtValue, name: &str) -> Result<i32, SchematicError> {
    root.get(name)
        .and_then(NbtValue::as_int)
        .ok_or_else(|| SchematicError::MissingField(name.to_string()))
}

fn require_short(root: &NbtValue, name: &str) -> Result<i16, SchematicError> {
    root.get(name)
        .and_then(NbtValue::as_short)
        .ok_or_else(|| SchematicError::MissingField(name.to_string()))
}

/// Decode `BlockData`: a back-to-back sequence of signed VarInts, LEB128-encoded
/// the same way as the wire protocol's VarInt, with no length prefix — the
/// sequence simply ends when the byte array is exhausted.
fn decode_block_data(bytes: &[i8]) -> Result<Vec<i32>, SchematicError> {
    let mut indices = Vec::new();
    let mut pos = 0usize;
    while pos < bytes.len() {
        let mut result: i32 = 0;
        let mut shift: u32 = 0;
        loop {
            if pos >= bytes.len() {
                return Err(SchematicError::TruncatedBlockData);
            }
            let byte = bytes[pos] as u8;
            pos += 1;
            result |= ((byte & 0x7F) as i32) << shift;
            if byte & 0x80 == 0 {
                break;
            }
            shift += 7;
            if shift >= 32 {
                return Err(SchematicError::TruncatedBlockData);
            }
        }
        indices.push(result);
    }
    Ok(indices)
}

/// Errors from loading a schematic off disk (gzip + NBT + schema validation).
#[derive(Debug, Error)]
pub enum SchematicLoadError {
    #[error("I/O error reading schematic file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed NBT in schematic file: {0}")]
    Nbt(#[from] pickaxe_nbt::NbtError),
    #[error("invalid schematic: {0}")]
    Schematic(#[from] SchematicError),
}

/// Load a `.schem` file: gzip-decompress, parse as NBT, then decode as a
/// Sponge Schematic v2 document.
pub fn decode_gzip_file(path: &std::path::Path) -> Result<Schematic, SchematicLoadError> {
    use flate2::read::GzDecoder;
    use std::io::Read;

    let file = std::fs::File::open(path)?;
    let mut decoder = GzDecoder::new(file);
    let mut bytes = Vec::new();
    decoder.read_to_end(&mut bytes)?;
    let root = pickaxe_nbt::read_document_from_slice(&bytes)?;
    Ok(Schematic::decode(&root)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pickaxe_nbt::nbt_compound;
    use std::io::Write;

    fn varint_bytes(mut value: i32) -> Vec<i8> {
        let mut out = Vec::new();
        loop {
            let mut byte = (value & 0x7F) as u8;
            value = ((value as u32) >> 7) as i32;
            if value != 0 {
                byte |= 0x80;
            }
            out.push(byte as i8);
            if value == 0 {
                break;
            }
        }
        out
    }

    fn sample_root(block_data: Vec<i8>) -> NbtValue {
        nbt_compound! {
            "Version" => NbtValue::Int(2),
            "DataVersion" => NbtValue::Int(3700),
            "Width" => NbtValue::Short(2),
            "Height" => NbtValue::Short(1),
            "Length" => NbtValue::Short(2),
            "Palette" => nbt_compound! {
                "minecraft:air" => NbtValue::Int(0),
                "minecraft:stone" => NbtValue::Int(1),
            },
            "BlockData" => NbtValue::ByteArray(block_data),
        }
    }

    #[test]
    fn decodes_minimal_schematic() {
        let mut data = Vec::new();
        data.extend(varint_bytes(1)); // (0,0,0)
        data.extend(varint_bytes(0)); // (1,0,0)
        data.extend(varint_bytes(0)); // (0,0,1)
        data.extend(varint_bytes(1)); // (1,0,1)
        let root = sample_root(data);

        let schematic = Schematic::decode(&root).unwrap();
        assert_eq!(schematic.data_version, 3700);
        assert_eq!(schematic.width, 2);
        assert_eq!(schematic.height, 1);
        assert_eq!(schematic.length, 2);
        assert_eq!(schematic.palette.len(), 2);
        assert_eq!(
            schematic.block_at(0, 0, 0).unwrap().id.to_string(),
            "minecraft:stone"
        );
        assert_eq!(
            schematic.block_at(1, 0, 0).unwrap().id.to_string(),
            "minecraft:air"
        );
        assert_eq!(schematic.block_at(2, 0, 0), None);
    }

    #[test]
    fn index_math_matches_x_plus_zw_plus_ywl() {
        let root = sample_root(vec![0, 0, 0, 0]);
        let schematic = Schematic::decode(&root).unwrap();
        // width=2, length=2: index(x=1,y=0,z=1) = 1 + 1*2 + 0*2*2 = 3
        assert_eq!(schematic.index_of(1, 0, 1), Some(3));
    }

    #[test]
    fn rejects_wrong_version() {
        let root = nbt_compound! {
            "Version" => NbtValue::Int(1),
            "DataVersion" => NbtValue::Int(3700),
            "Width" => NbtValue::Short(1),
            "Height" => NbtValue::Short(1),
            "Length" => NbtValue::Short(1),
            "Palette" => nbt_compound! { "minecraft:air" => NbtValue::Int(0) },
            "BlockData" => NbtValue::ByteArray(vec![0]),
        };
        assert!(matches!(
            Schematic::decode(&root),
            Err(SchematicError::UnsupportedVersion)
        ));
    }

    #[test]
    fn rejects_missing_version() {
        let root = nbt_compound! {
            "DataVersion" => NbtValue::Int(3700),
        };
        assert!(matches!(
            Schematic::decode(&root),
            Err(SchematicError::UnsupportedVersion)
        ));
    }

    #[test]
    fn rejects_missing_required_field() {
        let root = nbt_compound! {
            "Version" => NbtValue::Int(2),
        };
        assert!(matches!(
            Schematic::decode(&root),
            Err(SchematicError::MissingField(_))
        ));
    }

    #[test]
    fn rejects_malformed_palette_key() {
        let root = nbt_compound! {
            "Version" => NbtValue::Int(2),
            "DataVersion" => NbtValue::Int(3700),
            "Width" => NbtValue::Short(1),
            "Height" => NbtValue::Short(1),
            "Length" => NbtValue::Short(1),
            "Palette" => nbt_compound! { "not_a_block_state" => NbtValue::Int(0) },
            "BlockData" => NbtValue::ByteArray(vec![0]),
        };
        assert!(matches!(
            Schematic::decode(&root),
            Err(SchematicError::InvalidPaletteKey(_, _))
        ));
    }

    #[test]
    fn rejects_truncated_block_data_varint() {
        let root = sample_root(vec![-0x80i8]); // continuation bit set, nothing follows
        assert!(matches!(
            Schematic::decode(&root),
            Err(SchematicError::TruncatedBlockData)
        ));
    }

    #[test]
    fn gzip_roundtrip_via_tempfile() {
        use flate2::write::GzEncoder;
        use flate2::Compression;

        let root = sample_root(vec![1, 0, 0, 1]);
        let mut buf = bytes::BytesMut::new();
        root.write_root_named("Schematic", &mut buf);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.schem");
        let file = std::fs::File::create(&path).unwrap();
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder.write_all(&buf).unwrap();
        encoder.finish().unwrap();

        let schematic = decode_gzip_file(&path).unwrap();
        assert_eq!(schematic.width, 2);
        assert_eq!(
            schematic.block_at(0, 0, 0).unwrap().id.to_string(),
            "minecraft:stone"
        );
    }
}
