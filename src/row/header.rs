//! # Row Header
//!
//! Every row starts with a five byte header:
//!
//! ```text
//! +---------+-----------------------+
//! | version | schema id (i32 LE)    |
//! | 1 byte  | 4 bytes               |
//! +---------+-----------------------+
//! ```
//!
//! The header is a zerocopy struct so it can be read straight out of the row
//! bytes without copying.

use eyre::{ensure, Result};
use zerocopy::little_endian::I32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::config::HYBRID_ROW_HEADER_SIZE;
use crate::layouts::SchemaId;

/// Format version tag stored in the first byte of a row.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HybridRowVersion {
    Invalid = 0,
    #[default]
    V1 = 0x81,
}

impl TryFrom<u8> for HybridRowVersion {
    type Error = eyre::Report;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(HybridRowVersion::Invalid),
            0x81 => Ok(HybridRowVersion::V1),
            _ => eyre::bail!("invalid HybridRowVersion: {:#04x}", value),
        }
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct HybridRowHeader {
    version: u8,
    schema_id: I32,
}

const _: () = assert!(std::mem::size_of::<HybridRowHeader>() == HYBRID_ROW_HEADER_SIZE);

impl HybridRowHeader {
    pub fn new(version: HybridRowVersion, schema_id: SchemaId) -> Self {
        Self {
            version: version as u8,
            schema_id: I32::new(schema_id.id()),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        ensure!(
            bytes.len() >= HYBRID_ROW_HEADER_SIZE,
            "buffer too small for HybridRowHeader: {} < {}",
            bytes.len(),
            HYBRID_ROW_HEADER_SIZE
        );

        Self::ref_from_bytes(&bytes[..HYBRID_ROW_HEADER_SIZE])
            .map_err(|e| eyre::eyre!("failed to parse HybridRowHeader: {:?}", e))
    }

    pub fn version(&self) -> Result<HybridRowVersion> {
        HybridRowVersion::try_from(self.version)
    }

    pub fn schema_id(&self) -> SchemaId {
        SchemaId(self.schema_id.get())
    }
}
