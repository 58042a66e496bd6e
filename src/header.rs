use crate::codec::pack_fixed_array;

/// Fixed-size start of a model file.
#[derive(Debug, Clone, Copy, PartialEq)]
#[derive(bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C, packed)]
pub struct PmdRawHeader {
    pub magic: [u8; 3],
    pub version: f32,
    pub name: [u8; 20],
    pub comment: [u8; 256],
}

/// Fixed-size start of the localization block, present when its flag is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C, packed)]
pub struct LocalizedRawHeader {
    pub name: [u8; 20],
    pub comment: [u8; 256],
}

/// Fixed-size start of a motion file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[derive(bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C, packed)]
pub struct VmdRawHeader {
    pub signature: [u8; 30],
    pub model_name: [u8; 20],
}

#[derive(Debug, thiserror::Error)]
pub enum HeaderParseError {
    #[error("Bytes array cannot be reinterpreted/cast: {0}")]
    Bytemuck(bytemuck::PodCastError),
}

impl PmdRawHeader {
    pub const fn encoded_len() -> usize {
        std::mem::size_of::<Self>()
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self, HeaderParseError> {
        let raw_header: &PmdRawHeader =
            bytemuck::try_from_bytes(buf).map_err(HeaderParseError::Bytemuck)?;
        Ok(raw_header.to_native())
    }

    pub fn to_native(&self) -> Self {
        let version = self.version;
        Self {
            magic: self.magic,
            version: f32::from_bits(u32::from_le(version.to_bits())),
            name: self.name,
            comment: self.comment,
        }
    }
}

impl LocalizedRawHeader {
    pub const fn encoded_len() -> usize {
        std::mem::size_of::<Self>()
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self, HeaderParseError> {
        bytemuck::try_from_bytes(buf)
            .copied()
            .map_err(HeaderParseError::Bytemuck)
    }
}

impl VmdRawHeader {
    /// Build a header from encoded text, truncating or padding each field.
    pub fn new(signature: &[u8], model_name: &[u8]) -> Self {
        Self {
            signature: pack_fixed_array(signature),
            model_name: pack_fixed_array(model_name),
        }
    }

    pub const fn encoded_len() -> usize {
        std::mem::size_of::<Self>()
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self, HeaderParseError> {
        bytemuck::try_from_bytes(buf)
            .copied()
            .map_err(HeaderParseError::Bytemuck)
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_sizes() {
        assert_eq!(PmdRawHeader::encoded_len(), 283);
        assert_eq!(LocalizedRawHeader::encoded_len(), 276);
        assert_eq!(VmdRawHeader::encoded_len(), 50);
    }

    #[test]
    fn test_pmd_header_from_bytes() {
        let mut buf = vec![b'P', b'm', b'd'];
        buf.extend_from_slice(&1.0f32.to_le_bytes());
        buf.extend_from_slice(&[b'x'; 20]);
        buf.extend_from_slice(&[0; 256]);
        let header = PmdRawHeader::from_bytes(&buf).unwrap();
        assert_eq!(header.magic, *b"Pmd");
        assert_eq!({ header.version }, 1.0);
        assert_eq!(header.name, [b'x'; 20]);
    }

    #[test]
    fn test_header_from_short_bytes() {
        assert!(PmdRawHeader::from_bytes(&[0; 10]).is_err());
        assert!(VmdRawHeader::from_bytes(&[0; 49]).is_err());
    }

    #[test]
    fn test_vmd_header_packs_fields() {
        let header = VmdRawHeader::new(b"Vocaloid Motion Data 0002", b"a very long model name");
        let bytes = header.as_bytes();
        assert_eq!(bytes.len(), 50);
        assert_eq!(&bytes[..25], b"Vocaloid Motion Data 0002");
        assert_eq!(&bytes[25..30], &[0; 5]);
        assert_eq!(&bytes[30..], b"a very long model na");
    }
}
