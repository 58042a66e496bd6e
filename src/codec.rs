//! Fixed-width field primitives shared by both file formats.
//!
//! Every name or label in the model and motion formats is stored as
//! Shift_JIS (code page 932) in a field of fixed byte width. Numbers are
//! little-endian. Colours are stored as three floats, never with alpha.

use std::fmt;

use encoding_rs::{EncoderResult, SHIFT_JIS};
use glam::Vec3;

use crate::model::Rgb;
use crate::write::WriteError;

/// Truncate or zero-pad `source` to exactly `width` bytes.
///
/// Truncation drops trailing bytes. It works on bytes, not characters, so a
/// double-byte Shift_JIS character straddling the boundary is cut in half.
/// Existing files depend on this behavior.
pub fn pack_fixed(source: &[u8], width: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(width);
    put_fixed(&mut out, source, width);
    out
}

/// Same as [`pack_fixed`], into an array.
pub fn pack_fixed_array<const N: usize>(source: &[u8]) -> [u8; N] {
    let mut out = [0; N];
    let len = source.len().min(N);
    out[..len].copy_from_slice(&source[..len]);
    out
}

/// Append `source` to `out`, truncated or zero-padded to `width` bytes.
pub fn put_fixed(out: &mut Vec<u8>, source: &[u8], width: usize) {
    let len = source.len().min(width);
    out.extend_from_slice(&source[..len]);
    out.resize(out.len() + (width - len), 0);
}

/// Convert text to Shift_JIS.
///
/// Characters with no Shift_JIS mapping are replaced by `?`.
pub fn encode_legacy_text(text: &str) -> Vec<u8> {
    let mut encoder = SHIFT_JIS.new_encoder();
    let mut out = Vec::with_capacity(text.len());
    let mut buf = [0u8; 256];
    let mut src = text;
    loop {
        let (result, read, written) =
            encoder.encode_from_utf8_without_replacement(src, &mut buf, true);
        out.extend_from_slice(&buf[..written]);
        src = &src[read..];
        match result {
            EncoderResult::InputEmpty => break,
            EncoderResult::OutputFull => {}
            EncoderResult::Unmappable(_) => out.push(b'?'),
        }
    }
    out
}

/// Decode a NUL-terminated Shift_JIS field.
///
/// Bytes after the first NUL are ignored; files often leave garbage there.
/// Invalid sequences (typically a character split by truncation) decode to
/// U+FFFD.
pub fn decode_legacy_text(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let (text, had_errors) = SHIFT_JIS.decode_without_bom_handling(&bytes[..end]);
    if had_errors {
        tracing::warn!(text = %text, "invalid Shift_JIS sequence in text field");
    }
    text.into_owned()
}

#[inline]
pub fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

#[inline]
pub fn put_f32(out: &mut Vec<u8>, value: f32) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub fn put_vec3(out: &mut Vec<u8>, v: Vec3) {
    put_f32(out, v.x);
    put_f32(out, v.y);
    put_f32(out, v.z);
}

pub fn put_rgb(out: &mut Vec<u8>, c: Rgb) {
    put_f32(out, c.r);
    put_f32(out, c.g);
    put_f32(out, c.b);
}

/// The closed set of motion record kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    BoneMotion,
    Morph,
    Camera,
    Light,
    SelfShadow,
}

impl RecordKind {
    /// Returns the encoded byte size of one record.
    pub const fn width(self) -> usize {
        match self {
            Self::BoneMotion => 111,
            Self::Morph => 23,
            Self::Camera => 61,
            Self::Light => 28,
            Self::SelfShadow => 9,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::BoneMotion => "bone motion",
            Self::Morph => "morph",
            Self::Camera => "camera",
            Self::Light => "light",
            Self::SelfShadow => "self shadow",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A record with a fixed encoded width.
pub trait FixedRecord {
    const KIND: RecordKind;
    const WIDTH: usize = Self::KIND.width();

    /// Append the encoded record to `out`.
    fn encode_record(&self, out: &mut Vec<u8>) -> Result<(), WriteError>;
}

/// Write a little-endian `u32` count followed by every record, each packed
/// to `T::WIDTH` bytes, in iteration order.
///
/// The count is taken from the iterator, so it can never disagree with the
/// records actually written.
pub fn encode_counted_list<'a, T, I>(out: &mut Vec<u8>, records: I) -> Result<(), WriteError>
where
    T: FixedRecord + 'a,
    I: IntoIterator<Item = &'a T>,
    I::IntoIter: ExactSizeIterator,
{
    let records = records.into_iter();
    let count = u32::try_from(records.len()).map_err(|_| WriteError::TooManyRecords {
        kind: T::KIND,
        count: records.len(),
    })?;
    out.reserve(4 + records.len() * T::WIDTH);
    put_u32(out, count);
    let mut scratch = Vec::with_capacity(T::WIDTH);
    for record in records {
        scratch.clear();
        record.encode_record(&mut scratch)?;
        put_fixed(out, &scratch, T::WIDTH);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn pack_fixed_exact_width_unchanged(src in prop::collection::vec(any::<u8>(), 0..512)) {
            prop_assert_eq!(pack_fixed(&src, src.len()), src);
        }

        #[test]
        fn pack_fixed_empty_is_zeroes(width in 1usize..1024) {
            let packed = pack_fixed(&[], width);
            prop_assert_eq!(packed.len(), width);
            prop_assert!(packed.iter().all(|&b| b == 0));
        }

        #[test]
        fn pack_fixed_always_exact_width(
            src in prop::collection::vec(any::<u8>(), 0..128),
            width in 0usize..128,
        ) {
            let packed = pack_fixed(&src, width);
            prop_assert_eq!(packed.len(), width);
            let kept = src.len().min(width);
            prop_assert_eq!(&packed[..kept], &src[..kept]);
        }
    }

    #[test]
    fn test_pack_fixed_truncates_tail() {
        assert_eq!(pack_fixed(b"abcdef", 4), b"abcd");
        assert_eq!(pack_fixed(b"ab", 4), b"ab\0\0");
    }

    #[test]
    fn test_pack_fixed_array_matches_vec() {
        let a: [u8; 5] = pack_fixed_array(b"abcdefg");
        assert_eq!(&a[..], &pack_fixed(b"abcdefg", 5)[..]);
        let b: [u8; 5] = pack_fixed_array(b"ab");
        assert_eq!(&b[..], b"ab\0\0\0");
    }

    #[test]
    fn test_encode_legacy_text_ascii() {
        assert_eq!(encode_legacy_text("Center"), b"Center");
    }

    #[test]
    fn test_encode_legacy_text_kana() {
        // センター
        assert_eq!(
            encode_legacy_text("センター"),
            [0x83, 0x5A, 0x83, 0x93, 0x83, 0x5E, 0x81, 0x5B]
        );
    }

    #[test]
    fn test_encode_legacy_text_unmappable() {
        assert_eq!(encode_legacy_text("a\u{1F600}b"), b"a?b");
    }

    #[test]
    fn test_decode_legacy_text_stops_at_nul() {
        let mut field = encode_legacy_text("右腕");
        field.push(0);
        field.extend_from_slice(&[0xFD, 0xFD, 0xFD]);
        assert_eq!(decode_legacy_text(&field), "右腕");
    }

    #[test]
    fn test_split_character_decodes_lossily() {
        let bytes = pack_fixed(&encode_legacy_text("あい"), 3);
        assert_eq!(decode_legacy_text(&bytes), "あ\u{FFFD}");
    }

    #[test]
    fn test_numeric_encoding_is_little_endian() {
        let mut out = vec![];
        put_u32(&mut out, 1);
        put_f32(&mut out, 1.0);
        assert_eq!(out, [1, 0, 0, 0, 0x00, 0x00, 0x80, 0x3F]);
    }

    #[test]
    fn test_rgb_has_no_alpha() {
        let mut out = vec![];
        put_rgb(&mut out, Rgb::new(1.0, 0.5, 0.25));
        assert_eq!(out.len(), 12);
    }

    #[test]
    fn test_record_widths() {
        assert_eq!(RecordKind::BoneMotion.width(), 111);
        assert_eq!(RecordKind::Morph.width(), 23);
        assert_eq!(RecordKind::Camera.width(), 61);
        assert_eq!(RecordKind::Light.width(), 28);
        assert_eq!(RecordKind::SelfShadow.width(), 9);
    }

    struct Short(u8);

    impl FixedRecord for Short {
        const KIND: RecordKind = RecordKind::SelfShadow;

        fn encode_record(&self, out: &mut Vec<u8>) -> Result<(), WriteError> {
            out.push(self.0);
            Ok(())
        }
    }

    #[test]
    fn test_counted_list_pads_records() {
        let mut out = vec![];
        encode_counted_list(&mut out, &[Short(7), Short(8)]).unwrap();
        assert_eq!(out.len(), 4 + 2 * 9);
        assert_eq!(&out[..4], &2u32.to_le_bytes());
        assert_eq!(out[4], 7);
        assert_eq!(&out[5..13], &[0; 8]);
        assert_eq!(out[13], 8);
    }

    #[test]
    fn test_counted_list_empty() {
        let mut out = vec![];
        encode_counted_list(&mut out, &Vec::<Short>::new()).unwrap();
        assert_eq!(out, [0, 0, 0, 0]);
    }
}
