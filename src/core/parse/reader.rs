//! DICOM Part-10 stream reader
//!
//! Parses the header region of a DICOM file: 128-byte preamble, `DICM`
//! magic marker, then explicit-VR little-endian tag/VR/length/value records.
//!
//! Pixel data terminates the scan. A defined-length pixel value is skipped
//! (its presence is recorded with an empty element), and an undefined length
//! value, which is how encapsulated/compressed frames are written, ends the
//! header region outright. Either way header extraction succeeds regardless
//! of the pixel encoding.

use crate::core::parse::dataset::{Dataset, Element};
use crate::domain::errors::ParseError;
use crate::domain::tag::{tags, Tag, Vr};
use std::collections::BTreeMap;

/// Preamble length mandated by the file format
pub const PREAMBLE_LEN: usize = 128;

/// Magic marker following the preamble
pub const MAGIC: &[u8; 4] = b"DICM";

const UNDEFINED_LENGTH: u32 = 0xFFFF_FFFF;

/// Parses a DICOM byte stream into a [`Dataset`]
///
/// # Errors
///
/// Returns a [`ParseError`] when the stream lacks the expected framing:
/// too short for the preamble, missing magic marker, truncated records, or
/// an unrecognized value representation.
///
/// # Examples
///
/// ```
/// use aperture::core::parse::{parse, write, Dataset, Element};
/// use aperture::domain::tag::{tags, Vr};
///
/// let mut dataset = Dataset::new();
/// dataset.insert(tags::PATIENT_ID, Element::text(Vr::LO, "12345"));
/// let bytes = write(&dataset);
///
/// let parsed = parse(&bytes).unwrap();
/// assert_eq!(parsed.string(tags::PATIENT_ID), "12345");
/// ```
pub fn parse(bytes: &[u8]) -> Result<Dataset, ParseError> {
    if bytes.len() < PREAMBLE_LEN + MAGIC.len() {
        return Err(ParseError::MissingPreamble { length: bytes.len() });
    }

    let magic = &bytes[PREAMBLE_LEN..PREAMBLE_LEN + MAGIC.len()];
    if magic != MAGIC {
        let mut found = [0u8; 4];
        found.copy_from_slice(magic);
        return Err(ParseError::BadMagic { found });
    }

    let mut elements = BTreeMap::new();
    let mut offset = PREAMBLE_LEN + MAGIC.len();

    while offset < bytes.len() {
        let (tag, element, next) = read_element(bytes, offset)?;

        if tag == tags::PIXEL_DATA {
            // Presence matters for downstream reporting, the bytes do not.
            elements.insert(tag, Element::empty(element.vr));
            if next.is_none() {
                break;
            }
            offset = next.unwrap_or(bytes.len());
            continue;
        }

        elements.insert(tag, element);
        offset = next.unwrap_or(bytes.len());
    }

    Ok(Dataset::from_elements(elements))
}

/// Reads one element at `offset`
///
/// Returns the tag, the element, and the offset of the next record, or
/// `None` for an undefined-length pixel value that ends the scan.
fn read_element(
    bytes: &[u8],
    offset: usize,
) -> Result<(Tag, Element, Option<usize>), ParseError> {
    let header = take(bytes, offset, 8)?;
    let tag = Tag::new(
        u16::from_le_bytes([header[0], header[1]]),
        u16::from_le_bytes([header[2], header[3]]),
    );

    let vr_bytes = [header[4], header[5]];
    let vr = Vr::from_bytes(vr_bytes).ok_or(ParseError::InvalidVr { tag, bytes: vr_bytes })?;

    let (length, value_offset) = if vr.has_extended_length() {
        let extended = take(bytes, offset + 8, 4)?;
        let length = u32::from_le_bytes([extended[0], extended[1], extended[2], extended[3]]);
        (length, offset + 12)
    } else {
        let length = u16::from_le_bytes([header[6], header[7]]) as u32;
        (length, offset + 8)
    };

    if length == UNDEFINED_LENGTH {
        if tag == tags::PIXEL_DATA {
            return Ok((tag, Element::empty(vr), None));
        }
        return Err(ParseError::UndefinedLength { tag });
    }

    let value = take(bytes, value_offset, length as usize)?;
    Ok((
        tag,
        Element::new(vr, value.to_vec()),
        Some(value_offset + length as usize),
    ))
}

fn take(bytes: &[u8], offset: usize, len: usize) -> Result<&[u8], ParseError> {
    let end = offset.checked_add(len).ok_or(ParseError::Truncated {
        offset,
        needed: len,
    })?;
    if end > bytes.len() {
        return Err(ParseError::Truncated {
            offset,
            needed: end - bytes.len(),
        });
    }
    Ok(&bytes[offset..end])
}

/// Returns the transfer syntax identifier of a dataset
///
/// Pure lookup of the `(0002,0010)` file meta tag; an absent tag yields an
/// empty string, never an error.
pub fn transfer_syntax(dataset: &Dataset) -> String {
    dataset.string(tags::TRANSFER_SYNTAX_UID)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parse::writer::write;

    fn minimal_dataset() -> Dataset {
        let mut dataset = Dataset::new();
        dataset.insert(
            tags::TRANSFER_SYNTAX_UID,
            Element::text(Vr::UI, "1.2.840.10008.1.2.1"),
        );
        dataset.insert(tags::PATIENT_ID, Element::text(Vr::LO, "12345"));
        dataset.insert(tags::ROWS, Element::new(Vr::US, vec![0x00, 0x02]));
        dataset
    }

    #[test]
    fn test_too_short_stream() {
        let err = parse(&[0u8; 64]).unwrap_err();
        assert_eq!(err, ParseError::MissingPreamble { length: 64 });
    }

    #[test]
    fn test_missing_magic() {
        let mut bytes = vec![0u8; 140];
        bytes[128..132].copy_from_slice(b"JUNK");
        let err = parse(&bytes).unwrap_err();
        assert!(matches!(err, ParseError::BadMagic { .. }));
    }

    #[test]
    fn test_roundtrip_preserves_values() {
        let dataset = minimal_dataset();
        let parsed = parse(&write(&dataset)).unwrap();
        assert_eq!(parsed.string(tags::PATIENT_ID), "12345");
        assert_eq!(parsed.ushort(tags::ROWS), Some(512));
    }

    #[test]
    fn test_truncated_value() {
        let mut bytes = write(&minimal_dataset());
        bytes.truncate(bytes.len() - 1);
        let err = parse(&bytes).unwrap_err();
        assert!(matches!(err, ParseError::Truncated { .. }));
    }

    #[test]
    fn test_invalid_vr() {
        let mut bytes = vec![0u8; PREAMBLE_LEN];
        bytes.extend_from_slice(MAGIC);
        // (0010,0020) with a VR code that does not exist
        bytes.extend_from_slice(&[0x10, 0x00, 0x20, 0x00]);
        bytes.extend_from_slice(b"QQ");
        bytes.extend_from_slice(&[0x00, 0x00]);
        let err = parse(&bytes).unwrap_err();
        assert!(matches!(err, ParseError::InvalidVr { .. }));
    }

    #[test]
    fn test_defined_length_pixel_data_is_skipped() {
        let mut bytes = write(&minimal_dataset());
        // Append (7FE0,0010) OW with 4 bytes of pixel payload
        bytes.extend_from_slice(&[0xE0, 0x7F, 0x10, 0x00]);
        bytes.extend_from_slice(b"OW");
        bytes.extend_from_slice(&[0x00, 0x00]);
        bytes.extend_from_slice(&4u32.to_le_bytes());
        bytes.extend_from_slice(&[1, 2, 3, 4]);

        let parsed = parse(&bytes).unwrap();
        assert!(parsed.contains(tags::PIXEL_DATA));
        assert!(parsed.get(tags::PIXEL_DATA).unwrap().value.is_empty());
        assert_eq!(parsed.string(tags::PATIENT_ID), "12345");
    }

    #[test]
    fn test_encapsulated_pixel_data_ends_scan() {
        let mut bytes = write(&minimal_dataset());
        // Undefined-length OB pixel data, as written for compressed frames
        bytes.extend_from_slice(&[0xE0, 0x7F, 0x10, 0x00]);
        bytes.extend_from_slice(b"OB");
        bytes.extend_from_slice(&[0x00, 0x00]);
        bytes.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
        // Fragment garbage that must never be touched
        bytes.extend_from_slice(&[0xFE, 0xFF, 0x00, 0xE0, 0xAA, 0xBB]);

        let parsed = parse(&bytes).unwrap();
        assert!(parsed.contains(tags::PIXEL_DATA));
        assert_eq!(parsed.string(tags::PATIENT_ID), "12345");
    }

    #[test]
    fn test_undefined_length_outside_pixel_data_rejected() {
        let mut bytes = vec![0u8; PREAMBLE_LEN];
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&[0x08, 0x00, 0x00, 0x11]); // some SQ tag
        bytes.extend_from_slice(b"SQ");
        bytes.extend_from_slice(&[0x00, 0x00]);
        bytes.extend_from_slice(&0xFFFF_FFFFu32.to_le_bytes());
        let err = parse(&bytes).unwrap_err();
        assert!(matches!(err, ParseError::UndefinedLength { .. }));
    }

    #[test]
    fn test_transfer_syntax_lookup() {
        let dataset = minimal_dataset();
        assert_eq!(transfer_syntax(&dataset), "1.2.840.10008.1.2.1");
        assert_eq!(transfer_syntax(&Dataset::new()), "");
    }
}
