//! DICOM Part-10 stream writer
//!
//! Serializes a [`Dataset`] back into the explicit-VR little-endian form the
//! reader consumes. Used by the de-identification step to persist the
//! cleaned artifact.

use crate::core::parse::dataset::Dataset;
use crate::core::parse::reader::{MAGIC, PREAMBLE_LEN};
use crate::domain::tag::Vr;

/// Serializes a dataset into a DICOM byte stream
///
/// Values with odd lengths are padded to the even length the wire format
/// requires: UI values with NUL, other text with a space, binary with zero.
/// Elements are written in stream order, so `parse(write(d)) == d` for any
/// dataset with even-length values.
pub fn write(dataset: &Dataset) -> Vec<u8> {
    let mut out = vec![0u8; PREAMBLE_LEN];
    out.extend_from_slice(MAGIC);

    for (tag, element) in dataset.iter() {
        out.extend_from_slice(&tag.group.to_le_bytes());
        out.extend_from_slice(&tag.element.to_le_bytes());
        out.extend_from_slice(&element.vr.as_bytes());

        let mut value = element.value.clone();
        if value.len() % 2 != 0 {
            value.push(pad_byte(element.vr));
        }

        if element.vr.has_extended_length() {
            out.extend_from_slice(&[0u8, 0u8]);
            out.extend_from_slice(&(value.len() as u32).to_le_bytes());
        } else {
            out.extend_from_slice(&(value.len() as u16).to_le_bytes());
        }
        out.extend_from_slice(&value);
    }

    out
}

fn pad_byte(vr: Vr) -> u8 {
    match vr {
        Vr::UI => 0x00,
        v if v.is_text() => b' ',
        _ => 0x00,
    }
}
