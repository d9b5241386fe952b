//! In-memory DICOM dataset
//!
//! An ordered map from tags to raw elements, owned transiently by one
//! pipeline invocation. Values stay in wire form; typed accessors decode on
//! demand and return `None` rather than fail on malformed content.

use crate::domain::tag::{Tag, Vr};
use std::collections::BTreeMap;

/// One data element: a value representation plus the raw value bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Declared value representation
    pub vr: Vr,
    /// Raw value bytes as read from (or written to) the stream
    pub value: Vec<u8>,
}

impl Element {
    /// Creates an element from a VR and raw bytes
    pub fn new(vr: Vr, value: Vec<u8>) -> Self {
        Self { vr, value }
    }

    /// Creates a text element, encoding the string as ASCII bytes
    pub fn text(vr: Vr, value: &str) -> Self {
        Self {
            vr,
            value: value.as_bytes().to_vec(),
        }
    }

    /// Creates an element with an empty value
    ///
    /// Used to record the presence of a tag whose value the pipeline does
    /// not retain, such as pixel data.
    pub fn empty(vr: Vr) -> Self {
        Self { vr, value: Vec::new() }
    }

    /// Decodes the value as a trimmed string
    ///
    /// Strips the trailing space or NUL padding the wire format requires for
    /// even lengths.
    pub fn as_string(&self) -> String {
        String::from_utf8_lossy(&self.value)
            .trim_end_matches(['\0', ' '])
            .trim_start()
            .to_string()
    }
}

/// Ordered collection of data elements keyed by tag
///
/// Iteration order is stream order (group, then element), which the
/// de-identifier relies on for a stable removed-tag list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    elements: BTreeMap<Tag, Element>,
}

impl Dataset {
    /// Creates an empty dataset
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a dataset from an existing element map
    pub fn from_elements(elements: BTreeMap<Tag, Element>) -> Self {
        Self { elements }
    }

    /// Number of elements in the dataset
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns true when the dataset holds no elements
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Returns true when the tag is present
    pub fn contains(&self, tag: Tag) -> bool {
        self.elements.contains_key(&tag)
    }

    /// Borrows the element for a tag
    pub fn get(&self, tag: Tag) -> Option<&Element> {
        self.elements.get(&tag)
    }

    /// Inserts or replaces an element, returning any previous element
    pub fn insert(&mut self, tag: Tag, element: Element) -> Option<Element> {
        self.elements.insert(tag, element)
    }

    /// Removes an element, returning it when present
    pub fn remove(&mut self, tag: Tag) -> Option<Element> {
        self.elements.remove(&tag)
    }

    /// Iterates elements in stream order
    pub fn iter(&self) -> impl Iterator<Item = (&Tag, &Element)> {
        self.elements.iter()
    }

    /// Decodes a tag's value as a trimmed string, empty when absent
    pub fn string(&self, tag: Tag) -> String {
        self.get(tag).map(|e| e.as_string()).unwrap_or_default()
    }

    /// Decodes a tag's value as an unsigned short (binary `US`)
    pub fn ushort(&self, tag: Tag) -> Option<u16> {
        let element = self.get(tag)?;
        if element.value.len() < 2 {
            return None;
        }
        Some(u16::from_le_bytes([element.value[0], element.value[1]]))
    }

    /// Parses an integer string (`IS`) value
    pub fn int(&self, tag: Tag) -> Option<i32> {
        let text = self.string(tag);
        if text.is_empty() {
            return None;
        }
        text.parse().ok()
    }

    /// Parses a decimal string (`DS`) value, first component only
    pub fn decimal(&self, tag: Tag) -> Option<f64> {
        self.decimals(tag).into_iter().next()
    }

    /// Parses all components of a multi-valued decimal string (`DS`)
    pub fn decimals(&self, tag: Tag) -> Vec<f64> {
        let text = self.string(tag);
        if text.is_empty() {
            return Vec::new();
        }
        text.split('\\').filter_map(|part| part.trim().parse().ok()).collect()
    }
}
