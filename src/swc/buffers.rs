//! Flat point and attribute storage filled by a scan.
//!
//! Buffers are index aligned: entry `i` of every attribute array belongs to
//! point `i`, whose coordinates are `points[3 * i..3 * i + 3]`. Setters
//! replace an array wholesale and never check it against the others.

use std::fmt;

use super::format::POINT_DIMENSION;
use super::record::Record;
use crate::util::ComponentType;

/// Per-point attribute channels of a morphology.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PointDataContent {
    /// The format's sample identifiers
    #[default]
    SampleIdentifier,
    /// Structure type identifiers
    TypeIdentifier,
    /// Sample radii
    Radius,
    /// Parent sample identifiers
    ParentIdentifier,
}

impl PointDataContent {
    /// All channels, in file column order.
    pub const ALL: [Self; 4] = [
        Self::SampleIdentifier,
        Self::TypeIdentifier,
        Self::Radius,
        Self::ParentIdentifier,
    ];

    /// Storage width reported to the pipeline for this channel.
    pub const fn component_type(self) -> ComponentType {
        match self {
            Self::SampleIdentifier => ComponentType::Int16,
            Self::TypeIdentifier => ComponentType::Uint8,
            Self::Radius => ComponentType::Float64,
            Self::ParentIdentifier => ComponentType::Int16,
        }
    }

    /// Name of the channel.
    pub const fn name(self) -> &'static str {
        match self {
            Self::SampleIdentifier => "SampleIdentifier",
            Self::TypeIdentifier => "TypeIdentifier",
            Self::Radius => "Radius",
            Self::ParentIdentifier => "ParentIdentifier",
        }
    }
}

impl fmt::Display for PointDataContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Borrowed view of one attribute array.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Attribute<'a> {
    SampleIdentifiers(&'a [i64]),
    TypeIdentifiers(&'a [i32]),
    Radii(&'a [f64]),
    ParentIdentifiers(&'a [i64]),
}

impl Attribute<'_> {
    /// Channel this array belongs to.
    pub fn content(&self) -> PointDataContent {
        match self {
            Self::SampleIdentifiers(_) => PointDataContent::SampleIdentifier,
            Self::TypeIdentifiers(_) => PointDataContent::TypeIdentifier,
            Self::Radii(_) => PointDataContent::Radius,
            Self::ParentIdentifiers(_) => PointDataContent::ParentIdentifier,
        }
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        match self {
            Self::SampleIdentifiers(v) | Self::ParentIdentifiers(v) => v.len(),
            Self::TypeIdentifiers(v) => v.len(),
            Self::Radii(v) => v.len(),
        }
    }

    /// Returns true if the array has no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Zero-based point index to sample identifier, as read from the file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PointIndexMap {
    sample_ids: Vec<i64>,
}

impl PointIndexMap {
    /// Sample identifier of the point at `index`.
    #[inline]
    pub fn sample_id(&self, index: usize) -> Option<i64> {
        self.sample_ids.get(index).copied()
    }

    /// Number of mapped points.
    #[inline]
    pub fn len(&self) -> usize {
        self.sample_ids.len()
    }

    /// Returns true if no point is mapped.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sample_ids.is_empty()
    }

    /// Iterate `(index, sample_id)` pairs in point order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, i64)> + '_ {
        self.sample_ids.iter().copied().enumerate()
    }

    fn push(&mut self, sample_id: i64) {
        self.sample_ids.push(sample_id);
    }
}

/// Owner of the point, attribute and header buffers.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MorphologyBuffers {
    header: Vec<String>,
    points: Vec<f64>,
    sample_identifiers: Vec<i64>,
    type_identifiers: Vec<i32>,
    radii: Vec<f64>,
    parent_identifiers: Vec<i64>,
    index_map: PointIndexMap,
}

impl MorphologyBuffers {
    /// Create empty buffers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all content.
    pub fn clear(&mut self) {
        self.header.clear();
        self.points.clear();
        self.sample_identifiers.clear();
        self.type_identifiers.clear();
        self.radii.clear();
        self.parent_identifiers.clear();
        self.index_map = PointIndexMap::default();
    }

    /// Append a header line (text after the marker).
    pub fn push_header_line(&mut self, line: impl Into<String>) {
        self.header.push(line.into());
    }

    /// Append one record to every buffer.
    pub fn push_record(&mut self, record: &Record) {
        self.points.extend_from_slice(&record.position.to_array());
        self.sample_identifiers.push(record.sample_id);
        self.type_identifiers.push(record.type_id);
        self.radii.push(record.radius);
        self.parent_identifiers.push(record.parent_id);
        self.index_map.push(record.sample_id);
    }

    /// Number of points in the point buffer.
    #[inline]
    pub fn num_points(&self) -> usize {
        self.points.len() / POINT_DIMENSION
    }

    /// Interleaved x, y, z coordinates.
    #[inline]
    pub fn points(&self) -> &[f64] {
        &self.points
    }

    /// Index to sample identifier mapping of the last scan.
    #[inline]
    pub fn index_map(&self) -> &PointIndexMap {
        &self.index_map
    }

    /// Header lines.
    #[inline]
    pub fn header_content(&self) -> &[String] {
        &self.header
    }

    /// Replace the header lines.
    pub fn set_header_content(&mut self, header: &[String]) {
        self.header.clear();
        self.header.extend_from_slice(header);
    }

    #[inline]
    pub fn sample_identifiers(&self) -> &[i64] {
        &self.sample_identifiers
    }

    pub fn set_sample_identifiers(&mut self, values: &[i64]) {
        replace(&mut self.sample_identifiers, values);
    }

    #[inline]
    pub fn type_identifiers(&self) -> &[i32] {
        &self.type_identifiers
    }

    pub fn set_type_identifiers(&mut self, values: &[i32]) {
        replace(&mut self.type_identifiers, values);
    }

    #[inline]
    pub fn radii(&self) -> &[f64] {
        &self.radii
    }

    pub fn set_radii(&mut self, values: &[f64]) {
        replace(&mut self.radii, values);
    }

    #[inline]
    pub fn parent_identifiers(&self) -> &[i64] {
        &self.parent_identifiers
    }

    pub fn set_parent_identifiers(&mut self, values: &[i64]) {
        replace(&mut self.parent_identifiers, values);
    }

    /// View of one attribute channel.
    pub fn attribute(&self, content: PointDataContent) -> Attribute<'_> {
        match content {
            PointDataContent::SampleIdentifier => Attribute::SampleIdentifiers(&self.sample_identifiers),
            PointDataContent::TypeIdentifier => Attribute::TypeIdentifiers(&self.type_identifiers),
            PointDataContent::Radius => Attribute::Radii(&self.radii),
            PointDataContent::ParentIdentifier => Attribute::ParentIdentifiers(&self.parent_identifiers),
        }
    }

    /// Replace the channel `attribute` belongs to.
    pub fn set_attribute(&mut self, attribute: Attribute<'_>) {
        match attribute {
            Attribute::SampleIdentifiers(v) => self.set_sample_identifiers(v),
            Attribute::TypeIdentifiers(v) => self.set_type_identifiers(v),
            Attribute::Radii(v) => self.set_radii(v),
            Attribute::ParentIdentifiers(v) => self.set_parent_identifiers(v),
        }
    }
}

/// Resize to the input length and copy element-wise.
fn replace<T: Copy>(target: &mut Vec<T>, values: &[T]) {
    target.clear();
    target.extend_from_slice(values);
}
