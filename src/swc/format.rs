//! SWC format constants.

/// File extension (last extension, compared case-sensitively).
pub const SWC_EXTENSION: &str = "swc";

/// Character that introduces header comment text.
pub const HEADER_MARKER: char = '#';

/// First token of the line that opens the connectivity section.
pub const CELLS_MARKER: &str = "CELLS";

/// Parent identifier of a root sample.
pub const ROOT_PARENT: i64 = -1;

/// Number of whitespace separated fields in a record line.
pub const RECORD_FIELDS: usize = 7;

/// Spatial dimension of every point.
pub const POINT_DIMENSION: usize = 3;

/// Header slots (kind, point count) in front of each cell's vertices.
pub const CELL_HEADER_SLOTS: usize = 2;

/// Size hint contributed by each non-root sample.
pub const CELL_SIZE_HINT: usize = 4;

/// Cell geometry codes of the host mesh pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum CellGeometry {
    Vertex = 0,
    Line = 1,
    Triangle = 2,
    Quadrilateral = 3,
    Polygon = 4,
}

impl CellGeometry {
    /// Parse from the pipeline's u32 code.
    pub fn from_u32(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Vertex),
            1 => Some(Self::Line),
            2 => Some(Self::Triangle),
            3 => Some(Self::Quadrilateral),
            4 => Some(Self::Polygon),
            _ => None,
        }
    }

    /// Convert to the pipeline's u32 code.
    #[inline]
    pub const fn code(self) -> u32 {
        self as u32
    }
}

/// Storage of the file on disk. SWC is always text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FileType {
    #[default]
    Ascii,
    Binary,
}

/// Pixel layout of point/cell data channels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PixelType {
    #[default]
    Scalar,
}
