//! Mesh IO facade driven by the host pipeline.
//!
//! The pipeline calls [`SwcMeshIo::read_mesh_information`] first, then any
//! number of point, point data and windowed cell reads, then
//! [`SwcMeshIo::close`]. Writing is independent of the read protocol.

use std::fmt;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use super::buffers::{Attribute, MorphologyBuffers, PointDataContent};
use super::format::{FileType, PixelType, POINT_DIMENSION, SWC_EXTENSION};
use super::scanner::{RecordScanner, Scan};
use super::topology::{CellStreamInfo, CellStreamSource, CellWindow};
use super::writer::SwcWriter;
use crate::util::{ComponentType, Error, Result, SwcComponent, SwcIndex};

/// Position in the read protocol.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ReadState {
    /// Nothing read yet
    #[default]
    Unopened,
    /// Mesh information scanned, buffers available
    InfoRead,
    /// Points handed to the pipeline
    PointsRead,
    /// Cells handed to the pipeline
    CellsRead,
    /// Reading finished
    Closed,
}

/// Mesh information reported after a scan.
#[derive(Clone, Debug, PartialEq)]
pub struct MeshInfo {
    pub number_of_points: usize,
    /// Non-root samples; each one is a segment to its parent.
    pub number_of_cells: usize,
    /// Capacity hint, 4 slots per counted cell.
    pub cell_buffer_size: usize,
    pub number_of_point_pixels: usize,
    pub point_dimension: usize,
    pub file_type: FileType,
    pub point_component_type: ComponentType,
    pub cell_component_type: ComponentType,
    pub point_pixel_type: PixelType,
    pub number_of_point_pixel_components: usize,
    pub point_pixel_component_type: ComponentType,
    pub cell_pixel_type: PixelType,
    pub number_of_cell_pixel_components: usize,
    /// Points changed and must be fetched again.
    pub update_points: bool,
    /// Point data changed and must be fetched again.
    pub update_point_data: bool,
    /// Cells changed and must be fetched again.
    pub update_cells: bool,
    /// Connectivity section found by the scan.
    pub cell_stream: Option<CellStreamInfo>,
}

impl MeshInfo {
    fn from_scan(scan: &Scan, content: PointDataContent) -> Self {
        Self {
            number_of_points: scan.number_of_points,
            number_of_cells: scan.number_of_cells,
            cell_buffer_size: scan.cell_buffer_size,
            number_of_point_pixels: scan.number_of_points,
            point_dimension: POINT_DIMENSION,
            file_type: FileType::Ascii,
            point_component_type: ComponentType::Float64,
            cell_component_type: ComponentType::Uint32,
            point_pixel_type: PixelType::Scalar,
            number_of_point_pixel_components: 1,
            point_pixel_component_type: content.component_type(),
            cell_pixel_type: PixelType::Scalar,
            number_of_cell_pixel_components: 1,
            update_points: scan.number_of_points > 0,
            update_point_data: scan.number_of_points > 0,
            update_cells: scan.number_of_cells > 0,
            cell_stream: scan.cell_stream,
        }
    }

    /// Number of cells in the sign-terminated stream.
    ///
    /// This is the count declared by the `CELLS` section when the file has
    /// one, otherwise the parent-derived [`number_of_cells`](Self::number_of_cells).
    pub fn stream_cell_count(&self) -> usize {
        self.cell_stream.map_or(self.number_of_cells, |s| s.number_of_cells)
    }
}

/// The selected point data channel in its reported width.
#[derive(Clone, Debug, PartialEq)]
pub enum PointData {
    Int16(Vec<i16>),
    Uint8(Vec<u8>),
    Float64(Vec<f64>),
}

impl PointData {
    /// Width of the values.
    pub fn component_type(&self) -> ComponentType {
        match self {
            Self::Int16(_) => ComponentType::Int16,
            Self::Uint8(_) => ComponentType::Uint8,
            Self::Float64(_) => ComponentType::Float64,
        }
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        match self {
            Self::Int16(v) => v.len(),
            Self::Uint8(v) => v.len(),
            Self::Float64(v) => v.len(),
        }
    }

    /// Returns true if there are no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// SWC codec instance: owns the buffers of one file.
///
/// Not synchronized; one instance serves one caller at a time.
#[derive(Debug)]
pub struct SwcMeshIo {
    file_name: PathBuf,
    buffers: MorphologyBuffers,
    info: Option<MeshInfo>,
    state: ReadState,
    point_data_content: PointDataContent,
    use_mmap: bool,
}

impl Default for SwcMeshIo {
    fn default() -> Self {
        Self::new()
    }
}

impl SwcMeshIo {
    /// Create a codec with no file attached.
    pub fn new() -> Self {
        Self {
            file_name: PathBuf::new(),
            buffers: MorphologyBuffers::new(),
            info: None,
            state: ReadState::Unopened,
            point_data_content: PointDataContent::default(),
            use_mmap: cfg!(feature = "mmap"),
        }
    }

    /// Create a codec for `path`. No I/O happens until a read.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let mut io = Self::new();
        io.set_file_name(path);
        io
    }

    /// Extensions this codec reads and writes.
    pub fn supported_extensions() -> &'static [&'static str] {
        &[SWC_EXTENSION]
    }

    /// Returns true if `path` is an existing file with the `.swc` extension.
    pub fn can_read_file(path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        path.is_file() && Self::can_write_file(path)
    }

    /// Returns true if `path` has the `.swc` extension (case-sensitive).
    pub fn can_write_file(path: impl AsRef<Path>) -> bool {
        path.as_ref().extension().is_some_and(|ext| ext == SWC_EXTENSION)
    }

    #[inline]
    pub fn file_name(&self) -> &Path {
        &self.file_name
    }

    /// Attach a new file; the read protocol starts over.
    pub fn set_file_name(&mut self, path: impl AsRef<Path>) {
        self.file_name = path.as_ref().to_path_buf();
        self.info = None;
        self.state = ReadState::Unopened;
    }

    #[inline]
    pub fn state(&self) -> ReadState {
        self.state
    }

    #[inline]
    pub fn point_data_content(&self) -> PointDataContent {
        self.point_data_content
    }

    /// Select the point data channel. Updates the reported width if the
    /// mesh information was already read.
    pub fn set_point_data_content(&mut self, content: PointDataContent) {
        self.point_data_content = content;
        if let Some(info) = &mut self.info {
            info.point_pixel_component_type = content.component_type();
        }
    }

    /// Memory-map the file for windowed cell reads (needs the `mmap` feature).
    pub fn set_use_mmap(&mut self, use_mmap: bool) {
        self.use_mmap = use_mmap;
    }

    /// Information of the last successful scan.
    #[inline]
    pub fn info(&self) -> Option<&MeshInfo> {
        self.info.as_ref()
    }

    #[inline]
    pub fn buffers(&self) -> &MorphologyBuffers {
        &self.buffers
    }

    #[inline]
    pub fn buffers_mut(&mut self) -> &mut MorphologyBuffers {
        &mut self.buffers
    }

    #[inline]
    pub fn header_content(&self) -> &[String] {
        self.buffers.header_content()
    }

    pub fn set_header_content(&mut self, header: &[String]) {
        self.buffers.set_header_content(header);
    }

    pub fn attribute(&self, content: PointDataContent) -> Attribute<'_> {
        self.buffers.attribute(content)
    }

    pub fn set_attribute(&mut self, attribute: Attribute<'_>) {
        self.buffers.set_attribute(attribute);
    }

    /// Scan the whole file: header, records, point and cell counts.
    ///
    /// On failure the previous buffers and information are left untouched.
    pub fn read_mesh_information(&mut self) -> Result<&MeshInfo> {
        let scan = RecordScanner::scan_file(&self.file_name)?;
        let info = MeshInfo::from_scan(&scan, self.point_data_content);
        self.buffers = scan.buffers;
        self.state = ReadState::InfoRead;
        Ok(self.info.insert(info))
    }

    fn readable_info(&self) -> Result<&MeshInfo> {
        match (self.state, &self.info) {
            (ReadState::Unopened | ReadState::Closed, _) | (_, None) => Err(Error::precondition(format!(
                "mesh information must be read first (state {:?})",
                self.state
            ))),
            (_, Some(info)) => Ok(info),
        }
    }

    /// Copy the interleaved point coordinates into `out` (`3 * N` values).
    pub fn read_points(&mut self, out: &mut [f64]) -> Result<()> {
        self.readable_info()?;
        let points = self.buffers.points();
        if out.len() != points.len() {
            return Err(Error::precondition(format!(
                "point buffer has {} values, expected {}",
                out.len(),
                points.len()
            )));
        }
        out.copy_from_slice(points);
        self.state = ReadState::PointsRead;
        Ok(())
    }

    /// Decode cells `window` of the stream starting at byte `offset` into
    /// `out`, which must be sized exactly (see [`cell_window_len`](Self::cell_window_len)).
    pub fn read_cells(&mut self, offset: u64, window: CellWindow, out: &mut [u32]) -> Result<usize> {
        let cell_count = self.readable_info()?.stream_cell_count();
        let source = CellStreamSource::open_opts(&self.file_name, self.use_mmap)?;
        let written = source.decode(offset, cell_count, window, out)?;
        self.state = ReadState::CellsRead;
        Ok(written)
    }

    /// Like [`read_cells`](Self::read_cells) at the offset of the file's
    /// `CELLS` section.
    pub fn read_cell_section(&mut self, window: CellWindow, out: &mut [u32]) -> Result<usize> {
        let offset = self.cell_section()?.offset;
        self.read_cells(offset, window, out)
    }

    /// Slots a window of the stream starting at `offset` needs.
    pub fn cell_window_len(&self, offset: u64, window: CellWindow) -> Result<usize> {
        let cell_count = self.readable_info()?.stream_cell_count();
        let source = CellStreamSource::open_opts(&self.file_name, self.use_mmap)?;
        source.measure(offset, cell_count, window)
    }

    fn cell_section(&self) -> Result<CellStreamInfo> {
        self.readable_info()?
            .cell_stream
            .ok_or_else(|| Error::precondition("file has no CELLS section"))
    }

    /// The selected point data channel, converted to its reported width.
    pub fn read_point_data(&self) -> Result<PointData> {
        self.readable_info()?;
        let target = self.point_data_content.component_type();
        let out_of_range = |value: &dyn fmt::Display| Error::ValueOutOfRange { value: value.to_string(), target };
        let data = match self.buffers.attribute(self.point_data_content) {
            Attribute::SampleIdentifiers(v) | Attribute::ParentIdentifiers(v) => PointData::Int16(
                v.iter()
                    .map(|&x| i16::try_from(x).map_err(|_| out_of_range(&x)))
                    .collect::<Result<_>>()?,
            ),
            Attribute::TypeIdentifiers(v) => PointData::Uint8(
                v.iter()
                    .map(|&x| u8::try_from(x).map_err(|_| out_of_range(&x)))
                    .collect::<Result<_>>()?,
            ),
            Attribute::Radii(v) => PointData::Float64(v.to_vec()),
        };
        Ok(data)
    }

    /// The format has no cell data.
    pub fn read_cell_data(&self) -> Result<()> {
        self.readable_info()?;
        trace!("cell data reading is a no-op for SWC");
        Ok(())
    }

    /// Finish the read protocol. Buffers stay available for writing.
    pub fn close(&mut self) {
        self.state = ReadState::Closed;
    }

    /// Write header, points and cells from raw buffers of the given kinds.
    ///
    /// The file is only created or replaced once every buffer has been
    /// serialized; a rejected call leaves any existing file as it was.
    pub fn write(
        &self,
        path: impl AsRef<Path>,
        points: &[u8],
        point_component: ComponentType,
        cells: &[u8],
        cell_component: ComponentType,
    ) -> Result<()> {
        let path = output_path(path.as_ref())?;
        let mut writer = SwcWriter::new(Vec::new());
        writer.write_header(self.buffers.header_content())?;
        writer.write_points_raw(points, point_component, &self.buffers)?;
        writer.write_cells_raw(cells, cell_component)?;
        finish(writer, path)
    }

    /// Write header, points and cells from typed buffers.
    pub fn write_typed<P: SwcComponent, C: SwcIndex>(&self, path: impl AsRef<Path>, points: &[P], cells: &[C]) -> Result<()> {
        let path = output_path(path.as_ref())?;
        let mut writer = SwcWriter::new(Vec::new());
        writer.write_header(self.buffers.header_content())?;
        writer.write_points(points, &self.buffers)?;
        writer.write_cells(cells)?;
        finish(writer, path)
    }
}

fn output_path(path: &Path) -> Result<&Path> {
    if path.as_os_str().is_empty() {
        return Err(Error::precondition("no output file name"));
    }
    Ok(path)
}

/// Replace the file at `path` with the serialized content.
fn finish(mut writer: SwcWriter<Vec<u8>>, path: &Path) -> Result<()> {
    writer.write_point_data(&[])?;
    writer.write_cell_data(&[])?;
    let (points, cells) = (writer.points_written(), writer.cells_written());
    let content = writer.into_inner()?;

    let file = OpenOptions::new().write(true).create(true).truncate(true).open(path)?;
    let mut out = BufWriter::new(file);
    out.write_all(&content)?;
    out.flush()?;
    debug!(path = %path.display(), points, cells, bytes = content.len(), "wrote SWC file");
    Ok(())
}

impl fmt::Display for SwcMeshIo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SwcMeshIo")?;
        writeln!(f, "  FileName: {}", self.file_name.display())?;
        writeln!(f, "  State: {:?}", self.state)?;
        writeln!(f, "  PointDataContent: {}", self.point_data_content)?;
        match &self.info {
            Some(info) => {
                writeln!(f, "  NumberOfPoints: {}", info.number_of_points)?;
                writeln!(f, "  NumberOfCells: {}", info.number_of_cells)?;
                writeln!(f, "  CellBufferSize: {}", info.cell_buffer_size)?;
                match info.cell_stream {
                    Some(s) => writeln!(f, "  CellStream: offset {}, {} cells", s.offset, s.number_of_cells),
                    None => writeln!(f, "  CellStream: none"),
                }
            }
            None => writeln!(f, "  MeshInformation: not read"),
        }
    }
}
