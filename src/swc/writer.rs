//! SWC text writer, generic over the numeric width of the input buffers.
//!
//! Output layout:
//!
//! ```text
//! #<header line>                                 one per header entry
//! <id> <type> <x> <y> <z> <radius> <parent>      one per point
//! CELLS <count>                                  only if there are cells
//! <v_0 + 1> ... <v_{k-2} + 1> -(v_{k-1} + 1)     one per cell
//! ```

use std::borrow::Cow;
use std::io::Write;

use tracing::{debug, trace, warn};

use super::buffers::MorphologyBuffers;
use super::format::{CELLS_MARKER, HEADER_MARKER, POINT_DIMENSION, ROOT_PARENT};
use super::topology::cell_records;
use crate::util::{dispatch_component, dispatch_index, ComponentType, Error, Result, SwcComponent, SwcIndex};

/// Type identifier written when no type identifiers are available.
pub const DEFAULT_TYPE_ID: i32 = 0;

/// Radius written when no radii are available.
pub const DEFAULT_RADIUS: f64 = 1.0;

/// Serializer for header, points and cells over an open destination.
pub struct SwcWriter<W: Write> {
    out: W,
    points_written: usize,
    cells_written: usize,
}

impl<W: Write> SwcWriter<W> {
    /// Wrap an already open destination.
    pub fn new(out: W) -> Self {
        Self { out, points_written: 0, cells_written: 0 }
    }

    /// Points written so far.
    #[inline]
    pub fn points_written(&self) -> usize {
        self.points_written
    }

    /// Cells written so far.
    #[inline]
    pub fn cells_written(&self) -> usize {
        self.cells_written
    }

    /// Write each header entry as a comment line.
    pub fn write_header(&mut self, header: &[String]) -> Result<()> {
        for line in header {
            if line.contains(['\n', '\r']) {
                return Err(Error::precondition("header entries cannot span lines"));
            }
            writeln!(self.out, "{}{}", HEADER_MARKER, line)?;
        }
        Ok(())
    }

    /// Write one record per coordinate triple of `points`.
    ///
    /// Identifiers, types, radii and parents come from `attributes` when the
    /// respective array has one entry per point; otherwise defaults are used
    /// (`index + 1`, [`DEFAULT_TYPE_ID`], [`DEFAULT_RADIUS`], root parent).
    pub fn write_points<T: SwcComponent>(&mut self, points: &[T], attributes: &MorphologyBuffers) -> Result<usize> {
        if points.len() % POINT_DIMENSION != 0 {
            return Err(Error::precondition(format!(
                "point buffer length {} is not a multiple of {}",
                points.len(),
                POINT_DIMENSION
            )));
        }
        let count = points.len() / POINT_DIMENSION;

        let sample_ids = channel(attributes.sample_identifiers(), count, "sample identifiers");
        let type_ids = channel(attributes.type_identifiers(), count, "type identifiers");
        let radii = channel(attributes.radii(), count, "radii");
        let parent_ids = channel(attributes.parent_identifiers(), count, "parent identifiers");

        for (i, xyz) in points.chunks_exact(POINT_DIMENSION).enumerate() {
            let sample_id = sample_ids.map_or(i as i64 + 1, |v| v[i]);
            let type_id = type_ids.map_or(DEFAULT_TYPE_ID, |v| v[i]);
            let radius = radii.map_or(DEFAULT_RADIUS, |v| v[i]);
            let parent_id = parent_ids.map_or(ROOT_PARENT, |v| v[i]);
            writeln!(
                self.out,
                "{} {} {} {} {} {} {}",
                sample_id, type_id, xyz[0], xyz[1], xyz[2], radius, parent_id
            )?;
        }

        self.points_written += count;
        debug!(points = count, component = %T::COMPONENT, "wrote points");
        Ok(count)
    }

    /// Write a raw point buffer whose elements are of kind `component`.
    pub fn write_points_raw(
        &mut self,
        bytes: &[u8],
        component: ComponentType,
        attributes: &MorphologyBuffers,
    ) -> Result<usize> {
        dispatch_component!(component, T => {
            let points = cast_components::<T>(bytes)?;
            self.write_points(&points[..], attributes)
        }, else Err(Error::UnsupportedType(component)))
    }

    /// Write a `[kind, k, v_0 .. v_{k-1}]` cell buffer as a sign-terminated
    /// stream, one cell per line.
    ///
    /// The whole buffer is validated before anything is written.
    pub fn write_cells<T: SwcIndex>(&mut self, cells: &[T]) -> Result<usize> {
        let mut encoded = Vec::new();
        for record in cell_records(cells) {
            let (_, vertices) = record?;
            if vertices.is_empty() {
                return Err(Error::precondition(format!("cell {} has no points", encoded.len())));
            }
            let line = vertices
                .iter()
                .map(|v| {
                    v.to_index()
                        .filter(|&i| i <= u64::from(u32::MAX))
                        .map(|i| i as i64 + 1)
                        .ok_or_else(|| Error::precondition(format!("invalid point index {} in cell {}", v, encoded.len())))
                })
                .collect::<Result<Vec<i64>>>()?;
            encoded.push(line);
        }

        if encoded.is_empty() {
            return Ok(0);
        }

        writeln!(self.out, "{} {}", CELLS_MARKER, encoded.len())?;
        for references in &encoded {
            let (last, rest) = references.split_last().ok_or_else(|| Error::precondition("empty cell"))?;
            for reference in rest {
                write!(self.out, "{} ", reference)?;
            }
            writeln!(self.out, "{}", -last)?;
        }

        self.cells_written += encoded.len();
        debug!(cells = encoded.len(), component = %T::COMPONENT, "wrote cells");
        Ok(encoded.len())
    }

    /// Write a raw cell buffer whose elements are of integer kind `component`.
    pub fn write_cells_raw(&mut self, bytes: &[u8], component: ComponentType) -> Result<usize> {
        dispatch_index!(component, T => {
            let cells = cast_components::<T>(bytes)?;
            self.write_cells(&cells[..])
        }, else Err(Error::UnsupportedType(component)))
    }

    /// Point data is carried by the records; nothing else is written.
    pub fn write_point_data(&mut self, _bytes: &[u8]) -> Result<()> {
        trace!("point data writing is a no-op for SWC");
        Ok(())
    }

    /// The format has no cell data.
    pub fn write_cell_data(&mut self, _bytes: &[u8]) -> Result<()> {
        trace!("cell data writing is a no-op for SWC");
        Ok(())
    }

    /// Flush buffered output.
    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    /// Flush and return the destination.
    pub fn into_inner(mut self) -> Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

/// Attribute array usable for `count` points, `None` when it must be defaulted.
fn channel<'a, T>(values: &'a [T], count: usize, name: &str) -> Option<&'a [T]> {
    if values.len() == count {
        return Some(values);
    }
    if !values.is_empty() {
        warn!(name, len = values.len(), points = count, "attribute length differs from point count, using defaults");
    }
    None
}

/// Reinterpret raw bytes as components, copying only if misaligned.
fn cast_components<T: SwcComponent>(bytes: &[u8]) -> Result<Cow<'_, [T]>> {
    if bytes.len() % T::SIZE != 0 {
        return Err(Error::precondition(format!(
            "{} bytes is not a whole number of {} components",
            bytes.len(),
            T::COMPONENT
        )));
    }
    match bytemuck::try_cast_slice(bytes) {
        Ok(slice) => Ok(Cow::Borrowed(slice)),
        Err(_) => Ok(Cow::Owned(bytemuck::pod_collect_to_vec(bytes))),
    }
}
