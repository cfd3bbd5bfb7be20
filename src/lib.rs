//! # SWC mesh IO
//!
//! Reader and writer for the SWC neuron morphology format, exchanging flat
//! point, cell and attribute buffers with a generic polygonal mesh pipeline.
//!
//! ## Modules
//!
//! - [`util`] - Numeric component kinds, errors
//! - [`swc`] - Record scanner, cell stream decoder, writer and IO facade
//!
//! ## Example
//!
//! ```ignore
//! use swc_mesh_io::prelude::*;
//!
//! let mut io = SwcMeshIo::open("neuron.swc");
//! let info = io.read_mesh_information()?.clone();
//! let mut points = vec![0.0; 3 * info.number_of_points];
//! io.read_points(&mut points)?;
//!
//! if let (Some(section), Some(window)) = (info.cell_stream, CellWindow::all(info.stream_cell_count())) {
//!     let mut cells = vec![0u32; io.cell_window_len(section.offset, window)?];
//!     io.read_cells(section.offset, window, &mut cells)?;
//! }
//! ```

pub mod util;
pub mod swc;

// Re-export commonly used types
pub use util::{ComponentType, Error, Result, SwcComponent, SwcIndex};
pub use swc::{CellWindow, MeshInfo, RecordScanner, SwcMeshIo, SwcWriter};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{ComponentType, Error, Result, SwcComponent, SwcIndex, DVec3};
    pub use crate::swc::{
        cell_records, decode_cell_window, measure_cell_window, Attribute, CellStreamInfo, CellStreamSource,
        CellWindow, MeshInfo, MorphologyBuffers, PointData, PointDataContent, ReadState, Record,
        RecordScanner, SwcMeshIo, SwcWriter,
    };
}
