//! SWC morphology codec.
//!
//! SWC is a line oriented text format with one sample point per line:
//!
//! ```text
//! # optional header comments
//! <sample id> <type id> <x> <y> <z> <radius> <parent id>
//! ```
//!
//! A parent identifier of `-1` marks a root. The codec translates a file
//! into flat buffers for a polygonal mesh pipeline and back:
//!
//! - [`RecordScanner`] - header and record scan, point/cell counting
//! - [`MorphologyBuffers`] - point, attribute and header storage
//! - [`decode_cell_window`] - windowed decoding of the connectivity stream
//! - [`SwcWriter`] - text output over buffers of any numeric width
//! - [`SwcMeshIo`] - the facade a pipeline drives

mod buffers;
mod format;
mod mesh_io;
mod record;
mod scanner;
mod topology;
mod writer;

pub use buffers::*;
pub use format::*;
pub use mesh_io::*;
pub use record::*;
pub use scanner::*;
pub use topology::*;
pub use writer::*;
