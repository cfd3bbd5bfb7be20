//! Full-file scan: header comments, records and point/cell counts.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use super::buffers::MorphologyBuffers;
use super::format::{CELLS_MARKER, CELL_SIZE_HINT, HEADER_MARKER};
use super::record::Record;
use super::topology::CellStreamInfo;
use crate::util::{Error, Result};

/// Everything a scan discovers about a source.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scan {
    /// Header, points and attributes in record order.
    pub buffers: MorphologyBuffers,
    /// Records seen.
    pub number_of_points: usize,
    /// Records with a parent (one segment cell each).
    pub number_of_cells: usize,
    /// Capacity hint for a cell buffer, `4` slots per counted cell.
    pub cell_buffer_size: usize,
    /// Location of the connectivity section, if the source has one.
    pub cell_stream: Option<CellStreamInfo>,
}

/// Splits a text source into header lines and records.
#[derive(Clone, Copy, Debug, Default)]
pub struct RecordScanner;

impl RecordScanner {
    /// Open and scan a file.
    pub fn scan_file(path: impl AsRef<Path>) -> Result<Scan> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;
        Self::scan(BufReader::new(file))
    }

    /// Scan a text source to exhaustion, or up to the `CELLS` marker line.
    ///
    /// Lines are header lines for as long as they contain a `#`; the text
    /// after the first `#` is kept verbatim, with invalid UTF-8 replaced. The first line without one
    /// starts the data section, where blank lines are skipped and every
    /// other line must be a complete record.
    pub fn scan<R: BufRead>(mut reader: R) -> Result<Scan> {
        let mut scan = Scan::default();
        let mut line = Vec::new();
        let mut offset = 0u64;
        let mut line_no = 0usize;
        let mut in_header = true;

        loop {
            line.clear();
            let read = reader.read_until(b'\n', &mut line)?;
            if read == 0 {
                break;
            }
            line_no += 1;
            offset += read as u64;
            let bytes = strip_line_ending(&line);

            if in_header {
                if let Some(pos) = bytes.iter().position(|&b| b == HEADER_MARKER as u8) {
                    scan.buffers.push_header_line(String::from_utf8_lossy(&bytes[pos + 1..]));
                    continue;
                }
                in_header = false;
            }

            let text = std::str::from_utf8(bytes)
                .map_err(|e| Error::format(line_no, format!("invalid UTF-8 at byte {}", e.valid_up_to())))?;
            let mut tokens = text.split_whitespace();
            match tokens.next() {
                None => continue,
                Some(CELLS_MARKER) => {
                    let number_of_cells = parse_cells_marker(tokens, line_no)?;
                    scan.cell_stream = Some(CellStreamInfo { offset, number_of_cells });
                    break;
                }
                Some(_) => {}
            }

            let record = Record::parse(text, line_no)?;
            if !record.is_root() {
                scan.number_of_cells += 1;
                scan.cell_buffer_size += CELL_SIZE_HINT;
            }
            scan.buffers.push_record(&record);
            scan.number_of_points += 1;
        }

        debug!(
            points = scan.number_of_points,
            cells = scan.number_of_cells,
            header_lines = scan.buffers.header_content().len(),
            cell_stream = ?scan.cell_stream,
            "scanned SWC source"
        );
        Ok(scan)
    }
}

fn strip_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

fn parse_cells_marker<'a>(mut tokens: impl Iterator<Item = &'a str>, line_no: usize) -> Result<usize> {
    let count = tokens
        .next()
        .ok_or_else(|| Error::format(line_no, "CELLS marker without a cell count"))?;
    let count = count
        .parse()
        .map_err(|_| Error::format(line_no, format!("invalid cell count: '{}'", count)))?;
    if let Some(extra) = tokens.next() {
        return Err(Error::format(line_no, format!("unexpected token after cell count: '{}'", extra)));
    }
    Ok(count)
}
