//! Windowed decoding of the sign-terminated connectivity stream.
//!
//! ## Stream encoding
//!
//! ```text
//! 1 2 3 -4        cell 0: points 0, 1, 2, 3
//! 4 -5            cell 1: points 3, 4
//! ```
//!
//! Tokens are 1-based point references separated by whitespace. A positive
//! token continues the current cell and refers to point `t - 1`; a negative
//! token `t` closes it and refers to point `-(t + 1)`. Cell boundaries are only
//! known once a terminator is seen, so every read walks the stream from its
//! start and drops the cells outside the requested window.
//!
//! ## Cell buffer layout
//!
//! ```text
//! [kind, k, v_0 .. v_{k-1}] [kind, k, ...] ...
//! ```
//!
//! Each decoded cell takes `2 + k` slots; `kind` is always
//! [`CellGeometry::Polygon`].

use std::borrow::Cow;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

#[cfg(feature = "mmap")]
use memmap2::Mmap;
use tracing::{debug, trace};

use super::format::{CellGeometry, CELL_HEADER_SLOTS};
use crate::util::{Error, Result, SwcIndex};

/// Location and size of a connectivity section inside a source.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellStreamInfo {
    /// Byte offset of the first stream token.
    pub offset: u64,
    /// Number of cells the stream holds.
    pub number_of_cells: usize,
}

/// Inclusive range of 0-based cell ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellWindow {
    first: usize,
    last: usize,
}

impl CellWindow {
    /// Window over 0-based ids `first..=last`.
    pub fn new(first: usize, last: usize) -> Result<Self> {
        if first > last {
            return Err(Error::precondition(format!(
                "cell window starts after it ends: [{}, {}]",
                first, last
            )));
        }
        Ok(Self { first, last })
    }

    /// Window over the pipeline's 1-based ids `first..=last`.
    pub fn from_one_based(first: usize, last: usize) -> Result<Self> {
        if first == 0 || last == 0 {
            return Err(Error::precondition("1-based cell ids start at 1"));
        }
        Self::new(first - 1, last - 1)
    }

    /// Window covering all `cell_count` cells, `None` when there are none.
    pub fn all(cell_count: usize) -> Option<Self> {
        cell_count.checked_sub(1).map(|last| Self { first: 0, last })
    }

    /// First 0-based cell id.
    #[inline]
    pub fn first(&self) -> usize {
        self.first
    }

    /// Last 0-based cell id (inclusive).
    #[inline]
    pub fn last(&self) -> usize {
        self.last
    }

    /// Number of cells in the window.
    #[inline]
    pub fn len(&self) -> usize {
        (self.last - self.first).saturating_add(1)
    }

    /// Always false, a window holds at least one cell.
    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Returns true if cell `id` is inside the window.
    #[inline]
    pub fn contains(&self, id: usize) -> bool {
        id >= self.first && id <= self.last
    }

    fn check(&self, cell_count: usize) -> Result<()> {
        if self.last >= cell_count {
            return Err(Error::precondition(format!(
                "cell window [{}, {}] outside of {} cells",
                self.first, self.last, cell_count
            )));
        }
        Ok(())
    }
}

/// One decoded stream token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Reference {
    /// Vertex that continues the current cell.
    Continue(u32),
    /// Vertex that closes the current cell.
    Last(u32),
}

/// Whitespace tokenizer over stream bytes, tracking source offsets.
struct Tokens<'a> {
    bytes: &'a [u8],
    pos: usize,
    base: u64,
}

impl<'a> Tokens<'a> {
    fn new(bytes: &'a [u8], base: u64) -> Self {
        Self { bytes, pos: 0, base }
    }

    fn next_token(&mut self) -> Option<(u64, &'a [u8])> {
        while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        if self.pos == self.bytes.len() {
            return None;
        }
        let start = self.pos;
        while self.pos < self.bytes.len() && !self.bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        Some((self.base + start as u64, &self.bytes[start..self.pos]))
    }

    /// Next point reference, converted to a 0-based index.
    fn next_reference(&mut self) -> Result<Option<Reference>> {
        let Some((offset, token)) = self.next_token() else {
            return Ok(None);
        };
        let value: i64 = std::str::from_utf8(token)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| {
                Error::cell_stream(offset, format!("invalid point reference '{}'", String::from_utf8_lossy(token)))
            })?;

        let (index, last) = if value > 0 {
            (value - 1, false)
        } else if value < 0 {
            (-(value + 1), true)
        } else {
            return Err(Error::cell_stream(offset, "point reference 0 (references are 1-based)"));
        };
        let index = u32::try_from(index)
            .map_err(|_| Error::cell_stream(offset, format!("point reference {} exceeds u32", value)))?;
        Ok(Some(if last { Reference::Last(index) } else { Reference::Continue(index) }))
    }
}

fn truncated(tokens: &Tokens<'_>, id: usize, cell_count: usize) -> Error {
    Error::cell_stream(
        tokens.base + tokens.pos as u64,
        format!("stream ended after {} of {} cells", id, cell_count),
    )
}

/// Decode the cells of `window` from a stream holding `cell_count` cells.
///
/// `stream` starts at the first token; `out` must be sized exactly to the
/// window's cells (see [`measure_cell_window`]). Returns the number of slots
/// written, which is `out.len()` on success.
pub fn decode_cell_window(stream: &[u8], cell_count: usize, window: CellWindow, out: &mut [u32]) -> Result<usize> {
    decode_at(stream, 0, cell_count, window, out)
}

fn decode_at(stream: &[u8], base: u64, cell_count: usize, window: CellWindow, out: &mut [u32]) -> Result<usize> {
    window.check(cell_count)?;

    let mut tokens = Tokens::new(stream, base);
    let mut id = 0usize;
    let mut index = CELL_HEADER_SLOTS;
    let mut num_points = 0usize;

    let capacity = out.len();
    let too_small = |needed: usize| {
        Error::precondition(format!("cell buffer of {} slots too small, need more than {}", capacity, needed))
    };

    while id < cell_count {
        let Some(reference) = tokens.next_reference()? else {
            return Err(truncated(&tokens, id, cell_count));
        };
        let in_window = window.contains(id);
        match reference {
            Reference::Continue(point) => {
                if in_window {
                    *out.get_mut(index).ok_or_else(|| too_small(index))? = point;
                    index += 1;
                    num_points += 1;
                }
            }
            Reference::Last(point) => {
                if in_window {
                    *out.get_mut(index).ok_or_else(|| too_small(index))? = point;
                    index += 1;
                    num_points += 1;
                    out[index - num_points - 2] = CellGeometry::Polygon.code();
                    out[index - num_points - 1] = num_points as u32;
                    trace!(cell = id, points = num_points, "decoded cell");
                    num_points = 0;
                    index += CELL_HEADER_SLOTS;
                }
                id += 1;
            }
        }
        if id > window.last() {
            // cells past the window cannot contribute
            break;
        }
    }

    let written = index - CELL_HEADER_SLOTS;
    if written != out.len() {
        return Err(Error::precondition(format!(
            "cell buffer has {} slots, window [{}, {}] fills {}",
            out.len(),
            window.first(),
            window.last(),
            written
        )));
    }
    Ok(written)
}

/// Number of cell buffer slots the cells of `window` occupy.
pub fn measure_cell_window(stream: &[u8], cell_count: usize, window: CellWindow) -> Result<usize> {
    measure_at(stream, 0, cell_count, window)
}

fn measure_at(stream: &[u8], base: u64, cell_count: usize, window: CellWindow) -> Result<usize> {
    window.check(cell_count)?;

    let mut tokens = Tokens::new(stream, base);
    let mut id = 0usize;
    let mut slots = 0usize;
    while id <= window.last() {
        let Some(reference) = tokens.next_reference()? else {
            return Err(truncated(&tokens, id, cell_count));
        };
        let in_window = window.contains(id);
        if in_window {
            slots += 1;
        }
        if let Reference::Last(_) = reference {
            if in_window {
                slots += CELL_HEADER_SLOTS;
            }
            id += 1;
        }
    }
    Ok(slots)
}

/// Iterator over the cells of a cell buffer: `(kind, vertices)` pairs.
pub struct CellRecords<'a, T> {
    buffer: &'a [T],
    pos: usize,
}

/// Walk a `[kind, k, v_0 .. v_{k-1}]` cell buffer of any integer width.
pub fn cell_records<T: SwcIndex>(buffer: &[T]) -> CellRecords<'_, T> {
    CellRecords { buffer, pos: 0 }
}

impl<'a, T: SwcIndex> Iterator for CellRecords<'a, T> {
    type Item = Result<(T, &'a [T])>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.buffer.len() {
            return None;
        }
        let start = self.pos;
        let buffer = self.buffer;
        let rest = &buffer[start..];
        let item = match rest {
            [kind, count, tail @ ..] => match count.to_index().and_then(|k| usize::try_from(k).ok()) {
                Some(k) if k <= tail.len() => {
                    self.pos += CELL_HEADER_SLOTS + k;
                    Ok((*kind, &tail[..k]))
                }
                _ => Err(Error::precondition(format!(
                    "cell at slot {} declares {} points, {} slots remain",
                    start,
                    count,
                    tail.len()
                ))),
            },
            _ => Err(Error::precondition(format!("truncated cell header at slot {}", start))),
        };
        if item.is_err() {
            self.pos = self.buffer.len();
        }
        Some(item)
    }
}

/// Random access to a file's bytes for windowed cell reads.
///
/// Every read starts again from the given offset, so reads are independent
/// of each other and of any scan.
pub struct CellStreamSource {
    inner: SourceInner,
    size: u64,
}

enum SourceInner {
    /// Memory-mapped file (preferred)
    #[cfg(feature = "mmap")]
    Mmap(Mmap),
    /// Plain file access (fallback, and for empty files)
    File(File),
}

impl CellStreamSource {
    /// Open a file, memory mapping it when the `mmap` feature is enabled.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_opts(path, true)
    }

    /// Open a file with optional memory mapping.
    pub fn open_opts(path: impl AsRef<Path>, use_mmap: bool) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::FileNotFound(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;
        let size = file.metadata()?.len();

        #[cfg(feature = "mmap")]
        let inner = if use_mmap && size > 0 {
            // Safety: the file is opened read-only; callers must not write the
            // same file while a source is alive.
            let mmap = unsafe { Mmap::map(&file) }.map_err(|e| Error::MmapFailed(e.to_string()))?;
            SourceInner::Mmap(mmap)
        } else {
            SourceInner::File(file)
        };
        #[cfg(not(feature = "mmap"))]
        let inner = {
            let _ = use_mmap;
            SourceInner::File(file)
        };

        Ok(Self { inner, size })
    }

    /// Total file size.
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Bytes from `offset` to the end of the file.
    pub fn stream_bytes(&self, offset: u64) -> Result<Cow<'_, [u8]>> {
        if offset > self.size {
            return Err(Error::precondition(format!(
                "cell stream offset {} beyond end of file ({} bytes)",
                offset, self.size
            )));
        }
        match &self.inner {
            #[cfg(feature = "mmap")]
            SourceInner::Mmap(mmap) => Ok(Cow::Borrowed(&mmap[offset as usize..])),
            SourceInner::File(file) => {
                let mut f = file;
                f.seek(SeekFrom::Start(offset))?;
                let mut buf = Vec::with_capacity((self.size - offset) as usize);
                f.read_to_end(&mut buf)?;
                Ok(Cow::Owned(buf))
            }
        }
    }

    /// Decode a window of the stream starting at `offset`.
    pub fn decode(&self, offset: u64, cell_count: usize, window: CellWindow, out: &mut [u32]) -> Result<usize> {
        let bytes = self.stream_bytes(offset)?;
        let written = decode_at(&bytes, offset, cell_count, window, out)?;
        debug!(offset, first = window.first(), last = window.last(), slots = written, "read cell window");
        Ok(written)
    }

    /// Slot count of a window of the stream starting at `offset`.
    pub fn measure(&self, offset: u64, cell_count: usize, window: CellWindow) -> Result<usize> {
        let bytes = self.stream_bytes(offset)?;
        measure_at(&bytes, offset, cell_count, window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const POLY: u32 = 4;

    fn decode_all(stream: &str, cells: usize) -> Vec<u32> {
        let window = CellWindow::all(cells).unwrap();
        let len = measure_cell_window(stream.as_bytes(), cells, window).unwrap();
        let mut out = vec![0u32; len];
        decode_cell_window(stream.as_bytes(), cells, window, &mut out).unwrap();
        out
    }

    #[test]
    fn test_decode_full_stream() {
        let out = decode_all("1 2 3 -4\n4 -5\n", 2);
        assert_eq!(out, vec![POLY, 4, 0, 1, 2, 3, POLY, 2, 3, 4]);
    }

    #[test]
    fn test_single_vertex_cell() {
        let out = decode_all("-1 -3", 2);
        assert_eq!(out, vec![POLY, 1, 0, POLY, 1, 2]);
    }

    #[test]
    fn test_window_skips_outside_cells() {
        let stream = b"1 -2 2 -3 3 4 -5";
        let window = CellWindow::new(1, 1).unwrap();
        assert_eq!(measure_cell_window(stream, 3, window).unwrap(), 4);
        let mut out = [0u32; 4];
        decode_cell_window(stream, 3, window, &mut out).unwrap();
        assert_eq!(out, [POLY, 2, 1, 2]);

        let window = CellWindow::new(2, 2).unwrap();
        let mut out = [0u32; 5];
        decode_cell_window(stream, 3, window, &mut out).unwrap();
        assert_eq!(out, [POLY, 3, 2, 3, 4]);
    }

    #[test]
    fn test_stops_at_cell_count() {
        // trailing tokens past the counted cells are never read
        let out = decode_all("1 -2 garbage", 1);
        assert_eq!(out, vec![POLY, 2, 0, 1]);
    }

    #[test]
    fn test_one_based_window() {
        let w = CellWindow::from_one_based(1, 3).unwrap();
        assert_eq!((w.first(), w.last(), w.len()), (0, 2, 3));
        assert!(CellWindow::from_one_based(0, 3).is_err());
        assert!(CellWindow::new(3, 2).is_err());
        assert!(CellWindow::all(0).is_none());
    }

    #[test]
    fn test_window_len_saturates() {
        let w = CellWindow::new(0, usize::MAX).unwrap();
        assert_eq!(w.len(), usize::MAX);
        assert!(w.contains(usize::MAX));
        assert_eq!(CellWindow::new(5, 5).unwrap().len(), 1);
    }

    #[test]
    fn test_window_outside_stream() {
        let mut out = [0u32; 4];
        let err = decode_cell_window(b"1 -2", 1, CellWindow::new(0, 1).unwrap(), &mut out).unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
    }

    #[test]
    fn test_mis_sized_buffer() {
        let window = CellWindow::all(1).unwrap();
        let mut small = [0u32; 3];
        assert!(matches!(
            decode_cell_window(b"1 2 -3", 1, window, &mut small),
            Err(Error::Precondition(_))
        ));
        let mut large = [0u32; 6];
        assert!(matches!(
            decode_cell_window(b"1 2 -3", 1, window, &mut large),
            Err(Error::Precondition(_))
        ));
    }

    #[test]
    fn test_bad_tokens() {
        let window = CellWindow::all(1).unwrap();
        let mut out = [0u32; 4];
        match decode_cell_window(b"1 x -2", 1, window, &mut out) {
            Err(Error::CellStream { offset, .. }) => assert_eq!(offset, 2),
            other => panic!("unexpected: {:?}", other),
        }
        assert!(decode_cell_window(b"0 -2", 1, window, &mut out).is_err());
        // ends before the counted cell is closed
        assert!(matches!(
            decode_cell_window(b"1 2", 1, window, &mut out),
            Err(Error::CellStream { .. })
        ));
    }

    #[test]
    fn test_cell_records() {
        let buffer: [i32; 7] = [4, 2, 0, 1, 4, 1, 5];
        let cells: Vec<_> = cell_records(&buffer).collect::<Result<_>>().unwrap();
        assert_eq!(cells, vec![(4, &[0, 1][..]), (4, &[5][..])]);

        let ragged: [u16; 4] = [4, 3, 0, 1];
        let mut it = cell_records(&ragged);
        assert!(it.next().unwrap().is_err());
        assert!(it.next().is_none());

        let negative: [i64; 3] = [4, -1, 0];
        assert!(cell_records(&negative).next().unwrap().is_err());
    }
}
