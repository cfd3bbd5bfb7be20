//! Property tests for the sign-terminated cell stream and the record scanner.

use proptest::prelude::*;
use proptest::sample::Index;
use swc_mesh_io::prelude::{
    cell_records, decode_cell_window, measure_cell_window, CellWindow, MorphologyBuffers, RecordScanner, SwcWriter,
};

/// Flatten vertex lists into a `[kind, k, v..]` cell buffer.
fn cell_buffer(cells: &[Vec<u32>]) -> Vec<u32> {
    let mut buffer = Vec::new();
    for cell in cells {
        buffer.push(4);
        buffer.push(cell.len() as u32);
        buffer.extend_from_slice(cell);
    }
    buffer
}

/// Encode cells and strip the `CELLS` line, leaving the bare stream.
fn encode(cells: &[Vec<u32>]) -> Vec<u8> {
    let mut writer = SwcWriter::new(Vec::new());
    writer.write_cells(&cell_buffer(cells)).unwrap();
    let text = writer.into_inner().unwrap();
    let stream_start = text.iter().position(|&b| b == b'\n').unwrap() + 1;
    text[stream_start..].to_vec()
}

fn decode(stream: &[u8], cell_count: usize, window: CellWindow) -> Vec<Vec<u32>> {
    let len = measure_cell_window(stream, cell_count, window).unwrap();
    let mut out = vec![0u32; len];
    decode_cell_window(stream, cell_count, window, &mut out).unwrap();
    cell_records(&out)
        .map(|cell| {
            let (kind, vertices) = cell.unwrap();
            assert_eq!(kind, 4);
            vertices.to_vec()
        })
        .collect()
}

fn cells_strategy() -> impl Strategy<Value = Vec<Vec<u32>>> {
    prop::collection::vec(prop::collection::vec(0u32..5000, 1..8), 1..24)
}

proptest! {
    #[test]
    fn sign_encoding_is_invertible(cells in cells_strategy()) {
        let stream = encode(&cells);
        let window = CellWindow::all(cells.len()).unwrap();
        prop_assert_eq!(decode(&stream, cells.len(), window), cells);
    }

    #[test]
    fn windows_partition_the_stream(cells in cells_strategy(), a in any::<Index>(), b in any::<Index>()) {
        let count = cells.len();
        let first = a.index(count);
        let last = first + b.index(count - first);
        let stream = encode(&cells);

        let full = decode(&stream, count, CellWindow::all(count).unwrap());
        let mut pieces = Vec::new();
        if first > 0 {
            pieces.extend(decode(&stream, count, CellWindow::new(0, first - 1).unwrap()));
        }
        pieces.extend(decode(&stream, count, CellWindow::new(first, last).unwrap()));
        if last + 1 < count {
            pieces.extend(decode(&stream, count, CellWindow::new(last + 1, count - 1).unwrap()));
        }
        prop_assert_eq!(&pieces, &full);
        prop_assert_eq!(full, cells);
    }

    #[test]
    fn header_lines_lose_one_marker(lines in prop::collection::vec("[^\\r\\n]{0,24}", 0..6)) {
        let mut text = String::new();
        for line in &lines {
            text.push('#');
            text.push_str(line);
            text.push('\n');
        }
        text.push_str("1 1 0 0 0 1 -1\n");
        let scan = RecordScanner::scan(text.as_bytes()).unwrap();
        prop_assert_eq!(scan.buffers.header_content(), &lines[..]);
    }

    #[test]
    fn non_root_records_count_as_cells(parents in prop::collection::vec(prop_oneof![Just(-1i64), 1i64..100], 0..40)) {
        let mut text = String::new();
        for (i, parent) in parents.iter().enumerate() {
            text.push_str(&format!("{} 3 {} 0.5 -1.25 0.75 {}\n", i + 1, i, parent));
        }
        let scan = RecordScanner::scan(text.as_bytes()).unwrap();
        let non_root = parents.iter().filter(|&&p| p != -1).count();
        prop_assert_eq!(scan.number_of_points, parents.len());
        prop_assert_eq!(scan.number_of_cells, non_root);
        prop_assert_eq!(scan.cell_buffer_size, 4 * non_root);
    }

    #[test]
    fn f64_points_survive_write_and_scan(coords in prop::collection::vec(-1.0e12f64..1.0e12, 1..10)) {
        let mut points = coords.clone();
        while points.len() % 3 != 0 {
            points.push(0.0);
        }
        let mut writer = SwcWriter::new(Vec::new());
        writer.write_points(&points, &MorphologyBuffers::new()).unwrap();
        let text = writer.into_inner().unwrap();
        let scan = RecordScanner::scan(&text[..]).unwrap();
        prop_assert_eq!(scan.buffers.points(), &points[..]);
    }
}
