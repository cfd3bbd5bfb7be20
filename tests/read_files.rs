//! Integration tests for reading SWC files from disk.

use std::io::Write;

use swc_mesh_io::prelude::*;
use tempfile::NamedTempFile;

const EXAMPLE: &str = "# test morphology
1 1 0.0 0.0 0.0 1.0 -1
2 3 1.0 0.0 0.0 1.0 1
3 3 2.0 0.0 0.0 1.0 2
";

const WITH_CELLS: &str = "# two branches
1 1 0 0 0 2.5 -1
2 3 1 0 0 0.5 1
3 3 2 0 0 0.5 2
4 3 0 1 0 0.5 1
5 3 0 2 0 0.5 4
CELLS 3
1 2 -3
1 4 -5
2 3 4 -5
";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn swc_file(content: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".swc")
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(content.as_bytes()).expect("Failed to write temp file");
    file.flush().expect("Failed to flush temp file");
    file
}

#[test]
fn test_scan_example_file() {
    init_tracing();
    let file = swc_file(EXAMPLE);
    let mut io = SwcMeshIo::open(file.path());
    let info = io.read_mesh_information().expect("Failed to scan").clone();

    assert_eq!(info.number_of_points, 3);
    assert_eq!(info.number_of_cells, 2);
    assert_eq!(info.cell_buffer_size, 8);
    assert!(info.cell_stream.is_none());
    assert_eq!(io.header_content(), &[" test morphology".to_string()]);
    assert_eq!(io.buffers().parent_identifiers(), &[-1, 1, 2]);

    let mut points = vec![0.0; 3 * info.number_of_points];
    io.read_points(&mut points).expect("Failed to read points");
    assert_eq!(points, vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 2.0, 0.0, 0.0]);
}

#[test]
fn test_missing_file() {
    let mut io = SwcMeshIo::open("no/such/dir/neuron.swc");
    assert!(matches!(io.read_mesh_information(), Err(Error::FileNotFound(_))));
    assert!(io.info().is_none());
}

#[test]
fn test_malformed_file() {
    let file = swc_file("# header\n1 1 0 0 0 1 -1\n2 1 0 zero 0 1 1\n");
    let mut io = SwcMeshIo::open(file.path());
    match io.read_mesh_information() {
        Err(Error::Format { line, message }) => {
            assert_eq!(line, 3);
            assert!(message.contains("zero"));
        }
        other => panic!("expected format error, got {:?}", other),
    }
    assert_eq!(io.state(), ReadState::Unopened);
}

#[test]
fn test_read_cell_section() {
    init_tracing();
    let file = swc_file(WITH_CELLS);
    let mut io = SwcMeshIo::open(file.path());
    let info = io.read_mesh_information().expect("Failed to scan").clone();

    // parent-derived count and stream count are reported separately
    assert_eq!(info.number_of_points, 5);
    assert_eq!(info.number_of_cells, 4);
    assert_eq!(info.stream_cell_count(), 3);
    let section = info.cell_stream.expect("CELLS section");

    let window = CellWindow::all(3).unwrap();
    let len = io.cell_window_len(section.offset, window).expect("Failed to measure");
    assert_eq!(len, 3 + 2 + 3 + 2 + 4 + 2);
    let mut cells = vec![0u32; len];
    io.read_cell_section(window, &mut cells).expect("Failed to read cells");
    assert_eq!(cells, vec![4, 3, 0, 1, 2, 4, 3, 0, 3, 4, 4, 4, 1, 2, 3, 4]);
    assert_eq!(io.state(), ReadState::CellsRead);
}

#[test]
fn test_windows_are_independent() {
    let file = swc_file(WITH_CELLS);
    let mut io = SwcMeshIo::open(file.path());
    let offset = io.read_mesh_information().unwrap().cell_stream.unwrap().offset;

    // read the last window first, then the first, with and without mmap
    let mut last = vec![0u32; 6];
    io.read_cells(offset, CellWindow::from_one_based(3, 3).unwrap(), &mut last).unwrap();
    assert_eq!(last, vec![4, 4, 1, 2, 3, 4]);

    io.set_use_mmap(false);
    let mut first = vec![0u32; 5];
    io.read_cells(offset, CellWindow::from_one_based(1, 1).unwrap(), &mut first).unwrap();
    assert_eq!(first, vec![4, 3, 0, 1, 2]);

    let mut other = SwcMeshIo::open(file.path());
    other.read_mesh_information().unwrap();
    let mut middle = vec![0u32; 5];
    other.read_cells(offset, CellWindow::new(1, 1).unwrap(), &mut middle).unwrap();
    assert_eq!(middle, vec![4, 3, 0, 3, 4]);
}

#[test]
fn test_read_cells_errors() {
    let file = swc_file(WITH_CELLS);
    let mut io = SwcMeshIo::open(file.path());
    let mut cells = vec![0u32; 5];
    let window = CellWindow::new(0, 0).unwrap();
    assert!(matches!(io.read_cells(0, window, &mut cells), Err(Error::Precondition(_))));

    let offset = io.read_mesh_information().unwrap().cell_stream.unwrap().offset;
    let mut small = vec![0u32; 4];
    assert!(matches!(io.read_cells(offset, window, &mut small), Err(Error::Precondition(_))));
    assert!(matches!(
        io.read_cells(offset, CellWindow::new(0, 3).unwrap(), &mut cells),
        Err(Error::Precondition(_))
    ));
    assert!(matches!(
        io.read_cells(u64::MAX, window, &mut cells),
        Err(Error::Precondition(_))
    ));
    // record section read as a cell stream hits a non-integer token
    assert!(matches!(io.read_cells(0, window, &mut cells), Err(Error::CellStream { .. })));
}

#[test]
fn test_legacy_stream_without_marker() {
    // no CELLS section: the caller supplies the offset and the parent count applies
    let records = "1 1 0 0 0 1 -1\n2 1 1 0 0 1 1\n";
    let file = swc_file(records);
    let mut io = SwcMeshIo::open(file.path());
    let info = io.read_mesh_information().unwrap().clone();
    assert_eq!(info.stream_cell_count(), 1);

    let source = CellStreamSource::open(file.path()).unwrap();
    assert_eq!(source.size(), records.len() as u64);
    // record tokens are no valid stream: "0" is not a 1-based reference
    let window = CellWindow::all(1).unwrap();
    assert!(source.measure(0, 1, window).is_err());
}
