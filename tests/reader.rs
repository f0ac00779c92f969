#![cfg(feature = "alloc")]

use bulkcsv::{Config, ConfigBuilder, Error, Reader};

fn default_config() -> Config {
    ConfigBuilder::new().build().unwrap()
}

#[test]
fn empty_input_yields_no_rows() {
    let mut reader = Reader::from_bytes(b"", default_config()).unwrap();
    assert!(reader.next_row().is_none());
}

#[test]
fn terminator_only_input_yields_no_rows() {
    let mut reader = Reader::from_bytes(b"\r\n\n\r\r\r\n", default_config()).unwrap();
    assert!(reader.next_row().is_none());
}

#[test]
fn basic_row_over_bytes_source() {
    let mut reader = Reader::from_bytes(b"a,b,c\n1,2,3\n", default_config()).unwrap();

    let row = reader.next_row().unwrap().unwrap();
    assert_eq!(row.len(), 3);
    assert_eq!(&*row.get(0).unwrap().bytes(), b"a");
    assert_eq!(&*row.get(1).unwrap().bytes(), b"b");
    assert_eq!(&*row.get(2).unwrap().bytes(), b"c");
    drop(row);

    let row = reader.next_row().unwrap().unwrap();
    assert_eq!(row.as_list(), vec![b"1".to_vec(), b"2".to_vec(), b"3".to_vec()]);
    drop(row);

    assert!(reader.next_row().is_none());
}

#[test]
fn quoted_and_escaped_cells() {
    let mut reader = Reader::from_bytes(
        br#""Hello, world!","Hi ""Quote""",plain
"#,
        default_config(),
    )
    .unwrap();
    let row = reader.next_row().unwrap().unwrap();
    assert_eq!(&*row.get(0).unwrap().bytes(), b"Hello, world!");
    assert_eq!(&*row.get(1).unwrap().bytes(), br#"Hi "Quote""#);
    assert_eq!(&*row.get(2).unwrap().bytes(), b"plain");
}

#[test]
fn cell_near_the_window_boundary() {
    let mut body = vec![b'x'; bulkcsv_window_size() - 4];
    let mut input = Vec::new();
    input.extend_from_slice(b"a,");
    input.append(&mut body);
    input.extend_from_slice(b"\nb,c\n");

    let mut reader = Reader::from_bytes(&input, default_config()).unwrap();
    let row = reader.next_row().unwrap().unwrap();
    assert_eq!(&*row.get(0).unwrap().bytes(), b"a");
    assert_eq!(row.get(1).unwrap().bytes().len(), bulkcsv_window_size() - 4);
    drop(row);
    let row = reader.next_row().unwrap().unwrap();
    assert_eq!(row.as_list(), vec![b"b".to_vec(), b"c".to_vec()]);
}

#[test]
fn header_indexed_access() {
    let config = ConfigBuilder::new().header(true).build().unwrap();
    let mut reader = Reader::from_bytes(b"id,name,score\n1,alice,9\n2,bob,7\n", config).unwrap();

    let row = reader.next_row().unwrap().unwrap();
    assert_eq!(&*row.get_by_name(b"name").unwrap().bytes(), b"alice");
    assert_eq!(&*row.get_by_name(b"score").unwrap().bytes(), b"9");
    let err = row.get_by_name(b"nope").unwrap_err();
    assert!(matches!(err, Error::UnknownColumn(_)));
}

#[test]
fn out_of_range_index_both_directions() {
    let mut reader = Reader::from_bytes(b"a,b\n", default_config()).unwrap();
    let row = reader.next_row().unwrap().unwrap();
    assert!(matches!(row.get(2).unwrap_err(), Error::IndexOutOfRange { .. }));
    assert!(matches!(row.get(-3).unwrap_err(), Error::IndexOutOfRange { .. }));
    assert_eq!(&*row.get(-1).unwrap().bytes(), b"b");
    assert_eq!(&*row.get(-2).unwrap().bytes(), b"a");
}

#[test]
fn reads_from_iterator_source_split_across_chunks() {
    let chunks: Vec<Vec<u8>> = vec![
        b"a,b".to_vec(),
        b",c\n1".to_vec(),
        b",2,3\n".to_vec(),
    ];
    let mut reader = Reader::from_iter(chunks.into_iter(), default_config()).unwrap();
    let row = reader.next_row().unwrap().unwrap();
    assert_eq!(row.as_list(), vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
    drop(row);
    let row = reader.next_row().unwrap().unwrap();
    assert_eq!(row.as_list(), vec![b"1".to_vec(), b"2".to_vec(), b"3".to_vec()]);
}

#[cfg(feature = "mmap")]
#[test]
fn reads_from_memory_mapped_file() {
    use std::io::Write;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"a,b\nc,d\n").unwrap();
    file.flush().unwrap();

    let mut reader = Reader::from_path(file.path(), default_config()).unwrap();
    let row = reader.next_row().unwrap().unwrap();
    assert_eq!(row.as_list(), vec![b"a".to_vec(), b"b".to_vec()]);
    drop(row);
    let row = reader.next_row().unwrap().unwrap();
    assert_eq!(row.as_list(), vec![b"c".to_vec(), b"d".to_vec()]);
    drop(row);
    assert!(reader.next_row().is_none());
}

#[cfg(feature = "mmap")]
#[test]
fn mmap_row_spanning_final_page_boundary() {
    use std::io::Write;

    // A file whose content runs right up to (and past) a 4 KiB page
    // boundary, to exercise the mmap tail-guard fallback near real EOF.
    let page = 4096usize;
    let mut content = alloc::vec![b'x'; page - 2];
    content.push(b'\n');
    content.extend_from_slice(b"y\n");

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&content).unwrap();
    file.flush().unwrap();

    let mut reader = Reader::from_path(file.path(), default_config()).unwrap();
    let row = reader.next_row().unwrap().unwrap();
    assert_eq!(row.get(0).unwrap().bytes().len(), page - 2);
    drop(row);
    let row = reader.next_row().unwrap().unwrap();
    assert_eq!(&*row.get(0).unwrap().bytes(), b"y");
    drop(row);
    assert!(reader.next_row().is_none());
}

#[test]
fn row_too_large_is_reported_and_sticky() {
    let mut input = alloc::vec![b'x'; bulkcsv_window_size()];
    input.push(b'\n');
    let mut reader = Reader::from_bytes(&input, default_config()).unwrap();
    let err = reader.next_row().unwrap().unwrap_err();
    assert!(matches!(err, Error::RowTooLarge { .. }));
    assert!(err.is_fatal());
    let err2 = reader.next_row().unwrap().unwrap_err();
    assert!(matches!(err2, Error::RowTooLarge { .. }));
}

#[test]
fn trailing_row_without_newline_is_flushed_by_default() {
    let mut reader = Reader::from_bytes(b"a,b,c", default_config()).unwrap();
    let row = reader.next_row().unwrap().unwrap();
    assert_eq!(row.as_list(), vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);
    assert!(reader.next_row().is_none());
}

#[test]
fn trailing_delimiter_with_no_newline_yields_empty_last_cell() {
    let mut reader = Reader::from_bytes(b"a,", default_config()).unwrap();
    let row = reader.next_row().unwrap().unwrap();
    assert_eq!(row.as_list(), vec![b"a".to_vec(), b"".to_vec()]);
    drop(row);
    assert!(reader.next_row().is_none());
}

#[test]
fn trailing_cell_near_lane_boundary_is_not_padded() {
    // Regression: a trailing cell ending a few bytes before a 16-byte lane
    // boundary, with no terminator at all, must not have its length
    // inflated by guard-zone zeros past the true end of input.
    for extra in [-1i32, 0, 1, 2] {
        let prefix_len = (16 * 3 + extra).max(0) as usize;
        let mut input = b"a,".to_vec();
        input.extend(std::iter::repeat(b'x').take(prefix_len));
        let mut reader = Reader::from_bytes(&input, default_config()).unwrap();
        let row = reader.next_row().unwrap().unwrap();
        assert_eq!(&*row.get(0).unwrap().bytes(), b"a");
        assert_eq!(row.get(1).unwrap().bytes().len(), prefix_len, "prefix_len={prefix_len}");
        drop(row);
        assert!(reader.next_row().is_none(), "prefix_len={prefix_len}");
    }
}

#[test]
fn trailing_row_without_newline_is_dropped_when_disabled() {
    let config = ConfigBuilder::new().trailing_flush(false).build().unwrap();
    let mut reader = Reader::from_bytes(b"a,b,c", config).unwrap();
    assert!(reader.next_row().is_none());
}

#[test]
fn custom_delimiter_and_disabled_quoting() {
    let config = ConfigBuilder::new().delimiter(b'\t').quote(None).build().unwrap();
    let mut reader = Reader::from_bytes(b"a\t\"b\tc\n", config).unwrap();
    let row = reader.next_row().unwrap().unwrap();
    // With quoting disabled, the quote byte is just another literal byte.
    assert_eq!(row.as_list(), vec![b"a".to_vec(), b"\"b".to_vec(), b"c".to_vec()]);
}

extern crate alloc;

fn bulkcsv_window_size() -> usize {
    // Mirrors the crate's fixed WINDOW constant; kept independent here so a
    // change to it is caught by these tests rather than silently matched.
    64 * 1024
}
