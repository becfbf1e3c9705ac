use std::io::{self, Read};

use tabular_ingest::ingestion::RowSource;
use tabular_ingest::ingestion::csv::CsvSource;
use tabular_ingest::types::CellValue;
use tabular_ingest::{ErrorKind, Violation};

fn text(s: &str) -> CellValue {
    CellValue::Text(s.to_string())
}

fn parse(input: &str) -> Result<CsvSource, tabular_ingest::FormatError> {
    CsvSource::from_reader(input.as_bytes(), Some("inline"))
}

#[test]
fn parse_csv_from_path_happy_path() {
    let src = CsvSource::from_path("tests/fixtures/valid.csv", Some("ValidCSV")).unwrap();

    assert_eq!(src.rows().len(), 2);
    assert_eq!(src.rows()[0].get("Name"), Some(&text("Rehber")));
    assert_eq!(
        src.column_order().unwrap(),
        &["Name".to_string(), "Age".to_string(), "Score".to_string()]
    );
    assert_eq!(src.source_name(), "ValidCSV");
}

#[test]
fn single_row_round_trip() {
    let src = parse("Name,Age,Score\nAda,30,99\n").unwrap();

    assert_eq!(src.rows().len(), 1);
    let pairs: Vec<(&str, &CellValue)> = src.rows()[0].iter().collect();
    assert_eq!(
        pairs,
        vec![("Name", &text("Ada")), ("Age", &text("30")), ("Score", &text("99"))]
    );
}

#[test]
fn headers_and_fields_are_trimmed() {
    let src = parse("  Name , Age\n  Ada ,  30  \n").unwrap();
    assert_eq!(src.column_order().unwrap(), &["Name".to_string(), "Age".to_string()]);
    assert_eq!(src.rows()[0].get("Name"), Some(&text("Ada")));
    assert_eq!(src.rows()[0].get("Age"), Some(&text("30")));
}

#[test]
fn source_name_falls_back_to_csv() {
    let src = CsvSource::from_reader("A\n1\n".as_bytes(), None).unwrap();
    assert_eq!(src.source_name(), "CSV");

    let src = CsvSource::from_reader("A\n1\n".as_bytes(), Some("  spaced label ")).unwrap();
    assert_eq!(src.source_name(), "  spaced label ");
}

#[test]
fn byte_order_mark_is_stripped_from_first_header() {
    let src = CsvSource::from_path("tests/fixtures/bom.csv", None).unwrap();
    assert_eq!(src.column_order().unwrap()[0], "Name");
    assert!(src.rows()[0].contains_key("Name"));
}

#[test]
fn international_headers_are_preserved() {
    let src = CsvSource::from_path("tests/fixtures/international_headers.csv", Some("IntlHeaders"))
        .unwrap();
    assert_eq!(
        src.column_order().unwrap(),
        &["名".to_string(), "Ålder".to_string(), "Score".to_string()]
    );
    assert!(src.rows()[0].contains_key("Ålder"));
    assert_eq!(src.rows()[0].get("名"), Some(&text("太郎")));
}

#[test]
fn quoted_fields_keep_delimiters_and_newlines() {
    let src = CsvSource::from_path("tests/fixtures/quoted_commas.csv", Some("Quoted")).unwrap();
    assert_eq!(src.rows().len(), 2);
    assert_eq!(src.rows()[0].get("Name"), Some(&text("Smith, John")));
    assert_eq!(src.rows()[1].get("City"), Some(&text("New\nYork")));
}

#[test]
fn blank_rows_are_skipped() {
    tabular_ingest::logging::init_test();
    let src = CsvSource::from_path("tests/fixtures/blank_rows.csv", None).unwrap();
    assert_eq!(src.rows().len(), 2);
    assert_eq!(src.rows()[0].get("Name"), Some(&text("Ada")));
    assert_eq!(src.rows()[1].get("Name"), Some(&text("Grace")));

    let src = parse("a,b\n1,2\n , \n3,4\n").unwrap();
    assert_eq!(src.rows().len(), 2);
    assert_eq!(src.skipped_rows(), 1);
}

#[test]
fn header_only_input_yields_no_rows() {
    let src = parse("a,b,c\n").unwrap();
    assert_eq!(src.column_order().unwrap().len(), 3);
    assert!(src.rows().is_empty());
}

#[test]
fn empty_input_is_header_missing() {
    let err = parse("").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HeaderMissing);

    let err = CsvSource::from_reader(&b"\xEF\xBB\xBF"[..], None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HeaderMissing);
}

#[test]
fn blank_first_line_is_header_empty() {
    let err = parse("\nName,Age\nAda,30\n").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HeaderEmpty);
    assert_eq!(err.violation(), Some(&Violation::BlankHeader { index: 0 }));

    let err = parse("\n").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HeaderEmpty);

    let err = CsvSource::from_reader(&b"\xEF\xBB\xBF\r\nName\r\n"[..], None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HeaderEmpty);
}

#[test]
fn blank_header_cell_is_header_empty() {
    let err = CsvSource::from_path("tests/fixtures/empty_header.csv", None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HeaderEmpty);
    assert_eq!(err.violation(), Some(&Violation::BlankHeader { index: 1 }));

    let err = parse("   \n1\n").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HeaderEmpty);
}

#[test]
fn duplicate_header_fails_regardless_of_rows() {
    let err = parse("A,B,A\n").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HeaderDuplicate);

    let err = parse("A,B,A\n1,2,3\n4,5\n").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HeaderDuplicate);

    let err = CsvSource::from_path("tests/fixtures/duplicate_headers.csv", None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HeaderDuplicate);
}

#[test]
fn headers_equal_after_trimming_are_duplicates() {
    let err = parse("Name, Name \n1,2\n").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::HeaderDuplicate);
    assert_eq!(
        err.violation(),
        Some(&Violation::DuplicateHeader {
            index: 1,
            header: "Name".to_string()
        })
    );
}

#[test]
fn duplicate_check_is_case_sensitive() {
    let src = parse("name,Name\n1,2\n").unwrap();
    assert_eq!(src.column_order().unwrap().len(), 2);
}

#[test]
fn short_row_is_column_mismatch_with_line_number() {
    tabular_ingest::logging::init_test();
    let err = CsvSource::from_path("tests/fixtures/mismatched_row.csv", None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RowColumnMismatch);
    assert_eq!(
        err.violation(),
        Some(&Violation::RowWidth {
            line: 3,
            expected: 3,
            actual: 2
        })
    );
    assert!(err.to_string().contains("line 3 has 2 columns, expected 3"));
}

#[test]
fn long_row_on_first_data_line_reports_line_two() {
    let err = parse("a,b\n1,2,3\n").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RowColumnMismatch);
    assert_eq!(
        err.violation(),
        Some(&Violation::RowWidth {
            line: 2,
            expected: 2,
            actual: 3
        })
    );
}

#[test]
fn blank_lines_still_advance_the_line_counter() {
    let err = parse("a,b\n1,2\n , \n3\n").unwrap_err();
    assert_eq!(
        err.violation(),
        Some(&Violation::RowWidth {
            line: 4,
            expected: 2,
            actual: 1
        })
    );
}

#[test]
fn multi_line_field_lines_count_toward_row_line() {
    let err = parse("a,b\n\"x\ny\",1\n2\n").unwrap_err();
    assert_eq!(
        err.violation(),
        Some(&Violation::RowWidth {
            line: 4,
            expected: 2,
            actual: 1
        })
    );
}

#[test]
fn unterminated_quote_is_parse_error() {
    let err = CsvSource::from_path("tests/fixtures/malformed.csv", Some("MalformedCSV")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CsvParse);
    assert_eq!(err.violation(), Some(&Violation::UnterminatedQuote { line: 2 }));
}

#[test]
fn invalid_utf8_is_parse_error() {
    let err = CsvSource::from_reader(&b"Name\n\xFF\xFE\n"[..], None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CsvParse);
    assert!(err.cause().is_some());
}

struct FailingReader;

impl Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "stream closed"))
    }
}

#[test]
fn stream_failure_is_io_error() {
    let err = CsvSource::from_reader(FailingReader, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CsvIo);
    assert_eq!(err.classification().status_code(), 422);
    assert!(err.to_string().contains("stream closed"));
}

#[test]
fn missing_file_is_io_error() {
    let err = CsvSource::from_path("tests/fixtures/does_not_exist.csv", None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CsvIo);
}

#[test]
fn rows_only_ever_hold_text() {
    let src = parse("n,b,d\n1.5,true,2024-01-01\n").unwrap();
    assert!(
        src.rows()[0]
            .values()
            .iter()
            .all(|v| matches!(v, CellValue::Text(_)))
    );
}
