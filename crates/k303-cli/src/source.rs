//! # Report Ingestion
//!
//! Reads K.303 disclosure reports and the exchange fund registry from CSV
//! or XLSX exports. The format is detected from the leading bytes: a `PK`
//! zip signature is read as a workbook (first sheet), anything else as
//! CSV text. CSV text is decoded as UTF-8 when valid, otherwise through
//! the legacy Hebrew code pages Excel exports use (windows-1255, then
//! ISO-8859-8, then windows-1252).
//!
//! Headers are matched by name after trimming (BOM, `\r`, stray
//! whitespace), so column order does not matter.
//!
//! Ingestion is fail-fast for file-level problems: an unreadable file or a
//! missing required column aborts the run. Cell-level problems are left to
//! row normalization, which rejects one row at a time.

use std::borrow::Cow;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use calamine::{Reader, Xlsx};
use encoding_rs::{Encoding, ISO_8859_8, UTF_8, WINDOWS_1252, WINDOWS_1255};
use thiserror::Error;

use k303_core::text::clean_field;
use k303_core::{columns, FundId, FundRegistryEntry, RawDisclosureRow, LEVEL_COUNT};

/// Registry column headers.
pub mod registry_columns {
    pub const EXCHANGE_ID: &str = "מספר בורסה";
    pub const FUND_NAME: &str = "שם קרן בעברית";
    pub const TRUSTEE: &str = "שם נאמן";
    pub const MANAGER: &str = "שם מנהל";
    pub const EXPOSURE_PROFILE: &str = "פרופיל החשיפה";

    pub const REQUIRED: [&str; 3] = [EXCHANGE_ID, FUND_NAME, TRUSTEE];
}

/// Zip local file header signature; every XLSX file starts with it.
const XLSX_MAGIC: &[u8] = b"PK";

/// File-level ingestion failures. Always fatal.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("cannot open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {origin}: {source}")]
    Csv {
        origin: String,
        #[source]
        source: csv::Error,
    },

    #[error("malformed workbook {origin}: {source}")]
    Xlsx {
        origin: String,
        #[source]
        source: calamine::XlsxError,
    },

    #[error("workbook {origin} has no worksheets")]
    EmptyWorkbook { origin: String },

    #[error("{origin} is missing required columns: {}", missing.join(", "))]
    MissingColumns {
        origin: String,
        missing: Vec<String>,
    },
}

/// Header name → column index, names cleaned.
#[derive(Debug)]
struct HeaderMap {
    index: HashMap<String, usize>,
}

impl HeaderMap {
    fn new(headers: &csv::StringRecord) -> Self {
        let mut index = HashMap::new();
        for (pos, name) in headers.iter().enumerate() {
            index.entry(clean_field(name).to_string()).or_insert(pos);
        }
        Self { index }
    }

    fn require(&self, origin: &str, required: &[&str]) -> Result<(), IngestError> {
        let missing: Vec<String> = required
            .iter()
            .filter(|c| !self.index.contains_key(**c))
            .map(|c| c.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(IngestError::MissingColumns {
                origin: origin.to_string(),
                missing,
            })
        }
    }

    fn cell(&self, record: &csv::StringRecord, column: &str) -> String {
        self.index
            .get(column)
            .and_then(|&pos| record.get(pos))
            .unwrap_or_default()
            .to_string()
    }
}

/// Header row plus data records keyed by 1-based source line.
type Table = (HeaderMap, Vec<(usize, csv::StringRecord)>);

fn is_blank(record: &csv::StringRecord) -> bool {
    record.iter().all(|cell| clean_field(cell).is_empty())
}

/// Decode CSV bytes: UTF-8 (BOM stripped) when valid, else the first
/// legacy Hebrew encoding that maps every byte.
fn decode_text(bytes: &[u8]) -> (Cow<'_, str>, &'static Encoding) {
    let body = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    if let Ok(text) = std::str::from_utf8(body) {
        return (Cow::Borrowed(text), UTF_8);
    }
    for encoding in [WINDOWS_1255, ISO_8859_8, WINDOWS_1252] {
        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(body) {
            return (text, encoding);
        }
    }
    (WINDOWS_1252.decode_without_bom_handling(body).0, WINDOWS_1252)
}

/// CSV table, skipping records whose cells are all blank.
fn read_csv_table(bytes: &[u8], origin: &str) -> Result<Table, IngestError> {
    let csv_err = |source| IngestError::Csv {
        origin: origin.to_string(),
        source,
    };
    let (text, encoding) = decode_text(bytes);
    tracing::debug!(origin, encoding = encoding.name(), "decoded CSV text");

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers = HeaderMap::new(rdr.headers().map_err(csv_err)?);
    let mut records = Vec::new();
    for (idx, record) in rdr.records().enumerate() {
        let record = record.map_err(csv_err)?;
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 2);
        if is_blank(&record) {
            continue;
        }
        records.push((line, record));
    }
    Ok((headers, records))
}

/// First worksheet of an XLSX workbook. Cells are rendered as text so row
/// normalization sees the same shapes a CSV export carries.
fn read_xlsx_table(bytes: &[u8], origin: &str) -> Result<Table, IngestError> {
    let xlsx_err = |source| IngestError::Xlsx {
        origin: origin.to_string(),
        source,
    };
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).map_err(xlsx_err)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| IngestError::EmptyWorkbook {
            origin: origin.to_string(),
        })?
        .map_err(xlsx_err)?;

    let first_line = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);
    let mut rows = range.rows().enumerate().map(|(offset, cells)| {
        let record: csv::StringRecord = cells
            .iter()
            .map(|cell| cell.to_string())
            .collect::<Vec<String>>()
            .into();
        (first_line + offset, record)
    });

    let headers = match rows.next() {
        Some((_, header)) => HeaderMap::new(&header),
        None => HeaderMap::new(&csv::StringRecord::new()),
    };
    let records = rows.filter(|(_, record)| !is_blank(record)).collect();
    Ok((headers, records))
}

fn read_table(bytes: &[u8], origin: &str) -> Result<Table, IngestError> {
    if bytes.starts_with(XLSX_MAGIC) {
        tracing::info!(origin, "detected XLSX workbook");
        read_xlsx_table(bytes, origin)
    } else {
        read_csv_table(bytes, origin)
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, IngestError> {
    std::fs::read(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse a disclosure report from file contents, CSV or XLSX. `origin`
/// names the source in errors and logs.
pub fn parse_disclosure(bytes: &[u8], origin: &str) -> Result<Vec<RawDisclosureRow>, IngestError> {
    let (headers, records) = read_table(bytes, origin)?;
    headers.require(origin, &columns::REQUIRED)?;

    let rows: Vec<RawDisclosureRow> = records
        .iter()
        .map(|(line, record)| {
            let mut levels: [String; LEVEL_COUNT] = Default::default();
            for (slot, column) in levels.iter_mut().zip(columns::LEVELS) {
                *slot = headers.cell(record, column);
            }
            RawDisclosureRow {
                source_row: *line,
                fund_id: headers.cell(record, columns::FUND_ID),
                fund_name: headers.cell(record, columns::FUND_NAME),
                levels,
                percent_of_fund: headers.cell(record, columns::PERCENT),
                extra_data: headers.cell(record, columns::EXTRA_DATA),
                report_date: headers.cell(record, columns::REPORT_DATE),
                record_index: headers.cell(record, columns::RECORD_INDEX),
                total_records: headers.cell(record, columns::TOTAL_RECORDS),
                manager_registry_no: headers.cell(record, columns::MANAGER_NO),
            }
        })
        .collect();
    tracing::info!(origin, rows = rows.len(), "read disclosure report");
    Ok(rows)
}

/// Read a disclosure report file.
pub fn read_disclosure(path: &Path) -> Result<Vec<RawDisclosureRow>, IngestError> {
    parse_disclosure(&read_file(path)?, &path.display().to_string())
}

/// Parse the fund registry from file contents, CSV or XLSX.
///
/// Rows without an integral exchange id are skipped with a warning;
/// duplicate ids are left for the engine to reject.
pub fn parse_registry(bytes: &[u8], origin: &str) -> Result<Vec<FundRegistryEntry>, IngestError> {
    use registry_columns as col;

    let (headers, records) = read_table(bytes, origin)?;
    headers.require(origin, &col::REQUIRED)?;

    let mut entries = Vec::with_capacity(records.len());
    for (line, record) in &records {
        let raw_id = headers.cell(record, col::EXCHANGE_ID);
        let Ok(exchange_id) = raw_id.parse::<FundId>() else {
            tracing::warn!(origin, row = *line, value = %raw_id, "skipping registry row without exchange id");
            continue;
        };
        let token = headers.cell(record, col::EXPOSURE_PROFILE);
        let token = clean_field(&token);
        entries.push(FundRegistryEntry {
            exchange_id,
            fund_name: clean_field(&headers.cell(record, col::FUND_NAME)).to_string(),
            trustee_name: clean_field(&headers.cell(record, col::TRUSTEE)).to_string(),
            manager_name: clean_field(&headers.cell(record, col::MANAGER)).to_string(),
            exposure_profile_token: (!token.is_empty()).then(|| token.to_string()),
            source_row: *line,
        });
    }
    tracing::info!(origin, funds = entries.len(), "read fund registry");
    Ok(entries)
}

/// Read the fund registry file.
pub fn read_registry(path: &Path) -> Result<Vec<FundRegistryEntry>, IngestError> {
    parse_registry(&read_file(path)?, &path.display().to_string())
}
