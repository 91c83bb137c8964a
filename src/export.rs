//! CSV export of lookup results.

use std::io::Write;

use csv::WriterBuilder;

use crate::error::Result;
use crate::models::Record;

pub const EXPORT_FILE_NAME: &str = "query_results.csv";

/// Column order, matching the `elector` table
pub const CSV_HEADERS: [&str; 8] = [
    "id",
    "first_name",
    "last_name",
    "phone",
    "street_name",
    "city",
    "lat",
    "lon",
];

/// Spreadsheet tools need the BOM to detect UTF-8 (Hebrew names)
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Write `records` as UTF-8 CSV with BOM and header row.
pub fn write_csv<W: Write>(mut writer: W, records: &[Record]) -> Result<()> {
    writer.write_all(UTF8_BOM)?;

    let mut csv_writer = WriterBuilder::new().has_headers(false).from_writer(writer);
    csv_writer.write_record(CSV_HEADERS)?;
    for record in records {
        csv_writer.serialize(record)?;
    }
    csv_writer.flush()?;

    Ok(())
}

pub fn to_csv_bytes(records: &[Record]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_csv(&mut buf, records)?;
    Ok(buf)
}
