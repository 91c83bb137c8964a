//! CSV import into the `elector` table.
//!
//! Reads voter records from a CSV file with a header row and writes them to
//! the SQLite database used by the query server.

use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use csv::ReaderBuilder;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use geodude::store::SqliteStore;
use geodude::Record;

#[derive(Parser, Debug)]
#[command(name = "import")]
#[command(about = "Import voter records from CSV into SQLite")]
struct Args {
    /// CSV file to import (columns: id, first_name, last_name, phone, street_name, city, lat, lon)
    #[arg(short, long)]
    file: PathBuf,

    /// SQLite database URL
    #[arg(long, default_value = "sqlite://data/geodude.db")]
    database: String,

    /// Field delimiter
    #[arg(long, default_value = ",")]
    delimiter: char,

    /// Rows per insert transaction
    #[arg(long, default_value = "5000")]
    batch_size: usize,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct ImportReport {
    read: usize,
    skipped: usize,
}

/// Parse records, skipping rows that fail to deserialize or lack coordinates
fn read_records<R: Read>(reader: R, delimiter: u8) -> Result<(Vec<Record>, ImportReport)> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut records = Vec::new();
    let mut report = ImportReport::default();

    for (line, result) in csv_reader.deserialize::<Record>().enumerate() {
        match result {
            Ok(record) if record.lat.is_finite() && record.lon.is_finite() => {
                records.push(record);
                report.read += 1;
            }
            Ok(record) => {
                warn!("Skipping record {} without valid coordinates", record.id);
                report.skipped += 1;
            }
            Err(e) => {
                // header is line 1
                warn!("Skipping row {}: {}", line + 2, e);
                report.skipped += 1;
            }
        }
    }

    Ok((records, report))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("GeoDude Import");
    info!("File: {}", args.file.display());

    anyhow::ensure!(args.delimiter.is_ascii(), "Delimiter must be an ASCII character");
    anyhow::ensure!(args.batch_size > 0, "Batch size must be positive");

    let file = File::open(&args.file).context("Failed to open CSV file")?;
    let (records, report) = read_records(file, args.delimiter as u8)?;
    info!(
        "Parsed {} records ({} rows skipped)",
        report.read, report.skipped
    );

    let store = SqliteStore::connect(&args.database, false, 1)
        .await
        .context("Failed to open database")?;
    store
        .create_schema()
        .await
        .context("Failed to create schema")?;

    let mut written = 0;
    for batch in records.chunks(args.batch_size) {
        written += store.insert_records(batch).await?;
        info!("Written {}/{} records", written, records.len());
    }

    let total = store.count().await?;
    info!("Import complete: {} records in table", total);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_records() {
        let data = "\
id,first_name,last_name,phone,street_name,city,lat,lon
1,Asaf,Lutz,050-1234567,Arie Shenkar 3,Herzliya,32.1602,34.8097
2, Dana ,Cohen,,Sokolov 1,Herzliya,32.1650,34.8440
";
        let (records, report) = read_records(data.as_bytes(), b',').unwrap();

        assert_eq!(report, ImportReport { read: 2, skipped: 0 });
        assert_eq!(records[0].id, 1);
        assert_eq!(records[0].lat, 32.1602);
        assert_eq!(records[1].first_name.as_deref(), Some("Dana"));
        assert_eq!(records[1].phone, None);
    }

    #[test]
    fn test_bad_rows_skipped() {
        let data = "\
id,first_name,last_name,phone,street_name,city,lat,lon
x,Asaf,Lutz,,,Herzliya,32.1,34.8
3,Asaf,Lutz,,,Herzliya,,34.8
4,Asaf,Lutz,,,Herzliya,NaN,34.8
5,Asaf,Lutz,,,Herzliya,32.1,34.8
";
        let (records, report) = read_records(data.as_bytes(), b',').unwrap();

        assert_eq!(report, ImportReport { read: 1, skipped: 3 });
        assert_eq!(records[0].id, 5);
    }

    #[test]
    fn test_tab_delimited() {
        let data = "id\tfirst_name\tlast_name\tphone\tstreet_name\tcity\tlat\tlon\n\
                    7\tAsaf\tLutz\t\tHerzl\tTel Aviv\t32.08\t34.78\n";
        let (records, _) = read_records(data.as_bytes(), b'\t').unwrap();
        assert_eq!(records[0].city.as_deref(), Some("Tel Aviv"));
    }
}
