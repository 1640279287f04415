//! Report payload decoding.
//!
//! The reporting API does not reliably announce the payload encoding, so
//! the content is sniffed: gzip first (the common case), then zip with a
//! single entry, then plain CSV text.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use flate2::read::GzDecoder;
use tracing::{info, warn};

/// One report row, column name -> raw string value
pub type ReportRow = HashMap<String, String>;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("failed to read payload: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to read zip archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("zip archive contained no entries")]
    EmptyArchive,
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// Decode a downloaded report payload into rows, trying gzip, then zip,
/// then plain CSV.
pub fn decode_rows(content: &[u8]) -> Result<Vec<ReportRow>, DecodeError> {
    match gunzip(content) {
        Ok(text) => {
            let rows = parse_csv(&text)?;
            info!("Parsed gzip report with {} rows", rows.len());
            Ok(rows)
        }
        Err(_) => match unzip_first_entry(content) {
            Ok(text) => {
                let rows = parse_csv(&text)?;
                info!("Parsed zip report with {} rows", rows.len());
                Ok(rows)
            }
            Err(zip_err) => {
                warn!(
                    "Report payload is neither gzip nor zip ({}), trying plain text",
                    zip_err
                );
                let text = String::from_utf8(content.to_vec())?;
                let rows = parse_csv(&text)?;
                info!("Parsed plain text report with {} rows", rows.len());
                Ok(rows)
            }
        },
    }
}

fn gunzip(content: &[u8]) -> Result<String, std::io::Error> {
    let mut decoder = GzDecoder::new(content);
    let mut text = String::new();
    decoder.read_to_string(&mut text)?;
    Ok(text)
}

fn unzip_first_entry(content: &[u8]) -> Result<String, DecodeError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(content))?;
    if archive.is_empty() {
        return Err(DecodeError::EmptyArchive);
    }
    let mut entry = archive.by_index(0)?;
    let mut text = String::new();
    entry.read_to_string(&mut text)?;
    Ok(text)
}

fn parse_csv(text: &str) -> Result<Vec<ReportRow>, DecodeError> {
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: ReportRow = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| (header.to_string(), value.to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}
