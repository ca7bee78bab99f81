use anyhow::Context;
use log::{info, warn};
use serde::Deserialize;
use sigmapcore::record::lenient::parse_number;
use sigmapcore::record::NewSignal;
use sigmapcore::Clock;
use std::fs::File;
use std::io::{self, BufRead, Read, Write};
use std::path::Path;
use std::time::Duration;

use crate::workflow::config::ImportDefaults;
use crate::workflow::runner::Runner;

/// One line of a repeater-list export.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "QTH")]
    city: Option<String>,
    #[serde(rename = "Nazwa")]
    description: Option<String>,
    #[serde(rename = "Tx")]
    frequency: Option<String>,
    #[serde(rename = "Latitude")]
    latitude: Option<String>,
    // some exports ship the header misspelled
    #[serde(rename = "Longitude", alias = "Longitute")]
    longitude: Option<String>,
}

#[derive(thiserror::Error, Debug, PartialEq)]
enum RowError {
    #[error("missing column {0}")]
    Missing(&'static str),
    #[error("column {column} is not a number: {value:?}")]
    NotANumber { column: &'static str, value: String },
}

fn required<'a>(value: &'a Option<String>, column: &'static str) -> Result<&'a str, RowError> {
    value
        .as_deref()
        .map(str::trim)
        .ok_or(RowError::Missing(column))
}

fn number(value: &Option<String>, column: &'static str) -> Result<f64, RowError> {
    let text = required(value, column)?;
    parse_number(text).ok_or_else(|| RowError::NotANumber {
        column,
        value: text.to_string(),
    })
}

impl CsvRow {
    fn into_signal(self, defaults: &ImportDefaults, timestamp: i64) -> Result<NewSignal, RowError> {
        Ok(NewSignal {
            frequency: number(&self.frequency, "Tx")?,
            city: required(&self.city, "QTH")?.to_string(),
            description: required(&self.description, "Nazwa")?.to_string(),
            kind: defaults.kind.clone(),
            color: Some(defaults.color.clone()),
            lat: number(&self.latitude, "Latitude")?,
            lon: number(&self.longitude, "Longitude")?,
            radius_km: Some(defaults.radius_km),
            timestamp,
        })
    }
}

/// Rows converted from one file.
#[derive(Debug, Default)]
pub struct ParsedBatch {
    pub signals: Vec<NewSignal>,
    pub skipped: usize,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportReport {
    pub parsed: usize,
    pub skipped: usize,
    pub written: usize,
    pub failed: usize,
    pub aborted: bool,
}

/// Converts every row; malformed rows are logged and skipped.
pub fn read_rows<R: Read>(
    reader: R,
    defaults: &ImportDefaults,
    clock: &dyn Clock,
) -> anyhow::Result<ParsedBatch> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);
    let mut batch = ParsedBatch::default();

    for (index, result) in rdr.deserialize::<CsvRow>().enumerate() {
        let line = index + 2;
        let row = match result {
            Ok(row) => row,
            Err(err) => {
                warn!("line {}: unreadable row: {}", line, err);
                batch.skipped += 1;
                continue;
            }
        };
        let shown = format!("{:?}", row);
        match row.into_signal(defaults, clock.now_millis()) {
            Ok(signal) => batch.signals.push(signal),
            Err(err) => {
                warn!("line {}: skipping {}: {}", line, shown, err);
                batch.skipped += 1;
            }
        }
    }

    Ok(batch)
}

pub fn print_preview<W: Write>(signals: &[NewSignal], out: &mut W) -> io::Result<()> {
    writeln!(out, "=== Preview of converted data ===")?;
    writeln!(
        out,
        "{:>4}  {:>10}  {:<20}  {:<6}  {:>9}  {:>9}  description",
        "#", "MHz", "city", "type", "lat", "lon"
    )?;
    for (index, s) in signals.iter().enumerate() {
        writeln!(
            out,
            "{:>4}  {:>10}  {:<20}  {:<6}  {:>9.4}  {:>9.4}  {}",
            index, s.frequency, s.city, s.kind, s.lat, s.lon, s.description
        )?;
    }
    Ok(())
}

/// Asks for a `y` before anything is written. Anything else aborts.
pub fn confirm<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> io::Result<bool> {
    write!(out, "Do you want to upload this to the store? (y/n): ")?;
    out.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

/// Inserts one record at a time with `pacing` between writes.
pub async fn upload(runner: &Runner, signals: Vec<NewSignal>, pacing: Duration) -> ImportReport {
    let mut report = ImportReport {
        parsed: signals.len(),
        ..Default::default()
    };
    let total = signals.len();

    for (index, signal) in signals.into_iter().enumerate() {
        let label = format!("{} ({})", signal.description, signal.frequency);
        match runner.insert(signal) {
            Ok(id) => {
                report.written += 1;
                info!("uploaded {} as {}", label, id);
            }
            Err(err) => {
                report.failed += 1;
                warn!("upload of {} failed: {}", label, err);
            }
        }
        if index + 1 < total && !pacing.is_zero() {
            tokio::time::sleep(pacing).await;
        }
    }

    report
}

/// Full import: parse, preview, confirm, upload.
pub async fn run<R: BufRead, W: Write>(
    runner: &Runner,
    path: &Path,
    defaults: &ImportDefaults,
    assume_yes: bool,
    input: &mut R,
    out: &mut W,
) -> anyhow::Result<ImportReport> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let batch = read_rows(file, defaults, runner.clock().as_ref())
        .with_context(|| format!("reading {}", path.display()))?;
    print_preview(&batch.signals, out)?;

    let accepted = assume_yes || confirm(input, out).context("reading confirmation")?;
    if !accepted {
        writeln!(out, "Aborted by user.")?;
        return Ok(ImportReport {
            parsed: batch.signals.len(),
            skipped: batch.skipped,
            aborted: true,
            ..Default::default()
        });
    }

    writeln!(out, "Uploading {} signals...", batch.signals.len())?;
    let mut report = upload(runner, batch.signals, defaults.pacing()).await;
    report.skipped = batch.skipped;
    writeln!(
        out,
        "Done: {} written, {} failed, {} skipped.",
        report.written, report.failed, report.skipped
    )?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::config::AppConfig;
    use sigmapcore::ManualClock;
    use std::io::Cursor;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    const EXPORT: &str = "\
QTH,Nazwa,Tx,Latitude,Longitute,Extra
Praha,OK0DMR,439.1625,50.0755,14.4378,x
Brno,OK0BRN,not-a-number,49.1951,16.6068,x
Ostrava,OK0OST,438.600,49.8209,18.2625,x
";

    fn runner() -> Runner {
        Runner::in_memory(AppConfig::default(), Arc::new(ManualClock::new(1_700_000_000_000)))
    }

    fn defaults() -> ImportDefaults {
        ImportDefaults {
            pacing_ms: 0,
            ..Default::default()
        }
    }

    #[test]
    fn rows_map_to_signals_and_bad_rows_are_skipped() {
        let clock = ManualClock::new(42);
        let batch = read_rows(EXPORT.as_bytes(), &defaults(), &clock).unwrap();
        assert_eq!(batch.signals.len(), 2);
        assert_eq!(batch.skipped, 1);

        let praha = &batch.signals[0];
        assert_eq!(praha.city, "Praha");
        assert_eq!(praha.description, "OK0DMR");
        assert_eq!(praha.frequency, 439.1625);
        assert_eq!(praha.lon, 14.4378);
        assert_eq!(praha.kind, "DMR");
        assert_eq!(praha.color.as_deref(), Some("red"));
        assert_eq!(praha.radius_km, Some(20.0));
        assert_eq!(praha.timestamp, 42);
    }

    #[test]
    fn missing_column_skips_every_row() {
        let clock = ManualClock::new(0);
        let csv = "QTH,Tx,Latitude,Longitude\nPraha,439.1,50.0,14.0\n";
        let batch = read_rows(csv.as_bytes(), &defaults(), &clock).unwrap();
        assert!(batch.signals.is_empty());
        assert_eq!(batch.skipped, 1);
    }

    #[test]
    fn only_y_confirms() {
        let mut sink = Vec::new();
        assert!(confirm(&mut Cursor::new("Y\n"), &mut sink).unwrap());
        assert!(!confirm(&mut Cursor::new("yes\n"), &mut sink).unwrap());
        assert!(!confirm(&mut Cursor::new(""), &mut sink).unwrap());
    }

    #[tokio::test]
    async fn declined_import_writes_nothing() {
        let runner = runner();
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(EXPORT.as_bytes()).unwrap();
        let mut out = Vec::new();

        let report = run(
            &runner,
            file.path(),
            &defaults(),
            false,
            &mut Cursor::new("n\n"),
            &mut out,
        )
        .await
        .unwrap();

        assert!(report.aborted);
        assert_eq!(report.written, 0);
        assert!(runner.store().subscribe().borrow().is_empty());
        assert!(String::from_utf8(out).unwrap().contains("Aborted by user."));
    }

    #[tokio::test]
    async fn confirmed_import_writes_each_row() {
        let runner = runner();
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(EXPORT.as_bytes()).unwrap();
        let mut out = Vec::new();

        let report = run(
            &runner,
            file.path(),
            &defaults(),
            false,
            &mut Cursor::new("y\n"),
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(
            report,
            ImportReport {
                parsed: 2,
                skipped: 1,
                written: 2,
                failed: 0,
                aborted: false,
            }
        );
        let snapshot = runner.store().subscribe().borrow().clone();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.signals()[1].city, "Ostrava");
        assert_eq!(runner.metrics().snapshot().inserts, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn uploads_are_paced() {
        let runner = runner();
        let clock = ManualClock::new(0);
        let batch = read_rows(EXPORT.as_bytes(), &defaults(), &clock).unwrap();

        let started = tokio::time::Instant::now();
        let report = upload(&runner, batch.signals, Duration::from_secs(1)).await;
        assert_eq!(report.written, 2);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(1), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(2), "{elapsed:?}");
    }
}
