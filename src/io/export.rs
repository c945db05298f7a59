//! CSV export for batch relay results.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::types::StepResult;

/// Column header for CSV telemetry export.
const HEADER: &str = "time_s,solar_w,mppt_w,pwm_w,mppt_simple,mppt_relay,pwm_simple,pwm_relay";

/// Exports batch results to a CSV file at the given path.
///
/// Relay states are written as `0`/`1`. Produces deterministic output for
/// identical inputs.
///
/// # Arguments
///
/// * `results` - Complete simulation step results
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(results: &[StepResult], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(results, buf)
}

/// Writes batch results as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(results: &[StepResult], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(','))?;

    for r in results {
        wtr.write_record(&[
            format!("{:.4}", r.time_s),
            format!("{:.4}", r.solar_w),
            format!("{:.4}", r.mppt_w),
            format!("{:.4}", r.pwm_w),
            r.mppt_simple.as_u8().to_string(),
            r.mppt_relay.as_u8().to_string(),
            r.pwm_simple.as_u8().to_string(),
            r.pwm_relay.as_u8().to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
