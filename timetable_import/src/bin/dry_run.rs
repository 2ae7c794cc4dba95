use shared_kernel::date_time::campus_date_time::CampusDateTime;
use std::io;
use timetable_import::config::Settings;
use timetable_import::import_timetable::TimetableImport;
use timetable_import::output::write_rows;
use tracing::Instrument;

/// Runs the whole import and prints the CSV to stdout instead of writing a file.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let root = shared_kernel::tracing::config_telemetry("timetable_dry_run")?;
    start().instrument(root).await
}

async fn start() -> anyhow::Result<()> {
    let settings = Settings::parse()?;
    let rooms = settings.room_mapping_source()?;
    let today = CampusDateTime::now(settings.timetable.timezone).date();

    let summary = TimetableImport::from_settings(&settings)?
        .run(today, rooms.as_ref(), |rows| write_rows(io::stdout().lock(), rows))
        .await?;
    eprintln!(
        "{} rows for {} in {:.2}s",
        summary.rows,
        summary.term.term.label,
        summary.elapsed.as_secs_f64()
    );
    Ok(())
}
