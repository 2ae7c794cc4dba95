use anyhow::Context;
use clap::Parser;
use shared_kernel::date_time::campus_date_time::CampusDateTime;
use std::path::PathBuf;
use std::process::ExitCode;
use timetable_import::config::Settings;
use timetable_import::import_timetable::TimetableImport;
use timetable_import::output::write_csv_atomically;
use tracing::{error, Instrument};

/// Scrapes the class timetable viewer and writes one CSV row per class, room and teacher.
#[derive(Parser, Debug)]
#[command(name = "import_timetable", version, about)]
struct Cli {
    /// Where the CSV is written; replaced atomically.
    #[arg(long)]
    output: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let root = match shared_kernel::tracing::config_telemetry("import_timetable") {
        Ok(root) => root,
        Err(err) => {
            eprintln!("failed to set up logging: {err:#}");
            return ExitCode::FAILURE;
        }
    };

    match start(cli).instrument(root.clone()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            root.in_scope(|| error!("{err:?}"));
            ExitCode::FAILURE
        }
    }
}

async fn start(cli: Cli) -> anyhow::Result<()> {
    let output = std::path::absolute(&cli.output)
        .with_context(|| format!("Failed to resolve {}", cli.output.display()))?;
    let settings = Settings::parse()?;
    let rooms = settings.room_mapping_source()?;
    let today = CampusDateTime::now(settings.timetable.timezone).date();

    let mut import = TimetableImport::from_settings(&settings)?;
    import
        .run(today, rooms.as_ref(), |rows| {
            write_csv_atomically(&output, rows)
        })
        .await?;
    Ok(())
}
