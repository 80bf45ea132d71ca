use std::fs::OpenOptions;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod controller;
mod domain;
mod facets;
mod filter;
mod inputter;
mod model;
mod record;
mod sort;
mod source;
mod table;
mod ui;

use controller::Controller;
use domain::{TVConfig, TVError};
use filter::FilterState;
use model::{Model, Status};
use source::{DEFAULT_DATA_PATH, JsonFileSource};

/// Browse, filter and sort vehicle codes in the terminal.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// JSON file holding the array of vehicle codes
    #[arg(default_value = DEFAULT_DATA_PATH)]
    path: String,

    /// Rows per page
    #[arg(long, default_value_t = 10)]
    page_size: usize,

    /// Upper bound for the rendered column width
    #[arg(long, default_value_t = 40)]
    max_column_width: usize,

    /// Event poll interval in milliseconds
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,

    /// Where log output goes, the terminal belongs to the table
    #[arg(long, default_value = "vtv.log")]
    log_file: String,

    /// Initial global search
    #[arg(long, default_value = "")]
    global: String,

    /// Initial organization filter
    #[arg(long, default_value = "")]
    organization: String,

    /// Initial department filter
    #[arg(long, default_value = "")]
    department: String,

    /// Initial counterparty filter
    #[arg(long, default_value = "")]
    contragent: String,
}

impl Args {
    fn config(&self) -> TVConfig {
        let filter = FilterState {
            global: self.global.clone(),
            organization: self.organization.clone(),
            department: self.department.clone(),
            contragent: self.contragent.clone(),
        };
        TVConfig::default()
            .with_page_size(self.page_size.max(1))
            .with_max_column_width(self.max_column_width)
            .with_event_poll_time(self.poll_ms)
            .with_initial_filter(filter)
    }
}

fn init_logging(log_file: &str) -> Result<(), TVError> {
    let path = shellexpand::full(log_file)
        .map_err(|e| TVError::LoadingFailed(format!("cannot expand {log_file}: {e}")))?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&*path)?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(Arc::new(file)).with_ansi(false))
        .with(ErrorLayer::default())
        .try_init()
        .map_err(|e| TVError::LoadingFailed(format!("logging setup failed: {e}")))
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = init_logging(&args.log_file) {
        eprintln!("Error: {e}");
        return ExitCode::FAILURE;
    }

    let result = run(&args);
    ratatui::restore();
    match result {
        Err(e) => {
            error!("vtv stopped: {e:?}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn run(args: &Args) -> Result<(), TVError> {
    info!("Starting vtv on {}", args.path);
    let cfg = args.config();
    let source = Arc::new(JsonFileSource::from_user_path(&args.path)?);

    let mut model = Model::init(&cfg, source);
    let controller = Controller::new(&cfg);

    let mut terminal = ratatui::init();
    model.ready();

    while model.status != Status::QUITTING {
        terminal.draw(|f| ui::draw(&model, f))?;

        if let Some(message) = controller.handle_event(&mut model)? {
            model.update(message)?;
        };
    }

    model.dispose();
    Ok(())
}
