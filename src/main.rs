use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::{Path, PathBuf},
};
use tracing::{info, warn, Level};
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::{fmt::MakeWriter, EnvFilter};

use typespeed::{
    app::App,
    app_dirs::AppDirs,
    clock::{Clock, SystemClock},
    config::{Config, ConfigStore, FileConfigStore},
    controller::SessionController,
    corpus::Corpus,
    runtime::{AppEvent, ChannelEventSource, FixedTicker, Runner},
    session::Difficulty,
};

/// timed typing speed test with accuracy tracking, history and personal bests
#[derive(Parser, Debug, Clone)]
#[clap(version, about)]
pub struct Cli {
    /// phrase difficulty (overrides the config file)
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// test length in seconds (overrides the config file)
    #[clap(short = 's', long, value_parser = clap::value_parser!(u64).range(1..))]
    duration: Option<u64>,

    /// custom phrase to type instead of the builtin ones
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// path to a JSON config file
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// write the session history to this CSV file on exit
    #[clap(long, value_name = "CSV")]
    export: Option<PathBuf>,
}

impl Cli {
    /// Flags win over whatever the config file says
    fn apply_overrides(&self, mut config: Config) -> Config {
        if let Some(difficulty) = self.difficulty {
            config.difficulty = difficulty;
        }
        if let Some(duration) = self.duration {
            config.duration_secs = duration;
        }
        config
    }

    fn corpus(&self, config: &Config) -> typespeed::error::Result<Corpus> {
        match &self.prompt {
            Some(prompt) => Corpus::single(prompt),
            None => config.corpus(),
        }
    }
}

/// Daily log file under `dir`, which is created if missing
fn log_appender(dir: &Path) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("typespeed.log")
        .build(dir)
}

fn setup_logging(config: &Config) -> Result<(), Box<dyn Error>> {
    let file_appender = log_appender(&AppDirs::log_dir())?;

    // RUST_LOG wins over the configured level
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .init();

    Ok(())
}

/// Loads the config before the file log exists, so its warnings go to `writer`
fn load_config<S, W>(store: &S, writer: W) -> typespeed::error::Result<Config>
where
    S: ConfigStore,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let subscriber = tracing_subscriber::fmt()
        .with_writer(writer)
        .with_max_level(Level::WARN)
        .with_ansi(false)
        .with_target(false)
        .finish();
    tracing::subscriber::with_default(subscriber, || store.load())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let store = match &cli.config {
        Some(path) => FileConfigStore::with_path(path),
        None => FileConfigStore::new(),
    };
    let config = cli.apply_overrides(load_config(&store, io::stderr)?);
    config.validate()?;

    setup_logging(&config)?;
    info!(config = %store.path().display(), "typespeed starting");

    let controller =
        SessionController::new(cli.corpus(&config)?, config.session_config(), SystemClock);
    let mut app = App::new(controller, config.duration_choices());

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, config.tick_rate_ms);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result?;

    if let Some(path) = &cli.export {
        let history = app.controller.history();
        history.export_csv(path)?;
        info!(path = %path.display(), entries = history.len(), "history exported");
    }

    Ok(())
}

fn run_app<B: Backend, C: Clock>(
    terminal: &mut Terminal<B>,
    app: &mut App<C>,
    tick_rate_ms: u64,
) -> Result<(), Box<dyn Error>> {
    let mut runner = Runner::new(
        ChannelEventSource::crossterm(),
        FixedTicker::from_millis(tick_rate_ms),
    );

    loop {
        if app.take_redraw() {
            terminal.draw(|f| f.render_widget(&*app, f.area()))?;
        }

        match runner.step() {
            AppEvent::Tick => app.on_tick(),
            AppEvent::Resize => {
                if let Err(e) = terminal.autoresize() {
                    warn!(error = %e, "resize failed");
                }
                terminal.draw(|f| f.render_widget(&*app, f.area()))?;
            }
            AppEvent::Key(key) => app.on_key(key),
        }

        if app.should_quit {
            info!("quit requested");
            return Ok(());
        }
    }
}
