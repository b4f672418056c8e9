use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use clap::{error::ErrorKind, ArgAction, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::{info, warn};

use typecoach::{
    app::{App, AppSetup},
    app_dirs::AppDirs,
    config::{Config, FileConfigStore},
    history::HistoryStore,
    logging,
    runtime::{CrosstermEventSource, FixedTicker, Runner, Ticker, TrainerEvent, TrainerEventSource},
    sources::{fetch_opening, new_text_source, DummySource, TextSource},
    theme::{Theme, ThemeName},
};

const TICK_RATE_MS: u64 = 100;

/// touch typing trainer with live feedback and practice text that targets your mistakes
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal touch-typing trainer. Type against a passage for a fixed time and get live WPM, accuracy and error feedback. With an LLM source, new sentences are generated as you go, aimed at the characters and words you keep getting wrong."
)]
pub struct Cli {
    /// path to a JSON config file
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// text source (dummy or llm)
    #[clap(long)]
    source: Option<String>,

    /// initial session length in minutes
    #[clap(short = 'm', long, value_parser = clap::value_parser!(u32).range(1..=60))]
    minutes: Option<u32>,

    /// color theme
    #[clap(short = 't', long, value_enum)]
    theme: Option<ThemeName>,

    /// stop accepting input after a typo until it is deleted
    #[clap(long)]
    block_on_typo: bool,

    /// flash the text box on every typo
    #[clap(long)]
    typo_flash: bool,

    /// custom prompt to use
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// log verbosity (-v info, -vv debug, -vvv trace)
    #[clap(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,

    /// log file (defaults to the data directory)
    #[clap(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Command line flags take precedence over the config file.
    fn apply(&self, config: &mut Config) {
        if let Some(source) = &self.source {
            config.text.source = source.clone();
        }
        if let Some(minutes) = self.minutes {
            config.ui.default_duration_minutes = minutes;
        }
        if let Some(theme) = self.theme {
            config.ui.theme = theme.to_string();
        }
        if self.block_on_typo {
            config.ui.block_on_typo = true;
        }
        if self.typo_flash {
            config.ui.typo_flash_enabled = true;
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }
    if cli.prompt.as_deref().is_some_and(|p| p.trim().is_empty()) {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::InvalidValue, "prompt must not be empty")
            .exit();
    }

    let log_file = cli.log_file.clone().unwrap_or_else(AppDirs::log_path);
    if let Err(err) = logging::init_logging(cli.verbose, &log_file) {
        eprintln!("warning: {err}");
    }

    let (mut config, config_path) = FileConfigStore::load_or_create(cli.config.as_deref())?;
    cli.apply(&mut config);
    info!(path = ?config_path, source = %config.text.source, "configuration loaded");

    let (source, opening_text) = match &cli.prompt {
        Some(prompt) => (
            Arc::new(DummySource) as Arc<dyn TextSource>,
            prompt.trim().to_string(),
        ),
        None => {
            let source = new_text_source(&config.text)?;
            fetch_opening(source, config.text.llm.fallback_to_dummy)?
        }
    };

    let events = CrosstermEventSource::new();
    let runner = Runner::new(events, FixedTicker::new(Duration::from_millis(TICK_RATE_MS)));

    let mut app = App::new(AppSetup {
        opening_text,
        source,
        settings: config.session_settings(),
        theme: Theme::new(ThemeName::from_config(&config.ui.theme)),
        history: Some(HistoryStore::with_path(config.stats.resolved_path())),
        generation_timeout: config.text.llm.generation_deadline(),
        events: runner.sender(),
    });

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = &result {
        warn!(error = %err, "terminal loop failed");
    }
    result
}

fn start_tui<B: Backend, E: TrainerEventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    while !app.should_exit() {
        let event = runner.step();
        // idle screens only change on input
        let redraw = event != TrainerEvent::Tick || app.is_animating();

        app.handle(event, Instant::now());

        if redraw && !app.should_exit() {
            terminal.draw(|f| f.render_widget(&*app, f.area()))?;
        }
    }

    Ok(())
}
