use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use log::{error, info};
use serde_json::json;
use simplelog::{Config, LevelFilter, WriteLogger};

use bookplayer::fetch::HttpLoader;
use bookplayer::host::{BookProperties, HostCallbacks, PageProperties};
use bookplayer::language::LangData;
use bookplayer::media::MediaSet;
use bookplayer::tracker::ProgressReport;
use bookplayer::{BookPlayer, LoadState, PlayerConfig};

#[derive(Parser, Debug)]
#[command(version, about = "Load a book and walk through its pages")]
struct Cli {
    /// Book folder or markup url (http(s), file:// or a local path)
    url: Option<String>,

    /// YAML player configuration; command-line flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    landscape: bool,

    #[arg(long)]
    context_pages: bool,

    /// Language code to show the book in
    #[arg(short, long)]
    language: Option<String>,

    /// Number of page turns to simulate after the first page
    #[arg(short, long, default_value_t = 0)]
    turns: usize,

    #[arg(long, default_value = "bookplayer.log")]
    log_file: PathBuf,

    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

/// Prints every host notification as a JSON line.
struct StdoutHost;

impl StdoutHost {
    fn emit(&self, event: &str, payload: serde_json::Value) {
        println!("{}", json!({ "event": event, "data": payload }));
    }
}

impl HostCallbacks for StdoutHost {
    fn page_styles_installed(&mut self) {
        self.emit("pageStylesInstalled", serde_json::Value::Null);
    }

    fn report_book_properties(&mut self, properties: BookProperties) {
        self.emit("reportBookProperties", json!(properties));
    }

    fn controls_callback(&mut self, languages: &[LangData]) {
        self.emit("controlsCallback", json!(languages));
    }

    fn report_page_properties(&mut self, properties: PageProperties) {
        self.emit("reportPageProperties", json!(properties));
    }

    fn report_progress(&mut self, report: &ProgressReport) {
        self.emit("progress", json!(report));
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    WriteLogger::init(cli.log_level, Config::default(), File::create(&cli.log_file)?)?;
    info!("Starting bookplayer");

    let mut config = match &cli.config {
        Some(path) => PlayerConfig::load_from_file(path)?,
        None => PlayerConfig::default(),
    };
    if let Some(url) = cli.url {
        config.url = url;
    }
    config.landscape |= cli.landscape;
    config.show_context_pages |= cli.context_pages;
    if cli.language.is_some() {
        config.active_language = cli.language;
    }

    let extra_buttons = config.extra_buttons();
    let show_navigation = config.show_navigation_buttons();
    let loader = HttpLoader::new(Duration::from_secs(config.fetch_timeout_secs));
    let mut player = BookPlayer::new(
        config,
        Box::new(loader),
        Box::new(StdoutHost),
        MediaSet::silent(),
    );

    player.load()?;
    player.run_until_idle()?;

    match player.state() {
        LoadState::Failed { message_html } => {
            error!("Book failed to load");
            bail!("{message_html}");
        }
        LoadState::Loading => {
            println!("{}", json!({ "event": "loading" }));
            return Ok(());
        }
        LoadState::Ready => {}
    }

    if let Some(book) = player.book() {
        let summary = json!({
            "title": book.metadata.title,
            "pages": book.pages.len(),
            "numberedPages": book.metadata.numbered_page_count,
            "canRotate": book.metadata.can_rotate,
            "activeLanguage": book.active_language,
            "stylesheetBytes": book.styles.combined.len(),
            "hasFontStylesheet": book.styles.fonts.is_some(),
            "showNavigation": show_navigation,
            "extraButtons": extra_buttons,
        });
        println!("{}", json!({ "event": "book", "data": summary }));
    }

    for _ in 0..cli.turns {
        player.next()?;
        player.run_until_idle()?;
    }

    player.close();
    info!("Shutting down bookplayer");
    Ok(())
}
