use std::{
    path::PathBuf,
    process::ExitCode,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use inquire::{Confirm, Password, PasswordDisplayMode, Text};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use weather_core::{
    AppSettings, Config, Coordinates, Region, SearchOutcome, ViewRenderer, WeatherApp,
    client_from_config,
    format::ClockFormat,
    run_auto_refresh,
    storage::{FileStore, RecentSearches, ambient_dark_mode, load_dark_mode, save_dark_mode},
};

use crate::{
    server,
    terminal::{TerminalNotifier, TerminalSurface},
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Current conditions, forecast and air quality")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key, language and optional proxy address.
    Configure,

    /// Show weather for a city, or for a coordinate pair.
    Show {
        /// City name. Defaults to the most recent search.
        city: Option<String>,

        #[arg(long, allow_hyphen_values = true, requires = "lon", conflicts_with = "city")]
        lat: Option<f64>,

        #[arg(long, allow_hyphen_values = true, requires = "lat")]
        lon: Option<f64>,

        #[command(flatten)]
        display: DisplayArgs,
    },

    /// Keep a city on screen and refresh it periodically.
    ///
    /// Type another city to switch, `:theme` to toggle the colour scheme,
    /// `:history` to list recent searches and `:quit` to leave.
    Watch {
        city: Option<String>,

        /// Refresh interval; defaults to the configured one.
        #[arg(long)]
        minutes: Option<u64>,

        #[command(flatten)]
        display: DisplayArgs,
    },

    /// List recent searches, newest first.
    History,

    /// Print the current colour scheme.
    Theme {
        #[arg(long)]
        toggle: bool,
    },

    /// Serve the static widget and proxy API requests.
    Serve {
        #[arg(long)]
        port: Option<u16>,

        #[arg(long)]
        static_dir: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct DisplayArgs {
    /// Comma separated sections to show.
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "current,hourly,daily,air",
        value_parser = parse_region
    )]
    sections: Vec<Region>,

    /// Use a 12-hour clock for times.
    #[arg(long)]
    twelve_hour: bool,
}

fn parse_region(value: &str) -> Result<Region, String> {
    Region::try_from(value).map_err(|e| e.to_string())
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<ExitCode> {
        let mut config = Config::load()?;

        match self.command {
            Command::Configure => configure(config)?,
            Command::Show { city, lat, lon, display } => {
                let (app, _) = build_app(&config, &display)?;
                let outcome = match (lat, lon) {
                    (Some(lat), Some(lon)) => app.search_by_coords(Coordinates { lat, lon }).await,
                    _ => {
                        let city = match city {
                            Some(city) => city,
                            None => most_recent(&app)?,
                        };
                        app.search(&city).await
                    }
                };
                return Ok(exit_code(&outcome));
            }
            Command::Watch { city, minutes, display } => {
                if !config.features.auto_refresh {
                    bail!("Auto refresh is disabled in the configuration");
                }
                if let Some(minutes) = minutes {
                    config.auto_refresh_minutes = minutes;
                }
                watch(&config, city, &display).await?;
            }
            Command::History => {
                let store = FileStore::open(Config::state_file_path()?);
                let recent = RecentSearches::load(&store);
                if recent.is_empty() {
                    println!("No recent searches");
                }
                for (i, city) in recent.as_slice().iter().enumerate() {
                    println!("{}. {city}", i + 1);
                }
            }
            Command::Theme { toggle } => {
                let mut store = FileStore::open(Config::state_file_path()?);
                let mut dark = load_dark_mode(&store, ambient_dark(&config));
                if toggle {
                    if !config.features.dark_mode {
                        bail!("Dark mode is disabled in the configuration");
                    }
                    dark = !dark;
                    save_dark_mode(&mut store, dark)?;
                }
                println!("{}", if dark { "dark" } else { "light" });
            }
            Command::Serve { port, static_dir } => {
                if let Some(port) = port {
                    config.server.port = port;
                }
                if let Some(dir) = static_dir {
                    config.server.static_dir = dir;
                }
                server::run(&config).await?;
            }
        }

        Ok(ExitCode::SUCCESS)
    }
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let key = Password::new("OpenWeather API key (leave empty to keep the current one):")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;
    if !key.trim().is_empty() {
        config.api_key = Some(key.trim().to_string());
    }

    let language = Text::new("Response language:").with_default(&config.language).prompt()?;
    config.language = language.trim().to_string();

    let use_proxy = Confirm::new("Route requests through a proxy server?")
        .with_default(config.proxy_url.is_some())
        .prompt()?;
    config.proxy_url = if use_proxy {
        let current = config.proxy_url.clone().unwrap_or_else(|| "http://localhost:3000".to_string());
        let url = Text::new("Proxy address:").with_default(&current).prompt()?;
        Some(url.trim().to_string()).filter(|u| !u.is_empty())
    } else {
        None
    };

    config.save()?;
    println!("Configuration saved to {}", Config::config_file_path()?.display());
    Ok(())
}

fn ambient_dark(config: &Config) -> bool {
    ambient_dark_mode(config.default_theme, std::env::var("COLORFGBG").ok().as_deref())
}

/// Wire the controller to the terminal. The returned flag mirrors the
/// controller's theme so the surface can restyle after a toggle.
fn build_app(config: &Config, display: &DisplayArgs) -> anyhow::Result<(WeatherApp, Arc<AtomicBool>)> {
    let api = client_from_config(config)
        .context("Run `weather configure` or set OPENWEATHER_API_KEY")?;
    let store = FileStore::open(Config::state_file_path()?);
    let ambient = ambient_dark(config);

    let dark = Arc::new(AtomicBool::new(load_dark_mode(&store, ambient)));
    let clock = if display.twelve_hour { ClockFormat::H12 } else { ClockFormat::H24 };
    let renderer = ViewRenderer::new(TerminalSurface::new(display.sections.clone(), dark.clone()), clock);

    let app = WeatherApp::new(
        api,
        Box::new(renderer),
        Arc::new(TerminalNotifier),
        Box::new(store),
        AppSettings::from(config),
        ambient,
    );
    debug!(?app, "application ready");
    Ok((app, dark))
}

fn most_recent(app: &WeatherApp) -> anyhow::Result<String> {
    app.recent_searches()
        .into_iter()
        .next()
        .context("No city given and no recent search to repeat")
}

fn exit_code(outcome: &SearchOutcome) -> ExitCode {
    match outcome {
        SearchOutcome::Ready => ExitCode::SUCCESS,
        SearchOutcome::Busy | SearchOutcome::Failed(_) => ExitCode::FAILURE,
    }
}

async fn watch(config: &Config, city: Option<String>, display: &DisplayArgs) -> anyhow::Result<()> {
    let (app, dark) = build_app(config, display)?;
    let city = match city {
        Some(city) => city,
        None => most_recent(&app)?,
    };
    app.search(&city).await;

    let every = config.auto_refresh_interval();
    info!(minutes = every.as_secs() / 60, "auto refresh started, Ctrl-C to stop");

    let refresher = run_auto_refresh(&app, every);
    tokio::pin!(refresher);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            () = &mut refresher => break,
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read from stdin")? else {
                    break;
                };
                match line.trim() {
                    "" => {}
                    ":quit" | ":q" => break,
                    ":history" => {
                        for city in app.recent_searches() {
                            println!("  {city}");
                        }
                    }
                    ":theme" => match app.toggle_theme() {
                        Ok(now_dark) => {
                            dark.store(now_dark, Ordering::Relaxed);
                            println!("Theme: {}", if now_dark { "dark" } else { "light" });
                        }
                        Err(err) => eprintln!("{}", err.user_message()),
                    },
                    city => {
                        if app.search(city).await == SearchOutcome::Busy {
                            eprintln!("A search is already running, try again in a moment");
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
