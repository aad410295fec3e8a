mod ports;

use std::cell::RefCell;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use valve_menu_core::{
    ClickOutcome, ControllerState, EwRsamMenu, FetchError, Menu, MenuConfig, MenuKind,
    PopupOutcome, ReconcilerState, StandardMenu, WaveMenu,
};
use valve_menu_protocol::{ClickEvent, ClickTarget, FormSnapshot, PanelEffect, Point, TimeWindow};

use crate::ports::{CannedFetcher, IssuedRequest, Popup, Recorder};

#[derive(Parser)]
#[command(name = "valve-menu")]
#[command(about = "Drive Valve menu behavior offline and print what the page would do")]
struct Cli {
    /// Log request handling to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a configured menu
    Configure {
        /// Menu kind: wave or ewrsam
        kind: String,
        /// Data source id
        id: String,
        /// JSON menu config used instead of the built-in preset
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Feed clicks to a waveform menu
    Click {
        id: String,
        /// JSON form snapshot
        #[arg(long)]
        form: PathBuf,
        /// Clicked time in J2K seconds; repeat for several clicks
        #[arg(long = "time", required = true, allow_negative_numbers = true)]
        times: Vec<f64>,
        #[arg(long, default_value_t = 0.0)]
        screen_x: f64,
        #[arg(long, default_value_t = 0.0)]
        screen_y: f64,
        /// XML metadata bound to the clicked image
        #[arg(long)]
        target: Option<PathBuf>,
        /// XML answered to every inset plot request; requests stay pending without it
        #[arg(long)]
        response: Option<PathBuf>,
        /// JSON menu config used instead of the waveform preset
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Initialize an RSAM menu and reconcile its option panels
    Reconcile {
        id: String,
        /// Menu description XML returned by the server
        #[arg(long, conflicts_with = "fail")]
        response: Option<PathBuf>,
        /// Simulate an unreachable server
        #[arg(long)]
        fail: bool,
        /// JSON menu config used instead of the RSAM preset
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Serialize)]
struct ClickReport {
    outcomes: Vec<ClickOutcome>,
    ranges: Vec<TimeWindow>,
    requests: Vec<IssuedRequest>,
    popups: Vec<Popup>,
    state: ControllerState,
    last_outcome: Option<PopupOutcome>,
}

#[derive(Serialize)]
struct ReconcileReport {
    requests: Vec<IssuedRequest>,
    effects: Vec<PanelEffect>,
    state: ReconcilerState,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        })
        .init();

    match cli.command {
        Commands::Configure { kind, id, config } => {
            let kind: MenuKind = kind.parse()?;
            let mut menu = Menu::new(id);
            load_config(config.as_deref(), kind)?.apply(&mut menu);
            print_json(&menu)
        }
        Commands::Click {
            id,
            form,
            times,
            screen_x,
            screen_y,
            target,
            response,
            config,
        } => {
            let form: FormSnapshot = serde_json::from_str(&read(&form)?)
                .with_context(|| format!("invalid form snapshot {}", form.display()))?;
            let target = match target {
                Some(path) => ClickTarget::with_xml(read(&path)?),
                None => ClickTarget::default(),
            };
            let response = response.map(|p| read(&p)).transpose()?.map(Ok);

            let fetcher = Rc::new(CannedFetcher::new(response));
            let recorder = Rc::new(Recorder::default());
            let ranges = Rc::new(RefCell::new(Vec::new()));
            let picked = Rc::clone(&ranges);
            let base = StandardMenu::new(move |_, window| picked.borrow_mut().push(window));
            let config = load_config(config.as_deref(), MenuKind::Wave)?;
            let menu = WaveMenu::with_config(
                Menu::new(id),
                &config,
                base,
                Rc::new(form),
                fetcher.clone(),
                recorder.clone(),
            );
            menu.initialize();

            let mut outcomes = Vec::with_capacity(times.len());
            for time in times {
                let click = ClickEvent::new(
                    target.clone(),
                    Point::new(screen_x, screen_y),
                    Point::new(time, 0.0),
                );
                outcomes.push(menu.accept_click(&click)?);
            }

            let ranges = ranges.borrow().clone();
            print_json(&ClickReport {
                outcomes,
                ranges,
                requests: fetcher.issued(),
                popups: recorder.popups(),
                state: menu.state(),
                last_outcome: menu.last_outcome(),
            })
        }
        Commands::Reconcile {
            id,
            response,
            fail,
            config,
        } => {
            let response = match (response, fail) {
                (_, true) => Some(Err(FetchError::Transport("server unreachable".into()))),
                (Some(path), false) => Some(Ok(read(&path)?)),
                (None, false) => None,
            };

            let fetcher = Rc::new(CannedFetcher::new(response));
            let recorder = Rc::new(Recorder::default());
            let base = StandardMenu::new(|_, _| {});
            let config = load_config(config.as_deref(), MenuKind::EwRsam)?;
            let menu = EwRsamMenu::with_config(
                Menu::new(id),
                &config,
                base,
                fetcher.clone(),
                recorder.clone(),
            );
            menu.initialize();

            print_json(&ReconcileReport {
                requests: fetcher.issued(),
                effects: recorder.effects(),
                state: menu.state(),
            })
        }
    }
}

/// The config at `path`, or the preset for `kind`.
fn load_config(path: Option<&Path>, kind: MenuKind) -> Result<MenuConfig> {
    match path {
        Some(path) => MenuConfig::from_json(&read(path)?)
            .with_context(|| format!("invalid menu config {}", path.display())),
        None => Ok(kind.config()),
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let mut out = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}
