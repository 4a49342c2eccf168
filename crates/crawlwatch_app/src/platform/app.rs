use std::io::{self, BufRead};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use crawlwatch_core::{update, AppState, AppViewModel, FilterPatch, ListFilter, Msg};
use crawlwatch_engine::{EngineHandle, Store};
use engine_logging::engine_info;
use tokio::sync::watch;

use super::config::AppConfig;
use super::effects::EffectRunner;
use super::input::{parse_line, Input, HELP};
use super::logging;
use super::persistence::SessionStore;
use super::render::render;

/// Engine events are drained and the view re-rendered at most once per tick.
const TICK: Duration = Duration::from_millis(75);

pub fn run_app() -> Result<()> {
    let config = AppConfig::load()?;
    logging::initialize(config.log_destination, config.level());
    engine_info!("crawlwatch starting against {}", config.base_url);

    let mut session = SessionStore::new(&config.state_dir);
    let restored = session.load();
    let initial_key = restored
        .as_ref()
        .map(|restored| restored.api_key.clone())
        .or_else(|| config.api_key.clone());
    let engine = EngineHandle::new(config.engine_settings(), initial_key)
        .context("starting the engine")?;

    let views = Store::new(AppViewModel::default());
    let mut view_rx = views.subscribe();
    let mut app = App {
        state: AppState::new(),
        runner: EffectRunner::new(engine, session),
        views,
        page_size: config.page_size,
    };

    let (input_tx, input_rx) = mpsc::channel::<Input>();
    spawn_stdin_reader(input_tx.clone());
    thread::spawn(move || {
        while input_tx.send(Input::Msg(Msg::Tick)).is_ok() {
            thread::sleep(TICK);
        }
    });

    app.dispatch(Msg::AppStarted);
    match restored {
        Some(restored) => app.dispatch(Msg::SessionRestored {
            api_key: restored.api_key,
            filter: restored.filter,
        }),
        None => {
            if let Some(api_key) = config.api_key.clone() {
                app.dispatch(Msg::SessionRestored {
                    api_key,
                    filter: app.initial_filter(),
                });
            }
        }
    }

    println!("{HELP}");
    while let Ok(input) = input_rx.recv() {
        match input {
            Input::Quit => break,
            Input::Help => println!("{HELP}"),
            Input::Msg(Msg::Tick) => {
                for msg in app.runner.poll_events() {
                    app.dispatch(msg);
                }
                print_if_changed(&mut view_rx);
            }
            Input::Msg(msg) => app.handle_user(msg),
        }
    }

    engine_info!("crawlwatch exiting");
    Ok(())
}

struct App {
    state: AppState,
    runner: EffectRunner,
    views: Store<AppViewModel>,
    page_size: u32,
}

impl App {
    fn initial_filter(&self) -> ListFilter {
        ListFilter {
            page_size: self.page_size,
            ..ListFilter::default()
        }
    }

    fn handle_user(&mut self, msg: Msg) {
        if matches!(msg, Msg::LoggedIn { .. }) && !self.state.is_authenticated() {
            // Logout resets the filter; reapply the configured page size.
            self.dispatch(Msg::FiltersChanged(FilterPatch {
                page_size: Some(self.page_size),
                ..FilterPatch::default()
            }));
        }
        self.dispatch(msg);
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        self.runner.run(effects);
        if state.is_authenticated() {
            self.runner.record_filter(state.filter());
        }
        if state.consume_dirty() {
            self.views.set(state.view());
        }
        self.state = state;
    }
}

fn print_if_changed(view_rx: &mut watch::Receiver<AppViewModel>) {
    if view_rx.has_changed().unwrap_or(false) {
        let text = render(&view_rx.borrow_and_update());
        println!("{text}");
    }
}

fn spawn_stdin_reader(input_tx: mpsc::Sender<Input>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match parse_line(&line) {
                Ok(Some(input)) => {
                    if input_tx.send(input).is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(message) => eprintln!("{message}"),
            }
        }
        // End of input behaves like `quit`.
        let _ = input_tx.send(Input::Quit);
    });
}
