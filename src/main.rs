use std::{fs::OpenOptions, sync::Arc, time::Duration};

use clap::Parser;
use color_eyre::eyre::{eyre, Result, WrapErr};
use crossterm::event::{Event, EventStream, KeyEventKind};
use futures::StreamExt;
use log::info;
use prompt_diary::{
    app::{App, Flow},
    completion::HttpCompletionClient,
    config::Config,
    prompt::PromptAcquisition,
    store::JsonFileStore,
    sync::EntrySync,
    ui::UI,
};

fn initialize_logger(config: &Config) -> Result<()> {
    let path = config.log_file();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .wrap_err_with(|| format!("Failed to open log file {}", path.display()))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .format_module_path(true)
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();

    info!("Logger initialized");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let config = Config::parse();
    initialize_logger(&config)?;

    let store = Arc::new(
        JsonFileStore::open(config.data_file())
            .map_err(|e| eyre!("Failed to load diary: {}", e))?,
    );
    let sync = EntrySync::subscribe(store, config.order_by).await?;
    let client = Arc::new(HttpCompletionClient::new(config.endpoint.clone()));
    let prompt = PromptAcquisition::new(client, config.startup_cue.clone());

    let mut app = App::new(sync, prompt);
    app.start_prompt();

    let mut ui = UI::new()?;
    let mut events = EventStream::new();
    let mut redraw = tokio::time::interval(Duration::from_millis(250));
    redraw.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        ui.display(&app)?;

        tokio::select! {
            event = events.next() => match event {
                Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                    if app.handle_key(key).await == Flow::Quit {
                        break;
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => break,
            },
            _ = app.next_update() => {}
            _ = redraw.tick() => {}
        }
    }

    info!("Shutting down");
    Ok(())
}
