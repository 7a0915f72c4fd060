use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use core_sim::load_selection_config_from_env;
use futures::StreamExt;
use sim_client::{
    load_client_config_from_env, ByteStream, ChunkStream, ClientConfig, SimulationClient,
};
use sim_proto::{DecodeStats, StreamChunk};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{info, warn};

mod app;
mod controller;
mod ui;

use app::{InspectorApp, RunCommand};
use controller::{ControllerEvent, RunController, StreamMessage, StreamMessageKind};

#[derive(Clone)]
struct ChannelWriter {
    sender: Sender<String>,
}

impl std::io::Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(text) = String::from_utf8(buf.to_vec()) {
            let _ = self.sender.send(text);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Policy simulation run inspector", long_about = None)]
struct Cli {
    /// Policy prompt sent to the simulation backend.
    #[arg(long)]
    prompt: String,
    /// Zone to include in the run; repeat for several. Empty means all zones.
    #[arg(long = "zone")]
    zones: Vec<String>,
    /// Client configuration file; overrides SIM_CLIENT_CONFIG_PATH.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Backend base URL.
    #[arg(long)]
    endpoint: Option<String>,
    /// Local zone FeatureCollection, used when no zones URL is configured.
    #[arg(long)]
    zones_file: Option<PathBuf>,
    /// Print the run to stderr instead of opening the terminal UI.
    #[arg(long)]
    headless: bool,
}

impl Cli {
    fn client_config(&self) -> Result<Arc<ClientConfig>> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::from_file(path)?,
            None => load_client_config_from_env().as_ref().clone(),
        };
        if let Some(endpoint) = &self.endpoint {
            config = config.with_base_url(endpoint.clone());
        }
        if let Some(path) = &self.zones_file {
            config = config.with_zones_path(path);
        }
        Ok(Arc::new(config))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let log_rx = if cli.headless {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .compact()
            .with_writer(std::io::stderr)
            .init();
        None
    } else {
        let (log_tx, log_rx) = mpsc::channel::<String>();
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .compact()
            .with_ansi(false)
            .with_writer(move || ChannelWriter {
                sender: log_tx.clone(),
            })
            .init();
        Some(log_rx)
    };

    let client = Arc::new(SimulationClient::new(cli.client_config()?)?);
    let directory = client
        .zone_directory()
        .await
        .wrap_err("failed to load zone directory")?;
    info!(zones = directory.len(), "Zone directory ready");

    let mut controller = RunController::new(directory, load_selection_config_from_env());
    let unknown = controller.set_preset_zones(cli.zones.clone());
    if !unknown.is_empty() {
        warn!(?unknown, "Ignoring zones missing from the directory");
    }

    match log_rx {
        None => run_headless(&client, controller, &cli.prompt).await,
        Some(log_rx) => {
            let (message_tx, message_rx) = unbounded_channel::<StreamMessage>();
            let (command_tx, command_rx) = unbounded_channel::<RunCommand>();
            let prompt = cli.prompt.clone();
            let ui_handle = std::thread::spawn(move || -> Result<()> {
                let app = InspectorApp::new(controller, prompt, message_rx, command_tx, log_rx)?;
                app.run()
            });
            serve_runs(client, command_rx, message_tx).await;
            ui_handle
                .join()
                .map_err(|_| eyre!("inspector UI thread panicked"))?
        }
    }
}

async fn run_headless(
    client: &SimulationClient,
    mut controller: RunController,
    prompt: &str,
) -> Result<()> {
    let (run, request) = controller.start(prompt)?;
    info!(run, zones = request.selected_zones.len(), "Starting run");

    let mut stream = match client.simulate(&request).await {
        Ok(stream) => stream,
        Err(err) => {
            controller.handle(failed(run, &err));
            return Err(err.into());
        }
    };
    while let Some(item) = stream.next_chunk().await {
        match item {
            Ok(chunk) => {
                log_chunk(&chunk);
                controller.handle(StreamMessage {
                    run,
                    kind: StreamMessageKind::Chunk(chunk),
                });
            }
            Err(err) => {
                controller.handle(failed(run, &err));
                return Err(err.into());
            }
        }
    }
    let outcome = controller.handle(ended(run, stream.stats()));
    if outcome == ControllerEvent::ResetAfterEmptyStream {
        return Err(eyre!("stream ended without any chunks"));
    }

    let session = controller.session();
    println!("status: {:?}", session.status());
    println!("events: {}", session.events().len());
    if let Some(summary) = session.summary() {
        println!("summary: {summary}");
    }
    if let Some(city) = session.metrics().city() {
        for (field, metric) in city {
            println!(
                "city.{field}: value={:?} delta={:?}",
                metric.value, metric.delta
            );
        }
    }
    Ok(())
}

fn log_chunk(chunk: &StreamChunk) {
    match chunk {
        StreamChunk::Event(event) => info!(
            id = %event.id,
            zone = event.owning_zone(),
            category = event.category.as_str(),
            comments = event.comments.len(),
            "{}",
            event.title
        ),
        StreamChunk::Update(update) => info!(zones = ?update.zones_count, "{}", update.message),
        StreamChunk::Complete(complete) => info!("Run complete: {}", complete.summary),
    }
}

fn failed(run: u64, err: &impl std::fmt::Display) -> StreamMessage {
    StreamMessage {
        run,
        kind: StreamMessageKind::Failed(err.to_string()),
    }
}

fn ended(run: u64, stats: DecodeStats) -> StreamMessage {
    StreamMessage {
        run,
        kind: StreamMessageKind::Ended(stats),
    }
}

enum Step {
    Command(Option<RunCommand>),
    Item(u64, Option<Result<StreamChunk, sim_client::ClientError>>),
}

async fn next_item(
    active: &mut Option<(u64, ChunkStream<ByteStream>)>,
) -> (u64, Option<Result<StreamChunk, sim_client::ClientError>>) {
    match active {
        Some((run, stream)) => (*run, stream.next().await),
        None => std::future::pending().await,
    }
}

/// Network side of the terminal UI: runs one stream at a time and forwards
/// everything it yields, tagged with the run it belongs to.
async fn serve_runs(
    client: Arc<SimulationClient>,
    mut commands: UnboundedReceiver<RunCommand>,
    messages: UnboundedSender<StreamMessage>,
) {
    let mut active: Option<(u64, ChunkStream<ByteStream>)> = None;
    loop {
        let step = tokio::select! {
            command = commands.recv() => Step::Command(command),
            (run, item) = next_item(&mut active) => Step::Item(run, item),
        };
        let message = match step {
            Step::Command(None | Some(RunCommand::Shutdown)) => break,
            Step::Command(Some(RunCommand::Cancel)) => {
                active = None;
                continue;
            }
            Step::Command(Some(RunCommand::Start { run, request })) => {
                active = None;
                match client.simulate(&request).await {
                    Ok(stream) => {
                        active = Some((run, stream));
                        continue;
                    }
                    Err(err) => failed(run, &err),
                }
            }
            Step::Command(Some(RunCommand::Reactions { run, event })) => {
                match client.fetch_reactions(&event).await {
                    Ok(replies) => StreamMessage {
                        run,
                        kind: StreamMessageKind::Reactions {
                            event_id: event.id,
                            messages: replies,
                        },
                    },
                    Err(err) => {
                        warn!(event = %event.id, "Reaction request failed: {}", err);
                        continue;
                    }
                }
            }
            Step::Item(run, Some(Ok(chunk))) => StreamMessage {
                run,
                kind: StreamMessageKind::Chunk(chunk),
            },
            Step::Item(run, Some(Err(err))) => {
                active = None;
                failed(run, &err)
            }
            Step::Item(run, None) => {
                let stats = active
                    .take()
                    .map(|(_, stream)| stream.stats())
                    .unwrap_or_default();
                ended(run, stats)
            }
        };
        if messages.send(message).is_err() {
            break;
        }
    }
    info!("Inspector requested shutdown");
}
