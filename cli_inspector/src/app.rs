use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use color_eyre::Result;
use crossterm::event::{self, Event, KeyCode};
use ratatui::backend::CrosstermBackend;
use ratatui::prelude::*;
use sim_proto::{SimulationEvent, SimulationRequest};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{error, info, warn};

use crate::controller::{ControllerEvent, RunController, StreamMessage};
use crate::ui::{draw_ui, UiState};

/// Work the UI thread hands to the network task.
#[derive(Debug)]
pub enum RunCommand {
    Start { run: u64, request: SimulationRequest },
    Cancel,
    Reactions { run: u64, event: SimulationEvent },
    Shutdown,
}

pub struct InspectorApp {
    terminal: Terminal<CrosstermBackend<std::io::Stdout>>,
    ui_state: UiState,
    controller: RunController,
    prompt: String,
    receiver: UnboundedReceiver<StreamMessage>,
    command_sender: UnboundedSender<RunCommand>,
    log_receiver: Receiver<String>,
}

impl InspectorApp {
    pub fn new(
        controller: RunController,
        prompt: String,
        receiver: UnboundedReceiver<StreamMessage>,
        command_sender: UnboundedSender<RunCommand>,
        log_receiver: Receiver<String>,
    ) -> Result<Self> {
        let stdout = std::io::stdout();
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        crossterm::terminal::enable_raw_mode()?;
        terminal.clear()?;
        terminal.hide_cursor()?;
        Ok(Self {
            terminal,
            ui_state: UiState::default(),
            controller,
            prompt,
            receiver,
            command_sender,
            log_receiver,
        })
    }

    pub fn run(mut self) -> Result<()> {
        self.start_run();
        let mut last_draw = Instant::now();

        loop {
            while let Ok(message) = self.receiver.try_recv() {
                let outcome = self.controller.handle(message);
                self.note_outcome(outcome);
            }

            while let Ok(line) = self.log_receiver.try_recv() {
                self.ui_state.push_log(line);
            }

            if last_draw.elapsed() >= Duration::from_millis(100) {
                self.terminal
                    .draw(|frame| draw_ui(frame, &self.controller, &self.ui_state))?;
                last_draw = Instant::now();
            }

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    match key.code {
                        KeyCode::Char('q') => break,
                        KeyCode::Char('n') => self.start_run(),
                        KeyCode::Char('r') => {
                            self.controller.reset();
                            self.send(RunCommand::Cancel);
                            self.ui_state.push_log("Run reset");
                        }
                        KeyCode::Char('j') | KeyCode::Down => {
                            self.controller.focus_step(1);
                        }
                        KeyCode::Char('k') | KeyCode::Up => {
                            self.controller.focus_step(-1);
                        }
                        KeyCode::Esc => self.controller.clear_focus(),
                        KeyCode::Char('c') => self.request_reactions(),
                        _ => {}
                    }
                }
            }
        }

        self.terminal.show_cursor()?;
        crossterm::terminal::disable_raw_mode()?;
        self.send(RunCommand::Shutdown);
        Ok(())
    }

    fn start_run(&mut self) {
        match self.controller.start(&self.prompt) {
            Ok((run, request)) => {
                info!(run, zones = request.selected_zones.len(), "Starting run");
                self.send(RunCommand::Start { run, request });
            }
            Err(err) => {
                warn!("Cannot start run: {}", err);
                self.ui_state.push_log(format!("Cannot start run: {err}"));
            }
        }
    }

    fn request_reactions(&mut self) {
        match self.controller.session().focused_event() {
            Some(event) => {
                let command = RunCommand::Reactions {
                    run: self.controller.current_run(),
                    event: event.clone(),
                };
                self.send(command);
            }
            None => self.ui_state.push_log("Focus an event first"),
        }
    }

    fn note_outcome(&mut self, outcome: ControllerEvent) {
        match outcome {
            ControllerEvent::Completed => self.ui_state.push_log("Run complete"),
            ControllerEvent::ResetAfterEmptyStream => {
                self.ui_state.push_log("Stream ended with no data; back to idle")
            }
            ControllerEvent::ResetAfterFailure(reason) => {
                self.ui_state.push_log(format!("Run failed: {reason}"))
            }
            ControllerEvent::EndedIncomplete => self
                .ui_state
                .push_log("Stream ended before completion; press r to reset"),
            ControllerEvent::CommentsAttached(false) => {
                self.ui_state.push_log("Reactions arrived for an unknown event")
            }
            _ => {}
        }
    }

    fn send(&self, command: RunCommand) {
        if let Err(err) = self.command_sender.send(command) {
            error!("Failed to reach network task: {}", err);
        }
    }
}
