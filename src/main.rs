mod app;
mod cli;
mod domain;
mod infra;
mod ui;

use crate::app::{Effect, SessionModel, Visibility};
use crate::cli::{CliInvocation, RunOptions, parse_invocation, print_help, print_version};
use crate::domain::{COMMAND_KILL, ControlMessage};
use crate::infra::{
    Role, build_program_index, determine_role, execute_program, resolve_control_port,
    resolve_search_path, send_command, serve,
};
use crate::ui::{DisplaySurface, HeadlessSurface, IdleInputSource, InputSource};
use std::net::TcpListener as StdTcpListener;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::time::MissedTickBehavior;

const TICK_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
enum MainError {
    #[error(transparent)]
    Cli(#[from] crate::cli::CliParseError),

    #[error(transparent)]
    DetermineRole(#[from] crate::infra::DetermineRoleError),

    #[error("failed to build tokio runtime: {0}")]
    Runtime(std::io::Error),
}

fn main() {
    if let Err(error) = run_main() {
        eprintln!("tapd: {error}");
        std::process::exit(1);
    }
}

fn run_main() -> Result<(), MainError> {
    let argv = std::env::args().collect::<Vec<_>>();
    match parse_invocation(&argv)? {
        CliInvocation::PrintHelp => {
            print_help();
            Ok(())
        }
        CliInvocation::PrintVersion => {
            print_version();
            Ok(())
        }
        CliInvocation::Run(opts) => run(&opts),
    }
}

fn run(opts: &RunOptions) -> Result<(), MainError> {
    let port = opts.port.unwrap_or_else(resolve_control_port);
    match determine_role(port)? {
        Role::Secondary(mut stream) => {
            // Forward one command and exit no matter what.
            if let Err(error) = send_command(&mut stream, opts.forwarded_command()) {
                eprintln!("tapd: {error}");
            }
            Ok(())
        }
        Role::Primary(listener) => run_primary(listener, opts),
    }
}

fn run_primary(listener: StdTcpListener, opts: &RunOptions) -> Result<(), MainError> {
    let search_path = resolve_search_path();
    let index = build_program_index(&search_path, opts.walk);
    eprintln!(
        "tapd: indexed {} programs from {} search-path directories",
        index.len(),
        search_path.len()
    );

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(MainError::Runtime)?;
    rt.block_on(async move {
        let (tx, rx) = unbounded_channel::<ControlMessage>();
        let serve_tx = tx.clone();
        tokio::spawn(async move {
            if let Err(error) = serve(listener, serve_tx).await {
                eprintln!("tapd: {error}");
            }
        });

        let model = SessionModel::new(index);
        let mut surface = HeadlessSurface;
        let mut input = IdleInputSource;
        run_session(model, rx, tx, &mut surface, &mut input).await;
    });
    Ok(())
}

/// The interactive loop. Single consumer of the control channel and sole
/// writer of the session state; it handles one event to completion before
/// looking at the next. While hidden it parks on the channel alone, so no
/// input is polled and no ticks fire.
async fn run_session(
    mut model: SessionModel,
    mut rx: UnboundedReceiver<ControlMessage>,
    tx: UnboundedSender<ControlMessage>,
    surface: &mut impl DisplaySurface,
    input: &mut impl InputSource,
) {
    let mut ticker = tokio::time::interval(TICK_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let effects = match model.visibility() {
            Visibility::Active => {
                tokio::select! {
                    message = rx.recv() => match message {
                        Some(message) => on_control(&mut model, &message),
                        None => return,
                    },
                    _ = ticker.tick() => {
                        // Drain the input source before the redraw.
                        let mut effects = Vec::new();
                        while let Some(event) = input.poll_event() {
                            effects.extend(model.apply_input(event));
                        }
                        effects.extend(model.tick());
                        effects
                    }
                }
            }
            Visibility::Hidden => match rx.recv().await {
                Some(message) => on_control(&mut model, &message),
                None => return,
            },
        };

        for effect in effects {
            if apply_effect(&model, effect, surface, &tx) == Flow::Terminate {
                return;
            }
        }
    }
}

fn on_control(model: &mut SessionModel, message: &ControlMessage) -> Vec<Effect> {
    if message.command == COMMAND_KILL {
        eprintln!("tapd: received kill signal");
    }
    model.apply_control(message)
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Flow {
    Continue,
    Terminate,
}

fn apply_effect(
    model: &SessionModel,
    effect: Effect,
    surface: &mut impl DisplaySurface,
    tx: &UnboundedSender<ControlMessage>,
) -> Flow {
    match effect {
        Effect::Render => surface.render(model.typed_text(), model.suggestion()),
        Effect::SetDisplayText(text) => surface.set_display_text(&text),
        Effect::ShowSurface => surface.set_visible(true),
        Effect::HideSurface => surface.set_visible(false),
        Effect::Execute(name) => {
            if let Err(error) = execute_program(&name) {
                eprintln!("tapd: {error}");
            }
        }
        Effect::SendSelf(command) => {
            // Unbounded channel: never blocks the loop.
            let _ = tx.send(ControlMessage::new(command));
        }
        Effect::Terminate => return Flow::Terminate,
    }
    Flow::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ProgramIndex;
    use crate::infra::WalkPolicy;
    use crate::ui::{InputEvent, KeyEvent};
    use std::collections::VecDeque;
    use std::io::Read as _;
    use std::net::{Ipv4Addr, TcpListener};

    #[derive(Debug, Default)]
    struct RecordingSurface {
        visible: Vec<bool>,
        renders: Vec<(String, String)>,
        display: Vec<String>,
    }

    impl DisplaySurface for RecordingSurface {
        fn set_visible(&mut self, visible: bool) {
            self.visible.push(visible);
        }

        fn render(&mut self, typed: &str, suggestion: &str) {
            self.renders.push((typed.to_string(), suggestion.to_string()));
        }

        fn set_display_text(&mut self, text: &str) {
            self.display.push(text.to_string());
        }
    }

    #[derive(Debug, Default)]
    struct ScriptedInput {
        events: VecDeque<InputEvent>,
    }

    impl InputSource for ScriptedInput {
        fn poll_event(&mut self) -> Option<InputEvent> {
            self.events.pop_front()
        }
    }

    #[test]
    fn secondary_invocation_sends_exactly_one_command_and_returns() {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).expect("bind");
        let port = listener.local_addr().expect("addr").port();

        let opts = RunOptions {
            command: Some("hide".to_string()),
            port: Some(port),
            walk: WalkPolicy::Recursive,
        };
        let sender = std::thread::spawn(move || run(&opts));

        let (mut conn, _peer) = listener.accept().expect("accept");
        let mut payload = String::new();
        conn.read_to_string(&mut payload).expect("read");
        let message: ControlMessage = serde_json::from_str(&payload).expect("decode");
        assert_eq!(message.command, "hide");

        sender.join().expect("join").expect("secondary run");
    }

    #[tokio::test]
    async fn session_loop_hides_after_enter_and_stops_on_kill() {
        let (tx, rx) = unbounded_channel::<ControlMessage>();
        let model = SessionModel::new(ProgramIndex::default());
        let mut surface = RecordingSurface::default();
        let mut input = ScriptedInput {
            events: VecDeque::from([
                InputEvent::Key(KeyEvent::Char('x')),
                InputEvent::Unrecognized,
                InputEvent::Key(KeyEvent::Enter),
            ]),
        };

        let killer = tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            let _ = killer.send(ControlMessage::new("kill"));
        });

        run_session(model, rx, tx, &mut surface, &mut input).await;

        // Enter self-sent "hide"; the loop then parked hidden until kill.
        assert_eq!(surface.visible, vec![false]);
        assert!(!surface.renders.is_empty());
    }

    #[tokio::test]
    async fn show_after_hide_renders_a_cleared_entry() {
        let (tx, rx) = unbounded_channel::<ControlMessage>();
        let model = SessionModel::new(ProgramIndex::default());
        let mut surface = RecordingSurface::default();
        let mut input = ScriptedInput::default();

        let driver = tx.clone();
        tokio::spawn(async move {
            let _ = driver.send(ControlMessage::new("hide"));
            let _ = driver.send(ControlMessage::new("show"));
            let _ = driver.send(ControlMessage::new("kill"));
        });

        run_session(model, rx, tx, &mut surface, &mut input).await;

        assert_eq!(surface.visible, vec![false, true]);
        assert_eq!(
            surface.renders.first(),
            Some(&(String::new(), String::new()))
        );
    }

    #[tokio::test]
    async fn legacy_commands_pass_through_to_the_display() {
        let (tx, rx) = unbounded_channel::<ControlMessage>();
        let model = SessionModel::new(ProgramIndex::default());
        let mut surface = RecordingSurface::default();
        let mut input = ScriptedInput::default();

        let driver = tx.clone();
        tokio::spawn(async move {
            let _ = driver.send(ControlMessage::new("hello"));
            let _ = driver.send(ControlMessage::new("kill"));
        });

        run_session(model, rx, tx, &mut surface, &mut input).await;

        assert_eq!(surface.display, vec!["hello".to_string()]);
    }
}
