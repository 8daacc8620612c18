//! Console input driver: stdin commands mapped to input frames

use std::str::FromStr;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{DirectionalInput, InputFrame, InputReader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl FromStr for Direction {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "up" | "w" => Ok(Self::Up),
            "down" | "s" => Ok(Self::Down),
            "left" | "a" => Ok(Self::Left),
            "right" | "d" => Ok(Self::Right),
            other => Err(InputError::UnknownDirection(other.to_string())),
        }
    }
}

/// One console command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Press(Direction),
    Release(Direction),
    /// Release every direction
    Stop,
    Engage(Option<String>),
    Exit,
    Join(String),
    Quit,
}

impl FromStr for Command {
    type Err = InputError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let head = words.next().ok_or(InputError::Empty)?;
        let arg = words.next().map(str::to_string);

        if let Some(dir) = head.strip_prefix('+') {
            return dir.parse().map(Self::Press);
        }
        if let Some(dir) = head.strip_prefix('-') {
            return dir.parse().map(Self::Release);
        }

        match head {
            "stop" => Ok(Self::Stop),
            "engage" | "select" => Ok(Self::Engage(arg)),
            "exit" | "esc" => Ok(Self::Exit),
            "join" => arg.map(Self::Join).ok_or(InputError::MissingArgument("join")),
            "quit" => Ok(Self::Quit),
            other => Err(InputError::UnknownCommand(other.to_string())),
        }
    }
}

/// Input reader fed by stdin lines
///
/// Held directions persist across frames until released; one-shot
/// commands (engage, exit, join, quit) apply to the next frame only.
pub struct ConsoleInput {
    commands: mpsc::UnboundedReceiver<Command>,
    held: DirectionalInput,
}

impl ConsoleInput {
    /// Spawn the stdin reader task
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(cmd) => {
                        if tx.send(cmd).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!(error = %e, "Ignoring console input"),
                }
            }
            debug!("Console input closed");
        });
        Self::from_channel(rx)
    }

    pub fn from_channel(commands: mpsc::UnboundedReceiver<Command>) -> Self {
        Self {
            commands,
            held: DirectionalInput::default(),
        }
    }

    fn apply(&mut self, frame: &mut InputFrame, command: Command) {
        match command {
            Command::Press(dir) => set_direction(&mut self.held, dir, true),
            Command::Release(dir) => set_direction(&mut self.held, dir, false),
            Command::Stop => self.held = DirectionalInput::default(),
            Command::Engage(target) => frame.engage = Some(target),
            Command::Exit => frame.exit = true,
            Command::Join(key) => frame.room_key = Some(key),
            Command::Quit => frame.quit = true,
        }
    }
}

impl InputReader for ConsoleInput {
    fn read(&mut self) -> InputFrame {
        let mut frame = InputFrame::default();
        while let Ok(command) = self.commands.try_recv() {
            self.apply(&mut frame, command);
        }
        frame.directions = self.held;
        frame
    }
}

fn set_direction(input: &mut DirectionalInput, dir: Direction, down: bool) {
    match dir {
        Direction::Up => input.up = down,
        Direction::Down => input.down = down,
        Direction::Left => input.left = down,
        Direction::Right => input.right = down,
    }
}

/// Console parsing errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("Empty command")]
    Empty,

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Unknown direction: {0}")]
    UnknownDirection(String),

    #[error("Command `{0}` needs an argument")]
    MissingArgument(&'static str),
}
