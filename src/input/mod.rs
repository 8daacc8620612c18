//! Input sampling: per-tick frames produced by an input device

pub mod console;

pub use console::ConsoleInput;

/// Four independent direction keys
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectionalInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

/// Everything the player asked for during one tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputFrame {
    pub directions: DirectionalInput,
    /// Select action; `Some(None)` targets the first highlighted object
    pub engage: Option<Option<String>>,
    /// Cancel key
    pub exit: bool,
    /// Room key entered in the lobby form
    pub room_key: Option<String>,
    pub quit: bool,
}

/// Source of input frames, sampled once per tick
pub trait InputReader {
    fn read(&mut self) -> InputFrame;
}
