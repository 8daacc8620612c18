//! Client application: session state and the tick loop

pub mod client;
pub mod state;

pub use client::Client;
