//! # MathNotes CLI
//!
//! A thin terminal client over the `mathnotesapp` persistence core. This file only
//! invokes `cli::run()` and handles process termination; everything else lives in
//! `src/cli/`.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (crates/mathnotes/src/cli/)                      │
//! │  - clap argument parsing (setup.rs)                         │
//! │  - Selector resolution + dispatch (commands.rs)             │
//! │  - Terminal rendering (render.rs)                           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  mathnotesapp::coordinator::PersistenceCoordinator          │
//! │  - Every mutation, debounce and flush                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! A CLI process is short-lived, so it never waits out the debounce. Each mutating
//! command runs inside a `SuspendGuard` and the pending flush happens as the command
//! returns, exactly as it would when a GUI host goes to the background.

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
