//! TapAI agent server binary.
//! Run with: cargo run --bin tapai-server

use std::process::ExitCode;

use tapai_agent::start_tapai_agent;

fn main() -> ExitCode {
    start_tapai_agent::run()
}
