//! Binary entrypoint that launches the TapAI agent server.

use std::process::ExitCode;

use tapai_agent::start_tapai_agent;

fn main() -> ExitCode {
    start_tapai_agent::run()
}
