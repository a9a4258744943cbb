//! CLI domain: parse, route, output, presentation and scenario replay.

mod output;
mod parse;
mod presentation;
mod route;
pub mod scenario;

pub use output::map_error;
pub use parse::{Cli, Commands};
pub use presentation::{format_report_json, format_report_text};
pub use route::RunContext;
pub use scenario::{run_scenario, Scenario, ScenarioReport, Step, StepOp};
