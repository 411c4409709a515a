//! `control` subcommand: pause/resume/stop signals for a running workflow
//! (spec §4.11 `WorkflowControl`).
//!
//! `WorkflowControl` is an in-process handle held by the `analyze`
//! invocation that started a run. Distributed execution across hosts or
//! processes is out of scope, so there is no channel for a separate
//! `legacy-discover control` invocation to reach into another process's
//! scheduler. This command states that boundary rather than silently
//! no-opping; use `--interactive` on `analyze` for in-session control, or
//! send SIGINT to stop a run gracefully.

use anyhow::Result;
use clap::{Args, ValueEnum};

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum ControlAction {
    Pause,
    Resume,
    Stop,
}

#[derive(Args, Clone, Debug)]
pub struct ControlArgs {
    #[arg(value_enum)]
    pub action: ControlAction,
}

pub async fn run(args: ControlArgs) -> Result<()> {
    println!(
        "workflow control ({:?}) is only reachable from within the process running `analyze`; \
         this CLI does not support controlling another process's run.",
        args.action
    );
    Ok(())
}
