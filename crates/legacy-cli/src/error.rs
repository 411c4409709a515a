//! Exit codes for the CLI (spec §6): the worst aggregated state of a run
//! maps to a single process exit code.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    ConfigError = 2,
    DiscoveryError = 3,
    TerminalAnalysisError = 4,
    Interrupted = 130,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}
