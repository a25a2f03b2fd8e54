//! Result reporter: exit code plus diagnostic lines for one outcome.

use std::io::{self, IsTerminal, Write};

use scriptpack_core::config::LauncherConfig;
use scriptpack_runtime::ExitOutcome;

/// Write the outcome's diagnostics to `out` and return the process exit code.
///
/// `ScriptFailed` prints every entry in order, one per line. `BootstrapFailed`
/// prints the cause followed by its trace.
pub fn report<W: Write>(outcome: &ExitOutcome, out: &mut W) -> u8 {
    let written = match outcome {
        ExitOutcome::Success => Ok(()),
        ExitOutcome::ScriptFailed(entries) => entries
            .iter()
            .try_for_each(|entry| writeln!(out, "{}", entry)),
        ExitOutcome::BootstrapFailed(err) => {
            writeln!(out, "FATAL ERROR: {}", err).and_then(|_| {
                err.trace()
                    .iter()
                    .try_for_each(|line| writeln!(out, "    {}", line))
            })
        }
    };
    if let Err(e) = written.and_then(|_| out.flush()) {
        tracing::warn!("Failed to write diagnostics: {}", e);
    }
    outcome.exit_code()
}

/// Keep a console window open after a fatal error so the message can be read.
///
/// Only when both stdin and stderr are terminals and SCRIPTPACK_NO_PAUSE is not set.
pub fn hold_if_interactive(config: &LauncherConfig) {
    if !config.pause_on_fatal || !io::stdin().is_terminal() || !io::stderr().is_terminal() {
        return;
    }
    eprint!("Press Enter to exit...");
    let _ = io::stderr().flush();
    let mut line = String::new();
    let _ = io::stdin().read_line(&mut line);
}
