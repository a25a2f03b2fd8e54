use std::process::ExitCode;

fn main() -> ExitCode {
    scriptpack::run()
}
