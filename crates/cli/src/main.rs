use std::process::ExitCode;

fn main() -> ExitCode {
    partline_cli::run()
}
