use std::process::ExitCode;

fn main() -> ExitCode {
    genai_docs::cli::run()
}
