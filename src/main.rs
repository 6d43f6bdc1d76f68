// src/main.rs
use std::process::ExitCode;

use tacc::{
    cli::{Invocation, usage},
    compiler::compile_invocation,
    config::CompilerConfig,
};

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let invocation = Invocation::from_args(&args);
    if invocation.files.is_empty() {
        eprint!("{}", usage());
        return ExitCode::from(2);
    }

    let (config, output) = match compile_invocation(&invocation, CompilerConfig::from_env()) {
        Ok(done) => done,
        Err(e) => {
            eprintln!("fatal: {e:#}");
            return ExitCode::from(3);
        }
    };

    if config.emit_json {
        match output.to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("fatal: cannot encode output: {e}");
                return ExitCode::from(3);
            }
        }
    } else {
        print!("{}", output.render_text());
    }

    if output.has_errors() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
