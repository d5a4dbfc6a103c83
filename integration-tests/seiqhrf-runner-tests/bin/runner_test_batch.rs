use std::process::ExitCode;

use seiqhrf::info;
use seiqhrf::runner::run;

fn main() -> ExitCode {
    match run() {
        Ok(result) => {
            info!("runner_test_batch finished with {} runs", result.runs.len());
            if result.failures.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2)
            }
        }
        Err(error) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}
