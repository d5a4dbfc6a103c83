use std::process::ExitCode;

fn main() -> ExitCode {
    match seiqhrf::runner::run() {
        Ok(result) if result.failures.is_empty() => ExitCode::SUCCESS,
        // Reports were still written for the runs that completed.
        Ok(_) => ExitCode::from(2),
        Err(error) => {
            eprintln!("{error}");
            ExitCode::FAILURE
        }
    }
}
