#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    fn config() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("fixtures")
            .join("outbreak.json")
    }

    #[test]
    fn module_log_levels() {
        let output = assert_cmd::cargo::cargo_bin_cmd!("runner_test_batch")
            .arg("--config")
            .arg(config())
            .arg("--log-level")
            .arg("seiqhrf::batch=Debug,seiqhrf::engine=Trace")
            .arg("--nsims")
            .arg("1")
            .arg("--no-stats")
            .output()
            .unwrap();
        let stdout = String::from_utf8(output.stdout).unwrap();
        assert!(stdout.contains("Logging enabled for seiqhrf::batch at level DEBUG"));
        assert!(stdout.contains("Logging enabled for seiqhrf::engine at level TRACE"));
        assert!(stdout.contains("DEBUG seiqhrf::batch - run 0 completed"));
        assert!(stdout.contains("TRACE seiqhrf::engine - step 1: counts"));
        // No global level, so other modules stay quiet.
        assert!(!stdout.contains("seiqhrf::config"));
    }

    #[test]
    fn verbosity_levels() {
        let output = assert_cmd::cargo::cargo_bin_cmd!("runner_test_batch")
            .arg("--config")
            .arg(config())
            .arg("-v")
            .arg("--no-stats")
            .output()
            .unwrap();
        let stdout = String::from_utf8(output.stdout).unwrap();
        assert!(stdout.contains("Logging enabled at level INFO"));
        assert!(stdout.contains("INFO seiqhrf::batch - executing 4 runs"));
        assert!(!stdout.contains("DEBUG"));

        let output = assert_cmd::cargo::cargo_bin_cmd!("runner_test_batch")
            .arg("--config")
            .arg(config())
            .arg("-vv")
            .arg("--no-stats")
            .output()
            .unwrap();
        let stdout = String::from_utf8(output.stdout).unwrap();
        assert!(stdout.contains("DEBUG seiqhrf::run - run 0 starting"));
        assert!(!stdout.contains("TRACE"));
    }

    #[test]
    fn malformed_log_level_fails() {
        assert_cmd::cargo::cargo_bin_cmd!("runner_test_batch")
            .arg("--config")
            .arg(config())
            .arg("--log-level")
            .arg("loud")
            .assert()
            .failure();
    }
}
