#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("fixtures")
            .join(name)
    }

    #[test]
    fn batch_writes_reports() {
        let temp_dir = tempfile::tempdir().expect("failed to create tempdir");
        let output_dir = temp_dir.path().join("reports");

        let output = assert_cmd::cargo::cargo_bin_cmd!("runner_test_batch")
            .arg("--config")
            .arg(fixture("outbreak.json"))
            .arg("--output-dir")
            .arg(&output_dir)
            .arg("--no-stats")
            .output()
            .unwrap();
        assert!(output.status.success());
        let stdout = String::from_utf8(output.stdout).unwrap();
        assert!(stdout.contains("Completed 4 of 4 runs (0 failed, 0 cancelled)"));

        for report in ["aggregate.csv", "flows.csv", "runs.csv", "events.csv"] {
            assert!(output_dir.join(report).exists(), "missing {report}");
        }

        let mut reader = csv::Reader::from_path(output_dir.join("aggregate.csv")).unwrap();
        let header: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
        assert_eq!(header, ["step", "S", "E", "I", "Q", "H", "R", "F"]);
        let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 40);
        assert_eq!(&rows[0][1], "1990");
        assert_eq!(&rows[0][3], "10");

        let mut reader = csv::Reader::from_path(output_dir.join("runs.csv")).unwrap();
        assert_eq!(reader.records().count(), 4 * 40);
    }

    #[test]
    fn overrides_from_command_line() {
        let output = assert_cmd::cargo::cargo_bin_cmd!("runner_test_batch")
            .arg("--config")
            .arg(fixture("outbreak.json"))
            .arg("--nsims")
            .arg("2")
            .arg("--ncores")
            .arg("1")
            .arg("--random-seed")
            .arg("7")
            .arg("--no-stats")
            .output()
            .unwrap();
        assert!(output.status.success());
        let stdout = String::from_utf8(output.stdout).unwrap();
        assert!(stdout.contains("Completed 2 of 2 runs"));
    }

    #[test]
    fn same_seed_same_reports() {
        let temp_dir = tempfile::tempdir().expect("failed to create tempdir");
        let mut outputs = Vec::new();
        for name in ["first", "second"] {
            let output_dir = temp_dir.path().join(name);
            assert_cmd::cargo::cargo_bin_cmd!("runner_test_batch")
                .arg("-c")
                .arg(fixture("outbreak.json"))
                .arg("-o")
                .arg(&output_dir)
                .arg("--no-stats")
                .assert()
                .success();
            outputs.push(std::fs::read_to_string(output_dir.join("runs.csv")).unwrap());
        }
        assert_eq!(outputs[0], outputs[1]);
    }

    #[test]
    fn invalid_configuration_lists_every_issue() {
        let output = assert_cmd::cargo::cargo_bin_cmd!("runner_test_batch")
            .arg("--config")
            .arg(fixture("invalid.json"))
            .output()
            .unwrap();
        assert!(!output.status.success());
        let stderr = String::from_utf8(output.stderr).unwrap();
        assert!(stderr.contains("invalid configuration (3 issues)"), "{stderr}");
        assert!(stderr.contains("nsims"));
        assert!(stderr.contains("param.hosp.rate"));
        assert!(stderr.contains("param.act.rate.x"));
    }

    #[test]
    fn expired_time_budget_cancels_runs() {
        let output = assert_cmd::cargo::cargo_bin_cmd!("runner_test_batch")
            .arg("--config")
            .arg(fixture("outbreak.json"))
            .arg("--time-budget")
            .arg("0s")
            .arg("--no-stats")
            .output()
            .unwrap();
        assert!(output.status.success());
        let stdout = String::from_utf8(output.stdout).unwrap();
        assert!(stdout.contains("Completed 0 of 4 runs (0 failed, 4 cancelled)"));
    }

    #[test]
    fn execution_summary_is_printed() {
        let output = assert_cmd::cargo::cargo_bin_cmd!("runner_test_batch")
            .arg("--config")
            .arg(fixture("outbreak.json"))
            .output()
            .unwrap();
        let stdout = String::from_utf8(output.stdout).unwrap();
        assert!(stdout.contains("Execution Summary"));
        assert!(stdout.contains("Person-steps:"));
    }
}
