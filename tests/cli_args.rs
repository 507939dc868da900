//! Integration tests for CLI argument handling
//!
//! Covers usage errors that must be reported before any network call.

use std::process::Command;

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_fingerbank"))
        .args(args)
        .env_remove("FINGERBANK_API_KEY")
        .output()
        .expect("Failed to execute fingerbank")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(
        output.status.success(),
        "Expected --help to exit successfully"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("fingerbank"), "Help should mention fingerbank");
    assert!(stdout.contains("interrogate"), "Help should list interrogate");
    assert!(stdout.contains("--no-cache"), "Help should mention --no-cache");
}

#[test]
fn test_missing_api_key_prints_error_and_exits() {
    let output = run_cli(&["--no-cache", "device", "1"]);
    assert!(!output.status.success(), "Expected missing key to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("API key"),
        "Should print error message about the API key: {}",
        stderr
    );
}

#[test]
fn test_api_key_from_environment_is_accepted() {
    // Empty interrogation fails after the key check, proving the env var was read
    let output = Command::new(env!("CARGO_BIN_EXE_fingerbank"))
        .args(["--no-cache", "interrogate"])
        .env("FINGERBANK_API_KEY", "secret")
        .output()
        .expect("Failed to execute fingerbank");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("interrogation"),
        "Should complain about the empty interrogation: {}",
        stderr
    );
}

#[test]
fn test_empty_interrogation_is_rejected() {
    let output = run_cli(&["--api-key", "secret", "--no-cache", "interrogate"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--dhcp-fingerprint"), "stderr: {}", stderr);
}

#[test]
fn test_invalid_device_id_is_rejected() {
    let output = run_cli(&["--api-key", "secret", "device", "not-a-number"]);
    assert!(!output.status.success());
}

#[test]
fn test_subcommand_is_required() {
    let output = run_cli(&["--api-key", "secret"]);
    assert!(!output.status.success());
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use clap::Parser;
    use fingerbank::cli::{Cli, Command, StartupConfig};

    #[test]
    fn test_cli_interrogate_with_all_parameters() {
        let cli = Cli::parse_from([
            "fingerbank",
            "--api-key",
            "secret",
            "interrogate",
            "--dhcp-fingerprint",
            "1,15,3,6",
            "--mac",
            "aa:bb:cc:dd:ee:ff",
            "--user-agent",
            "Mozilla/5.0",
        ]);

        let params = cli.command.interrogate_params().unwrap();
        assert_eq!(params.dhcp_fingerprint.as_deref(), Some("1,15,3,6"));
        assert_eq!(params.mac.as_deref(), Some("aa:bb:cc:dd:ee:ff"));
        assert_eq!(params.user_agents, vec!["Mozilla/5.0".to_string()]);
    }

    #[test]
    fn test_startup_config_keeps_command() {
        let cli = Cli::parse_from(["fingerbank", "--api-key", "secret", "--no-cache", "account"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(config.command, Command::Account);
    }

    #[test]
    fn test_startup_config_custom_base_url() {
        let cli = Cli::parse_from([
            "fingerbank",
            "--api-key",
            "secret",
            "--no-cache",
            "--base-url",
            "http://localhost:8080/api/v2/",
            "account",
        ]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(config.client.base_url, "http://localhost:8080/api/v2");
    }
}
