//! Unit tests for command-line parsing

use super::commands::Cli;
use clap::Parser;
use std::path::Path;

#[test]
fn test_defaults() {
    let cli = Cli::try_parse_from(["portfolio-server"]).unwrap();
    assert_eq!(cli.bind, "0.0.0.0");
    assert_eq!(cli.site_root, Path::new("site"));
    assert_eq!(cli.iex_fallback_dir, Path::new("resources/exampleData"));
    assert_eq!(cli.iex_base_url, crate::market::DEFAULT_BASE_URL);
}

#[test]
fn test_all_options() {
    let cli = Cli::try_parse_from([
        "portfolio-server",
        "--port",
        "9000",
        "--bind",
        "127.0.0.1",
        "--password-file",
        "/etc/portfolio/password",
        "--site-root",
        "/srv/site",
        "--portfolio-db",
        "/var/lib/portfolio.json",
        "--iex-token",
        "pk_test",
        "--iex-base-url",
        "https://sandbox.iexapis.com/stable",
        "--iex-fallback-dir",
        "/srv/cache",
    ])
    .unwrap();

    assert_eq!(cli.port, 9000);
    assert_eq!(cli.bind, "127.0.0.1");
    assert_eq!(cli.password_file, Path::new("/etc/portfolio/password"));
    assert_eq!(cli.site_root, Path::new("/srv/site"));
    assert_eq!(cli.portfolio_db, Path::new("/var/lib/portfolio.json"));
    assert_eq!(cli.iex_token.as_deref(), Some("pk_test"));
    assert_eq!(cli.iex_base_url, "https://sandbox.iexapis.com/stable");
    assert_eq!(cli.iex_fallback_dir, Path::new("/srv/cache"));
}

#[test]
fn test_invalid_port_is_rejected() {
    assert!(Cli::try_parse_from(["portfolio-server", "--port", "70000"]).is_err());
    assert!(Cli::try_parse_from(["portfolio-server", "--port", "eighty"]).is_err());
}

#[test]
fn test_unknown_flag_is_rejected() {
    assert!(Cli::try_parse_from(["portfolio-server", "--spec", "x.yaml"]).is_err());
}
