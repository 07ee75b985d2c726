fn main() -> anyhow::Result<()> {
    portfolio_server::cli::run_cli()
}
