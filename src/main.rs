use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = configgate::cli::Cli::parse();
    if let Err(e) = configgate::cmd::dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
