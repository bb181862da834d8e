


#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    if let Err(err) = tally::run_with_args(std::env::args()).await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }

    Ok(())
}
