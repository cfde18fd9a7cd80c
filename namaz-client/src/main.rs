use clap::Parser;
use namaz_client::{Cli, run};

#[tokio::main]
async fn main() -> Result<(), namaz_client::AppError> {
    run(Cli::parse()).await
}
