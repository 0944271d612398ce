//! `hanami` binary.
//!
//! Boots an application without slices: outside the test environment it
//! answers every request with the welcome page. Applications embed the
//! library and call [`hanami::cli::run`] with their own builder.

use clap::Parser;

use hanami::application::Application;
use hanami::cli::{self, Cli};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    cli::run(cli, Application::builder).await?;
    Ok(())
}
