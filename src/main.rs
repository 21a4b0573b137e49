mod audio;
mod cli;
mod collectors;
mod core;
mod logging;
mod providers;

use crate::core::terminal;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run_main().await {
        terminal::print_error(&format!("{}", e));
        std::process::exit(1);
    }
}
