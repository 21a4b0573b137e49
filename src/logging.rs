use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Initialize standard structured logging for the whole run.
pub fn init() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok(); // Ignore err if already set
}
