use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Installs the global compact fmt subscriber. INFO by default, DEBUG when
/// `verbose`. Safe to call more than once; later calls are no-ops.
pub fn init(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(verbose)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
