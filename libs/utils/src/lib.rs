use std::env;
use std::io;

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber. `RUST_LOG` wins over `env_filter` when set.
pub fn set_log(env_filter: String) {
    let _ = env::var("RUST_LOG").is_err_and(|_| {
        env::set_var("RUST_LOG", env_filter);
        true
    });
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .compact()
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_target(true)
        .init();
}

/// Map a `-v` count to a level: warn, info, debug, then trace.
pub fn verbosity_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Filter directive enabling `level` for the binary's target and the `mjr`
/// library.
pub fn log_filter(target: &str, level: impl std::fmt::Display) -> String {
    format!("{target}={level},mjr={level}")
}

#[cfg(unix)]
async fn wait_for_signal_impl() -> io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;

    Ok(tokio::select! {
        _ = terminate.recv() => "SIGTERM",
        _ = interrupt.recv() => "SIGINT",
    })
}

#[cfg(windows)]
async fn wait_for_signal_impl() -> io::Result<&'static str> {
    use tokio::signal::windows;

    let mut ctrl_c = windows::ctrl_c()?;
    let mut ctrl_break = windows::ctrl_break()?;
    let mut ctrl_close = windows::ctrl_close()?;

    Ok(tokio::select! {
        _ = ctrl_c.recv() => "CTRL_C",
        _ = ctrl_break.recv() => "CTRL_BREAK",
        _ = ctrl_close.recv() => "CTRL_CLOSE",
    })
}

/// Resolves with the name of the first shutdown signal received.
pub async fn wait_for_stop_signal() -> io::Result<&'static str> {
    wait_for_signal_impl().await
}
