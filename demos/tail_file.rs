//! # Example: tail_file
//!
//! Tails one or more files to stdout until Ctrl-C.
//!
//! Demonstrates how to:
//! - Build a `TailCoordinator` with the built-in `LogWriter` subscriber.
//! - Start a tail per command-line path through a `CoordinatorHandle`.
//! - Print reported text as it arrives, prefixed with the file it came from.
//! - Shut down gracefully on a termination signal.
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► TailCoordinator::builder(cfg).with_subscribers([LogWriter]).build()
//!   ├─► for each path: handle.start_tail(path, ReportFn(print))
//!   │       └─► TailWorker: snapshot, then appends as they happen
//!   └─► coordinator.run()  (waits for SIGINT/SIGTERM, then shutdown with grace)
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=tailvisor=debug cargo run --example tail_file --features logging -- /var/log/syslog
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration};

use tailvisor::{Config, LogWriter, ReportFn, Subscribe, TailCoordinator};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tailvisor=info")),
        )
        .init();

    let paths: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    if paths.is_empty() {
        eprintln!("usage: tail_file <path>...");
        std::process::exit(2);
    }

    // 1) Configure runtime
    let cfg = Config {
        grace: Duration::from_secs(5),
        report_stop: true,
        ..Config::default()
    };

    // 2) Subscribers: render runtime events through tracing
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let coordinator = TailCoordinator::builder(cfg).with_subscribers(subs).build();

    // 3) One tail per path, each printing with its own prefix
    let handle = coordinator.handle();
    for path in paths {
        let prefix = path.display().to_string();
        let report = ReportFn::arc(move |text: String| {
            for line in text.lines() {
                println!("[{prefix}] {line}");
            }
        });
        handle.start_tail(path, report).await?;
    }

    // 4) Run until a termination signal arrives
    coordinator.run().await?;
    Ok(())
}
