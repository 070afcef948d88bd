use super::console;
use awtrix_sync_core::config::Config;
use awtrix_sync_core::scheduler::{Command, Scheduler};
use std::sync::Arc;
use std::time::Duration;

/// Run cycles on the configured interval until `q` or Ctrl-C.
pub fn run(config: &Config) -> anyhow::Result<()> {
    let engine = Arc::new(super::build_engine(config)?);
    let interval = config.interval();
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async move {
        let mut handle = Scheduler::start(engine, interval);

        tokio::spawn(console::read_commands(handle.commands()));

        let commands = handle.commands();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received; finishing current cycle");
                let _ = commands.send(Command::Shutdown).await;
            }
        });

        println!("Type 'u' + Enter to update now, 'q' + Enter to quit.");
        // Each report has already been summarised in the log.
        while handle.next_report().await.is_some() {}
        handle.join().await;
    });

    // The stdin reader sits on a blocking thread that never returns on its own.
    rt.shutdown_timeout(Duration::from_millis(100));
    Ok(())
}
