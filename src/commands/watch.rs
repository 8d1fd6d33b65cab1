use crate::libs::config::Config;
use crate::libs::daemon;
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Stop a watcher running in another terminal
    #[arg(long)]
    stop: bool,
}

/// Watches input activity for the open work session until interrupted or
/// clocked out.
pub async fn cmd(args: WatchArgs) -> Result<()> {
    if args.stop {
        return daemon::stop();
    }

    let config = Config::read()?;
    daemon::run_with_signal_handling(&config).await
}
