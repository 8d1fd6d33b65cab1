use crate::libs::backend;
use crate::libs::config::Config;
use crate::libs::messages::Message;
use crate::libs::services::BreakRequest;
use crate::{msg_bail_anyhow, msg_info, msg_success};
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Debug, Args)]
pub struct BreakArgs {
    #[command(subcommand)]
    action: BreakAction,
}

#[derive(Debug, Subcommand)]
enum BreakAction {
    #[command(about = "Start a manual break")]
    Start {
        /// Note stored with the break
        #[arg(long, short)]
        reason: Option<String>,
    },
    #[command(about = "End the open break")]
    End,
}

pub async fn cmd(args: BreakArgs) -> Result<()> {
    let config = Config::read()?;
    let employee_id = config.employee()?;
    let services = backend::from_config(&config)?;

    let session = match services.work_sessions.get_active_work_session(employee_id).await? {
        Some(session) => session,
        None => msg_bail_anyhow!(Message::NotClockedIn),
    };
    let active = services.breaks.get_active_break(session.id).await?;

    match args.action {
        BreakAction::Start { reason } => match active {
            Some(open) => msg_info!(Message::BreakAlreadyInProgress(open.id, open.trigger.to_string())),
            None => {
                let id = services.breaks.start_break(session.id, &BreakRequest::manual(reason)).await?;
                msg_success!(Message::BreakStarted(id));
            }
        },
        BreakAction::End => match active {
            Some(open) => {
                services.breaks.end_break(open.id).await?;
                msg_success!(Message::BreakEnded(open.id));
            }
            None => msg_info!(Message::NoActiveBreak),
        },
    }
    Ok(())
}
