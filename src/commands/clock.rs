use crate::libs::backend;
use crate::libs::config::Config;
use crate::libs::error::ServiceError;
use crate::libs::messages::Message;
use crate::{msg_info, msg_success};
use anyhow::Result;

pub async fn clock_in() -> Result<()> {
    let config = Config::read()?;
    let employee_id = config.employee()?;
    let services = backend::from_config(&config)?;

    match services.work_sessions.clock_in(employee_id).await {
        Ok(session) => {
            msg_success!(Message::ClockedIn(session.id, session.clock_in.format("%H:%M").to_string()));
            Ok(())
        }
        Err(ServiceError::Conflict(_)) => {
            msg_info!(Message::AlreadyClockedIn);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Closes the open work session. Open breaks are closed with it.
pub async fn clock_out() -> Result<()> {
    let config = Config::read()?;
    let employee_id = config.employee()?;
    let services = backend::from_config(&config)?;

    match services.work_sessions.get_active_work_session(employee_id).await? {
        Some(session) => {
            services.work_sessions.clock_out(session.id).await?;
            msg_success!(Message::ClockedOut(session.id));
        }
        None => msg_info!(Message::NotClockedIn),
    }
    Ok(())
}
