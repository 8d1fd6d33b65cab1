use crate::libs::backend;
use crate::libs::config::Config;
use crate::libs::messages::Message;
use crate::libs::settings::IdleSettings;
use crate::libs::view::View;
use crate::{msg_info, msg_print, msg_warning};
use anyhow::Result;

/// Shows the open work session, its open break and the idle settings.
pub async fn cmd() -> Result<()> {
    let config = Config::read()?;
    let employee_id = config.employee()?;
    let services = backend::from_config(&config)?;

    match services.work_sessions.get_active_work_session(employee_id).await? {
        Some(session) => {
            let active = services.breaks.get_active_break(session.id).await?;
            msg_print!(Message::StatusHeader(employee_id), true);
            View::status(&session, active.as_ref());
        }
        None => msg_info!(Message::NotClockedIn),
    }

    let settings = match services.settings.get_idle_settings(employee_id).await? {
        Some(settings) => settings.sanitized(),
        None => {
            msg_info!(Message::IdleSettingsDefaulted(employee_id));
            IdleSettings::defaults_for(employee_id)
        }
    };
    msg_print!(Message::SettingsHeader, true);
    View::settings(&settings);
    if settings.is_misconfigured() {
        msg_warning!(Message::IdleWarningNeverShown {
            warning: settings.warning_time_minutes,
            threshold: settings.idle_threshold_minutes,
        });
    }
    Ok(())
}
