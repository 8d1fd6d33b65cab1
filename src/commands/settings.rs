use crate::libs::backend;
use crate::libs::config::Config;
use crate::libs::messages::Message;
use crate::libs::settings::{IdleSettings, IdleSettingsPatch};
use crate::libs::view::View;
use crate::{msg_bail_anyhow, msg_print, msg_success, msg_warning};
use anyhow::Result;
use clap::Args;

#[derive(Debug, Args)]
pub struct SettingsArgs {
    /// Minutes without input before going idle
    #[arg(long)]
    threshold: Option<f64>,
    /// Minutes before the threshold at which the warning appears
    #[arg(long)]
    warning: Option<f64>,
    #[arg(long)]
    show_warning: Option<bool>,
    #[arg(long)]
    enabled: Option<bool>,
    /// End idle automatically when input resumes
    #[arg(long)]
    auto_end: Option<bool>,
}

impl SettingsArgs {
    fn patch(&self) -> IdleSettingsPatch {
        IdleSettingsPatch {
            idle_threshold_minutes: self.threshold,
            warning_time_minutes: self.warning,
            show_idle_warning: self.show_warning,
            enabled: self.enabled,
            auto_end_idle_on_activity: self.auto_end,
        }
    }
}

/// Shows the idle settings, or updates them when any option is given.
pub async fn cmd(args: SettingsArgs) -> Result<()> {
    let config = Config::read()?;
    let employee_id = config.employee()?;
    let services = backend::from_config(&config)?;
    let patch = args.patch();

    if let Some(threshold) = patch.idle_threshold_minutes {
        if !threshold.is_finite() || threshold <= 0.0 {
            msg_bail_anyhow!(Message::InvalidSettingValue("threshold".to_string(), threshold));
        }
    }
    if let Some(warning) = patch.warning_time_minutes {
        if !warning.is_finite() || warning < 0.0 {
            msg_bail_anyhow!(Message::InvalidSettingValue("warning".to_string(), warning));
        }
    }

    let mut settings = match services.settings.get_idle_settings(employee_id).await? {
        Some(settings) => settings,
        None => {
            services
                .settings
                .create_idle_settings(employee_id, &IdleSettings::defaults_for(employee_id))
                .await?
        }
    };

    if !patch.is_empty() {
        let settings_id = match settings.id {
            Some(id) => id,
            None => msg_bail_anyhow!(Message::SettingsRecordMissing(employee_id)),
        };
        services.settings.update_idle_settings(settings_id, &patch).await?;
        settings.apply(&patch);
        msg_success!(Message::SettingsUpdated);
    }

    let settings = settings.sanitized();
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
