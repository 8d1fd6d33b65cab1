use crate::db::break_sessions::BreakSessions;
use crate::db::db::Db;
use crate::libs::backend;
use crate::libs::config::Config;
use crate::libs::messages::Message;
use crate::libs::view::View;
use crate::{msg_info, msg_print};
use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::Args;

#[derive(Debug, Args)]
pub struct BreaksArgs {
    #[arg(long, short, default_value = "today", help = "Date to fetch breaks for (YYYY-MM-DD or 'today')")]
    date: String,
}

/// Prints the break sessions of a day.
///
/// With the local database every break of that date is listed. The clinic
/// server only exposes breaks per work session, so there the open work
/// session's breaks are filtered by date.
pub async fn cmd(args: BreaksArgs) -> Result<()> {
    let date = parse_date(&args.date)?;
    let config = Config::read()?;

    let breaks = match &config.server {
        None => BreakSessions::new(&Db::new()?).breaks_for_date(date)?,
        Some(_) => {
            let employee_id = config.employee()?;
            let services = backend::from_config(&config)?;
            match services.work_sessions.get_active_work_session(employee_id).await? {
                Some(session) => services
                    .breaks
                    .list_breaks(session.id)
                    .await?
                    .into_iter()
                    .filter(|b| b.start.date() == date)
                    .collect(),
                None => Vec::new(),
            }
        }
    };

    if breaks.is_empty() {
        msg_info!(Message::BreaksNotFound(date.format("%Y-%m-%d").to_string()));
        return Ok(());
    }

    msg_print!(Message::BreaksHeader(date.format("%Y-%m-%d").to_string()), true);
    View::breaks(&breaks);
    Ok(())
}

pub fn parse_date(date_str: &str) -> Result<NaiveDate> {
    if date_str.to_lowercase() == "today" {
        Ok(Local::now().date_naive())
    } else {
        Ok(NaiveDate::parse_from_str(date_str, "%Y-%m-%d")?)
    }
}
