use super::coordinator::IdleSessionState;
use super::formatter::{format_duration, format_minutes, format_std_duration, FormattedBreak};
use super::services::{BreakSession, WorkSession};
use super::settings::IdleSettings;
use prettytable::{row, Table};

pub struct View {}

impl View {
    pub fn format_breaks(breaks: &[BreakSession]) -> Vec<FormattedBreak> {
        breaks
            .iter()
            .map(|b| FormattedBreak {
                id: b.id,
                trigger: b.trigger.to_string(),
                start: b.start.format("%H:%M").to_string(),
                end: b.end.map(|e| e.format("%H:%M").to_string()).unwrap_or_else(|| "-".to_string()),
                duration: b.duration().map(|d| format_duration(&d)).unwrap_or_else(|| "--:--".to_string()),
                notes: b.notes.clone().unwrap_or_default(),
            })
            .collect()
    }

    pub fn breaks(breaks: &[BreakSession]) {
        let mut table = Table::new();

        table.add_row(row!["ID", "TRIGGER", "START", "END", "DURATION", "NOTES"]);
        for b in Self::format_breaks(breaks) {
            table.add_row(row![b.id, b.trigger, b.start, b.end, b.duration, b.notes]);
        }
        table.printstd();
    }

    pub fn settings(settings: &IdleSettings) {
        let mut table = Table::new();

        table.add_row(row!["SETTING", "VALUE"]);
        table.add_row(row!["Idle threshold", format_minutes(settings.idle_threshold_minutes)]);
        table.add_row(row!["Warning before idle", format_minutes(settings.warning_time_minutes)]);
        table.add_row(row!["Show warning", yes_no(settings.show_idle_warning)]);
        table.add_row(row!["Enabled", yes_no(settings.enabled)]);
        table.add_row(row!["End idle on activity", yes_no(settings.auto_end_idle_on_activity)]);
        table.printstd();
    }

    pub fn status(session: &WorkSession, active_break: Option<&BreakSession>) {
        let mut table = Table::new();

        table.add_row(row!["WORK SESSION", "CLOCK IN", "BREAK", "BREAK SINCE", "TRIGGER"]);
        match active_break {
            Some(b) => table.add_row(row![
                session.id,
                session.clock_in.format("%H:%M"),
                b.id,
                b.start.format("%H:%M"),
                b.trigger
            ]),
            None => table.add_row(row![session.id, session.clock_in.format("%H:%M"), "-", "-", "-"]),
        };
        table.printstd();
    }

    /// One-line rendering of a coordinator snapshot for the watch output.
    pub fn state_line(state: &IdleSessionState) -> String {
        let mut line = format!("{} | idle total {}", state.state(), format_std_duration(state.total_idle_time));
        if let Some(start) = state.current_idle_start {
            line.push_str(&format!(" | idle since {}", start.format("%H:%M:%S")));
        }
        if state.sync_error {
            line.push_str(" | sync error");
        }
        line
    }
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
