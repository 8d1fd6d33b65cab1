#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};
    use idlewatch::libs::coordinator::IdleSessionState;
    use idlewatch::libs::formatter::{format_duration, format_minutes, format_std_duration};
    use idlewatch::libs::messages::Message;
    use idlewatch::libs::services::{BreakSession, BreakTrigger};
    use idlewatch::libs::settings::IdleSettings;
    use idlewatch::libs::view::View;

    fn at(h: u32, m: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 6).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(&Duration::minutes(0)), "00:00");
        assert_eq!(format_duration(&Duration::minutes(75)), "01:15");
        assert_eq!(format_duration(&Duration::seconds(59)), "00:00");
        assert_eq!(format_duration(&Duration::minutes(-30)), "00:00");
    }

    #[test]
    fn test_format_std_duration() {
        assert_eq!(format_std_duration(std::time::Duration::ZERO), "00:00:00");
        assert_eq!(format_std_duration(std::time::Duration::from_secs(3725)), "01:02:05");
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(10.0), "10 min");
        assert_eq!(format_minutes(2.5), "2.5 min");
    }

    #[test]
    fn test_format_breaks() {
        let breaks = vec![
            BreakSession {
                id: 1,
                work_session_id: 4,
                trigger: BreakTrigger::Idle,
                start: at(10, 0),
                end: Some(at(10, 25)),
                duration_secs: Some(25 * 60),
                notes: None,
            },
            BreakSession {
                id: 2,
                work_session_id: 4,
                trigger: BreakTrigger::Manual,
                start: at(12, 30),
                end: None,
                duration_secs: None,
                notes: Some("lunch".to_string()),
            },
        ];

        let rows = View::format_breaks(&breaks);
        assert_eq!(rows[0].trigger, "idle");
        assert_eq!(rows[0].start, "10:00");
        assert_eq!(rows[0].end, "10:25");
        assert_eq!(rows[0].duration, "00:25");
        assert_eq!(rows[0].notes, "");
        assert_eq!(rows[1].end, "-");
        assert_eq!(rows[1].duration, "--:--");
        assert_eq!(rows[1].notes, "lunch");
    }

    #[test]
    fn test_state_line() {
        let mut state = IdleSessionState {
            is_idle: false,
            is_warning: true,
            total_idle_time: std::time::Duration::from_secs(90),
            current_idle_start: None,
            settings: IdleSettings::defaults_for(1),
            idle_break_id: None,
            sync_error: false,
            misconfigured: false,
        };
        assert_eq!(View::state_line(&state), "warning | idle total 00:01:30");

        state.is_warning = false;
        state.is_idle = true;
        state.current_idle_start = Some(at(9, 15));
        state.sync_error = true;
        assert_eq!(
            View::state_line(&state),
            "idle | idle total 00:01:30 | idle since 09:15:00 | sync error"
        );
        assert!((state.total_idle_minutes() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_message_text() {
        assert_eq!(
            Message::IdleWarningNotice(2.0).to_string(),
            "No activity detected. You will be marked idle in 2 min."
        );
        assert_eq!(
            Message::IdleWarningNeverShown {
                warning: 10.0,
                threshold: 5.0
            }
            .to_string(),
            "Warning time (10 min) is not shorter than the idle threshold (5 min); the idle warning will never be shown"
        );
        assert_eq!(Message::BreakStarted(3).to_string(), "Break 3 started");
    }
}
