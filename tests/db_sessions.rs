#[cfg(test)]
mod tests {
    use chrono::Local;
    use idlewatch::db::break_sessions::BreakSessions;
    use idlewatch::db::db::{Db, DB_FILE_NAME};
    use idlewatch::db::idle_settings::IdleSettingsStore;
    use idlewatch::db::work_sessions::WorkSessions;
    use idlewatch::libs::error::ServiceError;
    use idlewatch::libs::services::{
        BreakRequest, BreakService, BreakTrigger, SettingsService, WorkSessionService,
    };
    use idlewatch::libs::settings::{IdleSettings, IdleSettingsPatch};
    use tempfile::TempDir;
    use test_context::{test_context, AsyncTestContext};

    /// File-backed database in a scratch directory.
    struct DbTestContext {
        _temp_dir: TempDir,
        db: Db,
    }

    impl AsyncTestContext for DbTestContext {
        async fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            let db = Db::open(temp_dir.path().join(DB_FILE_NAME)).unwrap();
            DbTestContext { _temp_dir: temp_dir, db }
        }
    }

    #[test_context(DbTestContext)]
    #[tokio::test]
    async fn test_clock_in_and_out(ctx: &mut DbTestContext) {
        let sessions = WorkSessions::new(&ctx.db);

        assert!(sessions.get_active_work_session(1).await.unwrap().is_none());
        let session = sessions.clock_in(1).await.unwrap();
        assert!(session.is_open());
        assert_eq!(session.employee_id, 1);

        let active = sessions.get_active_work_session(1).await.unwrap().unwrap();
        assert_eq!(active.id, session.id);
        assert!(sessions.get_active_work_session(2).await.unwrap().is_none());

        sessions.clock_out(session.id).await.unwrap();
        assert!(sessions.get_active_work_session(1).await.unwrap().is_none());
        assert!(sessions.get(session.id).unwrap().unwrap().clock_out.is_some());
    }

    #[test_context(DbTestContext)]
    #[tokio::test]
    async fn test_second_clock_in_conflicts(ctx: &mut DbTestContext) {
        let sessions = WorkSessions::new(&ctx.db);
        sessions.clock_in(1).await.unwrap();

        let result = sessions.clock_in(1).await;
        assert!(matches!(result, Err(ServiceError::Conflict(_))));

        // Other employees are independent
        assert!(sessions.clock_in(2).await.is_ok());
    }

    #[test_context(DbTestContext)]
    #[tokio::test]
    async fn test_clock_out_errors(ctx: &mut DbTestContext) {
        let sessions = WorkSessions::new(&ctx.db);

        let missing = sessions.clock_out(404).await.unwrap_err();
        assert!(missing.is_not_found());

        let session = sessions.clock_in(1).await.unwrap();
        sessions.clock_out(session.id).await.unwrap();
        assert!(matches!(sessions.clock_out(session.id).await, Err(ServiceError::Conflict(_))));
    }

    #[test_context(DbTestContext)]
    #[tokio::test]
    async fn test_break_lifecycle(ctx: &mut DbTestContext) {
        let session = WorkSessions::new(&ctx.db).clock_in(1).await.unwrap();
        let breaks = BreakSessions::new(&ctx.db);

        let id = breaks.start_break(session.id, &BreakRequest::idle()).await.unwrap();
        let active = breaks.get_active_break(session.id).await.unwrap().unwrap();
        assert_eq!(active.id, id);
        assert_eq!(active.trigger, BreakTrigger::Idle);
        assert_eq!(active.notes.as_deref(), Some("Automatically started after inactivity"));
        assert!(active.is_open());

        breaks.end_break(id).await.unwrap();
        assert!(breaks.get_active_break(session.id).await.unwrap().is_none());

        let closed = breaks.get(id).unwrap().unwrap();
        assert!(closed.end.is_some());
        assert!(closed.duration_secs.unwrap() >= 0);

        // Ending twice is harmless
        breaks.end_break(id).await.unwrap();
        assert_eq!(breaks.get(id).unwrap().unwrap().end, closed.end);
    }

    #[test_context(DbTestContext)]
    #[tokio::test]
    async fn test_only_one_open_break_per_session(ctx: &mut DbTestContext) {
        let session = WorkSessions::new(&ctx.db).clock_in(1).await.unwrap();
        let breaks = BreakSessions::new(&ctx.db);

        breaks
            .start_break(session.id, &BreakRequest::manual(Some("lunch".to_string())))
            .await
            .unwrap();
        let second = breaks.start_break(session.id, &BreakRequest::idle()).await;
        assert!(matches!(second, Err(ServiceError::Conflict(_))));
    }

    #[test_context(DbTestContext)]
    #[tokio::test]
    async fn test_start_break_requires_open_session(ctx: &mut DbTestContext) {
        let sessions = WorkSessions::new(&ctx.db);
        let breaks = BreakSessions::new(&ctx.db);

        let unknown = breaks.start_break(99, &BreakRequest::idle()).await.unwrap_err();
        assert!(unknown.is_not_found());

        let session = sessions.clock_in(1).await.unwrap();
        sessions.clock_out(session.id).await.unwrap();
        let closed = breaks.start_break(session.id, &BreakRequest::idle()).await;
        assert!(matches!(closed, Err(ServiceError::Conflict(_))));

        assert!(breaks.end_break(12345).await.unwrap_err().is_not_found());
    }

    #[test_context(DbTestContext)]
    #[tokio::test]
    async fn test_clock_out_closes_open_break(ctx: &mut DbTestContext) {
        let sessions = WorkSessions::new(&ctx.db);
        let breaks = BreakSessions::new(&ctx.db);
        let session = sessions.clock_in(1).await.unwrap();
        let id = breaks.start_break(session.id, &BreakRequest::idle()).await.unwrap();

        sessions.clock_out(session.id).await.unwrap();

        let closed = breaks.get(id).unwrap().unwrap();
        assert!(!closed.is_open());
        assert!(closed.duration_secs.is_some());
    }

    #[test_context(DbTestContext)]
    #[tokio::test]
    async fn test_list_breaks_and_breaks_for_date(ctx: &mut DbTestContext) {
        let sessions = WorkSessions::new(&ctx.db);
        let breaks = BreakSessions::new(&ctx.db);
        let session = sessions.clock_in(1).await.unwrap();

        let first = breaks.start_break(session.id, &BreakRequest::idle()).await.unwrap();
        breaks.end_break(first).await.unwrap();
        let second = breaks.start_break(session.id, &BreakRequest::manual(None)).await.unwrap();

        let listed = breaks.list_breaks(session.id).await.unwrap();
        assert_eq!(listed.iter().map(|b| b.id).collect::<Vec<_>>(), vec![first, second]);

        let today = Local::now().date_naive();
        assert_eq!(breaks.breaks_for_date(today).unwrap().len(), 2);
        let yesterday = today.pred_opt().unwrap();
        assert!(breaks.breaks_for_date(yesterday).unwrap().is_empty());
    }

    #[test_context(DbTestContext)]
    #[tokio::test]
    async fn test_idle_settings_create_and_update(ctx: &mut DbTestContext) {
        let store = IdleSettingsStore::new(&ctx.db);
        assert!(store.get_idle_settings(5).await.unwrap().is_none());

        let created = store
            .create_idle_settings(5, &IdleSettings::defaults_for(5))
            .await
            .unwrap();
        assert!(created.id.is_some());
        assert_eq!(created.employee_id, 5);
        assert_eq!(created.idle_threshold_minutes, 10.0);
        assert!(created.auto_end_idle_on_activity);

        let patch = IdleSettingsPatch {
            idle_threshold_minutes: Some(15.0),
            auto_end_idle_on_activity: Some(false),
            ..Default::default()
        };
        store.update_idle_settings(created.id.unwrap(), &patch).await.unwrap();

        let loaded = store.get_idle_settings(5).await.unwrap().unwrap();
        assert_eq!(loaded.idle_threshold_minutes, 15.0);
        assert_eq!(loaded.warning_time_minutes, 2.0);
        assert!(!loaded.auto_end_idle_on_activity);
    }

    #[test_context(DbTestContext)]
    #[tokio::test]
    async fn test_idle_settings_create_keeps_existing_record(ctx: &mut DbTestContext) {
        let store = IdleSettingsStore::new(&ctx.db);
        let first = store
            .create_idle_settings(
                5,
                &IdleSettings {
                    idle_threshold_minutes: 20.0,
                    ..IdleSettings::defaults_for(5)
                },
            )
            .await
            .unwrap();

        let second = store
            .create_idle_settings(5, &IdleSettings::defaults_for(5))
            .await
            .unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.idle_threshold_minutes, 20.0);

        let missing = store
            .update_idle_settings(999, &IdleSettingsPatch::default())
            .await
            .unwrap_err();
        assert!(missing.is_not_found());
    }

    #[test_context(DbTestContext)]
    #[tokio::test]
    async fn test_data_survives_reopen(ctx: &mut DbTestContext) {
        let session = WorkSessions::new(&ctx.db).clock_in(3).await.unwrap();
        let path = ctx._temp_dir.path().join(DB_FILE_NAME);

        let reopened = Db::open(&path).unwrap();
        let active = WorkSessions::new(&reopened).get_active_work_session(3).await.unwrap();
        assert_eq!(active.map(|s| s.id), Some(session.id));
    }
}
