#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};
    use taskboard::libs::cache::{OptimisticEdit, TaskCache, PLACEHOLDER_PREFIX};
    use taskboard::libs::task::{NewTask, NewTaskInput, Task, TaskDetail, TaskPatch};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap()
    }

    fn new_task(title: &str) -> NewTask {
        NewTask::validate(NewTaskInput {
            title: title.to_string(),
            status: "todo".to_string(),
            priority: "medium".to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    fn task(id: &str, parent_id: Option<&str>) -> Task {
        let mut task = Task::with_id(id.to_string(), new_task(id), now());
        task.parent_id = parent_id.map(str::to_string);
        task
    }

    fn seeded() -> TaskCache {
        let mut cache = TaskCache::new();
        cache.set_tasks(vec![task("a", None), task("b", None)]);
        cache
    }

    fn ids(cache: &TaskCache) -> Vec<String> {
        cache.tasks().unwrap_or_default().iter().map(|task| task.id.clone()).collect()
    }

    #[test]
    fn test_set_and_invalidate() {
        let mut cache = TaskCache::new();
        assert!(cache.tasks().is_none());

        cache.set_tasks(vec![task("a", None)]);
        assert!(cache.fresh_tasks().is_some());
        assert!(!cache.is_stale());

        cache.invalidate_tasks();
        assert!(cache.is_stale());
        assert!(cache.fresh_tasks().is_none());
        assert_eq!(cache.tasks().map(<[Task]>::len), Some(1));
    }

    #[test]
    fn test_version_increases_on_every_write() {
        let mut cache = TaskCache::new();
        let start = cache.version();
        cache.set_tasks(vec![]);
        let mutation = cache.begin_create(|id| Task::with_id(id, new_task("x"), now()));
        cache.rollback(mutation);
        assert!(cache.version() >= start + 3);
    }

    #[test]
    fn test_create_prepends_placeholder_and_commit_replaces_it() {
        let mut cache = seeded();
        let mutation = cache.begin_create(|id| Task::with_id(id, new_task("New"), now()));

        let placeholder = mutation.placeholder_id();
        assert!(placeholder.starts_with(PLACEHOLDER_PREFIX));
        assert_eq!(ids(&cache), [placeholder.as_str(), "a", "b"]);
        assert_eq!(cache.pending_count(), 1);

        cache.commit(mutation, task("server-id", None));
        assert_eq!(ids(&cache), ["server-id", "a", "b"]);
        assert_eq!(cache.pending_count(), 0);
    }

    #[test]
    fn test_create_rollback_restores_snapshot() {
        let mut cache = seeded();
        let before = cache.tasks().unwrap().to_vec();

        let mutation = cache.begin_create(|id| Task::with_id(id, new_task("New"), now()));
        cache.rollback(mutation);

        assert_eq!(cache.tasks().unwrap(), before.as_slice());
    }

    #[test]
    fn test_create_into_empty_cache() {
        let mut cache = TaskCache::new();
        let mutation = cache.begin_create(|id| Task::with_id(id, new_task("First"), now()));
        assert_eq!(ids(&cache), [mutation.placeholder_id()]);

        cache.rollback(mutation);
        assert!(cache.tasks().is_none());
    }

    #[test]
    fn test_interleaved_creates_roll_back_independently() {
        let mut cache = seeded();
        let first = cache.begin_create(|id| Task::with_id(id, new_task("First"), now()));
        let second = cache.begin_create(|id| Task::with_id(id, new_task("Second"), now()));
        assert_ne!(first.placeholder_id(), second.placeholder_id());

        cache.rollback(first);
        assert_eq!(ids(&cache), [second.placeholder_id().as_str(), "a", "b"]);

        cache.commit(second, task("second-id", None));
        assert_eq!(ids(&cache), ["second-id", "a", "b"]);
    }

    #[test]
    fn test_update_and_rollback() {
        let mut cache = seeded();
        let patch = TaskPatch {
            is_completed: Some(true),
            ..Default::default()
        };

        let mutation = cache.begin_update("a", &OptimisticEdit::Patch(patch), now());
        let edited = cache.task("a").unwrap();
        assert!(edited.is_completed);
        assert_eq!(edited.completed_at, Some(now()));

        cache.rollback(mutation);
        let restored = cache.task("a").unwrap();
        assert!(!restored.is_completed);
        assert!(restored.completed_at.is_none());
    }

    #[test]
    fn test_rollback_after_other_write_keeps_other_changes() {
        let mut cache = seeded();
        let toggle = cache.begin_update("a", &OptimisticEdit::Toggle, now());
        let create = cache.begin_create(|id| Task::with_id(id, new_task("New"), now()));

        cache.rollback(toggle);

        assert!(!cache.task("a").unwrap().is_completed);
        assert!(cache.task(&create.placeholder_id()).is_some());
    }

    #[test]
    fn test_failed_update_keeps_later_committed_record() {
        let mut cache = seeded();
        let rename = |title: &str| TaskPatch {
            title: Some(title.to_string()),
            ..Default::default()
        };

        let first = cache.begin_update("a", &OptimisticEdit::Patch(rename("First")), now());
        let second = cache.begin_update("a", &OptimisticEdit::Patch(rename("Second")), now());
        let canonical = Task {
            title: "Second".to_string(),
            ..task("a", None)
        };
        cache.commit(second, canonical.clone());

        cache.rollback(first);
        assert_eq!(cache.task("a"), Some(&canonical));
        assert_eq!(cache.pending_count(), 0);
    }

    #[test]
    fn test_failed_update_keeps_later_pending_edit() {
        let mut cache = seeded();
        let first = cache.begin_update("a", &OptimisticEdit::Toggle, now());
        let second = cache.begin_update(
            "a",
            &OptimisticEdit::Patch(TaskPatch {
                title: Some("Renamed".to_string()),
                ..Default::default()
            }),
            now(),
        );

        cache.rollback(first);
        let cached = cache.task("a").unwrap();
        assert_eq!(cached.title, "Renamed");
        assert!(cached.is_completed);

        cache.rollback(second);
        assert_eq!(cache.task("a").unwrap().title, "a");
    }

    #[test]
    fn test_update_of_uncached_task_is_harmless() {
        let mut cache = seeded();
        let before = cache.tasks().unwrap().to_vec();

        let mutation = cache.begin_update("missing", &OptimisticEdit::Toggle, now());
        assert_eq!(cache.tasks().unwrap(), before.as_slice());

        cache.rollback(mutation);
        assert_eq!(cache.tasks().unwrap(), before.as_slice());
    }

    #[test]
    fn test_mutation_cancels_in_flight_fetch() {
        let mut cache = seeded();
        let ticket = cache.begin_fetch();

        let mutation = cache.begin_update("a", &OptimisticEdit::Toggle, now());
        assert!(!cache.complete_fetch(ticket, vec![]));
        assert_eq!(ids(&cache), ["a", "b"]);

        cache.rollback(mutation);
        let ticket = cache.begin_fetch();
        assert!(cache.complete_fetch(ticket, vec![task("c", None)]));
        assert_eq!(ids(&cache), ["c"]);
    }

    #[test]
    fn test_remove_task_tree() {
        let mut cache = TaskCache::new();
        cache.set_tasks(vec![task("a", None), task("b", Some("a")), task("c", Some("b")), task("d", None)]);
        cache.set_detail(TaskDetail {
            task: task("b", Some("a")),
            subtasks: vec![],
            parent_task: None,
        });

        cache.remove_task_tree("a");
        assert_eq!(ids(&cache), ["d"]);
        assert!(cache.detail("b").is_none());
    }

    #[test]
    fn test_detail_entries_go_stale_on_invalidate() {
        let mut cache = seeded();
        let detail = TaskDetail {
            task: task("a", None),
            subtasks: vec![],
            parent_task: None,
        };
        cache.set_detail(detail.clone());
        assert_eq!(cache.detail("a"), Some(&detail));

        cache.invalidate_tasks();
        assert!(cache.detail("a").is_none());

        cache.set_detail(detail);
        assert!(cache.detail("a").is_some());
    }

    #[test]
    fn test_mutation_cancels_in_flight_detail_fetch() {
        let mut cache = seeded();
        let detail = TaskDetail {
            task: task("a", None),
            subtasks: vec![],
            parent_task: None,
        };
        cache.set_detail(detail.clone());

        let ticket = cache.begin_fetch();
        let mutation = cache.begin_update("a", &OptimisticEdit::Toggle, now());
        cache.commit(mutation, task("a", None));
        cache.invalidate_tasks();

        assert!(!cache.complete_detail_fetch(ticket, detail.clone()));
        assert!(cache.detail("a").is_none());

        let ticket = cache.begin_fetch();
        assert!(cache.complete_detail_fetch(ticket, detail.clone()));
        assert_eq!(cache.detail("a"), Some(&detail));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "rollback without snapshot")]
    fn test_rollback_without_snapshot_is_a_bug() {
        let mut cache = seeded();
        let mutation = cache.begin_update("a", &OptimisticEdit::Toggle, now());
        cache.rollback(mutation);
        cache.rollback(mutation);
    }
}
