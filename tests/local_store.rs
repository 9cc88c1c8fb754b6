#[cfg(test)]
mod tests {
    use chrono::Utc;
    use std::time::{Duration, Instant};
    use taskboard::api::{LocalTaskStore, TaskStore};
    use taskboard::db::tasks::Tasks;
    use taskboard::libs::error::TaskError;
    use taskboard::libs::task::{NewTask, NewTaskInput, RecurrenceRuleInput, Task, TaskPatch};
    use tempfile::TempDir;
    use test_context::{test_context, AsyncTestContext};

    fn new_task(title: &str, parent_id: Option<&str>) -> NewTask {
        NewTask::validate(NewTaskInput {
            title: title.to_string(),
            status: "todo".to_string(),
            priority: "low".to_string(),
            parent_id: parent_id.map(str::to_string),
            tags: vec!["home".to_string()],
            recurrence_rule: Some(RecurrenceRuleInput {
                frequency: "monthly".to_string(),
                interval: 3,
                end_date: None,
            }),
            ..Default::default()
        })
        .unwrap()
    }

    /// Points the data directory at a temporary home for the test that opens
    /// the task database file.
    struct StoreTestContext {
        _temp_dir: TempDir,
    }

    impl AsyncTestContext for StoreTestContext {
        async fn setup() -> Self {
            let temp_dir = tempfile::tempdir().unwrap();
            std::env::set_var("HOME", temp_dir.path());
            std::env::set_var("LOCALAPPDATA", temp_dir.path());
            StoreTestContext { _temp_dir: temp_dir }
        }
    }

    struct LocalStoreContext {
        store: LocalTaskStore,
    }

    impl AsyncTestContext for LocalStoreContext {
        async fn setup() -> Self {
            LocalStoreContext {
                store: LocalTaskStore::in_memory().unwrap(),
            }
        }
    }

    #[test]
    fn test_tasks_table_round_trip() {
        let mut tasks = Tasks::in_memory().unwrap();
        let task = Task::create(new_task("Persist me", None), Utc::now());

        tasks.save(&task).unwrap();
        assert_eq!(tasks.get(&task.id).unwrap(), Some(task.clone()));
        assert_eq!(tasks.count().unwrap(), 1);

        let renamed = Task {
            title: "Renamed".to_string(),
            ..task.clone()
        };
        tasks.save(&renamed).unwrap();
        assert_eq!(tasks.fetch_all().unwrap(), vec![renamed]);

        assert_eq!(tasks.delete_many(&[task.id.clone()]).unwrap(), 1);
        assert_eq!(tasks.get(&task.id).unwrap(), None);
    }

    #[test]
    fn test_tasks_keep_insertion_order() {
        let mut tasks = Tasks::in_memory().unwrap();
        let now = Utc::now();
        for title in ["one", "two", "three"] {
            tasks.save(&Task::create(new_task(title, None), now)).unwrap();
        }

        let titles: Vec<String> = tasks.fetch_all().unwrap().into_iter().map(|task| task.title).collect();
        assert_eq!(titles, ["one", "two", "three"]);
        assert_eq!(tasks.delete_many(&[]).unwrap(), 0);
    }

    #[test_context(StoreTestContext)]
    #[tokio::test]
    async fn test_open_persists_between_instances(_ctx: &mut StoreTestContext) {
        let created = LocalTaskStore::open().unwrap().create_task(&new_task("Survive", None)).await.unwrap();

        let reopened = LocalTaskStore::open().unwrap();
        let tasks = reopened.list_tasks().await.unwrap();
        assert_eq!(tasks, vec![created]);
    }

    #[test_context(LocalStoreContext)]
    #[tokio::test]
    async fn test_seed_only_fills_empty_store(ctx: &mut LocalStoreContext) {
        assert_eq!(ctx.store.seed().unwrap(), 2);
        assert_eq!(ctx.store.seed().unwrap(), 0);
        assert_eq!(ctx.store.list_tasks().await.unwrap().len(), 2);
    }

    #[test_context(LocalStoreContext)]
    #[tokio::test]
    async fn test_create_assigns_id_and_timestamps(ctx: &mut LocalStoreContext) {
        let task = ctx.store.create_task(&new_task("Fresh", None)).await.unwrap();

        assert!(!task.id.is_empty());
        assert_eq!(task.created_at, task.updated_at);
        assert!(task.completed_at.is_none());
        assert_eq!(task.recurrence_rule.as_ref().map(|rule| rule.interval), Some(3));
    }

    #[test_context(LocalStoreContext)]
    #[tokio::test]
    async fn test_update_derives_completion(ctx: &mut LocalStoreContext) {
        let task = ctx.store.create_task(&new_task("Finish", None)).await.unwrap();
        let patch = TaskPatch {
            is_completed: Some(true),
            ..Default::default()
        };

        let done = ctx.store.update_task(&task.id, &patch).await.unwrap();
        assert!(done.is_completed);
        assert!(done.completed_at.is_some());
        assert!(done.updated_at >= task.updated_at);

        let stored = ctx.store.get_task_detail(&task.id).await.unwrap().task;
        assert_eq!(stored, done);
    }

    #[test_context(LocalStoreContext)]
    #[tokio::test]
    async fn test_update_rejects_invalid_patch(ctx: &mut LocalStoreContext) {
        let task = ctx.store.create_task(&new_task("Valid", None)).await.unwrap();
        let patch = TaskPatch {
            description: Some(Some("x".repeat(1001))),
            ..Default::default()
        };

        let error = ctx.store.update_task(&task.id, &patch).await.unwrap_err();
        assert_eq!(error.status(), Some(422));
    }

    #[test_context(LocalStoreContext)]
    #[tokio::test]
    async fn test_detail_and_cascade_delete(ctx: &mut LocalStoreContext) {
        let parent = ctx.store.create_task(&new_task("Parent", None)).await.unwrap();
        let child = ctx.store.create_task(&new_task("Child", Some(&parent.id))).await.unwrap();
        // Stored directly: the store itself does not enforce single-level nesting.
        let grandchild = ctx.store.create_task(&new_task("Grandchild", Some(&child.id))).await.unwrap();
        let other = ctx.store.create_task(&new_task("Other", None)).await.unwrap();

        let detail = ctx.store.get_task_detail(&child.id).await.unwrap();
        assert_eq!(detail.parent_task, Some(parent.clone()));
        assert_eq!(detail.subtasks, vec![grandchild]);

        ctx.store.delete_task(&parent.id).await.unwrap();
        assert_eq!(ctx.store.list_tasks().await.unwrap(), vec![other]);

        let error = ctx.store.delete_task(&parent.id).await.unwrap_err();
        assert!(matches!(error, TaskError::NotFound(_)));
    }

    #[test_context(LocalStoreContext)]
    #[tokio::test]
    async fn test_failure_mode(ctx: &mut LocalStoreContext) {
        ctx.store.fail_with(Some(500));
        let error = ctx.store.list_tasks().await.unwrap_err();
        assert_eq!(error.status(), Some(500));
        assert_eq!(error.to_string(), "Request failed: Internal Server Error");

        ctx.store.fail_with(None);
        assert!(ctx.store.list_tasks().await.is_ok());
    }

    #[tokio::test]
    async fn test_latency_delays_responses() {
        let store = LocalTaskStore::in_memory().unwrap().with_latency(Duration::from_millis(30));

        let started = Instant::now();
        store.list_tasks().await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(30));
    }
}
