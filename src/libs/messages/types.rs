/// Every user-facing text in taskboard. Rendering lives in `display.rs`.
#[derive(Debug, Clone)]
pub enum Message {
    // === TASK MESSAGES ===
    TaskCreated(String),   // title
    TaskUpdated(String),   // title
    TaskCompleted(String), // title
    TaskReopened(String),  // title
    TaskDeleted(String),   // id
    TasksHeader,
    NoTasksFound,
    TaskDetailHeader(String), // title
    SubtasksHeader,
    ParentTaskHeader,
    ConfirmDeleteTask(String, usize), // title, subtask count
    NoChangesProvided,
    OperationCancelled,
    TaskCreateFailed(String),
    TaskUpdateFailed(String),
    TaskDeleteFailed(String),
    TasksFetchFailed(String),

    // === VALIDATION MESSAGES ===
    TitleRequired,
    TitleTooLong(usize),
    DescriptionTooLong(usize),
    InvalidStatus(String),
    InvalidPriority(String),
    InvalidFrequency(String),
    InvalidInterval(i64),
    InvalidDate(String),
    IdRequired,
    NestedSubtaskNotAllowed(String), // parent id

    // === STORE MESSAGES ===
    InternalServerError,
    StoreSeeded(usize),
    StoreAlreadySeeded,
    UsingServer(String),

    // === CONFIGURATION MESSAGES ===
    ConfigSaved,
    ConfigDeleted,
    ConfigModuleServer,
    ConfigModuleStore,
    PromptSelectModules,
    PromptServerApiUrl,
    PromptServerAuthToken,
    PromptStoreLatency,
    PromptStoreSeed,
}
