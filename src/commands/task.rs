//! Task commands.
//!
//! Every subcommand goes through [`TaskSync`] over the configured backend,
//! so the CLI exercises the same optimistic path as any other caller.

use crate::{
    api::Backend,
    libs::{
        config::Config,
        messages::Message,
        sync::TaskSync,
        error::ValidationError,
        task::{get_all_subtasks, NewTask, NewTaskInput, RecurrenceRuleInput, Task, TaskPatch, TaskPriority, TaskStatus},
        view::View,
    },
    msg_bail_anyhow, msg_debug, msg_error, msg_error_anyhow, msg_info, msg_print, msg_success,
};
use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Subcommand};
use dialoguer::{theme::ColorfulTheme, Confirm};

#[derive(Debug, Args)]
pub struct TaskArgs {
    #[command(subcommand)]
    command: TaskCommand,
}

#[derive(Debug, Subcommand)]
enum TaskCommand {
    /// List tasks
    List {
        /// Include subtasks under their parents
        #[arg(short, long)]
        all_levels: bool,
    },
    /// Show a task with its subtasks and parent
    Show {
        /// Task ID
        id: String,
    },
    /// Create a task
    Add(AddArgs),
    /// Change fields of a task
    Edit(EditArgs),
    /// Toggle the completion state of a task
    Done {
        /// Task ID
        id: String,
    },
    /// Delete a task and all of its subtasks
    Delete {
        /// Task ID
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Debug, Args)]
struct AddArgs {
    /// Task title
    title: String,
    #[arg(short, long)]
    description: Option<String>,
    /// todo, in_progress or done
    #[arg(short, long, default_value = "todo")]
    status: String,
    /// low, medium or high
    #[arg(short, long, default_value = "medium")]
    priority: String,
    /// Due date, YYYY-MM-DD or RFC 3339
    #[arg(long)]
    due: Option<String>,
    /// Parent task ID, makes the new task a subtask
    #[arg(long)]
    parent: Option<String>,
    /// Tag, may be repeated
    #[arg(short, long = "tag")]
    tags: Vec<String>,
    /// Recurrence: daily, weekly or monthly
    #[arg(long)]
    every: Option<String>,
    /// Recurrence interval
    #[arg(long, default_value_t = 1)]
    interval: i64,
}

#[derive(Debug, Args)]
struct EditArgs {
    /// Task ID
    id: String,
    #[arg(long)]
    title: Option<String>,
    /// New description, an empty value clears it
    #[arg(short, long)]
    description: Option<String>,
    #[arg(short, long)]
    status: Option<String>,
    #[arg(short, long)]
    priority: Option<String>,
    /// Due date, YYYY-MM-DD or RFC 3339
    #[arg(long, conflicts_with = "clear_due")]
    due: Option<String>,
    #[arg(long)]
    clear_due: bool,
    /// Replaces all tags, may be repeated
    #[arg(short, long = "tag")]
    tags: Vec<String>,
    /// Stop the task from repeating
    #[arg(long)]
    clear_recurrence: bool,
}

pub async fn cmd(args: TaskArgs) -> Result<()> {
    let sync = open_sync()?;
    match args.command {
        TaskCommand::List { all_levels } => handle_list(&sync, all_levels).await,
        TaskCommand::Show { id } => handle_show(&sync, &id).await,
        TaskCommand::Add(add_args) => handle_add(&sync, add_args).await,
        TaskCommand::Edit(edit_args) => handle_edit(&sync, edit_args).await,
        TaskCommand::Done { id } => handle_done(&sync, &id).await,
        TaskCommand::Delete { id, yes } => handle_delete(&sync, &id, yes).await,
    }
}

fn open_sync() -> Result<TaskSync<Backend>> {
    let config = Config::read()?;
    if let Some(server) = &config.server {
        msg_debug!(Message::UsingServer(server.api_url.clone()));
    }
    Ok(TaskSync::new(Backend::from_config(&config)?))
}

/// Accepts a calendar date (midnight UTC) or a full RFC 3339 timestamp.
pub fn parse_due(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(date_time) = DateTime::parse_from_rfc3339(value) {
        return Ok(date_time.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|date_time| date_time.and_utc())
        .ok_or_else(|| msg_error_anyhow!(Message::InvalidDate(value.to_string())))
}

/// Top-level tasks in store order; with `all_levels` each one is followed by
/// its subtask tree, and subtasks whose parent is gone come last.
pub fn ordered_tasks(tasks: &[Task], all_levels: bool) -> Vec<Task> {
    let mut ordered = Vec::new();
    for task in tasks.iter().filter(|task| !task.is_subtask()) {
        ordered.push(task.clone());
        if all_levels {
            ordered.extend(get_all_subtasks(tasks, &task.id).into_iter().cloned());
        }
    }
    if all_levels {
        let orphans = tasks.iter().filter(|task| {
            task.parent_id
                .as_deref()
                .is_some_and(|parent_id| !tasks.iter().any(|candidate| candidate.id == parent_id))
        });
        ordered.extend(orphans.cloned());
    }
    ordered
}

async fn handle_list(sync: &TaskSync<Backend>, all_levels: bool) -> Result<()> {
    let tasks = sync
        .list_tasks()
        .await
        .map_err(|error| msg_error_anyhow!(Message::TasksFetchFailed(error.to_string())))?;
    let tasks = ordered_tasks(&tasks, all_levels);

    if tasks.is_empty() {
        msg_info!(Message::NoTasksFound);
        return Ok(());
    }

    msg_print!(Message::TasksHeader, true);
    View::tasks(&tasks, Utc::now());
    Ok(())
}

async fn handle_show(sync: &TaskSync<Backend>, id: &str) -> Result<()> {
    let detail = sync.get_task_detail(id).await?;
    let now = Utc::now();

    msg_print!(Message::TaskDetailHeader(detail.task.title.clone()), true);
    View::task_detail(&detail, now);

    if let Some(parent) = &detail.parent_task {
        msg_print!(Message::ParentTaskHeader, true);
        View::tasks(std::slice::from_ref(parent), now);
    }
    if !detail.subtasks.is_empty() {
        msg_print!(Message::SubtasksHeader, true);
        View::tasks(&detail.subtasks, now);
    }
    Ok(())
}

async fn handle_add(sync: &TaskSync<Backend>, args: AddArgs) -> Result<()> {
    let input = NewTaskInput {
        title: args.title,
        description: args.description.filter(|text| !text.is_empty()),
        status: args.status,
        priority: args.priority,
        due_date: args.due.as_deref().map(parse_due).transpose()?,
        parent_id: args.parent,
        tags: args.tags,
        is_completed: false,
        recurrence_rule: args.every.map(|frequency| RecurrenceRuleInput {
            frequency,
            interval: args.interval,
            end_date: None,
        }),
    };
    let new_task = match NewTask::validate(input) {
        Ok(new_task) => new_task,
        Err(errors) => {
            report_validation(&errors);
            msg_bail_anyhow!(Message::TaskCreateFailed(format!("{} validation error(s)", errors.len())));
        }
    };

    // Parent checks run against the cached list.
    if new_task.parent_id.is_some() {
        sync.tasks().await?;
    }

    let task = sync
        .create_task(new_task)
        .await
        .map_err(|error| msg_error_anyhow!(Message::TaskCreateFailed(error.to_string())))?;
    msg_success!(Message::TaskCreated(task.title.clone()));
    msg_print!(task.id);
    Ok(())
}

/// `field: message` lines, one per violation, in field order.
pub fn validation_lines(errors: &ValidationError) -> Vec<String> {
    errors
        .fields()
        .iter()
        .flat_map(|(field, messages)| messages.iter().map(move |message| format!("{}: {}", field, message)))
        .collect()
}

fn report_validation(errors: &ValidationError) {
    for line in validation_lines(errors) {
        msg_error!(line);
    }
}

/// Translates edit flags into a patch. Status and priority are parsed here;
/// length limits are left to the patch validation in the sync layer.
fn build_patch(args: EditArgs) -> Result<TaskPatch> {
    let status = args
        .status
        .map(|value| value.parse::<TaskStatus>().map_err(|value| msg_error_anyhow!(Message::InvalidStatus(value))))
        .transpose()?;
    let priority = args
        .priority
        .map(|value| value.parse::<TaskPriority>().map_err(|value| msg_error_anyhow!(Message::InvalidPriority(value))))
        .transpose()?;
    let due_date = match (args.due, args.clear_due) {
        (Some(value), _) => Some(Some(parse_due(&value)?)),
        (None, true) => Some(None),
        (None, false) => None,
    };

    Ok(TaskPatch {
        title: args.title,
        description: args.description.map(|text| (!text.is_empty()).then_some(text)),
        status,
        priority,
        due_date,
        tags: (!args.tags.is_empty()).then_some(args.tags),
        recurrence_rule: args.clear_recurrence.then_some(None),
        ..Default::default()
    })
}

async fn handle_edit(sync: &TaskSync<Backend>, args: EditArgs) -> Result<()> {
    let id = args.id.clone();
    let patch = build_patch(args)?;
    if patch.is_empty() {
        msg_info!(Message::NoChangesProvided);
        return Ok(());
    }

    sync.tasks().await?;
    let task = sync
        .update_task(&id, patch)
        .await
        .map_err(|error| msg_error_anyhow!(Message::TaskUpdateFailed(error.to_string())))?;
    msg_success!(Message::TaskUpdated(task.title));
    Ok(())
}

async fn handle_done(sync: &TaskSync<Backend>, id: &str) -> Result<()> {
    sync.tasks().await?;
    let task = sync
        .toggle_task(id)
        .await
        .map_err(|error| msg_error_anyhow!(Message::TaskUpdateFailed(error.to_string())))?;

    if task.is_completed {
        msg_success!(Message::TaskCompleted(task.title));
    } else {
        msg_success!(Message::TaskReopened(task.title));
    }
    Ok(())
}

async fn handle_delete(sync: &TaskSync<Backend>, id: &str, yes: bool) -> Result<()> {
    let tasks = sync.tasks().await?;
    let Some(task) = tasks.iter().find(|task| task.id == id) else {
        msg_bail_anyhow!(Message::TaskDeleteFailed(format!("unknown task {}", id)));
    };

    if !yes {
        let subtask_count = get_all_subtasks(&tasks, id).len();
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(Message::ConfirmDeleteTask(task.title.clone(), subtask_count).to_string())
            .default(false)
            .interact()?;
        if !confirmed {
            msg_info!(Message::OperationCancelled);
            return Ok(());
        }
    }

    sync.delete_task(id)
        .await
        .map_err(|error| msg_error_anyhow!(Message::TaskDeleteFailed(error.to_string())))?;
    msg_success!(Message::TaskDeleted(id.to_string()));
    Ok(())
}
