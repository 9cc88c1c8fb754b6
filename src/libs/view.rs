use super::task::{Task, TaskDetail};
use chrono::{DateTime, Utc};
use prettytable::{row, Table};

pub struct View {}

fn due(task: &Task, now: DateTime<Utc>) -> String {
    match task.due_date {
        Some(date) if task.is_overdue(now) => format!("{} !", date.format("%Y-%m-%d")),
        Some(date) => date.format("%Y-%m-%d").to_string(),
        None => String::new(),
    }
}

fn done(task: &Task) -> &'static str {
    if task.is_completed {
        "x"
    } else {
        ""
    }
}

fn recurrence(task: &Task) -> String {
    match &task.recurrence_rule {
        Some(rule) if rule.interval == 1 => rule.frequency.to_string(),
        Some(rule) => format!("every {} {}", rule.interval, rule.frequency),
        None => String::new(),
    }
}

impl View {
    /// Task table. Subtasks listed right after their parent are indented.
    pub fn tasks(tasks: &[Task], now: DateTime<Utc>) {
        let mut table = Table::new();

        table.add_row(row!["ID", "TITLE", "STATUS", "PRIORITY", "DUE", "TAGS", "REPEAT", "DONE"]);
        for task in tasks {
            let title = if task.is_subtask() {
                format!("  └ {}", task.title)
            } else {
                task.title.clone()
            };
            table.add_row(row![
                task.id,
                title,
                task.status,
                task.priority,
                due(task, now),
                task.tags.join(", "),
                recurrence(task),
                done(task)
            ]);
        }
        table.printstd();
    }

    pub fn task_detail(detail: &TaskDetail, now: DateTime<Utc>) {
        let task = &detail.task;
        let mut table = Table::new();

        table.add_row(row!["ID", task.id]);
        table.add_row(row!["TITLE", task.title]);
        table.add_row(row!["DESCRIPTION", task.description.as_deref().unwrap_or("")]);
        table.add_row(row!["STATUS", task.status]);
        table.add_row(row!["PRIORITY", task.priority]);
        table.add_row(row!["DUE", due(task, now)]);
        table.add_row(row!["TAGS", task.tags.join(", ")]);
        table.add_row(row!["REPEAT", recurrence(task)]);
        table.add_row(row!["DONE", done(task)]);
        if let Some(completed_at) = task.completed_at {
            table.add_row(row!["COMPLETED AT", completed_at.format("%Y-%m-%d %H:%M")]);
        }
        table.add_row(row!["CREATED AT", task.created_at.format("%Y-%m-%d %H:%M")]);
        table.add_row(row!["UPDATED AT", task.updated_at.format("%Y-%m-%d %H:%M")]);
        table.printstd();
    }
}
