use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

use taskgate::config::Config;
use taskgate::view::{TaskFilter, TaskView};
use taskgate::{
    tlog, tlog_error, JsonFileStorage, Priority, Receipt, Result, TaskController, TaskFields,
    TaskId,
};

/// taskgate - task list with dependency-gated completion
#[derive(Parser, Debug)]
#[command(name = "taskgate")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    TASKGATE_DEBUG=1     Enable debug logging (alternative to --debug)")]
pub struct Cli {
    /// Enable debug logging (writes to ~/.taskgate/taskgate.log)
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    /// Task file to use instead of the configured one
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Add a new task
    Add {
        /// Task text
        text: String,

        #[arg(long, short = 'c')]
        category: Option<String>,

        /// Low, Medium or High
        #[arg(long, short = 'p')]
        priority: Option<Priority>,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,

        /// Task that must be completed first (repeatable)
        #[arg(long = "depends-on", short = 'D')]
        depends_on: Vec<TaskId>,
    },

    /// Edit an existing task; omitted options keep their current value
    Edit {
        id: TaskId,

        /// New task text
        #[arg(long, short = 't')]
        text: Option<String>,

        #[arg(long, short = 'c')]
        category: Option<String>,

        #[arg(long, short = 'p')]
        priority: Option<Priority>,

        #[arg(long, conflicts_with = "clear_due")]
        due: Option<NaiveDate>,

        /// Remove the due date
        #[arg(long)]
        clear_due: bool,

        /// Replace the dependency list (repeatable)
        #[arg(long = "depends-on", short = 'D', conflicts_with = "clear_deps")]
        depends_on: Vec<TaskId>,

        /// Remove all dependencies
        #[arg(long)]
        clear_deps: bool,
    },

    /// Delete a task and release everything that depended on it
    Rm { id: TaskId },

    /// Mark a task complete, or reopen a completed one
    Toggle { id: TaskId },

    /// List tasks
    List {
        /// Only tasks whose text contains this
        #[arg(long, short = 's')]
        search: Option<String>,

        #[arg(long, short = 'c')]
        category: Option<String>,

        #[arg(long, short = 'p')]
        priority: Option<Priority>,

        /// Only tasks waiting on unfinished dependencies
        #[arg(long)]
        blocked: bool,
    },

    /// Show one task with its blockers and dependents
    Show { id: TaskId },

    /// Add a task from a speech transcript ("add task buy milk")
    Say {
        #[arg(required = true, trailing_var_arg = true)]
        transcript: Vec<String>,
    },

    /// Delete all completed tasks
    ClearCompleted,

    /// Completion progress
    Stats,

    /// Report dependency cycles that can never be completed
    Cycles,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    taskgate::log::init_with_debug(cli.debug);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tlog_error!("{}", err);
            eprintln!("{}", err.user_message());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let path = match cli.store {
        Some(path) => path,
        None => config.effective_store_path()?,
    };
    tlog!("taskgate {:?} store={}", cli.command, path.display());

    let mut controller = TaskController::open(JsonFileStorage::new(path), config)?;

    match cli.command {
        Command::Add {
            text,
            category,
            priority,
            due,
            depends_on,
        } => {
            let defaults = controller.config();
            let fields = TaskFields {
                text,
                category: category.unwrap_or_else(|| defaults.default_category.clone()),
                priority: priority.unwrap_or(defaults.default_priority),
                due_date: due,
                depends_on,
            };
            let receipt = controller.create_task(fields)?;
            println!("Added task {}: {}", receipt.value.id, receipt.value.text);
            report(&receipt);
        }
        Command::Edit {
            id,
            text,
            category,
            priority,
            due,
            clear_due,
            depends_on,
            clear_deps,
        } => {
            let mut fields = controller.edit_form(id)?;
            if let Some(text) = text {
                fields.text = text;
            }
            if let Some(category) = category {
                fields.category = category;
            }
            if let Some(priority) = priority {
                fields.priority = priority;
            }
            if clear_due {
                fields.due_date = None;
            } else if due.is_some() {
                fields.due_date = due;
            }
            if clear_deps {
                fields.depends_on.clear();
            } else if !depends_on.is_empty() {
                fields.depends_on = depends_on;
            }
            let receipt = controller.edit_task(id, fields)?;
            println!("Updated task {}: {}", receipt.value.id, receipt.value.text);
            report(&receipt);
        }
        Command::Rm { id } => {
            let receipt = controller.delete_task(id)?;
            println!("Deleted task {}: {}", receipt.value.id, receipt.value.text);
            report(&receipt);
        }
        Command::Toggle { id } => {
            let receipt = controller.toggle_completion(id)?;
            println!("Task {} is now {}", id, receipt.value.to);
            report(&receipt);
        }
        Command::List {
            search,
            category,
            priority,
            blocked,
        } => {
            let filter = TaskFilter {
                search,
                category,
                priority,
                blocked_only: blocked,
            };
            let rows = filter.apply(controller.task_views(today()));
            if rows.is_empty() {
                println!("No tasks");
            }
            for row in &rows {
                println!("{}", format_row(row));
            }
            println!("{}", controller.progress());
        }
        Command::Show { id } => {
            let row = controller
                .task_views(today())
                .into_iter()
                .find(|row| row.task.id == id)
                .ok_or(taskgate::Error::NotFound(id))?;
            println!("{}", format_row(&row));
            println!("  created:    {}", row.task.created_at.format("%Y-%m-%d %H:%M"));
            if let Some(done) = row.task.completed_at {
                println!("  completed:  {}", done.format("%Y-%m-%d %H:%M"));
            }
            println!("  depends on: {}", join_ids(&row.task.depends_on));
            println!("  dependents: {}", join_ids(&controller.dependents(id)));
        }
        Command::Say { transcript } => {
            let receipt = controller.create_from_voice(&transcript.join(" "))?;
            println!("Added task {}: {}", receipt.value.id, receipt.value.text);
            report(&receipt);
        }
        Command::ClearCompleted => {
            let receipt = controller.clear_completed()?;
            println!("Removed {} completed task(s)", receipt.value.len());
            report(&receipt);
        }
        Command::Stats => {
            let progress = controller.progress();
            println!("{} ({}%)", progress, progress.percent());
        }
        Command::Cycles => {
            let cycles = controller.cycles();
            if cycles.is_empty() {
                println!("No dependency cycles");
            }
            for cycle in cycles {
                println!("Cycle: {}", join_ids(&cycle));
            }
        }
    }
    Ok(())
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn report<T>(receipt: &Receipt<T>) {
    for status in receipt.reevaluated() {
        if status.blocked {
            println!(
                "  task {} is blocked by {}",
                status.id,
                join_ids(&status.blockers)
            );
        } else {
            println!("  task {} is unblocked", status.id);
        }
    }
    if let Some(warning) = receipt.persistence_warning() {
        eprintln!("warning: {}", warning);
    }
}

fn format_row(row: &TaskView) -> String {
    let task = &row.task;
    let mark = if task.completed { "x" } else { " " };
    let mut line = format!(
        "[{}] {:>4}  {}  ({}, {})",
        mark, task.id, task.text, task.category, task.priority
    );
    if let Some(due) = task.due_date {
        line.push_str(&format!("  due {}", due));
        if row.overdue {
            line.push_str(" OVERDUE");
        }
    }
    if row.blocked {
        line.push_str(&format!("  blocked by {}", join_ids(&row.blockers)));
    }
    line
}

fn join_ids(ids: &[TaskId]) -> String {
    if ids.is_empty() {
        return "-".to_string();
    }
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
