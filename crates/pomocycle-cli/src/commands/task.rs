//! Task checklist commands. The checklist shares a screen with the timer
//! and nothing else.

use clap::Subcommand;

use crate::storage::TaskList;

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task to the checklist
    Add {
        /// Task title
        title: String,
    },
    /// List tasks
    List {
        /// Print as a JSON array
        #[arg(long)]
        json: bool,
    },
    /// Remove a task by its number in `task list`
    Remove {
        /// 1-based task number
        number: usize,
    },
    /// Remove every task
    Clear,
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut tasks = TaskList::load()?;
    match action {
        TaskAction::Add { title } => {
            if tasks.add(&title)? {
                tasks.save()?;
                println!("added: {}", title.trim());
            } else {
                println!("already listed: {}", title.trim());
            }
        }
        TaskAction::List { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else if tasks.is_empty() {
                println!("no tasks");
            } else {
                for (i, title) in tasks.iter().enumerate() {
                    println!("{:>3}. {title}", i + 1);
                }
            }
        }
        TaskAction::Remove { number } => {
            let removed = tasks.remove(number)?;
            tasks.save()?;
            println!("removed: {removed}");
        }
        TaskAction::Clear => {
            let count = tasks.len();
            tasks.clear();
            tasks.save()?;
            println!("cleared {count} tasks");
        }
    }
    Ok(())
}
