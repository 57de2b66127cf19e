//! Thread command implementations.

use crate::cli::ThreadCommands;
use crate::cli::commands::{open_backend, parse_metadata, print_json, short_time};
use crate::config::resolve_project;
use crate::error::{Error, Result};
use crate::model::{Item, MessagePart, NewThread, Thread, ThreadUpdate};
use crate::storage::Condition;
use crate::store::{ThreadModels, take_first};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct ThreadListOutput {
    threads: Vec<Thread>,
    count: usize,
}

#[derive(Serialize)]
struct DeleteOutput {
    id: String,
    deleted: bool,
}

/// Execute thread commands.
pub fn execute(command: &ThreadCommands, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let backend = open_backend(db_path)?;
    let models = ThreadModels::new(&backend);

    match command {
        ThreadCommands::Create {
            project,
            scope_type,
            scope_id,
            title,
            metadata,
        } => {
            let mut new = NewThread::new(resolve_project(project.as_deref())?);
            new.scope_type.clone_from(scope_type);
            new.scope_id.clone_from(scope_id);
            new.title.clone_from(title);
            new.metadata = parse_metadata(metadata.as_deref())?;

            let thread = take_first(models.threads.insert(vec![new])?, "thread")?;
            if json {
                print_json(&thread)
            } else {
                println!("Created thread {}", thread.id.bold());
                Ok(())
            }
        }

        ThreadCommands::Ensure {
            project,
            scope_type,
            scope_id,
            title,
        } => {
            let project = resolve_project(project.as_deref())?;
            let thread = models
                .threads
                .get_or_create(&project, scope_type, scope_id, title.as_deref())?;
            if json {
                print_json(&thread)
            } else {
                print_thread(&thread);
                Ok(())
            }
        }

        ThreadCommands::List { project } => {
            let project = resolve_project(project.as_deref())?;
            let mut threads = models.threads.list_by_project(&project)?;
            threads.sort_by(|a, b| a.id.cmp(&b.id));

            if json {
                let count = threads.len();
                return print_json(&ThreadListOutput { threads, count });
            }
            if threads.is_empty() {
                println!("No threads in project {project}.");
                return Ok(());
            }
            for thread in &threads {
                println!(
                    "{}  {}  {}",
                    thread.id.dimmed(),
                    scope_label(thread),
                    thread.title.as_deref().unwrap_or("(untitled)")
                );
            }
            Ok(())
        }

        ThreadCommands::Show { id, items } => {
            if *items {
                let full = models
                    .get_thread_with_items(id)?
                    .ok_or_else(|| Error::ThreadNotFound { id: id.clone() })?;
                if json {
                    return print_json(&full);
                }
                print_thread(&full.thread);
                println!();
                for item in &full.items {
                    print_item_line(item);
                }
                return Ok(());
            }

            let thread = models
                .threads
                .select_by_id(id)?
                .ok_or_else(|| Error::ThreadNotFound { id: id.clone() })?;
            if json {
                print_json(&thread)
            } else {
                print_thread(&thread);
                println!("  Items:    {}", models.items.count(id)?);
                Ok(())
            }
        }

        ThreadCommands::Update {
            id,
            title,
            metadata,
        } => {
            let update = ThreadUpdate {
                title: title.clone(),
                metadata: parse_metadata(metadata.as_deref())?,
            };
            let thread = models
                .threads
                .update_thread(id, update)?
                .ok_or_else(|| Error::ThreadNotFound { id: id.clone() })?;
            if json {
                print_json(&thread)
            } else {
                println!("Updated thread {}", thread.id.bold());
                Ok(())
            }
        }

        ThreadCommands::Delete { id } => {
            if models.threads.select_by_id(id)?.is_none() {
                return Err(Error::ThreadNotFound { id: id.clone() });
            }
            models.threads.delete(&[Condition::eq("id", id.as_str())])?;
            if json {
                print_json(&DeleteOutput {
                    id: id.clone(),
                    deleted: true,
                })
            } else {
                println!("Deleted thread {id}");
                Ok(())
            }
        }
    }
}

fn scope_label(thread: &Thread) -> String {
    match (&thread.scope_type, &thread.scope_id) {
        (Some(t), Some(s)) => format!("{t}:{s}"),
        _ => "-".to_string(),
    }
}

fn print_thread(thread: &Thread) {
    println!(
        "{} {}",
        "Thread".cyan().bold(),
        thread.title.as_deref().unwrap_or("(untitled)").bold()
    );
    println!("  ID:       {}", thread.id);
    println!("  Project:  {}", thread.project_id);
    println!("  Scope:    {}", scope_label(thread));
    println!("  Created:  {}", short_time(thread.created_at));
    println!("  Updated:  {}", short_time(thread.updated_at));
    if let Some(metadata) = &thread.metadata {
        println!("  Metadata: {metadata}");
    }
}

pub(crate) fn print_item_line(item: &Item) {
    let text = item.text();
    let summary = match text.lines().next() {
        Some(line) => line.to_string(),
        None => item
            .parts
            .iter()
            .map(MessagePart::kind)
            .collect::<Vec<_>>()
            .join(", "),
    };
    println!(
        "{}  {:<9} {:<8} {}",
        item.id.dimmed(),
        item.role.as_str(),
        format!("[{}]", item.visibility).dimmed(),
        summary
    );
}
