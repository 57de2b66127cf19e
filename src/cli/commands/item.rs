//! Item command implementations.

use crate::cli::ItemCommands;
use crate::cli::commands::thread::print_item_line;
use crate::cli::commands::{open_backend, parse_metadata, print_json};
use crate::config::default_request_id;
use crate::error::{Error, Result};
use crate::model::{Item, MessagePart, NewItem};
use crate::store::{SortOrder, ThreadModels};
use crate::validate::{normalize_role, normalize_visibility};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct ItemListOutput {
    items: Vec<Item>,
    count: usize,
}

#[derive(Serialize)]
struct CountOutput<'a> {
    thread_id: &'a str,
    count: usize,
}

/// Execute item commands.
pub fn execute(command: &ItemCommands, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let backend = open_backend(db_path)?;
    let models = ThreadModels::new(&backend);

    match command {
        ItemCommands::Append {
            thread_id,
            text,
            parts,
            role,
            run,
            span,
            parent,
            visibility,
            request_id,
            metadata,
        } => {
            let parts = match (text, parts) {
                (Some(text), _) => vec![MessagePart::text(text.clone())],
                (None, Some(raw)) => parse_parts(raw)?,
                (None, None) => {
                    return Err(Error::InvalidArgument(
                        "pass --text or --parts".to_string(),
                    ));
                }
            };

            let mut new = NewItem::new(
                thread_id.clone(),
                normalize_role(role)?,
                parts,
                request_id.clone().unwrap_or_else(default_request_id),
            )
            .visibility(normalize_visibility(visibility)?);
            new.run_id.clone_from(run);
            new.span_id.clone_from(span);
            new.parent_id.clone_from(parent);
            new.metadata = parse_metadata(metadata.as_deref())?;

            let item = models.items.append(new)?;
            if json {
                print_json(&item)
            } else {
                println!("Appended item {}", item.id.bold());
                Ok(())
            }
        }

        ItemCommands::List {
            thread_id,
            desc,
            visible,
            context,
        } => {
            let mut items = if *visible {
                models.items.list_visible(thread_id)?
            } else if *context {
                models.items.list_for_context(thread_id)?
            } else {
                models.items.list_by_thread(thread_id, SortOrder::Asc)?
            };
            if *desc {
                items.reverse();
            }

            if json {
                let count = items.len();
                return print_json(&ItemListOutput { items, count });
            }
            if items.is_empty() {
                println!("No items.");
            }
            for item in &items {
                print_item_line(item);
            }
            Ok(())
        }

        ItemCommands::Hide { id } => report(models.items.hide(id)?, id, json),
        ItemCommands::Archive { id } => report(models.items.archive(id)?, id, json),
        ItemCommands::Unhide { id } => report(models.items.unhide(id)?, id, json),

        ItemCommands::Count { thread_id } => {
            let count = models.items.count(thread_id)?;
            if json {
                print_json(&CountOutput { thread_id, count })
            } else {
                println!("{count}");
                Ok(())
            }
        }
    }
}

fn parse_parts(raw: &str) -> Result<Vec<MessagePart>> {
    serde_json::from_str(raw)
        .map_err(|e| Error::InvalidArgument(format!("--parts is not a valid part list: {e}")))
}

fn report(item: Option<Item>, id: &str, json: bool) -> Result<()> {
    let item = item.ok_or_else(|| Error::ItemNotFound { id: id.to_string() })?;
    if json {
        print_json(&item)
    } else {
        println!("Item {} is now {}", item.id.bold(), item.visibility);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_parts() {
        let parts = parse_parts(
            r#"[{"type": "text", "text": "hi"},
                {"type": "tool-call", "toolCallId": "c1", "toolName": "search", "args": {}}]"#,
        )
        .unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[1].kind(), "tool-call");

        assert!(matches!(
            parse_parts(r#"[{"type": "video"}]"#),
            Err(Error::InvalidArgument(_))
        ));
    }
}
