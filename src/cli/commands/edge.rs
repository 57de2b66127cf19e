//! Edge command implementations.

use crate::cli::EdgeCommands;
use crate::cli::commands::{open_backend, print_json};
use crate::config::default_request_id;
use crate::error::Result;
use crate::model::Edge;
use crate::store::ThreadModels;
use crate::validate::normalize_edge_type;
use colored::Colorize;
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;

#[derive(Serialize)]
struct EdgeListOutput {
    edges: Vec<Edge>,
    count: usize,
}

#[derive(Serialize)]
struct ReadyOutput<'a> {
    item_id: &'a str,
    ready: bool,
    waiting_on: Vec<String>,
}

/// Execute edge commands.
pub fn execute(command: &EdgeCommands, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let backend = open_backend(db_path)?;
    let models = ThreadModels::new(&backend);

    match command {
        EdgeCommands::Add {
            thread_id,
            from,
            to,
            edge_type,
            request_id,
        } => {
            let request_id = request_id.clone().unwrap_or_else(default_request_id);
            let edge = models.edges.add_dependency(
                thread_id,
                from,
                to,
                &request_id,
                normalize_edge_type(edge_type)?,
            )?;
            if json {
                print_json(&edge)
            } else {
                println!(
                    "Added edge {} {} {} ({})",
                    edge.from_item_id,
                    "->".dimmed(),
                    edge.to_item_id,
                    edge.edge_type
                );
                Ok(())
            }
        }

        EdgeCommands::List { thread_id } => {
            let edges = models.edges.list_by_thread(thread_id)?;
            if json {
                let count = edges.len();
                return print_json(&EdgeListOutput { edges, count });
            }
            if edges.is_empty() {
                println!("No edges.");
            }
            for edge in &edges {
                println!(
                    "{}  {} -> {}  [{}]",
                    edge.id.dimmed(),
                    edge.from_item_id,
                    edge.to_item_id,
                    edge.edge_type
                );
            }
            Ok(())
        }

        EdgeCommands::Dag { thread_id } => {
            let dag = models.edges.get_dag_structure(thread_id)?;
            if json {
                return print_json(&dag);
            }
            println!("{} ({} nodes)", "Nodes".cyan().bold(), dag.nodes.len());
            for node in &dag.nodes {
                println!("  {node}");
            }
            println!("{} ({} edges)", "Edges".cyan().bold(), dag.edges.len());
            for edge in &dag.edges {
                println!("  {} -> {}  [{}]", edge.from, edge.to, edge.edge_type);
            }
            Ok(())
        }

        EdgeCommands::Ready { item_id, completed } => {
            let completed: HashSet<String> = completed.iter().cloned().collect();
            let ready = models.edges.are_dependencies_satisfied(item_id, &completed)?;
            let waiting_on: Vec<String> = models
                .edges
                .get_dependencies(item_id)?
                .into_iter()
                .map(|e| e.from_item_id)
                .filter(|id| !completed.contains(id))
                .collect();

            if json {
                return print_json(&ReadyOutput {
                    item_id,
                    ready,
                    waiting_on,
                });
            }
            if ready {
                println!("{} {item_id} is ready", "✓".green());
            } else {
                println!("{} {item_id} is waiting on:", "✗".red());
                for id in &waiting_on {
                    println!("  {id}");
                }
            }
            Ok(())
        }
    }
}
