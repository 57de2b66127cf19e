//! Stream command implementations.

use crate::cli::StreamCommands;
use crate::cli::commands::{open_backend, print_json, short_time};
use crate::error::{Error, Result};
use crate::model::{Stream, now_millis};
use crate::store::ThreadModels;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
struct ResumeOutput {
    stream: Stream,
    can_resume: bool,
}

#[derive(Serialize)]
struct ExpireOutput {
    expired: usize,
}

/// Execute stream commands.
pub fn execute(command: &StreamCommands, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let backend = open_backend(db_path)?;
    let models = ThreadModels::new(&backend);
    let streams = &models.streams;

    match command {
        StreamCommands::Start {
            thread_id,
            run,
            ttl_ms,
        } => {
            if let Some(ttl) = ttl_ms.filter(|t| *t <= 0) {
                return Err(Error::InvalidArgument(format!(
                    "--ttl-ms must be positive, got {ttl}"
                )));
            }
            let stream = streams.start(thread_id, run.as_deref(), *ttl_ms)?;
            if json {
                print_json(&stream)
            } else {
                println!("Started stream {}", stream.id.bold());
                Ok(())
            }
        }

        StreamCommands::Show { id } => {
            let stream = streams
                .select_by_id(id)?
                .ok_or_else(|| Error::StreamNotFound { id: id.clone() })?;
            show(&stream, json)
        }

        StreamCommands::Complete { id } => {
            let stream = streams
                .complete(id)?
                .ok_or_else(|| Error::StreamNotFound { id: id.clone() })?;
            show(&stream, json)
        }

        StreamCommands::Abort { id } => {
            let stream = streams
                .abort(id)?
                .ok_or_else(|| Error::StreamNotFound { id: id.clone() })?;
            show(&stream, json)
        }

        StreamCommands::Token { id, token } => {
            let stream = streams
                .set_resume_token(id, token)?
                .ok_or_else(|| Error::StreamNotFound { id: id.clone() })?;
            show(&stream, json)
        }

        StreamCommands::Resume { token } => {
            let stream = streams
                .get_by_resume_token(token)?
                .ok_or_else(|| Error::StreamNotFound { id: token.clone() })?;
            let can_resume = stream.is_resumable_at(now_millis());
            if json {
                return print_json(&ResumeOutput { stream, can_resume });
            }
            print_stream(&stream);
            if can_resume {
                println!("{} can resume", "✓".green());
            } else {
                println!("{} cannot resume", "✗".red());
            }
            Ok(())
        }

        StreamCommands::Expire => {
            let expired = streams.expire_stale()?;
            if json {
                print_json(&ExpireOutput { expired })
            } else {
                println!("Expired {expired} stream(s)");
                Ok(())
            }
        }
    }
}

fn show(stream: &Stream, json: bool) -> Result<()> {
    if json {
        print_json(stream)
    } else {
        print_stream(stream);
        Ok(())
    }
}

fn print_stream(stream: &Stream) {
    println!("{} {}", "Stream".cyan().bold(), stream.id.bold());
    println!("  Thread:   {}", stream.thread_id);
    println!("  Status:   {}", stream.status);
    if let Some(run_id) = &stream.run_id {
        println!("  Run:      {run_id}");
    }
    if let Some(event) = &stream.last_event_id {
        println!("  Event:    {event}");
    }
    if let Some(expires_at) = stream.expires_at {
        println!("  Expires:  {}", short_time(expires_at));
    }
    println!("  Updated:  {}", short_time(stream.updated_at));
}
