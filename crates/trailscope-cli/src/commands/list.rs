//! List command implementation.

use crate::error::CliError;
use crate::output::{self, EventRow};
use tracing::debug;
use trailscope_query::{compile_filter, parse_conditions, TrailOptions, Trails};
use trailscope_store::{EventFilter, TrailDb};

pub fn run(
    db: String,
    filter: Option<String>,
    map: bool,
    max_events: Option<u64>,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let db = TrailDb::open(&db)?;

    let compiled: Option<EventFilter> = match filter {
        Some(arg) => {
            let conditions = parse_conditions(&load_conditions(&arg)?)?;
            Some(compile_filter(&db, &conditions)?)
        }
        None => None,
    };

    let mut options = TrailOptions::default();
    if map {
        options = options.as_map();
    }
    if let Some(filter) = compiled.as_ref() {
        options = options.with_filter(filter);
    }

    if !json {
        output::print_table_header(db.field_names(), map);
    }

    let mut event_count: u64 = 0;
    for pair in Trails::new(&db).events(options) {
        if max_events.is_some_and(|max| event_count >= max) {
            debug!(event_count, "event limit reached");
            break;
        }

        let (uuid, event) = pair?;
        if json {
            println!("{}", serde_json::to_string(&EventRow { uuid, event: &event })?);
        } else {
            println!("{}", output::format_table_row(&uuid, &event));
        }
        event_count += 1;
    }

    Ok(())
}

/// Inline JSON when `arg` looks like an array, otherwise a file path.
fn load_conditions(arg: &str) -> Result<String, CliError> {
    if arg.trim_start().starts_with('[') {
        return Ok(arg.to_string());
    }
    std::fs::read_to_string(arg).map_err(|source| CliError::FilterFile {
        path: arg.to_string(),
        source,
    })
}
