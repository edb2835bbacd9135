//! Build command implementation.

use crate::error::CliError;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use tracing::debug;
use trailscope_codec::TrailUuid;
use trailscope_store::TrailDbConstructor;

#[derive(Deserialize)]
struct InputEvent {
    uuid: TrailUuid,
    timestamp: u64,
    values: Vec<String>,
}

pub fn run(
    output: String,
    fields: Vec<String>,
    input: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let reader = BufReader::new(File::open(&input)?);
    let mut cons = TrailDbConstructor::create(&output, &fields)?;

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let bad_line = |reason: String| CliError::BadInputLine {
            path: input.clone(),
            line: i + 1,
            reason,
        };

        let event: InputEvent =
            serde_json::from_str(&line).map_err(|e| bad_line(e.to_string()))?;
        cons.add(&event.uuid, event.timestamp, &event.values)
            .map_err(|e| bad_line(e.to_string()))?;
    }

    let (num_trails, num_events) = (cons.num_trails(), cons.num_events());
    debug!(num_trails, num_events, "input read");
    cons.finalize()?;

    println!(
        "Built {}: {} trails, {} events",
        output, num_trails, num_events
    );
    Ok(())
}
