//! Get command implementation.

use crate::output;
use serde_json::json;
use trailscope_codec::TrailUuid;
use trailscope_query::{Event, QueryError, Trail, TrailOptions};
use trailscope_store::TrailDb;

pub fn run(db: String, uuid: String) -> Result<(), Box<dyn std::error::Error>> {
    let db = TrailDb::open(&db)?;
    let uuid = TrailUuid::parse(&uuid).map_err(QueryError::from)?;

    let trail = Trail::find(&db, &uuid)?;
    let events = trail
        .events(&TrailOptions::default().as_map())?
        .collect::<Result<Vec<Event>, _>>()?;

    let trail = json!({
        "uuid": uuid,
        "trail_id": trail.id(),
        "events": events,
    });
    println!("{}", output::format_json(&trail));
    Ok(())
}
