//! Info command implementation.

use serde_json::json;
use trailscope_store::{TrailDb, TrailStore};

pub fn run(db: String, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let db = TrailDb::open(&db)?;

    if json {
        let summary = json!({
            "path": db.path().display().to_string(),
            "num_trails": db.num_trails(),
            "num_events": db.num_events(),
            "num_fields": db.num_fields(),
            "min_timestamp": db.min_timestamp(),
            "max_timestamp": db.max_timestamp(),
            "fields": db.field_names(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("path:       {}", db.path().display());
    println!("trails:     {}", db.num_trails());
    println!("events:     {}", db.num_events());
    println!("timestamps: {}..{}", db.min_timestamp(), db.max_timestamp());
    println!("fields:     {}", db.field_names().join(", "));
    Ok(())
}
