//! Output formatting utilities.

use serde::Serialize;
use trailscope_codec::TrailUuid;
use trailscope_query::Event;

/// One event together with its trail, as printed in JSON mode.
#[derive(Serialize)]
pub struct EventRow<'a> {
    pub uuid: TrailUuid,
    #[serde(flatten)]
    pub event: &'a Event,
}

/// Formats a value as pretty JSON.
pub fn format_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Formats an event as a tab-separated row: uuid, timestamp, then values
/// (`name=value` pairs in map mode).
pub fn format_table_row(uuid: &TrailUuid, event: &Event) -> String {
    let mut row = format!("{}\t{}", uuid, event.timestamp);
    match &event.fields {
        Some(fields) => {
            for (name, value) in fields {
                row.push('\t');
                row.push_str(name);
                row.push('=');
                row.push_str(value);
            }
        }
        None => {
            for value in &event.values {
                row.push('\t');
                row.push_str(value);
            }
        }
    }
    row
}

/// Prints table header.
pub fn print_table_header(fields: &[String], map: bool) {
    println!("{}", table_header(fields, map));
}

/// Column titles; map-mode rows name their own values, so only the fixed
/// columns get a title.
fn table_header(fields: &[String], map: bool) -> String {
    let mut header = String::from("UUID\tTIMESTAMP");
    if !map {
        for field in fields {
            header.push('\t');
            header.push_str(&field.to_uppercase());
        }
    }
    header
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn event(fields: Option<BTreeMap<String, String>>) -> Event {
        Event {
            timestamp: 7,
            values: vec!["a".to_string(), String::new()],
            fields,
        }
    }

    #[test]
    fn table_row_lists_values_in_order() {
        let uuid = TrailUuid::from_bytes([0x11; 16]);
        assert_eq!(
            format_table_row(&uuid, &event(None)),
            "11111111-1111-1111-1111-111111111111\t7\ta\t"
        );
    }

    #[test]
    fn table_row_names_values_in_map_mode() {
        let uuid = TrailUuid::from_bytes([0x11; 16]);
        let fields = BTreeMap::from([
            ("f1".to_string(), "a".to_string()),
            ("f2".to_string(), String::new()),
        ]);
        let row = format_table_row(&uuid, &event(Some(fields)));
        assert!(row.ends_with("\t7\tf1=a\tf2="));
    }

    #[test]
    fn header_titles_fields_only_without_map() {
        let fields = vec!["f1".to_string(), "f2".to_string()];
        assert_eq!(table_header(&fields, false), "UUID\tTIMESTAMP\tF1\tF2");
        assert_eq!(table_header(&fields, true), "UUID\tTIMESTAMP");
    }

    #[test]
    fn json_row_flattens_event() {
        let uuid = TrailUuid::from_bytes([0x22; 16]);
        let event = event(None);
        let json = serde_json::to_value(EventRow {
            uuid,
            event: &event,
        })
        .unwrap();
        assert_eq!(json["uuid"], "22222222-2222-2222-2222-222222222222");
        assert_eq!(json["timestamp"], 7);
        assert!(json.get("fields").is_none());
    }
}
