use serde_json::Value;

use crate::campground::CampgroundRecord;

/// Pull campground records out of the API's response envelope.
///
/// The record list lives at `response.body.items.item`. The envelope is
/// hostile in several ways that are all "zero results", not errors:
/// the path may be missing entirely, `items` may be `null` or the empty
/// string, and a single-record response carries `item` as a bare object
/// rather than a one-element array. Elements that are not objects are
/// skipped.
pub fn extract_records(root: &Value) -> Vec<CampgroundRecord> {
    let Some(item) = root
        .get("response")
        .and_then(|v| v.get("body"))
        .and_then(|v| v.get("items"))
        .and_then(|v| v.get("item"))
    else {
        return Vec::new();
    };

    match item {
        Value::Array(elements) => elements.iter().filter_map(record_from).collect(),
        Value::Object(_) => record_from(item).into_iter().collect(),
        _ => Vec::new(),
    }
}

fn record_from(value: &Value) -> Option<CampgroundRecord> {
    serde_json::from_value(value.clone()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_record_array() {
        let root = json!({
            "response": { "body": { "items": { "item": [
                { "facltNm": "Camp A", "addr1": "Seoul", "mapX": "127.0", "mapY": "37.5" },
                { "facltNm": "Camp B", "addr1": "Busan", "mapX": "129.0", "mapY": "35.2" }
            ] } } }
        });
        let records = extract_records(&root);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "Camp A");
        assert_eq!(records[1].address, "Busan");
    }

    #[test]
    fn single_object_item_yields_one_record() {
        let root = json!({
            "response": { "body": { "items": { "item":
                { "facltNm": "Lone Camp", "mapX": "127.3", "mapY": "36.1" }
            } } }
        });
        let records = extract_records(&root);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Lone Camp");
    }

    #[test]
    fn missing_path_is_zero_records() {
        assert!(extract_records(&json!({})).is_empty());
        assert!(extract_records(&json!({ "response": {} })).is_empty());
        assert!(extract_records(&json!({ "response": { "body": {} } })).is_empty());
    }

    #[test]
    fn null_and_empty_string_items_are_zero_records() {
        let null_items = json!({ "response": { "body": { "items": null } } });
        assert!(extract_records(&null_items).is_empty());

        // The API serves `"items": ""` when nothing matched.
        let empty_string = json!({ "response": { "body": { "items": "" } } });
        assert!(extract_records(&empty_string).is_empty());

        let empty_array = json!({ "response": { "body": { "items": { "item": [] } } } });
        assert!(extract_records(&empty_array).is_empty());
    }

    #[test]
    fn non_object_elements_are_skipped() {
        let root = json!({
            "response": { "body": { "items": { "item": [
                "stray string",
                { "facltNm": "Kept", "mapX": "127.0", "mapY": "37.0" }
            ] } } }
        });
        let records = extract_records(&root);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Kept");
    }
}
