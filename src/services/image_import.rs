use std::path::Path;

use image::ImageFormat;
use serde_json::Value;
use tracing::info;

use crate::models::{DEFAULT_TARGET, Record, coerce_number, coerce_value, next_record_id};
use crate::services::config_loader::VisionConfig;
use crate::services::import_error::ImportError;
use crate::services::vision_client::VisionClient;

pub const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

pub fn mime_type_for(path: &Path) -> Option<&'static str> {
    ImageFormat::from_path(path)
        .ok()
        .map(|format| format.to_mime_type())
}

fn json_number(value: &Value, default: f64) -> f64 {
    match value {
        Value::Number(number) => number.as_f64().map_or(default, |n| coerce_value(n, default)),
        Value::String(text) => coerce_number(text, default),
        Value::Bool(true) => 1.0,
        _ => default,
    }
}

fn entry_name(entry: &Value, index: usize) -> String {
    match entry.get("name") {
        Some(Value::String(name)) if !name.is_empty() => name.clone(),
        Some(Value::Number(number)) if number.as_f64().is_some_and(|n| n != 0.0) => {
            number.to_string()
        }
        _ => format!("Unknown {index}"),
    }
}

/// Maps whatever the model returned onto records. The `pickers` list must be
/// present; everything inside it is coerced rather than validated.
pub fn normalize_extraction(result: &Value) -> Result<Vec<Record>, ImportError> {
    let entries = result
        .get("pickers")
        .and_then(Value::as_array)
        .ok_or(ImportError::MalformedResult)?;

    let records = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let hours: Vec<f64> = entry
                .get("hours")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(|v| json_number(v, 0.0)).collect())
                .unwrap_or_default();
            let target = entry
                .get("target")
                .map_or(DEFAULT_TARGET, |v| json_number(v, DEFAULT_TARGET));

            Record::new(
                next_record_id("img", index),
                entry_name(entry, index),
                hours,
                target,
            )
        })
        .collect::<Vec<_>>();

    info!("Normalized {} records from image extraction", records.len());
    Ok(records)
}

/// Full image path: read the file, ask the vision service, normalize.
pub async fn import_image(path: &Path, config: &VisionConfig) -> Result<Vec<Record>, ImportError> {
    let mime_type = mime_type_for(path).ok_or_else(|| {
        ImportError::SourceUnreadable(format!("unsupported image type: {}", path.display()))
    })?;
    let bytes = std::fs::read(path)
        .map_err(|err| ImportError::SourceUnreadable(format!("{}: {err}", path.display())))?;

    let client = VisionClient::from_config(config)
        .map_err(|err| ImportError::ExtractionFailed(err.to_string()))?;
    let result = client
        .extract_scoreboard(&bytes, mime_type)
        .await
        .map_err(|err| ImportError::ExtractionFailed(err.to_string()))?;

    normalize_extraction(&result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entries_are_padded_truncated_and_defaulted() {
        let result = json!({
            "pickers": [
                { "name": "Alice", "hours": [10, 20, 30], "target": 600 },
                { "name": "Bob", "hours": [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 50, 50] },
                { "hours": ["7", "x", null, true] }
            ]
        });
        let records = normalize_extraction(&result).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].total(), 60.0);
        assert_eq!(records[0].target, 600.0);
        assert_eq!(records[0].hours()[3..], [0.0; 7]);

        assert_eq!(records[1].total(), 10.0);
        assert_eq!(records[1].target, DEFAULT_TARGET);

        assert_eq!(records[2].name, "Unknown 2");
        assert_eq!(records[2].total(), 8.0);
        assert!(records[2].id().starts_with("img-2-"));
    }

    #[test]
    fn unparseable_target_falls_back() {
        let result = json!({ "pickers": [{ "name": "Cy", "hours": [5], "target": "soon" }] });
        let records = normalize_extraction(&result).unwrap();
        assert_eq!(records[0].target, DEFAULT_TARGET);
    }

    #[test]
    fn missing_pickers_is_malformed() {
        assert_eq!(
            normalize_extraction(&json!({ "rows": [] })),
            Err(ImportError::MalformedResult)
        );
        assert_eq!(
            normalize_extraction(&json!({ "pickers": "none" })),
            Err(ImportError::MalformedResult)
        );
        assert_eq!(
            normalize_extraction(&json!([1, 2, 3])),
            Err(ImportError::MalformedResult)
        );
    }

    #[test]
    fn empty_pickers_clears_the_roster() {
        assert_eq!(normalize_extraction(&json!({ "pickers": [] })), Ok(Vec::new()));
    }

    #[test]
    fn image_paths_are_recognised() {
        assert!(is_image_path(Path::new("board.PNG")));
        assert!(is_image_path(Path::new("shot.jpeg")));
        assert!(!is_image_path(Path::new("board.xlsx")));
        assert_eq!(mime_type_for(Path::new("shot.jpg")), Some("image/jpeg"));
        assert_eq!(mime_type_for(Path::new("shot.webp")), Some("image/webp"));
    }
}
