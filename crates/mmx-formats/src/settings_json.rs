//! JSON machine settings.
//!
//! Every field is optional; the file is merged over `Settings::default()`
//! key by key, so it only lists what it changes, nested transports included.

use mmx_ir::Settings;
use serde_json::Value;

use crate::FormatError;

/// Load settings from JSON text and validate them.
pub fn load_settings(json: &str) -> Result<Settings, FormatError> {
    let overrides: Value = serde_json::from_str(json)?;
    let mut merged = serde_json::to_value(Settings::default())?;
    merge(&mut merged, overrides);
    let settings: Settings = serde_json::from_value(merged)?;
    settings.validate()?;
    Ok(settings)
}

/// Overlay `overrides` onto `base`, recursing into objects present in both.
fn merge(base: &mut Value, overrides: Value) {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        // unknown keys are kept so deserialization can reject them
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overrides) => *base = overrides,
    }
}
