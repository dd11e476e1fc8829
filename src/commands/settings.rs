use crate::analysis::streak::DEFAULT_LOOKBACK_WEEKS;
use crate::models::targets::WeeklyTargets;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

const SETTINGS_SCHEMA_VERSION: i64 = 1;
const SETTINGS_FILE: &str = "settings.json";
const DEFAULT_DATABASE_FILE: &str = "snapshots.db";

/// Immutable configuration handed to the engines for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub targets: WeeklyTargets,
    pub streak_lookback_weeks: u32,
    pub database_path: PathBuf,
}

pub fn load_effective_settings(data_dir: &Path) -> Result<Settings, String> {
    let settings = load_settings_from_disk(data_dir)?;

    let targets = settings
        .get("weeklyTargets")
        .cloned()
        .and_then(|raw| serde_json::from_value::<WeeklyTargets>(raw).ok())
        .unwrap_or_default();

    let streak_lookback_weeks = settings
        .get("streakLookbackWeeks")
        .and_then(Value::as_u64)
        .unwrap_or(u64::from(DEFAULT_LOOKBACK_WEEKS))
        .clamp(1, 52) as u32;

    let database_file = settings
        .get("databaseFile")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_DATABASE_FILE);

    Ok(Settings {
        targets,
        streak_lookback_weeks,
        database_path: data_dir.join(database_file),
    })
}

pub fn load_settings_from_disk(data_dir: &Path) -> Result<Value, String> {
    let path = data_dir.join(SETTINGS_FILE);
    ensure_data_dir(data_dir)?;

    let original = if path.exists() {
        let raw = fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read {SETTINGS_FILE}: {e}"))?;
        serde_json::from_str::<Value>(&raw).unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable {}: {e}", path.display());
            json!({})
        })
    } else {
        json!({})
    };

    let migrated = migrate_settings(original.clone());
    if migrated != original || !path.exists() {
        write_settings_file(&path, &migrated)?;
    }

    Ok(migrated)
}

pub fn save_settings_to_disk(data_dir: &Path, settings: Value) -> Result<Value, String> {
    let path = data_dir.join(SETTINGS_FILE);
    ensure_data_dir(data_dir)?;

    let mut merged = load_settings_from_disk(data_dir).unwrap_or_else(|_| default_settings());
    merge_settings(&mut merged, &settings);

    let migrated = migrate_settings(merged);
    write_settings_file(&path, &migrated)?;
    Ok(migrated)
}

fn ensure_data_dir(data_dir: &Path) -> Result<(), String> {
    fs::create_dir_all(data_dir)
        .map_err(|e| format!("Failed to create data directory {}: {e}", data_dir.display()))
}

fn write_settings_file(path: &Path, settings: &Value) -> Result<(), String> {
    let raw = serde_json::to_string_pretty(settings)
        .map_err(|e| format!("Failed to serialize settings: {e}"))?;
    fs::write(path, raw).map_err(|e| format!("Failed to write {SETTINGS_FILE}: {e}"))
}

fn migrate_settings(input: Value) -> Value {
    let defaults = default_settings();
    let mut out = match input {
        Value::Object(map) => Value::Object(map),
        _ => Value::Object(Map::new()),
    };

    deep_merge_defaults(&mut out, &defaults);
    sanitize_settings(&mut out);
    if let Some(obj) = out.as_object_mut() {
        obj.insert("schema_version".to_string(), json!(SETTINGS_SCHEMA_VERSION));
    }

    out
}

fn default_settings() -> Value {
    json!({
        "schema_version": SETTINGS_SCHEMA_VERSION,
        "weeklyTargets": WeeklyTargets::default(),
        "streakLookbackWeeks": DEFAULT_LOOKBACK_WEEKS,
        "databaseFile": DEFAULT_DATABASE_FILE
    })
}

fn deep_merge_defaults(target: &mut Value, defaults: &Value) {
    let (Some(target_obj), Some(default_obj)) = (target.as_object_mut(), defaults.as_object()) else {
        return;
    };

    for (key, default_value) in default_obj {
        match target_obj.get_mut(key) {
            Some(existing) => {
                if existing.is_object() && default_value.is_object() {
                    deep_merge_defaults(existing, default_value);
                }
            }
            None => {
                target_obj.insert(key.clone(), default_value.clone());
            }
        }
    }
}

fn merge_settings(target: &mut Value, incoming: &Value) {
    match (target, incoming) {
        (Value::Object(target_obj), Value::Object(incoming_obj)) => {
            for (key, value) in incoming_obj {
                if let Some(existing) = target_obj.get_mut(key) {
                    merge_settings(existing, value);
                } else {
                    target_obj.insert(key.clone(), value.clone());
                }
            }
        }
        (target_slot, incoming_value) => {
            *target_slot = incoming_value.clone();
        }
    }
}

fn sanitize_settings(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };

    clamp_u64(obj, "streakLookbackWeeks", 1, 52, u64::from(DEFAULT_LOOKBACK_WEEKS));

    let valid_file = obj
        .get("databaseFile")
        .and_then(Value::as_str)
        .filter(|name| !name.trim().is_empty())
        .unwrap_or(DEFAULT_DATABASE_FILE)
        .to_string();
    obj.insert("databaseFile".to_string(), json!(valid_file));

    let defaults = WeeklyTargets::default();
    let targets = obj
        .entry("weeklyTargets".to_string())
        .or_insert_with(|| json!({}));
    if !targets.is_object() {
        *targets = json!({});
    }
    if let Some(t) = targets.as_object_mut() {
        clamp_u64(t, "prMerged", 0, 100, u64::from(defaults.pr_merged));
        clamp_u64(t, "featuresCompleted", 0, 100, u64::from(defaults.features_completed));
        clamp_u64(t, "testsWritten", 0, 500, u64::from(defaults.tests_written));
        clamp_f64(t, "bugFixRatio", 0.0, 10.0, defaults.bug_fix_ratio);
        clamp_f64(t, "onTrackThreshold", 0.25, 1.0, defaults.on_track_threshold);
    }
}

fn clamp_u64(map: &mut Map<String, Value>, key: &str, min: u64, max: u64, default: u64) {
    let raw = map.get(key).and_then(Value::as_u64).unwrap_or(default);
    map.insert(key.to_string(), json!(raw.clamp(min, max)));
}

fn clamp_f64(map: &mut Map<String, Value>, key: &str, min: f64, max: f64, default: f64) {
    let raw = map
        .get(key)
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite())
        .unwrap_or(default);
    map.insert(key.to_string(), json!(raw.clamp(min, max)));
}
