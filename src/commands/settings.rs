use crate::analysis::classifier::{default_rules, ClassificationRule, Matcher, RuleField};
use crate::analysis::reconcile::{DomainTerm, ReconcileConfig};
use crate::analysis::weekly::WeeklyConfig;
use crate::error::{LensError, LensResult};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

const SETTINGS_SCHEMA_VERSION: i64 = 2;
const SETTINGS_DIR: &str = ".qualitylens";

/// Input and output locations, resolved against the workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LensPaths {
    pub issues_csv: PathBuf,
    pub incidents_csv: PathBuf,
    pub weekly_dir: PathBuf,
    pub output_dir: PathBuf,
}

/// Typed view of `.qualitylens/settings.json`, handed to every command.
#[derive(Debug, Clone)]
pub struct LensSettings {
    pub workspace: PathBuf,
    pub paths: LensPaths,
    pub report_year: i32,
    pub classification_rules: Vec<ClassificationRule>,
    pub reconcile: ReconcileConfig,
    pub weekly: WeeklyConfig,
}

impl LensSettings {
    /// Built-in defaults without touching the disk.
    pub fn defaults_for(workspace: &Path) -> LensResult<Self> {
        let mut settings = default_settings();
        sanitize_settings(&mut settings);
        typed_settings(workspace, &settings)
    }
}

pub fn load_effective_settings(workspace: &Path) -> LensResult<LensSettings> {
    load_effective_settings_with(workspace, &Value::Null)
}

/// Loads settings and applies command-line overrides on top. Overrides are not
/// written back.
pub fn load_effective_settings_with(workspace: &Path, overrides: &Value) -> LensResult<LensSettings> {
    let mut settings = load_settings_from_disk(workspace)?;
    if overrides.is_object() {
        merge_settings(&mut settings, overrides);
        sanitize_settings(&mut settings);
    }
    typed_settings(workspace, &settings)
}

fn typed_settings(workspace: &Path, settings: &Value) -> LensResult<LensSettings> {
    let path_for = |key: &str| -> LensResult<PathBuf> {
        let raw = settings
            .get(key)
            .and_then(Value::as_str)
            .ok_or_else(|| LensError::Config(format!("`{key}` must be a string path")))?;
        Ok(resolve_path(workspace, raw))
    };

    let paths = LensPaths {
        issues_csv: path_for("issuesCsv")?,
        incidents_csv: path_for("incidentsCsv")?,
        weekly_dir: path_for("weeklyDir")?,
        output_dir: path_for("outputDir")?,
    };

    let report_year = settings
        .get("reportYear")
        .and_then(Value::as_u64)
        .unwrap_or(2025) as i32;

    Ok(LensSettings {
        workspace: workspace.to_path_buf(),
        paths,
        report_year,
        classification_rules: section(settings, "classificationRules")?,
        reconcile: section(settings, "reconcile")?,
        weekly: section(settings, "weekly")?,
    })
}

fn section<T: DeserializeOwned>(settings: &Value, key: &str) -> LensResult<T> {
    let value = settings
        .get(key)
        .cloned()
        .ok_or_else(|| LensError::Config(format!("missing `{key}` section")))?;
    Ok(serde_json::from_value(value)?)
}

fn resolve_path(workspace: &Path, raw: &str) -> PathBuf {
    let path = Path::new(raw);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        workspace.join(path)
    }
}

pub fn load_settings_from_disk(workspace: &Path) -> LensResult<Value> {
    let path = settings_path(workspace);
    ensure_settings_dir(workspace)?;

    let original = if path.exists() {
        let raw = fs::read_to_string(&path)?;
        serde_json::from_str::<Value>(&raw)
            .map_err(|err| LensError::Config(format!("{} is not valid JSON: {err}", path.display())))?
    } else {
        json!({})
    };

    let migrated = migrate_settings(original.clone());
    if migrated != original || !path.exists() {
        write_settings_file(&path, &migrated)?;
        log::debug!("Wrote settings to {}", path.display());
    }

    Ok(migrated)
}

pub fn settings_path(workspace: &Path) -> PathBuf {
    workspace.join(SETTINGS_DIR).join("settings.json")
}

fn ensure_settings_dir(workspace: &Path) -> LensResult<()> {
    fs::create_dir_all(workspace.join(SETTINGS_DIR))?;
    Ok(())
}

fn write_settings_file(path: &Path, settings: &Value) -> LensResult<()> {
    let raw = serde_json::to_string_pretty(settings)?;
    fs::write(path, raw)?;
    Ok(())
}

fn migrate_settings(input: Value) -> Value {
    let defaults = default_settings();
    let mut out = match input {
        Value::Object(map) => Value::Object(map),
        _ => Value::Object(Map::new()),
    };

    // Read before merging: the defaults carry the current version.
    let version = out
        .get("schema_version")
        .and_then(Value::as_i64)
        .unwrap_or(0);

    deep_merge_defaults(&mut out, &defaults);

    if version < 1 {
        rename_key(&mut out, "jiraCsv", "issuesCsv");
    }

    if version < 2 {
        // V2 moves the flat customer list and threshold into the rule tables.
        fold_private_customers(&mut out);
        fold_match_threshold(&mut out);
    }

    sanitize_settings(&mut out);
    if let Some(obj) = out.as_object_mut() {
        obj.insert("schema_version".to_string(), json!(SETTINGS_SCHEMA_VERSION));
    }

    out
}

fn default_settings() -> Value {
    json!({
        "schema_version": SETTINGS_SCHEMA_VERSION,
        "issuesCsv": "data/issues.csv",
        "incidentsCsv": "data/incidents.csv",
        "weeklyDir": "weekly",
        "outputDir": "reports",
        "reportYear": 2025,
        "classificationRules": default_rules(),
        "reconcile": ReconcileConfig::default(),
        "weekly": WeeklyConfig::default()
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

fn rename_key(target: &mut Value, from: &str, to: &str) {
    if let Some(obj) = target.as_object_mut() {
        if let Some(value) = obj.remove(from) {
            obj.insert(to.to_string(), value);
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

fn fold_private_customers(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };
    let Some(customers) = obj
        .remove("privateCustomers")
        .and_then(|v| string_list(&v))
        .filter(|customers| !customers.is_empty())
    else {
        return;
    };

    let mut rules: Vec<ClassificationRule> = obj
        .get("classificationRules")
        .cloned()
        .and_then(|v| serde_json::from_value(v).ok())
        .unwrap_or_else(default_rules);

    for rule in rules.iter_mut() {
        if rule.field == RuleField::Customer {
            if let Matcher::AnyOf { values } = &mut rule.matcher {
                *values = customers.clone();
            }
        }
    }
    obj.insert("classificationRules".to_string(), json!(rules));
}

fn fold_match_threshold(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };
    let Some(threshold) = obj.remove("matchThreshold") else {
        return;
    };
    if let Some(reconcile) = obj.get_mut("reconcile").and_then(Value::as_object_mut) {
        reconcile.insert("matchThreshold".to_string(), threshold);
    }
}

/// String array with blank entries dropped. `None` when any element is not a string.
fn string_list(value: &Value) -> Option<Vec<String>> {
    let items: Option<Vec<&str>> = value.as_array()?.iter().map(Value::as_str).collect();
    Some(
        items?
            .into_iter()
            .filter(|item| !item.trim().is_empty())
            .map(str::to_string)
            .collect(),
    )
}

fn sanitize_settings(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };

    clamp_u64(obj, "reportYear", 2000, 2100, 2025);

    ensure_string(obj, "issuesCsv", "data/issues.csv");
    ensure_string(obj, "incidentsCsv", "data/incidents.csv");
    ensure_string(obj, "weeklyDir", "weekly");
    ensure_string(obj, "outputDir", "reports");

    let rules_valid = obj
        .get("classificationRules")
        .cloned()
        .and_then(|v| serde_json::from_value::<Vec<ClassificationRule>>(v).ok())
        .is_some_and(|rules| rules.iter().all(ClassificationRule::is_valid));
    if !rules_valid {
        log::warn!("classificationRules is malformed; using the default cascade");
        obj.insert("classificationRules".to_string(), json!(default_rules()));
    }

    let reconcile_defaults = ReconcileConfig::default();
    let reconcile = obj
        .entry("reconcile".to_string())
        .or_insert_with(|| json!(reconcile_defaults));
    if let Some(map) = reconcile.as_object_mut() {
        clamp_u64(map, "namePrefixMinChars", 0, 50, 5);
        clamp_u64(map, "namePrefixChars", 1, 50, 10);
        clamp_u64(map, "namePrefixBonus", 0, 10, 2);
        clamp_u64(map, "matchThreshold", 1, 20, 2);
        ensure_string(map, "nullCustomer", &reconcile_defaults.null_customer);
        ensure_list(map, "customerTokens", &reconcile_defaults.customer_tokens);
        ensure_list(map, "stripWords", &reconcile_defaults.strip_words);
        let terms = map
            .get("domainTerms")
            .cloned()
            .and_then(|v| serde_json::from_value::<Vec<DomainTerm>>(v).ok())
            .map(|terms| terms.into_iter().filter_map(DomainTerm::without_blanks).collect::<Vec<_>>())
            .unwrap_or_else(|| reconcile_defaults.domain_terms.clone());
        map.insert("domainTerms".to_string(), json!(terms));
    } else {
        *reconcile = json!(reconcile_defaults);
    }

    let weekly_defaults = WeeklyConfig::default();
    let weekly = obj
        .entry("weekly".to_string())
        .or_insert_with(|| json!(weekly_defaults));
    if let Some(map) = weekly.as_object_mut() {
        ensure_list(map, "knownClients", &weekly_defaults.known_clients);
        ensure_list(map, "productLines", &weekly_defaults.product_lines);
        ensure_list(map, "incidentKeywords", &weekly_defaults.incident_keywords);
        ensure_list(map, "personnelKeywords", &weekly_defaults.personnel_keywords);
        ensure_string(map, "privatizationMarker", &weekly_defaults.privatization_marker);
    } else {
        *weekly = json!(weekly_defaults);
    }
}

fn clamp_u64(map: &mut Map<String, Value>, key: &str, min: u64, max: u64, default: u64) {
    let raw = map.get(key).and_then(Value::as_u64).unwrap_or(default);
    map.insert(key.to_string(), json!(raw.clamp(min, max)));
}

fn ensure_string(map: &mut Map<String, Value>, key: &str, default: &str) {
    let value = map
        .get(key)
        .and_then(Value::as_str)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(default)
        .to_string();
    map.insert(key.to_string(), json!(value));
}

fn ensure_list(map: &mut Map<String, Value>, key: &str, default: &[String]) {
    let value = map
        .get(key)
        .and_then(string_list)
        .unwrap_or_else(|| default.to_vec());
    map.insert(key.to_string(), json!(value));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::deployment::DeploymentClass;

    #[test]
    fn migrates_flat_v1_keys_into_rule_tables() {
        let input = json!({
            "schema_version": 0,
            "jiraCsv": "exports/jira.csv",
            "privateCustomers": ["福田", "新客户"],
            "matchThreshold": 3
        });

        let migrated = migrate_settings(input);
        assert_eq!(migrated["issuesCsv"], json!("exports/jira.csv"));
        assert!(migrated.get("jiraCsv").is_none());
        assert!(migrated.get("privateCustomers").is_none());
        assert_eq!(migrated["reconcile"]["matchThreshold"], json!(3));
        assert_eq!(migrated["schema_version"], json!(SETTINGS_SCHEMA_VERSION));

        let rules: Vec<ClassificationRule> =
            serde_json::from_value(migrated["classificationRules"].clone()).expect("rules");
        let any_of = rules
            .iter()
            .find_map(|r| match &r.matcher {
                Matcher::AnyOf { values } => Some(values.clone()),
                _ => None,
            })
            .expect("any_of rule");
        assert_eq!(any_of, vec!["福田", "新客户"]);
    }

    #[test]
    fn unversioned_file_is_migrated_as_v0() {
        let input = json!({
            "jiraCsv": "exports/jira.csv",
            "matchThreshold": 7,
            "privateCustomers": ["甲客户", " "]
        });

        let migrated = migrate_settings(input);
        assert_eq!(migrated["issuesCsv"], json!("exports/jira.csv"));
        assert_eq!(migrated["reconcile"]["matchThreshold"], json!(7));
        for legacy in ["jiraCsv", "matchThreshold", "privateCustomers"] {
            assert!(migrated.get(legacy).is_none(), "{legacy} left behind");
        }

        let typed = typed_settings(Path::new("/tmp/lens-ws"), &migrated).expect("typed");
        let any_of = typed
            .classification_rules
            .iter()
            .find_map(|r| match &r.matcher {
                Matcher::AnyOf { values } => Some(values.clone()),
                _ => None,
            })
            .expect("any_of rule");
        assert_eq!(any_of, vec!["甲客户"]);
    }

    #[test]
    fn invalid_json_is_an_error_and_file_is_kept() {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let path = settings_path(tmp.path());
        fs::create_dir_all(path.parent().expect("parent")).expect("create settings dir");
        let broken = "{ \"reportYear\": 2024, ";
        fs::write(&path, broken).expect("write settings");

        let err = load_settings_from_disk(tmp.path()).expect_err("broken file");
        assert!(matches!(err, LensError::Config(_)), "unexpected error: {err}");
        assert_eq!(fs::read_to_string(&path).expect("read settings"), broken);
    }

    #[test]
    fn merges_partial_settings_without_losing_existing_values() {
        let mut existing = default_settings();
        merge_settings(&mut existing, &json!({ "reportYear": 2024, "reconcile": { "matchThreshold": 3 } }));
        let migrated = migrate_settings(existing);

        assert_eq!(migrated["reportYear"], json!(2024));
        assert_eq!(migrated["reconcile"]["matchThreshold"], json!(3));
        assert_eq!(migrated["reconcile"]["namePrefixChars"], json!(10));
        assert!(migrated.get("weekly").is_some());
    }

    #[test]
    fn sanitize_clamps_and_repairs() {
        let mut settings = default_settings();
        merge_settings(
            &mut settings,
            &json!({
                "reportYear": 1900,
                "outputDir": "  ",
                "classificationRules": [{ "field": "nowhere" }],
                "reconcile": { "matchThreshold": 0, "customerTokens": "滴滴" }
            }),
        );
        sanitize_settings(&mut settings);

        assert_eq!(settings["reportYear"], json!(2000));
        assert_eq!(settings["outputDir"], json!("reports"));
        assert_eq!(settings["reconcile"]["matchThreshold"], json!(1));
        assert_eq!(
            settings["reconcile"]["customerTokens"],
            json!(ReconcileConfig::default().customer_tokens)
        );
        assert_eq!(settings["classificationRules"], json!(default_rules()));
    }

    #[test]
    fn sanitize_drops_blank_entries() {
        let mut settings = default_settings();
        merge_settings(
            &mut settings,
            &json!({
                "reconcile": {
                    "customerTokens": ["滴滴", "", "  "],
                    "stripWords": ["故障报告", " "],
                    "domainTerms": [
                        { "keyword": "表格", "triggers": ["表格", ""] },
                        { "keyword": "断电", "triggers": [" "] },
                        { "keyword": "", "triggers": ["机房"] }
                    ]
                },
                "weekly": { "knownClients": ["滴滴", ""] }
            }),
        );
        sanitize_settings(&mut settings);

        assert_eq!(settings["reconcile"]["customerTokens"], json!(["滴滴"]));
        assert_eq!(settings["reconcile"]["stripWords"], json!(["故障报告"]));
        assert_eq!(
            settings["reconcile"]["domainTerms"],
            json!([{ "keyword": "表格", "triggers": ["表格"] }])
        );
        assert_eq!(settings["weekly"]["knownClients"], json!(["滴滴"]));
    }

    #[test]
    fn blank_rule_pattern_restores_default_cascade() {
        let mut settings = default_settings();
        merge_settings(
            &mut settings,
            &json!({
                "classificationRules": [
                    { "field": "environment", "matcher": { "kind": "contains", "value": "" }, "class": "saas" }
                ]
            }),
        );
        sanitize_settings(&mut settings);
        assert_eq!(settings["classificationRules"], json!(default_rules()));
    }

    #[test]
    fn typed_settings_resolve_paths_against_workspace() {
        let workspace = Path::new("/tmp/lens-ws");
        let mut settings = default_settings();
        merge_settings(&mut settings, &json!({ "weeklyDir": "/data/weekly" }));
        sanitize_settings(&mut settings);
        let typed = typed_settings(workspace, &settings).expect("typed");

        assert_eq!(typed.paths.issues_csv, workspace.join("data/issues.csv"));
        assert_eq!(typed.paths.weekly_dir, PathBuf::from("/data/weekly"));
        assert_eq!(typed.report_year, 2025);
        assert_eq!(typed.classification_rules.last().map(|r| r.class), Some(DeploymentClass::Private));
        assert_eq!(typed.reconcile, ReconcileConfig::default());
    }
}
