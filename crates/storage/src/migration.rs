// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Settings document migrations.
//!
//! Each migration is a pure, single-step transform of the raw JSON document
//! from one `version` to the next. The registry chains them until the
//! document reaches the requested version. Steps only touch keys that are
//! still in their old shape, so re-applying a step is a no-op.

use serde_json::{json, Map, Value};
use thiserror::Error;

/// Version assumed for documents written before the field existed.
const UNVERSIONED: u32 = 1;

/// Errors that can occur during migration
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("migration v{from}→v{to} failed: {reason}")]
    Failed { from: u32, to: u32, reason: String },
    #[error("no migration path from v{0} to v{1}")]
    NoPath(u32, u32),
    #[error("settings version {0} is newer than supported ({1})")]
    TooNew(u64, u32),
}

/// A migration from one settings version to the next.
pub trait Migration: Send + Sync {
    fn source_version(&self) -> u32;
    fn target_version(&self) -> u32;
    fn migrate(&self, document: &mut Value) -> Result<(), MigrationError>;
}

/// Ordered set of migrations for upgrading settings documents.
pub struct MigrationRegistry {
    migrations: Vec<Box<dyn Migration>>,
}

impl MigrationRegistry {
    /// Registry with every known migration.
    pub fn new() -> Self {
        Self::with_migrations(vec![
            Box::new(AddNotificationsAndUploadMode),
            Box::new(NestBodyAndAdvanced),
            Box::new(PerPartPreferences),
        ])
    }

    pub fn with_migrations(migrations: Vec<Box<dyn Migration>>) -> Self {
        Self { migrations }
    }

    /// Version recorded in a raw document.
    pub fn version_of(document: &Value) -> u64 {
        document
            .get("version")
            .and_then(|v| v.as_u64())
            .unwrap_or(u64::from(UNVERSIONED))
    }

    /// Migrate a document to the target version.
    pub fn migrate_to(&self, mut document: Value, target: u32) -> Result<Value, MigrationError> {
        let found = Self::version_of(&document);
        let current = match u32::try_from(found) {
            Ok(v) if v <= target => v,
            _ => return Err(MigrationError::TooNew(found, target)),
        };

        if current == target {
            return Ok(document);
        }

        let mut version = current;
        while version < target {
            let migration = self
                .migrations
                .iter()
                .find(|m| m.source_version() == version)
                .ok_or(MigrationError::NoPath(version, target))?;

            migration.migrate(&mut document)?;
            version = migration.target_version();
            tracing::info!(version, "settings migrated");

            if let Some(obj) = document.as_object_mut() {
                obj.insert("version".into(), version.into());
            }
        }
        Ok(document)
    }
}

impl Default for MigrationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// v1 → v2: notification preferences and upload mode appear.
pub struct AddNotificationsAndUploadMode;

impl Migration for AddNotificationsAndUploadMode {
    fn source_version(&self) -> u32 {
        1
    }

    fn target_version(&self) -> u32 {
        2
    }

    fn migrate(&self, document: &mut Value) -> Result<(), MigrationError> {
        let root = root_object(document, self)?;

        root.entry("notifications")
            .or_insert_with(|| json!({ "run": true, "allRuns": false }));

        let app = child_object(root, "app", self)?;
        app.entry("uploadMode")
            .or_insert_with(|| Value::from("add-queue"));
        Ok(())
    }
}

/// v2 → v3: `processing.useCpu` becomes `processing.device`, and flat
/// preferences move under `body` / `advanced`.
pub struct NestBodyAndAdvanced;

impl Migration for NestBodyAndAdvanced {
    fn source_version(&self) -> u32 {
        2
    }

    fn target_version(&self) -> u32 {
        3
    }

    fn migrate(&self, document: &mut Value) -> Result<(), MigrationError> {
        let root = root_object(document, self)?;

        if let Some(processing) = root.get_mut("processing").and_then(Value::as_object_mut) {
            if let Some(use_cpu) = processing.remove("useCpu") {
                let device = if use_cpu.as_bool().unwrap_or(false) {
                    "CPU"
                } else {
                    "GPU"
                };
                processing.insert("device".into(), device.into());
            }
        }

        let preferences = child_object(root, "preferences", self)?;
        let executions = preferences.remove("executions");
        let scale_mode = preferences.remove("scaleMode");

        if let Some(executions) = executions {
            child_object(preferences, "body", self)?.insert("executions".into(), executions);
        }
        if let Some(scale_mode) = scale_mode {
            child_object(preferences, "advanced", self)?.insert("scaleMode".into(), scale_mode);
        }
        Ok(())
    }
}

/// v3 → v4: the parallel `sizes` / `randomize` / `progressive` maps fold into
/// one `{size, randomize, progressive}` object per body part.
pub struct PerPartPreferences;

impl Migration for PerPartPreferences {
    fn source_version(&self) -> u32 {
        3
    }

    fn target_version(&self) -> u32 {
        4
    }

    fn migrate(&self, document: &mut Value) -> Result<(), MigrationError> {
        let root = root_object(document, self)?;
        let preferences = child_object(root, "preferences", self)?;

        let sizes = take_map(preferences, "sizes");
        let randomize = take_map(preferences, "randomize");
        let progressive = take_map(preferences, "progressive");

        let mut parts: Vec<&String> = sizes
            .keys()
            .chain(randomize.keys())
            .chain(progressive.keys())
            .collect();
        parts.sort();
        parts.dedup();

        let mut folded = Map::new();
        for part in parts {
            folded.insert(
                part.clone(),
                json!({
                    "size": sizes.get(part).and_then(Value::as_f64).unwrap_or(1.0),
                    "randomize": randomize.get(part).and_then(Value::as_bool).unwrap_or(false),
                    "progressive": progressive.get(part).and_then(Value::as_bool).unwrap_or(false),
                }),
            );
        }

        let body = child_object(preferences, "body", self)?;
        for (part, prefs) in folded {
            body.insert(part, prefs);
        }
        Ok(())
    }
}

fn failed(step: &dyn Migration, reason: impl Into<String>) -> MigrationError {
    MigrationError::Failed {
        from: step.source_version(),
        to: step.target_version(),
        reason: reason.into(),
    }
}

fn root_object<'a>(
    document: &'a mut Value,
    step: &dyn Migration,
) -> Result<&'a mut Map<String, Value>, MigrationError> {
    document
        .as_object_mut()
        .ok_or_else(|| failed(step, "settings document is not an object"))
}

/// Get `parent[key]` as an object, creating it when absent.
fn child_object<'a>(
    parent: &'a mut Map<String, Value>,
    key: &str,
    step: &dyn Migration,
) -> Result<&'a mut Map<String, Value>, MigrationError> {
    parent
        .entry(key)
        .or_insert_with(|| Value::Object(Map::new()))
        .as_object_mut()
        .ok_or_else(|| failed(step, format!("'{key}' is not an object")))
}

/// Remove `parent[key]` if it is an object; other shapes are left alone.
fn take_map(parent: &mut Map<String, Value>, key: &str) -> Map<String, Value> {
    match parent.get(key) {
        Some(Value::Object(_)) => match parent.remove(key) {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        },
        _ => Map::new(),
    }
}

#[cfg(test)]
#[path = "migration_tests.rs"]
mod tests;
