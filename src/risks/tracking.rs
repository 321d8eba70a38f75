//! Risk tracking overlay
//!
//! User-entered dispositions keyed by synthetic id. The overlay outlives a
//! single evaluation run: it is loaded before rules run and saved after a
//! disposition changes. A synthetic id without an entry is `unchecked`.

use crate::models::RiskStatus;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Disposition of one risk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RiskTracking {
    pub status: RiskStatus,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub justification: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub checked_by: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub ticket: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
}

impl RiskTracking {
    pub fn new(status: RiskStatus) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    pub fn justified(mut self, justification: impl Into<String>) -> Self {
        self.justification = justification.into();
        self
    }

    pub fn checked_by(mut self, who: impl Into<String>) -> Self {
        self.checked_by = who.into();
        self
    }

    pub fn with_ticket(mut self, ticket: impl Into<String>) -> Self {
        self.ticket = ticket.into();
        self
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }
}

/// Synthetic id to disposition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingOverlay {
    entries: BTreeMap<String, RiskTracking>,
}

impl TrackingOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the overlay from a JSON file. A missing file is an empty overlay.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No tracking file at {}, all risks unchecked", path.display());
            return Ok(Self::default());
        }
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read tracking file {}", path.display()))?;
        let overlay: Self = serde_json::from_str(&data)
            .with_context(|| format!("Invalid tracking file {}", path.display()))?;
        debug!("Loaded {} tracking entries from {}", overlay.len(), path.display());
        Ok(overlay)
    }

    /// Write the overlay as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)
            .with_context(|| format!("Failed to write tracking file {}", path.display()))?;
        Ok(())
    }

    pub fn get(&self, synthetic_id: &str) -> Option<&RiskTracking> {
        self.entries.get(synthetic_id)
    }

    /// Status of a risk, `unchecked` when nothing was recorded
    pub fn status_of(&self, synthetic_id: &str) -> RiskStatus {
        self.entries
            .get(synthetic_id)
            .map(|t| t.status)
            .unwrap_or_default()
    }

    pub fn is_still_at_risk(&self, synthetic_id: &str) -> bool {
        self.status_of(synthetic_id).is_still_at_risk()
    }

    /// Record a disposition, returning the one it replaced
    pub fn set(&mut self, synthetic_id: impl Into<String>, tracking: RiskTracking) -> Option<RiskTracking> {
        self.entries.insert(synthetic_id.into(), tracking)
    }

    pub fn remove(&mut self, synthetic_id: &str) -> Option<RiskTracking> {
        self.entries.remove(synthetic_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RiskTracking)> {
        self.entries.iter().map(|(id, t)| (id.as_str(), t))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose synthetic id is not among the current risks
    pub fn orphaned<'a>(&'a self, current_ids: &[&str]) -> Vec<&'a str> {
        self.entries
            .keys()
            .map(String::as_str)
            .filter(|id| !current_ids.contains(id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_absent_entry_is_unchecked() {
        let overlay = TrackingOverlay::new();
        assert_eq!(overlay.status_of("anything@x"), RiskStatus::Unchecked);
        assert!(overlay.is_still_at_risk("anything@x"));
    }

    #[test]
    fn test_set_and_remove() {
        let mut overlay = TrackingOverlay::new();
        assert!(overlay
            .set("cat@a", RiskTracking::new(RiskStatus::Mitigated))
            .is_none());
        assert!(!overlay.is_still_at_risk("cat@a"));

        let previous = overlay.set("cat@a", RiskTracking::new(RiskStatus::Accepted));
        assert_eq!(previous.map(|t| t.status), Some(RiskStatus::Mitigated));
        assert!(overlay.is_still_at_risk("cat@a"));

        overlay.remove("cat@a");
        assert!(overlay.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("tracking.json");

        let mut overlay = TrackingOverlay::new();
        overlay.set(
            "missing-vault@db",
            RiskTracking::new(RiskStatus::FalsePositive)
                .justified("vault is provided by the platform")
                .checked_by("ops")
                .with_ticket("SEC-12")
                .on(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()),
        );
        overlay.save(&path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("\"false-positive\""));
        assert!(written.contains("\"2024-03-01\""));

        let loaded = TrackingOverlay::load(&path).unwrap();
        assert_eq!(loaded, overlay);
    }

    #[test]
    fn test_load_missing_and_broken_files() {
        let dir = TempDir::new().unwrap();
        let missing = TrackingOverlay::load(&dir.path().join("none.json")).unwrap();
        assert!(missing.is_empty());

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{ not json").unwrap();
        assert!(TrackingOverlay::load(&broken).is_err());
    }

    #[test]
    fn test_orphaned_entries() {
        let mut overlay = TrackingOverlay::new();
        overlay.set("cat@kept", RiskTracking::default());
        overlay.set("cat@gone", RiskTracking::default());
        assert_eq!(overlay.orphaned(&["cat@kept"]), vec!["cat@gone"]);
    }
}
