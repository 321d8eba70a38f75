//! Model documents on disk
//!
//! A model is a JSON (`.json`) or TOML (`.toml`) document. Communication links
//! may be nested under the technical asset that sends them, in which case the
//! link source defaults to that asset, or listed at the top level with an
//! explicit `source`.
//!
//! ```toml
//! title = "Shop"
//!
//! [[technical_assets]]
//! id = "web"
//! title = "Web Shop"
//! technology = "web-application"
//!
//! [[technical_assets.communication_links]]
//! id = "web-db"
//! target = "db"
//! protocol = "jdbc-encrypted"
//! ```

use super::builder::GraphBuilder;
use super::entities::{CommunicationLink, DataAsset, SharedRuntime, TechnicalAsset, TrustBoundary};
use super::store::ThreatGraph;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// A technical asset together with the links it sends
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetDocument {
    #[serde(flatten)]
    pub asset: TechnicalAsset,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub communication_links: Vec<CommunicationLink>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelDocument {
    pub title: String,
    pub description: String,
    pub technical_assets: Vec<AssetDocument>,
    pub data_assets: Vec<DataAsset>,
    pub communication_links: Vec<CommunicationLink>,
    pub trust_boundaries: Vec<TrustBoundary>,
    pub shared_runtimes: Vec<SharedRuntime>,
}

impl ModelDocument {
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse JSON model")
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML model")
    }

    /// Convert into a validated graph
    pub fn into_graph(self) -> Result<ThreatGraph> {
        let mut builder = GraphBuilder::new(self.title).description(self.description);
        let mut links = self.communication_links;

        for doc in self.technical_assets {
            let owner = doc.asset.id.clone();
            for mut link in doc.communication_links {
                if link.source_id.is_empty() {
                    link.source_id = owner.clone();
                } else if link.source_id != owner {
                    bail!(
                        "Communication link '{}' is nested under '{}' but declares source '{}'",
                        link.id,
                        owner,
                        link.source_id
                    );
                }
                links.push(link);
            }
            builder = builder.technical_asset(doc.asset);
        }

        let graph = builder
            .data_assets(self.data_assets)
            .communication_links(links)
            .trust_boundaries(self.trust_boundaries)
            .shared_runtimes(self.shared_runtimes)
            .build()
            .context("Model failed validation")?;
        Ok(graph)
    }
}

/// Load and validate a model document.
///
/// The format is chosen by file extension.
pub fn load_model(path: &Path) -> Result<ThreatGraph> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read model {}", path.display()))?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let document = match extension.as_str() {
        "json" => ModelDocument::from_json_str(&content),
        "toml" => ModelDocument::from_toml_str(&content),
        "yaml" | "yml" => bail!(
            "YAML models are not supported; convert {} to JSON or TOML",
            path.display()
        ),
        other => bail!(
            "Unsupported model format '{}' for {} (expected .json or .toml)",
            other,
            path.display()
        ),
    }
    .with_context(|| format!("Invalid model {}", path.display()))?;

    debug!(
        "Parsed model '{}' with {} technical assets",
        document.title,
        document.technical_assets.len()
    );
    let graph = document.into_graph()?;
    info!("Loaded model '{}' from {}", graph.title(), path.display());
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::technology::Protocol;
    use std::fs;
    use tempfile::TempDir;

    const TOML_MODEL: &str = r#"
title = "Shop"

[[technical_assets]]
id = "web"
title = "Web Shop"
technology = "web-application"
internet = true

[[technical_assets.communication_links]]
id = "web-db"
target = "db"
protocol = "jdbc-encrypted"
data_assets_sent = ["orders"]

[[technical_assets]]
id = "db"
title = "Database"
type = "datastore"
technology = "database"
data_assets_stored = ["orders"]

[[data_assets]]
id = "orders"
title = "Orders"
confidentiality = "confidential"

[[trust_boundaries]]
id = "net"
type = "network-cloud-provider"
technical_assets_inside = ["web", "db"]
"#;

    #[test]
    fn test_load_toml_model() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.toml");
        fs::write(&path, TOML_MODEL).unwrap();

        let graph = load_model(&path).unwrap();
        assert_eq!(graph.title(), "Shop");
        let link = graph.communication_link("web-db").unwrap();
        assert_eq!(link.source_id, "web");
        assert_eq!(link.protocol, Protocol::JdbcEncrypted);
        assert_eq!(
            graph.technical_asset("db").unwrap().trust_boundary_id.as_deref(),
            Some("net")
        );
    }

    #[test]
    fn test_load_json_model() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        fs::write(
            &path,
            r#"{"title": "t", "technical_assets": [{"id": "a", "title": "A"}],
                "communication_links": [{"id": "a-a", "source": "a", "target": "a"}]}"#,
        )
        .unwrap();

        let graph = load_model(&path).unwrap();
        assert_eq!(graph.asset_count(), 1);
        assert_eq!(graph.link_count(), 1);
    }

    #[test]
    fn test_invalid_model_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.json");
        fs::write(
            &path,
            r#"{"technical_assets": [{"id": "a", "data_assets_processed": ["ghost"]}]}"#,
        )
        .unwrap();

        let err = load_model(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("ghost"));
    }

    #[test]
    fn test_yaml_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.yaml");
        fs::write(&path, "title: t").unwrap();
        let err = load_model(&path).unwrap_err();
        assert!(err.to_string().contains("YAML"));
    }

    #[test]
    fn test_nested_link_with_foreign_source_is_rejected() {
        let doc = ModelDocument::from_json_str(
            r#"{"technical_assets": [
                {"id": "a", "communication_links": [{"id": "l", "source": "b", "target": "a"}]},
                {"id": "b"}]}"#,
        )
        .unwrap();
        assert!(doc.into_graph().is_err());
    }
}
