//! Threat model graph
//!
//! Typed entities (technical assets, data assets, communication links, trust
//! boundaries, shared runtimes) held in id-sorted maps, with a petgraph index
//! over communication links.

pub mod builder;
pub mod classification;
pub mod entities;
pub mod loader;
pub mod queries;
pub mod store;
pub mod technology;

pub use builder::{GraphBuilder, GraphError};
pub use classification::{
    Authentication, Authorization, Confidentiality, Criticality, EncryptionStyle, Machine,
    Quantity, TechnicalAssetSize, TechnicalAssetType, TrustBoundaryType, Usage,
};
pub use entities::{CommunicationLink, DataAsset, SharedRuntime, TechnicalAsset, TrustBoundary};
pub use loader::{load_model, ModelDocument};
pub use store::ThreatGraph;
pub use technology::{Protocol, Technology};
