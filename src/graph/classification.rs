//! Classification enumerations attached to model entities
//!
//! All enums serialize in kebab-case and display with the same spelling, so a
//! model document and a rendered report use identical words.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! kebab_display {
    ($ty:ty { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let text = match self {
                    $(Self::$variant => $text,)+
                };
                f.write_str(text)
            }
        }
    };
}

/// Confidentiality rating, lowest first
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum Confidentiality {
    #[default]
    Public,
    Internal,
    Restricted,
    Confidential,
    StrictlyConfidential,
}

kebab_display!(Confidentiality {
    Public => "public",
    Internal => "internal",
    Restricted => "restricted",
    Confidential => "confidential",
    StrictlyConfidential => "strictly-confidential",
});

impl Confidentiality {
    /// Weight used by the attractiveness estimator
    pub fn attractiveness_weight(self) -> f64 {
        match self {
            Confidentiality::Public => 8.0,
            Confidentiality::Internal => 16.0,
            Confidentiality::Restricted => 24.0,
            Confidentiality::Confidential => 32.0,
            Confidentiality::StrictlyConfidential => 64.0,
        }
    }
}

/// Integrity or availability rating, lowest first
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum Criticality {
    #[default]
    Archive,
    Operational,
    Important,
    Critical,
    MissionCritical,
}

kebab_display!(Criticality {
    Archive => "archive",
    Operational => "operational",
    Important => "important",
    Critical => "critical",
    MissionCritical => "mission-critical",
});

impl Criticality {
    /// Weight used by the attractiveness estimator
    pub fn attractiveness_weight(self) -> f64 {
        match self {
            Criticality::Archive => 4.0,
            Criticality::Operational => 8.0,
            Criticality::Important => 12.0,
            Criticality::Critical => 24.0,
            Criticality::MissionCritical => 48.0,
        }
    }
}

/// Rough volume of a data asset
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum Quantity {
    #[default]
    VeryFew,
    Few,
    Many,
    VeryMany,
}

kebab_display!(Quantity {
    VeryFew => "very-few",
    Few => "few",
    Many => "many",
    VeryMany => "very-many",
});

impl Quantity {
    pub fn factor(self) -> f64 {
        match self {
            Quantity::VeryFew => 1.0,
            Quantity::Few => 2.0,
            Quantity::Many => 3.0,
            Quantity::VeryMany => 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TechnicalAssetType {
    ExternalEntity,
    #[default]
    Process,
    Datastore,
}

kebab_display!(TechnicalAssetType {
    ExternalEntity => "external-entity",
    Process => "process",
    Datastore => "datastore",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TechnicalAssetSize {
    System,
    Service,
    #[default]
    Application,
    Component,
}

kebab_display!(TechnicalAssetSize {
    System => "system",
    Service => "service",
    Application => "application",
    Component => "component",
});

/// Execution substrate of a technical asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Machine {
    Physical,
    #[default]
    Virtual,
    Container,
    Serverless,
}

kebab_display!(Machine {
    Physical => "physical",
    Virtual => "virtual",
    Container => "container",
    Serverless => "serverless",
});

/// Encryption at rest, weakest first
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "kebab-case")]
pub enum EncryptionStyle {
    #[default]
    None,
    Transparent,
    DataWithSymmetricSharedKey,
    DataWithAsymmetricSharedKey,
    DataWithEnduserIndividualKey,
}

kebab_display!(EncryptionStyle {
    None => "none",
    Transparent => "transparent",
    DataWithSymmetricSharedKey => "data-with-symmetric-shared-key",
    DataWithAsymmetricSharedKey => "data-with-asymmetric-shared-key",
    DataWithEnduserIndividualKey => "data-with-enduser-individual-key",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Authentication {
    #[default]
    None,
    Credentials,
    SessionId,
    Token,
    ClientCertificate,
    TwoFactor,
    Externalized,
}

kebab_display!(Authentication {
    None => "none",
    Credentials => "credentials",
    SessionId => "session-id",
    Token => "token",
    ClientCertificate => "client-certificate",
    TwoFactor => "two-factor",
    Externalized => "externalized",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Authorization {
    #[default]
    None,
    TechnicalUser,
    EnduserIdentityPropagation,
}

kebab_display!(Authorization {
    None => "none",
    TechnicalUser => "technical-user",
    EnduserIdentityPropagation => "enduser-identity-propagation",
});

/// Whether a link or data asset serves the business or operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Usage {
    #[default]
    Business,
    #[serde(alias = "dev-ops")]
    Devops,
}

kebab_display!(Usage {
    Business => "business",
    Devops => "devops",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TrustBoundaryType {
    #[default]
    NetworkOnPrem,
    NetworkDedicatedHoster,
    NetworkVirtualLan,
    NetworkCloudProvider,
    NetworkCloudSecurityGroup,
    NetworkPolicyNamespaceIsolation,
    ExecutionEnvironment,
}

kebab_display!(TrustBoundaryType {
    NetworkOnPrem => "network-on-prem",
    NetworkDedicatedHoster => "network-dedicated-hoster",
    NetworkVirtualLan => "network-virtual-lan",
    NetworkCloudProvider => "network-cloud-provider",
    NetworkCloudSecurityGroup => "network-cloud-security-group",
    NetworkPolicyNamespaceIsolation => "network-policy-namespace-isolation",
    ExecutionEnvironment => "execution-environment",
});

impl TrustBoundaryType {
    pub fn is_network_boundary(self) -> bool {
        !matches!(self, TrustBoundaryType::ExecutionEnvironment)
    }
}
