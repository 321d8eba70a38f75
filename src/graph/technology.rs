//! Technology kinds of technical assets and protocols of communication links
//!
//! Rules reason about groups of technologies ("web application", "identity
//! related", "tolerates unprotected comms") rather than single kinds, so the
//! groupings live here next to the enums instead of being repeated per rule.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Technology of a technical asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Technology {
    #[default]
    UnknownTechnology,
    ClientSystem,
    Browser,
    Desktop,
    MobileApp,
    DevopsClient,
    WebServer,
    WebApplication,
    ApplicationServer,
    Database,
    FileServer,
    LocalFileSystem,
    Erp,
    Cms,
    WebServiceRest,
    WebServiceSoap,
    Ejb,
    SearchIndex,
    SearchEngine,
    ServiceRegistry,
    ReverseProxy,
    LoadBalancer,
    BuildPipeline,
    SourcecodeRepository,
    ArtifactRegistry,
    CodeInspectionPlatform,
    Monitoring,
    LdapServer,
    ContainerPlatform,
    BatchProcessing,
    EventListener,
    IdentityProvider,
    IdentityStoreLdap,
    IdentityStoreDatabase,
    Tool,
    Cli,
    Task,
    Function,
    Gateway,
    IotDevice,
    MessageQueue,
    StreamProcessing,
    ServiceMesh,
    DataLake,
    BigDataPlatform,
    ReportEngine,
    Ai,
    MailServer,
    Vault,
    Hsm,
    Waf,
    Ids,
    Ips,
    Scheduler,
    Mainframe,
    BlockStorage,
    Library,
}

impl Technology {
    pub fn is_web_application(self) -> bool {
        matches!(
            self,
            Technology::WebServer
                | Technology::WebApplication
                | Technology::ApplicationServer
                | Technology::Erp
                | Technology::Cms
                | Technology::IdentityProvider
                | Technology::ReportEngine
        )
    }

    pub fn is_web_service(self) -> bool {
        matches!(self, Technology::WebServiceRest | Technology::WebServiceSoap)
    }

    pub fn is_identity_related(self) -> bool {
        matches!(
            self,
            Technology::IdentityProvider
                | Technology::IdentityStoreLdap
                | Technology::IdentityStoreDatabase
        )
    }

    pub fn is_security_control_related(self) -> bool {
        matches!(
            self,
            Technology::Vault | Technology::Hsm | Technology::Waf | Technology::Ids | Technology::Ips
        )
    }

    /// Kinds whose traffic may legitimately go unencrypted and unauthenticated
    pub fn is_unprotected_comms_tolerated(self) -> bool {
        matches!(self, Technology::Monitoring | Technology::Ids | Technology::Ips)
    }

    /// Kinds allowed to sit next to high-value targets without a segmentation finding
    pub fn is_close_to_high_value_targets_tolerated(self) -> bool {
        matches!(
            self,
            Technology::Monitoring
                | Technology::Ids
                | Technology::Ips
                | Technology::LoadBalancer
                | Technology::ReverseProxy
        )
    }

    /// Kinds that are usually easier to compromise than the assets they sit next to
    pub fn is_less_protected_type(self) -> bool {
        matches!(
            self,
            Technology::ClientSystem
                | Technology::Browser
                | Technology::Desktop
                | Technology::MobileApp
                | Technology::DevopsClient
                | Technology::WebServer
                | Technology::WebApplication
                | Technology::ApplicationServer
                | Technology::Cms
                | Technology::WebServiceRest
                | Technology::WebServiceSoap
                | Technology::Ejb
                | Technology::BuildPipeline
                | Technology::SourcecodeRepository
                | Technology::ArtifactRegistry
                | Technology::CodeInspectionPlatform
                | Technology::Monitoring
                | Technology::IotDevice
                | Technology::Ai
                | Technology::MailServer
                | Technology::Scheduler
                | Technology::Mainframe
        )
    }

    pub fn is_usually_storing_enduser_data(self) -> bool {
        matches!(
            self,
            Technology::Database
                | Technology::Erp
                | Technology::FileServer
                | Technology::LocalFileSystem
                | Technology::BlockStorage
                | Technology::MailServer
                | Technology::StreamProcessing
                | Technology::MessageQueue
        )
    }

    pub fn is_exclusively_frontend_related(self) -> bool {
        matches!(
            self,
            Technology::ClientSystem
                | Technology::Browser
                | Technology::Desktop
                | Technology::MobileApp
                | Technology::DevopsClient
                | Technology::Cms
                | Technology::ReverseProxy
                | Technology::Waf
                | Technology::LoadBalancer
                | Technology::Gateway
                | Technology::IotDevice
        )
    }

    pub fn is_exclusively_backend_related(self) -> bool {
        matches!(
            self,
            Technology::Database
                | Technology::IdentityProvider
                | Technology::IdentityStoreLdap
                | Technology::IdentityStoreDatabase
                | Technology::Erp
                | Technology::WebServiceRest
                | Technology::WebServiceSoap
                | Technology::Ejb
                | Technology::SearchIndex
                | Technology::SearchEngine
                | Technology::ContainerPlatform
                | Technology::BatchProcessing
                | Technology::EventListener
                | Technology::DataLake
                | Technology::BigDataPlatform
                | Technology::MessageQueue
                | Technology::StreamProcessing
                | Technology::ServiceMesh
                | Technology::Vault
                | Technology::Hsm
                | Technology::Scheduler
                | Technology::Mainframe
                | Technology::FileServer
                | Technology::BlockStorage
        )
    }

    pub fn is_embedded_component(self) -> bool {
        matches!(self, Technology::Library)
    }

    /// Kinds that pass requests on to another asset
    pub fn is_traffic_forwarding(self) -> bool {
        matches!(
            self,
            Technology::LoadBalancer
                | Technology::ReverseProxy
                | Technology::Waf
                | Technology::Ids
                | Technology::Ips
                | Technology::Gateway
                | Technology::ServiceMesh
        )
    }

    pub fn is_client(self) -> bool {
        matches!(
            self,
            Technology::ClientSystem
                | Technology::Browser
                | Technology::Desktop
                | Technology::MobileApp
                | Technology::DevopsClient
                | Technology::IotDevice
        )
    }
}

impl fmt::Display for Technology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // serde already knows the kebab-case spelling
        match serde_json::to_value(self) {
            Ok(serde_json::Value::String(s)) => f.write_str(&s),
            _ => write!(f, "{:?}", self),
        }
    }
}

/// Protocol of a communication link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Protocol {
    #[default]
    UnknownProtocol,
    Http,
    Https,
    Ws,
    Wss,
    ReverseProxyWebProtocol,
    ReverseProxyWebProtocolEncrypted,
    Mqtt,
    Jdbc,
    JdbcEncrypted,
    Odbc,
    OdbcEncrypted,
    SqlAccessProtocol,
    SqlAccessProtocolEncrypted,
    NosqlAccessProtocol,
    NosqlAccessProtocolEncrypted,
    Binary,
    BinaryEncrypted,
    Text,
    TextEncrypted,
    Ssh,
    SshTunnel,
    Smtp,
    SmtpEncrypted,
    Pop3,
    Pop3Encrypted,
    Imap,
    ImapEncrypted,
    Ftp,
    Ftps,
    Sftp,
    Scp,
    Ldap,
    Ldaps,
    Jms,
    Nfs,
    Smb,
    SmbEncrypted,
    LocalFileAccess,
    Nrpe,
    Xmpp,
    Iiop,
    IiopEncrypted,
    Jrmp,
    JrmpEncrypted,
    InProcessLibraryCall,
    ContainerSpawning,
}

impl Protocol {
    pub fn is_encrypted(self) -> bool {
        matches!(
            self,
            Protocol::Https
                | Protocol::Wss
                | Protocol::ReverseProxyWebProtocolEncrypted
                | Protocol::JdbcEncrypted
                | Protocol::OdbcEncrypted
                | Protocol::SqlAccessProtocolEncrypted
                | Protocol::NosqlAccessProtocolEncrypted
                | Protocol::BinaryEncrypted
                | Protocol::TextEncrypted
                | Protocol::Ssh
                | Protocol::SshTunnel
                | Protocol::SmtpEncrypted
                | Protocol::Pop3Encrypted
                | Protocol::ImapEncrypted
                | Protocol::Ftps
                | Protocol::Sftp
                | Protocol::Scp
                | Protocol::Ldaps
                | Protocol::SmbEncrypted
                | Protocol::IiopEncrypted
                | Protocol::JrmpEncrypted
        )
    }

    /// Calls that never leave the host process or filesystem
    pub fn is_process_local(self) -> bool {
        matches!(
            self,
            Protocol::InProcessLibraryCall | Protocol::LocalFileAccess | Protocol::ContainerSpawning
        )
    }

    pub fn is_potential_web_access(self) -> bool {
        matches!(
            self,
            Protocol::Http
                | Protocol::Https
                | Protocol::Ws
                | Protocol::Wss
                | Protocol::ReverseProxyWebProtocol
                | Protocol::ReverseProxyWebProtocolEncrypted
        )
    }

    pub fn is_file_transfer(self) -> bool {
        matches!(self, Protocol::Ftp | Protocol::Ftps | Protocol::Sftp)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::String(s)) => f.write_str(&s),
            _ => write!(f, "{:?}", self),
        }
    }
}
