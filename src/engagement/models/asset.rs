//! Asset model - infrastructure discovered in scope

use serde::{Deserialize, Serialize};

/// What kind of asset this is (open set)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AssetKind {
    Subdomain,
    Ip,
    Service,
    Other(String),
}

impl AssetKind {
    pub fn as_str(&self) -> &str {
        match self {
            AssetKind::Subdomain => "subdomain",
            AssetKind::Ip => "ip",
            AssetKind::Service => "service",
            AssetKind::Other(kind) => kind,
        }
    }
}

impl From<String> for AssetKind {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "subdomain" => AssetKind::Subdomain,
            "ip" | "ip_address" => AssetKind::Ip,
            "service" => AssetKind::Service,
            _ => AssetKind::Other(s),
        }
    }
}

impl From<AssetKind> for String {
    fn from(k: AssetKind) -> Self {
        k.as_str().to_string()
    }
}

/// An in-scope asset (subdomain, IP, exposed service, ...)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    /// Project this asset belongs to
    pub project_id: String,
    pub kind: AssetKind,
    /// The asset itself, e.g., "vpn.megacorp.io" or "10.20.3.7:443"
    pub value: String,
    /// Discovery timestamp (ms since epoch)
    pub created_at: i64,
}

impl Asset {
    pub fn new(
        id: impl Into<String>,
        project_id: impl Into<String>,
        kind: AssetKind,
        value: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            project_id: project_id.into(),
            kind,
            value: value.into(),
            created_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_open_enum() {
        assert_eq!(AssetKind::from("subdomain".to_string()), AssetKind::Subdomain);
        assert_eq!(AssetKind::from("IP".to_string()), AssetKind::Ip);
        assert_eq!(
            AssetKind::from("s3-bucket".to_string()),
            AssetKind::Other("s3-bucket".to_string())
        );
        assert_eq!(AssetKind::Other("s3-bucket".into()).as_str(), "s3-bucket");
    }
}
