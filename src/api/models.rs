//! Typed views of API responses

use serde::{Deserialize, Serialize};

/// A device from the Fingerbank database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    /// Fingerbank device identifier
    pub id: u64,
    /// Human-readable device name
    pub name: String,
    /// Parent device in the hierarchy, if any
    pub parent_id: Option<u64>,
    pub virtual_parent_id: Option<u64>,
    /// Free-form description
    pub details: Option<String>,
    #[serde(rename = "mobile?")]
    pub mobile: Option<bool>,
    #[serde(rename = "tablet?")]
    pub tablet: Option<bool>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Result of an interrogation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interrogation {
    /// Best matching device
    pub device: Option<Device>,
    /// Full device path, e.g. "Operating System/Apple OS/iOS"
    pub device_name: Option<String>,
    /// Confidence score from 0 to 100
    pub score: Option<u32>,
    /// Fingerbank data version
    pub version: Option<String>,
    /// Whether more parameters could refine the match
    pub can_be_more_precise: Option<bool>,
}
