//! Query parameters for the interrogate endpoint

/// Parameters for an interrogation
///
/// Values are normalized when turned into query parameters so equivalent
/// inputs (e.g. `AA:BB:..` vs `aabb..`) share a cache entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterrogateParams {
    /// DHCP option 55 fingerprint, e.g. "1,15,3,6"
    pub dhcp_fingerprint: Option<String>,
    /// MAC address in any common notation
    pub mac: Option<String>,
    /// HTTP user agents seen from the device
    pub user_agents: Vec<String>,
}

impl InterrogateParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dhcp_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.dhcp_fingerprint = Some(fingerprint.into());
        self
    }

    pub fn with_mac(mut self, mac: impl Into<String>) -> Self {
        self.mac = Some(mac.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agents.push(user_agent.into());
        self
    }

    /// Whether no usable parameter is set
    pub fn is_empty(&self) -> bool {
        self.query_pairs().is_empty()
    }

    /// Returns the normalized, non-empty query parameters
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        if let Some(fingerprint) = self.dhcp_fingerprint.as_deref().map(normalize_fingerprint) {
            if !fingerprint.is_empty() {
                pairs.push(("dhcp_fingerprint", fingerprint));
            }
        }

        if let Some(mac) = self.mac.as_deref().map(normalize_mac) {
            if !mac.is_empty() {
                pairs.push(("mac", mac));
            }
        }

        let user_agents: Vec<&str> = self
            .user_agents
            .iter()
            .map(|ua| ua.trim())
            .filter(|ua| !ua.is_empty())
            .collect();
        if !user_agents.is_empty() {
            pairs.push(("user_agents", user_agents.join(",")));
        }

        pairs
    }
}

/// Strips whitespace from a DHCP fingerprint
pub fn normalize_fingerprint(fingerprint: &str) -> String {
    fingerprint.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Lowercases a MAC address and strips `:`, `-`, `.` separators
pub fn normalize_mac(mac: &str) -> String {
    mac.chars()
        .filter(|c| !matches!(c, ':' | '-' | '.') && !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}
