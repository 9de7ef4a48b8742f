//! Request helpers for the HTTP layer: bearer extraction and device labels.

use super::models::DeviceInfo;

/// Extract the token from an `Authorization: Bearer <token>` header
///
/// The `Bearer ` prefix is matched case-sensitively.
pub fn extract_bearer_token(header: Option<&str>) -> Option<&str> {
    header
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
}

/// Coarse device class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceType {
    Mobile,
    Tablet,
    Desktop,
}

impl DeviceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Mobile => "mobile",
            DeviceType::Tablet => "tablet",
            DeviceType::Desktop => "desktop",
        }
    }
}

/// Best-effort device class from a user agent; display only
pub fn device_type_from_user_agent(user_agent: &str) -> DeviceType {
    let ua = user_agent.to_ascii_lowercase();
    if ua.contains("ipad") || ua.contains("tablet") {
        DeviceType::Tablet
    } else if ua.contains("mobile") || ua.contains("iphone") || ua.contains("android") {
        DeviceType::Mobile
    } else {
        DeviceType::Desktop
    }
}

/// Best-effort browser name from a user agent; display only
pub fn browser_from_user_agent(user_agent: &str) -> Option<&'static str> {
    // Edge and Chrome both advertise "Chrome"; Chrome and Safari both advertise "Safari"
    if user_agent.contains("Edg") {
        Some("Edge")
    } else if user_agent.contains("Firefox") {
        Some("Firefox")
    } else if user_agent.contains("Chrome") {
        Some("Chrome")
    } else if user_agent.contains("Safari") {
        Some("Safari")
    } else {
        None
    }
}

impl DeviceInfo {
    /// Build display metadata from request headers
    pub fn from_user_agent(user_agent: Option<&str>, ip_address: Option<&str>) -> Self {
        let ua = user_agent.unwrap_or_default();
        let device_type = device_type_from_user_agent(ua);
        let device_name = match browser_from_user_agent(ua) {
            Some(browser) => format!("{} on {}", browser, capitalize(device_type.as_str())),
            None => "Unknown Device".to_string(),
        };

        Self {
            device_name: Some(device_name),
            device_type: Some(device_type.as_str().to_string()),
            user_agent: user_agent.map(str::to_string),
            ip_address: ip_address.map(str::to_string),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
