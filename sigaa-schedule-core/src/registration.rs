//! Payload sent to the registration API after a successful import.
//!
//! Only composition lives here; the HTTP call belongs to the application.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::UserIdentity;

pub const CLIENT_VERSION: &str = "1.0.0-cli";

const UNKNOWN: &str = "Unknown";

static FIREFOX: LazyLock<Regex> = LazyLock::new(|| regex(r"Firefox/(\d+\.\d+)"));
static CHROME: LazyLock<Regex> = LazyLock::new(|| regex(r"Chrome/(\d+\.\d+)"));
static SAFARI: LazyLock<Regex> = LazyLock::new(|| regex(r"Version/(\d+\.\d+)"));
static EDGE: LazyLock<Regex> = LazyLock::new(|| regex(r"Edg/(\d+\.\d+)"));
static WINDOWS: LazyLock<Regex> = LazyLock::new(|| regex(r"Windows NT (\d+\.\d+)"));
static MACOS: LazyLock<Regex> = LazyLock::new(|| regex(r"Mac OS X (\d+[._]\d+[._]\d+)"));
static ANDROID: LazyLock<Regex> = LazyLock::new(|| regex(r"Android (\d+\.\d+)"));
static IOS: LazyLock<Regex> = LazyLock::new(|| regex(r"OS (\d+_\d+)"));
static MOBILE: LazyLock<Regex> = LazyLock::new(|| regex(r"Mobile|Android|iPhone|iPad|iPod"));

fn regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("valid user agent pattern")
}

fn capture(re: &Regex, haystack: &str) -> String {
    re.captures(haystack)
        .and_then(|caps| caps.get(1))
        .map_or_else(|| UNKNOWN.to_string(), |m| m.as_str().replace('_', "."))
}

/// Description of the device performing the import
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub os_name: String,
    /// OS name followed by its version, e.g. `Windows 10/11`
    pub os_version: String,
    pub browser_name: String,
    pub browser_version: String,
    pub device_name: String,
}

impl DeviceInfo {
    pub fn from_user_agent(user_agent: &str) -> Self {
        let (browser_name, browser_version) = if user_agent.contains("Firefox/") {
            ("Firefox", capture(&FIREFOX, user_agent))
        } else if user_agent.contains("Chrome/") && !user_agent.contains("Edg/") {
            ("Chrome", capture(&CHROME, user_agent))
        } else if user_agent.contains("Safari/") && !user_agent.contains("Chrome/") {
            ("Safari", capture(&SAFARI, user_agent))
        } else if user_agent.contains("Edg/") {
            ("Edge", capture(&EDGE, user_agent))
        } else {
            (UNKNOWN, UNKNOWN.to_string())
        };

        let (os_name, os_version) = if user_agent.contains("Windows NT") {
            let nt = WINDOWS
                .captures(user_agent)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str());
            ("Windows", windows_version(nt))
        } else if user_agent.contains("Mac OS X") {
            ("macOS", capture(&MACOS, user_agent))
        } else if user_agent.contains("Android") {
            ("Android", capture(&ANDROID, user_agent))
        } else if user_agent.contains("iPhone") || user_agent.contains("iPad") {
            ("iOS", capture(&IOS, user_agent))
        } else if user_agent.contains("Linux") {
            ("Linux", UNKNOWN.to_string())
        } else {
            (UNKNOWN, UNKNOWN.to_string())
        };

        let device_type = if MOBILE.is_match(user_agent) {
            "Mobile"
        } else {
            "Desktop"
        };

        Self {
            os_name: os_name.to_string(),
            os_version: format!("{} {}", os_name, os_version),
            browser_name: browser_name.to_string(),
            browser_version,
            device_name: format!("{} Web - {} on {}", device_type, browser_name, os_name),
        }
    }

    /// The machine running this process
    pub fn host() -> Self {
        let os_name = match std::env::consts::OS {
            "linux" => "Linux",
            "macos" => "macOS",
            "windows" => "Windows",
            "android" => "Android",
            "ios" => "iOS",
            other => other,
        };

        Self {
            os_name: os_name.to_string(),
            os_version: format!("{} {}", os_name, std::env::consts::ARCH),
            browser_name: "CLI".to_string(),
            browser_version: env!("CARGO_PKG_VERSION").to_string(),
            device_name: format!("Desktop CLI on {}", os_name),
        }
    }
}

fn windows_version(nt: Option<&str>) -> String {
    let version = match nt {
        Some("10.0") => "10/11",
        Some("6.3") => "8.1",
        Some("6.2") => "8",
        Some("6.1") => "7",
        Some("6.0") => "Vista",
        Some("5.1") => "XP",
        Some(other) => other,
        None => UNKNOWN,
    };
    version.to_string()
}

/// Whether the payload creates or updates the remote record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationKind {
    Register,
    Update,
}

impl RegistrationKind {
    pub fn for_first_access(first_access: bool) -> Self {
        if first_access {
            Self::Register
        } else {
            Self::Update
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationPayload {
    #[serde(rename = "matricula")]
    pub registration_id: String,
    #[serde(rename = "periodo_letivo")]
    pub academic_term: String,
    #[serde(rename = "nome")]
    pub full_name: String,
    #[serde(rename = "curso")]
    pub program: String,
    #[serde(rename = "formacao")]
    pub degree_level: String,
    pub app_version: String,
    pub os_version: String,
    pub device_name: String,
}

impl RegistrationPayload {
    pub fn new(identity: &UserIdentity, device: &DeviceInfo) -> Self {
        Self {
            registration_id: identity.registration_id.clone(),
            academic_term: identity.academic_term.clone(),
            full_name: identity.full_name.clone(),
            program: identity.program.clone(),
            degree_level: identity.degree_level.clone(),
            app_version: CLIENT_VERSION.to_string(),
            os_version: device.os_version.clone(),
            device_name: device.device_name.clone(),
        }
    }
}
