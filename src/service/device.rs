use crate::models::device::Platform;
use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::LazyLock;

static MOBILE_IOS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b(iphone|ipad|ipod)\b").expect("valid regex"));
static MOBILE_ANDROID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bandroid\b").expect("valid regex"));

/// Derive the stable device id from user agent and source IP.
///
/// This is a deliberate weak-identity scheme: the same browser behind the
/// same network address always maps to the same id, devices behind shared
/// NAT collide, and an IP change makes a known device look new. Callers
/// that need a durable identity must not treat this as one.
pub fn device_id(user_agent: &str, ip: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(user_agent.as_bytes());
    hasher.update(ip.as_bytes());
    let digest = hex::encode(hasher.finalize());
    digest[..32].to_string()
}

/// Classify the user agent into a platform bucket. Mobile checks run first:
/// iOS user agents also advertise "like Mac OS X" and Android ones contain
/// "Linux", so the desktop checks would otherwise shadow them.
pub fn platform_from_user_agent(user_agent: &str) -> Platform {
    if MOBILE_IOS.is_match(user_agent) {
        return Platform::MobileIos;
    }
    if MOBILE_ANDROID.is_match(user_agent) {
        return Platform::MobileAndroid;
    }

    let lowered = user_agent.to_ascii_lowercase();
    if lowered.contains("mac os") || lowered.contains("macintosh") {
        return Platform::DesktopMac;
    }
    if lowered.contains("windows") {
        return Platform::DesktopWindows;
    }
    if lowered.contains("linux") || lowered.contains("x11") {
        return Platform::DesktopLinux;
    }

    Platform::Web
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_MAC: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";
    const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1";
    const CHROME_ANDROID: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Mobile Safari/537.36";
    const FIREFOX_LINUX: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";
    const EDGE_WINDOWS: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36 Edg/120.0";

    #[test]
    fn device_id_is_deterministic() {
        let a = device_id(CHROME_MAC, "203.0.113.9");
        let b = device_id(CHROME_MAC, "203.0.113.9");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn device_id_changes_with_either_input() {
        let base = device_id(CHROME_MAC, "203.0.113.9");
        assert_ne!(base, device_id(CHROME_MAC, "203.0.113.10"));
        assert_ne!(base, device_id(FIREFOX_LINUX, "203.0.113.9"));
    }

    #[test]
    fn ios_wins_over_the_mac_substring() {
        // iPhone UAs say "like Mac OS X"; the mobile check must run first.
        assert_eq!(platform_from_user_agent(SAFARI_IPHONE), Platform::MobileIos);
    }

    #[test]
    fn android_wins_over_the_linux_substring() {
        assert_eq!(platform_from_user_agent(CHROME_ANDROID), Platform::MobileAndroid);
    }

    #[test]
    fn desktop_platforms_classify_by_os() {
        assert_eq!(platform_from_user_agent(CHROME_MAC), Platform::DesktopMac);
        assert_eq!(platform_from_user_agent(EDGE_WINDOWS), Platform::DesktopWindows);
        assert_eq!(platform_from_user_agent(FIREFOX_LINUX), Platform::DesktopLinux);
    }

    #[test]
    fn unknown_agents_fall_back_to_web() {
        assert_eq!(platform_from_user_agent("curl/8.4.0"), Platform::Web);
        assert_eq!(platform_from_user_agent(""), Platform::Web);
    }
}
