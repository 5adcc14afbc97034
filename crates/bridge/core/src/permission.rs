//! Notification authorization options.

/// Capabilities requested from the OS at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PermissionOptions {
    #[serde(default = "default_true")]
    pub alert: bool,
    #[serde(default = "default_true")]
    pub badge: bool,
    #[serde(default = "default_true")]
    pub sound: bool,
}

impl PermissionOptions {
    /// Alert, badge and sound.
    pub fn all() -> Self {
        Self {
            alert: true,
            badge: true,
            sound: true,
        }
    }
}

impl Default for PermissionOptions {
    fn default() -> Self {
        Self::all()
    }
}

fn default_true() -> bool {
    true
}
