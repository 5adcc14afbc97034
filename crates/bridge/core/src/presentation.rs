//! Lifecycle state and presentation decisions.

/// Application lifecycle state at payload receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    Foreground,
    Background,
}

/// How an inbound payload should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentationDecision {
    /// Banner plus sound (current platform tier).
    ShowBannerAndSound,
    /// Alert plus sound (older platform tier without banners).
    ShowAlertAndSound,
    /// The bridge presents nothing.
    Suppress,
}

impl PresentationDecision {
    /// True if the bridge asks the host to present the notification.
    pub fn presents(&self) -> bool {
        !matches!(self, Self::Suppress)
    }
}

/// Presentation features negotiated with the host platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PlatformCapabilities {
    /// Host can show banners (iOS 14 and later).
    pub banner_supported: bool,
}

impl PlatformCapabilities {
    /// Foreground presentation for this capability tier.
    pub fn foreground_decision(&self) -> PresentationDecision {
        if self.banner_supported {
            PresentationDecision::ShowBannerAndSound
        } else {
            PresentationDecision::ShowAlertAndSound
        }
    }
}

impl Default for PlatformCapabilities {
    fn default() -> Self {
        Self {
            banner_supported: true,
        }
    }
}
