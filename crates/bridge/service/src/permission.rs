//! Fixed-answer permission surface.

use bridge_core::PermissionOptions;

use crate::PermissionRequester;

/// Permission requester with a preconfigured answer, for hosts that do not
/// expose an authorization prompt to this process.
#[derive(Debug, Clone, Copy)]
pub struct StaticPermission {
    granted: bool,
}

impl StaticPermission {
    pub fn new(granted: bool) -> Self {
        Self { granted }
    }
}

impl PermissionRequester for StaticPermission {
    async fn request_authorization(
        &self,
        options: PermissionOptions,
    ) -> color_eyre::eyre::Result<bool> {
        tracing::info!(
            alert = options.alert,
            badge = options.badge,
            sound = options.sound,
            granted = self.granted,
            "notification authorization requested"
        );
        Ok(self.granted)
    }

    async fn register_for_remote_notifications(&self) -> color_eyre::eyre::Result<()> {
        tracing::info!("registered for remote notifications");
        Ok(())
    }
}
