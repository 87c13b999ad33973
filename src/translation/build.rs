use log::info;

use crate::errors::PlatformError;
use crate::providers::{ExportStatus, TranslationPlatform};

/// Ask the platform to rebuild the downloadable translation archive
///
/// The platform skips the build when nothing changed since the last one.
pub async fn build_project(platform: &dyn TranslationPlatform) -> Result<ExportStatus, PlatformError> {
    let status = platform.export().await?;
    info!("Crowdin project build status: {}", status.status);
    Ok(status)
}
