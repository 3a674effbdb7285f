use std::path::Path;

use tracing::info;

use super::CreatedGroup;
use crate::error::{PipelineError, UploadStage};
use crate::platform::{PlatformApi, PlatformError};
use crate::session::Session;

/// Attach `photo` as the group's profile picture.
///
/// Runs the three chained calls (upload server lookup, file upload, save);
/// the first stage to fail ends the sub-pipeline with its error payload.
pub async fn upload_group_photo(
    platform: &dyn PlatformApi,
    session: &Session,
    group: &CreatedGroup,
    photo: &Path,
) -> Result<(), PipelineError> {
    info!("Updating group's photo");
    let owner_id = group
        .owner_id()
        .ok_or_else(|| PipelineError::PhotoUploadFailure {
            stage: UploadStage::RequestServer,
            reason: format!("group id {} has no owner id", group.id),
        })?;

    let upload_url = platform
        .owner_photo_upload_server(session.token(), owner_id)
        .await
        .map_err(|e| stage_failure(UploadStage::RequestServer, e))?;
    info!("Obtained upload server URL");

    let uploaded = platform
        .upload_photo(&upload_url, photo)
        .await
        .map_err(|e| stage_failure(UploadStage::Upload, e))?;
    info!("Photo uploaded successfully");

    platform
        .save_owner_photo(session.token(), owner_id, &uploaded)
        .await
        .map_err(|e| stage_failure(UploadStage::Save, e))?;
    info!("Group photo updated successfully");

    Ok(())
}

fn stage_failure(stage: UploadStage, error: PlatformError) -> PipelineError {
    let reason = match error {
        PlatformError::Api(api) => api.payload.to_string(),
        other => other.to_string(),
    };
    PipelineError::PhotoUploadFailure { stage, reason }
}
