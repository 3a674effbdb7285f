use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::{classify, upload_group_photo, CreateAttempt};
use crate::account::GroupRequest;
use crate::config::Config;
use crate::error::PipelineError;
use crate::generator::ContentGenerator;
use crate::metrics;
use crate::platform::{ChallengeAnswer, CreateGroupParams, PlatformApi};
use crate::results::{OutcomeRecord, PhotoStatus};
use crate::scratch::ScratchFile;
use crate::session::Session;
use crate::solver::ChallengeSolver;

/// A group the platform acknowledged with an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedGroup {
    pub id: u64,
    pub screen_name: String,
}

impl CreatedGroup {
    /// Owner id used by photo calls; groups are addressed by negated id.
    /// `None` when the id does not fit the signed owner range.
    pub fn owner_id(&self) -> Option<i64> {
        i64::try_from(self.id).ok().map(|id| -id)
    }

    pub fn url(&self, site_url: &str) -> String {
        format!("{}/{}", site_url.trim_end_matches('/'), self.screen_name)
    }
}

#[derive(Debug, Clone)]
pub struct CreatorConfig {
    /// Create-group calls per request, challenge retries included.
    pub max_attempts: u32,
    pub site_url: String,
    /// Where rendered profile images are staged before upload.
    pub image_dir: PathBuf,
}

impl CreatorConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.platform.max_create_attempts,
            site_url: config.platform.site_url.clone(),
            image_dir: config.output.temp_dir.clone(),
        }
    }
}

/// Runs the per-group pipeline for one account.
pub struct GroupCreator {
    platform: Arc<dyn PlatformApi>,
    generator: Arc<dyn ContentGenerator>,
    solver: Arc<dyn ChallengeSolver>,
    config: CreatorConfig,
}

impl GroupCreator {
    pub fn new(
        platform: Arc<dyn PlatformApi>,
        generator: Arc<dyn ContentGenerator>,
        solver: Arc<dyn ChallengeSolver>,
        config: CreatorConfig,
    ) -> Self {
        Self {
            platform,
            generator,
            solver,
            config,
        }
    }

    /// Process one request end to end and return its outcome record.
    ///
    /// Never fails: every error is logged and folded into the record.
    pub async fn process(&self, session: &Session, request: &GroupRequest) -> OutcomeRecord {
        let description = match self.generator.describe(&request.topic).await {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    "Description generation failed for topic '{}': {}",
                    request.topic, e
                );
                String::new()
            }
        };

        let group = match self.create_base_group(session, request, description).await {
            Ok(group) => group,
            Err(e) => {
                error!("Group '{}' was not created: {}", request.name, e);
                return OutcomeRecord::not_created(request);
            }
        };

        let url = group.url(&self.config.site_url);
        info!(group_id = group.id, "Group '{}' created: {}", request.name, url);

        let photo = self.attach_photo(session, request, &group).await;
        OutcomeRecord::created(request, group.id, url, photo)
    }

    async fn create_base_group(
        &self,
        session: &Session,
        request: &GroupRequest,
        description: String,
    ) -> Result<CreatedGroup, PipelineError> {
        let max = self.config.max_attempts.max(1);
        let mut params = CreateGroupParams::new(&request.name, description);
        let mut last_unextractable = None;

        for attempt in 1..=max {
            debug!(attempt, max, "Creating group '{}'", request.name);
            let outcome = classify(self.platform.create_group(session.token(), &params).await);

            let label = match &outcome {
                Ok(a) => a.label(),
                Err(_) => "transport",
            };
            metrics::CREATE_ATTEMPTS.with_label_values(&[label]).inc();

            match outcome? {
                CreateAttempt::Created(group) => return Ok(group),
                CreateAttempt::NeedsChallenge(challenge) => {
                    last_unextractable = None;
                    warn!("Captcha required (attempt {}/{})", attempt, max);
                    if attempt == max {
                        break;
                    }
                    let key = self.solver.solve(&challenge.image_url).await?;
                    params = params.with_answer(ChallengeAnswer {
                        sid: challenge.sid,
                        key,
                    });
                }
                CreateAttempt::Rejected(kind) => {
                    return Err(PipelineError::PlatformRejected(kind));
                }
                CreateAttempt::Unextractable(reason) => {
                    warn!("Failed to extract group ID (attempt {}/{}): {}", attempt, max, reason);
                    last_unextractable = Some(reason);
                }
            }
        }

        match last_unextractable {
            Some(reason) => Err(PipelineError::ExtractionFailure(reason)),
            None => Err(PipelineError::AttemptsExhausted { attempts: max }),
        }
    }

    async fn attach_photo(
        &self,
        session: &Session,
        request: &GroupRequest,
        group: &CreatedGroup,
    ) -> PhotoStatus {
        let scratch =
            match ScratchFile::claim(self.config.image_dir.join(format!("{}.png", group.id))) {
                Ok(scratch) => scratch,
                Err(e) => {
                    error!("Cannot prepare image directory: {}", e);
                    metrics::PHOTO_UPLOADS.with_label_values(&["render"]).inc();
                    return PhotoStatus::NoPhoto;
                }
            };

        if let Err(e) = self
            .generator
            .render_image(&request.topic, scratch.path())
            .await
        {
            error!("Error generating image: {}", e);
            metrics::PHOTO_UPLOADS.with_label_values(&["render"]).inc();
            return PhotoStatus::NoPhoto;
        }

        match upload_group_photo(self.platform.as_ref(), session, group, scratch.path()).await {
            Ok(()) => {
                metrics::PHOTO_UPLOADS.with_label_values(&["success"]).inc();
                PhotoStatus::HavePhoto
            }
            Err(PipelineError::PhotoUploadFailure { stage, reason }) => {
                error!("Error setting group photo at {} stage: {}", stage, reason);
                metrics::PHOTO_UPLOADS
                    .with_label_values(&[stage.as_str()])
                    .inc();
                PhotoStatus::NoPhoto
            }
            Err(e) => {
                error!("Error setting group photo: {}", e);
                metrics::PHOTO_UPLOADS.with_label_values(&["upload"]).inc();
                PhotoStatus::NoPhoto
            }
        }
    }
}
