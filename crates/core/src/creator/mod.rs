//! Group creation: the create-call attempt loop and the photo sub-pipeline.

mod attempt;
mod group;
mod photo;

pub use attempt::{classify, CreateAttempt};
pub use group::{CreatedGroup, CreatorConfig, GroupCreator};
pub use photo::upload_group_photo;
