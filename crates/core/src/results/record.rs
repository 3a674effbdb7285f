use std::fmt;

use crate::account::GroupRequest;

/// Whether a created group got its profile photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoStatus {
    HavePhoto,
    NoPhoto,
}

impl PhotoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhotoStatus::HavePhoto => "have-photo",
            PhotoStatus::NoPhoto => "no-photo",
        }
    }
}

impl fmt::Display for PhotoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of processing one group request. Written once, never revised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeRecord {
    /// The platform never assigned an identifier.
    NotCreated { group_name: String, topic: String },
    Created {
        group_name: String,
        topic: String,
        group_id: u64,
        url: String,
        photo: PhotoStatus,
    },
}

impl OutcomeRecord {
    pub fn not_created(request: &GroupRequest) -> Self {
        OutcomeRecord::NotCreated {
            group_name: request.name.clone(),
            topic: request.topic.clone(),
        }
    }

    pub fn created(request: &GroupRequest, group_id: u64, url: String, photo: PhotoStatus) -> Self {
        OutcomeRecord::Created {
            group_name: request.name.clone(),
            topic: request.topic.clone(),
            group_id,
            url,
            photo,
        }
    }

    pub fn group_name(&self) -> &str {
        match self {
            OutcomeRecord::NotCreated { group_name, .. }
            | OutcomeRecord::Created { group_name, .. } => group_name,
        }
    }

    pub fn group_id(&self) -> Option<u64> {
        match self {
            OutcomeRecord::NotCreated { .. } => None,
            OutcomeRecord::Created { group_id, .. } => Some(*group_id),
        }
    }

    pub fn photo(&self) -> Option<PhotoStatus> {
        match self {
            OutcomeRecord::NotCreated { .. } => None,
            OutcomeRecord::Created { photo, .. } => Some(*photo),
        }
    }

    /// Metric label for this outcome.
    pub fn label(&self) -> &'static str {
        match self.photo() {
            None => "not_created",
            Some(PhotoStatus::HavePhoto) => "have_photo",
            Some(PhotoStatus::NoPhoto) => "no_photo",
        }
    }

    /// Render as one CSV row (2 or 5 fields, no trailing newline).
    pub fn to_csv_row(&self) -> String {
        let fields: Vec<String> = match self {
            OutcomeRecord::NotCreated { group_name, topic } => {
                vec![escape(group_name), escape(topic)]
            }
            OutcomeRecord::Created {
                group_name,
                topic,
                group_id,
                url,
                photo,
            } => vec![
                escape(group_name),
                escape(topic),
                group_id.to_string(),
                escape(url),
                photo.to_string(),
            ],
        };
        fields.join(",")
    }
}

/// Quote a field when it contains a separator, quote or line break.
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_row() {
        let record = OutcomeRecord::created(
            &GroupRequest::new("Cats", "pets"),
            42,
            "https://vk.com/cats42".to_string(),
            PhotoStatus::HavePhoto,
        );
        assert_eq!(
            record.to_csv_row(),
            "Cats,pets,42,https://vk.com/cats42,have-photo"
        );
        assert_eq!(record.label(), "have_photo");
    }

    #[test]
    fn test_not_created_row() {
        let record = OutcomeRecord::not_created(&GroupRequest::new("Cats", "pets"));
        assert_eq!(record.to_csv_row(), "Cats,pets");
        assert_eq!(record.group_id(), None);
    }

    #[test]
    fn test_fields_with_commas_are_quoted() {
        let record = OutcomeRecord::not_created(&GroupRequest::new("Cats, dogs", "say \"hi\""));
        assert_eq!(record.to_csv_row(), "\"Cats, dogs\",\"say \"\"hi\"\"\"");
    }
}
