//! Submission request/response records.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::{Alignment, CaptionSpec, JobId};

/// Request to caption the source clip and append the overlay clip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitJobRequest {
    /// Clip that receives the caption and plays first
    #[validate(custom(function = "validate_http_url"))]
    pub source_clip_url: String,

    /// Clip appended after the captioned clip
    #[validate(custom(function = "validate_http_url"))]
    pub overlay_clip_url: String,

    #[validate(
        length(max = 1000, message = "Caption text is too long"),
        custom(function = "validate_caption_text")
    )]
    pub caption_text: String,

    #[serde(default)]
    pub alignment: Alignment,
}

impl SubmitJobRequest {
    /// Caption portion of the request.
    pub fn caption(&self) -> CaptionSpec {
        CaptionSpec::new(self.caption_text.clone(), self.alignment)
    }
}

/// Response returned immediately after submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitJobResponse {
    pub job_id: JobId,
}

/// Require an absolute `http`/`https` URL with a host.
pub fn validate_http_url(value: &str) -> Result<(), ValidationError> {
    let url = url::Url::parse(value).map_err(|_| {
        let mut err = ValidationError::new("url");
        err.message = Some("Must be an absolute URL".into());
        err
    })?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(()),
        _ => {
            let mut err = ValidationError::new("url_scheme");
            err.message = Some("URL must use http or https".into());
            Err(err)
        }
    }
}

/// Require at least one visible character.
pub fn validate_caption_text(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("caption_blank");
        err.message = Some("Caption text must not be empty".into());
        return Err(err);
    }
    Ok(())
}
