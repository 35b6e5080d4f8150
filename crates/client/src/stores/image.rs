//! Image upload status.

use super::{AsyncResource, Phase, Reducer, RequestStatus};

#[derive(Debug, Clone, PartialEq)]
pub enum ImageAction {
    Upload(Phase<String>),
    /// Back to idle, e.g. after a form is submitted or the edit target changes.
    Clear,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImageState {
    upload: AsyncResource<Option<String>>,
}

impl ImageState {
    pub fn url(&self) -> Option<&str> {
        self.upload.data.as_deref()
    }

    pub fn status(&self) -> RequestStatus {
        self.upload.status
    }

    pub fn error(&self) -> Option<&str> {
        self.upload.error.as_deref()
    }

    /// URL of a finished upload, `None` while idle, loading or failed.
    pub fn ready_url(&self) -> Option<&str> {
        match self.upload.status {
            RequestStatus::Succeeded => self.url(),
            _ => None,
        }
    }
}

impl Reducer for ImageState {
    type Action = ImageAction;

    fn reduce(&mut self, action: ImageAction) {
        match action {
            ImageAction::Upload(phase) => {
                if matches!(phase, Phase::Started) {
                    self.upload = AsyncResource::default();
                }
                self.upload.apply(phase, |url, u| *url = Some(u));
            }
            ImageAction::Clear => self.upload = AsyncResource::default(),
        }
    }
}
