use jsonwebtoken::errors::Error as JwtError;
use rocket::{http::Status, response::Responder, serde::json::serde_json};
use thiserror::Error;

use crate::model::campaign::{CampaignId, CampaignState, CandidateId};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Voter has already cast a ballot in campaign {0}")]
    AlreadyVoted(CampaignId),
    #[error("Candidate {candidate_id} not found in campaign {campaign_id}")]
    CandidateNotFound {
        campaign_id: CampaignId,
        candidate_id: CandidateId,
    },
    #[error("Campaign {campaign_id} is not open for voting (state: {state})")]
    CampaignNotOpen {
        campaign_id: CampaignId,
        state: CampaignState,
    },
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Cannot move campaign from {from} to {to}")]
    InvalidTransition {
        from: CampaignState,
        to: CampaignState,
    },
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error(transparent)]
    Jwt(#[from] JwtError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[cfg(feature = "mongodb-store")]
    #[error(transparent)]
    Db(#[from] mongodb::error::Error),
}

impl Error {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// The HTTP status this error maps to.
    pub fn status(&self) -> Status {
        match self {
            Self::NotFound(_) | Self::CandidateNotFound { .. } => Status::NotFound,
            Self::AlreadyVoted(_) | Self::InvalidTransition { .. } => Status::Conflict,
            Self::CampaignNotOpen { .. } | Self::Forbidden(_) => Status::Forbidden,
            Self::Validation(_) => Status::BadRequest,
            Self::Jwt(_) => Status::Unauthorized,
            Self::Json(_) | Self::Io(_) => Status::InternalServerError,
            #[cfg(feature = "mongodb-store")]
            Self::Db(_) => Status::InternalServerError,
        }
    }
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, req: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        let status = self.status();
        if status.class().is_server_error() {
            error!("{self}");
        } else {
            debug!("{self}");
        }
        (status, self.to_string()).respond_to(req)
    }
}
