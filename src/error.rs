use std::fmt::{Debug, Display};
use std::io::Error as IoError;

use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError};
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use derivative::Derivative;
use figment::Error as ConfigError;
use mongodb::bson::ser::Error as BsonError;
use mongodb::error::Error as DatabaseError;
use reqwest::Error as HttpClientError;
use serde::{Serialize, Serializer};

use crate::campaign::CampaignId;
use crate::mission::MissionId;
use crate::user::UserId;

#[derive(Debug, Serialize, Derivative)]
#[derivative(PartialEq)]
#[serde(untagged)]
pub enum Error {
    // 400
    #[serde(serialize_with = "display")]
    InvalidJson(#[derivative(PartialEq = "ignore")] JsonPayloadError),
    #[serde(serialize_with = "display")]
    InvalidPath(#[derivative(PartialEq = "ignore")] PathError),
    #[serde(serialize_with = "display")]
    InvalidQuery(#[derivative(PartialEq = "ignore")] QueryPayloadError),
    InvalidCampaign {
        reason: String,
    },
    InvalidMission {
        reason: String,
    },
    InvalidQueryParameter {
        name: String,
        reason: String,
    },
    InvalidReportFormat {
        format: String,
    },
    InvalidPrompt,

    // 401
    Unauthenticated,

    // 403
    NotAPartner {
        user_id: UserId,
    },

    // 404
    PathNotFound,
    CampaignNotFound {
        campaign_id: CampaignId,
    },
    MissionNotFound {
        campaign_id: CampaignId,
        mission_id: MissionId,
    },
    ParticipantNotFound {
        campaign_id: CampaignId,
        user_id: UserId,
    },
    ProfileNotFound {
        user_id: UserId,
    },

    // 409
    ConcurrentModificationDetected,
    LogsNotPendingVerification {
        campaign_id: CampaignId,
        user_id: UserId,
    },
    CampaignHasParticipants {
        campaign_id: CampaignId,
    },
    MissionHasLogs {
        mission_id: MissionId,
    },

    // 500
    ExistentialState(String),
    #[serde(serialize_with = "display")]
    FailedDatabaseCall(#[derivative(PartialEq = "ignore")] DatabaseError),
    #[serde(serialize_with = "display")]
    FailedToSerializeToBson(#[derivative(PartialEq = "ignore")] BsonError),
    #[serde(serialize_with = "display")]
    IoError(#[derivative(PartialEq = "ignore")] IoError),
    ReportGenerationFailed(String),
    #[serde(serialize_with = "display")]
    InvalidConfiguration(#[derivative(PartialEq = "ignore")] Box<ConfigError>),

    // 502
    #[serde(serialize_with = "display")]
    AssistantRequestFailed(#[derivative(PartialEq = "ignore")] HttpClientError),
    AssistantReturnedInvalidOutput {
        reason: String,
    },

    // 503
    AssistantNotConfigured,
}

impl Error {
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::InvalidJson(_) => "E4001000",
            Error::InvalidPath(_) => "E4001001",
            Error::InvalidQuery(_) => "E4001003",
            Error::InvalidCampaign { .. } => "E4001004",
            Error::InvalidMission { .. } => "E4001005",
            Error::InvalidQueryParameter { .. } => "E4001006",
            Error::InvalidReportFormat { .. } => "E4001007",
            Error::InvalidPrompt => "E4001008",
            Error::Unauthenticated => "E4011000",
            Error::NotAPartner { .. } => "E4031000",
            Error::PathNotFound => "E4041000",
            Error::CampaignNotFound { .. } => "E4041001",
            Error::MissionNotFound { .. } => "E4041002",
            Error::ParticipantNotFound { .. } => "E4041003",
            Error::ProfileNotFound { .. } => "E4041004",
            Error::ConcurrentModificationDetected => "E4091000",
            Error::LogsNotPendingVerification { .. } => "E4091001",
            Error::CampaignHasParticipants { .. } => "E4091002",
            Error::MissionHasLogs { .. } => "E4091003",
            Error::ExistentialState(_) => "E5001000",
            Error::FailedDatabaseCall(_) => "E5001001",
            Error::FailedToSerializeToBson(_) => "E5001002",
            Error::IoError(_) => "E5001003",
            Error::ReportGenerationFailed(_) => "E5001004",
            Error::InvalidConfiguration(_) => "E5001005",
            Error::AssistantRequestFailed(_) => "E5021000",
            Error::AssistantReturnedInvalidOutput { .. } => "E5021001",
            Error::AssistantNotConfigured => "E5031000",
        }
    }

    pub fn error_message(&self) -> &'static str {
        match self {
            Error::InvalidJson(_) => "The given json could not be parsed",
            Error::InvalidPath(_) => "The given path could not be parsed",
            Error::InvalidQuery(_) => "The given query could not be parsed",
            Error::InvalidCampaign { .. } => "The given campaign is invalid",
            Error::InvalidMission { .. } => "The given mission is invalid",
            Error::InvalidQueryParameter { .. } => "The given query parameter is out of range",
            Error::InvalidReportFormat { .. } => "The requested report format is not supported",
            Error::InvalidPrompt => "The given prompt is empty",
            Error::Unauthenticated => "The request does not carry a valid session",
            Error::NotAPartner { .. } => "The requesting user is not registered as a partner",
            Error::PathNotFound => "The requested path was not found",
            Error::CampaignNotFound { .. } => "The requested campaign was not found",
            Error::MissionNotFound { .. } => {
                "The requested mission was not found in the campaign"
            }
            Error::ParticipantNotFound { .. } => {
                "The requested user is not an eligible participant of the campaign"
            }
            Error::ProfileNotFound { .. } => "The requested user profile was not found",
            Error::ConcurrentModificationDetected => {
                "The server detected a concurrent modification"
            }
            Error::LogsNotPendingVerification { .. } => {
                "The user's mission logs are not all pending verification"
            }
            Error::CampaignHasParticipants { .. } => {
                "The requested campaign already has participants"
            }
            Error::MissionHasLogs { .. } => "The requested mission already has mission logs",
            Error::ExistentialState(_) => "The server detected an invalid state",
            Error::FailedDatabaseCall(_) => {
                "An error occurred when communicating with the database"
            }
            Error::FailedToSerializeToBson(_) => {
                "An error occurred when serializing an object to bson"
            }
            Error::IoError(_) => "An error occurred during an I/O operation",
            Error::ReportGenerationFailed(_) => "An error occurred when generating the report",
            Error::InvalidConfiguration(_) => "The server configuration could not be loaded",
            Error::AssistantRequestFailed(_) => {
                "An error occurred when communicating with the assistant model"
            }
            Error::AssistantReturnedInvalidOutput { .. } => {
                "The assistant model returned output that could not be used"
            }
            Error::AssistantNotConfigured => "No assistant model is configured",
        }
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidJson(_) => StatusCode::BAD_REQUEST,
            Error::InvalidPath(_) => StatusCode::BAD_REQUEST,
            Error::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            Error::InvalidCampaign { .. } => StatusCode::BAD_REQUEST,
            Error::InvalidMission { .. } => StatusCode::BAD_REQUEST,
            Error::InvalidQueryParameter { .. } => StatusCode::BAD_REQUEST,
            Error::InvalidReportFormat { .. } => StatusCode::BAD_REQUEST,
            Error::InvalidPrompt => StatusCode::BAD_REQUEST,
            Error::Unauthenticated => StatusCode::UNAUTHORIZED,
            Error::NotAPartner { .. } => StatusCode::FORBIDDEN,
            Error::PathNotFound => StatusCode::NOT_FOUND,
            Error::CampaignNotFound { .. } => StatusCode::NOT_FOUND,
            Error::MissionNotFound { .. } => StatusCode::NOT_FOUND,
            Error::ParticipantNotFound { .. } => StatusCode::NOT_FOUND,
            Error::ProfileNotFound { .. } => StatusCode::NOT_FOUND,
            Error::ConcurrentModificationDetected => StatusCode::CONFLICT,
            Error::LogsNotPendingVerification { .. } => StatusCode::CONFLICT,
            Error::CampaignHasParticipants { .. } => StatusCode::CONFLICT,
            Error::MissionHasLogs { .. } => StatusCode::CONFLICT,
            Error::ExistentialState(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::FailedDatabaseCall(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::FailedToSerializeToBson(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::ReportGenerationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::InvalidConfiguration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::AssistantRequestFailed(_) => StatusCode::BAD_GATEWAY,
            Error::AssistantReturnedInvalidOutput { .. } => StatusCode::BAD_GATEWAY,
            Error::AssistantNotConfigured => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        #[derive(Serialize)]
        struct Dummy<'a> {
            error_code: &'static str,
            error_message: &'static str,
            error_meta: &'a Error,
        }

        HttpResponse::build(self.status_code()).json(&Dummy {
            error_code: self.error_code(),
            error_message: self.error_message(),
            error_meta: self,
        })
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> Result<(), std::fmt::Error> {
        Debug::fmt(self, f)
    }
}

impl From<DatabaseError> for Error {
    fn from(error: DatabaseError) -> Error {
        Error::FailedDatabaseCall(error)
    }
}

impl From<BsonError> for Error {
    fn from(error: BsonError) -> Error {
        Error::FailedToSerializeToBson(error)
    }
}

impl From<IoError> for Error {
    fn from(error: IoError) -> Error {
        Error::IoError(error)
    }
}

impl From<ConfigError> for Error {
    fn from(error: ConfigError) -> Error {
        Error::InvalidConfiguration(Box::new(error))
    }
}

impl From<HttpClientError> for Error {
    fn from(error: HttpClientError) -> Error {
        Error::AssistantRequestFailed(error)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidJson(err) => Some(err),
            Error::InvalidPath(err) => Some(err),
            Error::InvalidQuery(err) => Some(err),
            Error::FailedDatabaseCall(err) => Some(err),
            Error::FailedToSerializeToBson(err) => Some(err),
            Error::IoError(err) => Some(err),
            Error::InvalidConfiguration(err) => Some(err.as_ref()),
            Error::AssistantRequestFailed(err) => Some(err),
            _ => None,
        }
    }
}

fn display<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Display,
    S: Serializer,
{
    serializer.collect_str(value)
}
