use actix_web::post;
use actix_web::web::{Data, Json};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::mission::VerificationType;
use crate::session::PartnerSession;

use super::manager::{self, MissionSuggestion};
use super::Assistant;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DescriptionPromptBody {
    pub prompt: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DescriptionBody {
    pub text: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MissionPromptBody {
    pub prompt: String,
    #[serde(default)]
    pub count: Option<usize>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MissionSuggestionBody {
    pub title: String,
    pub description: String,
    pub verification_type: VerificationType,
    pub reward_points: i64,
}

impl MissionSuggestionBody {
    pub fn render(suggestion: MissionSuggestion) -> MissionSuggestionBody {
        MissionSuggestionBody {
            title: suggestion.title,
            description: suggestion.description,
            verification_type: suggestion.verification_type,
            reward_points: suggestion.reward_points,
        }
    }
}

#[post("/assistant/description")]
#[tracing::instrument(skip(assistant))]
pub async fn generate_description(
    assistant: Data<Assistant>,
    _session: PartnerSession,
    body: Json<DescriptionPromptBody>,
) -> Result<Json<DescriptionBody>, Error> {
    let model = assistant.model()?;

    let text = manager::describe(model, &body.prompt).await?;

    Ok(Json(DescriptionBody { text }))
}

#[post("/assistant/missions")]
#[tracing::instrument(skip(assistant))]
pub async fn generate_missions(
    assistant: Data<Assistant>,
    _session: PartnerSession,
    body: Json<MissionPromptBody>,
) -> Result<Json<Vec<MissionSuggestionBody>>, Error> {
    let model = assistant.model()?;

    let suggestions = manager::suggest_missions(model, &body.prompt, body.count).await?;

    let body = suggestions
        .into_iter()
        .map(MissionSuggestionBody::render)
        .collect();

    Ok(Json(body))
}
