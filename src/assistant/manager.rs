use serde::Deserialize;
use tracing::warn;

use crate::error::Error;
use crate::mission::VerificationType;

use super::LanguageModel;

pub const DEFAULT_SUGGESTIONS: usize = 3;
pub const MAX_SUGGESTIONS: usize = 10;

const DESCRIPTION_INSTRUCTION: &str = "You write short, friendly descriptions for \
environmental campaigns. Answer with the description text only, in the language of the \
request, in at most three paragraphs.";

const MISSIONS_INSTRUCTION: &str = "You design missions for environmental campaigns. \
Answer with a JSON array only. Each element must be an object with the fields \"title\", \
\"description\", \"verification_type\" (one of IMAGE, TEXT_REVIEW, QUIZ, LOCATION) and \
\"reward_points\" (a non-negative integer).";

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MissionSuggestion {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_verification_type")]
    pub verification_type: VerificationType,
    #[serde(default)]
    pub reward_points: i64,
}

fn default_verification_type() -> VerificationType {
    VerificationType::Image
}

fn validate_prompt(prompt: &str) -> Result<&str, Error> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(Error::InvalidPrompt);
    }

    Ok(prompt)
}

/// Removes a surrounding Markdown code fence, with or without a language tag.
pub fn strip_code_fences(output: &str) -> &str {
    let trimmed = output.trim();
    let inner = match trimmed.strip_prefix("```") {
        Some(rest) => rest,
        None => return trimmed,
    };

    // drop the language tag line, if any
    let inner = match inner.find('\n') {
        Some(newline) => &inner[newline + 1..],
        None => inner,
    };

    inner.trim_end().trim_end_matches("```").trim()
}

pub fn parse_suggestions(output: &str) -> Result<Vec<MissionSuggestion>, Error> {
    let json = strip_code_fences(output);
    let value: serde_json::Value =
        serde_json::from_str(json).map_err(|err| Error::AssistantReturnedInvalidOutput {
            reason: format!("output is not json: {}", err),
        })?;

    if !value.is_array() {
        return Err(Error::AssistantReturnedInvalidOutput {
            reason: "output is not a json array".to_string(),
        });
    }

    let suggestions: Vec<MissionSuggestion> =
        serde_json::from_value(value).map_err(|err| Error::AssistantReturnedInvalidOutput {
            reason: format!("output does not describe missions: {}", err),
        })?;

    Ok(suggestions
        .into_iter()
        .map(|mut suggestion| {
            suggestion.reward_points = suggestion.reward_points.max(0);
            suggestion
        })
        .collect())
}

#[tracing::instrument(skip(model))]
pub async fn describe(model: &dyn LanguageModel, prompt: &str) -> Result<String, Error> {
    let prompt = validate_prompt(prompt)?;

    let text = model.complete(DESCRIPTION_INSTRUCTION, prompt).await?;

    Ok(strip_code_fences(&text).to_owned())
}

#[tracing::instrument(skip(model))]
pub async fn suggest_missions(
    model: &dyn LanguageModel,
    prompt: &str,
    count: Option<usize>,
) -> Result<Vec<MissionSuggestion>, Error> {
    let prompt = validate_prompt(prompt)?;
    let count = count.unwrap_or(DEFAULT_SUGGESTIONS).clamp(1, MAX_SUGGESTIONS);

    let request = format!("Suggest {} missions for this campaign:\n{}", count, prompt);
    let output = model.complete(MISSIONS_INSTRUCTION, &request).await?;

    let mut suggestions = parse_suggestions(&output)?;
    if suggestions.len() > count {
        warn!("assistant returned {} missions, keeping {}", suggestions.len(), count);
        suggestions.truncate(count);
    }

    Ok(suggestions)
}
