use serde::{Deserialize, Serialize};

use crate::campaign::CampaignId;
use crate::error::Error;
use crate::typedid::{TypedId, TypedIdMarker};

pub mod db;
pub mod endpoints;
pub mod manager;
pub use endpoints::*;

pub type MissionId = TypedId<MissionTemplate>;

/// A gamified task participants complete within a campaign.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MissionTemplate {
    #[serde(rename = "_id")]
    pub id: MissionId,
    pub campaign_id: CampaignId,
    pub title: String,
    pub description: String,
    pub verification_type: VerificationType,
    pub reward_points: i64,
    pub order: i32,
    pub quiz: Option<Quiz>,
    pub location: Option<MissionLocation>,
}

impl TypedIdMarker for MissionTemplate {
    fn tag() -> &'static str {
        "MSN"
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationType {
    Image,
    TextReview,
    Quiz,
    Location,
}

impl VerificationType {
    pub fn label(self) -> &'static str {
        match self {
            VerificationType::Image => "IMAGE",
            VerificationType::TextReview => "TEXT_REVIEW",
            VerificationType::Quiz => "QUIZ",
            VerificationType::Location => "LOCATION",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Quiz {
    pub question: String,
    pub options: Vec<String>,
    pub answer_index: usize,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct MissionLocation {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
}

/// The partner-editable fields of a mission.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MissionDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub verification_type: VerificationType,
    #[serde(default)]
    pub reward_points: i64,
    #[serde(default)]
    pub order: Option<i32>,
    #[serde(default)]
    pub quiz: Option<Quiz>,
    #[serde(default)]
    pub location: Option<MissionLocation>,
}

impl MissionDraft {
    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |reason: &str| {
            Err(Error::InvalidMission {
                reason: reason.to_string(),
            })
        };

        if self.title.trim().is_empty() {
            return invalid("title must not be empty");
        }
        if self.reward_points < 0 {
            return invalid("reward_points must not be negative");
        }

        match self.verification_type {
            VerificationType::Quiz => match &self.quiz {
                None => return invalid("a QUIZ mission needs a quiz"),
                Some(quiz) if quiz.options.len() < 2 => {
                    return invalid("a quiz needs at least two options")
                }
                Some(quiz) if quiz.answer_index >= quiz.options.len() => {
                    return invalid("quiz answer_index is out of range")
                }
                Some(_) => {}
            },
            VerificationType::Location => match &self.location {
                None => return invalid("a LOCATION mission needs a location"),
                Some(location) if location.radius_meters <= 0.0 => {
                    return invalid("location radius_meters must be positive")
                }
                Some(_) => {}
            },
            VerificationType::Image | VerificationType::TextReview => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(verification_type: VerificationType) -> MissionDraft {
        MissionDraft {
            title: "Ride a bike".to_string(),
            description: String::new(),
            verification_type,
            reward_points: 10,
            order: None,
            quiz: None,
            location: None,
        }
    }

    #[test]
    fn quiz_mission_needs_a_consistent_quiz() {
        let mut mission = draft(VerificationType::Quiz);
        assert!(mission.validate().is_err());

        mission.quiz = Some(Quiz {
            question: "Which bin takes PET bottles?".to_string(),
            options: vec!["Plastic".to_string(), "Paper".to_string()],
            answer_index: 2,
        });
        assert!(mission.validate().is_err());

        mission.quiz.as_mut().unwrap().answer_index = 0;
        assert!(mission.validate().is_ok());
    }

    #[test]
    fn negative_rewards_are_rejected() {
        let mut mission = draft(VerificationType::Image);
        mission.reward_points = -1;

        assert!(matches!(
            mission.validate(),
            Err(Error::InvalidMission { .. })
        ));
    }
}
