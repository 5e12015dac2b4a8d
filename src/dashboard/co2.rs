use crate::campaign::CampaignCategory;

/// Kilograms of CO2 saved by one completed mission of a campaign in `category`.
pub fn coefficient(category: CampaignCategory) -> f64 {
    match category {
        CampaignCategory::Transportation => 2.6,
        CampaignCategory::Energy => 1.2,
        CampaignCategory::Recycling => 0.5,
        CampaignCategory::ZeroWaste => 0.3,
        CampaignCategory::Food => 0.9,
        CampaignCategory::Water => 0.2,
        CampaignCategory::Nature => 1.5,
        CampaignCategory::Etc => 0.1,
    }
}

pub fn co2_kg(category: CampaignCategory, completed: usize) -> f64 {
    coefficient(category) * completed as f64
}

/// Rounds to grams for presentation.
pub fn round_kg(kg: f64) -> f64 {
    (kg * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_has_a_positive_coefficient() {
        for category in CampaignCategory::ALL {
            assert!(coefficient(category) > 0.0, "{}", category.label());
        }
        assert_eq!(co2_kg(CampaignCategory::Transportation, 3), 2.6 * 3.0);
        assert_eq!(co2_kg(CampaignCategory::Water, 0), 0.0);
    }

    #[test]
    fn rounding_drops_float_noise() {
        assert_eq!(round_kg(0.1 * 3.0), 0.3);
        assert_eq!(round_kg(2.6 * 7.0), 18.2);
    }
}
