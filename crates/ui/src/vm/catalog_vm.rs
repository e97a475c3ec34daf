use services::api::AssessmentConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssessmentCardVm {
    pub config_id: u64,
    pub name: String,
    pub summary: Option<String>,
    pub instructions: Vec<String>,
}

#[must_use]
pub fn map_assessment_cards(configs: &[AssessmentConfig]) -> Vec<AssessmentCardVm> {
    configs
        .iter()
        .map(|config| AssessmentCardVm {
            config_id: config.id.value(),
            name: config.name.clone(),
            summary: config
                .summary
                .as_ref()
                .filter(|summary| !summary.trim().is_empty())
                .cloned(),
            instructions: config
                .instructions
                .iter()
                .filter(|line| !line.trim().is_empty())
                .cloned()
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assess_core::model::ConfigId;

    #[test]
    fn blank_summary_and_instructions_are_dropped() {
        let config = AssessmentConfig {
            id: ConfigId::new(4),
            name: "Listening".to_string(),
            summary: Some("  ".to_string()),
            instructions: vec!["Use headphones".to_string(), String::new()],
        };

        let cards = map_assessment_cards(&[config]);

        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].config_id, 4);
        assert_eq!(cards[0].summary, None);
        assert_eq!(cards[0].instructions, vec!["Use headphones".to_string()]);
    }
}
