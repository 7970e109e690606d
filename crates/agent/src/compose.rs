use partline_core::catalog::{ModelRecord, PartRecord, SymptomRecord};
use partline_core::{
    Catalog, CompatibilityPayload, CompatibleProduct, DataIntegrityError, DiagnosisStep,
    DomainLookup, ExtractedEntities, InstallationPayload, Intent, PartInfo, RecommendedPart,
    ResponsePayload, TroubleshootingPayload,
};

use crate::classify::Classification;

pub const GENERAL_GUIDANCE: &str = "**How I can help**\n\
I can help with refrigerator and dishwasher parts.\n\
• Installation: \"How do I install part PS11752778?\"\n\
• Compatibility: \"Is this compatible with WDT780SAEM1?\"\n\
• Troubleshooting: \"My ice maker is not working\"";

/// Builds the payload for a classified query from looked-up domain facts.
#[derive(Clone, Debug, Default)]
pub struct ResponseComposer<L = Catalog> {
    lookup: L,
}

impl<L> ResponseComposer<L>
where
    L: DomainLookup,
{
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Unknown identifiers and symptoms fall back to the general payload. Out-of-range
    /// numeric facts are reported as `DataIntegrityError` instead of being passed on.
    pub fn compose(
        &self,
        classification: &Classification,
    ) -> Result<ResponsePayload, DataIntegrityError> {
        let resolved = match classification.intent {
            Intent::Installation => self.installation(&classification.entities),
            Intent::Compatibility => self.compatibility(&classification.entities),
            Intent::Troubleshooting => self.troubleshooting(classification.symptom.as_deref()),
            Intent::General => None,
        };
        let payload = resolved.unwrap_or_else(|| ResponsePayload::general(GENERAL_GUIDANCE));
        payload.validate()?;
        Ok(payload)
    }

    fn installation(&self, entities: &ExtractedEntities) -> Option<ResponsePayload> {
        let part = entities.part_numbers.iter().find_map(|number| self.lookup.part(number))?;
        Some(ResponsePayload::Installation(InstallationPayload {
            text: installation_text(part),
            part: PartInfo {
                part_number: part.part_number.clone(),
                name: part.name.clone(),
                price: part.price,
                in_stock: part.in_stock,
            },
        }))
    }

    fn compatibility(&self, entities: &ExtractedEntities) -> Option<ResponsePayload> {
        let model = self.lookup.model(entities.model_number()?)?;
        if model.compatible_parts.is_empty() {
            return None;
        }
        let products = model
            .compatible_parts
            .iter()
            .map(|record| CompatibleProduct {
                part_number: record.part_number.clone(),
                name: record.name.clone(),
                price: record.price,
                compatibility_label: record.compatibility_label.clone(),
                fix_rate_percent: record.fix_rate_percent,
            })
            .collect();
        Some(ResponsePayload::Compatibility(CompatibilityPayload {
            text: compatibility_text(model),
            products,
        }))
    }

    fn troubleshooting(&self, subject: Option<&str>) -> Option<ResponsePayload> {
        let symptom = self.lookup.symptom(subject?)?;
        if symptom.steps.is_empty() {
            return None;
        }
        let steps = symptom
            .steps
            .iter()
            .map(|record| DiagnosisStep {
                issue: record.issue.clone(),
                solution: record.solution.clone(),
                likelihood_label: record.likelihood.clone(),
            })
            .collect();
        let recommended_parts = (!symptom.recommended_parts.is_empty()).then(|| {
            symptom
                .recommended_parts
                .iter()
                .map(|record| RecommendedPart {
                    part_number: record.part_number.clone(),
                    name: record.name.clone(),
                    price: record.price,
                    fix_rate_percent: record.fix_rate_percent,
                    review_score: record.review_score,
                })
                .collect()
        });
        Some(ResponsePayload::Troubleshooting(TroubleshootingPayload {
            text: troubleshooting_text(symptom),
            steps,
            recommended_parts,
        }))
    }
}

fn installation_text(part: &PartRecord) -> String {
    let mut lines = vec![format!("**Installing the {} ({})**", part.name, part.part_number)];
    if let Some(difficulty) = part.difficulty.as_deref() {
        lines.push(format!("Difficulty: {difficulty}"));
    }
    if part.install_steps.is_empty() {
        lines.push("Follow the instructions included with the part.".to_string());
    } else {
        lines.push(String::new());
        lines.extend(
            part.install_steps
                .iter()
                .enumerate()
                .map(|(index, step)| format!("{}. {step}", index + 1)),
        );
    }
    lines.join("\n")
}

fn compatibility_text(model: &ModelRecord) -> String {
    let mut lines = vec![
        format!("**Parts compatible with {} {}**", model.brand, model.model_number),
        model.description.clone(),
        String::new(),
    ];
    lines.extend(
        model
            .compatible_parts
            .iter()
            .map(|part| format!("• {} ({}): {}", part.name, part.part_number, part.compatibility_label)),
    );
    lines.join("\n")
}

fn troubleshooting_text(symptom: &SymptomRecord) -> String {
    let appliance = symptom.appliance.label();
    let title = if symptom.subject.eq_ignore_ascii_case(appliance) {
        symptom.subject.clone()
    } else {
        format!("{appliance} {}", symptom.subject)
    };
    let mut lines = vec![
        format!("**Troubleshooting your {title}**"),
        symptom.summary.clone(),
        String::new(),
    ];
    lines.extend(
        symptom
            .steps
            .iter()
            .enumerate()
            .map(|(index, step)| format!("{}. {}: {}", index + 1, step.issue, step.solution)),
    );
    lines.join("\n")
}
