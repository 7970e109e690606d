use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::intent::Intent;

pub const MAX_FIX_RATE_PERCENT: u8 = 100;

pub fn max_review_score() -> Decimal {
    Decimal::new(5, 0)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartInfo {
    pub part_number: String,
    pub name: String,
    pub price: Decimal,
    pub in_stock: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibleProduct {
    pub part_number: String,
    pub name: String,
    pub price: Decimal,
    pub compatibility_label: String,
    pub fix_rate_percent: u8,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisStep {
    pub issue: String,
    pub solution: String,
    pub likelihood_label: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendedPart {
    pub part_number: String,
    pub name: String,
    pub price: Decimal,
    pub fix_rate_percent: u8,
    pub review_score: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallationPayload {
    pub text: String,
    pub part: PartInfo,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityPayload {
    pub text: String,
    pub products: Vec<CompatibleProduct>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TroubleshootingPayload {
    pub text: String,
    pub steps: Vec<DiagnosisStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_parts: Option<Vec<RecommendedPart>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralPayload {
    pub text: String,
}

/// Structured bot response keyed by intent.
///
/// Attachments live inside the variant that owns them, so a payload can never
/// carry fields that belong to a different intent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum ResponsePayload {
    Installation(InstallationPayload),
    Compatibility(CompatibilityPayload),
    Troubleshooting(TroubleshootingPayload),
    General(GeneralPayload),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DataIntegrityError {
    #[error("fix rate {value}% for `{part_number}` is outside 0..=100")]
    FixRateOutOfRange { part_number: String, value: i64 },
    #[error("review score {value} for `{part_number}` is outside 0..=5")]
    ReviewScoreOutOfRange { part_number: String, value: Decimal },
    #[error("price {value} for `{part_number}` is negative")]
    NegativePrice { part_number: String, value: Decimal },
    #[error("{intent} payload has no {field}")]
    EmptyAttachment { intent: Intent, field: &'static str },
    #[error("{intent} payload has a blank `{field}`")]
    BlankField { intent: Intent, field: &'static str },
}

impl ResponsePayload {
    pub fn general(text: impl Into<String>) -> Self {
        Self::General(GeneralPayload { text: text.into() })
    }

    pub fn intent(&self) -> Intent {
        match self {
            Self::Installation(_) => Intent::Installation,
            Self::Compatibility(_) => Intent::Compatibility,
            Self::Troubleshooting(_) => Intent::Troubleshooting,
            Self::General(_) => Intent::General,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Installation(payload) => &payload.text,
            Self::Compatibility(payload) => &payload.text,
            Self::Troubleshooting(payload) => &payload.text,
            Self::General(payload) => &payload.text,
        }
    }

    pub fn has_attachments(&self) -> bool {
        match self {
            Self::Installation(_) => true,
            Self::Compatibility(payload) => !payload.products.is_empty(),
            Self::Troubleshooting(payload) => !payload.steps.is_empty(),
            Self::General(_) => false,
        }
    }

    /// Checks the numeric ranges and non-empty attachment rules.
    pub fn validate(&self) -> Result<(), DataIntegrityError> {
        match self {
            Self::Installation(payload) => {
                let part = &payload.part;
                require_text(Intent::Installation, "partNumber", &part.part_number)?;
                require_text(Intent::Installation, "name", &part.name)?;
                check_price(&part.part_number, part.price)
            }
            Self::Compatibility(payload) => {
                if payload.products.is_empty() {
                    return Err(DataIntegrityError::EmptyAttachment {
                        intent: Intent::Compatibility,
                        field: "products",
                    });
                }
                for product in &payload.products {
                    require_text(Intent::Compatibility, "partNumber", &product.part_number)?;
                    require_text(
                        Intent::Compatibility,
                        "compatibilityLabel",
                        &product.compatibility_label,
                    )?;
                    check_price(&product.part_number, product.price)?;
                    check_fix_rate(&product.part_number, i64::from(product.fix_rate_percent))?;
                }
                Ok(())
            }
            Self::Troubleshooting(payload) => {
                if payload.steps.is_empty() {
                    return Err(DataIntegrityError::EmptyAttachment {
                        intent: Intent::Troubleshooting,
                        field: "steps",
                    });
                }
                for step in &payload.steps {
                    require_text(Intent::Troubleshooting, "issue", &step.issue)?;
                    require_text(Intent::Troubleshooting, "likelihoodLabel", &step.likelihood_label)?;
                }
                for part in payload.recommended_parts.iter().flatten() {
                    require_text(Intent::Troubleshooting, "partNumber", &part.part_number)?;
                    check_price(&part.part_number, part.price)?;
                    check_fix_rate(&part.part_number, i64::from(part.fix_rate_percent))?;
                    check_review_score(&part.part_number, part.review_score)?;
                }
                Ok(())
            }
            Self::General(_) => Ok(()),
        }
    }
}

fn require_text(intent: Intent, field: &'static str, value: &str) -> Result<(), DataIntegrityError> {
    if value.trim().is_empty() {
        return Err(DataIntegrityError::BlankField { intent, field });
    }
    Ok(())
}

fn check_price(part_number: &str, value: Decimal) -> Result<(), DataIntegrityError> {
    if value < Decimal::ZERO {
        return Err(DataIntegrityError::NegativePrice { part_number: part_number.to_string(), value });
    }
    Ok(())
}

fn check_fix_rate(part_number: &str, value: i64) -> Result<u8, DataIntegrityError> {
    match u8::try_from(value) {
        Ok(percent) if percent <= MAX_FIX_RATE_PERCENT => Ok(percent),
        _ => Err(DataIntegrityError::FixRateOutOfRange {
            part_number: part_number.to_string(),
            value,
        }),
    }
}

fn check_review_score(part_number: &str, value: Decimal) -> Result<(), DataIntegrityError> {
    if value < Decimal::ZERO || value > max_review_score() {
        return Err(DataIntegrityError::ReviewScoreOutOfRange {
            part_number: part_number.to_string(),
            value,
        });
    }
    Ok(())
}

/// Payload as received from a remote answer service.
///
/// Fix rates are read as signed integers so that out-of-range values surface as
/// `DataIntegrityError` on conversion instead of failing to decode.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "intent", rename_all = "snake_case")]
pub enum WireResponsePayload {
    Installation(InstallationPayload),
    Compatibility(WireCompatibilityPayload),
    Troubleshooting(WireTroubleshootingPayload),
    General(GeneralPayload),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireCompatibilityPayload {
    pub text: String,
    pub products: Vec<WireCompatibleProduct>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireCompatibleProduct {
    pub part_number: String,
    pub name: String,
    pub price: Decimal,
    pub compatibility_label: String,
    pub fix_rate_percent: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireTroubleshootingPayload {
    pub text: String,
    pub steps: Vec<DiagnosisStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_parts: Option<Vec<WireRecommendedPart>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRecommendedPart {
    pub part_number: String,
    pub name: String,
    pub price: Decimal,
    pub fix_rate_percent: i64,
    pub review_score: Decimal,
}

impl TryFrom<WireCompatibleProduct> for CompatibleProduct {
    type Error = DataIntegrityError;

    fn try_from(wire: WireCompatibleProduct) -> Result<Self, Self::Error> {
        let fix_rate_percent = check_fix_rate(&wire.part_number, wire.fix_rate_percent)?;
        Ok(Self {
            part_number: wire.part_number,
            name: wire.name,
            price: wire.price,
            compatibility_label: wire.compatibility_label,
            fix_rate_percent,
        })
    }
}

impl TryFrom<WireRecommendedPart> for RecommendedPart {
    type Error = DataIntegrityError;

    fn try_from(wire: WireRecommendedPart) -> Result<Self, Self::Error> {
        let fix_rate_percent = check_fix_rate(&wire.part_number, wire.fix_rate_percent)?;
        Ok(Self {
            part_number: wire.part_number,
            name: wire.name,
            price: wire.price,
            fix_rate_percent,
            review_score: wire.review_score,
        })
    }
}

/// Converts and validates a remote payload.
impl TryFrom<WireResponsePayload> for ResponsePayload {
    type Error = DataIntegrityError;

    fn try_from(wire: WireResponsePayload) -> Result<Self, Self::Error> {
        let payload = match wire {
            WireResponsePayload::Installation(payload) => Self::Installation(payload),
            WireResponsePayload::Compatibility(payload) => {
                Self::Compatibility(CompatibilityPayload {
                    text: payload.text,
                    products: payload
                        .products
                        .into_iter()
                        .map(CompatibleProduct::try_from)
                        .collect::<Result<_, _>>()?,
                })
            }
            WireResponsePayload::Troubleshooting(payload) => {
                Self::Troubleshooting(TroubleshootingPayload {
                    text: payload.text,
                    steps: payload.steps,
                    recommended_parts: payload
                        .recommended_parts
                        .map(|parts| {
                            parts
                                .into_iter()
                                .map(RecommendedPart::try_from)
                                .collect::<Result<Vec<_>, _>>()
                        })
                        .transpose()?,
                })
            }
            WireResponsePayload::General(payload) => Self::General(payload),
        };
        payload.validate()?;
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{
        CompatibilityPayload, CompatibleProduct, DataIntegrityError, DiagnosisStep,
        InstallationPayload, PartInfo, RecommendedPart, ResponsePayload, TroubleshootingPayload,
        WireResponsePayload,
    };
    use crate::domain::intent::Intent;

    fn troubleshooting(review_score: Decimal, fix_rate_percent: u8) -> ResponsePayload {
        ResponsePayload::Troubleshooting(TroubleshootingPayload {
            text: "**Ice maker not working**".to_string(),
            steps: vec![DiagnosisStep {
                issue: "Water supply".to_string(),
                solution: "Open the supply valve.".to_string(),
                likelihood_label: "Very likely".to_string(),
            }],
            recommended_parts: Some(vec![RecommendedPart {
                part_number: "PS11722130".to_string(),
                name: "Ice Maker Assembly".to_string(),
                price: Decimal::new(11_959, 2),
                fix_rate_percent,
                review_score,
            }]),
        })
    }

    #[test]
    fn payload_reports_its_intent_tag() {
        let payload = ResponsePayload::Installation(InstallationPayload {
            text: "Install it".to_string(),
            part: PartInfo {
                part_number: "PS11752778".to_string(),
                name: "Door Shelf Bin".to_string(),
                price: Decimal::new(4_495, 2),
                in_stock: true,
            },
        });
        assert_eq!(payload.intent(), Intent::Installation);
        assert!(payload.has_attachments());
        assert!(payload.validate().is_ok());
        assert!(!ResponsePayload::general("hello").has_attachments());
    }

    #[test]
    fn wire_shape_uses_intent_tag_and_camel_case_fields() {
        let payload = ResponsePayload::Compatibility(CompatibilityPayload {
            text: "Compatible parts".to_string(),
            products: vec![CompatibleProduct {
                part_number: "PS11746591".to_string(),
                name: "Rack Track Stop".to_string(),
                price: Decimal::new(1_095, 2),
                compatibility_label: "Direct fit".to_string(),
                fix_rate_percent: 95,
            }],
        });

        let value = serde_json::to_value(&payload).expect("serialize");
        assert_eq!(value["intent"], "compatibility");
        assert_eq!(value["products"][0]["partNumber"], "PS11746591");
        assert_eq!(value["products"][0]["fixRatePercent"], 95);

        let decoded: ResponsePayload = serde_json::from_value(value).expect("deserialize");
        assert_eq!(decoded, payload);
    }

    #[test]
    fn fix_rate_above_one_hundred_is_rejected() {
        let error = troubleshooting(Decimal::new(45, 1), 140).validate().expect_err("out of range");
        assert!(matches!(error, DataIntegrityError::FixRateOutOfRange { value: 140, .. }));
    }

    #[test]
    fn review_score_above_five_is_rejected() {
        let error = troubleshooting(Decimal::new(51, 1), 40).validate().expect_err("out of range");
        assert!(matches!(error, DataIntegrityError::ReviewScoreOutOfRange { .. }));
        assert!(troubleshooting(Decimal::new(5, 0), 100).validate().is_ok());
    }

    #[test]
    fn empty_compatibility_list_is_an_integrity_error() {
        let payload = ResponsePayload::Compatibility(CompatibilityPayload {
            text: "nothing".to_string(),
            products: Vec::new(),
        });
        assert_eq!(
            payload.validate(),
            Err(DataIntegrityError::EmptyAttachment {
                intent: Intent::Compatibility,
                field: "products"
            })
        );
    }

    #[test]
    fn blank_likelihood_label_is_an_integrity_error() {
        let payload = ResponsePayload::Troubleshooting(TroubleshootingPayload {
            text: "steps".to_string(),
            steps: vec![DiagnosisStep {
                issue: "Door seal".to_string(),
                solution: "Replace the gasket.".to_string(),
                likelihood_label: "  ".to_string(),
            }],
            recommended_parts: None,
        });
        assert!(matches!(
            payload.validate(),
            Err(DataIntegrityError::BlankField { field: "likelihoodLabel", .. })
        ));
    }

    fn remote_compatibility(fix_rate: i64) -> serde_json::Value {
        serde_json::json!({
            "intent": "compatibility",
            "text": "Compatible parts",
            "products": [{
                "partNumber": "PS11746591",
                "name": "Rack Track Stop",
                "price": "10.95",
                "compatibilityLabel": "Direct fit",
                "fixRatePercent": fix_rate,
            }],
        })
    }

    #[test]
    fn remote_fix_rates_outside_a_byte_are_integrity_errors() {
        for fix_rate in [140, 300, -5] {
            let wire: WireResponsePayload =
                serde_json::from_value(remote_compatibility(fix_rate)).expect("wire decodes");
            let error = ResponsePayload::try_from(wire).expect_err("out of range");
            assert!(
                matches!(error, DataIntegrityError::FixRateOutOfRange { value, .. } if value == fix_rate),
                "unexpected error for {fix_rate}: {error}"
            );
        }
    }

    #[test]
    fn remote_payload_in_range_converts_to_domain_payload() {
        let wire: WireResponsePayload =
            serde_json::from_value(remote_compatibility(95)).expect("wire decodes");
        let ResponsePayload::Compatibility(payload) =
            ResponsePayload::try_from(wire).expect("valid payload")
        else {
            panic!("expected compatibility payload");
        };
        assert_eq!(payload.products[0].fix_rate_percent, 95);
    }
}
