use partline_core::domain::payload::{
    CompatibilityPayload, InstallationPayload, ResponsePayload, TroubleshootingPayload,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelField {
    pub label: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelItem {
    pub heading: String,
    pub fields: Vec<PanelField>,
}

/// Typed attachment card shown beside the narrative blocks.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Panel {
    pub panel_id: String,
    pub title: String,
    pub items: Vec<PanelItem>,
}

pub struct PanelBuilder {
    panel_id: String,
    title: String,
    items: Vec<PanelItem>,
}

impl PanelBuilder {
    pub fn new(panel_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self { panel_id: panel_id.into(), title: title.into(), items: Vec::new() }
    }

    pub fn item<F>(mut self, heading: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ItemBuilder),
    {
        let mut builder = ItemBuilder::default();
        build(&mut builder);
        self.items.push(PanelItem { heading: heading.into(), fields: builder.build() });
        self
    }

    pub fn build(self) -> Panel {
        Panel { panel_id: self.panel_id, title: self.title, items: self.items }
    }
}

#[derive(Default)]
pub struct ItemBuilder {
    fields: Vec<PanelField>,
}

impl ItemBuilder {
    pub fn field(&mut self, label: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.fields.push(PanelField { label: label.into(), value: value.into() });
        self
    }

    fn build(self) -> Vec<PanelField> {
        self.fields
    }
}

/// Panels for a payload's attachments. The general payload has none.
pub fn payload_panels(payload: &ResponsePayload) -> Vec<Panel> {
    match payload {
        ResponsePayload::Installation(installation) => vec![installation_panel(installation)],
        ResponsePayload::Compatibility(compatibility) => vec![compatibility_panel(compatibility)],
        ResponsePayload::Troubleshooting(troubleshooting) => {
            troubleshooting_panels(troubleshooting)
        }
        ResponsePayload::General(_) => Vec::new(),
    }
}

fn installation_panel(payload: &InstallationPayload) -> Panel {
    let part = &payload.part;
    PanelBuilder::new("installation.part.v1", "Part details")
        .item(part.name.clone(), |item| {
            item.field("Part number", part.part_number.clone())
                .field("Price", format_price(part.price))
                .field("Availability", if part.in_stock { "In stock" } else { "Out of stock" });
        })
        .build()
}

fn compatibility_panel(payload: &CompatibilityPayload) -> Panel {
    payload
        .products
        .iter()
        .fold(PanelBuilder::new("compatibility.products.v1", "Compatible parts"), |panel, product| {
            panel.item(product.name.clone(), |item| {
                item.field("Part number", product.part_number.clone())
                    .field("Price", format_price(product.price))
                    .field("Compatibility", product.compatibility_label.clone())
                    .field("Fix rate", format!("{}%", product.fix_rate_percent));
            })
        })
        .build()
}

fn troubleshooting_panels(payload: &TroubleshootingPayload) -> Vec<Panel> {
    let diagnosis = payload
        .steps
        .iter()
        .fold(PanelBuilder::new("troubleshooting.diagnosis.v1", "Likely causes"), |panel, step| {
            panel.item(step.issue.clone(), |item| {
                item.field("Likelihood", step.likelihood_label.clone())
                    .field("What to do", step.solution.clone());
            })
        })
        .build();

    let mut panels = vec![diagnosis];
    if let Some(parts) = payload.recommended_parts.as_ref().filter(|parts| !parts.is_empty()) {
        let recommended = parts
            .iter()
            .fold(PanelBuilder::new("troubleshooting.parts.v1", "Recommended parts"), |panel, part| {
                panel.item(part.name.clone(), |item| {
                    item.field("Part number", part.part_number.clone())
                        .field("Price", format_price(part.price))
                        .field("Fix rate", format!("{}%", part.fix_rate_percent))
                        .field("Rating", format!("{} / 5", part.review_score.normalize()));
                })
            })
            .build();
        panels.push(recommended);
    }
    panels
}

pub fn format_price(price: Decimal) -> String {
    format!("${:.2}", price)
}

#[cfg(test)]
mod tests {
    use partline_core::domain::payload::{
        DiagnosisStep, InstallationPayload, PartInfo, RecommendedPart, ResponsePayload,
        TroubleshootingPayload,
    };
    use rust_decimal::Decimal;

    use super::{format_price, payload_panels, PanelBuilder};

    #[test]
    fn installation_payload_yields_single_part_panel() {
        let payload = ResponsePayload::Installation(InstallationPayload {
            text: "**Installing**".to_string(),
            part: PartInfo {
                part_number: "PS11752778".to_string(),
                name: "Refrigerator Door Shelf Bin".to_string(),
                price: Decimal::new(4_495, 2),
                in_stock: true,
            },
        });

        let panels = payload_panels(&payload);
        assert_eq!(panels.len(), 1);
        assert_eq!(panels[0].panel_id, "installation.part.v1");
        assert_eq!(panels[0].items[0].heading, "Refrigerator Door Shelf Bin");
        assert_eq!(panels[0].items[0].fields[1].value, "$44.95");
        assert_eq!(panels[0].items[0].fields[2].value, "In stock");
    }

    #[test]
    fn troubleshooting_adds_parts_panel_only_when_parts_exist() {
        let step = DiagnosisStep {
            issue: "Water supply restricted".to_string(),
            solution: "Open the valve.".to_string(),
            likelihood_label: "Very likely".to_string(),
        };
        let without_parts = ResponsePayload::Troubleshooting(TroubleshootingPayload {
            text: "steps".to_string(),
            steps: vec![step.clone()],
            recommended_parts: None,
        });
        assert_eq!(payload_panels(&without_parts).len(), 1);

        let with_parts = ResponsePayload::Troubleshooting(TroubleshootingPayload {
            text: "steps".to_string(),
            steps: vec![step],
            recommended_parts: Some(vec![RecommendedPart {
                part_number: "PS11722130".to_string(),
                name: "Ice Maker Assembly".to_string(),
                price: Decimal::new(11_959, 2),
                fix_rate_percent: 32,
                review_score: Decimal::new(450, 2),
            }]),
        });
        let panels = payload_panels(&with_parts);
        assert_eq!(panels.len(), 2);
        assert_eq!(panels[1].panel_id, "troubleshooting.parts.v1");
        assert_eq!(panels[1].items[0].fields[3].value, "4.5 / 5");
    }

    #[test]
    fn general_payload_has_no_panels() {
        assert!(payload_panels(&ResponsePayload::general("Ask me about parts")).is_empty());
    }

    #[test]
    fn builder_keeps_item_order() {
        let panel = PanelBuilder::new("test.v1", "Test")
            .item("first", |item| {
                item.field("a", "1");
            })
            .item("second", |item| {
                item.field("b", "2");
            })
            .build();
        let headings = panel.items.iter().map(|item| item.heading.as_str()).collect::<Vec<_>>();
        assert_eq!(headings, vec!["first", "second"]);
    }

    #[test]
    fn prices_render_with_two_decimals() {
        assert_eq!(format_price(Decimal::new(109, 1)), "$10.90");
        assert_eq!(format_price(Decimal::new(5, 0)), "$5.00");
    }
}
