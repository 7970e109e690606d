use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Appliance categories the assistant supports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Appliance {
    Refrigerator,
    Dishwasher,
}

impl Appliance {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Refrigerator => "refrigerator",
            Self::Dishwasher => "dishwasher",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartRecord {
    pub part_number: String,
    pub name: String,
    pub appliance: Appliance,
    pub price: Decimal,
    pub in_stock: bool,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub install_steps: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibleRecord {
    pub part_number: String,
    pub name: String,
    pub price: Decimal,
    pub compatibility_label: String,
    pub fix_rate_percent: u8,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelRecord {
    pub model_number: String,
    pub brand: String,
    pub appliance: Appliance,
    pub description: String,
    #[serde(default)]
    pub compatible_parts: Vec<CompatibleRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisRecord {
    pub issue: String,
    pub solution: String,
    pub likelihood: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendedRecord {
    pub part_number: String,
    pub name: String,
    pub price: Decimal,
    pub fix_rate_percent: u8,
    pub review_score: Decimal,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomRecord {
    pub subject: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub appliance: Appliance,
    pub summary: String,
    #[serde(default)]
    pub steps: Vec<DiagnosisRecord>,
    #[serde(default)]
    pub recommended_parts: Vec<RecommendedRecord>,
}

impl SymptomRecord {
    fn answers_to(&self, subject: &str) -> bool {
        same_identifier(&self.subject, subject)
            || self.aliases.iter().any(|alias| same_identifier(alias, subject))
    }
}

/// Read-only source of resolved domain facts used by the response composer.
pub trait DomainLookup: Send + Sync {
    fn part(&self, part_number: &str) -> Option<&PartRecord>;
    fn model(&self, model_number: &str) -> Option<&ModelRecord>;
    fn symptom(&self, subject: &str) -> Option<&SymptomRecord>;
    fn known_part_numbers(&self) -> Vec<String>;
    /// Subjects and aliases, in record order.
    fn known_symptom_subjects(&self) -> Vec<String>;
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("could not read catalog file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse catalog: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("catalog contains duplicate {kind} `{key}`")]
    Duplicate { kind: &'static str, key: String },
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    parts: Vec<PartRecord>,
    #[serde(default)]
    models: Vec<ModelRecord>,
    #[serde(default)]
    symptoms: Vec<SymptomRecord>,
}

impl Catalog {
    pub fn new(
        parts: Vec<PartRecord>,
        models: Vec<ModelRecord>,
        symptoms: Vec<SymptomRecord>,
    ) -> Self {
        Self { parts, models, symptoms }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, CatalogError> {
        let catalog = toml::from_str::<Catalog>(raw)?;
        catalog.check_unique()?;
        Ok(catalog)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path)
            .map_err(|source| CatalogError::ReadFile { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&raw)
    }

    /// Loads `path` when given, otherwise the built-in table.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, CatalogError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::builtin()),
        }
    }

    pub fn parts(&self) -> &[PartRecord] {
        &self.parts
    }

    pub fn models(&self) -> &[ModelRecord] {
        &self.models
    }

    pub fn symptoms(&self) -> &[SymptomRecord] {
        &self.symptoms
    }

    fn check_unique(&self) -> Result<(), CatalogError> {
        let mut seen = Vec::<String>::new();
        for part in &self.parts {
            let key = part.part_number.to_ascii_uppercase();
            if seen.contains(&key) {
                return Err(CatalogError::Duplicate { kind: "part", key: part.part_number.clone() });
            }
            seen.push(key);
        }

        seen.clear();
        for model in &self.models {
            let key = model.model_number.to_ascii_uppercase();
            if seen.contains(&key) {
                return Err(CatalogError::Duplicate {
                    kind: "model",
                    key: model.model_number.clone(),
                });
            }
            seen.push(key);
        }

        seen.clear();
        for symptom in &self.symptoms {
            let key = symptom.subject.to_ascii_lowercase();
            if seen.contains(&key) {
                return Err(CatalogError::Duplicate {
                    kind: "symptom",
                    key: symptom.subject.clone(),
                });
            }
            seen.push(key);
        }

        Ok(())
    }

    pub fn builtin() -> Self {
        Self::new(builtin_parts(), builtin_models(), builtin_symptoms())
    }
}

impl DomainLookup for Catalog {
    fn part(&self, part_number: &str) -> Option<&PartRecord> {
        self.parts.iter().find(|part| same_identifier(&part.part_number, part_number))
    }

    fn model(&self, model_number: &str) -> Option<&ModelRecord> {
        self.models.iter().find(|model| same_identifier(&model.model_number, model_number))
    }

    fn symptom(&self, subject: &str) -> Option<&SymptomRecord> {
        self.symptoms.iter().find(|symptom| symptom.answers_to(subject))
    }

    fn known_part_numbers(&self) -> Vec<String> {
        self.parts.iter().map(|part| part.part_number.clone()).collect()
    }

    fn known_symptom_subjects(&self) -> Vec<String> {
        self.symptoms
            .iter()
            .flat_map(|symptom| std::iter::once(&symptom.subject).chain(symptom.aliases.iter()))
            .cloned()
            .collect()
    }
}

fn same_identifier(left: &str, right: &str) -> bool {
    left.trim().eq_ignore_ascii_case(right.trim())
}

fn builtin_parts() -> Vec<PartRecord> {
    vec![
        PartRecord {
            part_number: "PS11752778".to_string(),
            name: "Refrigerator Door Shelf Bin".to_string(),
            appliance: Appliance::Refrigerator,
            price: Decimal::new(4_495, 2),
            in_stock: true,
            difficulty: Some("Really Easy".to_string()),
            install_steps: vec![
                "Open the refrigerator door and empty the existing door bin.".to_string(),
                "Lift the old bin straight up and pull it away from the door liner.".to_string(),
                "Line up the new bin with the molded supports on the door liner.".to_string(),
                "Press the bin down until both sides seat on the supports.".to_string(),
            ],
        },
        PartRecord {
            part_number: "PS11722130".to_string(),
            name: "Refrigerator Ice Maker Assembly".to_string(),
            appliance: Appliance::Refrigerator,
            price: Decimal::new(11_959, 2),
            in_stock: true,
            difficulty: Some("Easy".to_string()),
            install_steps: vec![
                "Unplug the refrigerator and shut off the water supply.".to_string(),
                "Remove the ice bucket and disconnect the ice maker wire harness.".to_string(),
                "Remove the mounting screws and lift the old ice maker out.".to_string(),
                "Mount the new assembly, reconnect the harness and restore power and water."
                    .to_string(),
            ],
        },
        PartRecord {
            part_number: "PS11739145".to_string(),
            name: "Refrigerator Water Inlet Valve".to_string(),
            appliance: Appliance::Refrigerator,
            price: Decimal::new(6_449, 2),
            in_stock: true,
            difficulty: Some("Moderate".to_string()),
            install_steps: vec![
                "Unplug the refrigerator and shut off the household water supply.".to_string(),
                "Remove the lower rear access panel.".to_string(),
                "Disconnect the water lines and wiring from the old valve.".to_string(),
                "Install the new valve, reconnect lines and wiring, then check for leaks."
                    .to_string(),
            ],
        },
        PartRecord {
            part_number: "PS11746591".to_string(),
            name: "Dishwasher Rack Track Stop".to_string(),
            appliance: Appliance::Dishwasher,
            price: Decimal::new(1_095, 2),
            in_stock: true,
            difficulty: Some("Really Easy".to_string()),
            install_steps: vec![
                "Pull the lower rack all the way out.".to_string(),
                "Squeeze the old stop and slide it off the end of the track.".to_string(),
                "Snap the new stop onto the track until it clicks.".to_string(),
            ],
        },
        PartRecord {
            part_number: "PS10065979".to_string(),
            name: "Dishwasher Upper Rack Adjuster Kit".to_string(),
            appliance: Appliance::Dishwasher,
            price: Decimal::new(4_538, 2),
            in_stock: false,
            difficulty: Some("Easy".to_string()),
            install_steps: vec![
                "Remove the upper rack from the dishwasher.".to_string(),
                "Release the adjuster from the rack by pressing its locking tab.".to_string(),
                "Clip the new adjuster onto the rack wire and reinstall the rack.".to_string(),
            ],
        },
        PartRecord {
            part_number: "PS11756150".to_string(),
            name: "Dishwasher Drain Pump".to_string(),
            appliance: Appliance::Dishwasher,
            price: Decimal::new(5_789, 2),
            in_stock: true,
            difficulty: Some("Moderate".to_string()),
            install_steps: vec![
                "Disconnect power and remove the lower kick plate.".to_string(),
                "Drain remaining water and disconnect the pump hoses.".to_string(),
                "Twist the old pump counterclockwise to release it from the sump.".to_string(),
                "Seat the new pump, reconnect the hoses and wiring, then run a test cycle."
                    .to_string(),
            ],
        },
    ]
}

fn builtin_models() -> Vec<ModelRecord> {
    vec![
        ModelRecord {
            model_number: "WDT780SAEM1".to_string(),
            brand: "Whirlpool".to_string(),
            appliance: Appliance::Dishwasher,
            description: "Whirlpool built-in dishwasher".to_string(),
            compatible_parts: vec![
                CompatibleRecord {
                    part_number: "PS11746591".to_string(),
                    name: "Dishwasher Rack Track Stop".to_string(),
                    price: Decimal::new(1_095, 2),
                    compatibility_label: "Direct fit".to_string(),
                    fix_rate_percent: 95,
                },
                CompatibleRecord {
                    part_number: "PS10065979".to_string(),
                    name: "Dishwasher Upper Rack Adjuster Kit".to_string(),
                    price: Decimal::new(4_538, 2),
                    compatibility_label: "Direct fit".to_string(),
                    fix_rate_percent: 88,
                },
                CompatibleRecord {
                    part_number: "PS11756150".to_string(),
                    name: "Dishwasher Drain Pump".to_string(),
                    price: Decimal::new(5_789, 2),
                    compatibility_label: "Fits with adapter".to_string(),
                    fix_rate_percent: 41,
                },
            ],
        },
        ModelRecord {
            model_number: "WRS588FIHZ00".to_string(),
            brand: "Whirlpool".to_string(),
            appliance: Appliance::Refrigerator,
            description: "Whirlpool side-by-side refrigerator".to_string(),
            compatible_parts: vec![
                CompatibleRecord {
                    part_number: "PS11752778".to_string(),
                    name: "Refrigerator Door Shelf Bin".to_string(),
                    price: Decimal::new(4_495, 2),
                    compatibility_label: "Direct fit".to_string(),
                    fix_rate_percent: 90,
                },
                CompatibleRecord {
                    part_number: "PS11722130".to_string(),
                    name: "Refrigerator Ice Maker Assembly".to_string(),
                    price: Decimal::new(11_959, 2),
                    compatibility_label: "Direct fit".to_string(),
                    fix_rate_percent: 32,
                },
            ],
        },
    ]
}

fn builtin_symptoms() -> Vec<SymptomRecord> {
    vec![
        SymptomRecord {
            subject: "ice maker".to_string(),
            aliases: vec!["ice dispenser".to_string()],
            appliance: Appliance::Refrigerator,
            summary: "An ice maker that stops producing ice is usually starved of water or has a failed module."
                .to_string(),
            steps: vec![
                DiagnosisRecord {
                    issue: "Water supply restricted".to_string(),
                    solution: "Check that the household water valve is fully open and the supply line is not kinked."
                        .to_string(),
                    likelihood: "Very likely".to_string(),
                },
                DiagnosisRecord {
                    issue: "Water inlet valve failed".to_string(),
                    solution: "Test the inlet valve solenoid for continuity and replace the valve if it reads open."
                        .to_string(),
                    likelihood: "Likely".to_string(),
                },
                DiagnosisRecord {
                    issue: "Ice maker assembly failed".to_string(),
                    solution: "Confirm the shut-off arm is down; replace the assembly if it never cycles."
                        .to_string(),
                    likelihood: "Possible".to_string(),
                },
            ],
            recommended_parts: vec![
                RecommendedRecord {
                    part_number: "PS11722130".to_string(),
                    name: "Refrigerator Ice Maker Assembly".to_string(),
                    price: Decimal::new(11_959, 2),
                    fix_rate_percent: 32,
                    review_score: Decimal::new(45, 1),
                },
                RecommendedRecord {
                    part_number: "PS11739145".to_string(),
                    name: "Refrigerator Water Inlet Valve".to_string(),
                    price: Decimal::new(6_449, 2),
                    fix_rate_percent: 24,
                    review_score: Decimal::new(46, 1),
                },
            ],
        },
        SymptomRecord {
            subject: "dishwasher".to_string(),
            aliases: vec!["drain".to_string()],
            appliance: Appliance::Dishwasher,
            summary: "Standing water after a cycle points at a blocked drain path or a failed pump."
                .to_string(),
            steps: vec![
                DiagnosisRecord {
                    issue: "Clogged filter or sump".to_string(),
                    solution: "Remove and rinse the filter assembly, then clear debris from the sump."
                        .to_string(),
                    likelihood: "Very likely".to_string(),
                },
                DiagnosisRecord {
                    issue: "Kinked drain hose".to_string(),
                    solution: "Straighten the drain hose behind the unit and confirm the high loop is intact."
                        .to_string(),
                    likelihood: "Likely".to_string(),
                },
                DiagnosisRecord {
                    issue: "Drain pump failed".to_string(),
                    solution: "Listen for the pump during drain; replace it if it hums without moving water."
                        .to_string(),
                    likelihood: "Possible".to_string(),
                },
            ],
            recommended_parts: vec![RecommendedRecord {
                part_number: "PS11756150".to_string(),
                name: "Dishwasher Drain Pump".to_string(),
                price: Decimal::new(5_789, 2),
                fix_rate_percent: 37,
                review_score: Decimal::new(47, 1),
            }],
        },
        SymptomRecord {
            subject: "refrigerator".to_string(),
            aliases: vec!["fridge".to_string(), "freezer".to_string()],
            appliance: Appliance::Refrigerator,
            summary: "A refrigerator that runs warm usually has an airflow or door seal problem."
                .to_string(),
            steps: vec![
                DiagnosisRecord {
                    issue: "Blocked air vents".to_string(),
                    solution: "Move food away from the vents between the freezer and fresh food sections."
                        .to_string(),
                    likelihood: "Likely".to_string(),
                },
                DiagnosisRecord {
                    issue: "Dirty condenser coils".to_string(),
                    solution: "Unplug the unit and vacuum the condenser coils behind the kick plate."
                        .to_string(),
                    likelihood: "Likely".to_string(),
                },
                DiagnosisRecord {
                    issue: "Worn door gasket".to_string(),
                    solution: "Close the door on a sheet of paper; replace the gasket if it slides out freely."
                        .to_string(),
                    likelihood: "Possible".to_string(),
                },
            ],
            recommended_parts: Vec::new(),
        },
    ]
}
