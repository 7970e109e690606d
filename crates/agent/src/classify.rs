use partline_core::{DomainLookup, ExtractedEntities, Intent};
use serde::{Deserialize, Serialize};

use crate::extract::{EntityExtractor, ExtractionPatterns, PatternExtractor};

/// Keyword and phrase lists the ordered rules match against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleVocabulary {
    pub installation_keywords: Vec<String>,
    pub compatibility_keywords: Vec<String>,
    /// Most specific first; the first subject found names the symptom.
    pub symptom_subjects: Vec<String>,
    pub symptom_negations: Vec<String>,
}

impl Default for RuleVocabulary {
    fn default() -> Self {
        Self {
            installation_keywords: owned(&["install", "replace", "put in"]),
            compatibility_keywords: owned(&["compatible", "compatibility", "fit", "work with"]),
            symptom_subjects: owned(&[
                "ice maker",
                "ice dispenser",
                "water dispenser",
                "dishwasher",
                "refrigerator",
                "fridge",
                "freezer",
                "drain",
            ]),
            symptom_negations: owned(&[
                "not working",
                "isn't working",
                "stopped working",
                "quit working",
                "won't",
                "doesn't",
                "isn't",
                "is not",
                "not draining",
                "not cooling",
                "not making",
                "not dispensing",
                "not filling",
                "broken",
                "leaking",
            ]),
        }
    }
}

impl RuleVocabulary {
    pub fn with_symptom_subjects<I, S>(mut self, subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for subject in subjects {
            let subject = normalize(&subject.into());
            if !subject.is_empty() && !self.symptom_subjects.contains(&subject) {
                self.symptom_subjects.push(subject);
            }
        }
        self
    }
}

/// Inputs visible to a rule predicate.
pub struct RuleContext<'a> {
    pub normalized: &'a str,
    pub entities: &'a ExtractedEntities,
    pub vocabulary: &'a RuleVocabulary,
}

impl RuleContext<'_> {
    fn mentions_any(&self, phrases: &[String]) -> bool {
        phrases.iter().any(|phrase| contains_phrase(self.normalized, phrase))
    }
}

/// One `(predicate, intent)` pair. Rules are evaluated in list order.
#[derive(Clone, Copy, Debug)]
pub struct Rule {
    pub name: &'static str,
    pub intent: Intent,
    predicate: fn(&RuleContext<'_>) -> bool,
}

impl Rule {
    pub fn new(name: &'static str, intent: Intent, predicate: fn(&RuleContext<'_>) -> bool) -> Self {
        Self { name, intent, predicate }
    }

    pub fn matches(&self, context: &RuleContext<'_>) -> bool {
        (self.predicate)(context)
    }
}

pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule::new("installation.keyword_with_part", Intent::Installation, |context| {
            !context.entities.part_numbers.is_empty()
                && context.mentions_any(&context.vocabulary.installation_keywords)
        }),
        Rule::new("compatibility.keyword_with_model", Intent::Compatibility, |context| {
            context.entities.model_number.is_some()
                && context.mentions_any(&context.vocabulary.compatibility_keywords)
        }),
        Rule::new("troubleshooting.symptom_with_negation", Intent::Troubleshooting, |context| {
            context.mentions_any(&context.vocabulary.symptom_subjects)
                && context.mentions_any(&context.vocabulary.symptom_negations)
        }),
    ]
}

#[derive(Clone, Debug)]
pub struct IntentClassifier {
    vocabulary: RuleVocabulary,
    rules: Vec<Rule>,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new(RuleVocabulary::default())
    }
}

impl IntentClassifier {
    pub fn new(vocabulary: RuleVocabulary) -> Self {
        Self::with_rules(vocabulary, default_rules())
    }

    pub fn with_rules(vocabulary: RuleVocabulary, rules: Vec<Rule>) -> Self {
        Self { vocabulary, rules }
    }

    pub fn vocabulary(&self) -> &RuleVocabulary {
        &self.vocabulary
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// First matching rule wins; no rule means `General`.
    pub fn classify(&self, text: &str, entities: &ExtractedEntities) -> Intent {
        self.matching_rule(text, entities).map_or(Intent::General, |rule| rule.intent)
    }

    pub fn matching_rule(&self, text: &str, entities: &ExtractedEntities) -> Option<&Rule> {
        if text.trim().is_empty() {
            return None;
        }
        let normalized = normalize(text);
        let context = RuleContext { normalized: &normalized, entities, vocabulary: &self.vocabulary };
        self.rules.iter().find(|rule| rule.matches(&context))
    }

    pub fn symptom_subject(&self, text: &str) -> Option<&str> {
        let normalized = normalize(text);
        self.vocabulary
            .symptom_subjects
            .iter()
            .find(|subject| contains_phrase(&normalized, subject))
            .map(String::as_str)
    }
}

/// Result of analyzing one query.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub intent: Intent,
    pub entities: ExtractedEntities,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symptom: Option<String>,
}

impl Classification {
    pub fn general() -> Self {
        Self { intent: Intent::General, entities: ExtractedEntities::default(), symptom: None }
    }
}

/// Extraction followed by classification.
#[derive(Clone, Debug, Default)]
pub struct QueryAnalyzer<E = PatternExtractor> {
    extractor: E,
    classifier: IntentClassifier,
}

impl QueryAnalyzer<PatternExtractor> {
    /// Seeds literal part numbers and symptom subjects from the lookup's records.
    pub fn for_lookup(lookup: &dyn DomainLookup) -> Self {
        let patterns = ExtractionPatterns::default().with_literals(lookup.known_part_numbers());
        let vocabulary =
            RuleVocabulary::default().with_symptom_subjects(lookup.known_symptom_subjects());
        Self::new(PatternExtractor::new(patterns), IntentClassifier::new(vocabulary))
    }
}

impl<E> QueryAnalyzer<E>
where
    E: EntityExtractor,
{
    pub fn new(extractor: E, classifier: IntentClassifier) -> Self {
        Self { extractor, classifier }
    }

    pub fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }

    pub fn analyze(&self, text: &str) -> Classification {
        if text.trim().is_empty() {
            return Classification::general();
        }

        let entities = self.extractor.extract(text);
        let intent = self.classifier.classify(text, &entities);
        let symptom = match intent {
            Intent::Troubleshooting => self.classifier.symptom_subject(text).map(str::to_string),
            Intent::Installation | Intent::Compatibility | Intent::General => None,
        };

        Classification { intent, entities, symptom }
    }
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_string()).collect()
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase().replace(['\u{2019}', '\u{2018}'], "'")
}

/// Matches `phrase` only where it starts a word, so "fit" does not match "benefit".
fn contains_phrase(normalized: &str, phrase: &str) -> bool {
    if phrase.is_empty() {
        return false;
    }
    normalized.match_indices(phrase).any(|(index, _)| {
        normalized[..index].chars().next_back().map_or(true, |before| !before.is_alphanumeric())
    })
}
