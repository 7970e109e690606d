use partline_core::ExtractedEntities;

/// Finds domain identifiers in free text. Implementations are pure.
pub trait EntityExtractor: Send + Sync {
    fn extract(&self, text: &str) -> ExtractedEntities;
}

/// Structural patterns recognized as part and model numbers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractionPatterns {
    /// Letter prefixes that start a part number, matched case-insensitively.
    pub part_prefixes: Vec<String>,
    /// Minimum digit run after a prefix.
    pub min_part_digits: usize,
    /// Exact identifiers that count as part numbers regardless of shape.
    pub literal_part_numbers: Vec<String>,
    pub min_model_len: usize,
}

impl Default for ExtractionPatterns {
    fn default() -> Self {
        Self {
            part_prefixes: vec!["PS".to_string(), "WP".to_string(), "W10".to_string()],
            min_part_digits: 5,
            literal_part_numbers: Vec::new(),
            min_model_len: 6,
        }
    }
}

impl ExtractionPatterns {
    pub fn with_literals<I, S>(mut self, literals: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for literal in literals {
            let literal = literal.into();
            if !self.literal_part_numbers.iter().any(|known| known.eq_ignore_ascii_case(&literal)) {
                self.literal_part_numbers.push(literal);
            }
        }
        self
    }

    pub fn is_part_number(&self, token: &str) -> bool {
        if self.literal_part_numbers.iter().any(|literal| literal.eq_ignore_ascii_case(token)) {
            return true;
        }

        self.part_prefixes.iter().any(|prefix| {
            let Some(head) = token.get(..prefix.len()) else {
                return false;
            };
            let digits = &token[prefix.len()..];
            head.eq_ignore_ascii_case(prefix)
                && digits.len() >= self.min_part_digits
                && digits.chars().all(|ch| ch.is_ascii_digit())
        })
    }

    pub fn is_model_number(&self, token: &str) -> bool {
        token.len() >= self.min_model_len
            && token.chars().all(|ch| ch.is_ascii_alphanumeric())
            && token.chars().any(|ch| ch.is_ascii_alphabetic())
            && token.chars().any(|ch| ch.is_ascii_digit())
            && !self.is_part_number(token)
    }
}

#[derive(Clone, Debug, Default)]
pub struct PatternExtractor {
    patterns: ExtractionPatterns,
}

impl PatternExtractor {
    pub fn new(patterns: ExtractionPatterns) -> Self {
        Self { patterns }
    }

    pub fn patterns(&self) -> &ExtractionPatterns {
        &self.patterns
    }
}

impl EntityExtractor for PatternExtractor {
    fn extract(&self, text: &str) -> ExtractedEntities {
        let mut entities = ExtractedEntities::default();

        for token in tokens(text) {
            if self.patterns.is_part_number(token) {
                if !entities.part_numbers.iter().any(|seen| seen.eq_ignore_ascii_case(token)) {
                    entities.part_numbers.push(token.to_string());
                }
            } else if entities.model_number.is_none() && self.patterns.is_model_number(token) {
                entities.model_number = Some(token.to_string());
            }
        }

        entities
    }
}

fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|ch: char| !ch.is_ascii_alphanumeric()).filter(|token| !token.is_empty())
}
