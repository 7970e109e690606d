use serde::{Deserialize, Serialize};

const CANONICAL_BULLET: &str = "•";
const BULLET_MARKERS: [char; 4] = ['•', '-', '*', '+'];

/// One line of narrative text with its presentation kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DisplayBlock {
    Heading { text: String },
    Bullet { text: String },
    Numbered { text: String },
    Link { label: String },
    Paragraph { text: String },
    Blank,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Heading,
    Bullet,
    Numbered,
    Link,
    Paragraph,
    Blank,
}

impl DisplayBlock {
    pub fn heading(text: impl Into<String>) -> Self {
        Self::Heading { text: text.into() }
    }

    pub fn bullet(text: impl Into<String>) -> Self {
        Self::Bullet { text: text.into() }
    }

    pub fn numbered(text: impl Into<String>) -> Self {
        Self::Numbered { text: text.into() }
    }

    pub fn link(label: impl Into<String>) -> Self {
        Self::Link { label: label.into() }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::Paragraph { text: text.into() }
    }

    pub fn kind(&self) -> BlockKind {
        match self {
            Self::Heading { .. } => BlockKind::Heading,
            Self::Bullet { .. } => BlockKind::Bullet,
            Self::Numbered { .. } => BlockKind::Numbered,
            Self::Link { .. } => BlockKind::Link,
            Self::Paragraph { .. } => BlockKind::Paragraph,
            Self::Blank => BlockKind::Blank,
        }
    }

    /// Display text of the block; the label for links, empty for blanks.
    pub fn text(&self) -> &str {
        match self {
            Self::Heading { text }
            | Self::Bullet { text }
            | Self::Numbered { text }
            | Self::Paragraph { text } => text,
            Self::Link { label } => label,
            Self::Blank => "",
        }
    }

    /// Serializes the block back to a single source line that renders to the same kind.
    pub fn to_line(&self) -> String {
        match self {
            Self::Heading { text } => format!("**{text}**"),
            Self::Bullet { text } if starts_with_bullet_marker(text) => text.clone(),
            Self::Bullet { text } => format!("{CANONICAL_BULLET} {text}"),
            Self::Numbered { text } | Self::Paragraph { text } => text.clone(),
            Self::Link { label } => format!("[{label}]()"),
            Self::Blank => String::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    /// Keep the leading bullet marker in `Bullet` text.
    pub keep_bullet_marker: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { keep_bullet_marker: true }
    }
}

/// Line-oriented renderer for the narrative markup subset. Single pass, no state.
#[derive(Clone, Copy, Debug, Default)]
pub struct MarkupRenderer {
    options: RenderOptions,
}

impl MarkupRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> RenderOptions {
        self.options
    }

    pub fn render(&self, text: &str) -> Vec<DisplayBlock> {
        text.lines().map(|line| self.render_line(line)).collect()
    }

    pub fn render_line(&self, raw_line: &str) -> DisplayBlock {
        let line = raw_line.trim();
        if line.is_empty() {
            return DisplayBlock::Blank;
        }

        if let Some(text) = bold_heading(line).or_else(|| atx_heading(line)) {
            return DisplayBlock::heading(text);
        }

        if let Some(rest) = bullet_body(line) {
            let text = if self.options.keep_bullet_marker { line } else { rest };
            return DisplayBlock::bullet(text);
        }

        if is_numbered(line) {
            return DisplayBlock::numbered(line);
        }

        if let Some(label) = link_label(line) {
            return DisplayBlock::link(label);
        }

        DisplayBlock::paragraph(line)
    }
}

/// Renders with default options.
pub fn render(text: &str) -> Vec<DisplayBlock> {
    MarkupRenderer::default().render(text)
}

fn bold_heading(line: &str) -> Option<&str> {
    let inner = line.strip_prefix("**")?.strip_suffix("**")?;
    let inner_trimmed = inner.trim();
    if inner_trimmed.is_empty() || inner.contains("**") {
        return None;
    }
    Some(inner_trimmed)
}

fn atx_heading(line: &str) -> Option<&str> {
    let hashes = line.chars().take_while(|ch| *ch == '#').count();
    if !(1..=6).contains(&hashes) {
        return None;
    }
    let rest = &line[hashes..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let text = rest.trim();
    (!text.is_empty()).then_some(text)
}

fn starts_with_bullet_marker(text: &str) -> bool {
    bullet_body(text.trim()).is_some()
}

fn bullet_body(line: &str) -> Option<&str> {
    let mut chars = line.chars();
    let marker = chars.next()?;
    if !BULLET_MARKERS.contains(&marker) {
        return None;
    }
    let rest = chars.as_str();
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let body = rest.trim_start();
    (!body.is_empty()).then_some(body)
}

fn is_numbered(line: &str) -> bool {
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return false;
    }
    let Some(rest) = line[digits..].strip_prefix('.') else {
        return false;
    };
    rest.is_empty() || rest.starts_with(char::is_whitespace)
}

fn link_label(line: &str) -> Option<&str> {
    let mut search_from = 0;
    while let Some(open_offset) = line[search_from..].find('[') {
        let open = search_from + open_offset;
        let Some(close_offset) = line[open + 1..].find(']') else {
            return None;
        };
        let close = open + 1 + close_offset;
        let after = &line[close + 1..];
        if after.starts_with('(') && after[1..].contains(')') {
            let label = line[open + 1..close].trim();
            if !label.is_empty() {
                return Some(label);
            }
        }
        search_from = open + 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::{render, BlockKind, DisplayBlock, MarkupRenderer, RenderOptions};

    #[test]
    fn renders_heading_bullet_and_numbered_lines_in_order() {
        let blocks = render("**Title**\n• item\n1. step\n");
        assert_eq!(
            blocks,
            vec![
                DisplayBlock::heading("Title"),
                DisplayBlock::bullet("• item"),
                DisplayBlock::numbered("1. step"),
            ]
        );
    }

    #[test]
    fn link_keeps_only_the_label() {
        let blocks = render("See [the install video](https://example.com/video) first");
        assert_eq!(blocks, vec![DisplayBlock::link("the install video")]);
    }

    #[test]
    fn bracket_without_target_is_a_paragraph() {
        let blocks = render("Press [Start] then wait (about a minute)");
        assert_eq!(blocks[0].kind(), BlockKind::Paragraph);
    }

    #[test]
    fn each_blank_line_is_its_own_blank_block() {
        let blocks = render("First\n\n\nSecond");
        assert_eq!(
            blocks,
            vec![
                DisplayBlock::paragraph("First"),
                DisplayBlock::Blank,
                DisplayBlock::Blank,
                DisplayBlock::paragraph("Second"),
            ]
        );
    }

    #[test]
    fn whitespace_only_line_is_blank() {
        assert_eq!(render("  \t"), vec![DisplayBlock::Blank]);
        assert!(render("").is_empty());
    }

    #[test]
    fn atx_headings_are_recognized() {
        let blocks = render("### Problem Analysis\n#### Repair Steps\n#hashtag");
        assert_eq!(blocks[0], DisplayBlock::heading("Problem Analysis"));
        assert_eq!(blocks[1], DisplayBlock::heading("Repair Steps"));
        assert_eq!(blocks[2], DisplayBlock::paragraph("#hashtag"));
    }

    #[test]
    fn bold_with_trailing_content_is_not_a_heading() {
        let blocks = render("**Note** check the valve\n**a** and **b**");
        assert_eq!(blocks[0].kind(), BlockKind::Paragraph);
        assert_eq!(blocks[1].kind(), BlockKind::Paragraph);
    }

    #[test]
    fn dash_and_star_bullets_need_a_space() {
        let blocks = render("- drain hose\n* filter\n-5 degrees\n*emphasis*");
        let kinds = blocks.iter().map(DisplayBlock::kind).collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![BlockKind::Bullet, BlockKind::Bullet, BlockKind::Paragraph, BlockKind::Paragraph]
        );
    }

    #[test]
    fn numbered_requires_period_then_space_or_end() {
        let blocks = render("12. Reconnect power\n3.5 stars average\n7.");
        assert_eq!(blocks[0], DisplayBlock::numbered("12. Reconnect power"));
        assert_eq!(blocks[1].kind(), BlockKind::Paragraph);
        assert_eq!(blocks[2].kind(), BlockKind::Numbered);
    }

    #[test]
    fn bullet_containing_link_stays_a_bullet() {
        let blocks = render("• Watch [this guide](https://example.com)");
        assert_eq!(blocks[0].kind(), BlockKind::Bullet);
    }

    #[test]
    fn stripped_bullet_marker_round_trips_through_to_line() {
        let renderer = MarkupRenderer::new(RenderOptions { keep_bullet_marker: false });
        let blocks = renderer.render("• item\n- other");
        assert_eq!(blocks, vec![DisplayBlock::bullet("item"), DisplayBlock::bullet("other")]);

        let line = blocks[0].to_line();
        assert_eq!(line, "• item");
        assert_eq!(renderer.render_line(&line), blocks[0]);
    }

    #[test]
    fn carriage_returns_are_ignored() {
        let blocks = render("**Title**\r\n1. step\r\n");
        assert_eq!(blocks, vec![DisplayBlock::heading("Title"), DisplayBlock::numbered("1. step")]);
    }

    #[test]
    fn blocks_serialize_with_kind_tag() {
        let value = serde_json::to_value(DisplayBlock::link("Manual")).expect("serialize");
        assert_eq!(value["kind"], "link");
        assert_eq!(value["label"], "Manual");
        let blank = serde_json::to_value(DisplayBlock::Blank).expect("serialize");
        assert_eq!(blank["kind"], "blank");
    }
}
