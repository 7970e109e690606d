use chrono::{DateTime, Utc};
use partline_core::ResponsePayload;
use partline_render::{payload_panels, DisplayBlock, MarkupRenderer, Panel};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Bot,
}

/// One immutable exchange unit. Bot entries carry rendered blocks and panels.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationEntry {
    role: Role,
    text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    payload: Option<ResponsePayload>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    blocks: Vec<DisplayBlock>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    panels: Vec<Panel>,
    created_at: DateTime<Utc>,
}

impl ConversationEntry {
    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn payload(&self) -> Option<&ResponsePayload> {
        self.payload.as_ref()
    }

    pub fn blocks(&self) -> &[DisplayBlock] {
        &self.blocks
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Append-only ordered record of one session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Transcript {
    entries: Vec<ConversationEntry>,
}

impl Transcript {
    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&ConversationEntry> {
        self.entries.last()
    }

    pub(crate) fn append_user(&mut self, text: &str, now: DateTime<Utc>) -> &ConversationEntry {
        let created_at = self.next_timestamp(now);
        self.push(ConversationEntry {
            role: Role::User,
            text: text.to_string(),
            payload: None,
            blocks: Vec::new(),
            panels: Vec::new(),
            created_at,
        })
    }

    pub(crate) fn append_bot(
        &mut self,
        text: &str,
        payload: Option<ResponsePayload>,
        renderer: &MarkupRenderer,
        now: DateTime<Utc>,
    ) -> &ConversationEntry {
        let created_at = self.next_timestamp(now);
        let blocks = renderer.render(text);
        let panels = payload.as_ref().map(payload_panels).unwrap_or_default();
        self.push(ConversationEntry {
            role: Role::Bot,
            text: text.to_string(),
            payload,
            blocks,
            panels,
            created_at,
        })
    }

    /// Timestamps never go backwards, even if the wall clock does.
    fn next_timestamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self.entries.last() {
            Some(last) if last.created_at > now => last.created_at,
            _ => now,
        }
    }

    fn push(&mut self, entry: ConversationEntry) -> &ConversationEntry {
        self.entries.push(entry);
        &self.entries[self.entries.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use partline_core::ResponsePayload;
    use partline_render::{DisplayBlock, MarkupRenderer};

    use super::{Role, Transcript};

    #[test]
    fn timestamps_are_clamped_when_clock_steps_back() {
        let mut transcript = Transcript::default();
        let now = Utc::now();
        transcript.append_user("first", now);
        transcript.append_user("second", now - Duration::seconds(30));

        let stamps =
            transcript.entries().iter().map(|entry| entry.created_at()).collect::<Vec<_>>();
        assert_eq!(stamps, vec![now, now]);
    }

    #[test]
    fn bot_entries_are_rendered_and_user_entries_are_raw() {
        let mut transcript = Transcript::default();
        let renderer = MarkupRenderer::default();
        transcript.append_user("**not a heading for users**", Utc::now());
        let bot = transcript.append_bot(
            "**Title**\n• item",
            Some(ResponsePayload::general("**Title**\n• item")),
            &renderer,
            Utc::now(),
        );
        assert_eq!(bot.role(), Role::Bot);
        assert_eq!(bot.blocks(), &[DisplayBlock::heading("Title"), DisplayBlock::bullet("• item")]);
        assert!(bot.panels().is_empty());

        let user = &transcript.entries()[0];
        assert_eq!(user.role(), Role::User);
        assert!(user.blocks().is_empty());
        assert_eq!(user.payload(), None);
    }

    #[test]
    fn entry_serializes_with_camel_case_timestamp() {
        let mut transcript = Transcript::default();
        transcript.append_user("hello", Utc::now());
        let json = serde_json::to_value(&transcript.entries()[0]).expect("serialize");
        assert_eq!(json["role"], "user");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("payload").is_none());
    }
}
