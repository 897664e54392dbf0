//! Claude-backed gatekeeper, location knowledge base and narrator.

use anyhow::Result;
use async_trait::async_trait;

use ai_client::{truncate_to_char_boundary, Claude, ImageInput};
use floodwatch_common::LocationFields;

use crate::gatekeeper::GATEKEEPER_SYSTEM_PROMPT;
use crate::images::ReportImage;
use crate::traits::{GatekeeperModel, LocationKnowledgeBase, NarrativeGenerator};

/// Narrative input cap. Evidence payloads can carry dozens of posts.
const MAX_NARRATIVE_INPUT_BYTES: usize = 24_000;

const NARRATIVE_SYSTEM_PROMPT: &str = "\
You are a reporting assistant for a flood monitoring dashboard. \
Given a structured flood report (detection verdict, resolved location, evidence, \
credibility score, severity and recommendations), write one concise paragraph \
summarising the situation for the public. Name the affected locations and the severity, \
avoid technical jargon, keep the tone informative and neutral. \
Reply with the paragraph only.";

pub struct ClaudeGatekeeper {
    claude: Claude,
}

impl ClaudeGatekeeper {
    pub fn new(claude: Claude) -> Self {
        Self { claude }
    }
}

#[async_trait]
impl GatekeeperModel for ClaudeGatekeeper {
    async fn classify(&self, text: &str, images: &[ReportImage]) -> Result<String> {
        if images.is_empty() {
            return Ok(self.claude.chat_completion(GATEKEEPER_SYSTEM_PROMPT, text).await?);
        }

        let inputs = images
            .iter()
            .map(|image| match image {
                ReportImage::Inline { media_type, bytes } => ImageInput::Inline {
                    media_type: media_type.clone(),
                    bytes: bytes.clone(),
                },
                ReportImage::Url(url) => ImageInput::Url(url.clone()),
            })
            .collect();

        Ok(self
            .claude
            .complete_with_images(GATEKEEPER_SYSTEM_PROMPT, text, inputs)
            .await?)
    }
}

/// Model-backed gazetteer lookup, grounded on the reference corpus names.
pub struct ClaudeKnowledgeBase {
    claude: Claude,
    system_prompt: String,
}

impl ClaudeKnowledgeBase {
    pub fn new(claude: Claude, reference_names: &[&str]) -> Self {
        let system_prompt = format!(
            "You classify Malaysian place names into administrative levels: town, \
recreation_centre, district, division (Sarawak only) and state. For the place the user \
gives, fill every level you can determine and use \"None\" for levels that do not apply \
or are unknown. Prefer these official names when they fit:\n{}",
            reference_names.join(", ")
        );
        Self {
            claude,
            system_prompt,
        }
    }
}

#[async_trait]
impl LocationKnowledgeBase for ClaudeKnowledgeBase {
    async fn lookup(&self, text: &str) -> Result<Option<LocationFields>> {
        let fields: LocationFields = self
            .claude
            .extract(&self.system_prompt, format!("Place: {text}"))
            .await?;
        Ok((!fields.is_empty()).then_some(fields))
    }
}

pub struct ClaudeNarrator {
    claude: Claude,
}

impl ClaudeNarrator {
    pub fn new(claude: Claude) -> Self {
        Self { claude }
    }
}

#[async_trait]
impl NarrativeGenerator for ClaudeNarrator {
    async fn summarize(&self, payload: &serde_json::Value) -> Result<String> {
        let body = serde_json::to_string_pretty(payload)?;
        let body = truncate_to_char_boundary(&body, MAX_NARRATIVE_INPUT_BYTES);
        Ok(self
            .claude
            .chat_completion(NARRATIVE_SYSTEM_PROMPT, format!("Flood report:\n{body}"))
            .await?)
    }
}
