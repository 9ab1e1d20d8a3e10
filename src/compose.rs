// src/compose.rs
//! Listing composition: phrase generation from a title, local risk
//! labeling, marketable tag generation, and the final marketplace-safe
//! description. Everything here treats the model's output as untrusted
//! text: counts, lengths, and uniqueness are enforced after the fact.

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::blocklist::Blocklist;
use crate::clients::generative::{GenerateRequest, PhraseGenerator};

/// Marketplace tag length limit; the model is told about it but routinely
/// ignores it, so it is re-enforced on the way out.
pub const TAG_CHAR_LIMIT: usize = 20;

/// How many phrases/tags the prompts ask for.
const N_OUTPUT: usize = 50;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));
static TRAILING_PUNCT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+[,.:;!?-]+\s*$").expect("trailing punct regex"));

/// Collapse whitespace and strip dangling trailing punctuation from a
/// user-supplied title before it goes into a prompt.
pub fn preprocess_title(title: &str) -> String {
    let t = title.trim();
    let t = WHITESPACE_RE.replace_all(t, " ");
    TRAILING_PUNCT_RE.replace(&t, "").into_owned()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLabel {
    Safe,
    Caution,
    HighRisk,
}

/// A generated phrase with its local risk assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledPhrase {
    pub phrase: String,
    pub risk_score: u8,
    pub label: RiskLabel,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
}

fn label_for_score(score: u8) -> RiskLabel {
    match score {
        0..=24 => RiskLabel::Safe,
        25..=59 => RiskLabel::Caution,
        _ => RiskLabel::HighRisk,
    }
}

pub struct Composer {
    generator: Arc<dyn PhraseGenerator>,
    blocklist: Arc<Blocklist>,
}

impl Composer {
    pub fn new(generator: Arc<dyn PhraseGenerator>, blocklist: Arc<Blocklist>) -> Self {
        Self {
            generator,
            blocklist,
        }
    }

    /// Generate candidate keyword phrases for a listing title. The model's
    /// newline-separated output is parsed leniently; empty lines are
    /// dropped, everything else is kept verbatim for downstream filtering.
    pub async fn generate_phrases(&self, title: &str) -> Result<Vec<String>> {
        let title = preprocess_title(title);
        let prompt = phrase_prompt(&title);
        let text = self
            .generator
            .generate(GenerateRequest::new(prompt).max_output_tokens(800))
            .await?;
        Ok(parse_lines(&text))
    }

    /// Score each phrase against the local blocklist. Returns all labeled
    /// phrases plus the safe subset.
    pub fn label_phrases(&self, phrases: &[String]) -> (Vec<LabeledPhrase>, Vec<String>) {
        let labeled: Vec<LabeledPhrase> = phrases
            .iter()
            .map(|p| {
                let (score, reasons) = match self.blocklist.hit(p) {
                    Some(reason) => (90, vec![reason]),
                    None => (10, Vec::new()),
                };
                LabeledPhrase {
                    phrase: p.clone(),
                    risk_score: score,
                    label: label_for_score(score),
                    reasons,
                }
            })
            .collect();
        let safe = labeled
            .iter()
            .filter(|l| l.label == RiskLabel::Safe)
            .map(|l| l.phrase.clone())
            .collect();
        (labeled, safe)
    }

    /// Generate marketable tags for a product. Tags longer than the
    /// marketplace limit are filtered out after generation.
    pub async fn generate_tags(
        &self,
        nice_class: u16,
        product_text: &str,
        product_description: &str,
    ) -> Result<Vec<String>> {
        let prompt = tag_prompt(nice_class, product_text, product_description);
        let text = self
            .generator
            .generate(GenerateRequest::new(prompt).temperature(0.7))
            .await?;
        Ok(parse_lines(&text)
            .into_iter()
            .filter(|t| t.chars().count() <= TAG_CHAR_LIMIT)
            .collect())
    }

    /// Compose the final listing description from the title and the safe
    /// phrase set.
    pub async fn compose_description(
        &self,
        title: &str,
        safe_phrases: &[String],
    ) -> Result<String> {
        let title = preprocess_title(title);
        let prompt = description_prompt(&title, safe_phrases);
        let text = self
            .generator
            .generate(GenerateRequest::new(prompt).temperature(0.3).max_output_tokens(400))
            .await?;
        Ok(text.trim().to_string())
    }
}

fn parse_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

fn phrase_prompt(title: &str) -> String {
    format!(
        r#"You are an assistant that generates short, trademark-friendly, SEO-optimized keyword phrases for marketplace product listings.
Your goal is to help sellers improve search visibility while ensuring compliance with marketplace rules and trademark law.

Title: "{title}"

Instructions:
1. Output exactly {N_OUTPUT} unique keyword phrases.
2. Each phrase must be between 1 and 4 words long.
3. Each phrase must appear on its own line with no numbering, bullets, or explanations.
4. Do not include brand names, trademarks, or copyrighted terms.
5. Do not use wording that implies affiliation with any company.
6. Optimize for search by using natural buyer search terms that real shoppers would type.
7. Include keywords describing style, material, color, shape, function, occasion, and theme.

Examples of Good Phrases:
- "retro soda jewelry"
- "cartoon trip shirt"
- "mini basketball planter"

Examples of Bad Phrases:
- "Coca-Cola earrings"
- "Disneyland tee"
- "Nike swoosh planter"
"#
    )
}

fn tag_prompt(nice_class: u16, product_text: &str, product_description: &str) -> String {
    format!(
        r#"You are an expert e-commerce assistant specializing in SEO and product tagging.
Your task is to generate exactly {N_OUTPUT} marketable and descriptive tags for a product.

Product Details:
- Nice Classification: Class {nice_class}
- Product Description: {product_description}
- Text on Product: "{product_text}"

Instructions:
1. Tag Quantity: Generate exactly {N_OUTPUT} unique tags.
2. Character Limit: Each tag must be {TAG_CHAR_LIMIT} characters or less. This is a strict limit.
3. Relevance: Tags must be highly relevant to the product description, the text on the product, and its Nice Class.
4. Content Focus: Incorporate keywords related to the product's style, theme, materials, target audience, and potential use cases.
5. Format: Return the tags as a plain list, with each tag on a new line. Do not include numbers, bullet points, or any other formatting.
"#
    )
}

fn description_prompt(title: &str, safe_phrases: &[String]) -> String {
    let phrase_list = safe_phrases.join("\n- ");
    format!(
        r#"You are an assistant that writes marketplace-safe product descriptions.

Title: "{title}"

Approved phrases:
- {phrase_list}

Instructions:
1. Write one cohesive product description of 3 to 5 sentences.
2. Weave in as many of the approved phrases as read naturally.
3. Do not mention any brand names, trademarks, or copyrighted terms.
4. Do not add phrases that are not in the approved list beyond plain connective language.
5. Return only the description text, no headings or formatting.
"#
    )
}
