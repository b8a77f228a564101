//! Reader for the payload contract consumed by front-ends
//!
//! A lens payload maps each expected key to `{ paragraph, bullets }`. The
//! pipeline never checks this, so the reader tolerates absent or malformed
//! keys per panel instead of failing the whole lens.

use std::fmt::Write as _;

use anyhow::Context;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::normalizer::LensResult;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PanelContent {
    pub paragraph: String,
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Panel {
    Ready { key: String, content: PanelContent },
    Unavailable { key: String },
}

impl Panel {
    pub fn key(&self) -> &str {
        match self {
            Panel::Ready { key, .. } | Panel::Unavailable { key } => key,
        }
    }
}

/// One panel per expected key, in key order. Fails only when the payload is
/// not a JSON object at all.
pub fn read_panels(result: &LensResult, keys: &[String]) -> anyhow::Result<Vec<Panel>> {
    let value: Value = serde_json::from_str(result.as_str()).context("Invalid JSON from API")?;
    let map: &Map<String, Value> = value
        .as_object()
        .context("Lens payload is not a JSON object")?;

    Ok(keys
        .iter()
        .map(|key| {
            match map
                .get(key)
                .and_then(|v| PanelContent::deserialize(v).ok())
            {
                Some(content) => Panel::Ready {
                    key: key.clone(),
                    content,
                },
                None => Panel::Unavailable { key: key.clone() },
            }
        })
        .collect())
}

/// Plain-text rendering used by the CLI
pub fn render_text(panels: &[Panel]) -> String {
    let mut out = String::new();
    for panel in panels {
        let _ = writeln!(out, "== {} ==", panel.key());
        match panel {
            Panel::Ready { content, .. } => {
                let _ = writeln!(out, "{}", content.paragraph.trim());
                for bullet in &content.bullets {
                    let _ = writeln!(out, "  - {}", bullet);
                }
            }
            Panel::Unavailable { .. } => {
                let _ = writeln!(out, "(no content returned for this panel)");
            }
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lenses::LensTable;
    use crate::normalizer::{UpstreamReply, normalize};
    use serde_json::json;

    fn result(payload: &str) -> LensResult {
        normalize(UpstreamReply::classify(200, json!({ "output_text": payload }))).unwrap()
    }

    fn keys(lens: &str) -> Vec<String> {
        LensTable::default().get(lens).unwrap().expected_keys.clone()
    }

    #[test]
    fn panels_follow_lens_key_order() {
        let payload = json!({
            "LR": { "paragraph": "systems", "bullets": ["a"] },
            "UL": { "paragraph": "I feel", "bullets": ["b", "c"] },
            "UR": { "paragraph": "behaviour", "bullets": [] },
            "LL": { "paragraph": "we share", "bullets": ["d"] }
        })
        .to_string();
        let panels = read_panels(&result(&payload), &keys("quadrants")).unwrap();
        let order: Vec<&str> = panels.iter().map(Panel::key).collect();
        assert_eq!(order, vec!["UL", "UR", "LL", "LR"]);
        assert!(matches!(&panels[0], Panel::Ready { content, .. } if content.bullets.len() == 2));
    }

    #[test]
    fn absent_or_malformed_keys_become_unavailable() {
        let payload = json!({
            "Gross": { "paragraph": "body", "bullets": ["breath"] },
            "Subtle": { "paragraph": "dream" },
            "Causal": "formless"
        })
        .to_string();
        let panels = read_panels(&result(&payload), &keys("states")).unwrap();
        assert!(matches!(panels[0], Panel::Ready { .. }));
        assert_eq!(panels[1], Panel::Unavailable { key: "Subtle".into() });
        assert_eq!(panels[2], Panel::Unavailable { key: "Causal".into() });
        assert_eq!(panels[3], Panel::Unavailable { key: "Nondual".into() });
    }

    #[test]
    fn non_object_payload_is_an_error() {
        assert!(read_panels(&result("plain prose"), &keys("levels")).is_err());
        assert!(read_panels(&result("[1,2]"), &keys("levels")).is_err());
    }

    #[test]
    fn render_lists_bullets_under_each_key() {
        let panels = vec![
            Panel::Ready {
                key: "Teal".into(),
                content: PanelContent {
                    paragraph: "integrative".into(),
                    bullets: vec!["go".into()],
                },
            },
            Panel::Unavailable { key: "Red".into() },
        ];
        let text = render_text(&panels);
        assert!(text.contains("== Teal ==\nintegrative\n  - go\n"));
        assert!(text.contains("== Red ==\n(no content"));
    }
}
