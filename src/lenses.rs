//! Built-in lens definitions and the immutable lens table
//!
//! Each lens pairs a fixed instruction string with the ordered set of keys the
//! model is asked to return. The table is built once at startup and shared
//! read-only between requests.

use serde::Serialize;

use crate::config::{Config, LensOverride};

pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

const QUADRANTS_INSTRUCTIONS: &str = r#"Take the following input, and approach it from each of the 4 quadrants of Ken Wilber's integral theory (UL, UR, LL, LR). Give no preamble like "in this quadrant..." or "from this perspective...". Instead, just approach it as if that quadrant is the only important lens, and explain it from that perspective. Use language inherent to that quadrant (e.g. use "I" in the UL, "we" in the LL, objective language in UR, systems language in LR, etc.).

From each perspective, you will write a short paragraph of around 200 words, followed by 3 bullet points of around 10 words each to give examples of how the input might show up in that quadrant.

Your response will be parsed by a code, so it's vital that your ONLY output should ALWAYS be a JSON in this exact format:
{
  "UL": {"paragraph": "", "bullets": ["", "", ""]},
  "UR": {"paragraph": "", "bullets": ["", "", ""]},
  "LL": {"paragraph": "", "bullets": ["", "", ""]},
  "LR": {"paragraph": "", "bullets": ["", "", ""]}
}"#;

const LEVELS_INSTRUCTIONS: &str = r#"Take the following input, and approach it from each of the 6 levels of Ken Wilber's integral theory (Magenta, Red, Amber, Orange, Green, Teal). Give no preamble like "in this level..." or "from this perspective...". Instead, just approach it as if that level is the only important lens, and explain it from that perspective. Use language inherent to that level of development.

Write as if you were a person whose center of gravity is in that level, NOT as a detached observer who is aware of the level's core characteristics and able to easily name them. Embody that persona to approach the input with their worldview and values. Remember that the characteristics of these levels are different depending on whether we're talking about individuals or businesses or whole societies; someone whose center of gravity in Red today (like a gang member) will not necessarily act like or speak like someone from a whole red society from 6000 years ago (jungle warlords), so take the input into consideration and be nuanced. From each level, write a short paragraph of around 100 words. Then... write 5 bullet points that are EXAMPLES of the "input" at that stage of development (10 words max per example). For instance, if the input is "board games", a good bullet for orange would be "chess" and for red would be "hungry hungry hippos" and for green would be "pandemic". The bullets are meant to show concrete and identifiable instances of how the input shows up for each level, or what kinds of the input each level most gravitates toward.

Return a JSON in this exact format:
{
  "Magenta": {"paragraph": "", "bullets": ["", "", "", "", ""]},
  "Red": {"paragraph": "", "bullets": ["", "", "", "", ""]},
  "Amber": {"paragraph": "", "bullets": ["", "", "", "", ""]},
  "Orange": {"paragraph": "", "bullets": ["", "", "", "", ""]},
  "Green": {"paragraph": "", "bullets": ["", "", "", "", ""]},
  "Teal": {"paragraph": "", "bullets": ["", "", "", "", ""]}
}"#;

const STATES_INSTRUCTIONS: &str = r#"Take the following input, and approach it from each of the 4 states of consciousness of Ken Wilber's integral theory (Gross, Subtle, Causal, Nondual). Give no preamble like "in this state..." or "from this perspective...". Instead, just approach it as if that state is the only important lens, and explain it from that perspective, as if from someone who is currently experiencing that state of consciousness. Use language inherent to that state.

From each state, write a short paragraph of around 100 words, followed by 3 bullet points that are concise "doorways" to experiencing the input through this state of awareness (10 words max per example).

Return a JSON in this exact format:
{
  "Gross": {"paragraph": "", "bullets": ["", "", ""]},
  "Subtle": {"paragraph": "", "bullets": ["", "", ""]},
  "Causal": {"paragraph": "", "bullets": ["", "", ""]},
  "Nondual": {"paragraph": "", "bullets": ["", "", ""]}
}"#;

/// Static definition of one lens. Never mutated after the table is built.
#[derive(Debug, Clone, Serialize)]
pub struct LensSpec {
    pub name: String,
    #[serde(skip)]
    pub instructions: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
    pub expected_keys: Vec<String>,
}

impl LensSpec {
    fn builtin(name: &str, instructions: &str, keys: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            instructions: instructions.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: None,
            max_output_tokens: None,
            expected_keys: keys.iter().map(|k| k.to_string()).collect(),
        }
    }

    fn apply(&mut self, over: &LensOverride) {
        if let Some(model) = &over.model {
            self.model = model.clone();
        }
        if over.temperature.is_some() {
            self.temperature = over.temperature;
        }
        if over.max_output_tokens.is_some() {
            self.max_output_tokens = over.max_output_tokens;
        }
        if let Some(instructions) = &over.instructions {
            self.instructions = instructions.clone();
        }
    }
}

/// Lookup of lens name -> spec, in a fixed order.
#[derive(Debug, Clone)]
pub struct LensTable {
    lenses: Vec<LensSpec>,
}

impl Default for LensTable {
    fn default() -> Self {
        Self {
            lenses: vec![
                LensSpec::builtin("quadrants", QUADRANTS_INSTRUCTIONS, &["UL", "UR", "LL", "LR"]),
                LensSpec::builtin(
                    "levels",
                    LEVELS_INSTRUCTIONS,
                    &["Magenta", "Red", "Amber", "Orange", "Green", "Teal"],
                ),
                LensSpec::builtin(
                    "states",
                    STATES_INSTRUCTIONS,
                    &["Gross", "Subtle", "Causal", "Nondual"],
                ),
            ],
        }
    }
}

impl LensTable {
    /// Built-in lenses with the config's model default and per-lens overrides applied
    pub fn from_config(config: &Config) -> Self {
        let mut table = Self::default();
        for lens in &mut table.lenses {
            if let Some(model) = &config.upstream.default_model {
                lens.model = model.clone();
            }
            if let Some(over) = config.lenses.get(&lens.name) {
                lens.apply(over);
            }
        }
        table
    }

    pub fn get(&self, name: &str) -> Option<&LensSpec> {
        self.lenses.iter().find(|l| l.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.lenses.iter().map(|l| l.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LensSpec> {
        self.lenses.iter()
    }
}
