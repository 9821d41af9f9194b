//! Assistant persona
//!
//! Nevira speaks as a classy butler. The persona only shapes wording: the
//! name used in greetings, the honorific appended to confirmations, and the
//! farewell spoken when the session closes.

use serde::{Deserialize, Serialize};

/// Identity and phrasing of the assistant
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Persona {
    /// Display name
    pub name: String,

    /// How the assistant addresses the user
    pub honorific: String,

    /// Opening line of a session; `{name}` is substituted
    pub greeting: String,

    /// Closing line of a session; `{name}` and `{honorific}` are substituted
    pub farewell: String,

    /// One-line character sketch for the agent instructions
    pub personality: String,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            name: "Nevira".to_string(),
            honorific: "Boss".to_string(),
            greeting: "Hello! I'm {name}, your personal assistant. How may I help you today?"
                .to_string(),
            farewell: "Goodbye, {honorific}. {name} signing off.".to_string(),
            personality: "a personal AI assistant with a classy butler personality".to_string(),
        }
    }
}

impl Persona {
    /// Confirmation sentence ending with the honorific, e.g. "Volume muted, Boss."
    #[must_use]
    pub fn reply(&self, text: &str) -> String {
        format!("{text}, {}.", self.honorific)
    }

    /// Session greeting with placeholders filled in
    #[must_use]
    pub fn greeting(&self) -> String {
        self.fill(&self.greeting)
    }

    /// Farewell with placeholders filled in
    #[must_use]
    pub fn farewell(&self) -> String {
        self.fill(&self.farewell)
    }

    fn fill(&self, template: &str) -> String {
        template
            .replace("{name}", &self.name)
            .replace("{honorific}", &self.honorific)
    }
}
