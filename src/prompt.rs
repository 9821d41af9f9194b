//! Agent instructions handed to the Dialogue Driver
//!
//! Built from the persona and the frozen registry, so the listing always
//! matches what can actually be invoked.

use std::fmt::Write as _;

use serde::Serialize;

use crate::actions::{ActionDescriptor, ActionRegistry};
use crate::persona::Persona;

/// Words that must end the session when the user says them
pub const GOODBYE_WORDS: &[&str] = &[
    "goodbye",
    "bye",
    "exit",
    "close",
    "disconnect",
    "shut down",
    "stop",
    "quit",
    "end",
];

/// Instructions plus the opening line for a new session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentPrompt {
    pub instructions: String,
    pub session: String,
}

impl AgentPrompt {
    #[must_use]
    pub fn build(persona: &Persona, registry: &ActionRegistry) -> Self {
        Self {
            instructions: agent_instructions(persona, registry),
            session: session_instructions(persona),
        }
    }
}

/// `name(a, b?)` with optional parameters marked
fn signature(action: &ActionDescriptor) -> String {
    let params = action
        .params
        .iter()
        .map(|p| {
            if p.required {
                p.name.clone()
            } else {
                format!("{}?", p.name)
            }
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("{}({params})", action.name)
}

/// System instructions listing every action under its group
#[must_use]
pub fn agent_instructions(persona: &Persona, registry: &ActionRegistry) -> String {
    let mut out = format!("You are {}, {}.\n\n", persona.name, persona.personality);
    out.push_str(
        "CRITICAL: You have access to tools. When the user asks you to DO something, you MUST \
         call the appropriate tool. Do not just say you will do it; actually execute it.\n\n",
    );
    out.push_str("Your available tools:\n");

    // Groups in first-registration order
    let mut groups: Vec<&str> = Vec::new();
    for action in registry.list() {
        if !groups.contains(&action.group.as_str()) {
            groups.push(&action.group);
        }
    }
    for group in groups {
        let _ = write!(out, "\n{group}:\n");
        for action in registry.list().iter().filter(|a| a.group == group) {
            let _ = writeln!(out, "- {} - {}", signature(action), action.description);
        }
    }

    let goodbyes = GOODBYE_WORDS
        .iter()
        .map(|w| format!("\"{w}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let _ = write!(
        out,
        "\nIMPORTANT BEHAVIORS:\n\
         1. When the user makes a request, call the appropriate tool IMMEDIATELY\n\
         2. Wait for the result\n\
         3. Then respond naturally with what you did\n\
         4. CRITICAL: If the user says any of these words, call close_assistant() IMMEDIATELY: {goodbyes}\n\
         5. Be conversational, slightly witty, and address the user as \"{}\"\n\
         6. Keep responses brief and natural\n\
         7. For music requests, ask if they prefer YouTube or Spotify if not specified\n",
        persona.honorific
    );
    out
}

/// Opening instruction for a new session
#[must_use]
pub fn session_instructions(persona: &Persona) -> String {
    format!(
        "Greet the user warmly and let them know you're ready to assist.\n\
         Remember: when they ask you to do something, USE YOUR TOOLS immediately. Don't just promise to do it.\n\
         Say: \"{}\"\n",
        persona.greeting()
    )
}
