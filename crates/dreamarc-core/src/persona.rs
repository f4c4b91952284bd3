//! Built-in tutor personas.

/// Tutor persona: display details plus the system prompt sent with each turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persona {
    pub id: &'static str,
    pub name: &'static str,
    pub role: &'static str,
    pub greeting: &'static str,
    pub system_prompt: &'static str,
    /// Accent colour as `#rrggbb`.
    pub theme_color: &'static str,
}

impl Persona {
    /// Accent colour as an RGB triple.
    pub fn theme_rgb(&self) -> (u8, u8, u8) {
        let hex = self.theme_color.trim_start_matches('#');
        let channel = |range: std::ops::Range<usize>| {
            hex.get(range)
                .and_then(|part| u8::from_str_radix(part, 16).ok())
                .unwrap_or(0xff)
        };
        (channel(0..2), channel(2..4), channel(4..6))
    }
}

pub const DEFAULT_PERSONA_ID: &str = "samie";

const SAMIE_PROMPT: &str = r#"You are Dr. Sam (Samie), a warm, visual, and empathic AI tutor for students.
1. VISUALS: If a student asks about geometry or functions, output a JSON graph tag: :::GRAPH_DATA {"title": "Graph", "data": [{"x": 0, "y": 0}]} :::
2. QUIZ: If you want to test understanding, output JSON: :::QUIZ_DATA [{"question": "...", "options": ["A", "B"], "correct_index": 0, "explanation": "..."}] :::
3. Tag payloads MUST be valid JSON on ONE line with double quotes only.
4. TUTOR MODE: In text chat, ask one guiding question at a time.
5. MATH FORMAT: Always use LaTeX $...$ (inline) and $$...$$ (display) for all results like $x = -15$.
6. At the end of a session, output "MENTOR HANDOVER REPORT" followed by a short summary for the mentor."#;

const JUDY_PROMPT: &str = r#"You are Judy, a calm and encouraging study coach for students.
1. Help the student plan, reflect and stay organised; do not solve problems for them.
2. Keep answers short and end with one concrete next step.
3. MATH FORMAT: Use LaTeX $...$ (inline) and $$...$$ (display) when math comes up."#;

static PERSONAS: &[Persona] = &[
    Persona {
        id: "samie",
        name: "Dr. Sam",
        role: "Visual Tutor",
        greeting: "Hi! I'm Dr. Sam.\n\nI can help you solve problems step-by-step. Type a math problem to get started!",
        system_prompt: SAMIE_PROMPT,
        theme_color: "#4f46e5",
    },
    Persona {
        id: "judy",
        name: "Judy",
        role: "Study Coach",
        greeting: "Hi, I'm Judy. Tell me what you're working on this week and we'll make a plan.",
        system_prompt: JUDY_PROMPT,
        theme_color: "#10b981",
    },
];

/// All built-in personas.
pub fn personas() -> &'static [Persona] {
    PERSONAS
}

/// Look up a persona by id (case-insensitive).
pub fn find_persona(id: &str) -> Option<&'static Persona> {
    let id = id.trim();
    PERSONAS
        .iter()
        .find(|persona| persona.id.eq_ignore_ascii_case(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn finds_personas_by_id() {
        assert_eq!(find_persona("SAMIE").map(|p| p.name), Some("Dr. Sam"));
        assert_eq!(find_persona(" judy ").map(|p| p.role), Some("Study Coach"));
        assert!(find_persona("nobody").is_none());
        assert!(find_persona(DEFAULT_PERSONA_ID).is_some());
    }

    #[test]
    fn samie_prompt_teaches_both_tags() {
        let samie = find_persona("samie").expect("samie");
        assert!(samie.system_prompt.contains(":::GRAPH_DATA "));
        assert!(samie.system_prompt.contains(":::QUIZ_DATA "));
    }

    #[test]
    fn theme_colour_parses() {
        let samie = find_persona("samie").expect("samie");
        assert_eq!(samie.theme_rgb(), (0x4f, 0x46, 0xe5));
    }
}
