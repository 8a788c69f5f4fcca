//! Prompt engineering for schema-driven field extraction

use chartex_domain::{Schema, SchemaExample};

/// Builds the system instruction and per-batch user message for extraction
pub struct PromptBuilder<'a> {
    schema: &'a Schema,
}

impl<'a> PromptBuilder<'a> {
    /// Create a prompt builder for the active schema
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Build the system instruction: principles, per-field guidance, the
    /// output contract, and any worked examples the schema carries.
    pub fn system_prompt(&self) -> String {
        let mut prompt = String::new();

        prompt.push_str(CORE_INSTRUCTIONS);

        prompt.push_str("\n\n## FIELD DEFINITIONS & EXTRACTION GUIDELINES\n");
        for (idx, field) in self.schema.fields().iter().enumerate() {
            prompt.push_str(&format!("\n### {}. {}\n", idx + 1, field.name));
            if !field.definition.is_empty() {
                prompt.push_str(&format!("**Definition:** {}\n", field.definition));
            }
            if !field.guidance.is_empty() {
                prompt.push_str(&format!("**What to extract:** {}\n", field.guidance));
            }
            if !field.example.is_empty() {
                prompt.push_str(&format!("**Example:** \"{}\"\n", field.example));
            }
        }

        prompt.push_str("\n## OUTPUT FORMAT\n\nReturn a JSON object with this exact structure:\n\n");
        prompt.push_str(&self.output_skeleton());

        prompt.push_str("\n\n## CRITICAL RULES\n");
        prompt.push_str(CRITICAL_RULES);

        for (idx, example) in self.schema.examples().iter().enumerate() {
            prompt.push_str(&format!("\n\n## EXAMPLE {}\n**Input:**\n\"{}\"\n\n**Output:**\n", idx + 1, example.note));
            prompt.push_str(&render_example(example));
        }

        prompt
    }

    /// Build the user message: numbered notes plus the output contract.
    ///
    /// Whitespace-only notes are dropped before numbering; the caller is
    /// responsible for keeping its own positions aligned (the extractor
    /// never sends blanks here in the first place).
    pub fn user_prompt(&self, notes: &[&str]) -> String {
        let mut numbered = String::new();
        let mut k = 0;
        for note in notes {
            let trimmed = note.trim();
            if trimmed.is_empty() {
                continue;
            }
            k += 1;
            numbered.push_str(&format!("**Note {}:**\n{}\n\n", k, trimmed));
        }

        format!(
            "Extract structured fields from the following note(s).\n\n\
             {numbered}\
             **EXTRACTION REQUIREMENTS:**\n\
             - Analyze each note carefully and extract all available information\n\
             - Return a JSON object with a \"results\" array containing one object per note\n\
             - Maintain the order of notes as numbered above\n\
             - Follow the exact field structure and naming from the system instructions\n\
             - Use semicolons (;) to separate multiple items within the same field\n\
             - Use empty string \"\" for any field not present in the note\n\
             - Return ONLY the JSON output - no explanations, no markdown formatting, no code blocks\n\n\
             Begin extraction:"
        )
    }

    /// The `results`-wrapper skeleton listing every field with an empty value
    fn output_skeleton(&self) -> String {
        let mut skeleton = String::from("{\n  \"results\": [\n    {\n");
        let count = self.schema.len();
        for (idx, name) in self.schema.field_names().enumerate() {
            let comma = if idx + 1 < count { "," } else { "" };
            skeleton.push_str(&format!("      \"{}\": \"\"{}\n", name, comma));
        }
        skeleton.push_str("    }\n  ]\n}");
        skeleton
    }
}

/// Render a worked example's expected output as a results-wrapped JSON object
fn render_example(example: &SchemaExample) -> String {
    let mut out = String::from("{\"results\": [{\n");
    let count = example.values.len();
    for (idx, (name, value)) in example.values.iter().enumerate() {
        let comma = if idx + 1 < count { "," } else { "" };
        out.push_str(&format!(
            "  \"{}\": {}{}\n",
            name,
            json_string(value),
            comma
        ));
    }
    out.push_str("}]}");
    out
}

/// Escape a value as a JSON string literal
fn json_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

const CORE_INSTRUCTIONS: &str = "\
You are an expert clinical NLP system specialized in extracting structured medical \
information from clinical documentation. Analyze the provided notes and extract key \
data into a standardized JSON format.

## CORE PRINCIPLES
- Extract information as written in the note
- Preserve medical terminology and abbreviations exactly as they appear
- If information is not present, use empty string \"\"
- Maintain clinical accuracy and context
- Separate multiple items within the same field using semicolon (;)";

const CRITICAL_RULES: &str = "\
1. **JSON ONLY:** Return ONLY valid JSON - no markdown code blocks, no explanations, no additional text
2. **Field Names:** Use exact field names as specified (case-sensitive)
3. **Empty Values:** Use empty string \"\" for any field not present in the note, never null or omitted fields
4. **Multiple Items:** Separate with semicolon (;) within the same field
5. **Order Preservation:** Maintain the order of notes as provided in the input
6. **One Object Per Note:** Each note gets exactly ONE object in the results array
7. **Preserve Medical Language:** Keep abbreviations, terminology, and formatting as written
8. **No Hallucination:** Extract only information explicitly stated in the note - do not infer or add information";

#[cfg(test)]
mod tests {
    use super::*;
    use chartex_domain::Schema;

    #[test]
    fn test_system_prompt_lists_every_field() {
        let schema = Schema::clinical_note();
        let builder = PromptBuilder::new(&schema);
        let prompt = builder.system_prompt();

        for name in schema.field_names() {
            assert!(prompt.contains(name), "missing field {}", name);
        }
        assert!(prompt.contains("\"results\""));
        assert!(prompt.contains("CRITICAL RULES"));
    }

    #[test]
    fn test_system_prompt_includes_guidance_and_examples() {
        let schema = Schema::clinical_note();
        let prompt = PromptBuilder::new(&schema).system_prompt();

        assert!(prompt.contains("Chief Complaint:"));
        assert!(prompt.contains("**What to extract:**"));
        // The worked example from the preset
        assert!(prompt.contains("COPD exacerbation"));
    }

    #[test]
    fn test_user_prompt_numbers_notes_in_order() {
        let schema = Schema::clinical_note();
        let builder = PromptBuilder::new(&schema);
        let prompt = builder.user_prompt(&["first note", "second note"]);

        assert!(prompt.contains("**Note 1:**\nfirst note"));
        assert!(prompt.contains("**Note 2:**\nsecond note"));
        let pos1 = prompt.find("**Note 1:**").unwrap();
        let pos2 = prompt.find("**Note 2:**").unwrap();
        assert!(pos1 < pos2);
    }

    #[test]
    fn test_user_prompt_drops_blank_notes_before_numbering() {
        let schema = Schema::clinical_note();
        let builder = PromptBuilder::new(&schema);
        let prompt = builder.user_prompt(&["   ", "only real note", ""]);

        assert!(prompt.contains("**Note 1:**\nonly real note"));
        assert!(!prompt.contains("**Note 2:**"));
    }

    #[test]
    fn test_user_prompt_states_contract() {
        let schema = Schema::medication_order();
        let prompt = PromptBuilder::new(&schema).user_prompt(&["note"]);

        assert!(prompt.contains("\"results\" array"));
        assert!(prompt.contains("one object per note"));
        assert!(prompt.contains("ONLY the JSON output"));
    }

    #[test]
    fn test_output_skeleton_is_valid_json() {
        let schema = Schema::medication_order();
        let skeleton = PromptBuilder::new(&schema).output_skeleton();

        let value: serde_json::Value = serde_json::from_str(&skeleton).unwrap();
        let entry = &value["results"][0];
        assert_eq!(
            entry.as_object().unwrap().len(),
            schema.len(),
            "skeleton must list every schema field"
        );
    }

    #[test]
    fn test_rendered_example_is_valid_json() {
        let schema = Schema::clinical_note();
        let example = &schema.examples()[0];
        let rendered = render_example(example);

        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(
            value["results"][0]["Assessment_Impression"],
            "COPD exacerbation"
        );
    }

    #[test]
    fn test_json_string_escapes_quotes() {
        assert_eq!(json_string("a \"b\""), r#""a \"b\"""#);
    }
}
