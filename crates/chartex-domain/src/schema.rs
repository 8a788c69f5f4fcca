//! The configurable field schema driving prompt rendering and normalization

use crate::record::Record;
use serde::{Deserialize, Serialize};

/// One field of a schema, with the extraction guidance rendered into the
/// system prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Exact field name, as it must appear in output records (case-sensitive)
    pub name: String,

    /// What the field means
    pub definition: String,

    /// What to extract and where to look for it in a note
    pub guidance: String,

    /// A representative extracted value
    pub example: String,
}

impl FieldSpec {
    /// Create a new field spec
    pub fn new(
        name: impl Into<String>,
        definition: impl Into<String>,
        guidance: impl Into<String>,
        example: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            definition: definition.into(),
            guidance: guidance.into(),
            example: example.into(),
        }
    }
}

/// A worked input/output example rendered into the system prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaExample {
    /// The example note text
    pub note: String,

    /// Expected (field, value) pairs, in schema order
    pub values: Vec<(String, String)>,
}

/// The ordered set of fields every extracted record must contain.
///
/// Exactly one schema is active per extractor instance. The schema drives
/// both ends of the pipeline: the prompt builder renders its field guidance
/// into the system instruction, and the normalizer coerces every parsed
/// record to exactly its field set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    name: String,
    fields: Vec<FieldSpec>,
    examples: Vec<SchemaExample>,
}

impl Schema {
    /// Create a schema from an ordered field list
    pub fn new(name: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            name: name.into(),
            fields,
            examples: Vec::new(),
        }
    }

    /// Attach worked examples for the system prompt
    pub fn with_examples(mut self, examples: Vec<SchemaExample>) -> Self {
        self.examples = examples;
        self
    }

    /// Schema name (used for logging, not rendered into prompts)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The ordered fields
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Worked examples, if any
    pub fn examples(&self) -> &[SchemaExample] {
        &self.examples
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the schema has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate field names in schema order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Whether `name` is one of the schema's fields
    pub fn contains(&self, name: &str) -> bool {
        self.fields.iter().any(|f| f.name == name)
    }

    /// The canonical empty record: every field present, every value ""
    pub fn empty_record(&self) -> Record {
        let mut record = Record::new();
        for field in &self.fields {
            record.insert(field.name.as_str(), "");
        }
        record
    }

    /// Validate the schema
    pub fn validate(&self) -> Result<(), String> {
        if self.fields.is_empty() {
            return Err("schema must define at least one field".to_string());
        }
        for (idx, field) in self.fields.iter().enumerate() {
            if field.name.trim().is_empty() {
                return Err(format!("field {} has an empty name", idx));
            }
        }
        for (idx, field) in self.fields.iter().enumerate() {
            if self.fields[..idx].iter().any(|f| f.name == field.name) {
                return Err(format!("duplicate field name '{}'", field.name));
            }
        }
        Ok(())
    }

    /// The clinical-note schema: ten narrative fields covering a standard
    /// encounter note (SOAP-style sections).
    pub fn clinical_note() -> Self {
        Self::new(
            "clinical_note",
            vec![
                FieldSpec::new(
                    "Chief_Complaint",
                    "The primary reason for the patient's visit, ideally in the patient's own words",
                    "Main symptom or concern that brought the patient to seek care. Look for \"CC:\", \"Chief Complaint:\", \"Presenting complaint:\", or opening statements",
                    "Chest pain",
                ),
                FieldSpec::new(
                    "History_Present_Illness",
                    "Detailed narrative of the current illness: onset, location, duration, character, aggravating/alleviating factors, radiation, severity",
                    "Complete description of symptom progression, timeline, quality, and modifying factors. Look for sections labeled \"HPI:\" or timeline narratives",
                    "Sudden onset crushing substernal chest pain x 2 hours, radiating to left arm, 8/10 severity",
                ),
                FieldSpec::new(
                    "Past_Medical_History",
                    "Prior medical conditions, surgeries, hospitalizations, and chronic diseases",
                    "All documented previous diagnoses, procedures, and significant past medical events. Look for \"PMH:\", \"History of\", mentions of chronic conditions",
                    "Diabetes Type 2; Hypertension; Appendectomy 2015",
                ),
                FieldSpec::new(
                    "Current_Medications",
                    "All medications the patient is currently taking",
                    "Drug name, dose, route, frequency, preserved as documented. Look for \"Medications:\", \"Current meds:\", drug lists with dosing",
                    "Metformin 500mg PO BID; Lisinopril 10mg PO daily",
                ),
                FieldSpec::new(
                    "Allergies",
                    "Known allergies (drug, food, environmental) and their reactions",
                    "Allergen and reaction type if documented, hyphen-separated. Look for \"Allergies:\", \"NKDA\", \"NKA\"",
                    "Penicillin - Anaphylaxis; Sulfa drugs - Rash",
                ),
                FieldSpec::new(
                    "Physical_Exam",
                    "Objective clinical findings from the physician's examination",
                    "Vital signs and examination findings organized by body system. Look for \"PE:\", \"Physical Exam:\", vital signs, system reviews (CV, Resp, Abd, Neuro)",
                    "BP 140/90, HR 88; CV: RRR, no murmurs; Lungs: Clear bilaterally",
                ),
                FieldSpec::new(
                    "Review_of_Systems",
                    "Systematic inventory of symptoms obtained through questioning, by organ system",
                    "Positive and pertinent negative findings across body systems. Look for \"ROS:\", \"Review of Systems:\"",
                    "General: No fever or weight loss; CV: No chest pain; GI: Nausea present, no vomiting",
                ),
                FieldSpec::new(
                    "Labs_Imaging_Results",
                    "Diagnostic test results: laboratory values, imaging findings, interpretations",
                    "Test name, values, units, and clinical interpretation if provided. Look for lab values, imaging reports, \"Labs:\", \"Imaging:\"",
                    "CBC: WBC 15.2 (elevated); CXR: Right lower lobe infiltrate",
                ),
                FieldSpec::new(
                    "Assessment_Impression",
                    "The working diagnosis or differential diagnoses",
                    "Primary diagnosis first, differentials semicolon-separated. Look for \"Assessment:\", \"Impression:\", \"Diagnosis:\", \"DDx:\"",
                    "Acute STEMI; Rule out pericarditis",
                ),
                FieldSpec::new(
                    "Plan",
                    "Proposed treatment plan, follow-up care, and patient instructions",
                    "Medications prescribed, procedures ordered, follow-ups, consultations. Look for \"Plan:\", \"Treatment:\", \"Disposition:\"",
                    "Start Aspirin 325mg stat; Cardiology consult; Admit to CCU",
                ),
            ],
        )
        .with_examples(vec![SchemaExample {
            note: "Patient continues to have shortness of breath. COPD exacerbation. \
                   Currently on albuterol and ipratropium nebs q4h. Will add prednisone \
                   40mg daily x 5 days. Pulmonology to see."
                .to_string(),
            values: vec![
                ("Chief_Complaint".to_string(), "Shortness of breath".to_string()),
                (
                    "History_Present_Illness".to_string(),
                    "Patient continues to have shortness of breath".to_string(),
                ),
                ("Past_Medical_History".to_string(), "COPD".to_string()),
                (
                    "Current_Medications".to_string(),
                    "Albuterol nebs q4h; Ipratropium nebs q4h".to_string(),
                ),
                ("Allergies".to_string(), String::new()),
                ("Physical_Exam".to_string(), String::new()),
                ("Review_of_Systems".to_string(), String::new()),
                ("Labs_Imaging_Results".to_string(), String::new()),
                ("Assessment_Impression".to_string(), "COPD exacerbation".to_string()),
                (
                    "Plan".to_string(),
                    "Add prednisone 40mg daily x 5 days; Pulmonology to see".to_string(),
                ),
            ],
        }])
    }

    /// The medication-order schema: twelve discrete fields for order-sheet
    /// style notes (medications, procedures, feeds, monitoring).
    pub fn medication_order() -> Self {
        Self::new(
            "medication_order",
            vec![
                FieldSpec::new(
                    "Medication_Name",
                    "Name of each medication ordered or administered",
                    "Drug names exactly as written, including abbreviations",
                    "Vancomycin; Cefepime",
                ),
                FieldSpec::new(
                    "Dosage",
                    "Dose amount and unit for each medication",
                    "Numeric dose with unit, paired in order with the medication list",
                    "1g; 2g",
                ),
                FieldSpec::new(
                    "Route",
                    "Administration route",
                    "PO, IV, IM, SC, PR, inhaled, topical, as written",
                    "IV; IV",
                ),
                FieldSpec::new(
                    "Frequency",
                    "Dosing schedule",
                    "Frequency abbreviations as written (BID, TID, q4h, PRN)",
                    "q12h; q8h",
                ),
                FieldSpec::new(
                    "Procedure_Type",
                    "Procedures ordered or performed",
                    "Surgical, diagnostic, or bedside procedures named in the note",
                    "Central line placement",
                ),
                FieldSpec::new(
                    "Lab_Test_Name",
                    "Laboratory tests ordered or resulted",
                    "Test names, not values. Look for order lists and result sections",
                    "CBC; Blood cultures",
                ),
                FieldSpec::new(
                    "Feeding_Type",
                    "Nutrition route or formula",
                    "NPO, PO diet, NG/PEG feeds, TPN, formula names",
                    "NG feeds, Jevity 1.2",
                ),
                FieldSpec::new(
                    "Feeding_Status",
                    "Current state of feeding orders",
                    "Started, held, advanced, at goal, as documented",
                    "At goal",
                ),
                FieldSpec::new(
                    "Vital_Sign",
                    "Vital sign measurements in the note",
                    "Named vitals with values as written",
                    "BP 95/60; HR 88",
                ),
                FieldSpec::new(
                    "Timing",
                    "When orders take effect or events occurred",
                    "Explicit times, dates, or relative timing attached to orders",
                    "Tonight; Post-op day 2",
                ),
                FieldSpec::new(
                    "Instruction",
                    "Free-text care instructions",
                    "Nursing or patient instructions that are not orders themselves",
                    "Hold feeds if residuals > 200mL",
                ),
                FieldSpec::new(
                    "Session_Context",
                    "The care setting or session the note belongs to",
                    "Unit, service, or encounter type when stated",
                    "ICU",
                ),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clinical_note_shape() {
        let schema = Schema::clinical_note();
        assert_eq!(schema.len(), 10);
        assert!(schema.validate().is_ok());

        // Field order is part of the contract
        let names: Vec<_> = schema.field_names().collect();
        assert_eq!(names[0], "Chief_Complaint");
        assert_eq!(names[9], "Plan");
        assert!(schema.contains("Assessment_Impression"));
        assert!(!schema.contains("Medication_Name"));
    }

    #[test]
    fn test_medication_order_shape() {
        let schema = Schema::medication_order();
        assert_eq!(schema.len(), 12);
        assert!(schema.validate().is_ok());
        assert!(schema.contains("Session_Context"));
    }

    #[test]
    fn test_empty_record_has_every_field_empty() {
        let schema = Schema::clinical_note();
        let record = schema.empty_record();

        assert_eq!(record.len(), schema.len());
        assert!(record.is_blank());
        for name in schema.field_names() {
            assert_eq!(record.get(name), Some(""));
        }
    }

    #[test]
    fn test_validate_rejects_no_fields() {
        let schema = Schema::new("empty", vec![]);
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_names() {
        let schema = Schema::new(
            "dup",
            vec![
                FieldSpec::new("Field", "", "", ""),
                FieldSpec::new("Field", "", "", ""),
            ],
        );
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let schema = Schema::new("blank", vec![FieldSpec::new("  ", "", "", "")]);
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_clinical_example_matches_schema_fields() {
        let schema = Schema::clinical_note();
        for example in schema.examples() {
            assert_eq!(example.values.len(), schema.len());
            for (name, _) in &example.values {
                assert!(schema.contains(name), "example field '{}' not in schema", name);
            }
        }
    }
}
