//! Structured-output schema descriptors sent alongside JSON requests.
//!
//! The shape follows the provider's OpenAPI subset (`OBJECT`, `STRING`,
//! `ARRAY`, `enum`, `required`).

use serde_json::{Value, json};

const CONFIDENCE_LEVELS: [&str; 4] = ["High", "Medium", "Low", "Uncertain"];

pub fn quiz() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "question": {
                "type": "STRING",
                "description": "The trivia question about an animal."
            },
            "options": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "An array of 4 possible answers."
            },
            "correctAnswer": {
                "type": "STRING",
                "description": "The correct answer from the options array."
            },
            "explanation": {
                "type": "STRING",
                "description": "A brief, interesting explanation or fun fact related to the correct answer."
            }
        },
        "required": ["question", "options", "correctAnswer", "explanation"]
    })
}

/// Schema for sound and image identification; `fact_about` describes what
/// the interesting fact should cover.
pub fn identification(fact_about: &str) -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "animalName": {
                "type": "STRING",
                "description": "The common name of the identified animal."
            },
            "scientificName": {
                "type": "STRING",
                "description": "The scientific name of the animal."
            },
            "interestingFact": {
                "type": "STRING",
                "description": format!("An interesting fact about {fact_about}.")
            },
            "confidence": {
                "type": "STRING",
                "enum": CONFIDENCE_LEVELS,
                "description": "The confidence level of the identification."
            }
        },
        "required": ["animalName", "scientificName", "interestingFact", "confidence"]
    })
}

pub fn spirit() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "animalName": {
                "type": "STRING",
                "description": "The name of the animal that best represents the user's personality."
            },
            "imageUrl": {
                "type": "STRING",
                "description": "A URL to a high-quality, royalty-free image of the animal."
            },
            "description": {
                "type": "STRING",
                "description": "A creative, insightful, and positive paragraph explaining why this animal is the user's spirit animal based on their answers. It should connect their choices to the animal's key traits."
            }
        },
        "required": ["animalName", "imageUrl", "description"]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identification_requires_confidence() {
        let schema = identification("the animal");
        let required = schema["required"].as_array().unwrap();
        assert!(required.contains(&json!("confidence")));
        assert_eq!(schema["properties"]["confidence"]["enum"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn quiz_lists_every_field_as_required() {
        let schema = quiz();
        let props = schema["properties"].as_object().unwrap();
        let required = schema["required"].as_array().unwrap();
        assert_eq!(props.len(), required.len());
    }
}
