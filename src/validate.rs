//! Decoding of raw provider output into typed records.
//!
//! Every decoder either returns a record that satisfies its invariants or
//! [`Error::MalformedResponse`].

use serde::de::DeserializeOwned;
use std::collections::HashSet;

use crate::error::Error;
use crate::model::{CatalogEntry, Identification, QuizQuestion, SpiritResult};

/// Records that can be decoded from provider JSON and checked afterwards.
pub trait Validated: DeserializeOwned {
    /// Check invariants the type system cannot express.
    fn check(&self) -> Result<(), String> {
        Ok(())
    }
}

impl Validated for QuizQuestion {
    fn check(&self) -> Result<(), String> {
        if self.question.trim().is_empty() {
            return Err("quiz question is empty".into());
        }
        if self.options.len() != 4 {
            return Err(format!("expected 4 options, got {}", self.options.len()));
        }
        let distinct: HashSet<&str> = self.options.iter().map(|o| o.trim()).collect();
        if distinct.len() != self.options.len() {
            return Err("quiz options repeat".into());
        }
        if !self.options.contains(&self.correct_answer) {
            return Err(format!(
                "correct answer `{}` is not among the options",
                self.correct_answer
            ));
        }
        Ok(())
    }
}

impl Validated for Identification {}

impl Validated for SpiritResult {
    fn check(&self) -> Result<(), String> {
        if self.animal_name.trim().is_empty() {
            return Err("spirit animal has no name".into());
        }
        Ok(())
    }
}

impl Validated for CatalogEntry {
    fn check(&self) -> Result<(), String> {
        if self.id.trim().is_empty() {
            return Err("catalog entry has no id".into());
        }
        if self.name.trim().is_empty() {
            return Err("catalog entry has no name".into());
        }
        Ok(())
    }
}

/// Trim `raw` and remove a surrounding Markdown code fence.
///
/// ```
/// use animalpedia::validate::strip_code_fence;
/// assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
/// assert_eq!(strip_code_fence("  plain  "), "plain");
/// ```
pub fn strip_code_fence(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        text = rest.trim_start();
        if let Some(body) = text.strip_suffix("```") {
            text = body;
        }
        text = text.trim();
    }
    text
}

/// Decode and check a JSON record.
pub fn decode<T: Validated>(raw: &str) -> Result<T, Error> {
    let json = strip_code_fence(raw);
    let record: T =
        serde_json::from_str(json).map_err(|e| Error::MalformedResponse(e.to_string()))?;
    record.check().map_err(Error::MalformedResponse)?;
    Ok(record)
}

/// Normalize free text; blank output counts as malformed.
pub fn text(raw: &str) -> Result<String, Error> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::MalformedResponse("empty text response".into()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Confidence, NO_SAMPLE_SOUND};
    use serde_json::json;

    fn quiz_json(options: &[&str], answer: &str) -> String {
        json!({
            "question": "Which bird cannot fly?",
            "options": options,
            "correctAnswer": answer,
            "explanation": "Penguins swim instead."
        })
        .to_string()
    }

    #[test]
    fn accepts_well_formed_quiz() {
        let raw = quiz_json(&["Penguin", "Eagle", "Sparrow", "Owl"], "Penguin");
        let q: QuizQuestion = decode(&raw).unwrap();
        assert_eq!(q.correct_answer, "Penguin");
    }

    #[test]
    fn rejects_quiz_with_three_options() {
        let raw = quiz_json(&["Penguin", "Eagle", "Sparrow"], "Penguin");
        assert!(matches!(decode::<QuizQuestion>(&raw), Err(Error::MalformedResponse(_))));
    }

    #[test]
    fn rejects_quiz_with_repeated_options() {
        let raw = quiz_json(&["Lion", "Lion", "Lion", "Lion"], "Lion");
        assert!(matches!(decode::<QuizQuestion>(&raw), Err(Error::MalformedResponse(_))));
    }

    #[test]
    fn rejects_quiz_with_answer_outside_options() {
        let raw = quiz_json(&["Penguin", "Eagle", "Sparrow", "Owl"], "Kiwi");
        assert!(matches!(decode::<QuizQuestion>(&raw), Err(Error::MalformedResponse(_))));
    }

    #[test]
    fn identification_needs_confidence() {
        let raw = r#"{"animalName":"Wolf","scientificName":"Canis lupus","interestingFact":"Howls."}"#;
        assert!(matches!(decode::<Identification>(raw), Err(Error::MalformedResponse(_))));
    }

    #[test]
    fn identification_rejects_unknown_confidence() {
        let raw = r#"{"animalName":"Wolf","scientificName":"Canis lupus","interestingFact":"Howls.","confidence":"Certain"}"#;
        assert!(decode::<Identification>(raw).is_err());
        let ok = raw.replace("Certain", "Medium");
        assert_eq!(decode::<Identification>(&ok).unwrap().confidence, Confidence::Medium);
    }

    #[test]
    fn fenced_catalog_entry_gets_default_sample_sound() {
        let body = json!({
            "id": "okapi",
            "name": "Okapi",
            "scientificName": "Okapia johnstoni",
            "description": "A forest giraffid.",
            "imageUrl": "https://images.pexels.com/okapi.jpg",
            "funFact": "Its tongue can clean its ears.",
            "habitat": "Rainforest",
            "diet": "Herbivore",
            "lifespan": "20-30 years",
            "taxonomy": {
                "kingdom": "Animalia", "phylum": "Chordata", "class": "Mammalia",
                "order": "Artiodactyla", "family": "Giraffidae", "genus": "Okapia",
                "species": "O. johnstoni"
            },
            "iucnStatus": "Endangered",
            "region": "Africa",
            "size": { "height": "5 ft", "weight": "550 lbs" },
            "speed": null,
            "evolutionaryHistory": "Closest living relative of the giraffe.",
            "foodChain": { "role": "Herbivore", "predators": ["Leopard"], "prey": [] }
        });
        let raw = format!("```json\n{body}\n```");
        let entry: CatalogEntry = decode(&raw).unwrap();
        assert_eq!(entry.sample_sound, NO_SAMPLE_SOUND);
        assert_eq!(entry.speed, None);
    }

    #[test]
    fn blank_text_is_malformed() {
        assert!(text(" \n ").is_err());
        assert_eq!(text("  Owls can rotate their heads. ").unwrap(), "Owls can rotate their heads.");
    }
}
