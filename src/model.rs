//! Plain records exchanged between callers, the provider and the catalog.
//!
//! Field names follow the provider's camelCase JSON so generated payloads
//! decode directly into these types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Placeholder stored when a catalog entry arrives without a sample sound.
pub const NO_SAMPLE_SOUND: &str = "No sample sound available.";

fn no_sample_sound() -> String {
    NO_SAMPLE_SOUND.to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diet {
    Omnivore,
    Carnivore,
    Herbivore,
}

/// IUCN Red List conservation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IucnStatus {
    #[serde(rename = "Least Concern")]
    LeastConcern,
    #[serde(rename = "Near Threatened")]
    NearThreatened,
    Vulnerable,
    Endangered,
    #[serde(rename = "Critically Endangered")]
    CriticallyEndangered,
    #[serde(rename = "Extinct in the Wild")]
    ExtinctInTheWild,
    Extinct,
    #[serde(rename = "Data Deficient")]
    DataDeficient,
}

impl IucnStatus {
    pub fn label(self) -> &'static str {
        match self {
            IucnStatus::LeastConcern => "Least Concern",
            IucnStatus::NearThreatened => "Near Threatened",
            IucnStatus::Vulnerable => "Vulnerable",
            IucnStatus::Endangered => "Endangered",
            IucnStatus::CriticallyEndangered => "Critically Endangered",
            IucnStatus::ExtinctInTheWild => "Extinct in the Wild",
            IucnStatus::Extinct => "Extinct",
            IucnStatus::DataDeficient => "Data Deficient",
        }
    }
}

impl fmt::Display for IucnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Region {
    Africa,
    Asia,
    #[serde(rename = "North America")]
    NorthAmerica,
    #[serde(rename = "South America")]
    SouthAmerica,
    Antarctica,
    Europe,
    Australia,
    Oceans,
    Global,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    pub kingdom: String,
    pub phylum: String,
    pub class: String,
    pub order: String,
    pub family: String,
    pub genus: String,
    pub species: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub height: String,
    pub weight: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoodChain {
    pub role: String,
    pub predators: Vec<String>,
    pub prey: Vec<String>,
}

/// One animal in the encyclopedia, keyed by its slug `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
    pub scientific_name: String,
    pub description: String,
    pub image_url: String,
    pub fun_fact: String,
    #[serde(default = "no_sample_sound")]
    pub sample_sound: String,
    pub habitat: String,
    pub diet: Diet,
    pub lifespan: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related: Option<Vec<String>>,
    pub taxonomy: Taxonomy,
    pub iucn_status: IucnStatus,
    pub region: Region,
    pub size: Size,
    pub speed: Option<String>,
    pub evolutionary_history: String,
    pub food_chain: FoodChain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

/// Web source attached to a grounded answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub title: String,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<GroundingSource>>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            sources: None,
        }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            content: content.into(),
            sources: None,
        }
    }

    /// Attach citations, leaving `sources` unset when the list is empty.
    pub fn with_sources(mut self, sources: Vec<GroundingSource>) -> Self {
        self.sources = if sources.is_empty() {
            None
        } else {
            Some(sources)
        };
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuizCategory {
    #[default]
    General,
    Diet,
    Habitat,
}

impl QuizCategory {
    pub fn label(self) -> &'static str {
        match self {
            QuizCategory::General => "General",
            QuizCategory::Diet => "Diet",
            QuizCategory::Habitat => "Habitat",
        }
    }

    /// Topic phrase used inside the quiz prompt.
    pub fn topic(self) -> String {
        match self {
            QuizCategory::General => "a general fact".to_string(),
            other => format!("the {}", other.label().to_lowercase()),
        }
    }
}

impl std::str::FromStr for QuizCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "general" => Ok(QuizCategory::General),
            "diet" => Ok(QuizCategory::Diet),
            "habitat" => Ok(QuizCategory::Habitat),
            other => Err(format!("unknown quiz category `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub explanation: String,
}

impl QuizQuestion {
    pub fn is_correct(&self, answer: &str) -> bool {
        self.correct_answer == answer
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
    Uncertain,
}

/// Result of identifying an animal from a sound or an image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identification {
    pub animal_name: String,
    pub scientific_name: String,
    pub interesting_fact: String,
    pub confidence: Confidence,
}

/// Answers to the four personality questions behind a spirit animal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SpiritAnswers {
    pub vacation: String,
    pub social: String,
    pub hobby: String,
    pub time: String,
}

impl SpiritAnswers {
    pub fn is_complete(&self) -> bool {
        [&self.vacation, &self.social, &self.hobby, &self.time]
            .iter()
            .all(|a| !a.trim().is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpiritResult {
    pub animal_name: String,
    pub image_url: String,
    pub description: String,
}

/// An animal imagined as a human, in Markdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    pub animal_name: String,
    pub text: String,
}

/// Outcome of asking the provider for a catalog entry by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Found(Box<CatalogEntry>),
    NotFound { query: String, message: String },
}

impl Lookup {
    pub fn entry(&self) -> Option<&CatalogEntry> {
        match self {
            Lookup::Found(entry) => Some(entry),
            Lookup::NotFound { .. } => None,
        }
    }
}
