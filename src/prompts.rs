//! Prompt templates for every feature, rendered with [`tera`].
//!
//! Templates are compiled once into a [`PromptBook`]; rendering only fills in
//! variables.

use tera::{Context, Tera};

pub const DAILY_FACT: &str = "daily_fact";
pub const ANIMAL_CHAT: &str = "animal_chat";
pub const GLOBAL_CHAT: &str = "global_chat";
pub const QUIZ: &str = "quiz";
pub const SOUND_IDENTIFY: &str = "sound_identify";
pub const IMAGE_IDENTIFY: &str = "image_identify";
pub const SOUND_DESCRIPTION: &str = "sound_description";
pub const CATALOG_LOOKUP: &str = "catalog_lookup";
pub const SPIRIT: &str = "spirit";
pub const PERSONA: &str = "persona";

const DAILY_FACT_TPL: &str = "Tell me a surprising and little-known fun fact about an animal. Make it short, exciting, and easy to understand for a general audience. Format it as a simple string, without any introductory text like \"Did you know...\".";

const ANIMAL_CHAT_TPL: &str = r#"You are a friendly and knowledgeable zoologist specializing in the {{ animal }}. Your goal is to provide clear, engaging information without overwhelming the user.
1. **Initial Answer**: Provide a concise, summary-level answer to the user's question in 2-3 sentences.
2. **Engage for Deeper Dive**: After the summary, prompt the user to learn more by asking a question, like "Would you like a more detailed explanation of its diet, or perhaps its unique social behaviors?".
3. **Formatting**: When providing detailed information (especially in follow-up answers), use simple Markdown for clarity: use '**' to bold key terms and start lines with '- ' to create bulleted lists.
4. **Tone**: Remain friendly, knowledgeable, and never mention you are an AI. Base your knowledge on this core information: "{{ description }}", and use search to supplement it."#;

const GLOBAL_CHAT_TPL: &str = r#"You are the Animalpedia Assistant, a helpful AI guide for the Animalpedia website.
1. **Be Concise First**: Always provide a brief, direct answer to the user's question first.
2. **Offer More Info**: After your initial answer, ask a follow-up question to see if the user wants more detail, e.g., "Would you like me to elaborate on that?".
3. **Use Context**: The user is on the "{{ page }}" page. Use this to provide more relevant answers or suggestions.
4. **Formatting**: Use simple Markdown for formatting, such as '**bolding**' key terms and creating lists with '-'.
5. **Tone**: Be friendly, informative, and never reveal you are an AI."#;

const QUIZ_TPL: &str = "Generate a moderately difficult, multiple-choice trivia question about an animal, focusing on {{ topic }}. Ensure one of the options is the correct answer. Also provide a brief, interesting explanation for why the correct answer is correct.";

const SOUND_IDENTIFY_TPL: &str = "Identify the animal from this sound. Provide its common name, scientific name, and a brief, interesting fact about it. Also provide your confidence level in the identification (High, Medium, Low, or Uncertain). If you cannot identify it, say so in the animalName field and explain why in the interestingFact.";

const IMAGE_IDENTIFY_TPL: &str = "Identify the animal in this image. Provide its common name, scientific name, and a brief, interesting fact about it. Also provide your confidence level in the identification (High, Medium, Low, or Uncertain). If you cannot identify it, state that in the animalName field and explain why in the interestingFact.";

const SOUND_DESCRIPTION_TPL: &str = "In a few paragraphs, provide a detailed and engaging description of the sounds and vocalizations made by a {{ animal }}. Explain what the different sounds mean (e.g., for communication, mating rituals, warnings to predators). Be descriptive about what the sounds are like. Use simple Markdown for formatting, such as bolding key terms.";

const CATALOG_LOOKUP_TPL: &str = r#"Fetch comprehensive data for the animal: "{{ animal }}". Use web search to find accurate information. Return the data as a single raw JSON object that strictly adheres to the following TypeScript interface:
interface AnimalpediaEntry {
    id: string; // A unique, URL-friendly ID for the animal (e.g., 'fennec-fox').
    name: string; // The common name of the animal.
    scientificName: string; // The scientific name of the animal.
    description: string; // A brief, one-paragraph description of the animal.
    imageUrl: string; // A URL to a high-quality, royalty-free image of the animal.
    funFact: string; // A surprising and little-known fun fact about the animal.
    habitat: string; // A description of the animal's primary habitat.
    diet: 'Omnivore' | 'Carnivore' | 'Herbivore';
    lifespan: string; // e.g., '10-15 years'
    taxonomy: { kingdom: string; phylum: string; class: string; order: string; family: string; genus: string; species: string; };
    iucnStatus: 'Least Concern' | 'Near Threatened' | 'Vulnerable' | 'Endangered' | 'Critically Endangered' | 'Extinct in the Wild' | 'Extinct' | 'Data Deficient';
    region: 'Africa' | 'Asia' | 'North America' | 'South America' | 'Antarctica' | 'Europe' | 'Australia' | 'Oceans' | 'Global';
    size: { height: string; weight: string; }; // e.g., height: '4 ft', weight: '500 lbs'
    speed: string | null; // e.g., '50 mph'
    evolutionaryHistory: string; // A brief summary.
    foodChain: { role: string; predators: string[]; prey: string[]; };
}
Ensure the image URL is from a reliable, royalty-free source like Pexels or Unsplash. If a field is not applicable (e.g., speed for a slow animal), provide a null value. For domesticated animals found worldwide, set the region to 'Global'.
Your response must be only the JSON object, with no surrounding text or markdown formatting (like ```json)."#;

const SPIRIT_TPL: &str = "Based on these personality quiz answers, determine the user's spirit animal.
    - Ideal vacation: {{ vacation }}
    - Social style: {{ social }}
    - A hobby: {{ hobby }}
    - Time of day: {{ time }}
    Provide a creative, positive, and insightful analysis connecting their answers to the traits of a specific animal. Find a suitable, royalty-free image URL for the animal.";

const PERSONA_TPL: &str = "Imagine a {{ animal }} as a human. Write a creative and detailed \"human persona\" for them. Describe their likely job, personality traits, hobbies, and a funny quirk they might have. Format the response using simple Markdown (bolding, lists).";

/// Compiled set of feature prompts.
#[derive(Debug, Clone)]
pub struct PromptBook {
    tera: Tera,
}

impl PromptBook {
    /// Compile the built-in templates.
    pub fn new() -> tera::Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (DAILY_FACT, DAILY_FACT_TPL),
            (ANIMAL_CHAT, ANIMAL_CHAT_TPL),
            (GLOBAL_CHAT, GLOBAL_CHAT_TPL),
            (QUIZ, QUIZ_TPL),
            (SOUND_IDENTIFY, SOUND_IDENTIFY_TPL),
            (IMAGE_IDENTIFY, IMAGE_IDENTIFY_TPL),
            (SOUND_DESCRIPTION, SOUND_DESCRIPTION_TPL),
            (CATALOG_LOOKUP, CATALOG_LOOKUP_TPL),
            (SPIRIT, SPIRIT_TPL),
            (PERSONA, PERSONA_TPL),
        ])?;
        Ok(Self { tera })
    }

    /// Render `name` with the given variables.
    pub fn render(&self, name: &str, vars: &[(&str, &str)]) -> tera::Result<String> {
        let mut ctx = Context::new();
        for (key, value) in vars {
            ctx.insert(*key, value);
        }
        let rendered = self.tera.render(name, &ctx)?;
        tracing::trace!(template = name, prompt = %rendered, "rendered prompt");
        Ok(rendered)
    }
}
