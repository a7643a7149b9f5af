//! Simulated tutor generator.
//!
//! Classifies the most recent user message with an ordered keyword cascade
//! and answers from a fixed template pool. This path never fails: unmatched
//! input lands in the default bucket.

use crate::protocols::{ChatMessage, Role};

pub const TUTOR_SYSTEM_PROMPT: &str = "You are an enthusiastic and supportive AI English \
conversation partner. Help users practice English through natural, engaging conversation \
while providing gentle guidance and encouragement. Focus on communication over perfect \
grammar, correct naturally within conversation, and keep the exchange flowing with \
follow-up questions.";

const GREETING: &str =
    "Hello! I'm your AI English conversation partner. How can I help you practice English today?";

/// Template selection becomes pseudo-random above this temperature.
const CREATIVE_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopicBucket {
    Grammar,
    Vocabulary,
    Pronunciation,
    Business,
    ConversationPractice,
    Food,
    Travel,
    Default,
}

/// Keyword sets checked in priority order; the first hit wins.
const KEYWORD_CASCADE: &[(TopicBucket, &[&str])] = &[
    (TopicBucket::Grammar, &["grammar", "correct", "mistake", "wrong"]),
    (TopicBucket::Vocabulary, &["vocabulary", "words", "meaning", "definition"]),
    (TopicBucket::Pronunciation, &["pronounce", "pronunciation", "sound", "accent"]),
    (TopicBucket::Business, &["business", "work", "job", "office", "career"]),
    (TopicBucket::ConversationPractice, &["conversation", "talk", "speak", "practice"]),
    (TopicBucket::Food, &["food", "eat", "cooking", "restaurant"]),
    (TopicBucket::Travel, &["travel", "trip", "vacation", "country"]),
];

const GRAMMAR_TEMPLATES: &[&str] = &[
    "I'd be happy to help with grammar! Grammar practice is essential for fluency. Try writing a sentence, and I'll help you polish it. What specific grammar topic would you like to work on?",
    "Grammar questions are my favorite! Share a sentence you're unsure about and we'll work through it together, rule by rule.",
    "Let's tackle some grammar! The best way to learn a rule is to use it. Can you give me an example sentence you'd like to check?",
];

const VOCABULARY_TEMPLATES: &[&str] = &[
    "Building vocabulary is exciting! Try learning five new words daily and use them in sentences. Context is key - learn words in phrases, not isolation. What topics interest you?",
    "New words stick best when you connect them to your own life. Tell me a topic you care about and I'll suggest vocabulary for it.",
    "Great idea to grow your vocabulary! Pick a word you learned recently and try using it in a sentence for me.",
];

const PRONUNCIATION_TEMPLATES: &[&str] = &[
    "Pronunciation is so important! Here's a tip: practice with tongue twisters and minimal pairs like 'ship' and 'sheep'. Record yourself speaking and listen back. What sounds would you like to practice?",
    "Clear pronunciation comes from slow, deliberate practice. Which words or sounds feel hardest for you right now?",
    "Let's work on pronunciation! Breaking words into syllables and stressing the right one makes a huge difference. Give me a word you find tricky.",
];

const BUSINESS_TEMPLATES: &[&str] = &[
    "Work conversations are great practice! Professional English uses specific vocabulary. Try describing your typical workday or dream job. What kind of work do you do or want to do?",
    "Business English is all about clarity and politeness. Shall we practice introducing yourself in a meeting or writing a short professional email?",
    "Workplace English opens doors! Let's role-play a work scenario - an interview, a meeting, or a negotiation. Which would you like?",
];

const CONVERSATION_TEMPLATES: &[&str] = &[
    "Conversation practice is the best way to improve! Let's have a natural chat. Don't worry about perfect grammar - communication comes first! What's something interesting that happened to you recently?",
    "Speaking regularly builds real fluency. Let's just talk! Tell me about your day, in as much detail as you can.",
    "I love a good conversation! Pick any topic you enjoy and let's keep the discussion going as long as we can.",
];

const FOOD_TEMPLATES: &[&str] = &[
    "Food is a delicious topic! Practice with cooking verbs like chop, boil, and fry, and taste adjectives like savory, spicy, and tender. What's your favorite dish? Can you describe how to make it?",
    "Talking about food is tasty practice! Describe the last meal you really enjoyed - the flavors, the textures, everything.",
    "Let's talk food! Ordering in a restaurant is a classic practice scenario. Try ordering your favorite meal from me.",
];

const TRAVEL_TEMPLATES: &[&str] = &[
    "Travel stories are perfect for practice! Use past tense to describe trips and future tense for plans. Descriptive language makes travel stories engaging. Where would you love to visit?",
    "I love travel talk! Tell me about a memorable trip - where you went, what you saw, and what surprised you.",
    "Travel English is so useful! Let's practice airport and hotel phrases, or you can describe your dream destination.",
];

const DEFAULT_TEMPLATES: &[&str] = &[
    "That's interesting! I'd love to hear more about that. Expanding on your thoughts is great practice - try adding more details, examples, or your personal opinions. What else can you tell me?",
    "Tell me more! The more you write or say, the more practice you get. Can you add a few more sentences about this?",
    "Good topic! Let's explore it together. What's your personal experience with this, and how do you feel about it?",
];

const ENCOURAGEMENTS: &[&str] = &[
    " Excellent progress!",
    " You're getting the hang of it!",
    " Nice improvement - keep it up!",
    " Well done, your English is growing every day!",
];

pub fn templates_for(bucket: TopicBucket) -> &'static [&'static str] {
    match bucket {
        TopicBucket::Grammar => GRAMMAR_TEMPLATES,
        TopicBucket::Vocabulary => VOCABULARY_TEMPLATES,
        TopicBucket::Pronunciation => PRONUNCIATION_TEMPLATES,
        TopicBucket::Business => BUSINESS_TEMPLATES,
        TopicBucket::ConversationPractice => CONVERSATION_TEMPLATES,
        TopicBucket::Food => FOOD_TEMPLATES,
        TopicBucket::Travel => TRAVEL_TEMPLATES,
        TopicBucket::Default => DEFAULT_TEMPLATES,
    }
}

/// Classify a user message into a topic bucket. Order-sensitive: the first
/// matching keyword set in the cascade decides.
pub fn classify(message: &str) -> TopicBucket {
    let lower = message.to_lowercase();
    for (bucket, keywords) in KEYWORD_CASCADE {
        if keywords.iter().any(|kw| lower.contains(kw)) {
            return *bucket;
        }
    }
    TopicBucket::Default
}

/// Serialize a transcript into the prompt text used for token accounting,
/// with the tutor system prompt inserted first.
pub fn format_transcript(messages: &[ChatMessage]) -> String {
    let mut lines = vec![format!("System: {TUTOR_SYSTEM_PROMPT}")];
    for msg in messages {
        let prefix = match msg.role {
            Role::System => "System",
            Role::User => "Human",
            Role::Assistant => "Assistant",
        };
        lines.push(format!("{prefix}: {}", msg.content));
    }
    lines.join("\n") + "\nAssistant:"
}

/// Generate a tutoring response for the transcript. Deterministic for
/// `temperature <= 0.7`; higher temperatures pick a pseudo-random template
/// and append an encouragement.
pub fn generate(messages: &[ChatMessage], temperature: f32) -> String {
    let last_user = messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.as_str());

    let Some(user_message) = last_user else {
        return GREETING.to_string();
    };

    let pool = templates_for(classify(user_message));
    if temperature > CREATIVE_TEMPERATURE {
        let template = pool[rand::random_range(0..pool.len())];
        let suffix = ENCOURAGEMENTS[rand::random_range(0..ENCOURAGEMENTS.len())];
        format!("{template}{suffix}")
    } else {
        pool[0].to_string()
    }
}

// ============= Conversation starters =============

const STARTER_TOPIC_ADDITIONS: &[(&str, &str)] = &[
    ("travel", " I'd love to hear about your travel experiences or dream destinations!"),
    ("food", " Perhaps we could discuss your favorite cuisines or cooking experiences?"),
    ("work", " We could talk about your professional experiences or career aspirations."),
    ("hobbies", " Tell me about your favorite pastimes and interests!"),
];

/// Pick an opening line for a new conversation, keyed by context and level.
pub fn conversation_starter(context: &str, level: &str, topic: Option<&str>) -> String {
    let base = match (context, level) {
        ("grammar", "beginner") => "Let's practice grammar together! What grammar topic would you like to work on?",
        ("grammar", _) => "Ready to tackle some grammar practice? Which aspect of English grammar interests you most?",
        ("vocabulary", "beginner") => "Time to learn new words! What kind of words would you like to practice today?",
        ("vocabulary", _) => "Let's expand your vocabulary! Are there any specific areas or themes you'd like to focus on?",
        (_, "beginner") => "Hi! I'm excited to help you practice English today. What would you like to talk about?",
        (_, "advanced") => "Greetings! I'm delighted to engage in some stimulating English conversation with you. What topic interests you today?",
        _ => "Hello! I'm here to help you improve your English through conversation. What's on your mind today?",
    };

    let mut starter = base.to_string();
    if let Some(topic) = topic {
        let topic_lower = topic.to_lowercase();
        if let Some((_, addition)) = STARTER_TOPIC_ADDITIONS
            .iter()
            .find(|(name, _)| *name == topic_lower)
        {
            starter.push_str(addition);
        }
    }
    starter
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocols::Role;

    fn user(content: &str) -> ChatMessage {
        ChatMessage {
            role: Role::User,
            content: content.to_string(),
            name: None,
        }
    }

    #[test]
    fn no_user_message_returns_greeting() {
        let messages = [ChatMessage {
            role: Role::System,
            content: "be nice".to_string(),
            name: None,
        }];
        assert_eq!(generate(&messages, 0.7), GREETING);
    }

    #[test]
    fn grammar_checked_before_vocabulary() {
        // Contains keywords from both buckets; the cascade order decides.
        assert_eq!(
            classify("my grammar and vocabulary are weak"),
            TopicBucket::Grammar
        );
    }

    #[test]
    fn cascade_covers_every_bucket() {
        assert_eq!(classify("fix my mistake please"), TopicBucket::Grammar);
        assert_eq!(classify("what's the meaning of this?"), TopicBucket::Vocabulary);
        assert_eq!(classify("how do I pronounce this"), TopicBucket::Pronunciation);
        assert_eq!(classify("english for my office job"), TopicBucket::Business);
        assert_eq!(classify("let's talk about something"), TopicBucket::ConversationPractice);
        assert_eq!(classify("I love cooking pasta"), TopicBucket::Food);
        assert_eq!(classify("my vacation plans"), TopicBucket::Travel);
        assert_eq!(classify("quantum physics"), TopicBucket::Default);
    }

    #[test]
    fn classification_is_case_insensitive() {
        assert_eq!(classify("GRAMMAR HELP"), TopicBucket::Grammar);
    }

    #[test]
    fn low_temperature_is_deterministic() {
        let messages = [user("Can you help with grammar mistakes?")];
        let first = generate(&messages, 0.7);
        for _ in 0..10 {
            assert_eq!(generate(&messages, 0.7), first);
        }
        assert_eq!(first, GRAMMAR_TEMPLATES[0]);
    }

    #[test]
    fn grammar_pool_mentions_grammar_practice() {
        assert!(GRAMMAR_TEMPLATES[0].contains("Grammar practice"));
    }

    #[test]
    fn high_temperature_draws_from_the_same_pool() {
        let messages = [user("help me with pronunciation")];
        for _ in 0..20 {
            let response = generate(&messages, 1.5);
            assert!(
                PRONUNCIATION_TEMPLATES.iter().any(|t| response.starts_with(t)),
                "unexpected response: {response}"
            );
            assert!(ENCOURAGEMENTS.iter().any(|e| response.ends_with(e)));
        }
    }

    #[test]
    fn transcript_format_includes_system_prompt_and_cue() {
        let messages = [user("hello")];
        let text = format_transcript(&messages);
        assert!(text.starts_with("System: "));
        assert!(text.contains("Human: hello"));
        assert!(text.ends_with("\nAssistant:"));
    }

    #[test]
    fn starter_honors_context_level_and_topic() {
        let s = conversation_starter("grammar", "beginner", None);
        assert!(s.contains("grammar"));
        let s = conversation_starter("general", "intermediate", Some("travel"));
        assert!(s.contains("travel experiences"));
        // Unknown topic adds nothing.
        let s = conversation_starter("general", "intermediate", Some("astrophysics"));
        assert!(s.ends_with("What's on your mind today?"));
    }
}
