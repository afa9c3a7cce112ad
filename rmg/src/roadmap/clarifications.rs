//! Clarification questions and answers
//!
//! Both are small ordered maps from slug-like keys to text. Order is kept so
//! prompts render deterministically and questions are asked in the order the
//! model proposed them.

use std::fmt;
use std::path::Path;

use eyre::{Context, Result};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

/// Ordered key -> text mapping
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clarifications {
    entries: Vec<(String, String)>,
}

/// Proposed questions, keyed by slug
pub type ClarificationQuestions = Clarifications;

/// User answers, keyed by the slug of the question they answer
pub type ClarificationAnswers = Clarifications;

impl Clarifications {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; a replaced key keeps its original position
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load a YAML (or JSON) mapping of key -> text
    ///
    /// An empty file is an empty mapping.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(?path, "Clarifications::from_file: called");
        let content =
            std::fs::read_to_string(path).context(format!("Failed to read answers file {}", path.display()))?;
        if content.trim().is_empty() {
            debug!("Clarifications::from_file: empty file");
            return Ok(Self::new());
        }
        serde_yaml::from_str(&content).context(format!("Failed to parse answers file {}", path.display()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Clarifications {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl IntoIterator for Clarifications {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for Clarifications {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Scalar values accepted as text; YAML answer files often hold bare numbers
#[derive(Deserialize)]
#[serde(untagged)]
enum TextValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<TextValue> for String {
    fn from(value: TextValue) -> Self {
        match value {
            TextValue::Text(s) => s,
            TextValue::Int(i) => i.to_string(),
            TextValue::Float(f) => f.to_string(),
            TextValue::Bool(b) => b.to_string(),
        }
    }
}

struct ClarificationsVisitor;

impl<'de> Visitor<'de> for ClarificationsVisitor {
    type Value = Clarifications;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a map of keys to text")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut map = Clarifications::new();
        while let Some((key, value)) = access.next_entry::<String, TextValue>()? {
            map.insert(key, value);
        }
        Ok(map)
    }
}

impl<'de> Deserialize<'de> for Clarifications {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ClarificationsVisitor)
    }
}

/// Keys of the fallback question set, in presentation order
pub const FALLBACK_QUESTION_KEYS: [&str; 10] = [
    "target_platform",
    "timeline",
    "team_size",
    "must_have_features",
    "tech_stack",
    "budget",
    "prior_experience",
    "deployment",
    "scaling",
    "integration",
];

/// The fixed questions used when the model's proposal cannot be parsed
pub fn fallback_questions() -> ClarificationQuestions {
    [
        (
            "target_platform",
            "Which platforms should the app run on (web, iOS, Android, desktop)?",
        ),
        ("timeline", "What is your target timeline for a first usable release?"),
        (
            "team_size",
            "How many people will work on the project, and in what roles?",
        ),
        (
            "must_have_features",
            "Which features are absolutely required for the first version?",
        ),
        (
            "tech_stack",
            "Do you have a preferred programming language, framework, or database?",
        ),
        (
            "budget",
            "What budget do you have for hosting, paid services, and third-party tools?",
        ),
        (
            "prior_experience",
            "How much experience do you have with the technologies this project needs?",
        ),
        (
            "deployment",
            "Where and how do you plan to deploy and host the app?",
        ),
        (
            "scaling",
            "How many users do you expect at launch, and how fast do you expect that to grow?",
        ),
        (
            "integration",
            "Does the app need to integrate with external services, APIs, or existing systems?",
        ),
    ]
    .into_iter()
    .collect()
}
