use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Marker for a conditional flag that is set. Serializes as `1`; an unset
/// flag is represented by the field being absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Flagged;

impl Serialize for Flagged {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(1)
    }
}

impl<'de> Deserialize<'de> for Flagged {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match u8::deserialize(deserializer)? {
            1 => Ok(Flagged),
            other => Err(de::Error::custom(format!(
                "conditional flag must be 1 when present, got {other}"
            ))),
        }
    }
}

/// Per-category 0/1 classification flags for one content item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelVector {
    #[serde(with = "binary_flag")]
    pub keyword_spam: bool,
    #[serde(with = "binary_flag")]
    pub malicious_links: bool,
    #[serde(with = "binary_flag")]
    pub ads: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrong_language: Option<Flagged>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unreadable: Option<Flagged>,
}

impl LabelVector {
    pub fn is_wrong_language(&self) -> bool {
        self.wrong_language.is_some()
    }

    pub fn is_unreadable(&self) -> bool {
        self.unreadable.is_some()
    }

    /// True when language mismatch or unreadability supersedes the content flags.
    pub fn has_override(&self) -> bool {
        self.is_wrong_language() || self.is_unreadable()
    }

    pub fn any_content_flag(&self) -> bool {
        self.keyword_spam || self.malicious_links || self.ads
    }

    pub fn clear_content_flags(&mut self) {
        self.keyword_spam = false;
        self.malicious_links = false;
        self.ads = false;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub uid: String,
    pub content: String,
    #[serde(with = "binary_flag")]
    pub labels_spam: bool,
    pub labels_spam_vector: LabelVector,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<u8>,
}

impl ClassificationResult {
    /// The deterministic record substituted when classification could not be completed.
    pub fn safe_default(uid: &str, content: &str, with_confidence: bool) -> Self {
        Self {
            uid: uid.to_string(),
            content: content.to_string(),
            labels_spam: false,
            labels_spam_vector: LabelVector::default(),
            confidence_score: with_confidence.then_some(1),
        }
    }

    pub fn flag(&self, category: Category) -> bool {
        let labels = &self.labels_spam_vector;
        match category {
            Category::KeywordSpam => labels.keyword_spam,
            Category::MaliciousLinks => labels.malicious_links,
            Category::Ads => labels.ads,
            Category::WrongLanguage => labels.is_wrong_language(),
            Category::Unreadable => labels.is_unreadable(),
            Category::LabelsSpam => self.labels_spam,
        }
    }
}

/// Scored categories: the five label flags plus the overall spam verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    KeywordSpam,
    MaliciousLinks,
    Ads,
    WrongLanguage,
    Unreadable,
    LabelsSpam,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::KeywordSpam,
        Category::MaliciousLinks,
        Category::Ads,
        Category::WrongLanguage,
        Category::Unreadable,
        Category::LabelsSpam,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::KeywordSpam => "keyword_spam",
            Category::MaliciousLinks => "malicious_links",
            Category::Ads => "ads",
            Category::WrongLanguage => "wrong_language",
            Category::Unreadable => "unreadable",
            Category::LabelsSpam => "labels_spam",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serializes a `bool` as the integers `0`/`1`.
mod binary_flag {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match u8::deserialize(deserializer)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(de::Error::custom(format!("flag must be 0 or 1, got {other}"))),
        }
    }
}
