use serde::{Deserialize, Serialize};

const DEFAULT_PRICE: &str = "$12.95";
const STORE_URL: &str = "https://tabernerstudio.com/artwork";

/// A recommended artwork as returned by `/recommend`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Artwork {
    #[serde(default)]
    pub id: Option<String>,
    pub filename: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default, alias = "purchase_url")]
    pub product_url: Option<String>,
    #[serde(default)]
    pub attributes: ArtworkAttributes,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct ArtworkAttributes {
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub subject: Option<Subject>,
    #[serde(default)]
    pub width: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub dominant_colors: Option<Vec<String>>,
}

/// Older catalog entries store the subject as a bare string, newer ones carry
/// a classifier confidence.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Subject {
    Label(String),
    Classified { label: String, confidence: f64 },
}

impl Subject {
    pub fn label(&self) -> &str {
        match self {
            Subject::Label(label) => label,
            Subject::Classified { label, .. } => label,
        }
    }
}

impl Artwork {
    pub fn stem(&self) -> &str {
        match self.filename.rfind('.') {
            Some(dot) if dot > 0 => &self.filename[..dot],
            _ => &self.filename,
        }
    }

    pub fn display_title(&self) -> String {
        if let Some(title) = self.title.as_deref().filter(|t| !t.trim().is_empty()) {
            return title.trim().to_owned();
        }
        let mut title = String::with_capacity(self.filename.len() + 8);
        for c in self.stem().chars() {
            match c {
                '_' => title.push(' '),
                c if c.is_ascii_uppercase() => {
                    title.push(' ');
                    title.push(c);
                }
                c => title.push(c),
            }
        }
        title.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    pub fn display_description(&self) -> String {
        match self.description.as_deref() {
            Some(description) if !description.is_empty() => description.to_owned(),
            _ => format!(
                "Beautiful {} artwork that will enhance your space. This piece features stunning composition and high-quality printing.",
                self.display_title().to_lowercase()
            ),
        }
    }

    pub fn display_price(&self) -> String {
        let price = self.price.as_deref().unwrap_or(DEFAULT_PRICE);
        format!("Starting at {price}")
    }

    pub fn purchase_url(&self) -> String {
        match self.product_url.as_deref() {
            Some(url) if !url.is_empty() => url.to_owned(),
            _ => format!("{STORE_URL}/{}", self.stem()),
        }
    }

    /// Catalog aspect ratio, if the attributes carry physical dimensions.
    pub fn catalog_aspect_ratio(&self) -> Option<f32> {
        match (self.attributes.width, self.attributes.height) {
            (Some(w), Some(h)) if w > 0.0 && h > 0.0 => Some((w / h) as f32),
            _ => None,
        }
    }
}

/// Preference form values, kept around for the "refine search" flow.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Preferences {
    pub style: String,
    pub mood: String,
    pub subject: String,
    pub color: String,
}

/// Body of `POST /recommend`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RecommendationRequest {
    Upload {
        #[serde(rename = "roomImage")]
        room_image: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        style: Option<String>,
    },
    Preferences { preferences: Preferences },
}

impl RecommendationRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            RecommendationRequest::Upload { .. } => "upload",
            RecommendationRequest::Preferences { .. } => "preferences",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RecommendationResponse {
    #[serde(default)]
    pub recommendations: Vec<Artwork>,
}

/// Error body the backend sends alongside non-2xx statuses.
#[derive(Clone, Debug, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Choices for the preference selects. The backend may only know about a
/// subset, missing lists are filled from built-in defaults.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct PreferencesOptions {
    #[serde(default)]
    pub moods: Vec<String>,
    #[serde(default)]
    pub styles: Vec<String>,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub colors: Vec<String>,
}

impl PreferencesOptions {
    pub fn builtin() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect();
        Self {
            moods: owned(&["calm", "energetic", "cozy", "dramatic", "playful"]),
            styles: owned(&["abstract", "modern", "minimalist", "vintage", "photography"]),
            subjects: owned(&["landscape", "nature", "urban", "animals", "people"]),
            colors: owned(&["neutral", "warm", "cool", "vibrant", "monochrome"]),
        }
    }

    pub fn with_fallbacks(mut self) -> Self {
        let builtin = Self::builtin();
        if self.moods.is_empty() {
            self.moods = builtin.moods;
        }
        if self.styles.is_empty() {
            self.styles = builtin.styles;
        }
        if self.subjects.is_empty() {
            self.subjects = builtin.subjects;
        }
        if self.colors.is_empty() {
            self.colors = builtin.colors;
        }
        self
    }
}
