//! Story outline and script types produced by the text generator.

use serde::{Deserialize, Serialize};

/// One chapter of the story outline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    /// Short chapter title.
    pub title: String,
    /// What happens in this chapter.
    pub description: String,
}

/// Story outline as returned by the story generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryOutline {
    /// Video title.
    pub title: String,
    /// One-line description for the video listing.
    pub description: String,
    /// The full story text.
    pub story: String,
    /// Chapter breakdown, in playback order.
    pub outline: Vec<Chapter>,
}

/// Narration scripts, one paragraph per audio clip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptsOutput {
    /// Narration paragraphs in playback order.
    pub scripts: Vec<String>,
}

impl ScriptsOutput {
    /// Full narration text joined into a single string.
    pub fn full_text(&self) -> String {
        self.scripts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_text_joins_paragraphs() {
        let scripts = ScriptsOutput {
            scripts: vec!["Long ago,".to_string(), "a vow was made.".to_string()],
        };
        assert_eq!(scripts.full_text(), "Long ago, a vow was made.");
    }

    #[test]
    fn test_outline_round_trip() {
        let outline = StoryOutline {
            title: "Bhishma's Vow".to_string(),
            description: "A prince renounces the throne".to_string(),
            story: "Long ago...".to_string(),
            outline: vec![Chapter {
                title: "The Oath".to_string(),
                description: "Devavrata swears celibacy".to_string(),
            }],
        };
        let json = serde_json::to_string(&outline).unwrap();
        let parsed: StoryOutline = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, outline);
    }
}
