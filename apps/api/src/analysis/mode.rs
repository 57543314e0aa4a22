use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Selects the prompt template sent to the AI service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    #[default]
    #[serde(alias = "review")]
    Comprehensive,
    #[serde(alias = "improve")]
    SkillGap,
    Keywords,
    #[serde(alias = "match")]
    MatchPercentage,
}

impl AnalysisMode {
    pub const ALL: [AnalysisMode; 4] = [
        AnalysisMode::Comprehensive,
        AnalysisMode::SkillGap,
        AnalysisMode::Keywords,
        AnalysisMode::MatchPercentage,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AnalysisMode::Comprehensive => "Comprehensive Review",
            AnalysisMode::SkillGap => "Skill Gap Analysis",
            AnalysisMode::Keywords => "Keyword Analysis",
            AnalysisMode::MatchPercentage => "Match Percentage",
        }
    }

    /// Whether the template asks for matched/missing keyword sections.
    pub fn requests_keyword_lists(self) -> bool {
        !matches!(self, AnalysisMode::MatchPercentage)
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How much detail the analysis should go into.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisDepth {
    #[serde(alias = "quick_scan")]
    Quick,
    #[default]
    Standard,
    DetailedTechnical,
}

impl AnalysisDepth {
    pub fn instruction(self) -> Option<&'static str> {
        match self {
            AnalysisDepth::Quick => Some(
                "Keep the analysis brief: at most three bullets per section, no preamble.",
            ),
            AnalysisDepth::Standard => None,
            AnalysisDepth::DetailedTechnical => Some(
                "Go into technical depth: name specific languages, frameworks, tools and \
                 versions, and explain how each relates to the responsibilities in the job.",
            ),
        }
    }
}

/// Error for a form value that names no known variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown option '{}'", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

/// Parses multipart form values through the same names serde accepts.
fn parse_form_value<T: DeserializeOwned>(value: &str) -> Result<T, UnknownVariant> {
    let normalized = value.trim().to_lowercase().replace([' ', '-'], "_");
    serde_json::from_value(serde_json::Value::String(normalized))
        .map_err(|_| UnknownVariant(value.trim().to_string()))
}

impl FromStr for AnalysisMode {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_form_value(s)
    }
}

impl FromStr for AnalysisDepth {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_form_value(s)
    }
}
