use crate::sentiment::PolarityScorer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which label scale to apply to a compound score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisMode {
    /// Positive / Neutral / Negative
    #[default]
    Sentiment,
    /// Five-level scale from Very Good to Very Bad
    Emotion,
}

impl AnalysisMode {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "sentiment" | "sentiment analysis" => Some(AnalysisMode::Sentiment),
            "emotion" | "emotion analysis" => Some(AnalysisMode::Emotion),
            _ => None,
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisMode::Sentiment => write!(f, "Sentiment Analysis"),
            AnalysisMode::Emotion => write!(f, "Emotion Analysis"),
        }
    }
}

/// Discrete bucket assigned to a text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Label {
    Positive,
    Neutral,
    Negative,
    #[serde(rename = "Very Good")]
    VeryGood,
    Good,
    Bad,
    #[serde(rename = "Very Bad")]
    VeryBad,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Positive => "Positive",
            Label::Neutral => "Neutral",
            Label::Negative => "Negative",
            Label::VeryGood => "Very Good",
            Label::Good => "Good",
            Label::Bad => "Bad",
            Label::VeryBad => "Very Bad",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Three-way sentiment bucket: `c >= 0.05` Positive, `c <= -0.05` Negative
pub fn sentiment_label(compound: f64) -> Label {
    if compound >= 0.05 {
        Label::Positive
    } else if compound <= -0.05 {
        Label::Negative
    } else {
        Label::Neutral
    }
}

/// Five-way emotion bucket over half-open intervals
///
/// `[0.6, ∞)` Very Good, `[0.2, 0.6)` Good, `[-0.2, 0.2)` Neutral,
/// `[-0.6, -0.2)` Bad, everything below Very Bad.
pub fn emotion_label(compound: f64) -> Label {
    if compound >= 0.6 {
        Label::VeryGood
    } else if compound >= 0.2 {
        Label::Good
    } else if compound >= -0.2 {
        Label::Neutral
    } else if compound >= -0.6 {
        Label::Bad
    } else {
        Label::VeryBad
    }
}

pub fn label_for(compound: f64, mode: AnalysisMode) -> Label {
    match mode {
        AnalysisMode::Sentiment => sentiment_label(compound),
        AnalysisMode::Emotion => emotion_label(compound),
    }
}

/// Score one text and bucket it
pub fn classify<S: PolarityScorer + ?Sized>(scorer: &S, text: &str, mode: AnalysisMode) -> Label {
    label_for(scorer.compound(text), mode)
}

/// One classified text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub text: String,
    pub analysis: Label,
}

/// Classify every record independently, preserving order and length
pub fn analyze_batch<S, T>(scorer: &S, records: &[T], mode: AnalysisMode) -> Vec<AnalysisResult>
where
    S: PolarityScorer + ?Sized,
    T: AsRef<str>,
{
    records
        .iter()
        .map(|record| AnalysisResult {
            text: record.as_ref().to_string(),
            analysis: classify(scorer, record.as_ref(), mode),
        })
        .collect()
}
