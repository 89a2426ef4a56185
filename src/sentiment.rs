//! Lexicon-based polarity scoring
//!
//! A rule-based analyzer in the style of VADER: every token is looked up in a
//! word-valence lexicon, then nudged by boosters, capitalisation, negation,
//! "but" contrast and punctuation. The summed valence is squashed into a
//! compound score in [-1, 1].

use lazy_static::lazy_static;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

const B_INCR: f64 = 0.293;
const B_DECR: f64 = -0.293;
const C_INCR: f64 = 0.733;
const N_SCALAR: f64 = -0.74;
const NORMALIZE_ALPHA: f64 = 15.0;

lazy_static! {
    static ref DEFAULT_LEXICON: HashMap<String, f64> = parse_lexicon(include_str!("./data/lexicon.tsv"));
    static ref NEGATE: HashSet<&'static str> = [
        "aint", "arent", "cannot", "cant", "couldnt", "darent", "didnt", "doesnt",
        "ain't", "aren't", "can't", "couldn't", "daren't", "didn't", "doesn't",
        "dont", "hadnt", "hasnt", "havent", "isnt", "mightnt", "mustnt", "neither",
        "don't", "hadn't", "hasn't", "haven't", "isn't", "mightn't", "mustn't",
        "neednt", "needn't", "never", "none", "nope", "nor", "not", "nothing", "nowhere",
        "oughtnt", "shant", "shouldnt", "uhuh", "wasnt", "werent",
        "oughtn't", "shan't", "shouldn't", "uh-uh", "wasn't", "weren't",
        "without", "wont", "wouldnt", "won't", "wouldn't", "rarely", "seldom", "despite",
    ]
    .into_iter()
    .collect();
    static ref BOOSTERS: HashMap<&'static str, f64> = {
        let incr = [
            "absolutely", "amazingly", "awfully", "completely", "considerably", "decidedly",
            "deeply", "effing", "enormously", "entirely", "especially", "exceptionally",
            "extremely", "fabulously", "flipping", "fricking", "fully", "greatly", "hella",
            "highly", "hugely", "incredibly", "intensely", "majorly", "more", "most",
            "particularly", "purely", "quite", "really", "remarkably", "so", "substantially",
            "thoroughly", "totally", "tremendously", "uber", "unbelievably", "unusually",
            "utterly", "very",
        ];
        let decr = [
            "almost", "barely", "hardly", "kinda", "kindof", "kind-of", "less", "little",
            "marginally", "occasionally", "partly", "scarcely", "slightly", "somewhat",
            "sorta", "sortof", "sort-of",
        ];
        incr.into_iter()
            .map(|w| (w, B_INCR))
            .chain(decr.into_iter().map(|w| (w, B_DECR)))
            .collect()
    };
    /// Multi-word expressions whose valence replaces that of their words
    static ref SPECIAL_CASES: HashMap<&'static str, f64> = [
        ("the shit", 3.0),
        ("the bomb", 3.0),
        ("bad ass", 1.5),
        ("badass", 1.5),
        ("bus stop", 0.0),
        ("yeah right", -2.0),
        ("kiss of death", -1.5),
        ("to die for", 3.0),
        ("beating heart", 3.1),
        ("broken heart", -2.9),
    ]
    .into_iter()
    .collect();
    static ref BOOSTER_PHRASES: HashMap<&'static str, f64> =
        [("kind of", B_DECR), ("sort of", B_DECR)].into_iter().collect();
}

fn parse_lexicon(source: &str) -> HashMap<String, f64> {
    source
        .lines()
        .filter(|line| !line.trim().is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let mut parts = line.split('\t');
            let word = parts.next()?.trim();
            let valence = parts.next()?.trim().parse::<f64>().ok()?;
            Some((word.to_lowercase(), valence))
        })
        .collect()
}

/// Scores produced for one text
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Default)]
pub struct PolarityScores {
    pub neg: f64,
    pub neu: f64,
    pub pos: f64,
    /// Normalised overall polarity in [-1, 1]
    pub compound: f64,
}

/// Anything that can turn text into polarity scores
pub trait PolarityScorer {
    fn polarity_scores(&self, text: &str) -> PolarityScores;

    fn compound(&self, text: &str) -> f64 {
        self.polarity_scores(text).compound
    }
}

/// Rule-based scorer over a word-valence lexicon
#[derive(Debug, Clone)]
pub struct LexiconScorer {
    lexicon: HashMap<String, f64>,
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl LexiconScorer {
    /// Create a scorer backed by the bundled lexicon
    pub fn new() -> Self {
        Self {
            lexicon: DEFAULT_LEXICON.clone(),
        }
    }

    /// Add or replace a word's valence (clamped to -4..4)
    pub fn with_word(mut self, word: &str, valence: f64) -> Self {
        self.lexicon
            .insert(word.to_lowercase(), valence.clamp(-4.0, 4.0));
        self
    }

    pub fn lexicon_size(&self) -> usize {
        self.lexicon.len()
    }

    pub fn valence(&self, word: &str) -> Option<f64> {
        self.lexicon.get(&word.to_lowercase()).copied()
    }

    fn word_valence(&self, words: &[&str], lower: &[String], i: usize, is_cap_diff: bool) -> f64 {
        let Some(mut valence) = self.lexicon.get(&lower[i]).copied() else {
            return 0.0;
        };

        // "no" before a sentiment word only negates it
        if lower[i] == "no" && lower.get(i + 1).is_some_and(|next| self.lexicon.contains_key(next)) {
            valence = 0.0;
        }
        let no_before = (i > 0 && lower[i - 1] == "no")
            || (i > 1 && lower[i - 2] == "no")
            || (i > 2 && lower[i - 3] == "no" && (lower[i - 1] == "or" || lower[i - 1] == "nor"));
        if no_before {
            valence *= N_SCALAR;
        }

        if is_all_caps(words[i]) && is_cap_diff {
            valence += if valence > 0.0 { C_INCR } else { -C_INCR };
        }

        for start_i in 0..3 {
            if i <= start_i {
                break;
            }
            let prev = i - (start_i + 1);
            if self.lexicon.contains_key(&lower[prev]) {
                continue;
            }

            let mut scalar = booster_scalar(words[prev], &lower[prev], valence, is_cap_diff);
            if start_i == 1 {
                scalar *= 0.95;
            } else if start_i == 2 {
                scalar *= 0.9;
            }
            valence += scalar;
            valence = negation_check(valence, lower, start_i, i);
            if start_i == 2 {
                valence = special_idioms_check(valence, lower, i);
            }
        }

        least_check(valence, lower, i, &self.lexicon)
    }
}

impl PolarityScorer for LexiconScorer {
    fn polarity_scores(&self, text: &str) -> PolarityScores {
        let words = tokenize(text);
        if words.is_empty() {
            return PolarityScores::default();
        }

        let lower: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
        let is_cap_diff = allcap_differential(&words);

        let mut sentiments = Vec::with_capacity(words.len());
        for i in 0..words.len() {
            if BOOSTERS.contains_key(lower[i].as_str()) {
                sentiments.push(0.0);
                continue;
            }
            if lower[i] == "kind" && lower.get(i + 1).is_some_and(|next| next == "of") {
                sentiments.push(0.0);
                continue;
            }
            sentiments.push(self.word_valence(&words, &lower, i, is_cap_diff));
        }

        but_check(&lower, &mut sentiments);
        score_valence(&sentiments, text)
    }
}

/// Split on whitespace, strip edge punctuation from words, drop single characters
fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .map(|token| {
            let stripped = token.trim_matches(|c: char| c.is_ascii_punctuation());
            // Short tokens keep their punctuation so emoticons survive
            if stripped.chars().count() <= 2 {
                token
            } else {
                stripped
            }
        })
        .filter(|token| token.chars().count() > 1)
        .collect()
}

fn is_all_caps(word: &str) -> bool {
    word.chars().any(|c| c.is_uppercase()) && !word.chars().any(|c| c.is_lowercase())
}

/// True when some, but not all, words are shouted
fn allcap_differential(words: &[&str]) -> bool {
    let caps = words.iter().filter(|w| is_all_caps(w)).count();
    caps > 0 && caps < words.len()
}

fn booster_scalar(word: &str, lower: &str, valence: f64, is_cap_diff: bool) -> f64 {
    let Some(&base) = BOOSTERS.get(lower) else {
        return 0.0;
    };

    let mut scalar = if valence < 0.0 { -base } else { base };
    if is_all_caps(word) && is_cap_diff {
        scalar += if valence > 0.0 { C_INCR } else { -C_INCR };
    }
    scalar
}

fn is_negated(word: &str) -> bool {
    NEGATE.contains(word) || word.contains("n't")
}

fn negation_check(valence: f64, lower: &[String], start_i: usize, i: usize) -> f64 {
    let so_this = |w: &str| w == "so" || w == "this";
    match start_i {
        0 if is_negated(&lower[i - 1]) => valence * N_SCALAR,
        1 => {
            if lower[i - 2] == "never" && so_this(&lower[i - 1]) {
                valence * 1.25
            } else if lower[i - 2] == "without" && lower[i - 1] == "doubt" {
                valence
            } else if is_negated(&lower[i - 2]) {
                valence * N_SCALAR
            } else {
                valence
            }
        }
        2 => {
            if lower[i - 3] == "never" && (so_this(&lower[i - 2]) || so_this(&lower[i - 1])) {
                valence * 1.25
            } else if lower[i - 3] == "without" && (lower[i - 2] == "doubt" || lower[i - 1] == "doubt") {
                valence
            } else if is_negated(&lower[i - 3]) {
                valence * N_SCALAR
            } else {
                valence
            }
        }
        _ => valence,
    }
}

/// Override the valence when the word is part of a known expression
///
/// Only called with `i >= 3`.
fn special_idioms_check(mut valence: f64, lower: &[String], i: usize) -> f64 {
    let one_zero = format!("{} {}", lower[i - 1], lower[i]);
    let two_one_zero = format!("{} {} {}", lower[i - 2], lower[i - 1], lower[i]);
    let two_one = format!("{} {}", lower[i - 2], lower[i - 1]);
    let three_two_one = format!("{} {} {}", lower[i - 3], lower[i - 2], lower[i - 1]);
    let three_two = format!("{} {}", lower[i - 3], lower[i - 2]);

    if let Some(&special) = [&one_zero, &two_one_zero, &two_one, &three_two_one, &three_two]
        .into_iter()
        .find_map(|seq| SPECIAL_CASES.get(seq.as_str()))
    {
        valence = special;
    }
    if let Some(next) = lower.get(i + 1) {
        if let Some(&special) = SPECIAL_CASES.get(format!("{} {}", lower[i], next).as_str()) {
            valence = special;
        }
    }
    if let (Some(next), Some(after)) = (lower.get(i + 1), lower.get(i + 2)) {
        if let Some(&special) = SPECIAL_CASES.get(format!("{} {} {}", lower[i], next, after).as_str()) {
            valence = special;
        }
    }

    for phrase in [&three_two_one, &three_two, &two_one] {
        if let Some(&scalar) = BOOSTER_PHRASES.get(phrase.as_str()) {
            valence += scalar;
        }
    }
    valence
}

/// "least" flips polarity unless it reads "at least" or "very least"
fn least_check(valence: f64, lower: &[String], i: usize, lexicon: &HashMap<String, f64>) -> f64 {
    if i == 0 || lower[i - 1] != "least" || lexicon.contains_key(&lower[i - 1]) {
        return valence;
    }
    if i > 1 && (lower[i - 2] == "at" || lower[i - 2] == "very") {
        return valence;
    }
    valence * N_SCALAR
}

fn but_check(lower: &[String], sentiments: &mut [f64]) {
    let Some(bi) = lower.iter().position(|w| w == "but") else {
        return;
    };
    for (idx, sentiment) in sentiments.iter_mut().enumerate() {
        if idx < bi {
            *sentiment *= 0.5;
        } else if idx > bi {
            *sentiment *= 1.5;
        }
    }
}

fn punctuation_emphasis(text: &str) -> f64 {
    let exclamations = text.matches('!').count().min(4) as f64 * 0.292;
    let questions = text.matches('?').count();
    let question_amp = match questions {
        0 | 1 => 0.0,
        2..=3 => questions as f64 * 0.18,
        _ => 0.96,
    };
    exclamations + question_amp
}

fn normalize(score: f64) -> f64 {
    (score / (score * score + NORMALIZE_ALPHA).sqrt()).clamp(-1.0, 1.0)
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn score_valence(sentiments: &[f64], text: &str) -> PolarityScores {
    let amp = punctuation_emphasis(text);

    let mut sum: f64 = sentiments.iter().sum();
    if sum > 0.0 {
        sum += amp;
    } else if sum < 0.0 {
        sum -= amp;
    }
    let compound = normalize(sum);

    let mut pos_sum = 0.0;
    let mut neg_sum = 0.0;
    let mut neu_count = 0.0;
    for &s in sentiments {
        if s > 0.0 {
            pos_sum += s + 1.0;
        } else if s < 0.0 {
            neg_sum += s - 1.0;
        } else {
            neu_count += 1.0;
        }
    }
    if pos_sum > neg_sum.abs() {
        pos_sum += amp;
    } else if pos_sum < neg_sum.abs() {
        neg_sum -= amp;
    }

    let total = pos_sum + neg_sum.abs() + neu_count;
    if total == 0.0 {
        return PolarityScores::default();
    }

    PolarityScores {
        neg: round_to((neg_sum / total).abs(), 3),
        neu: round_to((neu_count / total).abs(), 3),
        pos: round_to((pos_sum / total).abs(), 3),
        compound: round_to(compound, 4),
    }
}
