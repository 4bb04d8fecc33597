//! Rule-based English noun lemmatizer.
//!
//! Follows WordNet's morphological detachment rules for nouns, backed by an
//! irregular-plural table. There is no full dictionary, so a few guards keep
//! common uninflected endings (`-ss`, `-us`, `-is`) intact, and the `-ses` /
//! `-zes` rules only fire for stems in a short list of sibilant singulars.

use std::collections::HashMap;

/// Irregular plurals and words the suffix rules would get wrong.
const EXCEPTIONS: &[(&str, &str)] = &[
    ("children", "child"),
    ("people", "person"),
    ("men", "man"),
    ("women", "woman"),
    ("mice", "mouse"),
    ("lice", "louse"),
    ("geese", "goose"),
    ("teeth", "tooth"),
    ("feet", "foot"),
    ("oxen", "ox"),
    ("dice", "die"),
    ("leaves", "leaf"),
    ("loaves", "loaf"),
    ("wolves", "wolf"),
    ("calves", "calf"),
    ("halves", "half"),
    ("shelves", "shelf"),
    ("knives", "knife"),
    ("wives", "wife"),
    ("lives", "life"),
    ("thieves", "thief"),
    ("scarves", "scarf"),
    ("cacti", "cactus"),
    ("fungi", "fungus"),
    ("octopi", "octopus"),
    ("bacteria", "bacterium"),
    ("criteria", "criterion"),
    ("phenomena", "phenomenon"),
    ("movies", "movie"),
    ("cookies", "cookie"),
    ("pies", "pie"),
    ("ties", "tie"),
    ("lies", "lie"),
    ("headaches", "headache"),
    ("moustaches", "moustache"),
    ("mustaches", "mustache"),
    ("avalanches", "avalanche"),
    ("niches", "niche"),
    ("axes", "axe"),
    ("quizzes", "quiz"),
    ("tomatoes", "tomato"),
    ("potatoes", "potato"),
    ("heroes", "hero"),
    ("echoes", "echo"),
    ("mangoes", "mango"),
    ("volcanoes", "volcano"),
    ("mosquitoes", "mosquito"),
    ("torpedoes", "torpedo"),
    ("dominoes", "domino"),
    ("buffaloes", "buffalo"),
];

/// Words that are identical in singular and plural, or never plural.
const UNINFLECTED: &[&str] = &[
    "news", "series", "species", "sheep", "deer", "fish", "aircraft", "bison", "moose",
    "salmon", "trout", "swine", "scissors", "pants", "jeans", "trousers", "shorts",
    "physics", "mathematics", "athletics", "gymnastics", "electronics", "graphics", "yes",
    "this", "his", "as",
];

/// Singulars ending in "s" or "z" whose plural adds "es". Stands in for the
/// dictionary check that decides between "-ses"/"-zes" and a bare "-s".
const SIBILANT_SINGULARS: &[&str] = &[
    "lens", "bus", "gas", "bonus", "campus", "virus", "circus", "walrus", "octopus",
    "chorus", "census", "canvas", "atlas", "iris", "fez", "quiz", "waltz", "topaz", "blitz",
];

/// Nouns ending in "men" that are not plurals of "man".
const MEN_SINGULARS: &[&str] = &[
    "specimen", "omen", "amen", "abdomen", "semen", "stamen", "hymen", "regimen", "acumen",
    "albumen", "bitumen", "lumen",
];

/// Plural suffix → singular suffix, longest first.
const SUFFIX_RULES: &[(&str, &str)] = &[
    ("sses", "ss"),
    ("shes", "sh"),
    ("ches", "ch"),
    ("ses", "s"),
    ("zes", "z"),
    ("xes", "x"),
    ("ies", "y"),
    ("men", "man"),
    ("s", ""),
];

/// Reduces nouns to their dictionary base form.
#[derive(Debug, Clone)]
pub struct Lemmatizer {
    exceptions: HashMap<&'static str, &'static str>,
}

impl Default for Lemmatizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Lemmatizer {
    pub fn new() -> Self {
        Self {
            exceptions: EXCEPTIONS.iter().copied().collect(),
        }
    }

    /// Lemmatize a (lowercase) string as one unit.
    ///
    /// Inflection lives at the end of a noun phrase, so only the final
    /// whitespace-separated word is reduced: "domestic animals" becomes
    /// "domestic animal". Leading text and spacing are kept as-is.
    pub fn lemmatize(&self, text: &str) -> String {
        let trimmed = text.trim_end();
        let split_at = trimmed
            .rfind(char::is_whitespace)
            .map(|i| i + trimmed[i..].chars().next().map_or(1, char::len_utf8))
            .unwrap_or(0);
        let (head, last) = trimmed.split_at(split_at);
        let mut out = String::with_capacity(trimmed.len());
        out.push_str(head);
        out.push_str(&self.lemmatize_word(last));
        out
    }

    /// Lemmatize a single word.
    pub fn lemmatize_word(&self, word: &str) -> String {
        if let Some(base) = self.exceptions.get(word) {
            return (*base).to_string();
        }
        if word.chars().count() <= 3
            || UNINFLECTED.contains(&word)
            || SIBILANT_SINGULARS.contains(&word)
        {
            return word.to_string();
        }
        if word.ends_with("men") && MEN_SINGULARS.contains(&word) {
            return word.to_string();
        }
        for (suffix, replacement) in SUFFIX_RULES {
            let Some(stem) = word.strip_suffix(suffix) else {
                continue;
            };
            if stem.is_empty() {
                return word.to_string();
            }
            let base = format!("{stem}{replacement}");
            match *suffix {
                // "horses" falls through to the bare "-s" rule
                "ses" | "zes" if !SIBILANT_SINGULARS.contains(&base.as_str()) => continue,
                "s" if !Self::is_plain_plural(word) => return word.to_string(),
                _ => return base,
            }
        }
        word.to_string()
    }

    /// Whether a word ending in a bare "s" looks like a regular plural.
    fn is_plain_plural(word: &str) -> bool {
        !(word.ends_with("ss")
            || word.ends_with("us")
            || word.ends_with("is")
            || word.ends_with("ics"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lemma(s: &str) -> String {
        Lemmatizer::new().lemmatize(s)
    }

    #[test]
    fn test_regular_plurals() {
        assert_eq!(lemma("animals"), "animal");
        assert_eq!(lemma("airplanes"), "airplane");
        assert_eq!(lemma("horses"), "horse");
        assert_eq!(lemma("dogs"), "dog");
    }

    #[test]
    fn test_sibilant_plurals() {
        assert_eq!(lemma("glasses"), "glass");
        assert_eq!(lemma("classes"), "class");
        assert_eq!(lemma("boxes"), "box");
        assert_eq!(lemma("churches"), "church");
        assert_eq!(lemma("brushes"), "brush");
    }

    #[test]
    fn test_ses_zes_only_for_sibilant_stems() {
        assert_eq!(lemma("lenses"), "lens");
        assert_eq!(lemma("buses"), "bus");
        assert_eq!(lemma("viruses"), "virus");
        assert_eq!(lemma("topazes"), "topaz");
        assert_eq!(lemma("houses"), "house");
        assert_eq!(lemma("horses"), "horse");
        assert_eq!(lemma("prizes"), "prize");
        assert_eq!(lemma("lens"), "lens");
    }

    #[test]
    fn test_oes_plurals() {
        assert_eq!(lemma("tomatoes"), "tomato");
        assert_eq!(lemma("potatoes"), "potato");
        assert_eq!(lemma("heroes"), "hero");
        assert_eq!(lemma("echoes"), "echo");
        assert_eq!(lemma("shoes"), "shoe");
    }

    #[test]
    fn test_ies_and_men() {
        assert_eq!(lemma("puppies"), "puppy");
        assert_eq!(lemma("butterflies"), "butterfly");
        assert_eq!(lemma("firemen"), "fireman");
        assert_eq!(lemma("specimen"), "specimen");
        assert_eq!(lemma("movies"), "movie");
    }

    #[test]
    fn test_irregular_plurals() {
        assert_eq!(lemma("children"), "child");
        assert_eq!(lemma("mice"), "mouse");
        assert_eq!(lemma("leaves"), "leaf");
        assert_eq!(lemma("people"), "person");
    }

    #[test]
    fn test_uninflected_words_untouched() {
        assert_eq!(lemma("grass"), "grass");
        assert_eq!(lemma("cactus"), "cactus");
        assert_eq!(lemma("analysis"), "analysis");
        assert_eq!(lemma("species"), "species");
        assert_eq!(lemma("bus"), "bus");
        assert_eq!(lemma("cat"), "cat");
    }

    #[test]
    fn test_phrase_reduces_last_word_only() {
        assert_eq!(lemma("domestic animals"), "domestic animal");
        assert_eq!(lemma("guinea pigs"), "guinea pig");
        assert_eq!(lemma("sports car"), "sports car");
    }

    #[test]
    fn test_non_ascii_is_safe() {
        assert_eq!(lemma("café chairs"), "café chair");
        assert_eq!(lemma("naïve"), "naïve");
    }
}
