// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Query expansion: free text to full-text search terms.
//!
//! Latin-script words are lowercased and filtered. Runs of CJK, kana,
//! Hangul or Thai characters carry no word boundaries, so they expand into
//! unigrams, bigrams and the whole run.

use std::collections::HashSet;

/// Latin tokens shorter than this are dropped.
const MIN_LATIN_CHARS: usize = 3;

const ENGLISH_STOPWORDS: &[&str] = &[
    "about", "above", "after", "again", "against", "all", "also", "and", "any", "are", "because",
    "been", "before", "being", "below", "between", "both", "but", "can", "could", "did", "does",
    "doing", "down", "during", "each", "few", "for", "from", "further", "had", "has", "have",
    "having", "her", "here", "hers", "herself", "him", "himself", "his", "how", "into", "its",
    "itself", "just", "more", "most", "myself", "nor", "not", "now", "off", "once", "only",
    "other", "our", "ours", "ourselves", "out", "over", "own", "same", "she", "should", "some",
    "such", "than", "that", "the", "their", "theirs", "them", "themselves", "then", "there",
    "these", "they", "this", "those", "through", "too", "under", "until", "very", "was", "were",
    "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with", "would",
    "you", "your", "yours", "yourself", "yourselves",
];

const CJK_STOPWORDS: &[&str] = &[
    // Chinese
    "的", "了", "是", "在", "和", "也", "就", "都", "而", "及", "与", "着", "或", "把", "被",
    "吗", "呢", "吧", "啊", "这", "那", "我", "你", "他", "她", "它", "们", "一个", "我们",
    "你们", "他们", "什么", "没有", "这个", "那个",
    // Japanese
    "の", "に", "は", "を", "た", "が", "で", "て", "と", "し", "れ", "さ", "も", "な", "か",
    "だ", "へ", "や", "です", "ます", "する", "いる", "ある", "この", "その",
    // Korean
    "은", "는", "이", "가", "을", "를", "에", "의", "와", "과", "도", "로", "으로", "에서",
    // Thai
    "และ", "ที่", "ของ", "ใน", "เป็น", "ไม่", "ได้", "ให้", "มี", "การ", "ว่า", "จะ",
];

/// True for characters in the scripts expanded by n-grams.
fn is_ngram_script(c: char) -> bool {
    matches!(
        c,
        '\u{4E00}'..='\u{9FFF}'   // CJK Unified Ideographs
        | '\u{3400}'..='\u{4DBF}' // CJK Extension A
        | '\u{F900}'..='\u{FAFF}' // CJK Compatibility Ideographs
        | '\u{3040}'..='\u{309F}' // Hiragana
        | '\u{30A0}'..='\u{30FF}' // Katakana
        | '\u{AC00}'..='\u{D7AF}' // Hangul Syllables
        | '\u{0E00}'..='\u{0E7F}' // Thai
    )
}

fn is_token_char(c: char) -> bool {
    is_ngram_script(c) || c.is_alphanumeric()
}

/// Ordered set of search terms, first occurrence wins.
#[derive(Default)]
struct Terms {
    seen: HashSet<String>,
    ordered: Vec<String>,
}

impl Terms {
    fn push(&mut self, term: String) {
        if self.seen.insert(term.clone()) {
            self.ordered.push(term);
        }
    }
}

fn push_latin(run: &str, terms: &mut Terms) {
    let lower = run.to_lowercase();
    if lower.chars().count() < MIN_LATIN_CHARS
        || lower.chars().all(char::is_numeric)
        || ENGLISH_STOPWORDS.contains(&lower.as_str())
    {
        return;
    }
    terms.push(lower);
}

fn push_ngram_run(run: &str, terms: &mut Terms) {
    let chars: Vec<char> = run.chars().collect();
    for c in &chars {
        let unigram = c.to_string();
        if !CJK_STOPWORDS.contains(&unigram.as_str()) {
            terms.push(unigram);
        }
    }
    for pair in chars.windows(2) {
        terms.push(pair.iter().collect());
    }
    if chars.len() > 1 && !CJK_STOPWORDS.contains(&run) {
        terms.push(run.to_string());
    }
}

/// Expand a free-text query into ordered, deduplicated search terms.
pub fn extract_keywords(query: &str) -> Vec<String> {
    let mut terms = Terms::default();

    for token in query.split(|c: char| !is_token_char(c)).filter(|t| !t.is_empty()) {
        // Split mixed-script tokens into runs of the same kind.
        let mut run_start = 0;
        let mut run_is_ngram: Option<bool> = None;
        for (offset, c) in token.char_indices() {
            let ngram = is_ngram_script(c);
            match run_is_ngram {
                Some(current) if current != ngram => {
                    let run = &token[run_start..offset];
                    if current {
                        push_ngram_run(run, &mut terms);
                    } else {
                        push_latin(run, &mut terms);
                    }
                    run_start = offset;
                }
                _ => {}
            }
            run_is_ngram = Some(ngram);
        }
        let run = &token[run_start..];
        match run_is_ngram {
            Some(true) => push_ngram_run(run, &mut terms),
            Some(false) => push_latin(run, &mut terms),
            None => {}
        }
    }

    terms.ordered
}

/// Build an FTS5 MATCH expression: every term quoted, joined with `OR`.
///
/// Control characters are removed and terms left blank are dropped, so an
/// empty (or all-control) term list yields an empty string.
pub fn build_fts_query<S: AsRef<str>>(terms: &[S]) -> String {
    terms
        .iter()
        .map(|term| {
            term.as_ref()
                .chars()
                .filter(|c| !c.is_control())
                .collect::<String>()
        })
        .filter(|term| !term.trim().is_empty())
        .map(|term| format!("\"{}\"", term.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(" OR ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn latin_terms_are_lowercased_and_filtered() {
        let terms = extract_keywords("What is the Deployment checklist for 2024, ok?");
        assert_eq!(terms, vec!["deployment", "checklist"]);
    }

    #[test]
    fn duplicates_keep_first_position() {
        let terms = extract_keywords("Rust rust RUST compiler rust");
        assert_eq!(terms, vec!["rust", "compiler"]);
    }

    #[test]
    fn cjk_run_expands_to_ngrams_and_whole_run() {
        let terms = extract_keywords("数据库");
        assert_eq!(terms, vec!["数", "据", "库", "数据", "据库", "数据库"]);
    }

    #[test]
    fn cjk_stopwords_are_dropped_as_unigrams() {
        let terms = extract_keywords("我的猫");
        assert!(!terms.contains(&"的".to_string()));
        assert!(!terms.contains(&"我".to_string()));
        assert!(terms.contains(&"猫".to_string()));
        assert!(terms.contains(&"的猫".to_string()));
        assert!(terms.contains(&"我的猫".to_string()));
    }

    #[test]
    fn stopword_unigrams_are_dropped_but_bigrams_kept() {
        // Both characters are stopwords; the bigram pass still emits the pair.
        assert_eq!(extract_keywords("我们"), vec!["我们".to_string()]);
    }

    #[test]
    fn mixed_script_token_is_split_into_runs() {
        let terms = extract_keywords("Rust编程language");
        assert!(terms.contains(&"rust".to_string()));
        assert!(terms.contains(&"language".to_string()));
        assert!(terms.contains(&"编程".to_string()));
    }

    #[test]
    fn cjk_punctuation_separates_runs() {
        let terms = extract_keywords("猫咪。狗狗");
        assert!(terms.contains(&"猫咪".to_string()));
        assert!(terms.contains(&"狗狗".to_string()));
        assert!(!terms.iter().any(|t| t.contains('。')));
    }

    #[test]
    fn thai_run_is_expanded() {
        let terms = extract_keywords("แมว");
        assert!(terms.contains(&"แมว".to_string()));
    }

    #[test]
    fn only_stopwords_and_numbers_yield_nothing() {
        assert!(extract_keywords("the and of 42 a").is_empty());
        assert!(extract_keywords("   ").is_empty());
    }

    #[test]
    fn fts_query_quotes_and_joins() {
        let query = build_fts_query(&["rust", "say \"hi\""]);
        assert_eq!(query, "\"rust\" OR \"say \"\"hi\"\"\"");
    }

    #[test]
    fn empty_terms_build_empty_query() {
        assert_eq!(build_fts_query::<&str>(&[]), "");
    }

    #[test]
    fn control_characters_are_stripped() {
        assert_eq!(build_fts_query(&["\0"]), "");
        assert_eq!(build_fts_query(&["\u{7}\t", "ok"]), "\"ok\"");
        assert_eq!(build_fts_query(&["the\0"]), "\"the\"");
    }

    proptest! {
        #[test]
        fn keywords_are_unique(query in "\\PC{0,60}") {
            let terms = extract_keywords(&query);
            let unique: HashSet<&String> = terms.iter().collect();
            prop_assert_eq!(unique.len(), terms.len());
        }

        #[test]
        fn fts_query_has_one_clause_per_term(words in proptest::collection::vec("[a-z]{3,10}", 1..8)) {
            let query = build_fts_query(&words);
            prop_assert_eq!(query.matches(" OR ").count(), words.len() - 1);
        }
    }
}
