//! Brand-name matching against scraped link text.
//!
//! A link matches when the brand is a case-insensitive substring of the text.
//! With fuzzy matching on, any whitespace token of at least three characters
//! whose similarity to the brand reaches the threshold also counts.

use std::collections::HashMap;

const MIN_TOKEN_CHARS: usize = 3;

/// Sequences at least this long get their most frequent characters excluded
/// from seeding matches.
const AUTOJUNK_MIN_LEN: usize = 200;

/// Returns true when `text` plausibly mentions `brand`.
///
/// `threshold` is a percentage. Range checking belongs to
/// [`ScrapeConfig::validate`](crate::config::ScrapeConfig::validate); any
/// value is accepted here.
pub fn matches(text: &str, brand: &str, threshold: u8, enabled: bool) -> bool {
    let text = text.to_lowercase();
    let brand = brand.to_lowercase();

    if text.contains(&brand) {
        return true;
    }
    if !enabled {
        return false;
    }

    let threshold = f64::from(threshold);
    text.split_whitespace()
        .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
        .any(|token| ratio(&brand, token) * 100.0 >= threshold)
}

/// Similarity in `[0, 1]`: `2 * M / T`, where `M` counts characters in the
/// matching blocks found by recursive longest-common-block search and `T` is
/// the combined length. Two empty strings are identical.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }

    let matched = BlockMatcher::new(&a, &b).matched_chars();
    2.0 * matched as f64 / total as f64
}

struct BlockMatcher<'a> {
    a: &'a [char],
    b: &'a [char],
    /// Positions of each character in `b`, popular characters removed.
    b2j: HashMap<char, Vec<usize>>,
}

impl<'a> BlockMatcher<'a> {
    fn new(a: &'a [char], b: &'a [char]) -> Self {
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, &c) in b.iter().enumerate() {
            b2j.entry(c).or_default().push(j);
        }

        if b.len() >= AUTOJUNK_MIN_LEN {
            let limit = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= limit);
        }

        Self { a, b, b2j }
    }

    /// Longest block `a[i..i+k] == b[j..j+k]` inside the given window.
    /// Ties go to the smallest `i`, then the smallest `j`.
    fn longest_match(
        &self,
        alo: usize,
        ahi: usize,
        blo: usize,
        bhi: usize,
    ) -> (usize, usize, usize) {
        let (mut best_i, mut best_j, mut best_len) = (alo, blo, 0);
        let mut j2len: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            let mut next_j2len = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let prev = if j == 0 {
                        0
                    } else {
                        j2len.get(&(j - 1)).copied().unwrap_or(0)
                    };
                    let k = prev + 1;
                    next_j2len.insert(j, k);
                    if k > best_len {
                        best_i = i + 1 - k;
                        best_j = j + 1 - k;
                        best_len = k;
                    }
                }
            }
            j2len = next_j2len;
        }

        // Popular characters never seed a block but may still extend one.
        while best_i > alo && best_j > blo && self.a[best_i - 1] == self.b[best_j - 1] {
            best_i -= 1;
            best_j -= 1;
            best_len += 1;
        }
        while best_i + best_len < ahi
            && best_j + best_len < bhi
            && self.a[best_i + best_len] == self.b[best_j + best_len]
        {
            best_len += 1;
        }

        (best_i, best_j, best_len)
    }

    fn matched_chars(&self) -> usize {
        let mut pending = vec![(0, self.a.len(), 0, self.b.len())];
        let mut matched = 0;

        while let Some((alo, ahi, blo, bhi)) = pending.pop() {
            let (i, j, k) = self.longest_match(alo, ahi, blo, bhi);
            if k == 0 {
                continue;
            }
            matched += k;
            if alo < i && blo < j {
                pending.push((alo, i, blo, j));
            }
            if i + k < ahi && j + k < bhi {
                pending.push((i + k, ahi, j + k, bhi));
            }
        }

        matched
    }
}
