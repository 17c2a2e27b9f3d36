//! N-gram tokenizer.
//!
//! Breaks words into every contiguous substring whose length falls inside a
//! `[min_n, max_n]` window. Lengths and offsets are counted in `char`s, so
//! multi-byte text is never split inside a code point.
//!
//! These functions keep no state between calls: the returned set is the only
//! allocation that outlives a call.

use crate::error::{ReelError, Result};
use std::collections::HashSet;
use std::iter;

/// Break a single word into all substrings of `min_n..=max_n` chars.
///
/// Returns an empty set when the word is shorter than `min_n`.
///
/// # Example
/// ```
/// use reel_core::ngrams::breakup_word;
/// let grams = breakup_word("foobar", 2, 3).unwrap();
/// assert!(grams.contains("oob"));
/// assert_eq!(grams.len(), 9);
/// ```
pub fn breakup_word(word: &str, min_n: usize, max_n: usize) -> Result<HashSet<String>> {
    check_range(min_n, max_n)?;
    let mut grams = HashSet::new();
    insert_grams(word, min_n, max_n, &mut grams);
    Ok(grams)
}

/// Break every word of a list and union the results.
pub fn breakup_list<I, S>(words: I, min_n: usize, max_n: usize) -> Result<HashSet<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    check_range(min_n, max_n)?;
    let mut grams = HashSet::new();
    for word in words {
        insert_grams(word.as_ref(), min_n, max_n, &mut grams);
    }
    Ok(grams)
}

/// All windows of exactly `n` chars, left to right.
///
/// Unlike [`breakup_word`] this keeps offset order and duplicates.
pub fn windows(word: &str, n: usize) -> Vec<&str> {
    if n == 0 {
        return Vec::new();
    }
    let bounds = char_bounds(word);
    let chars = bounds.len() - 1;
    if chars < n {
        return Vec::new();
    }
    (0..=chars - n)
        .map(|start| &word[bounds[start]..bounds[start + n]])
        .collect()
}

fn check_range(min_n: usize, max_n: usize) -> Result<()> {
    if min_n == 0 {
        return Err(ReelError::invalid_argument("min_n must be at least 1"));
    }
    if min_n > max_n {
        return Err(ReelError::invalid_argument(format!(
            "min_n ({}) is greater than max_n ({})",
            min_n, max_n
        )));
    }
    Ok(())
}

fn insert_grams(word: &str, min_n: usize, max_n: usize, grams: &mut HashSet<String>) {
    let bounds = char_bounds(word);
    let chars = bounds.len() - 1;

    for start in 0..chars {
        let longest = max_n.min(chars - start);
        for len in min_n..=longest {
            grams.insert(word[bounds[start]..bounds[start + len]].to_string());
        }
    }
}

/// Byte offset of every char boundary, including the end of the string.
fn char_bounds(word: &str) -> Vec<usize> {
    word.char_indices()
        .map(|(i, _)| i)
        .chain(iter::once(word.len()))
        .collect()
}
