//! Ngrams command - break words into n-grams.

use reel_core::breakup_list;

/// Run the ngrams command.
pub fn run(words: &[String], min: usize, max: usize) -> anyhow::Result<()> {
    let mut grams: Vec<String> = breakup_list(words, min, max)?.into_iter().collect();
    grams.sort_by(|a, b| a.chars().count().cmp(&b.chars().count()).then_with(|| a.cmp(b)));

    for gram in &grams {
        println!("{}", gram);
    }

    eprintln!();
    eprintln!("{} distinct n-grams of length {}..={}", grams.len(), min, max);
    Ok(())
}
