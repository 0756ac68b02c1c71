//! Reading-time estimation

use super::post::ContentBlock;
use super::richtext::as_text;

/// Assumed reading speed
pub const DEFAULT_WORDS_PER_MINUTE: usize = 200;

/// Count whitespace-separated words over every heading and body
pub fn count_words(content: &[ContentBlock]) -> usize {
    content
        .iter()
        .map(|block| word_count(&block.heading) + word_count(&as_text(&block.body)))
        .sum()
}

/// Estimated minutes to read `content`, rounded up, never below one
pub fn reading_time(content: &[ContentBlock], words_per_minute: usize) -> usize {
    count_words(content)
        .div_ceil(words_per_minute.max(1))
        .max(1)
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::richtext::RichTextBlock;

    fn block(heading: &str, paragraphs: &[&str]) -> ContentBlock {
        ContentBlock {
            heading: heading.to_string(),
            body: paragraphs.iter().map(|p| RichTextBlock::paragraph(p)).collect(),
        }
    }

    fn words(n: usize) -> String {
        vec!["palavra"; n].join(" ")
    }

    #[test]
    fn test_example_content() {
        let content = vec![block("Intro", &["one two three"]), block("", &["four five"])];
        assert_eq!(count_words(&content), 6);
        assert_eq!(reading_time(&content, DEFAULT_WORDS_PER_MINUTE), 1);
    }

    #[test]
    fn test_rounds_up() {
        let content = vec![block("", &[words(200).as_str()])];
        assert_eq!(reading_time(&content, 200), 1);

        let content = vec![block("Heading", &[words(200).as_str()])];
        assert_eq!(reading_time(&content, 200), 2);

        let content = vec![block("", &[words(399).as_str()]), block("", &[words(1).as_str()])];
        assert_eq!(reading_time(&content, 200), 2);
    }

    #[test]
    fn test_never_below_one_minute() {
        assert_eq!(reading_time(&[], 200), 1);
        assert_eq!(reading_time(&[block("", &[])], 200), 1);
        assert_eq!(reading_time(&[block("", &["   "])], 200), 1);
    }

    #[test]
    fn test_whitespace_runs_collapse() {
        let spaced = vec![block("  Intro  ", &["one\t\ttwo \n three"])];
        let tight = vec![block("Intro", &["one two three"])];
        assert_eq!(count_words(&spaced), count_words(&tight));
    }

    #[test]
    fn test_total_ignores_block_order() {
        let a = block("Um", &[words(150).as_str(), "fim"]);
        let b = block("Dois três", &[words(120).as_str()]);
        let c = block("", &[words(90).as_str()]);
        let forward = vec![a.clone(), b.clone(), c.clone()];
        let backward = vec![c, b, a];
        assert_eq!(count_words(&forward), count_words(&backward));
        assert_eq!(reading_time(&forward, 200), reading_time(&backward, 200));
    }

    #[test]
    fn test_paragraphs_do_not_merge_words() {
        // as_text joins paragraphs with a space, so "end" and "start" stay apart
        let content = vec![block("", &["the end", "start again"])];
        assert_eq!(count_words(&content), 4);
    }

    #[test]
    fn test_zero_words_per_minute_is_treated_as_one() {
        let content = vec![block("", &["a b c"])];
        assert_eq!(reading_time(&content, 0), 3);
    }
}
