//! Estimated reading time for lessons
//!
//! Text is read at a fixed rate and every non-text block adds a small,
//! fixed pause on top of the time spent reading its title and body.

use gambit_types::{BlockKind, ContentBlock, Lesson};

/// Reading speed for any free text
pub const WORDS_PER_MINUTE: u64 = 200;

// Time is summed in 1/200 minute units (one word each) so exact minutes stay exact.
/// Glance time for an image (0.10 min)
pub const IMAGE_UNITS: u64 = 20;
/// Observation interval for a video, not its playback length (0.50 min)
pub const VIDEO_UNITS: u64 = 100;
/// Reflection pause after a tip (0.17 min)
pub const TIP_UNITS: u64 = 34;
/// Analysis pause for a worked example (0.25 min)
pub const EXAMPLE_UNITS: u64 = 50;

/// Number of whitespace-delimited words in `text`
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Fixed extra time a block of this kind costs, in 1/200 minute units
pub fn block_bonus(kind: &BlockKind) -> u64 {
    match kind {
        BlockKind::Text => 0,
        BlockKind::Image => IMAGE_UNITS,
        BlockKind::Video => VIDEO_UNITS,
        BlockKind::Tip => TIP_UNITS,
        BlockKind::Example => EXAMPLE_UNITS,
        BlockKind::Other(_) => 0,
    }
}

fn block_units(block: &ContentBlock) -> u64 {
    let words = block.title.as_deref().map(word_count).unwrap_or(0) + word_count(&block.content);
    words as u64 + block_bonus(&block.kind)
}

/// Minutes (fractional) a single block takes
pub fn block_minutes(block: &ContentBlock) -> f64 {
    block_units(block) as f64 / WORDS_PER_MINUTE as f64
}

/// Estimate reading time in whole minutes, never less than one
pub fn estimate(blocks: &[ContentBlock], intro: Option<&str>, summary: Option<&str>) -> u32 {
    let text_units: u64 = [intro, summary]
        .into_iter()
        .flatten()
        .map(|text| word_count(text) as u64)
        .sum();
    let total = text_units + blocks.iter().map(block_units).sum::<u64>();

    let minutes = total.div_ceil(WORDS_PER_MINUTE);
    u32::try_from(minutes).unwrap_or(u32::MAX).max(1)
}

/// Estimate reading time for a whole lesson
pub fn estimate_lesson(lesson: &Lesson) -> u32 {
    estimate(
        &lesson.content,
        lesson.intro.as_deref(),
        lesson.summary.as_deref(),
    )
}
