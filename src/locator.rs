//! Locating the caption block that owns a given cue.

use crate::cue::Cue;
use crate::grouping::CaptionBlock;

/// Find the index of the block owning `cue` by binary search.
///
/// Invariant (documented, not independently validated): `blocks` must be
/// time-ordered and non-overlapping by their first cue's start time. The
/// grouping module produces blocks in scan order, which satisfies this whenever
/// the source cue list was time-ordered. [`debug_check_time_ordered`] exists for
/// callers that rebuild blocks from an external cue list; it is a no-op in
/// release builds, where a violated invariant degrades to a wrong (not crashed)
/// lookup.
///
/// The candidate is accepted only on a literal id match, so a cue that falls
/// between two blocks' time ranges correctly yields `None`.
///
/// Complexity: O(log n) in the block count.
pub fn find_block_for_cue(blocks: &[CaptionBlock], cue: &Cue) -> Option<usize> {
    let mut lo = 0usize;
    let mut hi = blocks.len();

    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        let block = &blocks[mid];

        if block.contains_cue(&cue.id) {
            return Some(mid);
        }

        if cue.start_seconds < block.start_seconds() {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }

    None
}

/// Debug-only check of the locator's ordering invariant.
///
/// Called once per block rebuild rather than per lookup, so lookups stay
/// logarithmic even in debug builds.
pub fn debug_check_time_ordered(blocks: &[CaptionBlock]) {
    debug_assert!(
        blocks
            .windows(2)
            .all(|pair| pair[0].start_seconds() <= pair[1].start_seconds()),
        "caption blocks must be time-ordered by first cue start"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::SpeakerColorMap;
    use crate::grouping::group_cues;

    fn cue(id: &str, start: f64, end: f64, text: &str) -> Cue {
        Cue {
            id: id.to_string(),
            start_seconds: start,
            end_seconds: end,
            text: text.to_string(),
        }
    }

    fn fixture_blocks() -> Vec<CaptionBlock> {
        // Alternating speakers produce one block per cue, time-ordered.
        let cues: Vec<Cue> = (0..7)
            .map(|i| {
                let speaker = if i % 2 == 0 { "A" } else { "B" };
                cue(
                    &format!("cue-{i}"),
                    i as f64 * 2.0,
                    i as f64 * 2.0 + 1.5,
                    &format!("<v {speaker}>line {i}"),
                )
            })
            .collect();
        let mut colors = SpeakerColorMap::default();
        group_cues(&cues, &mut colors)
    }

    #[test]
    fn finds_the_owning_block_for_every_cue() {
        let blocks = fixture_blocks();
        debug_check_time_ordered(&blocks);

        for (expected_idx, block) in blocks.iter().enumerate() {
            for c in &block.cues {
                assert_eq!(
                    find_block_for_cue(&blocks, c),
                    Some(expected_idx),
                    "cue {} should resolve to block {expected_idx}",
                    c.id
                );
            }
        }
    }

    #[test]
    fn absent_cue_yields_none() {
        let blocks = fixture_blocks();
        let stranger = cue("not-in-any-track", 4.0, 5.0, "hello");
        assert_eq!(find_block_for_cue(&blocks, &stranger), None);
    }

    #[test]
    fn empty_block_list_yields_none() {
        let c = cue("cue-0", 0.0, 1.0, "hi");
        assert_eq!(find_block_for_cue(&[], &c), None);
    }
}
