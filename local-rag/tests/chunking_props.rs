//! Property tests for chunk windows and recursive chunk placement.

use local_rag::chunking::split_windows;
use local_rag::{Chunker, RecursiveChunker};
use proptest::prelude::*;

/// A valid `(chunk_size, chunk_overlap)` pair.
fn arb_sizing() -> impl Strategy<Value = (usize, usize)> {
    (1usize..60).prop_flat_map(|size| (Just(size), 0..size))
}

fn char_slice(text: &str, start: usize, len: usize) -> String {
    text.chars().skip(start).take(len).collect()
}

/// Fixed windows cover the text, stay within the size and share exactly
/// `chunk_overlap` characters with their successor.
mod prop_window_coverage {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn windows_cover_text_with_exact_overlap(
            text in "[a-zé \n]{0,300}",
            (size, overlap) in arb_sizing(),
        ) {
            let windows: Vec<_> = split_windows(&text, size, overlap).unwrap().collect();
            let total = text.chars().count();

            if total == 0 {
                prop_assert!(windows.is_empty());
                return Ok(());
            }

            prop_assert_eq!(windows[0].start, 0);
            for w in &windows {
                let len = w.text.chars().count();
                prop_assert!(len <= size);
                prop_assert_eq!(char_slice(&text, w.start, len), w.text);
            }
            for pair in windows.windows(2) {
                prop_assert_eq!(pair[0].text.chars().count(), size);
                prop_assert_eq!(pair[1].start - pair[0].start, size - overlap);
            }
            let last = windows[windows.len() - 1];
            prop_assert_eq!(last.start + last.text.chars().count(), total);
        }
    }
}

/// Recursive chunks stay within the size and their offsets point at their text.
mod prop_recursive_placement {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn chunks_fit_and_offsets_are_exact(
            text in "[ab \n]{0,200}",
            (size, overlap) in arb_sizing(),
        ) {
            let chunker = RecursiveChunker::new(size, overlap).unwrap();
            let spans = chunker.chunk(&text);

            for span in &spans {
                let len = span.text.chars().count();
                prop_assert!(len > 0 && len <= size);
                prop_assert_eq!(&char_slice(&text, span.start, len), &span.text);
            }
            for pair in spans.windows(2) {
                prop_assert!(pair[0].start < pair[1].start);
            }
        }
    }
}
