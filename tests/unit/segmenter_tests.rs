/*!
 * Tests for sentence-aware segmentation through the public API
 */

use multitrans::translation::segmenter::{Chunk, TextSegmenter};

use crate::common::sample_text;

fn joined(chunks: &[Chunk]) -> String {
    chunks.iter().map(|c| c.text.as_str()).collect()
}

fn texts() -> Vec<String> {
    vec![
        sample_text(),
        "Ünïcödé sentences… with ellipsis… and émojis 🎉! Done.".to_string(),
        "Line one\nLine two\n\nParagraph two has words.".to_string(),
        "Take vitamin C. It helps. I counted to 10. Then I stopped.".to_string(),
        "<<ENTRY_1>> Hello there. <<ENTRY_2>> General Kenobi.".to_string(),
    ]
}

#[test]
fn test_segment_chunkSizeBound_shouldOnlyExceedForSingleSentences() {
    let segmenter = TextSegmenter::new().with_language("en");
    for text in texts() {
        for max in [2, 5, 20, 40, 80] {
            let chunks = segmenter.segment(&text, max).unwrap();
            assert_eq!(joined(&chunks), text, "round trip failed for max {} on {:?}", max, text);
            for chunk in chunks {
                if chunk.char_len() > max {
                    let pieces = segmenter.segment(&chunk.text, 1).unwrap();
                    assert_eq!(pieces.len(), 1, "oversized chunk {:?} holds several sentences", chunk.text);
                }
            }
        }
    }
}

#[test]
fn test_segment_withAbbreviationsAndDecimals_shouldNotSplitInside() {
    let chunks = TextSegmenter::new()
        .with_language("en")
        .segment("Dr. Smith paid 3.50 dollars. Then he left.", 30)
        .unwrap();
    assert_eq!(chunks[0].text, "Dr. Smith paid 3.50 dollars. ");
    assert_eq!(chunks[1].text, "Then he left.");
}

#[test]
fn test_segment_withSingleLetterAndNumberEndings_shouldSplitIntoSentences() {
    let text = "Take vitamin C. It helps. I counted to 10. Then I stopped.";
    let chunks = TextSegmenter::new().with_language("en").segment(text, 1).unwrap();
    let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(
        texts,
        vec!["Take vitamin C. ", "It helps. ", "I counted to 10. ", "Then I stopped."]
    );
}

#[test]
fn test_segment_shouldNeverSplitInsideMarkersAtAnySize() {
    let text = "Intro. <<a. b. c. d.>> Outro.";
    for max in 1..text.len() {
        for chunk in TextSegmenter::new().segment(text, max).unwrap() {
            let opens = chunk.text.matches("<<").count();
            let closes = chunk.text.matches(">>").count();
            assert_eq!(opens, closes, "marker split at max {}: {:?}", max, chunk.text);
        }
    }
}
