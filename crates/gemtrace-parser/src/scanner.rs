use regex::Regex;
use std::ops::Range;

/// One regex match inside a message body, with its capture groups.
#[derive(Debug, Clone)]
pub struct ScanMatch {
    /// Byte range of the whole match within the body.
    pub range: Range<usize>,
    groups: Vec<Option<String>>,
}

impl ScanMatch {
    /// The full matched text.
    pub fn text(&self) -> &str {
        self.groups
            .first()
            .and_then(|g| g.as_deref())
            .unwrap_or("")
    }

    /// Capture group `i` (1-based, like the regex crate).
    pub fn group(&self, i: usize) -> Option<&str> {
        self.groups.get(i).and_then(|g| g.as_deref())
    }
}

/// Tracks which byte spans of a message body have been claimed by
/// extraction rules.
///
/// The consumed spans and the remaining gaps always partition the body, so
/// nothing a rule skipped can silently disappear: whatever is left lands in
/// `remainder()`.
#[derive(Debug)]
pub struct BodyScanner<'a> {
    body: &'a str,
    // Sorted by start, coalesced, non-overlapping.
    consumed: Vec<Range<usize>>,
}

impl<'a> BodyScanner<'a> {
    pub fn new(body: &'a str) -> Self {
        BodyScanner {
            body,
            consumed: Vec::new(),
        }
    }

    pub fn body(&self) -> &str {
        self.body
    }

    /// All matches over the full body, consumed or not. Non-consuming;
    /// rules use this for positional picks (e.g. "the second unsigned
    /// item") before claiming specific spans.
    pub fn scan(&self, re: &Regex) -> Vec<ScanMatch> {
        re.captures_iter(self.body)
            .map(|caps| {
                let range = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
                let groups = (0..caps.len())
                    .map(|i| caps.get(i).map(|m| m.as_str().to_string()))
                    .collect();
                ScanMatch { range, groups }
            })
            .collect()
    }

    /// Consume the first match lying entirely in unconsumed text.
    pub fn take(&mut self, re: &Regex) -> Option<ScanMatch> {
        let hit = self
            .scan(re)
            .into_iter()
            .find(|m| self.is_available(&m.range))?;
        self.consume(hit.range.clone());
        Some(hit)
    }

    /// Consume every match lying entirely in unconsumed text.
    pub fn take_all(&mut self, re: &Regex) -> Vec<ScanMatch> {
        let hits: Vec<ScanMatch> = self
            .scan(re)
            .into_iter()
            .filter(|m| self.is_available(&m.range))
            .collect();
        for hit in &hits {
            self.consume(hit.range.clone());
        }
        hits
    }

    /// Whether a span overlaps nothing already consumed.
    pub fn is_available(&self, range: &Range<usize>) -> bool {
        !self
            .consumed
            .iter()
            .any(|span| span.start < range.end && range.start < span.end)
    }

    /// Mark a span as claimed. Overlapping or touching spans coalesce.
    pub fn consume(&mut self, range: Range<usize>) {
        if range.start >= range.end {
            return;
        }
        let mut merged = range;
        let mut kept = Vec::with_capacity(self.consumed.len() + 1);
        for span in self.consumed.drain(..) {
            if span.start <= merged.end && merged.start <= span.end {
                merged.start = merged.start.min(span.start);
                merged.end = merged.end.max(span.end);
            } else {
                kept.push(span);
            }
        }
        kept.push(merged);
        kept.sort_by_key(|span| span.start);
        self.consumed = kept;
    }

    pub fn consumed_ranges(&self) -> &[Range<usize>] {
        &self.consumed
    }

    /// Gaps between consumed spans, in body order.
    pub fn unconsumed_ranges(&self) -> Vec<Range<usize>> {
        let mut gaps = Vec::new();
        let mut cursor = 0;
        for span in &self.consumed {
            if span.start > cursor {
                gaps.push(cursor..span.start);
            }
            cursor = cursor.max(span.end);
        }
        if cursor < self.body.len() {
            gaps.push(cursor..self.body.len());
        }
        gaps
    }

    /// Unconsumed text, whitespace-normalized. Empty when rules claimed
    /// everything (or the body was blank).
    pub fn remainder(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        for gap in self.unconsumed_ranges() {
            let text = &self.body[gap];
            if !text.trim().is_empty() {
                parts.push(text);
            }
        }
        parts
            .join(" ")
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::LazyLock;

    static UINT: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"<\s*U\d\s*\[\d+\]\s*(\d+)\s*>").unwrap());
    static ASCII: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"<\s*A\s*\[\d+\]\s*'([^']*)'\s*>").unwrap());

    const BODY: &str = "<L [3]\n<U4 [1] 181>\n<U1 [1] 2>\n<A [8] 'MAG-0042'>\n>";

    #[test]
    fn scan_does_not_consume() {
        let scanner = BodyScanner::new(BODY);
        let hits = scanner.scan(&UINT);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].group(1), Some("181"));
        assert_eq!(hits[1].group(1), Some("2"));
        assert!(scanner.consumed_ranges().is_empty());
    }

    #[test]
    fn take_consumes_and_moves_on() {
        let mut scanner = BodyScanner::new(BODY);
        let first = scanner.take(&UINT).unwrap();
        assert_eq!(first.group(1), Some("181"));

        // The same pattern now matches only in what is left.
        let second = scanner.take(&UINT).unwrap();
        assert_eq!(second.group(1), Some("2"));
        assert!(scanner.take(&UINT).is_none());
    }

    #[test]
    fn remainder_drops_consumed_text() {
        let mut scanner = BodyScanner::new(BODY);
        scanner.take_all(&UINT);
        scanner.take(&ASCII);
        assert_eq!(scanner.remainder(), "<L [3] >");
    }

    #[test]
    fn untouched_body_survives_whole_in_remainder() {
        let scanner = BodyScanner::new(BODY);
        assert_eq!(
            scanner.remainder(),
            "<L [3] <U4 [1] 181> <U1 [1] 2> <A [8] 'MAG-0042'> >"
        );
    }

    #[test]
    fn consumed_and_unconsumed_partition_the_body() {
        let mut scanner = BodyScanner::new(BODY);
        scanner.take(&ASCII);
        scanner.take(&UINT);

        let mut pieces: Vec<(Range<usize>, &str)> = Vec::new();
        for span in scanner.consumed_ranges() {
            pieces.push((span.clone(), &BODY[span.clone()]));
        }
        for gap in scanner.unconsumed_ranges() {
            pieces.push((gap.clone(), &BODY[gap]));
        }
        pieces.sort_by_key(|(range, _)| range.start);

        let rebuilt: String = pieces.into_iter().map(|(_, text)| text).collect();
        assert_eq!(rebuilt, BODY);
    }

    #[test]
    fn overlapping_consumes_coalesce() {
        let mut scanner = BodyScanner::new("abcdefgh");
        scanner.consume(1..3);
        scanner.consume(2..5);
        scanner.consume(5..6);
        assert_eq!(scanner.consumed_ranges(), &[1..6]);
        assert_eq!(scanner.remainder(), "a gh");
    }

    #[test]
    fn empty_body_has_empty_remainder() {
        let scanner = BodyScanner::new("");
        assert_eq!(scanner.remainder(), "");
        assert!(scanner.unconsumed_ranges().is_empty());
    }
}
