// Log parsing, two stages:
//
//   segment  - split raw log text into timestamped message blocks
//   extract  - run per-message-type rules over each block's body
//
// Segmentation is the only stage that can fail (empty input). Extraction
// is total: unrecognized structure degrades to the record's remainder.

mod extract;
mod rules;
mod scanner;
mod segment;

pub use extract::{Extractor, parse_log};
pub use rules::{EventRuleFn, EventScope, RuleContext, RuleFn, RuleSet};
pub use scanner::{BodyScanner, ScanMatch};
pub use segment::segment;
