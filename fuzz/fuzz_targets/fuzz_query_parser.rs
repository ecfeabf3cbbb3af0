#![no_main]

use libfuzzer_sys::fuzz_target;
use lqt::utils::Analyzer;

fuzz_target!(|data: &str| {
    // Must return an error rather than panic on any input
    let _ = lqt::query::parse_query(data, None, Analyzer::Keyword);
    let _ = lqt::query::parse_query(data, Some("body"), Analyzer::Standard);
});
