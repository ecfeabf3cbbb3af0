#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let _ = lqt::script::ScriptLine::parse(data);
    let _ = lqt::filter::RegexFilter::parse(data);
});
