#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Any JSON document must parse to a result or an error, never panic
    let Ok(doc) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };

    let _ = eloverblik::parser::parse_time_series(&doc).map(eloverblik::parser::aggregate_per_month);
    let _ = eloverblik::parser::parse_charges(&doc);
    let _ = eloverblik::parser::parse_meter_readings(&doc);
});
