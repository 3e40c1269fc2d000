#![no_main]
use libfuzzer_sys::fuzz_target;
use solaredge::time::{SiteTimestamp, SiteZone};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(ts) = SiteTimestamp::parse(text) {
        // Formatting a parsed value must parse back to the same value
        let again = SiteTimestamp::parse(&ts.to_string());
        assert_eq!(again.ok(), Some(ts));

        if let Ok(zone) = SiteZone::from_name("Europe/Berlin") {
            let _ = zone.instant(ts);
        }
    }
});
