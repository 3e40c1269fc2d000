#![no_main]
use libfuzzer_sys::fuzz_target;
use solaredge::client::unwrap_envelope;
use solaredge::flow::{BatterySignPolicy, FlowView};
use solaredge::types::PowerFlow;

fuzz_target!(|data: &[u8]| {
    let Ok(body) = std::str::from_utf8(data) else {
        return;
    };

    // Whatever decodes must also fold into a flow view without panicking
    if let Ok(flow) = unwrap_envelope::<PowerFlow>(body, "siteCurrentPowerFlow") {
        let _ = FlowView::from_power_flow(&flow, BatterySignPolicy::DischargingOnly);
        let _ = FlowView::from_power_flow(&flow, BatterySignPolicy::DischargingOrIdle);
    }
});
