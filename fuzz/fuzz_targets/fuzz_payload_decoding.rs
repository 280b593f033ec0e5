#![no_main]

use libfuzzer_sys::fuzz_target;

use notifex::NotificationContent;

fuzz_target!(|data: &str| {
    // Arbitrary payload text must decode or fail cleanly.
    if let Ok(content) = NotificationContent::from_payload_str(data) {
        // Media extraction must never panic on whatever metadata came through.
        let _ = content.media_request();
        let _ = serde_json::to_string(&content);
    }
});
