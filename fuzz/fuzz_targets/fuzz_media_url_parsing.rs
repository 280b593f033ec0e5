#![no_main]

use libfuzzer_sys::fuzz_target;

use notifex::media::{parse_media_url, path_extension, MediaDescriptor, MediaKind};

fuzz_target!(|data: &str| {
    // URL validation must never panic, with or without file URLs allowed.
    let _ = parse_media_url(data, false);

    if let Ok(url) = parse_media_url(data, true) {
        // Extension derivation and file naming must hold for any accepted URL.
        let ext = path_extension(&url);
        assert!(!ext.contains('/'));
        for kind in MediaKind::ALL {
            let name = MediaDescriptor::new(kind, vec![0u8], ext.clone()).canonical_file_name();
            assert!(name.starts_with(kind.as_str()));
        }
    }
});
