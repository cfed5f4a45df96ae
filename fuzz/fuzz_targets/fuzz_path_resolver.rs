#![no_main]

use checkpub_domain::PathIndex;
use checkpub_types::TreeEntry;
use libfuzzer_sys::fuzz_target;
use std::collections::HashSet;

fuzz_target!(|data: &[u8]| {
    // Convert bytes to string, lossy is fine for fuzzing
    if let Ok(text) = std::str::from_utf8(data) {
        // Index arbitrary paths and resolve arbitrary paths against a
        // fixed tree; neither should ever panic
        let tree = vec![
            TreeEntry {
                path: text.to_string(),
                sha: "s".to_string(),
            },
            TreeEntry {
                path: "src/main/java/com/x/Y.java".to_string(),
                sha: "s".to_string(),
            },
        ];
        let index = PathIndex::build(&tree, &HashSet::new());
        let _ = index.resolve(text);
        let _ = index.resolve("com/x/Y.java");
    }
});
