//! Fuzz target for selection query construction
//!
//! Arbitrary JSON filters against the test schema must either build and
//! render or return an error.

#![no_main]

use ferro_kb::query::{QueryOptions, SelectionQuery};
use ferro_kb::schema::Schema;
use libfuzzer_sys::fuzz_target;

const CLASSES: [&str; 4] = ["Person", "Parent", "RestrictiveModel", "Statement"];

fuzz_target!(|data: &[u8]| {
    let Some((selector, rest)) = data.split_first() else {
        return;
    };
    let Ok(filter) = serde_json::from_slice::<serde_json::Value>(rest) else {
        return;
    };

    let schema = Schema::with_test_data();
    let class = CLASSES[usize::from(*selector) % CLASSES.len()];
    if let Ok(query) = SelectionQuery::parse(&schema, class, &filter, &QueryOptions::default()) {
        let statement = query.to_statement();
        let _ = statement.display_string();
    }
});
