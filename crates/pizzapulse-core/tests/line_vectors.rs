//! Metric line serialization vectors.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use pizzapulse_core::protocol::line::MetricLine;

use vector_loader::{load, LineVector};

#[test]
fn line_vectors() {
    let vectors: Vec<LineVector> = load("lines.json");
    assert!(!vectors.is_empty());

    for v in vectors {
        let l = &v.line;
        let line = MetricLine::new(
            l.prefix.as_str(),
            &l.source,
            (l.tag.0.as_str(), l.tag.1.as_str()),
            l.field.as_str(),
            l.value.to_field(),
        );
        let encoded = line.encode();

        assert_eq!(encoded, v.expect, "vector={}", v.description);
        assert!(!encoded.contains('\n'), "vector={}", v.description);
        assert!(!encoded.contains('\r'), "vector={}", v.description);
    }
}
