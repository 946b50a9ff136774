//! Carrier adapters and the propagator interface.
//!
//! Propagators move [`Context`] state across process boundaries by reading
//! and writing a *carrier*: any string-keyed text map travelling with the
//! request, such as HTTP headers. The wire encoding is entirely owned by the
//! propagator implementation; this module only defines the capabilities it
//! is built from: [`Injector`] and [`Extractor`] over the carrier, and the
//! [`TextMapPropagator`] interface itself.
//!
//! [`Context`]: crate::Context

use std::collections::HashMap;

mod text_map;

pub use text_map::{FieldIter, NoopTextMapPropagator, TextMapPropagator};

/// Write access to a carrier's string key/value pairs.
pub trait Injector {
    /// Add a key and value to the carrier.
    fn set(&mut self, key: &str, value: String);
}

/// Read access to a carrier's string key/value pairs.
pub trait Extractor {
    /// Get the value for a key from the carrier.
    fn get(&self, key: &str) -> Option<&str>;

    /// Collect all keys present in the carrier.
    fn keys(&self) -> Vec<&str>;
}

impl<S: std::hash::BuildHasher> Injector for HashMap<String, String, S> {
    /// Set a key and value in the `HashMap`, normalizing the key to
    /// lowercase.
    fn set(&mut self, key: &str, value: String) {
        self.insert(key.to_lowercase(), value);
    }
}

impl<S: std::hash::BuildHasher> Extractor for HashMap<String, String, S> {
    /// Get a value for a key from the `HashMap`, treating keys
    /// case-insensitively.
    fn get(&self, key: &str) -> Option<&str> {
        self.get(&key.to_lowercase()).map(|v| v.as_str())
    }

    /// Collect all keys from the `HashMap`.
    fn keys(&self) -> Vec<&str> {
        self.keys().map(|k| k.as_str()).collect()
    }
}
