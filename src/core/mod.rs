use rand::distr::{Alphanumeric, SampleString};

pub mod header;

pub mod item;

pub mod mapping;

pub mod policy;

pub mod processor;

/// Generates a random name consisting of alphanumeric characters.
///
/// # Returns
///
/// A `String` containing the generated random name.
fn build_name() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), 8)
}
