mod prompt;
mod synthesizer;

pub use synthesizer::{Digest, DigestSynthesizer};
