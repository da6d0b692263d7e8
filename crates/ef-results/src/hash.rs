//! Content hash of a result series.

use sha2::{Digest, Sha256};

use crate::types::ResultSeries;

/// SHA-256 over the exact bit patterns of every sample.
///
/// Two series share a fingerprint only if they are bit-identical.
pub fn fingerprint(series: &ResultSeries) -> String {
    let mut hasher = Sha256::new();
    for sample in series {
        for v in [sample.t, sample.susceptible, sample.infected, sample.recovered] {
            hasher.update(v.to_bits().to_le_bytes());
        }
    }
    let result = hasher.finalize();
    format!("{:x}", result)
}
