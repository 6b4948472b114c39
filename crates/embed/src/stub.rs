use fxhash::hash64;

use crate::config::EmbedConfig;
use crate::normalize::l2_normalize_in_place;

/// Deterministic stub used when mode is `"stub"`.
/// Generates sinusoid values derived from a hash of the input text to guarantee
/// reproducible vectors with minimal CPU cost. Similar texts do not get similar
/// vectors; the stub exists for offline development and tests.
pub(crate) fn make_stub_embedding(text: &str, cfg: &EmbedConfig) -> Vec<f32> {
    let mut v = vec![0f32; cfg.dim];
    let h = hash64(text.as_bytes());
    for (idx, value) in v.iter_mut().enumerate() {
        *value = ((h >> (idx % 32)) as f32 * 0.0001).sin();
    }
    if cfg.normalize {
        l2_normalize_in_place(&mut v);
    }
    v
}
