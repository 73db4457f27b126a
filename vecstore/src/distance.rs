//! Distance metrics between two embeddings.
//!
//! Both functions accumulate in f64 and return `None` when the metric is
//! undefined for the pair, so callers can treat it as "distance unavailable"
//! rather than as a number.

/// Cosine distance, `1 - cos(a, b)`, in `[0, 2]`.
///
/// Returns `None` on dimension mismatch or when either vector has zero norm.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() {
        return None;
    }

    let mut dot: f64 = 0.0;
    let mut norm_a: f64 = 0.0;
    let mut norm_b: f64 = 0.0;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (x as f64, y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return None;
    }

    let similarity = (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0);
    Some((1.0 - similarity) as f32)
}

/// Euclidean distance. Returns `None` on dimension mismatch.
pub fn l2_distance(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() {
        return None;
    }
    let sum: f64 = a
        .iter()
        .zip(b)
        .map(|(&x, &y)| {
            let d = x as f64 - y as f64;
            d * d
        })
        .sum();
    Some(sum.sqrt() as f32)
}
