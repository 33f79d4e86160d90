//! Cosine similarity over frequency vectors.
//!
//! All inputs produced by this crate are non-negative, so similarities fall
//! in [0, 1] instead of cosine's general [-1, 1]. An operand with zero norm
//! (an empty declaration, or one whose terms all miss the vocabulary) has
//! similarity 0 with everything, itself included.

/// Epsilon below which a norm is treated as zero.
const EPSILON: f64 = 1e-10;

/// Cosine similarity between two equal-length slices.
///
/// Accumulates in f64; the result is clamped to [0, 1] to absorb rounding,
/// so `cosine_similarity(v, v)` is 1 for any non-zero `v`.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "cosine over mismatched dimensions");

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a < EPSILON || norm_b < EPSILON {
        return 0.0;
    }

    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(0.0, 1.0) as f32
}

/// `1 - cosine_similarity`, the ordering used for cosine nearest-neighbor search
#[must_use]
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

/// Straight-line distance; only rank-compatible with cosine for normalized inputs
#[must_use]
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = f64::from(x) - f64::from(y);
            d * d
        })
        .sum::<f64>()
        .sqrt() as f32
}

#[must_use]
pub fn l2_norm(vector: &[f32]) -> f32 {
    vector
        .iter()
        .map(|&x| f64::from(x) * f64::from(x))
        .sum::<f64>()
        .sqrt() as f32
}

/// Scale to unit length in place. Zero vectors are left untouched.
pub fn normalize_vector(vector: &mut [f32]) {
    let norm = l2_norm(vector);
    if f64::from(norm) > EPSILON {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        // Identical vectors
        let a = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&a, &a) - 1.0).abs() < 1e-6);

        // Orthogonal vectors
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);

        // Zero vector
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![0.0, 0.0, 0.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
        assert_eq!(cosine_similarity(&b, &b), 0.0);
    }

    #[test]
    fn test_cosine_is_scale_invariant() {
        let a = vec![1.0, 2.0, 0.0];
        let b = vec![2.0, 4.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
        assert!(cosine_distance(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_bounds_for_counts() {
        let vectors = [
            vec![1.0, 0.0, 3.0, 0.0],
            vec![0.0, 5.0, 1.0, 2.0],
            vec![7.0, 7.0, 7.0, 7.0],
            vec![0.0, 0.0, 0.0, 1.0],
        ];
        for a in &vectors {
            for b in &vectors {
                let s = cosine_similarity(a, b);
                assert!((0.0..=1.0).contains(&s), "{s} out of range");
                assert!((s - cosine_similarity(b, a)).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_euclidean_distance() {
        let a = vec![0.0, 3.0];
        let b = vec![4.0, 0.0];
        assert!((euclidean_distance(&a, &b) - 5.0).abs() < 1e-6);
        assert_eq!(euclidean_distance(&a, &a), 0.0);
    }

    #[test]
    fn test_normalize_vector() {
        let mut vector = vec![3.0, 4.0];
        normalize_vector(&mut vector);

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6);
        assert!((vector[0] - 0.6).abs() < 1e-6);
        assert!((vector[1] - 0.8).abs() < 1e-6);

        let mut zero = vec![0.0, 0.0];
        normalize_vector(&mut zero);
        assert_eq!(zero, vec![0.0, 0.0]);
    }
}
