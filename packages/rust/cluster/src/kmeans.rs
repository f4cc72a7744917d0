//! Seeded Lloyd's k-means over embedding vectors.
//!
//! Determinism contract: identical vectors, `k`, and seed produce identical
//! assignments. All tie-breaks resolve toward the lowest index — nearest
//! centroid uses strict `<`, so an equidistant point stays with the lower
//! label; repair donors and victims are chosen lowest-index-first.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Assign each vector a partition label in `0..k`.
///
/// Preconditions (enforced by the caller): `vectors` non-empty, all the
/// same dimension, and `1 <= k <= vectors.len()`. Distinct inputs may
/// share a vector (a degenerate provider can collapse them); every label
/// in `0..k` still ends up with at least one member.
pub(crate) fn kmeans(vectors: &[Vec<f32>], k: usize, seed: u64, max_iters: usize) -> Vec<usize> {
    if k == 1 {
        return vec![0; vectors.len()];
    }

    let mut centroids = initial_centroids(vectors, k, seed);
    let mut labels = vec![0usize; vectors.len()];

    for _ in 0..max_iters {
        // Assignment step
        let mut next_labels = Vec::with_capacity(vectors.len());
        for v in vectors {
            next_labels.push(nearest_centroid(v, &centroids));
        }
        repair_empty_clusters(vectors, &centroids, &mut next_labels, k);

        let converged = next_labels == labels;
        labels = next_labels;

        // Update step
        centroids = recompute_centroids(vectors, &labels, &centroids, k);

        if converged {
            break;
        }
    }

    labels
}

/// Pick `k` initial centroids: one seeded-random distinct vector, then
/// greedy farthest-point selection among the remaining distinct vectors.
///
/// Restricting to distinct vectors keeps duplicate inputs from wasting
/// centroids on identical points; farthest-point spreading keeps two
/// centroids from landing inside one natural cluster. When the provider
/// collapses distinct inputs to fewer than `k` distinct vectors, picked
/// vectors are reused for the remaining centroids; the empty-cluster
/// repair then guarantees every label still gets a member.
fn initial_centroids(vectors: &[Vec<f32>], k: usize, seed: u64) -> Vec<Vec<f32>> {
    let mut candidates: Vec<usize> = Vec::new();
    for (i, v) in vectors.iter().enumerate() {
        if !candidates.iter().any(|&c| vectors[c] == *v) {
            candidates.push(i);
        }
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let first = candidates[rng.gen_range(0..candidates.len())];
    let mut picked = vec![first];

    while picked.len() < k.min(candidates.len()) {
        let next = candidates
            .iter()
            .copied()
            .filter(|i| !picked.contains(i))
            .map(|i| {
                let nearest = picked
                    .iter()
                    .map(|&p| squared_distance(&vectors[i], &vectors[p]))
                    .fold(f32::INFINITY, f32::min);
                (i, nearest)
            })
            .max_by(|a, b| {
                a.1.partial_cmp(&b.1)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(b.0.cmp(&a.0))
            });
        match next.map(|(i, _)| i) {
            Some(i) => picked.push(i),
            None => break,
        }
    }
    picked.sort_unstable();

    let mut centroids: Vec<Vec<f32>> = picked.iter().map(|&i| vectors[i].clone()).collect();
    while centroids.len() < k {
        let reuse = centroids[centroids.len() % picked.len()].clone();
        centroids.push(reuse);
    }
    centroids
}

/// Index of the closest centroid; ties go to the lowest label.
fn nearest_centroid(v: &[f32], centroids: &[Vec<f32>]) -> usize {
    let mut best = 0;
    let mut best_dist = squared_distance(v, &centroids[0]);
    for (label, c) in centroids.iter().enumerate().skip(1) {
        let dist = squared_distance(v, c);
        if dist < best_dist {
            best = label;
            best_dist = dist;
        }
    }
    best
}

fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Mean of each label's members; a memberless label keeps its old centroid.
fn recompute_centroids(
    vectors: &[Vec<f32>],
    labels: &[usize],
    previous: &[Vec<f32>],
    k: usize,
) -> Vec<Vec<f32>> {
    let dim = vectors[0].len();
    let mut sums = vec![vec![0.0f32; dim]; k];
    let mut counts = vec![0usize; k];

    for (v, &label) in vectors.iter().zip(labels) {
        counts[label] += 1;
        for (acc, x) in sums[label].iter_mut().zip(v) {
            *acc += x;
        }
    }

    sums.into_iter()
        .zip(counts)
        .enumerate()
        .map(|(label, (mut sum, count))| {
            if count == 0 {
                previous[label].clone()
            } else {
                for x in &mut sum {
                    *x /= count as f32;
                }
                sum
            }
        })
        .collect()
}

/// Guarantee every label has at least one member.
///
/// For each empty label (ascending), the largest cluster donates the member
/// farthest from that label's centroid. Keeps the group-count invariant
/// unconditional.
fn repair_empty_clusters(
    vectors: &[Vec<f32>],
    centroids: &[Vec<f32>],
    labels: &mut [usize],
    k: usize,
) {
    for empty in 0..k {
        if labels.iter().any(|&l| l == empty) {
            continue;
        }

        let mut counts = vec![0usize; k];
        for &l in labels.iter() {
            counts[l] += 1;
        }
        let donor = counts
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(&a.0)))
            .map(|(label, _)| label)
            .unwrap_or(0);

        let victim = labels
            .iter()
            .enumerate()
            .filter(|&(_, &l)| l == donor)
            .map(|(i, _)| (i, squared_distance(&vectors[i], &centroids[empty])))
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal).then(b.0.cmp(&a.0)))
            .map(|(i, _)| i);

        if let Some(i) = victim {
            labels[i] = empty;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vecs(points: &[&[f32]]) -> Vec<Vec<f32>> {
        points.iter().map(|p| p.to_vec()).collect()
    }

    #[test]
    fn k_of_one_collapses_everything() {
        let v = vecs(&[&[0.0, 0.0], &[5.0, 5.0], &[9.0, 9.0]]);
        assert_eq!(kmeans(&v, 1, 42, 100), vec![0, 0, 0]);
    }

    #[test]
    fn separated_points_split_cleanly() {
        let v = vecs(&[&[0.0, 0.1], &[0.1, 0.0], &[10.0, 10.1], &[10.1, 10.0]]);
        let labels = kmeans(&v, 2, 42, 100);
        assert_eq!(labels[0], labels[1]);
        assert_eq!(labels[2], labels[3]);
        assert_ne!(labels[0], labels[2]);
    }

    #[test]
    fn identical_seed_identical_labels() {
        let v = vecs(&[&[1.0, 2.0], &[2.0, 1.0], &[8.0, 8.0], &[7.0, 9.0], &[0.5, 1.5]]);
        let a = kmeans(&v, 3, 42, 100);
        let b = kmeans(&v, 3, 42, 100);
        assert_eq!(a, b);
    }

    #[test]
    fn every_label_has_a_member() {
        // k equals the distinct count, duplicates included in the input
        let v = vecs(&[&[0.0], &[0.0], &[1.0], &[2.0]]);
        let labels = kmeans(&v, 3, 42, 100);
        for label in 0..3 {
            assert!(labels.contains(&label), "label {label} empty: {labels:?}");
        }
    }

    #[test]
    fn identical_vectors_still_fill_every_label() {
        // Fewer distinct vectors than k: repair must populate both labels
        let v = vecs(&[&[1.0, 1.0], &[1.0, 1.0], &[1.0, 1.0]]);
        let labels = kmeans(&v, 2, 42, 100);
        for label in 0..2 {
            assert!(labels.contains(&label), "label {label} empty: {labels:?}");
        }
    }

    #[test]
    fn duplicate_vectors_share_a_label() {
        let v = vecs(&[&[0.0, 0.0], &[9.0, 9.0], &[0.0, 0.0]]);
        let labels = kmeans(&v, 2, 42, 100);
        assert_eq!(labels[0], labels[2]);
    }
}
