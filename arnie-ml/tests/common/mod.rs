//! Synthetic stand-ins for the PCA-reduced face table.

#![allow(dead_code)]

use arnie_ml::SampleTable;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fmt::Write;
use std::path::{Path, PathBuf};

/// Rows of `n_features` PCA-like columns; positives are shifted on the leading
/// components so the classes overlap but are learnable.
pub fn pca_rows(n_pos: usize, n_neg: usize, n_features: usize, seed: u64) -> Vec<(Vec<f64>, u8)> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut rows = Vec::with_capacity(n_pos + n_neg);
    // Interleave so that file order carries no label signal.
    let (mut pos_left, mut neg_left) = (n_pos, n_neg);
    while pos_left + neg_left > 0 {
        let label = if pos_left > 0 && (neg_left == 0 || rng.gen_range(0..n_pos + n_neg) < n_pos) {
            pos_left -= 1;
            1
        } else {
            neg_left -= 1;
            0
        };
        let features = (0..n_features)
            .map(|j| {
                let noise = rng.gen_range(-1.0..1.0) + rng.gen_range(-1.0..1.0);
                let shift = if label == 1 && j < 3 { 1.2 } else { 0.0 };
                noise * 2.0 / (j as f64 + 1.0) + shift
            })
            .collect();
        rows.push((features, label));
    }
    rows
}

pub fn pca_table(n_pos: usize, n_neg: usize, n_features: usize, seed: u64) -> SampleTable {
    SampleTable::from_rows(&pca_rows(n_pos, n_neg, n_features, seed)).expect("valid rows")
}

/// CSV text with `pc1..pcD` feature columns followed by `label`.
pub fn pca_csv(n_pos: usize, n_neg: usize, n_features: usize, seed: u64) -> String {
    let mut out = String::new();
    let header: Vec<String> = (1..=n_features).map(|j| format!("pc{j}")).collect();
    let _ = writeln!(out, "{},label", header.join(","));
    for (features, label) in pca_rows(n_pos, n_neg, n_features, seed) {
        let cells: Vec<String> = features.iter().map(|v| format!("{v:.6}")).collect();
        let _ = writeln!(out, "{},{label}", cells.join(","));
    }
    out
}

pub fn write_csv(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write fixture");
    path
}
