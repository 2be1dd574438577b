//! Seeded train/holdout partitioning with optional stratification.

use crate::config::SplitConfig;
use crate::data::table::SampleTable;
use crate::error::MlError;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

/// Disjoint, covering partition of a table.
#[derive(Debug, Clone)]
pub struct Split {
    pub train: SampleTable,
    pub test: SampleTable,
    /// Row indices into the source table, ascending.
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// Partition `table` into train and test according to `config`.
pub fn train_test_split(table: &SampleTable, config: &SplitConfig) -> Result<Split, MlError> {
    let (train_indices, test_indices) = split_indices(
        table.labels(),
        config.test_fraction,
        config.seed,
        config.stratify,
    )?;

    tracing::info!(
        train = train_indices.len(),
        test = test_indices.len(),
        stratify = config.stratify,
        seed = config.seed,
        "Split dataset"
    );

    Ok(Split {
        train: table.select(&train_indices),
        test: table.select(&test_indices),
        train_indices,
        test_indices,
    })
}

/// Compute `(train, test)` row indices for binary `labels`.
///
/// The test partition holds `ceil(test_fraction * n)` rows. With `stratify`, each
/// class contributes its proportional share rounded by largest remainder.
pub fn split_indices(
    labels: &[u8],
    test_fraction: f64,
    seed: u64,
    stratify: bool,
) -> Result<(Vec<usize>, Vec<usize>), MlError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(MlError::config(
            "split.test_fraction",
            format!("must be in (0, 1), got {test_fraction}"),
        ));
    }

    let n = labels.len();
    // The epsilon keeps products like 0.7 * 10 = 7.000000000000001 from rounding up.
    let n_test = (test_fraction * n as f64 - 1e-9).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(MlError::config(
            "split.test_fraction",
            format!("{test_fraction} of {n} rows leaves an empty partition"),
        ));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(n - n_test);
    let mut test = Vec::with_capacity(n_test);

    if stratify {
        let mut by_class: [Vec<usize>; 2] = [Vec::new(), Vec::new()];
        for (i, &label) in labels.iter().enumerate() {
            by_class[usize::from(label.min(1))].push(i);
        }
        let counts = [by_class[0].len(), by_class[1].len()];
        let present = counts.iter().filter(|&&c| c > 0).count();

        for (class, &count) in counts.iter().enumerate() {
            if count == 1 {
                return Err(MlError::config(
                    "split.stratify",
                    format!("class {class} has only 1 member; at least 2 are needed to stratify"),
                ));
            }
        }
        if n_test < present || n - n_test < present {
            return Err(MlError::config(
                "split.test_fraction",
                format!(
                    "{test_fraction} of {n} rows cannot hold every one of {present} classes in both partitions"
                ),
            ));
        }

        let allocation = allocate(&counts, n, n_test);
        for (class, indices) in by_class.iter_mut().enumerate() {
            indices.shuffle(&mut rng);
            let (held_out, kept) = indices.split_at(allocation[class]);
            test.extend_from_slice(held_out);
            train.extend_from_slice(kept);
        }
    } else {
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut rng);
        let (held_out, kept) = indices.split_at(n_test);
        test.extend_from_slice(held_out);
        train.extend_from_slice(kept);
    }

    train.sort_unstable();
    test.sort_unstable();
    Ok((train, test))
}

/// Largest-remainder apportionment of `n_test` test rows across classes,
/// never taking every member of a class.
fn allocate(counts: &[usize; 2], n: usize, n_test: usize) -> [usize; 2] {
    let mut share = [0usize; 2];
    let mut remainders = [(0.0f64, 0usize); 2];
    for (class, &count) in counts.iter().enumerate() {
        let exact = n_test as f64 * count as f64 / n as f64;
        share[class] = (exact.floor() as usize).min(count.saturating_sub(1));
        remainders[class] = (exact - share[class] as f64, class);
    }

    // Larger remainder first; the lower class wins ties.
    remainders.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));

    let mut left = n_test - share.iter().sum::<usize>();
    while left > 0 {
        let before = left;
        for &(_, class) in &remainders {
            if left > 0 && share[class] + 1 < counts[class] {
                share[class] += 1;
                left -= 1;
            }
        }
        if left == before {
            break;
        }
    }
    share
}
