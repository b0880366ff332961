/// Train / validation / test index partitioning
///
/// Every row gets independent uniform draws instead of a global shuffle, so
/// the subset sizes are binomial rather than exact.
use rand::Rng;

/// Row indices per subset, in original row order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSplit {
    pub train: Vec<usize>,
    /// `None` when no non-test row was left for validation
    pub validation: Option<Vec<usize>>,
    pub test: Vec<usize>,
}

impl IndexSplit {
    /// (train, validation, test) counts; an absent validation counts as 0
    pub fn sizes(&self) -> (usize, usize, usize) {
        (
            self.train.len(),
            self.validation.as_ref().map_or(0, Vec::len),
            self.test.len(),
        )
    }
}

/// Partition `0..n` into test, then split the rest into train and validation
///
/// Row `i` is test when its draw is below `test_split`. Each remaining row is
/// train when a second draw is below `train_split`, validation otherwise.
pub fn split_indices<R: Rng + ?Sized>(
    n: usize,
    test_split: f64,
    train_split: f64,
    rng: &mut R,
) -> crate::Result<IndexSplit> {
    check_fraction("test_split", test_split)?;
    check_fraction("train_split", train_split)?;

    let test_mask: Vec<bool> = (0..n).map(|_| rng.gen::<f64>() < test_split).collect();

    let mut test = Vec::new();
    let mut other = Vec::new();
    for (idx, &is_test) in test_mask.iter().enumerate() {
        if is_test {
            test.push(idx);
        } else {
            other.push(idx);
        }
    }

    let train_mask: Vec<bool> = other.iter().map(|_| rng.gen::<f64>() < train_split).collect();

    let mut train = Vec::new();
    let mut validation = Vec::new();
    for (&idx, &is_train) in other.iter().zip(&train_mask) {
        if is_train {
            train.push(idx);
        } else {
            validation.push(idx);
        }
    }

    let validation = if validation.is_empty() {
        None
    } else {
        Some(validation)
    };

    Ok(IndexSplit {
        train,
        validation,
        test,
    })
}

fn check_fraction(name: &str, value: f64) -> crate::Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(crate::MnistError::Config(format!(
            "{} must be within [0, 1], got {}",
            name, value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_disjoint_and_covering() -> crate::Result<()> {
        let mut rng = StdRng::seed_from_u64(7);

        for &(n, p_test, p_train) in &[(0, 0.2, 0.8), (1, 0.5, 0.5), (100, 0.2, 0.8), (1000, 0.5, 0.3)] {
            let split = split_indices(n, p_test, p_train, &mut rng)?;
            let val = split.validation.clone().unwrap_or_default();

            let mut seen = HashSet::new();
            for &idx in split.train.iter().chain(&val).chain(&split.test) {
                assert!(idx < n);
                assert!(seen.insert(idx), "index {} appears twice", idx);
            }
            assert_eq!(seen.len(), n);
        }
        Ok(())
    }

    #[test]
    fn test_all_test() -> crate::Result<()> {
        let mut rng = StdRng::seed_from_u64(1);
        let split = split_indices(50, 1.0, 0.7, &mut rng)?;

        assert_eq!(split.test, (0..50).collect::<Vec<_>>());
        assert!(split.train.is_empty());
        assert_eq!(split.validation, None);
        Ok(())
    }

    #[test]
    fn test_all_train_means_no_validation() -> crate::Result<()> {
        let mut rng = StdRng::seed_from_u64(2);
        let split = split_indices(50, 0.0, 1.0, &mut rng)?;

        assert!(split.test.is_empty());
        assert_eq!(split.train.len(), 50);
        assert_eq!(split.validation, None);
        assert_eq!(split.sizes(), (50, 0, 0));
        Ok(())
    }

    #[test]
    fn test_no_train() -> crate::Result<()> {
        let mut rng = StdRng::seed_from_u64(3);
        let split = split_indices(20, 0.0, 0.0, &mut rng)?;

        assert!(split.train.is_empty());
        assert_eq!(split.validation, Some((0..20).collect()));
        Ok(())
    }

    #[test]
    fn test_seeded_split_is_reproducible() -> crate::Result<()> {
        let a = split_indices(500, 0.1, 0.9, &mut StdRng::seed_from_u64(42))?;
        let b = split_indices(500, 0.1, 0.9, &mut StdRng::seed_from_u64(42))?;
        assert_eq!(a, b);
        Ok(())
    }

    #[test]
    fn test_sizes_are_roughly_proportional() -> crate::Result<()> {
        let mut rng = StdRng::seed_from_u64(11);
        let (train, val, test) = split_indices(10_000, 0.2, 0.75, &mut rng)?.sizes();

        // Binomial spread at n=10k is well under these bounds
        assert!((1700..2300).contains(&test), "test = {}", test);
        assert!((5600..6400).contains(&train), "train = {}", train);
        assert_eq!(train + val + test, 10_000);
        Ok(())
    }

    #[test]
    fn test_rejects_out_of_range_fraction() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(split_indices(10, -0.1, 0.5, &mut rng).is_err());
        assert!(split_indices(10, 0.1, 1.01, &mut rng).is_err());
    }
}
