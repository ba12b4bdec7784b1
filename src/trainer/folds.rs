//! Subject-wise fold partitioning
//!
//! Folds are built over distinct subject ids, never over individual windows,
//! so every window belonging to a subject lands wholly in train or wholly in
//! test for any given fold.

use rand::seq::SliceRandom;
use rand::SeedableRng;

/// One train/test split over subject ids.
#[derive(Debug, Clone)]
pub struct SubjectFold {
    pub index: usize,
    pub train_subjects: Vec<usize>,
    pub test_subjects: Vec<usize>,
}

/// Distinct subject ids in ascending order.
pub fn distinct_subjects(subject_per_window: &[usize]) -> Vec<usize> {
    let mut subjects: Vec<usize> = subject_per_window.to_vec();
    subjects.sort_unstable();
    subjects.dedup();
    subjects
}

/// Partitions subject ids into up to `k` disjoint folds.
///
/// Subjects are shuffled with a seeded RNG and divided as evenly as
/// possible; when the count does not divide by `k`, the later folds take
/// one extra subject each. Folds that would be empty (more folds than
/// subjects) are dropped rather than emitted.
pub fn partition_subjects(subjects: &[usize], k: usize, seed: u64) -> Vec<SubjectFold> {
    if subjects.is_empty() || k == 0 {
        return Vec::new();
    }

    let mut shuffled = subjects.to_vec();
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    shuffled.shuffle(&mut rng);

    let base = shuffled.len() / k;
    let remainder = shuffled.len() % k;

    let mut folds = Vec::new();
    let mut cursor = 0;
    for i in 0..k {
        let size = base + usize::from(i >= k - remainder);
        if size == 0 {
            continue;
        }

        let test_subjects = shuffled[cursor..cursor + size].to_vec();
        let train_subjects = shuffled
            .iter()
            .enumerate()
            .filter(|(pos, _)| *pos < cursor || *pos >= cursor + size)
            .map(|(_, &id)| id)
            .collect();

        folds.push(SubjectFold {
            index: folds.len(),
            train_subjects,
            test_subjects,
        });
        cursor += size;
    }

    folds
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_folds_are_disjoint_and_cover_all_subjects() {
        let subjects: Vec<usize> = (0..17).collect();
        let folds = partition_subjects(&subjects, 5, 99);

        assert_eq!(folds.len(), 5);

        let mut seen_in_test = HashSet::new();
        for fold in &folds {
            let train: HashSet<usize> = fold.train_subjects.iter().copied().collect();
            let test: HashSet<usize> = fold.test_subjects.iter().copied().collect();

            assert!(train.is_disjoint(&test));
            assert_eq!(train.len() + test.len(), subjects.len());

            for id in &fold.test_subjects {
                assert!(seen_in_test.insert(*id), "subject {id} tested twice");
            }
        }
        assert_eq!(seen_in_test.len(), subjects.len());
    }

    #[test]
    fn test_fold_sizes_differ_by_at_most_one() {
        let subjects: Vec<usize> = (0..23).collect();
        let folds = partition_subjects(&subjects, 5, 7);

        let sizes: Vec<usize> = folds.iter().map(|f| f.test_subjects.len()).collect();
        let min = sizes.iter().min().unwrap();
        let max = sizes.iter().max().unwrap();
        assert!(max - min <= 1);
        assert_eq!(sizes.iter().sum::<usize>(), 23);
    }

    #[test]
    fn test_same_seed_reproduces_partition() {
        let subjects: Vec<usize> = (0..12).collect();
        let a = partition_subjects(&subjects, 4, 3);
        let b = partition_subjects(&subjects, 4, 3);

        for (fa, fb) in a.iter().zip(b.iter()) {
            assert_eq!(fa.test_subjects, fb.test_subjects);
            assert_eq!(fa.train_subjects, fb.train_subjects);
        }
    }

    #[test]
    fn test_fewer_subjects_than_folds_drops_empty_folds() {
        let subjects = vec![3, 8];
        let folds = partition_subjects(&subjects, 5, 1);

        assert_eq!(folds.len(), 2);
        for fold in &folds {
            assert_eq!(fold.test_subjects.len(), 1);
            assert_eq!(fold.train_subjects.len(), 1);
        }
    }

    #[test]
    fn test_distinct_subjects_dedupes_window_ids() {
        let per_window = vec![4, 1, 4, 2, 1, 1, 9];
        assert_eq!(distinct_subjects(&per_window), vec![1, 2, 4, 9]);
    }
}
