//! Enumeration of ordered selections (k-permutations) of cluster indices.

/// Number of ordered selections of `k` distinct items out of `m`.
///
/// Saturates at `u64::MAX`. Zero when `k > m`.
#[must_use]
pub fn arrangement_count(m: usize, k: usize) -> u64 {
    if k > m {
        return 0;
    }
    (m - k + 1..=m).fold(1u64, |acc, f| acc.saturating_mul(f as u64))
}

/// Calls `visit` with every ordered selection of `k` distinct indices from
/// `0..m`, in lexicographic order starting with `[0, 1, .., k-1]`.
///
/// With `k == m` this visits every permutation. Nothing is visited when
/// `k > m`; a single empty selection is visited when `k == 0`.
pub fn for_each_arrangement<V>(m: usize, k: usize, mut visit: V)
where
    V: FnMut(&[usize]),
{
    if k > m {
        return;
    }
    let mut used = vec![false; m];
    let mut current = Vec::with_capacity(k);
    extend(m, k, &mut used, &mut current, &mut visit);
}

fn extend<V>(
    m: usize,
    k: usize,
    used: &mut [bool],
    current: &mut Vec<usize>,
    visit: &mut V,
) where
    V: FnMut(&[usize]),
{
    if current.len() == k {
        visit(current);
        return;
    }
    for i in 0..m {
        if used[i] {
            continue;
        }
        used[i] = true;
        current.push(i);
        extend(m, k, used, current, visit);
        current.pop();
        used[i] = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(m: usize, k: usize) -> Vec<Vec<usize>> {
        let mut out = Vec::new();
        for_each_arrangement(m, k, |a| out.push(a.to_vec()));
        out
    }

    #[test]
    fn test_permutations_of_three() {
        let all = collect(3, 3);
        assert_eq!(all.len(), 6);
        assert_eq!(all[0], vec![0, 1, 2]);
        assert_eq!(all[1], vec![0, 2, 1]);
        assert_eq!(all[5], vec![2, 1, 0]);
    }

    #[test]
    fn test_partial_selections() {
        let all = collect(3, 2);
        assert_eq!(
            all,
            vec![
                vec![0, 1],
                vec![0, 2],
                vec![1, 0],
                vec![1, 2],
                vec![2, 0],
                vec![2, 1]
            ]
        );
    }

    #[test]
    fn test_counts() {
        assert_eq!(arrangement_count(4, 4), 24);
        assert_eq!(arrangement_count(5, 2), 20);
        assert_eq!(arrangement_count(2, 3), 0);
        assert_eq!(arrangement_count(7, 0), 1);
        assert_eq!(collect(4, 4).len() as u64, arrangement_count(4, 4));
    }

    #[test]
    fn test_degenerate() {
        assert_eq!(collect(2, 0), vec![Vec::<usize>::new()]);
        assert!(collect(1, 2).is_empty());
    }
}
