//! Minimum-cost bipartite assignment (Hungarian method with potentials).
//!
//! Runs in `O(n^2 m)` for an `n x m` cost matrix with `n <= m`, replacing
//! the factorial search when plane multiplicities are large.

/// Stand-in cost for non-finite entries.
const FORBIDDEN_COST: f64 = 1e9;

/// Assigns each of `rows` rows to a distinct column out of `cols`, minimising
/// the summed cost.
///
/// `cost(row, col)` is queried for every pair. Returns, per row, the chosen
/// column. `rows` must not exceed `cols`; otherwise `None` is returned.
#[must_use]
pub fn solve<C>(rows: usize, cols: usize, cost: C) -> Option<Vec<usize>>
where
    C: Fn(usize, usize) -> f64,
{
    if rows > cols {
        return None;
    }
    if rows == 0 {
        return Some(Vec::new());
    }

    let matrix: Vec<Vec<f64>> = (0..rows)
        .map(|r| {
            (0..cols)
                .map(|c| {
                    let value = cost(r, c);
                    if value.is_finite() {
                        value
                    } else {
                        FORBIDDEN_COST
                    }
                })
                .collect()
        })
        .collect();

    // 1-based arrays; index 0 is the virtual start column.
    let mut u = vec![0.0; rows + 1];
    let mut v = vec![0.0; cols + 1];
    let mut owner = vec![0usize; cols + 1];
    let mut way = vec![0usize; cols + 1];

    for row in 1..=rows {
        owner[0] = row;
        let mut col0 = 0;
        let mut min_slack = vec![f64::INFINITY; cols + 1];
        let mut visited = vec![false; cols + 1];

        loop {
            visited[col0] = true;
            let r0 = owner[col0];
            let mut delta = f64::INFINITY;
            let mut col1 = 0;

            for col in 1..=cols {
                if visited[col] {
                    continue;
                }
                let reduced = matrix[r0 - 1][col - 1] - u[r0] - v[col];
                if reduced < min_slack[col] {
                    min_slack[col] = reduced;
                    way[col] = col0;
                }
                if min_slack[col] < delta {
                    delta = min_slack[col];
                    col1 = col;
                }
            }

            if col1 == 0 {
                return None;
            }

            for col in 0..=cols {
                if visited[col] {
                    u[owner[col]] += delta;
                    v[col] -= delta;
                } else {
                    min_slack[col] -= delta;
                }
            }

            col0 = col1;
            if owner[col0] == 0 {
                break;
            }
        }

        loop {
            let prev = way[col0];
            owner[col0] = owner[prev];
            col0 = prev;
            if col0 == 0 {
                break;
            }
        }
    }

    let mut assignment = vec![0usize; rows];
    for col in 1..=cols {
        if owner[col] != 0 {
            assignment[owner[col] - 1] = col - 1;
        }
    }
    Some(assignment)
}
