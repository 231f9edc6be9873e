//! Minimum-cost bipartite assignment
//!
//! Hungarian method with row/column potentials, O(rows² · cols). Every row
//! receives a distinct column; callers guarantee `rows <= cols` (the voice
//! matcher adds one "no link" column per row for that purpose).

/// Assign each row a distinct column, minimizing the total cost
///
/// Returns the chosen column for every row. Ties are broken towards lower
/// column indices.
pub fn solve(rows: usize, cols: usize, cost: impl Fn(usize, usize) -> i64) -> Vec<usize> {
    debug_assert!(rows <= cols, "assignment needs at least as many columns as rows");
    if rows == 0 || rows > cols {
        return Vec::new();
    }

    const INF: i64 = i64::MAX / 4;

    // 1-based potentials; column 0 is the virtual start column
    let mut u = vec![0i64; rows + 1];
    let mut v = vec![0i64; cols + 1];
    let mut owner = vec![0usize; cols + 1];
    let mut way = vec![0usize; cols + 1];

    for row in 1..=rows {
        owner[0] = row;
        let mut j0 = 0;
        let mut min_slack = vec![INF; cols + 1];
        let mut used = vec![false; cols + 1];

        loop {
            used[j0] = true;
            let i0 = owner[j0];
            let mut delta = INF;
            let mut j1 = 0;
            for j in 1..=cols {
                if used[j] {
                    continue;
                }
                let slack = cost(i0 - 1, j - 1) - u[i0] - v[j];
                if slack < min_slack[j] {
                    min_slack[j] = slack;
                    way[j] = j0;
                }
                if min_slack[j] < delta {
                    delta = min_slack[j];
                    j1 = j;
                }
            }
            for j in 0..=cols {
                if used[j] {
                    u[owner[j]] += delta;
                    v[j] -= delta;
                } else {
                    min_slack[j] -= delta;
                }
            }
            j0 = j1;
            if owner[j0] == 0 {
                break;
            }
        }

        // Augment along the alternating path
        loop {
            let j1 = way[j0];
            owner[j0] = owner[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut assignment = vec![0usize; rows];
    for j in 1..=cols {
        if owner[j] != 0 {
            assignment[owner[j] - 1] = j - 1;
        }
    }
    assignment
}
