//! Brute-force diagram sums over every edge subset of the complete graph.

use ::itertools::Itertools;

pub fn pairs(n: usize) -> Vec<(usize, usize)> {
    (0..n).tuple_combinations().collect()
}

fn component_count(n: usize, edges: &[(usize, usize)], removed: Option<usize>) -> usize {
    let mut parent: Vec<usize> = (0..n).collect();
    fn find(parent: &mut [usize], mut x: usize) -> usize {
        while parent[x] != x {
            parent[x] = parent[parent[x]];
            x = parent[x];
        }
        x
    }
    for &(a, b) in edges {
        if Some(a) == removed || Some(b) == removed {
            continue;
        }
        let (ra, rb) = (find(&mut parent, a), find(&mut parent, b));
        parent[ra] = rb;
    }
    (0..n)
        .filter(|&x| Some(x) != removed)
        .filter(|&x| find(&mut parent, x) == x)
        .count()
}

pub fn is_connected(n: usize, edges: &[(usize, usize)]) -> bool {
    component_count(n, edges, None) == 1
}

/// Connected, and still connected after deleting any one point.
pub fn is_biconnected(n: usize, edges: &[(usize, usize)]) -> bool {
    is_connected(n, edges) && (n <= 2 || (0..n).all(|x| component_count(n, edges, Some(x)) == 1))
}

/// Sum over edge subsets accepted by `keep` of the product of `f` over the chosen edges.
pub fn diagram_sum(
    n: usize,
    f: impl Fn(usize, usize) -> f64,
    keep: impl Fn(usize, &[(usize, usize)]) -> bool,
) -> f64 {
    let all = pairs(n);
    let mut total = 0.0;
    for mask in 0..(1u64 << all.len()) {
        let edges: Vec<_> = all.iter().enumerate()
            .filter(|&(k, _)| mask & (1 << k) != 0)
            .map(|(_, &e)| e)
            .collect();
        if keep(n, &edges) {
            total += edges.iter().map(|&(a, b)| f(a, b)).product::<f64>();
        }
    }
    total
}

pub fn connected_sum(n: usize, f: impl Fn(usize, usize) -> f64) -> f64 {
    diagram_sum(n, f, is_connected)
}

pub fn biconnected_sum(n: usize, f: impl Fn(usize, usize) -> f64) -> f64 {
    diagram_sum(n, f, is_biconnected)
}

/// Trees are the connected diagrams with `n - 1` edges.
pub fn tree_sum(n: usize, f: impl Fn(usize, usize) -> f64) -> f64 {
    diagram_sum(n, f, |n, edges| edges.len() + 1 == n && is_connected(n, edges))
}
