// Compares the subset recursions against explicit sums over every edge subset.

#[macro_use] extern crate virial_assert_close;

#[macro_use]
mod shared;

use ::virial::cluster::{
    ClusterEvaluator, ClusterWheatley, ClusterTree, Configuration, DiagramKind, PairOracles, PairGeometry,
    Precision, Subset,
};
use ::virial::mayer::{MayerFunction, MayerGeneral, MayerHardSphere, LennardJones, Pair, SharedMayer, shared};

const TEMPERATURE: f64 = 1.5;

fn lj() -> SharedMayer { shared(MayerGeneral::new(LennardJones::default())) }

fn bond(f: &SharedMayer, geometry: &PairGeometry) -> impl Fn(usize, usize) -> f64 {
    let f = f.clone();
    let r2: Vec<Vec<f64>> = (0..geometry.point_count())
        .map(|i| (0..geometry.point_count()).map(|j| if i == j { 0.0 } else { geometry.r2(i, j) }).collect())
        .collect();
    move |a, b| f.f(Pair::new(a, b), r2[a][b], 1.0 / TEMPERATURE).unwrap()
}

/// Moves every point of `geometry` to `config`, announcing it as a single trial
/// that every cluster accepts.
fn relocate(geometry: &mut PairGeometry, clusters: &mut [&mut dyn ClusterEvaluator], config: Configuration) {
    let all = Subset::full(geometry.point_count());
    for cluster in clusters.iter_mut() {
        cluster.trial_notify(all).unwrap();
    }
    geometry.set_configuration(config).unwrap();
    for cluster in clusters.iter_mut() {
        cluster.accept_notify().unwrap();
    }
}

fn wheatley(n: usize, kind: DiagramKind, precision: Precision) -> ClusterWheatley {
    let oracles = PairOracles::uniform(n, lj()).unwrap();
    let mut cluster = ClusterWheatley::new(oracles, kind, 0, precision).unwrap().with_coefficient(1.0);
    cluster.set_temperature(TEMPERATURE).unwrap();
    cluster
}

#[test]
fn lennard_jones_diagram_sums() {
    shared::init_logger();
    let mut rng = shared::rng(17);
    for n in 2..=5 {
        for _ in 0..5 {
            let geometry = shared::random_geometry(&mut rng, n, 1.6);
            let f = bond(&lj(), &geometry);

            let expected = shared::graphs::biconnected_sum(n, &f);
            let actual = wheatley(n, DiagramKind::Biconnected, Precision::Double).value(&geometry).unwrap();
            assert_close!(rel=1e-9, abs=1e-12, actual, expected, "biconnected, n = {}", n);

            let expected = shared::graphs::connected_sum(n, &f);
            let actual = wheatley(n, DiagramKind::Connected, Precision::Double).value(&geometry).unwrap();
            assert_close!(rel=1e-9, abs=1e-12, actual, expected, "connected, n = {}", n);

            let expected = shared::graphs::tree_sum(n, &f);
            let mut tree = ClusterTree::uniform(n, lj()).unwrap().with_coefficient(1.0);
            tree.set_temperature(TEMPERATURE).unwrap();
            let actual = tree.value(&geometry).unwrap();
            assert_close!(rel=1e-9, abs=1e-12, actual, expected, "trees, n = {}", n);
        }
    }
}

#[test]
fn precisions_agree() {
    let mut rng = shared::rng(3);
    let n = 5;
    let mut double = wheatley(n, DiagramKind::Biconnected, Precision::Double);
    let mut decimal = wheatley(n, DiagramKind::Biconnected, Precision::Decimal { digits: 40 });
    let mut adaptive = wheatley(n, DiagramKind::Biconnected, Precision::Adaptive { tolerance: 1e-12 });

    let mut geometry = shared::random_geometry(&mut rng, n, 1.4);
    for step in 0..10 {
        if step > 0 {
            let config = shared::random_configuration(&mut rng, n, 1.4);
            relocate(&mut geometry, &mut [&mut double, &mut decimal, &mut adaptive], config);
        }
        let expected = decimal.value(&geometry).unwrap();
        assert_close!(rel=1e-9, abs=1e-12, double.value(&geometry).unwrap(), expected);
        assert_close!(rel=1e-9, abs=1e-12, adaptive.value(&geometry).unwrap(), expected);
    }
    assert_eq!(adaptive.fallback_stats().evaluations, 10);
}

#[test]
fn exact_hard_spheres() {
    let mut rng = shared::rng(99);
    let n = 5;
    let hs: SharedMayer = shared(MayerHardSphere::new(1.0));
    for kind in vec![DiagramKind::Connected, DiagramKind::Biconnected] {
        let mut cluster = ClusterWheatley::hard_sphere(n, 1.0, kind).unwrap().with_coefficient(1.0);
        cluster.set_temperature(1.0).unwrap();
        let mut geometry = shared::random_geometry(&mut rng, n, 1.0);
        for step in 0..10 {
            if step > 0 {
                let config = shared::random_configuration(&mut rng, n, 1.0);
                relocate(&mut geometry, &mut [&mut cluster], config);
            }
            let f = bond(&hs, &geometry);
            let expected = match kind {
                DiagramKind::Connected => shared::graphs::connected_sum(n, &f),
                DiagramKind::Biconnected => shared::graphs::biconnected_sum(n, &f),
            };
            // integers, so exact
            assert_eq!(cluster.value(&geometry).unwrap(), expected);
        }
    }
}

#[test]
fn bonds_never_read_the_diagonal() {
    let mut rng = shared::rng(5);
    let n = 4;
    let geometry = shared::random_geometry(&mut rng, n, 1.6);
    let before: Vec<f64> = shared::graphs::pairs(n).into_iter().map(|(i, j)| geometry.r2(i, j)).collect();
    let f = bond(&lj(), &geometry);
    for i in 0..n {
        assert_eq!(geometry.r2(i, i), 0.0);
    }
    let after: Vec<f64> = shared::graphs::pairs(n).into_iter().map(|(i, j)| geometry.r2(i, j)).collect();
    assert_eq!(before, after);

    let expected = shared::graphs::biconnected_sum(n, &f);
    let actual = wheatley(n, DiagramKind::Biconnected, Precision::Double).value(&geometry).unwrap();
    assert_close!(rel=1e-9, abs=1e-12, actual, expected);
}

#[test]
fn derivatives_match_finite_differences() {
    let mut rng = shared::rng(41);
    let n = 4;
    let geometry = shared::random_geometry(&mut rng, n, 1.5);
    let oracles = || PairOracles::uniform(n, lj()).unwrap();
    let mut cluster = ClusterWheatley::new(oracles(), DiagramKind::Biconnected, 1, Precision::Double).unwrap();
    cluster.set_temperature(TEMPERATURE).unwrap();
    let values = cluster.all_last_values(&geometry).unwrap();
    assert_eq!(values.len(), 2);

    // d/d(beta) by central difference
    let h = 1e-5;
    let beta = 1.0 / TEMPERATURE;
    let at = |beta: f64| {
        let mut c = ClusterWheatley::new(oracles(), DiagramKind::Biconnected, 0, Precision::Double).unwrap();
        c.set_temperature(1.0 / beta).unwrap();
        c.value(&geometry).unwrap()
    };
    let numeric = (at(beta + h) - at(beta - h)) / (2.0 * h);
    for (label, value) in zip_eq!(vec!["value", "derivative"], vec![values[0], values[1]]) {
        assert!(value.is_finite(), "{} is not finite", label);
    }
    assert_close!(rel=1e-5, abs=1e-8, values[1], numeric);
}
