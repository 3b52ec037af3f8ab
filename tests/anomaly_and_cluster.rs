//! Integration tests for the anomaly detector and K-means clustering.

use ndarray::{arr1, arr2, Array2};
use strata_analytics::anomaly::NearestNeighborAD;
use strata_analytics::cluster::{KMeans, KMeansParams};

// ---------------------------------------------------------------------------
// NearestNeighborAD
// ---------------------------------------------------------------------------

#[test]
fn reference_scenario_flags_far_points_only() {
    let refs = arr2(&[[1.0, -2.0, -1.0], [1.0, 1.0, -3.0]]);
    let mut detector = NearestNeighborAD::new(0.34).unwrap();
    detector.fit(refs).unwrap();

    assert_eq!(detector.predict(arr1(&[20.0, 20.0]).view()).unwrap(), 1);
    assert_eq!(detector.predict(arr1(&[1.0, 1.0]).view()).unwrap(), 0);
    assert_eq!(detector.predict(arr1(&[0.9, 1.1]).view()).unwrap(), 0);
}

#[test]
fn rate_validation_is_fatal_at_construction() {
    assert!(NearestNeighborAD::new(-0.1).is_err());
    assert!(NearestNeighborAD::new(0.0).is_err());
    assert!(NearestNeighborAD::new(1.01).is_err());
}

#[test]
fn update_absorbs_new_region() {
    let refs = arr2(&[[0.0, 1.0, 0.5], [0.0, 0.0, 1.0]]);
    let mut detector = NearestNeighborAD::new(0.5).unwrap();
    detector.fit(refs).unwrap();
    assert_eq!(detector.predict(arr1(&[10.0, 10.0]).view()).unwrap(), 1);

    detector
        .update(&arr2(&[[10.0, 10.5], [10.0, 10.5]]))
        .unwrap();
    assert_eq!(detector.predict(arr1(&[10.2, 10.2]).view()).unwrap(), 0);
}

#[test]
fn decision_function_is_nearest_squared_distance() {
    let refs = arr2(&[[0.0, 4.0], [0.0, 0.0]]);
    let mut detector = NearestNeighborAD::new(1.0).unwrap();
    detector.fit(refs).unwrap();

    let d = detector.decision_function(arr1(&[1.0, 0.0]).view()).unwrap();
    assert!((d - 1.0).abs() < 1e-12);
}

#[test]
fn detector_state_round_trips_through_save() {
    let refs = arr2(&[[1.0, -2.0, -1.0], [1.0, 1.0, -3.0]]);
    let mut detector = NearestNeighborAD::new(0.34).unwrap();
    detector.fit(refs).unwrap();

    let mut buf = Vec::new();
    detector.save(&mut buf).unwrap();
    let restored = NearestNeighborAD::load(buf.as_slice()).unwrap();

    assert_eq!(detector.threshold(), restored.threshold());
    assert_eq!(
        detector.predict(arr1(&[20.0, 20.0]).view()).unwrap(),
        restored.predict(arr1(&[20.0, 20.0]).view()).unwrap()
    );
}

// ---------------------------------------------------------------------------
// KMeans
// ---------------------------------------------------------------------------

fn blobs() -> Array2<f64> {
    arr2(&[
        [0.0, 0.2, 0.1, 5.0, 5.2, 5.1, -4.0, -4.2, -4.1],
        [0.0, 0.1, -0.1, 5.0, 5.1, 4.9, 4.0, 4.1, 3.9],
    ])
}

#[test]
fn fit_terminates_and_groups_blobs() {
    let _ = env_logger::builder().is_test(true).try_init();
    let x = blobs();
    let mut model = KMeans::new(KMeansParams {
        k: 3,
        iter: 50,
        fit_idx: Some(vec![0, 3, 6]),
    });
    model.fit(&x).unwrap();

    let assignments = model.assignments().unwrap().to_vec();
    for blob in [&assignments[0..3], &assignments[3..6], &assignments[6..9]] {
        assert!(blob.iter().all(|&a| a == blob[0]));
    }
    assert_ne!(assignments[0], assignments[3]);
    assert_ne!(assignments[3], assignments[6]);
}

#[test]
fn random_initialization_keeps_all_clusters_populated() {
    let x = blobs();
    // repeated runs with random starting columns must never end with an
    // empty cluster thanks to the damped centroid update
    for _ in 0..10 {
        let mut model = KMeans::new(KMeansParams {
            k: 3,
            iter: 100,
            fit_idx: None,
        });
        model.fit(&x).unwrap();
        let mut counts = vec![0usize; 3];
        for &a in model.assignments().unwrap() {
            counts[a] += 1;
        }
        assert!(counts.iter().all(|&c| c > 0), "counts: {:?}", counts);
    }
}

#[test]
fn predict_is_consistent_with_transform() {
    let x = blobs();
    let mut model = KMeans::new(KMeansParams {
        k: 3,
        iter: 50,
        fit_idx: Some(vec![0, 3, 6]),
    });
    model.fit(&x).unwrap();

    let predicted = model.predict(&x).unwrap();
    let distances = model.transform(&x).unwrap();
    for (j, &cluster) in predicted.iter().enumerate() {
        // predicted cluster has the smallest squared distance in column j
        let column = distances.column(j);
        let min = column.iter().cloned().fold(f64::INFINITY, f64::min);
        assert!((column[cluster] - min).abs() < 1e-9);
    }
}

#[test]
fn permutation_relabels_assignments_and_predictions() {
    let x = blobs();
    let mut model = KMeans::new(KMeansParams {
        k: 3,
        iter: 50,
        fit_idx: Some(vec![0, 3, 6]),
    });
    model.fit(&x).unwrap();
    let before = model.assignments().unwrap().to_vec();

    let mapping = [1usize, 2, 0];
    model.permute_centroids(&mapping).unwrap();
    let after = model.assignments().unwrap().to_vec();
    for (b, a) in before.iter().zip(after.iter()) {
        assert_eq!(mapping[*b], *a);
    }
    // predictions agree with the relabeled assignments
    assert_eq!(model.predict(&x).unwrap(), after);
}

#[test]
fn oversized_k_and_bad_fit_idx_error() {
    let x = arr2(&[[1.0, 2.0], [0.0, 0.0]]);
    let mut too_many = KMeans::new(KMeansParams {
        k: 3,
        iter: 10,
        fit_idx: None,
    });
    assert!(too_many.fit(&x).is_err());

    let mut bad_idx = KMeans::new(KMeansParams {
        k: 2,
        iter: 10,
        fit_idx: Some(vec![0, 7]),
    });
    assert!(bad_idx.fit(&x).is_err());
}

#[test]
fn model_survives_serialization() {
    let x = blobs();
    let mut model = KMeans::new(KMeansParams {
        k: 3,
        iter: 50,
        fit_idx: Some(vec![0, 3, 6]),
    });
    model.fit(&x).unwrap();

    let mut buf = Vec::new();
    model.save(&mut buf).unwrap();
    let restored = KMeans::load(buf.as_slice()).unwrap();
    assert_eq!(model.predict(&x).unwrap(), restored.predict(&x).unwrap());
}
