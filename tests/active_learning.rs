//! Integration tests for the active-learning controller.

use ndarray::{arr1, arr2, Array1, Array2};
use strata_analytics::active_learning::{
    ActiveLearner, ActiveLearnerSettings, Answer, CandidateLabel, Mode,
};
use strata_analytics::error::Result;
use strata_analytics::features::FeatureExtractor;
use strata_analytics::models::{BinaryModelFactory, LinearSvc, LinearSvcParams};

fn svc_factory() -> impl BinaryModelFactory<Model = LinearSvc> {
    || LinearSvc::new(LinearSvcParams::default())
}

/// Ten candidates in two groups: the first five resemble the query
/// direction, the last five are orthogonal to it.
fn candidates() -> Array2<f64> {
    arr2(&[
        [1.0, 0.95, 0.9, 0.85, 0.8, 0.05, 0.1, 0.0, 0.15, 0.1],
        [0.0, 0.1, 0.2, 0.15, 0.25, 1.0, 0.9, 1.1, 0.95, 1.05],
    ])
}

fn settings(n_pos: usize, n_neg: usize) -> ActiveLearnerSettings {
    ActiveLearnerSettings {
        n_pos,
        n_neg,
        ..ActiveLearnerSettings::default()
    }
}

fn learner(
    n_pos: usize,
    n_neg: usize,
) -> ActiveLearner<impl BinaryModelFactory<Model = LinearSvc>> {
    ActiveLearner::from_precomputed(
        Some(arr1(&[1.0, 0.0])),
        Some(candidates()),
        svc_factory(),
        settings(n_pos, n_neg),
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

#[test]
fn precomputed_inputs_are_mandatory() {
    let missing_query: Result<ActiveLearner<_>> =
        ActiveLearner::from_precomputed(None, Some(candidates()), svc_factory(), settings(1, 1));
    assert!(missing_query.is_err());

    let missing_matrix: Result<ActiveLearner<_>> = ActiveLearner::from_precomputed(
        Some(arr1(&[1.0, 0.0])),
        None,
        svc_factory(),
        settings(1, 1),
    );
    assert!(missing_matrix.is_err());
}

#[test]
fn records_are_extracted_and_pooled() {
    /// Passthrough extractor over 2-d points; the query text "x" or "y"
    /// selects a unit direction.
    struct PointExtractor;
    impl FeatureExtractor<[f64; 2]> for PointExtractor {
        fn dim(&self) -> usize {
            2
        }
        fn extract_vector(&self, record: &[f64; 2]) -> Result<Array1<f64>> {
            Ok(arr1(record))
        }
        fn extract_query(&self, query: &str) -> Result<Array1<f64>> {
            Ok(match query {
                "x" => arr1(&[1.0, 0.0]),
                _ => arr1(&[0.0, 1.0]),
            })
        }
    }

    let near: Vec<[f64; 2]> = vec![[1.0, 0.0], [0.9, 0.1]];
    let far: Vec<[f64; 2]> = vec![[0.0, 1.0], [0.1, 0.9]];
    let al = ActiveLearner::from_records(
        "x",
        &near,
        &far,
        &PointExtractor,
        svc_factory(),
        settings(1, 1),
    )
    .unwrap();
    assert_eq!(al.candidate_count(), 4);

    let (sims, _) = al.similarity_ranking();
    // similarities are sorted ascending and bounded by cosine range
    for pair in sims.windows(2) {
        assert!(pair[0] <= pair[1]);
    }
    assert!(sims.iter().all(|s| (-1.0..=1.0).contains(s)));
}

// ---------------------------------------------------------------------------
// Query mode
// ---------------------------------------------------------------------------

#[test]
fn query_mode_alternates_similar_and_dissimilar() {
    let mut al = learner(2, 2);

    // with no labels yet, the first offers chase positives from the
    // most-similar end
    let first = al.select_question().unwrap().unwrap();
    al.get_answer(Answer::Positive, first).unwrap();
    let second = al.select_question().unwrap().unwrap();
    al.get_answer(Answer::Positive, second).unwrap();

    let (sims, perm) = {
        let (s, p) = al.similarity_ranking();
        (s.to_vec(), p.to_vec())
    };
    assert_eq!(first, perm[perm.len() - 1]);
    assert_eq!(second, perm[perm.len() - 2]);
    assert!(sims[perm.len() - 1] >= sims[perm.len() - 2]);

    // positives satisfied; next offers come from the least-similar end
    let third = al.select_question().unwrap().unwrap();
    assert_eq!(third, perm[0]);
}

#[test]
fn transition_happens_exactly_at_thresholds() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut al = learner(1, 1);

    let q1 = al.select_question().unwrap().unwrap();
    al.get_answer(Answer::Positive, q1).unwrap();
    assert_eq!(al.mode(), Mode::Query);

    let q2 = al.select_question().unwrap().unwrap();
    al.get_answer(Answer::Negative, q2).unwrap();
    assert_eq!(al.mode(), Mode::Query);

    // the transition is observed on the next selection
    al.select_question().unwrap().unwrap();
    assert_eq!(al.mode(), Mode::Margin);
}

#[test]
fn transition_ignores_how_many_questions_were_asked() {
    let mut al = learner(1, 1);

    // refuse the first several suggestions by answering against the seed
    // polarity the controller hoped for
    let q1 = al.select_question().unwrap().unwrap();
    al.get_answer(Answer::Negative, q1).unwrap();
    let q2 = al.select_question().unwrap().unwrap();
    al.get_answer(Answer::Negative, q2).unwrap();
    assert_eq!(al.mode(), Mode::Query);

    let q3 = al.select_question().unwrap().unwrap();
    al.get_answer(Answer::Positive, q3).unwrap();

    al.select_question().unwrap().unwrap();
    assert_eq!(al.mode(), Mode::Margin);
}

// ---------------------------------------------------------------------------
// Margin mode
// ---------------------------------------------------------------------------

fn advance_to_margin_mode(
    al: &mut ActiveLearner<impl BinaryModelFactory<Model = LinearSvc>>,
) -> (usize, usize) {
    let pos = al.select_question().unwrap().unwrap();
    al.get_answer(Answer::Positive, pos).unwrap();
    let neg = al.select_question().unwrap().unwrap();
    al.get_answer(Answer::Negative, neg).unwrap();
    (pos, neg)
}

#[test]
fn margin_mode_offers_only_unlabeled_candidates() {
    let mut al = learner(1, 1);
    let (pos, neg) = advance_to_margin_mode(&mut al);

    let mut seen = vec![pos, neg];
    while seen.len() < al.candidate_count() {
        let idx = al.select_question().unwrap().unwrap();
        assert!(!seen.contains(&idx), "candidate {} offered twice", idx);
        al.get_answer(Answer::Negative, idx).unwrap();
        seen.push(idx);
    }
}

#[test]
fn positives_follow_labels_and_margins() {
    let mut al = learner(1, 1);
    let (pos, neg) = advance_to_margin_mode(&mut al);
    al.select_question().unwrap().unwrap();

    let positives = al.positives(f64::MIN).unwrap();
    assert!(positives.contains(&pos));
    assert!(!positives.contains(&neg));

    let none = al.positives(f64::MAX).unwrap();
    // only the explicitly labeled positive survives an impossible cut
    assert_eq!(none, vec![pos]);
}

#[test]
fn top_positive_ranks_labeled_positive_first() {
    let mut al = learner(1, 1);
    let (pos, _) = advance_to_margin_mode(&mut al);
    al.select_question().unwrap().unwrap();

    let top = al.top_positive(3).unwrap();
    assert_eq!(top.len(), 3);
    assert_eq!(top[0].0, pos);
    assert!(top[0].1 >= top[1].1 && top[1].1 >= top[2].1);
}

#[test]
fn model_is_saved_only_in_margin_mode() {
    let mut al = learner(1, 1);
    let mut buf = Vec::new();
    assert!(al.save_model(&mut buf).is_err());

    advance_to_margin_mode(&mut al);
    al.select_question().unwrap().unwrap();
    al.save_model(&mut buf).unwrap();
    assert!(!buf.is_empty());
}

#[test]
fn query_mode_exhaustion_yields_none() {
    // two candidates but three positives required: the positive cursor
    // runs dry, then the negative side, then nothing is left to offer
    let candidates = arr2(&[[1.0, 0.9], [0.0, 0.1]]);
    let mut al = ActiveLearner::from_precomputed(
        Some(arr1(&[1.0, 0.0])),
        Some(candidates),
        svc_factory(),
        settings(3, 3),
    )
    .unwrap();

    let mut offered = 0;
    while let Some(idx) = al.select_question().unwrap() {
        al.get_answer(Answer::Positive, idx).unwrap();
        offered += 1;
        assert!(offered <= 2);
    }
    assert!(al.query_mode());
}

#[test]
fn labels_view_tracks_answers() {
    let mut al = learner(1, 1);
    let idx = al.select_question().unwrap().unwrap();
    al.get_answer(Answer::Positive, idx).unwrap();
    assert_eq!(al.labels()[idx], CandidateLabel::Positive);
    assert!(al
        .labels()
        .iter()
        .filter(|&&l| l == CandidateLabel::Unlabeled)
        .count() > 0);
}
