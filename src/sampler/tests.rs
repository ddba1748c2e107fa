use super::*;
use crate::config::InitMode;
use crate::corpus::{Document, VoteMatrix};
use crate::testing::{short_config, two_bloc_corpus};

/// K = 2, V = 5, one author with one three-token document, one bill voted yes.
fn single_author() -> Sampler {
    let corpus = Corpus {
        vocab_size: 5,
        num_authors: 1,
        num_bills: 1,
        documents: vec![Document {
            author: 0,
            tokens: vec![0, 3, 4],
        }],
        votes: VoteMatrix::fully_masked(vec![vec![Some(true)]]),
        vocab: None,
        author_names: None,
        bill_names: None,
    };
    Sampler::new(short_config(2), corpus).unwrap()
}

#[test]
fn test_single_author_profile_complete_after_init() {
    let mut s = single_author();
    s.initialize(None).unwrap();
    assert_eq!(s.phase(), Phase::Initialized);
    assert!((s.profiles()[0].sum() - 1.0).abs() < 1e-12);
    assert_eq!(s.doc_topics()[0].total(), 3);
    assert!(s.assignments()[0].iter().all(|&t| t < 2));
}

#[test]
fn test_non_observing_sweep_keeps_document_total() {
    let mut s = single_author();
    s.initialize(None).unwrap();
    let plan = SweepPlan {
        observe: false,
        ..SweepPlan::TRAIN
    };
    let stats = s.sample_sweep(plan).unwrap();
    assert_eq!(stats.tokens, 3);
    assert_eq!(stats.accepted, 3);
    assert_eq!(s.doc_topics()[0].total(), 3);
    s.validate("after sweep").unwrap();
}

#[test]
fn test_update_ux_moves_bill_position() {
    let mut s = single_author();
    s.initialize(None).unwrap();
    s.config.num_steps = 1;
    s.us[0] = vec![1.0, 0.5];
    s.xs[0] = vec![0.0; 3];
    s.update_ux();
    // Voted yes at p = 0.5 after the author step: x[0] grows with u[0].
    assert!(s.xs[0][0] > 0.0, "x = {:?}", s.xs[0]);
    assert!(s.xs[0][2] > 0.0, "x = {:?}", s.xs[0]);
}

#[test]
fn test_update_etas_shrinks_toward_profile_fit() {
    let mut s = single_author();
    s.initialize(None).unwrap();
    let before = s.joint_log_likelihood();
    s.update_etas();
    let eta_only = EtaObjective {
        num_topics: 2,
        profiles: &s.za,
        points: &s.us,
        valid: &s.valid_authors,
        rho: s.config.rho,
        sigma: s.config.sigma,
    };
    let mut grad = [0.0; 2];
    crate::optim::DiffFunction::evaluate(&eta_only, &s.eta, &mut grad);
    assert!(grad.iter().all(|g| g.abs() < 1e-4), "grad = {grad:?}");
    assert!(s.joint_log_likelihood() >= before - 1e-9);
}

#[test]
fn test_training_preserves_invariants_and_predicts_inside_unit_interval() {
    let mut s = Sampler::new(short_config(3), two_bloc_corpus(6, 4)).unwrap();
    let summary = s.train(None).unwrap();
    assert_eq!(s.phase(), Phase::Terminal);
    assert_eq!(summary.iterations, 6);
    // Reports at iterations 0, 2, 4.
    assert_eq!(summary.trace.len(), 3);
    assert!(summary.checkpoints.is_empty());
    s.validate("after training").unwrap();

    for table in [s.predict_in_matrix(), s.predict_out_matrix()] {
        assert_eq!(table.len(), 6 * 4);
        assert!(table.iter().all(|(_, _, p)| p > 0.0 && p < 1.0));
    }
    for profile in s.profiles() {
        assert!((profile.sum() - 1.0).abs() < 1e-5);
    }
}

#[test]
fn test_training_twice_is_rejected() {
    let mut s = Sampler::new(short_config(2), two_bloc_corpus(4, 2)).unwrap();
    s.train(None).unwrap();
    let err = s.train(None).unwrap_err();
    assert!(matches!(err, Error::Phase { .. }), "{err}");
}

#[test]
fn test_seeded_topic_count_must_match() {
    let mut s = Sampler::new(short_config(2), two_bloc_corpus(4, 2)).unwrap();
    let seeds = vec![vec![1.0 / 6.0; 6]; 3];
    let err = s.initialize_with_topics(Some(&seeds), None).unwrap_err();
    assert!(matches!(err, Error::Mismatch { .. }), "{err}");
    assert_eq!(s.phase(), Phase::Uninitialized);
}

#[test]
fn test_seeded_topics_center_word_priors() {
    let mut s = Sampler::new(short_config(2), two_bloc_corpus(4, 2)).unwrap();
    let mut left = vec![0.0; 6];
    left[..3].fill(1.0 / 3.0);
    let mut right = vec![0.0; 6];
    right[3..].fill(1.0 / 3.0);
    s.initialize_with_topics(Some(&[left, right]), None).unwrap();
    // A word with no prior mass in a topic never lands there on the first pass.
    for w in 0..3 {
        assert_eq!(s.topic_words()[1].count(w), 0);
    }
    for w in 3..6 {
        assert_eq!(s.topic_words()[0].count(w), 0);
    }
}

#[test]
fn test_preset_initialization_assigns_every_token() {
    let mut config = short_config(2);
    config.init = InitMode::Preset;
    let mut s = Sampler::new(config, two_bloc_corpus(4, 2)).unwrap();
    s.initialize(None).unwrap();
    s.validate("preset").unwrap();
    let counted: u32 = s.topic_words().iter().map(|t| t.total()).sum();
    assert_eq!(counted as usize, s.corpus().num_tokens());
}

#[test]
fn test_slice_sampling_never_lowers_likelihood() {
    let mut s = Sampler::new(short_config(2), two_bloc_corpus(4, 2)).unwrap();
    s.initialize(None).unwrap();
    for _ in 0..10 {
        let before = s.joint_log_likelihood();
        s.slice_sample_hyperparameters();
        assert!(s.joint_log_likelihood() >= before - 1e-9);
        let h = s.hyperparameters();
        assert!(h.alpha > 0.0 && h.beta > 0.0);
        assert!((s.doc_topics()[0].concentration() - h.alpha * 2.0).abs() < 1e-12);
        assert!((s.topic_words()[0].concentration() - h.beta * 6.0).abs() < 1e-12);
    }
    assert_eq!(s.sampled_hyperparameters().len(), 10);
}

#[test]
fn test_likelihood_with_current_hyperparameters_matches() {
    let mut s = Sampler::new(short_config(2), two_bloc_corpus(4, 2)).unwrap();
    s.initialize(None).unwrap();
    let direct = s.joint_log_likelihood();
    let with = s.joint_log_likelihood_with(s.hyperparameters());
    assert!((direct - with).abs() < 1e-9);
    let b = s.likelihood_breakdown();
    assert!(b.word < 0.0 && b.topic < 0.0 && b.vote <= 0.0);
}

#[test]
fn test_validate_catches_corrupted_counts() {
    let mut s = single_author();
    s.initialize(None).unwrap();
    s.doc_topics[0].increment(0);
    let err = s.validate("corrupted").unwrap_err();
    assert!(matches!(err, Error::Consistency { .. }), "{err}");
}

#[test]
fn test_train_writes_checkpoints_at_lag_and_end() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = Sampler::new(short_config(2), two_bloc_corpus(4, 2)).unwrap();
    let summary = s.train(Some(dir.path())).unwrap();
    // burn_in 2, lag 2, max_iter 6: iteration 4, then the final state.
    let names: Vec<String> = summary
        .checkpoints
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["iter-4.zip", "iter-6.zip"]);
    let report = dir.path().join("report");
    assert!(report.join("iter-6-top-words.txt").exists());
    assert!(report.join("llh.txt").exists());
    assert!(report.join("authors.txt").exists());
}

#[test]
fn test_lexical_fit_is_cached_and_reused() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = short_config(2);
    config.lexical_l2 = 0.1;
    let mut first = Sampler::new(config.clone(), two_bloc_corpus(4, 2)).unwrap();
    first.initialize(Some(dir.path())).unwrap();
    let cache = dir.path().join("init-lexreg.txt");
    assert!(cache.exists());

    let mut second = Sampler::new(config, two_bloc_corpus(4, 2)).unwrap();
    second.initialize(Some(dir.path())).unwrap();
    let (a, b) = (first.lexical().unwrap(), second.lexical().unwrap());
    assert_eq!(a.weights(), b.weights());
    assert_eq!(a.normalizers(), b.normalizers());
}

#[test]
fn test_lexical_weights_follow_vote_direction() {
    let mut config = short_config(2);
    config.lexical_l2 = 0.01;
    let mut s = Sampler::new(config, two_bloc_corpus(4, 1)).unwrap();
    s.initialize(None).unwrap();
    // Yes-voters use words 0..3 only, no-voters words 3..6.
    let lex = s.lexical().unwrap();
    assert!(lex.score(0, 0) > lex.score(3, 0));
}

#[test]
fn test_out_of_matrix_test_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut trainer = Sampler::new(short_config(2), two_bloc_corpus(4, 3)).unwrap();
    let summary = trainer.train(Some(dir.path())).unwrap();
    let checkpoint = summary.checkpoints.last().unwrap();

    let heldout = two_bloc_corpus(2, 3);
    let mut tester = Sampler::new(short_config(2), heldout).unwrap();
    let pred_path = dir.path().join("pred.txt");
    let assign_path = dir.path().join("assign.zip");
    let table = tester
        .test(checkpoint, Some(&pred_path), Some(&assign_path))
        .unwrap();
    assert_eq!(tester.phase(), Phase::Terminal);
    assert_eq!(table.len(), 2 * 3);
    assert!(table.iter().all(|(_, _, p)| p > 0.0 && p < 1.0));
    // Frozen model: word counts are exactly the checkpoint's.
    assert_eq!(tester.topic_words(), trainer.topic_words());
    assert_eq!(crate::predictions::PredictionTable::read(&pred_path).unwrap(), table);
    assert!(assign_path.exists());
    for (d, doc) in tester.corpus().documents.iter().enumerate() {
        assert_eq!(tester.doc_topics()[d].total() as usize, doc.tokens.len());
    }
}

#[test]
fn test_test_requires_fresh_sampler() {
    let mut s = Sampler::new(short_config(2), two_bloc_corpus(4, 2)).unwrap();
    s.initialize(None).unwrap();
    let err = s.test(std::path::Path::new("unused.zip"), None, None).unwrap_err();
    assert!(matches!(err, Error::Phase { .. }));
}

#[test]
fn test_author_features_concatenate_profile_and_prediction() {
    let mut s = Sampler::new(short_config(2), two_bloc_corpus(4, 2)).unwrap();
    s.initialize(None).unwrap();
    let features = s.author_features();
    let predicted = s.predicted_ideal_points();
    for (a, row) in features.iter().enumerate() {
        assert_eq!(row.len(), 4);
        assert_eq!(&row[..2], s.profiles()[a].dense(2).as_slice());
        assert_eq!(&row[2..], predicted[a].as_slice());
    }
}

#[test]
fn test_lexical_weights_carry_into_held_out_predictions() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = short_config(2);
    config.lexical_l2 = 0.1;
    let mut trainer = Sampler::new(config.clone(), two_bloc_corpus(4, 3)).unwrap();
    let summary = trainer.train(Some(dir.path())).unwrap();
    let checkpoint = summary.checkpoints.last().unwrap();

    let mut tester = Sampler::new(config, two_bloc_corpus(2, 3)).unwrap();
    let with_lexical = tester.test(checkpoint, None, None).unwrap();
    let (trained, restored) = (trainer.lexical().unwrap(), tester.lexical().unwrap());
    assert_eq!(restored.normalizers(), trained.normalizers());
    assert_eq!(restored.weights(), trained.weights());
    assert!(restored.weights().iter().any(|w| !w.is_empty()));
    // Held-out authors are scored through the trained normalizers.
    for a in 0..2 {
        for b in 0..3 {
            let expected = restored.design_row(a, b).dot_sparse(&restored.weights()[b]);
            assert!((restored.score(a, b) - expected).abs() < 1e-12);
        }
    }

    let mut plain = Sampler::new(short_config(2), two_bloc_corpus(2, 3)).unwrap();
    let without = plain.test(checkpoint, None, None).unwrap();
    assert!(plain.lexical().is_none());
    assert_eq!(plain.assignments(), tester.assignments());
    assert_eq!(with_lexical.len(), without.len());
    assert!(with_lexical.iter().all(|(_, _, p)| p > 0.0 && p < 1.0));
    let moved = with_lexical
        .iter()
        .filter(|&(a, b, p)| (p - without.get(a, b).unwrap()).abs() > 1e-9)
        .count();
    assert!(moved > 0, "lexical scores left every prediction unchanged");
}
