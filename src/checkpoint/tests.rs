use super::*;
use crate::error::Error;
use crate::sampler::Sampler;
use crate::stats::{MinMaxNormalizer, SparseVector};
use crate::testing::{short_config, two_bloc_corpus};

fn trained(lexical: bool) -> Sampler {
    let mut config = short_config(2);
    if lexical {
        config.lexical_l2 = 0.1;
    }
    let mut sampler = Sampler::new(config, two_bloc_corpus(4, 3)).unwrap();
    sampler.train(None).unwrap();
    sampler
}

#[test]
fn test_state_roundtrip_is_exact() {
    let original = trained(false);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("iter-6.zip");
    save(&original, &path).unwrap();

    let mut restored = Sampler::new(original.config().clone(), original.corpus().clone()).unwrap();
    load_state(&mut restored, &path).unwrap();

    assert_eq!(restored.eta(), original.eta());
    assert_eq!(restored.topic_words(), original.topic_words());
    assert_eq!(restored.doc_topics(), original.doc_topics());
    assert_eq!(restored.assignments(), original.assignments());
    assert_eq!(restored.bill_points(), original.bill_points());
    assert_eq!(restored.author_points(), original.author_points());
    assert_eq!(restored.profiles(), original.profiles());
    assert_eq!(restored.phase(), Phase::Initialized);
    restored.validate("restored").unwrap();
}

#[test]
fn test_lexical_segment_roundtrip() {
    let original = trained(true);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("iter-6.zip");
    save(&original, &path).unwrap();

    let mut restored = Sampler::new(original.config().clone(), original.corpus().clone()).unwrap();
    load_state(&mut restored, &path).unwrap();
    assert_eq!(restored.lexical(), original.lexical());
}

#[test]
fn test_missing_lexical_segment_is_fatal() {
    let original = trained(false);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("iter-6.zip");
    save(&original, &path).unwrap();

    let mut config = original.config().clone();
    config.lexical_l1 = 0.5;
    let mut restored = Sampler::new(config, original.corpus().clone()).unwrap();
    let err = load_state(&mut restored, &path).unwrap_err();
    assert!(err.to_string().contains("no lexical segment"), "{err}");
}

#[test]
fn test_bill_count_mismatch_fails_with_path() {
    let original = trained(false);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("iter-6.zip");
    save(&original, &path).unwrap();

    let mut restored = Sampler::new(original.config().clone(), two_bloc_corpus(4, 4)).unwrap();
    let err = load_state(&mut restored, &path).unwrap_err();
    assert!(matches!(err, Error::Checkpoint { .. }));
    let msg = err.to_string();
    assert!(msg.contains("iter-6.zip"), "{msg}");
    assert!(msg.contains("bill count mismatch: expected 4, found 3"), "{msg}");
}

#[test]
fn test_load_for_test_resets_documents() {
    let original = trained(false);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("iter-6.zip");
    save(&original, &path).unwrap();

    let mut tester = Sampler::new(original.config().clone(), two_bloc_corpus(2, 3)).unwrap();
    load_for_test(&mut tester, &path).unwrap();
    assert_eq!(tester.phase(), Phase::LoadedForTest);
    assert_eq!(tester.eta(), original.eta());
    assert!(tester.doc_topics().iter().all(|d| d.total() == 0));
    assert!(tester.profiles().iter().all(|p| p.is_empty()));
    assert!(tester.author_points().iter().flatten().all(|&u| u == 0.0));
}

#[test]
fn test_missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.zip");
    let mut sampler = Sampler::new(short_config(2), two_bloc_corpus(4, 3)).unwrap();
    let err = load_state(&mut sampler, &path).unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
    assert!(err.to_string().contains("absent.zip"));
}

#[test]
fn test_bill_segment_text() {
    let text = codec::encode_points(&[vec![0.5, -1.25, 2.0], vec![0.1, 0.0, 3e-7]], 3);
    insta::assert_snapshot!(text.replace('\t', " ").trim_end(), @r"
    2 3
    0 0 0.5
    0 1 -1.25
    0 2 2
    1 0 0.1
    1 1 0
    1 2 0.0000003
    ");
    let back = codec::decode_points(&text, "bill", 2, 3).unwrap();
    assert_eq!(back, vec![vec![0.5, -1.25, 2.0], vec![0.1, 0.0, 3e-7]]);
}

#[test]
fn test_points_reject_trailing_rows() {
    let mut text = codec::encode_points(&[vec![1.0]], 1);
    text.push_str("1\t0\t2\n");
    let err = codec::decode_points(&text, "author", 1, 1).unwrap_err();
    assert!(matches!(err, Error::Malformed { line: 3, .. }), "{err}");
}

#[test]
fn test_points_reject_out_of_order_rows() {
    let text = "2\t1\n1\t0\t0.5\n0\t0\t0.25\n";
    let err = codec::decode_points(text, "author", 2, 1).unwrap_err();
    assert!(matches!(err, Error::Mismatch { .. }), "{err}");
}

#[test]
fn test_model_rejects_index_gap() {
    let tw = vec![DirMult::uniform(3, 0.3), DirMult::uniform(3, 0.3)];
    let text = codec::encode_model(&tw, &[0.5, -1.5], 3).replacen("\n1\n", "\n2\n", 1);
    let err = codec::decode_model(&text, 2, 3).unwrap_err();
    assert_eq!(err.to_string(), "model topic index mismatch: expected 1, found 2");
}

#[test]
fn test_assignment_counts_must_match_tokens() {
    let mut dt = DirMult::uniform(2, 1.0);
    dt.increment(0);
    dt.increment(1);
    let text = codec::encode_assignments(&[dt], &[vec![0, 1]]);
    assert!(codec::decode_assignments(&text, &[2], 2).is_ok());
    let err = codec::decode_assignments(&text, &[3], 2).unwrap_err();
    assert!(err.to_string().contains("token count of document 0"), "{err}");

    let tampered = text.replace("0\t1\n", "0\t0\n");
    let err = codec::decode_assignments(&tampered, &[2], 2).unwrap_err();
    assert!(err.to_string().contains("count of document 0"), "{err}");
}

#[test]
fn test_lexical_rejects_normalizer_feature_outside_vocabulary() {
    let rows = [
        SparseVector::from_dense(&[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.5]),
        SparseVector::from_dense(&[0.2, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]),
    ];
    let normalizer = MinMaxNormalizer::fit(rows.iter());
    assert_eq!(normalizer.max_feature(), Some(7));
    let text = codec::encode_lexical(&[normalizer], &[SparseVector::new()], 6);

    let err = codec::decode_lexical(&text, 1, 6).unwrap_err();
    assert!(matches!(err, Error::Malformed { line: 3, .. }), "{err}");
    assert!(err.to_string().contains("feature 7 outside vocabulary"), "{err}");
    assert!(codec::decode_lexical(&text, 1, 8).is_ok());
}

#[test]
fn test_corrupt_lexical_cache_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut wide = SparseVector::new();
    wide.set(8, 1.0);
    let normalizer = MinMaxNormalizer::fit([SparseVector::new(), wide].iter());
    let text = codec::encode_lexical(
        &[normalizer.clone(), normalizer],
        &[SparseVector::new(), SparseVector::new()],
        6,
    );
    std::fs::write(dir.path().join("init-lexreg.txt"), text).unwrap();

    let mut config = short_config(2);
    config.lexical_l2 = 0.1;
    let mut sampler = Sampler::new(config, two_bloc_corpus(4, 2)).unwrap();
    let err = sampler.initialize(Some(dir.path())).unwrap_err();
    assert!(matches!(err, Error::Checkpoint { .. }), "{err}");
    assert!(err.to_string().contains("init-lexreg.txt"), "{err}");
}
