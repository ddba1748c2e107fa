//! Cost of one training sweep and of the ideal-point updates that precede
//! it, on a synthetic corpus of 200 authors speaking about 10 topics.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use textideal::sampler::SweepPlan;
use textideal::{Corpus, Document, Sampler, SamplerConfig, VoteMatrix};

const AUTHORS: usize = 200;
const BILLS: usize = 50;
const VOCAB: usize = 500;
const TOPICS: usize = 10;

fn synthetic_corpus() -> Corpus {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
    let mut documents = Vec::new();
    let mut outcomes = Vec::new();
    for a in 0..AUTHORS {
        let focus = a % TOPICS;
        for _ in 0..4 {
            let tokens = (0..100)
                .map(|_| {
                    if rng.gen_bool(0.7) {
                        focus * (VOCAB / TOPICS) + rng.gen_range(0..VOCAB / TOPICS)
                    } else {
                        rng.gen_range(0..VOCAB)
                    }
                })
                .collect();
            documents.push(Document { author: a, tokens });
        }
        outcomes.push((0..BILLS).map(|b| Some((a + b) % 3 != 0)).collect());
    }
    Corpus {
        vocab_size: VOCAB,
        num_authors: AUTHORS,
        num_bills: BILLS,
        documents,
        votes: VoteMatrix::fully_masked(outcomes),
        vocab: None,
        author_names: None,
        bill_names: None,
    }
}

fn initialized() -> Sampler {
    let mut sampler = Sampler::new(SamplerConfig::new(TOPICS), synthetic_corpus())
        .unwrap_or_else(|e| panic!("{e}"));
    sampler.initialize(None).unwrap_or_else(|e| panic!("{e}"));
    sampler
}

fn bench_sweep(c: &mut Criterion) {
    let base = initialized();
    let mut group = c.benchmark_group("sampler");
    group.sample_size(20);

    group.bench_function("train_sweep", |b| {
        b.iter_batched_ref(
            || {
                let mut s = Sampler::new(base.config().clone(), base.corpus().clone())
                    .unwrap_or_else(|e| panic!("{e}"));
                s.initialize(None).unwrap_or_else(|e| panic!("{e}"));
                s
            },
            |s| black_box(s.sample_sweep(SweepPlan::TRAIN)),
            BatchSize::LargeInput,
        )
    });

    let mut s = initialized();
    group.bench_function("update_ux", |b| b.iter(|| s.update_ux()));
    group.bench_function("update_etas", |b| b.iter(|| s.update_etas()));
    group.bench_function("joint_log_likelihood", |b| {
        b.iter(|| black_box(base.joint_log_likelihood()))
    });
    group.finish();
}

criterion_group!(benches, bench_sweep);
criterion_main!(benches);
