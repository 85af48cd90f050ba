use criterion::{criterion_group, criterion_main, Criterion};
use pprof::criterion::{Output, PProfProfiler};
use segeval::{evaluate, EvaluatorConfigBuilder, Item, Mode, SentencePair, Task};

const POS_TAGS: [&str; 5] = ["NOUN", "VERB", "DET", "ADJ", "PUNCT"];
const ENTITIES: [&str; 3] = ["PER", "LOC", "ORG"];

/// Builds a sentence of `n_tokens` tokens of 4 characters separated by a space. One token out of
/// `split_every` is split in two halves (never when `split_every` is 0), and the tokens 0-1, 5-6,
/// etc. are covered by an entity container.
fn sentence(n_tokens: usize, seed: usize, split_every: usize) -> Vec<Item> {
    let mut items = Vec::with_capacity(n_tokens * 2);
    let mut position = 0;
    for i in 0..n_tokens {
        let pos = POS_TAGS[(i + seed) % POS_TAGS.len()];
        if split_every > 0 && i % split_every == 0 {
            items.push(Item::new("ab", position, position + 2).with_pos(pos));
            items.push(Item::new("cd", position + 2, position + 4).with_pos(pos));
        } else {
            items.push(Item::new("abcd", position, position + 4).with_pos(pos).with_lemma("abcd"));
        }
        if i % 5 == 1 {
            let entity = ENTITIES[(i + seed) % ENTITIES.len()];
            items.push(
                Item::new("abcd abcd", position - 5, position + 4)
                    .container()
                    .with_entity(entity),
            );
        }
        position += 5;
    }
    items
}

fn build_dataset(n_pairs: usize) -> Vec<SentencePair> {
    (0..n_pairs)
        .map(|seed| SentencePair::new(sentence(30, seed, 0), sentence(30, seed + 1, 7)))
        .collect()
}

fn benchmark_reference_mode(c: &mut Criterion) {
    let pairs = build_dataset(1000);
    let config = EvaluatorConfigBuilder::default()
        .mode(Mode::Reference)
        .build();
    c.bench_function("reference_all_tasks", |b| {
        b.iter(|| evaluate(&pairs, config.clone()).unwrap())
    });
}

fn benchmark_agreement_mode(c: &mut Criterion) {
    let pairs = build_dataset(1000);
    let config = EvaluatorConfigBuilder::default()
        .tasks([Task::Token, Task::Pos, Task::Lemma])
        .mode(Mode::Agreement)
        .transposition_window(2)
        .build();
    c.bench_function("agreement_token_pos_lemma", |b| {
        b.iter(|| evaluate(&pairs, config.clone()).unwrap())
    });
}

criterion_group!(
    name=evaluation_benches;
    config = Criterion::default().sample_size(50).with_profiler(PProfProfiler::new(3000, Output::Flamegraph(None)));
    targets =
    benchmark_reference_mode,
    benchmark_agreement_mode,
);
criterion_main!(evaluation_benches);
