use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fillgrid::{find_fill, FillOptions, GridConfig, SearchMode, WordList};

const WORDS: &str = "
ACE
ACT
ADD
AGE
AIR
ALE
ANT
APE
ARC
ARE
ART
ATE
BAT
BED
BEE
CAT
COT
DOE
EAR
EAT
EEL
ERA
ETA
OAR
ODE
ORE
RAT
RED
SEA
TAR
TEA
TEE
TOE
";

pub fn criterion_benchmark(c: &mut Criterion) {
    let config = GridConfig::from_template(
        "___\n\
         ___\n\
         ___",
    )
    .expect("Failed to parse grid");
    let word_list = WordList::parse(WORDS);

    for (name, mode) in [("plain", SearchMode::Plain), ("interleaved", SearchMode::Interleaved)] {
        c.bench_function(&format!("fill_3x3_{}", name), |b| {
            b.iter(|| find_fill(black_box(&config), black_box(&word_list), &FillOptions { mode }))
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
