//! Benchmarks for the classification pipeline.
//!
//! Run with: cargo bench -p cs_classifier

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use cs_classifier::classification::{IncrementalSession, TextChange};
use cs_classifier::config::ClassifierOptions;
use cs_classifier::pipeline::classify;

const MEMBER: &str = r#"
    /// <summary>Parses <paramref name="input"/>.</summary>
    public static Result<int> Parse{N}(string input, Color Color)
    {
        var match = new Regex(@"^(?<value>\d+)\s*$").Match(input);
        // lang=json
        var payload = "{ \"id\": {N}, \"tags\": [\"a\", \"b\"] }";
        if (match.Success && Color.IsKnown)
        {
            return Result<int>.Ok(int.Parse(match.Groups["value"].Value) + {N});
        }
        return default;
    }
"#;

/// A class with `members` methods exercising binding and embedded literals
fn source(members: usize) -> String {
    let mut text = String::from("using System;\nusing System.Text.RegularExpressions;\n\nnamespace Bench;\n\nenum Color { Red, Green }\n\nstatic class Parsers\n{");
    for index in 0..members {
        text.push_str(&MEMBER.replace("{N}", &index.to_string()));
    }
    text.push_str("}\n");
    text
}

fn bench_classify(c: &mut Criterion) {
    let mut group = c.benchmark_group("classify");
    for members in [1, 16, 128] {
        let text = source(members);
        group.throughput(Throughput::Bytes(text.len() as u64));

        let full = ClassifierOptions::regular().with_validation(false);
        group.bench_with_input(BenchmarkId::new("full", members), &text, |b, text| {
            b.iter(|| classify(black_box(text), None, &full))
        });

        let syntactic = full.clone().with_semantic(false);
        group.bench_with_input(BenchmarkId::new("syntactic", members), &text, |b, text| {
            b.iter(|| classify(black_box(text), None, &syntactic))
        });
    }
    group.finish();
}

fn bench_incremental(c: &mut Criterion) {
    let text = source(128);
    let offset = text.find("return default").unwrap_or(0);
    let options = ClassifierOptions::regular().with_validation(false);

    c.bench_function("incremental/insert_char", |b| {
        b.iter_batched(
            || IncrementalSession::new(text.clone(), options.clone()).unwrap(),
            |mut session| session.apply_change(black_box(TextChange::insert(offset, "x"))),
            criterion::BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, bench_classify, bench_incremental);
criterion_main!(benches);
