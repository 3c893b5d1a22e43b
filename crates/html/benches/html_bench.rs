use criterion::{black_box, criterion_group, criterion_main, Criterion};
use html::html5::{TokenCollector, Tokenizer};

const SMALL_BLOCKS: usize = 64;
const LARGE_BLOCKS: usize = 20_000;

fn make_blocks(count: usize) -> String {
    let mut out = String::with_capacity(count * 48);
    out.push_str("<!DOCTYPE html><html><head><title>bench</title></head><body>");
    for i in 0..count {
        out.push_str(&format!(
            "<div class=\"box\"><span>hello {i}</span><img src=\"x\"></div>"
        ));
    }
    out.push_str("</body></html>");
    out
}

fn bench_tokenize_small(c: &mut Criterion) {
    let input = make_blocks(SMALL_BLOCKS);
    c.bench_function("bench_tokenize_small", |b| {
        b.iter(|| {
            let mut tokenizer = Tokenizer::new(black_box(&input));
            let mut sink = TokenCollector::default();
            tokenizer.run(&mut sink);
            black_box(sink.tokens.len());
        });
    });
}

fn bench_tokenize_large(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    c.bench_function("bench_tokenize_large", |b| {
        b.iter(|| {
            let mut tokenizer = Tokenizer::new(black_box(&input));
            let mut sink = TokenCollector::default();
            tokenizer.run(&mut sink);
            black_box(sink.tokens.len());
        });
    });
}

fn bench_parse_large_end_to_end(c: &mut Criterion) {
    let input = make_blocks(LARGE_BLOCKS);
    c.bench_function("bench_parse_large_end_to_end", |b| {
        b.iter(|| {
            let (document, atoms) = html::parse_document(black_box(input.as_bytes()));
            black_box((document, atoms));
        });
    });
}

criterion_group!(
    benches,
    bench_tokenize_small,
    bench_tokenize_large,
    bench_parse_large_end_to_end,
);
criterion_main!(benches);
