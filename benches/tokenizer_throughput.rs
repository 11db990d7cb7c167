//! Throughput benchmark for the tokenizer/assembler pipeline, grounded in
//! the corpus's `criterion` benchmarking convention (spec.md §5 "bounded
//! work... O(k) per chunk of length k, amortised O(1) per character").

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use mdflow_lib::config::{AssemblerConfig, TokenizerConfig};
use mdflow_lib::{Assembler, Tokenizer};

const SAMPLE_DOCUMENT: &str = r#"# Streaming Markdown

This is a paragraph with **bold**, _italic_, `code`, and a [link](https://example.com).

- first item
- second item
  - nested item
- [ ] todo
- [x] done

> a blockquote
> that continues

| Col A | Col B |
| --- | :---: |
| a1 | b1 |
| a2 | b2 |

```rust
fn main() {
    println!("hello");
}
```

Some inline math $x^2 + y^2 = z^2$ and a paragraph continuation.

"#;

fn bench_whole_document(c: &mut Criterion) {
    c.bench_function("tokenize_and_assemble_whole_document", |b| {
        b.iter(|| {
            let mut tokenizer = Tokenizer::new(TokenizerConfig::default());
            let mut assembler = Assembler::new(AssemblerConfig::default());
            let result = tokenizer.feed(black_box(SAMPLE_DOCUMENT));
            assembler.apply(result);
            let tail = tokenizer.finish();
            assembler.apply(tail);
        });
    });
}

fn bench_character_streamed(c: &mut Criterion) {
    c.bench_function("tokenize_and_assemble_char_streamed", |b| {
        b.iter(|| {
            let mut tokenizer = Tokenizer::new(TokenizerConfig::default());
            let mut assembler = Assembler::new(AssemblerConfig::default());
            for ch in SAMPLE_DOCUMENT.chars() {
                let mut buf = [0u8; 4];
                let chunk = ch.encode_utf8(&mut buf);
                let result = tokenizer.feed(black_box(chunk));
                assembler.apply(result);
            }
            let tail = tokenizer.finish();
            assembler.apply(tail);
        });
    });
}

criterion_group!(benches, bench_whole_document, bench_character_streamed);
criterion_main!(benches);
