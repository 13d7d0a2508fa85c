use insertion_preview::{
    MonospaceRenderer, NoTokenizer, NormalizedInsertion, TextDocument, max_content_width,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const ALPHABET: &[char] = &['a', 'Z', ' ', '\t', '_', '(', '你', 'é'];

fn random_text(rng: &mut StdRng, max_len: usize) -> String {
    let len = rng.gen_range(0..=max_len);
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())])
        .collect()
}

fn measure(doc: &TextDocument, insertion: &NormalizedInsertion, renderer: &MonospaceRenderer) -> f64 {
    max_content_width(Some(insertion), doc, &NoTokenizer, renderer, 20.0)
}

#[test]
fn test_appending_characters_never_shrinks_the_box() {
    let mut rng = StdRng::seed_from_u64(0x1d5e_47);
    let renderer = MonospaceRenderer::new(7.5);

    for _ in 0..200 {
        let line = random_text(&mut rng, 24);
        let doc = TextDocument::new(&format!("header\n{line}\nfooter"));
        let column = rng.gen_range(1..=line.chars().count() + 1);

        let mut insertion = NormalizedInsertion {
            line_number: 2,
            column,
            text: random_text(&mut rng, 6),
        };
        if rng.gen_bool(0.3) {
            insertion.text.push('\n');
        }

        let mut previous = measure(&doc, &insertion, &renderer);
        for _ in 0..8 {
            let ch = ALPHABET[rng.gen_range(0..ALPHABET.len())];
            insertion.text.push(ch);
            let width = measure(&doc, &insertion, &renderer);
            assert!(
                width >= previous,
                "width shrank from {previous} to {width} for line {line:?} + {insertion:?}"
            );
            previous = width;
        }
    }
}
