use super::*;

fn params(max_width: f64, max_lines: usize) -> FitParams {
    FitParams {
        max_width,
        max_lines,
        max_size: 40.0,
        min_size: 10.0,
        step: 2.0,
    }
}

#[test]
fn approx_measure_is_linear_in_chars_and_size() {
    let mut m = ApproxMeasure::default();
    assert!((m.advance("abcd", 10.0) - 22.0).abs() < 1e-9);
    assert_eq!(m.advance("", 10.0), 0.0);
}

#[test]
fn wrap_respects_width() {
    let mut m = ApproxMeasure { em_advance: 1.0 };
    // Each char is 10 px at size 10.
    let lines = wrap_words(&["aa", "bb", "cc"], 10.0, 50.0, &mut m);
    let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts, ["aa bb", "cc"]);
    assert_eq!(lines[0].width, 50.0);
}

#[test]
fn overlong_word_gets_its_own_line() {
    let mut m = ApproxMeasure { em_advance: 1.0 };
    let lines = wrap_words(&["a", "abcdefgh", "b"], 10.0, 30.0, &mut m);
    assert_eq!(lines.len(), 3);
}

#[test]
fn fit_keeps_max_size_when_text_fits() {
    let mut m = ApproxMeasure::default();
    let b = fit_text("hello world", params(1000.0, 2), &mut m);
    assert_eq!(b.font_size, 40.0);
    assert_eq!(b.lines.len(), 1);
}

#[test]
fn fit_shrinks_until_line_budget_is_met() {
    let mut m = ApproxMeasure { em_advance: 0.5 };
    let text = "the quick brown fox jumps over the lazy dog";
    let b = fit_text(text, params(200.0, 2), &mut m);
    assert!(b.font_size < 40.0);
    assert!(b.lines.len() <= 2);
    assert!(b.lines.iter().all(|l| l.width <= 200.0));
    // One step larger would not have fit.
    let larger = wrap_words(
        &text.split_whitespace().collect::<Vec<_>>(),
        b.font_size + 2.0,
        200.0,
        &mut m,
    );
    assert!(larger.len() > 2 || larger.iter().any(|l| l.width > 200.0));
}

#[test]
fn fit_falls_back_to_min_size() {
    let mut m = ApproxMeasure { em_advance: 1.0 };
    let b = fit_text("aaaaaaaaaaaaaaaaaaaa", params(20.0, 1), &mut m);
    assert_eq!(b.font_size, 10.0);
}

#[test]
fn empty_text_yields_empty_block() {
    let mut m = ApproxMeasure::default();
    let b = fit_text("   ", params(100.0, 2), &mut m);
    assert!(b.is_empty());
}

#[test]
fn chunk_words_are_centred() {
    let mut m = ApproxMeasure { em_advance: 1.0 };
    let c = layout_chunk(&["ab", "cd"], params(1000.0, 3), &mut m);
    assert_eq!(c.words.len(), 2);
    let left = c.words[0].x;
    let right = c.words[1].x + c.words[1].width;
    assert!((left + right).abs() < 1e-9);
    assert!((c.words[0].y + c.height / 2.0).abs() < 1e-9);
}
