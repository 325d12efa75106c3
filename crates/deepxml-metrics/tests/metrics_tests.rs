// Tests for deepxml-metrics against hand-computed rankings

use deepxml_core::{CsrMatrix, Error};
use deepxml_metrics::{format, inv_propensity, ndcg, precision, psprecision, Metrics};

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn assert_close(got: &[f64], expected: &[f64]) {
    assert_eq!(got.len(), expected.len());
    for (i, (g, e)) in got.iter().zip(expected).enumerate() {
        assert!(approx(*g, *e), "position {i}: got {g} expected {e}");
    }
}

// truth: row 0 -> {0, 2}, row 1 -> {1}
fn truth() -> CsrMatrix {
    CsrMatrix::from_rows(4, vec![vec![(0, 1.0), (2, 1.0)], vec![(1, 1.0)]]).unwrap()
}

// row 0 ranks 2, 3, 0; row 1 ranks 0, 1
fn predictions() -> CsrMatrix {
    CsrMatrix::from_rows(
        4,
        vec![vec![(0, 0.2), (2, 0.9), (3, 0.5)], vec![(0, 0.7), (1, 0.4)]],
    )
    .unwrap()
}

#[test]
fn test_precision_at_k() {
    let p = precision(&predictions(), &truth(), 3).unwrap();
    // row 0: 1/1, 1/2, 2/3   row 1: 0/1, 1/2, 1/3
    assert_close(&p, &[0.5, 0.5, 0.5]);
}

#[test]
fn test_ndcg_at_k() {
    let n = ndcg(&predictions(), &truth(), 3).unwrap();
    let d2 = 1.0 / 3f64.log2();
    let d3 = 0.5;
    // row 0 has two positives, row 1 one
    let row0 = [1.0, 1.0 / (1.0 + d2), (1.0 + d3) / (1.0 + d2)];
    let row1 = [0.0, d2, d2];
    let expected: Vec<f64> = row0.iter().zip(row1).map(|(a, b)| (a + b) / 2.0).collect();
    assert_close(&n, &expected);
}

#[test]
fn test_perfect_ranking_scores_one() {
    let m = Metrics::new(truth(), Some(vec![1.0, 2.0, 3.0, 4.0])).unwrap();
    // rarest positive first in every row
    let perfect =
        CsrMatrix::from_rows(4, vec![vec![(2, 1.0), (0, 0.5)], vec![(1, 1.0)]]).unwrap();
    let scores = m.eval(&perfect, 1).unwrap();
    assert_eq!(scores.len(), 4);
    for metric in &scores {
        assert_close(metric, &[1.0]);
    }
}

#[test]
fn test_psprecision_relative_to_best_ranking() {
    let w = vec![1.0, 2.0, 3.0, 4.0];
    let psp = psprecision(&predictions(), &truth(), &w, 1).unwrap();
    // predicted top-1 gains: 3 (label 2) + 0; best: 3 + 2
    assert_close(&psp, &[3.0 / 5.0]);
}

#[test]
fn test_eval_without_propensity_has_two_rows() {
    let m = Metrics::new(truth(), None).unwrap();
    assert!(!m.has_propensity());
    assert_eq!(m.eval(&predictions(), 5).unwrap().len(), 2);
}

#[test]
fn test_instances_without_positives_count_as_zero() {
    let truth = CsrMatrix::from_rows(2, vec![vec![(0, 1.0)], vec![]]).unwrap();
    let pred = CsrMatrix::from_rows(2, vec![vec![(0, 1.0)], vec![(1, 1.0)]]).unwrap();
    assert_close(&precision(&pred, &truth, 1).unwrap(), &[0.5]);
}

#[test]
fn test_shape_mismatch() {
    let pred = CsrMatrix::zeros(3, 4);
    assert!(matches!(
        precision(&pred, &truth(), 5),
        Err(Error::ShapeMismatch { .. })
    ));
    assert!(Metrics::new(truth(), Some(vec![1.0])).is_err());
}

#[test]
fn test_inv_propensity_matches_formula() {
    let w = inv_propensity(&truth(), 0.55, 1.5);
    let c = (2f64.ln() - 1.0) * 2.5f64.powf(0.55);
    assert!(approx(w[0], 1.0 + c * 2.5f64.powf(-0.55)));
    assert!(approx(w[3], 1.0 + c * 1.5f64.powf(-0.55)));
}

#[test]
fn test_format_report() {
    let report = format(&[vec![0.5, 0.25], vec![1.0, 0.123456]]);
    assert_eq!(report, "50.00,25.00\n100.00,12.35");
}

#[test]
fn test_repeated_prediction_entries_count_once() {
    // one row storing label 1 twice, as a non-canonical scipy archive may
    let pred = CsrMatrix::new((1, 3), vec![0, 2], vec![1, 1], vec![0.5, 0.5]).unwrap();
    let truth = CsrMatrix::from_rows(3, vec![vec![(1, 1.0)]]).unwrap();
    assert_eq!(pred.nnz(), 1);
    assert_close(&precision(&pred, &truth, 2).unwrap(), &[1.0, 0.5]);
}
