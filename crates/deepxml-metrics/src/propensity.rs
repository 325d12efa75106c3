// Inverse propensity weights for propensity-scored metrics

use deepxml_core::CsrMatrix;

/// Inverse propensity of every label column of `train_labels`:
///
/// ```text
/// w_l = 1 + C * (f_l + B)^-A,   C = (ln N - 1) * (B + 1)^A
/// ```
///
/// `f_l` is the column sum of label `l` and `N` the number of instances.
pub fn inv_propensity(train_labels: &CsrMatrix, a: f64, b: f64) -> Vec<f64> {
    let n = train_labels.rows() as f64;
    let c = (n.ln() - 1.0) * (b + 1.0).powf(a);
    let mut freqs = vec![0.0f64; train_labels.cols()];
    for (&col, &v) in train_labels.indices().iter().zip(train_labels.data()) {
        freqs[col] += f64::from(v);
    }
    freqs
        .into_iter()
        .map(|f| 1.0 + c * (f + b).powf(-a))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rare_labels_weigh_more() {
        let y = CsrMatrix::from_rows(
            3,
            vec![vec![(0, 1.0)], vec![(0, 1.0), (1, 1.0)], vec![(0, 1.0)]],
        )
        .unwrap();
        let w = inv_propensity(&y, 0.55, 1.5);
        assert_eq!(w.len(), 3);
        assert!(w[1] > w[0]);

        let c = (3f64.ln() - 1.0) * 2.5f64.powf(0.55);
        assert!((w[0] - (1.0 + c * 4.5f64.powf(-0.55))).abs() < 1e-12);
        // an unseen label only gets the smoothing term
        assert!((w[2] - (1.0 + c * 1.5f64.powf(-0.55))).abs() < 1e-12);
    }
}
