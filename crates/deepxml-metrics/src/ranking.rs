// Top-k ranking metrics
//
// Every metric is reported for k = 1..=K and averaged over instances:
//
//   P@k      hits in the top k / k
//   nDCG@k   DCG@k / ideal DCG over min(k, #positives) ranks
//   PSP@k    propensity-weighted hits, relative to the best possible ranking
//   PSnDCG@k propensity-weighted nDCG, relative to the best possible ranking
//
// Instances without positives count as zero. A ranking only holds the
// entries stored in a prediction row; shorter rows miss the remaining ranks.

use rayon::prelude::*;

use deepxml_core::{CsrMatrix, Error, Result};

/// Column ids of the `k` highest stored scores of every row, best first.
/// Ties go to the lower column id.
pub fn top_k(pred: &CsrMatrix, k: usize) -> Vec<Vec<usize>> {
    (0..pred.rows())
        .into_par_iter()
        .map(|r| row_top_k(pred, r, k))
        .collect()
}

fn row_top_k(pred: &CsrMatrix, row: usize, k: usize) -> Vec<usize> {
    let indices = pred.indices();
    let data = pred.data();
    let mut order: Vec<usize> = (pred.indptr()[row]..pred.indptr()[row + 1]).collect();
    order.sort_by(|&a, &b| {
        data[b]
            .total_cmp(&data[a])
            .then_with(|| indices[a].cmp(&indices[b]))
    });
    order.truncate(k);
    order.into_iter().map(|p| indices[p]).collect()
}

fn discounts(k: usize) -> Vec<f64> {
    (0..k).map(|j| 1.0 / ((j + 2) as f64).log2()).collect()
}

/// Per-instance sums of every metric, before averaging.
#[derive(Debug, Clone)]
struct Totals {
    precision: Vec<f64>,
    ndcg: Vec<f64>,
    psp_num: Vec<f64>,
    psp_den: Vec<f64>,
    psndcg_num: Vec<f64>,
    psndcg_den: Vec<f64>,
}

impl Totals {
    fn zeros(k: usize) -> Self {
        Totals {
            precision: vec![0.0; k],
            ndcg: vec![0.0; k],
            psp_num: vec![0.0; k],
            psp_den: vec![0.0; k],
            psndcg_num: vec![0.0; k],
            psndcg_den: vec![0.0; k],
        }
    }

    fn merge(mut self, other: Totals) -> Self {
        let add = |a: &mut Vec<f64>, b: Vec<f64>| a.iter_mut().zip(b).for_each(|(x, y)| *x += y);
        add(&mut self.precision, other.precision);
        add(&mut self.ndcg, other.ndcg);
        add(&mut self.psp_num, other.psp_num);
        add(&mut self.psp_den, other.psp_den);
        add(&mut self.psndcg_num, other.psndcg_num);
        add(&mut self.psndcg_den, other.psndcg_den);
        self
    }
}

/// Running sum of per-rank gains, padded to `k` ranks.
fn cumulative(gains: impl Iterator<Item = f64>, k: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(k);
    let mut acc = 0.0;
    let mut gains = gains.fuse();
    for _ in 0..k {
        acc += gains.next().unwrap_or(0.0);
        out.push(acc);
    }
    out
}

fn row_totals(
    ranked: &[usize],
    truth: &[usize],
    inv_psp: Option<&[f64]>,
    disc: &[f64],
    cum_disc: &[f64],
) -> Totals {
    let k = disc.len();
    let mut totals = Totals::zeros(k);
    if truth.is_empty() {
        return totals;
    }
    let hit = |l: &usize| truth.binary_search(l).is_ok();

    let hits = cumulative(ranked.iter().map(|l| if hit(l) { 1.0 } else { 0.0 }), k);
    let dcg = cumulative(
        ranked
            .iter()
            .zip(disc)
            .map(|(l, d)| if hit(l) { *d } else { 0.0 }),
        k,
    );
    // ideal DCG for this row: all positives ranked first
    let norm: Vec<f64> = (0..k).map(|j| cum_disc[j.min(truth.len() - 1)]).collect();
    for j in 0..k {
        totals.precision[j] = hits[j] / (j + 1) as f64;
        totals.ndcg[j] = dcg[j] / norm[j];
    }

    if let Some(w) = inv_psp {
        let weight = |l: &usize| w.get(*l).copied().unwrap_or(0.0);
        let mut ideal: Vec<f64> = truth.iter().map(weight).collect();
        ideal.sort_by(|a, b| b.total_cmp(a));

        let ps_hits = cumulative(ranked.iter().map(|l| if hit(l) { weight(l) } else { 0.0 }), k);
        let ps_ideal = cumulative(ideal.iter().copied(), k);
        let ps_dcg = cumulative(
            ranked
                .iter()
                .zip(disc)
                .map(|(l, d)| if hit(l) { weight(l) * d } else { 0.0 }),
            k,
        );
        let ps_ideal_dcg = cumulative(ideal.iter().zip(disc).map(|(v, d)| v * d), k);
        for j in 0..k {
            totals.psp_num[j] = ps_hits[j];
            totals.psp_den[j] = ps_ideal[j];
            totals.psndcg_num[j] = ps_dcg[j] / norm[j];
            totals.psndcg_den[j] = ps_ideal_dcg[j] / norm[j];
        }
    }
    totals
}

fn check_shapes(pred: &CsrMatrix, truth: &CsrMatrix) -> Result<()> {
    if pred.shape() != truth.shape() {
        return Err(Error::ShapeMismatch {
            expected: truth.shape(),
            got: pred.shape(),
        });
    }
    Ok(())
}

fn totals(
    pred: &CsrMatrix,
    truth: &CsrMatrix,
    inv_psp: Option<&[f64]>,
    k: usize,
) -> Result<Totals> {
    check_shapes(pred, truth)?;
    if let Some(w) = inv_psp {
        if w.len() != truth.cols() {
            return Err(Error::ShapeMismatch {
                expected: (1, truth.cols()),
                got: (1, w.len()),
            });
        }
    }
    let disc = discounts(k);
    let cum_disc = cumulative(disc.iter().copied(), k);
    let ranked = top_k(pred, k);
    Ok(ranked
        .par_iter()
        .enumerate()
        .map(|(r, top)| {
            let truth_row = &truth.indices()[truth.indptr()[r]..truth.indptr()[r + 1]];
            let positives: Vec<usize> = truth_row
                .iter()
                .zip(&truth.data()[truth.indptr()[r]..truth.indptr()[r + 1]])
                .filter_map(|(&l, &v)| (v != 0.0).then_some(l))
                .collect();
            row_totals(top, &positives, inv_psp, &disc, &cum_disc)
        })
        .reduce(|| Totals::zeros(k), Totals::merge))
}

fn mean(sums: Vec<f64>, n: usize) -> Vec<f64> {
    let n = n.max(1) as f64;
    sums.into_iter().map(|s| s / n).collect()
}

fn ratio(num: Vec<f64>, den: Vec<f64>) -> Vec<f64> {
    num.into_iter()
        .zip(den)
        .map(|(a, b)| if b > 0.0 { a / b } else { 0.0 })
        .collect()
}

/// All metrics at once: `[P, nDCG]`, plus `[PSP, PSnDCG]` when propensity
/// weights are given. Each entry holds the values for k = 1..=`k`.
pub fn evaluate(
    pred: &CsrMatrix,
    truth: &CsrMatrix,
    inv_psp: Option<&[f64]>,
    k: usize,
) -> Result<Vec<Vec<f64>>> {
    let t = totals(pred, truth, inv_psp, k)?;
    let n = truth.rows();
    let mut out = vec![mean(t.precision, n), mean(t.ndcg, n)];
    if inv_psp.is_some() {
        out.push(ratio(t.psp_num, t.psp_den));
        out.push(ratio(t.psndcg_num, t.psndcg_den));
    }
    Ok(out)
}

pub fn precision(pred: &CsrMatrix, truth: &CsrMatrix, k: usize) -> Result<Vec<f64>> {
    Ok(mean(totals(pred, truth, None, k)?.precision, truth.rows()))
}

pub fn ndcg(pred: &CsrMatrix, truth: &CsrMatrix, k: usize) -> Result<Vec<f64>> {
    Ok(mean(totals(pred, truth, None, k)?.ndcg, truth.rows()))
}

pub fn psprecision(
    pred: &CsrMatrix,
    truth: &CsrMatrix,
    inv_psp: &[f64],
    k: usize,
) -> Result<Vec<f64>> {
    let t = totals(pred, truth, Some(inv_psp), k)?;
    Ok(ratio(t.psp_num, t.psp_den))
}

pub fn psndcg(pred: &CsrMatrix, truth: &CsrMatrix, inv_psp: &[f64], k: usize) -> Result<Vec<f64>> {
    let t = totals(pred, truth, Some(inv_psp), k)?;
    Ok(ratio(t.psndcg_num, t.psndcg_den))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_k_orders_by_score_then_column() {
        let pred = CsrMatrix::from_rows(
            5,
            vec![vec![(0, 0.1), (2, 0.9), (3, 0.5), (4, 0.9)], vec![(1, 1.0)]],
        )
        .unwrap();
        assert_eq!(top_k(&pred, 3), vec![vec![2, 4, 3], vec![1]]);
    }

    #[test]
    fn cumulative_pads_short_rankings() {
        assert_eq!(cumulative([1.0, 2.0].into_iter(), 4), vec![1.0, 3.0, 3.0, 3.0]);
    }
}
