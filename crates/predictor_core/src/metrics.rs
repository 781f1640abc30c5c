//! Discrimination metrics for binary probability predictions

/// Area under the ROC curve via the rank-sum statistic.
///
/// Tied scores receive their average rank. Returns `None` when the inputs
/// differ in length or only one class is present.
pub fn roc_auc(scores: &[f64], labels: &[bool]) -> Option<f64> {
    if scores.len() != labels.len() {
        return None;
    }

    let positives = labels.iter().filter(|&&l| l).count();
    let negatives = labels.len() - positives;
    if positives == 0 || negatives == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut positive_rank_sum = 0.0;
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && scores[order[end]] == scores[order[start]] {
            end += 1;
        }

        // ranks are 1-based; the tie group spans ranks start+1 ..= end
        let avg_rank = (start + 1 + end) as f64 / 2.0;
        let group_positives = order[start..end].iter().filter(|&&i| labels[i]).count();
        positive_rank_sum += avg_rank * group_positives as f64;

        start = end;
    }

    let p = positives as f64;
    let n = negatives as f64;
    Some((positive_rank_sum - p * (p + 1.0) / 2.0) / (p * n))
}

/// Fraction of predictions on the correct side of 0.5
pub fn accuracy(scores: &[f64], labels: &[bool]) -> Option<f64> {
    if scores.is_empty() || scores.len() != labels.len() {
        return None;
    }
    let correct = scores
        .iter()
        .zip(labels)
        .filter(|&(&s, &l)| (s >= 0.5) == l)
        .count();
    Some(correct as f64 / scores.len() as f64)
}
