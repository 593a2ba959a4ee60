//! Formatted terminal output for the three result types.
//!
//! We keep formatting code in one place so:
//! - the search code stays clean and testable
//! - output changes are localized

use crate::fit::FittedModel;
use crate::report::metrics::ClassificationReport;
use crate::search::{PathSearchResult, PlausibleModelSet, StabilityResult};

/// Per-depth summary of a path search, listing up to `top` models per depth.
pub fn format_search(result: &PathSearchResult, top: usize) -> String {
    let meta = result.meta();
    let mut out = String::new();

    out.push_str("=== mpaic - multi-path AIC search ===\n");
    out.push_str(&format!(
        "Data: n={} p={} | family={}\n",
        meta.n,
        meta.p,
        meta.family.display_name()
    ));
    out.push_str(&format!(
        "Params: K={} eps={:e} delta={} L={}\n",
        meta.max_depth, meta.eps, meta.delta, meta.max_models
    ));
    out.push_str(&format!(
        "Intercept-only AIC: {}\n",
        fmt_aic(result.empty_model().score)
    ));

    if result.is_empty() {
        out.push_str("\nNo model improved on the intercept-only fit.\n");
        return out;
    }

    for frontier in result.frontiers() {
        out.push_str(&format!(
            "\nDepth {} ({} model{}):\n",
            frontier.depth,
            frontier.models.len(),
            if frontier.models.len() == 1 { "" } else { "s" }
        ));
        for m in frontier.models.iter().take(top) {
            out.push_str(&format!("  {:>12}  {}\n", fmt_aic(m.score), m.id));
        }
        if frontier.models.len() > top {
            out.push_str(&format!("  ... {} more\n", frontier.models.len() - top));
        }
    }

    if let Some(best) = result.best() {
        out.push_str(&format!("\nBest: {} (AIC {})\n", best.id, fmt_aic(best.score)));
    }
    out
}

/// Stability scores, most stable first.
pub fn format_stability(result: &StabilityResult) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Stability: B={} {:?} (rows per resample: {})",
        result.resamples(),
        result.kind(),
        result.sample_size()
    ));
    if !result.failed().is_empty() {
        out.push_str(&format!(" | failed resamples: {}", result.failed().len()));
    }
    out.push('\n');

    out.push_str(&format!("{:<16} {:>8}\n", "variable", "pi"));
    out.push_str(&format!("{:-<16} {:-<8}\n", "", ""));
    for (name, pi) in result.ranked() {
        out.push_str(&format!("{:<16} {:>8.3}\n", truncate(name, 16), pi));
    }
    out
}

/// The plausible-model shortlist as a table.
pub fn format_plausible(set: &PlausibleModelSet) -> String {
    let mut out = String::new();
    if set.is_empty() {
        out.push_str("No plausible models passed the filters.\n");
        return out;
    }

    out.push_str(&format!(
        "Plausible models ({}), AIC_min = {}:\n",
        set.len(),
        fmt_aic(set.aic_min())
    ));
    out.push_str(&format!(
        "{:<4} {:<32} {:>4} {:>12} {:>8} {:>9}\n",
        "rank", "model", "size", "AIC", "dAIC", "stability"
    ));
    out.push_str(&format!(
        "{:-<4} {:-<32} {:-<4} {:-<12} {:-<8} {:-<9}\n",
        "", "", "", "", "", ""
    ));
    for (i, e) in set.iter().enumerate() {
        let stability = e
            .avg_stability
            .map(|s| format!("{s:.3}"))
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "{:<4} {:<32} {:>4} {:>12} {:>8.3} {:>9}\n",
            i + 1,
            truncate(e.id(), 32),
            e.size(),
            fmt_aic(e.aic),
            e.delta_aic,
            stability
        ));
    }
    out
}

/// Coefficients of a fitted model, one per line.
pub fn format_fitted(model: &FittedModel) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} fit: deviance={:.4} AIC={} iterations={}\n",
        model.family.display_name(),
        model.deviance,
        fmt_aic(model.aic),
        model.iterations
    ));
    out.push_str(&format!("  {:<16} {:>12.6}\n", "(intercept)", model.intercept()));
    for (term, coef) in model.terms.iter().zip(model.coefficients.iter().skip(1)) {
        out.push_str(&format!("  {:<16} {:>12.6}\n", truncate(term, 16), coef));
    }
    out
}

pub fn format_classification(report: &ClassificationReport) -> String {
    let cm = &report.confusion;
    let mut out = String::new();
    out.push_str(&format!("Classification at threshold {:.2}:\n", report.threshold));
    out.push_str(&format!(
        "  TP={} FP={} TN={} FN={}\n",
        cm.true_positive, cm.false_positive, cm.true_negative, cm.false_negative
    ));
    out.push_str(&format!(
        "  accuracy={:.3} sensitivity={:.3} specificity={:.3}\n",
        report.accuracy, report.sensitivity, report.specificity
    ));
    out.push_str(&format!(
        "  precision={:.3} F1={:.3} FDR={:.3}\n",
        report.precision, report.f1, report.fdr
    ));
    out
}

fn fmt_aic(v: f64) -> String {
    if v.is_finite() {
        format!("{v:.3}")
    } else {
        "failed".to_string()
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
