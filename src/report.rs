use std::fmt::Write;

use crate::models::{Eur, EurRecord};
use crate::pipeline::EstimateRun;

const UNDETERMINED: &str = "undetermined";

pub fn eur_label(eur: &Eur) -> String {
    match eur {
        Eur::Fitted(value) => value.to_string(),
        Eur::Undetermined(_) => UNDETERMINED.to_string(),
    }
}

/// Plain-text listing printed after an estimation run.
pub fn console_listing(run: &EstimateRun) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "Total historical oil production by operator:");
    for total in &run.operator_production {
        let _ = writeln!(
            output,
            "\t{}: {} bbl",
            total.operator_name, total.total_oil_production
        );
    }

    let _ = writeln!(output, "EUR per well:");
    for record in &run.eur_records {
        let _ = writeln!(
            output,
            "\tWell: {} ({}), EUR: {} bbl, Operator: {}",
            record.well_name.as_deref().unwrap_or("-"),
            record.api,
            eur_label(&record.eur),
            record.operator_name.as_deref().unwrap_or("-"),
        );
    }

    let _ = writeln!(output, "Total estimated reserve by operator:");
    for reserve in &run.operator_reserves {
        let _ = writeln!(
            output,
            "\t{}: {} bbl ({} wells estimated, {} undetermined)",
            reserve.operator_name,
            reserve.total_estimated_reserve,
            reserve.wells_estimated,
            reserve.wells_undetermined
        );
    }

    output
}

pub fn build_report(run: &EstimateRun, top_wells: usize) -> String {
    let mut output = String::new();
    let summary = &run.summary;

    let _ = writeln!(output, "# Decline Curve Reserve Report");
    let _ = writeln!(
        output,
        "Run {} over a {}-month horizon: {} wells estimated, {} undetermined.",
        summary.run_id,
        summary.horizon_months,
        summary.wells_estimated,
        summary.wells_undetermined
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Historical Production by Operator");

    if run.operator_production.is_empty() {
        let _ = writeln!(output, "No wells in the well table.");
    } else {
        for total in &run.operator_production {
            let _ = writeln!(
                output,
                "- {}: {:.0} bbl",
                total.operator_name, total.total_oil_production
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Estimated Reserve by Operator");

    if run.operator_reserves.is_empty() {
        let _ = writeln!(output, "No operators to report.");
    } else {
        for reserve in &run.operator_reserves {
            let _ = writeln!(
                output,
                "- {}: {} bbl across {} wells ({} undetermined)",
                reserve.operator_name,
                reserve.total_estimated_reserve,
                reserve.wells_estimated,
                reserve.wells_undetermined
            );
        }
    }

    let mut fitted: Vec<&EurRecord> = run
        .eur_records
        .iter()
        .filter(|record| record.eur.is_fitted())
        .collect();
    fitted.sort_by(|a, b| b.eur.summable().cmp(&a.eur.summable()));

    let _ = writeln!(output);
    let _ = writeln!(output, "## Highest EUR Wells");

    if fitted.is_empty() {
        let _ = writeln!(output, "No well could be fitted.");
    } else {
        for record in fitted.iter().take(top_wells) {
            let params = record
                .params
                .map(|p| format!(" (qi {:.1}, b {:.3}, Di {:.4})", p.qi, p.b, p.di))
                .unwrap_or_default();
            let _ = writeln!(
                output,
                "- {} ({}, {}): {} bbl{}",
                record.well_name.as_deref().unwrap_or("-"),
                record.api,
                record.operator_name.as_deref().unwrap_or("-"),
                eur_label(&record.eur),
                params
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Undetermined Wells");

    let undetermined: Vec<&EurRecord> = run
        .eur_records
        .iter()
        .filter(|record| !record.eur.is_fitted())
        .collect();
    if undetermined.is_empty() {
        let _ = writeln!(output, "Every well was fitted.");
    } else {
        for record in undetermined {
            if let Eur::Undetermined(reason) = &record.eur {
                let _ = writeln!(
                    output,
                    "- {} ({}): {} ({})",
                    record.well_name.as_deref().unwrap_or("-"),
                    record.api,
                    reason.status(),
                    reason.describe()
                );
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Field Production by Month");

    if run.monthly_production.is_empty() {
        let _ = writeln!(output, "No dated production records.");
    } else {
        let mut months = run.monthly_production.clone();
        months.sort_by_key(|month| month.date);
        for month in months {
            let _ = writeln!(
                output,
                "- {}: {:.0} bbl oil, {:.0} mcf gas from {} wells",
                month.date, month.oil_bbls, month.gas_mcf, month.well_count
            );
        }
    }

    output
}
