use colored::Colorize;
use prettytable::{Cell, Row, Table};

use crate::financing::PaymentEstimate;
use crate::invoice::Invoice;
use crate::simulation::SimulationResult;

fn money(value: f64) -> String {
    format!("{:.2}", value)
}

fn titles(cells: &[&str]) -> Row {
    Row::new(cells.iter().map(|c| Cell::new(c)).collect())
}

fn row(cells: &[String]) -> Row {
    Row::new(cells.iter().map(|c| Cell::new(c)).collect())
}

/// Per-treatment split between insurer and patient
pub fn coverage_table(result: &SimulationResult) -> Table {
    let mut table = Table::new();
    table.set_titles(titles(&[
        "Treatment",
        "Qty",
        "Line total",
        "Coverage %",
        "Cap",
        "Covered",
        "Patient",
    ]));
    for detail in &result.coverage {
        let cap = detail.max_covered_amount.map_or("-".to_string(), money);
        table.add_row(row(&[
            detail.treatment_name.clone(),
            detail.quantity.to_string(),
            money(detail.line_total),
            format!("{:.0}", detail.coverage_percentage),
            cap,
            money(detail.covered_amount),
            money(detail.patient_amount),
        ]));
    }
    table
}

pub fn summary_table(result: &SimulationResult) -> Table {
    let mut table = Table::new();
    for (label, value) in [
        ("Subtotal", result.subtotal),
        ("Percentage discount", result.percentage_discount_amount),
        ("Fixed discount", result.fixed_discount),
        ("Total discount", result.total_discount),
        ("Insurance covered", result.insurance_covered),
        ("Patient total", result.patient_total),
    ] {
        table.add_row(row(&[label.to_string(), money(value)]));
    }
    table
}

pub fn invoice_table(invoice: &Invoice) -> Table {
    let mut table = Table::new();
    table.set_titles(titles(&["Description", "Qty", "Unit price", "Disc %", "Tax %", "Total"]));
    for item in &invoice.items {
        table.add_row(row(&[
            item.description().to_string(),
            item.quantity().to_string(),
            money(item.unit_price()),
            format!("{:.1}", item.discount_percentage()),
            format!("{:.1}", item.tax_percentage()),
            money(item.total()),
        ]));
    }
    table
}

pub fn print_simulation(result: Option<&SimulationResult>, payment: Option<&PaymentEstimate>) {
    let Some(result) = result else {
        println!("{}", "No treatments selected".yellow());
        return;
    };

    println!("\n--- Coverage breakdown ---");
    coverage_table(result).printstd();
    println!("\n--- Summary ---");
    summary_table(result).printstd();
    println!(
        "{} {}",
        "Patient pays:".bold(),
        money(result.patient_total).green().bold()
    );

    if let Some(estimate) = payment {
        println!(
            "{} {} x {} months (financed {}, fee {}, interest {})",
            "Financing:".bold(),
            money(estimate.monthly_payment).cyan().bold(),
            estimate.term_months,
            money(estimate.financed_amount),
            money(estimate.origination_fee),
            money(estimate.total_interest),
        );
    }
    println!();
}

pub fn print_invoice(invoice: &Invoice) {
    println!(
        "\n{} {} for {} ({:?}, issued {})",
        format!("{:?}", invoice.kind).bold(),
        invoice.number,
        invoice.patient_name,
        invoice.status,
        invoice.issued_on
    );
    invoice_table(invoice).printstd();

    let totals = invoice.totals();
    println!("Subtotal:  {}", money(totals.subtotal));
    println!("Discount:  {}", money(totals.total_discount));
    println!("Tax:       {}", money(totals.total_tax));
    println!("Total:     {}", money(totals.grand_total).bold());
    let balance = invoice.balance_due();
    let balance = if balance > 0.0 {
        money(balance).red()
    } else {
        money(balance).green()
    };
    println!("Balance:   {}\n", balance);
}
