use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::SimulationError;
use crate::sanitize::{self, round_cents};

/// Total for one row: quantity * unit price, less discount, plus tax on the discounted amount.
///
/// Inputs are coerced first, so malformed values count as 0 and never raise.
pub fn line_total(quantity: f64, unit_price: f64, discount_pct: f64, tax_pct: f64) -> f64 {
    let (subtotal, discount, tax) = line_parts(quantity, unit_price, discount_pct, tax_pct);
    round_cents(subtotal - discount + tax)
}

/// (subtotal, discount amount, tax amount) for one row, unrounded
fn line_parts(quantity: f64, unit_price: f64, discount_pct: f64, tax_pct: f64) -> (f64, f64, f64) {
    let subtotal = sanitize::amount(quantity) * sanitize::amount(unit_price);
    let discount = subtotal * sanitize::percentage(discount_pct) / 100.0;
    let after_discount = subtotal - discount;
    let tax = after_discount * sanitize::percentage(tax_pct) / 100.0;
    (subtotal, discount, tax)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LineItemFields {
    description: String,
    quantity: f64,
    unit_price: f64,
    #[serde(default)]
    discount_percentage: f64,
    #[serde(default)]
    tax_percentage: f64,
}

/// A billable row on an invoice or quote.
///
/// Fields are private so that `total` can only ever be the value derived from
/// the other four; any `total` found in incoming JSON is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "LineItemFields")]
pub struct LineItem {
    description: String,
    quantity: f64,
    unit_price: f64,
    discount_percentage: f64,
    tax_percentage: f64,
    total: f64,
}

impl From<LineItemFields> for LineItem {
    fn from(fields: LineItemFields) -> Self {
        LineItem::new(
            fields.description,
            fields.quantity,
            fields.unit_price,
            fields.discount_percentage,
            fields.tax_percentage,
        )
    }
}

impl LineItem {
    pub fn new(
        description: impl Into<String>,
        quantity: f64,
        unit_price: f64,
        discount_percentage: f64,
        tax_percentage: f64,
    ) -> Self {
        let mut item = LineItem {
            description: description.into(),
            quantity: sanitize::amount(quantity),
            unit_price: sanitize::amount(unit_price),
            discount_percentage: sanitize::percentage(discount_percentage),
            tax_percentage: sanitize::percentage(tax_percentage),
            total: 0.0,
        };
        item.recompute();
        item
    }

    fn recompute(&mut self) {
        self.total = line_total(
            self.quantity,
            self.unit_price,
            self.discount_percentage,
            self.tax_percentage,
        );
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn quantity(&self) -> f64 {
        self.quantity
    }

    pub fn unit_price(&self) -> f64 {
        self.unit_price
    }

    pub fn discount_percentage(&self) -> f64 {
        self.discount_percentage
    }

    pub fn tax_percentage(&self) -> f64 {
        self.tax_percentage
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn set_quantity(&mut self, quantity: f64) {
        self.quantity = sanitize::amount(quantity);
        self.recompute();
    }

    pub fn set_unit_price(&mut self, unit_price: f64) {
        self.unit_price = sanitize::amount(unit_price);
        self.recompute();
    }

    pub fn set_discount_percentage(&mut self, discount_percentage: f64) {
        self.discount_percentage = sanitize::percentage(discount_percentage);
        self.recompute();
    }

    pub fn set_tax_percentage(&mut self, tax_percentage: f64) {
        self.tax_percentage = sanitize::percentage(tax_percentage);
        self.recompute();
    }

    fn parts(&self) -> (f64, f64, f64) {
        line_parts(
            self.quantity,
            self.unit_price,
            self.discount_percentage,
            self.tax_percentage,
        )
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    pub subtotal: f64,
    pub total_discount: f64,
    pub total_tax: f64,
    pub grand_total: f64,
}

/// Sum line items into subtotal, discount, tax and grand total.
///
/// Each row's figures are rounded to cents and summed as integer cents, so the
/// result does not depend on item order. The grand total is the sum of the
/// rounded line totals and always matches what each row displays.
pub fn aggregate(items: &[LineItem]) -> InvoiceTotals {
    let (subtotal, discount, tax, grand_total) =
        items
            .iter()
            .fold((0i64, 0i64, 0i64, 0i64), |(s, d, t, g), item| {
                let (subtotal, discount, tax) = item.parts();
                (
                    s + to_cents(subtotal),
                    d + to_cents(discount),
                    t + to_cents(tax),
                    g + to_cents(item.total()),
                )
            });
    InvoiceTotals {
        subtotal: from_cents(subtotal),
        total_discount: from_cents(discount),
        total_tax: from_cents(tax),
        grand_total: from_cents(grand_total),
    }
}

fn to_cents(value: f64) -> i64 {
    (value * 100.0).round() as i64
}

fn from_cents(cents: i64) -> f64 {
    cents as f64 / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Invoice,
    Quote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Issued,
    PartiallyPaid,
    Paid,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    Insurance,
    Financing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub amount: f64,
    pub paid_on: NaiveDate,
    pub method: PaymentMethod,
}

/// An invoice or a quote for a patient
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub number: String,
    pub kind: DocumentKind,
    pub patient_name: String,
    pub issued_on: NaiveDate,
    pub due_on: Option<NaiveDate>,
    pub status: InvoiceStatus,
    #[serde(default)]
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub payments: Vec<Payment>,
    pub notes: Option<String>,
}

impl Invoice {
    pub fn new(
        number: impl Into<String>,
        kind: DocumentKind,
        patient_name: impl Into<String>,
        issued_on: NaiveDate,
    ) -> Self {
        Invoice {
            number: number.into(),
            kind,
            patient_name: patient_name.into(),
            issued_on,
            due_on: None,
            status: InvoiceStatus::Draft,
            items: Vec::new(),
            payments: Vec::new(),
            notes: None,
        }
    }

    pub fn add_item(&mut self, item: LineItem) {
        self.items.push(item);
    }

    pub fn replace_item(&mut self, index: usize, item: LineItem) -> Result<(), SimulationError> {
        let len = self.items.len();
        let slot = self
            .items
            .get_mut(index)
            .ok_or(SimulationError::ItemIndex { index, len })?;
        *slot = item;
        Ok(())
    }

    pub fn remove_item(&mut self, index: usize) -> Result<LineItem, SimulationError> {
        if index >= self.items.len() {
            return Err(SimulationError::ItemIndex {
                index,
                len: self.items.len(),
            });
        }
        Ok(self.items.remove(index))
    }

    pub fn totals(&self) -> InvoiceTotals {
        aggregate(&self.items)
    }

    pub fn amount_paid(&self) -> f64 {
        round_cents(self.payments.iter().map(|p| p.amount).sum())
    }

    pub fn balance_due(&self) -> f64 {
        round_cents((self.totals().grand_total - self.amount_paid()).max(0.0))
    }

    /// Record a payment against an issued invoice and move its status forward.
    ///
    /// Drafts, quotes, settled and cancelled documents take no payments, and a
    /// payment may not exceed the balance due.
    pub fn record_payment(&mut self, payment: Payment) -> Result<(), SimulationError> {
        if self.kind == DocumentKind::Quote {
            return Err(SimulationError::PaymentRejected(format!(
                "{} is a quote",
                self.number
            )));
        }
        match self.status {
            InvoiceStatus::Issued | InvoiceStatus::PartiallyPaid => {}
            InvoiceStatus::Draft => {
                return Err(SimulationError::PaymentRejected(format!(
                    "{} has not been issued",
                    self.number
                )));
            }
            InvoiceStatus::Paid => {
                return Err(SimulationError::PaymentRejected(format!(
                    "{} is already paid",
                    self.number
                )));
            }
            InvoiceStatus::Cancelled => {
                return Err(SimulationError::PaymentRejected(format!(
                    "{} is cancelled",
                    self.number
                )));
            }
        }
        if !(payment.amount.is_finite() && payment.amount > 0.0) {
            return Err(SimulationError::PaymentRejected(format!(
                "amount must be positive, got {}",
                payment.amount
            )));
        }
        let balance = self.balance_due();
        if round_cents(payment.amount) > balance {
            return Err(SimulationError::PaymentRejected(format!(
                "{:.2} exceeds the balance of {:.2}",
                payment.amount, balance
            )));
        }

        self.payments.push(payment);
        self.status = if self.balance_due() <= 0.0 {
            InvoiceStatus::Paid
        } else {
            InvoiceStatus::PartiallyPaid
        };
        Ok(())
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        match (self.status, self.due_on) {
            (InvoiceStatus::Issued | InvoiceStatus::PartiallyPaid, Some(due)) => today > due,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample_items() -> Vec<LineItem> {
        vec![
            LineItem::new("Cleaning", 2.0, 45.0, 10.0, 21.0),
            LineItem::new("X-ray", 1.0, 30.0, 0.0, 21.0),
            LineItem::new("Whitening kit", 3.0, 19.99, 5.0, 0.0),
        ]
    }

    #[test]
    fn test_line_total() {
        // 2 * 45 = 90, -10% = 81, +21% = 98.01
        assert_eq!(line_total(2.0, 45.0, 10.0, 21.0), 98.01);
        assert_eq!(line_total(1.0, 100.0, 0.0, 0.0), 100.0);
        assert_eq!(line_total(1.0, 100.0, 100.0, 21.0), 0.0);
    }

    #[test]
    fn test_line_total_coerces_malformed_input() {
        assert_eq!(line_total(f64::NAN, 10.0, 0.0, 0.0), 0.0);
        assert_eq!(line_total(-1.0, 10.0, 0.0, 0.0), 0.0);
        assert_eq!(line_total(1.0, 10.0, f64::NAN, -5.0), 10.0);
    }

    #[test]
    fn test_setters_keep_total_in_sync() {
        let mut item = LineItem::new("Filling", 1.0, 80.0, 0.0, 0.0);
        assert_eq!(item.total(), 80.0);
        item.set_quantity(2.0);
        assert_eq!(item.total(), 160.0);
        item.set_discount_percentage(25.0);
        assert_eq!(item.total(), 120.0);
        item.set_tax_percentage(10.0);
        assert_eq!(item.total(), 132.0);
        item.set_unit_price(-4.0);
        assert_eq!(item.unit_price(), 0.0);
        assert_eq!(item.total(), 0.0);
    }

    #[test]
    fn test_deserialized_total_is_recomputed() {
        let json = r#"{
            "description": "Sealant",
            "quantity": 4,
            "unit_price": 25.0,
            "discount_percentage": 0,
            "tax_percentage": 10,
            "total": 9999.0
        }"#;
        let item: LineItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.total(), 110.0);
    }

    #[test]
    fn test_aggregate() {
        let totals = aggregate(&sample_items());
        // subtotal: 90 + 30 + 59.97
        assert_eq!(totals.subtotal, 179.97);
        // discount: 9 + 0 + 2.9985
        assert_eq!(totals.total_discount, 12.0);
        // tax: 81 * 0.21 + 30 * 0.21 = 17.01 + 6.3
        assert_eq!(totals.total_tax, 23.31);
        // lines: 98.01 + 36.30 + 56.97
        assert_eq!(totals.grand_total, 191.28);
    }

    #[test]
    fn test_aggregate_ignores_order() {
        let items = sample_items();
        let mut reversed = items.clone();
        reversed.reverse();
        let mut rotated = items.clone();
        rotated.rotate_left(1);
        assert_eq!(aggregate(&items), aggregate(&reversed));
        assert_eq!(aggregate(&items), aggregate(&rotated));
    }

    #[test]
    fn test_aggregate_half_cent_discounts() {
        // 55.308 + 38.502 + 29.865 sums to a half cent in f64
        let items = vec![
            LineItem::new("Implant abutment", 4.0, 138.27, 10.0, 0.0),
            LineItem::new("Veneer", 4.0, 192.51, 5.0, 0.0),
            LineItem::new("Night guard", 3.0, 79.64, 12.5, 0.0),
        ];
        let mut reversed = items.clone();
        reversed.reverse();
        let forward = aggregate(&items);
        assert_eq!(forward, aggregate(&reversed));
        assert_eq!(forward.subtotal, 1562.04);
    }

    #[test]
    fn test_aggregate_empty() {
        assert_eq!(aggregate(&[]), InvoiceTotals::default());
    }

    #[test]
    fn test_item_editing() {
        let mut invoice = Invoice::new("INV-1", DocumentKind::Invoice, "Jane Doe", date(2025, 1, 10));
        invoice.add_item(LineItem::new("A", 1.0, 10.0, 0.0, 0.0));
        invoice.add_item(LineItem::new("B", 1.0, 20.0, 0.0, 0.0));
        invoice
            .replace_item(0, LineItem::new("A2", 2.0, 10.0, 0.0, 0.0))
            .unwrap();
        assert_eq!(invoice.totals().grand_total, 40.0);

        let removed = invoice.remove_item(1).unwrap();
        assert_eq!(removed.description(), "B");
        assert_eq!(
            invoice.remove_item(5),
            Err(SimulationError::ItemIndex { index: 5, len: 1 })
        );
        assert!(invoice.replace_item(1, LineItem::new("C", 1.0, 1.0, 0.0, 0.0)).is_err());
    }

    #[test]
    fn test_record_payment() {
        let mut invoice = Invoice::new("INV-2", DocumentKind::Invoice, "John Roe", date(2025, 2, 1));
        invoice.status = InvoiceStatus::Issued;
        invoice.add_item(LineItem::new("Crown", 1.0, 800.0, 0.0, 0.0));

        invoice
            .record_payment(Payment {
                amount: 300.0,
                paid_on: date(2025, 2, 3),
                method: PaymentMethod::Card,
            })
            .unwrap();
        assert_eq!(invoice.status, InvoiceStatus::PartiallyPaid);
        assert_eq!(invoice.balance_due(), 500.0);

        invoice
            .record_payment(Payment {
                amount: 500.0,
                paid_on: date(2025, 2, 10),
                method: PaymentMethod::Insurance,
            })
            .unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Paid);
        assert_eq!(invoice.balance_due(), 0.0);
    }

    #[test]
    fn test_payment_rejections() {
        let payment = Payment {
            amount: 10.0,
            paid_on: date(2025, 3, 1),
            method: PaymentMethod::Cash,
        };

        let mut quote = Invoice::new("Q-1", DocumentKind::Quote, "Jane Doe", date(2025, 3, 1));
        assert!(quote.record_payment(payment.clone()).is_err());

        let mut cancelled = Invoice::new("INV-3", DocumentKind::Invoice, "Jane Doe", date(2025, 3, 1));
        cancelled.status = InvoiceStatus::Cancelled;
        assert!(cancelled.record_payment(payment.clone()).is_err());

        let mut invoice = Invoice::new("INV-4", DocumentKind::Invoice, "Jane Doe", date(2025, 3, 1));
        invoice.add_item(LineItem::new("Filling", 1.0, 80.0, 0.0, 0.0));
        invoice.status = InvoiceStatus::Issued;
        let zero = Payment { amount: 0.0, ..payment.clone() };
        assert!(invoice.record_payment(zero).is_err());
        assert!(invoice.payments.is_empty());
    }

    #[test]
    fn test_drafts_and_settled_invoices_take_no_payments() {
        let payment = Payment {
            amount: 50.0,
            paid_on: date(2025, 4, 1),
            method: PaymentMethod::Transfer,
        };
        let mut invoice = Invoice::new("INV-5", DocumentKind::Invoice, "John Roe", date(2025, 4, 1));
        invoice.add_item(LineItem::new("Cleaning", 1.0, 100.0, 0.0, 0.0));

        assert!(matches!(
            invoice.record_payment(payment.clone()),
            Err(SimulationError::PaymentRejected(_))
        ));
        assert_eq!(invoice.status, InvoiceStatus::Draft);

        invoice.status = InvoiceStatus::Issued;
        let too_much = Payment { amount: 150.0, ..payment.clone() };
        assert!(invoice.record_payment(too_much).is_err());
        assert_eq!(invoice.status, InvoiceStatus::Issued);

        invoice.record_payment(payment.clone()).unwrap();
        invoice.record_payment(payment.clone()).unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Paid);

        assert!(invoice.record_payment(payment).is_err());
        assert_eq!(invoice.payments.len(), 2);
        assert_eq!(invoice.amount_paid(), 100.0);
    }

    #[test]
    fn test_overdue() {
        let mut invoice = Invoice::new("INV-5", DocumentKind::Invoice, "Jane Doe", date(2025, 4, 1));
        invoice.due_on = Some(date(2025, 4, 30));
        assert!(!invoice.is_overdue(date(2025, 5, 2)));
        invoice.status = InvoiceStatus::Issued;
        assert!(!invoice.is_overdue(date(2025, 4, 30)));
        assert!(invoice.is_overdue(date(2025, 5, 2)));
    }
}
