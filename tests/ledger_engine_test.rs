//! Engine-level scenario tests: FIFO matching, classification, aggregation
//! and carry-forward over realistic multi-share portfolios.

use capledger::domain::{Decimal, GainType, Leg, Share, TransactionRow};
use capledger::engine::{carry_forward, Ledger, LedgerError};
use capledger::tax_config::TaxConfig;
use capledger::FinancialYear;
use chrono::NaiveDate;

fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

fn leg(d: &str, qty: i64, amount: i64) -> Option<Leg> {
    Some(Leg::new(
        date(d),
        Decimal::from_int(qty),
        Decimal::from_int(amount),
    ))
}

fn year() -> FinancialYear {
    "2025-2026".parse().unwrap()
}

fn row(share: &str, opening: Option<Leg>, purchase: Option<Leg>, sale: Option<Leg>) -> TransactionRow {
    TransactionRow {
        share: Share::new(share),
        opening,
        purchase,
        sale,
    }
}

fn build(rows: Vec<TransactionRow>) -> Ledger {
    Ledger::build(rows, year(), TaxConfig::default(), 1).unwrap()
}

#[test]
fn test_tcs_scenario_end_to_end() {
    // Opening 50 @ 3300 (2023), purchase 30 @ 3400, sale of 20 for 84000.
    let ledger = build(vec![row(
        "TCS",
        leg("2023-05-15", 50, 165000),
        leg("2025-06-10", 30, 102000),
        leg("2025-08-20", 20, 84000),
    )]);

    // The sale consumed the opening lot: held 27 months, long-term.
    let pairing = ledger.transactions.iter().find(|t| t.is_sale()).unwrap();
    assert_eq!(pairing.gain_type, Some(GainType::Ltcg));
    assert_eq!(pairing.gain, Some(Decimal::from_int(18000)));
    assert_eq!(pairing.opening_date, Some(date("2023-05-15")));
    assert_eq!(pairing.opening_amount, Some(Decimal::from_int(66000)));

    let balance = &ledger.closing_balances[0];
    assert_eq!(balance.closing_qty, Decimal::from_int(60));
    assert_eq!(balance.closing_amount, Decimal::from_int(183000));
    assert_eq!(balance.realized_gain, Decimal::from_int(18000));
    assert_eq!(balance.ltcg, Decimal::from_int(18000));
    assert_eq!(balance.stcg, Decimal::zero());
}

#[test]
fn test_fifo_quantity_conservation_over_portfolio() {
    let rows = vec![
        row(
            "TCS",
            leg("2023-05-15", 50, 165000),
            leg("2025-06-10", 30, 102000),
            leg("2025-08-20", 20, 84000),
        ),
        row("INFY", leg("2024-04-01", 100, 150000), None, None),
        row(
            "INFY",
            None,
            leg("2025-05-02", 40, 64000),
            leg("2025-11-10", 120, 210000),
        ),
        row("WIPRO", None, leg("2025-07-01", 25, 11000), None),
    ];
    let ledger = build(rows);
    assert!(ledger.issues.is_empty());

    for balance in &ledger.closing_balances {
        let acquired: Decimal = balance
            .transactions
            .iter()
            .filter_map(|t| t.acquisition_qty())
            .sum();
        assert_eq!(
            acquired,
            balance.opening_qty + balance.purchase_qty,
            "acquisition conservation failed for {}",
            balance.share
        );

        let sold: Decimal = balance.transactions.iter().filter_map(|t| t.sale_qty).sum();
        assert_eq!(sold, balance.sale_qty, "sale conservation failed for {}", balance.share);

        assert_eq!(
            balance.closing_qty,
            balance.opening_qty + balance.purchase_qty - balance.sale_qty
        );
    }

    // Summary totals equal the sum of per-share fields.
    let opening: Decimal = ledger.closing_balances.iter().map(|b| b.opening_amount).sum();
    assert_eq!(ledger.summary.total_opening_value, opening);
    let closing: Decimal = ledger.closing_balances.iter().map(|b| b.closing_amount).sum();
    assert_eq!(ledger.summary.total_closing_value, closing);
}

#[test]
fn test_sale_crossing_opening_into_purchase_splits_gain_types() {
    // 10 held long, 10 bought recently; selling 15 produces one long-term
    // pairing (10) and one short-term pairing (5).
    let ledger = build(vec![row(
        "HDFC",
        leg("2023-04-10", 10, 10000),
        leg("2025-06-01", 10, 14000),
        leg("2025-09-01", 15, 24000),
    )]);

    let sales: Vec<_> = ledger.transactions.iter().filter(|t| t.is_sale()).collect();
    assert_eq!(sales.len(), 2);

    let long = &sales[0];
    assert_eq!(long.gain_type, Some(GainType::Ltcg));
    assert_eq!(long.opening_qty, Some(Decimal::from_int(10)));
    // 10/15 of the 24000 proceeds against a 10000 cost.
    assert_eq!(long.gain, Some(Decimal::from_int(6000)));

    let short = &sales[1];
    assert_eq!(short.gain_type, Some(GainType::Stcg));
    assert_eq!(short.purchase_qty, Some(Decimal::from_int(5)));
    // 5/15 of proceeds (8000) against 5 @ 1400 cost.
    assert_eq!(short.gain, Some(Decimal::from_int(1000)));

    let balance = &ledger.closing_balances[0];
    assert_eq!(balance.ltcg, Decimal::from_int(6000));
    assert_eq!(balance.stcg, Decimal::from_int(1000));
    assert_eq!(balance.first_purchase_date, Some(date("2025-06-01")));
}

#[test]
fn test_classification_boundary_with_custom_threshold() {
    let mut config = TaxConfig::default();
    config.ltcg.holding_period_months = 24;

    let rows = vec![
        // Exactly 24 months: long-term.
        row("AT", leg("2023-09-01", 1, 100), None, leg("2025-09-01", 1, 150)),
        // One month short: short-term.
        row("UNDER", leg("2023-10-01", 1, 100), None, leg("2025-09-01", 1, 150)),
    ];
    let ledger = Ledger::build(rows, year(), config, 1).unwrap();

    let by_share = |name: &str| {
        ledger
            .transactions
            .iter()
            .find(|t| t.share == Share::new(name) && t.is_sale())
            .unwrap()
    };
    assert_eq!(by_share("AT").gain_type, Some(GainType::Ltcg));
    assert_eq!(by_share("UNDER").gain_type, Some(GainType::Stcg));
}

#[test]
fn test_oversold_share_is_reported_and_excluded() {
    let rows = vec![
        row("OK", leg("2024-04-01", 10, 1000), None, leg("2025-02-01", 10, 1800)),
        // Sells 30 against 20 available.
        row(
            "SHORT",
            leg("2024-04-01", 10, 1000),
            leg("2024-08-01", 10, 1200),
            leg("2025-02-01", 30, 5000),
        ),
    ];
    let ledger = build(rows);

    assert_eq!(ledger.issues.len(), 1);
    let issue = &ledger.issues[0];
    assert_eq!(issue.share, Share::new("SHORT"));
    assert_eq!(issue.shortfall, Decimal::from_int(10));
    assert_eq!(issue.sale_date, date("2025-02-01"));

    assert_eq!(ledger.closing_balances.len(), 1);
    assert_eq!(ledger.closing_balances[0].share, Share::new("OK"));
    assert_eq!(ledger.summary.total_sale_value, Decimal::from_int(1800));
    assert_eq!(ledger.capital_gains.total_stcg, Decimal::from_int(800));
}

#[test]
fn test_malformed_row_rejects_upload() {
    let rows = vec![
        row("OK", leg("2024-04-01", 10, 1000), None, None),
        TransactionRow {
            share: Share::new("BAD"),
            opening: Some(Leg::new(
                date("2024-04-01"),
                Decimal::from_int(-10),
                Decimal::from_int(1000),
            )),
            purchase: None,
            sale: None,
        },
    ];
    let err = Ledger::build(rows, year(), TaxConfig::default(), 1).unwrap_err();
    assert!(matches!(err, LedgerError::MalformedRow { row: 2, .. }));
}

#[test]
fn test_carry_forward_rows_reload_as_next_year_openings() {
    let ledger = build(vec![
        row(
            "TCS",
            leg("2023-05-15", 50, 165000),
            leg("2025-06-10", 30, 102000),
            leg("2025-08-20", 20, 84000),
        ),
        // Fully sold out; must not carry forward.
        row("GONE", leg("2024-04-01", 10, 1000), None, leg("2025-03-01", 10, 1600)),
    ]);

    let next = ledger.financial_year.next();
    let rows = carry_forward(&ledger.closing_balances, next.start_date());
    assert_eq!(rows.len(), 1);

    let opening = rows[0].opening.as_ref().unwrap();
    assert_eq!(rows[0].share, Share::new("TCS"));
    assert_eq!(opening.date, date("2026-04-01"));
    assert_eq!(opening.qty, Decimal::from_int(60));
    assert_eq!(opening.amount, Decimal::from_int(183000));

    // The projection is itself a valid next-year ledger input.
    let reloaded = Ledger::build(rows, next, TaxConfig::default(), 1).unwrap();
    assert_eq!(
        reloaded.closing_balances[0].opening_qty,
        Decimal::from_int(60)
    );
    assert_eq!(
        reloaded.summary.total_opening_value,
        Decimal::from_int(183000)
    );
}
