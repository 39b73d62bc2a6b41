//! Invoice listings and per-invoice detail.

mod common;

use common::*;
use tally_core::{Money, SaleLine};

#[tokio::test]
async fn listing_is_most_recent_first() {
    let t = ledger().await;
    let fx = fixture(&t).await;
    let p = product(&t, &fx, "Teclado", 100, 1_000).await;

    let mut ids = Vec::new();
    for qty in 1..=3 {
        let id = t
            .sales()
            .register_sale(fx.client.id, &[SaleLine::new(p.id, qty)])
            .await
            .unwrap();
        ids.push(id);
    }

    let listed: Vec<i64> = t
        .invoices()
        .list_invoices()
        .await
        .unwrap()
        .iter()
        .map(|s| s.id)
        .collect();
    ids.reverse();
    assert_eq!(listed, ids);

    let newest = &t.invoices().list_invoices().await.unwrap()[0];
    assert_eq!(newest.client_name, "Laura Martínez");
    assert_eq!(newest.total_cents, 3_000);
}

#[tokio::test]
async fn listing_an_empty_ledger_is_empty() {
    let t = ledger().await;
    assert!(t.invoices().list_invoices().await.unwrap().is_empty());
    assert_eq!(t.invoices().count().await.unwrap(), 0);
}

#[tokio::test]
async fn detail_repeats_header_next_to_each_line_in_order() {
    let t = ledger().await;
    let fx = fixture(&t).await;
    let mouse = product(&t, &fx, "Mouse", 10, 5_000).await;
    let cable = product(&t, &fx, "Cable", 10, 3_333).await;

    let invoice_id = t
        .sales()
        .register_sale(
            fx.client.id,
            &[SaleLine::new(mouse.id, 2), SaleLine::new(cable.id, 3)],
        )
        .await
        .unwrap();

    let detail = t.invoices().invoice_detail(invoice_id).await.unwrap();
    assert_eq!(detail.len(), 2);
    assert_eq!(detail.total(), Money::from_cents(19_999));

    let names: Vec<&str> = detail.iter().map(|r| r.product_name.as_str()).collect();
    assert_eq!(names, vec!["Mouse", "Cable"]);

    for row in &detail {
        assert_eq!(row.invoice_id, invoice_id);
        assert_eq!(row.client_id, fx.client.id);
        assert_eq!(row.client_name, "Laura Martínez");
        assert_eq!(row.client_national_id, "40875231");
        assert_eq!(row.total_cents, 19_999);
        assert_eq!(row.category_name, "Periféricos");
        assert_eq!(row.supplier_name, "TechDistrib SA");
        assert_eq!(row.line_total_cents, row.unit_price_cents * row.quantity);
    }

    // Iterating a second time sees the same rows.
    let again: Vec<i64> = detail.iter().map(|r| r.quantity).collect();
    assert_eq!(again, vec![2, 3]);

    let owned = detail.into_rows();
    assert_eq!(owned[1].line_total_cents, 9_999);
}

#[tokio::test]
async fn detail_of_unknown_invoice_is_empty() {
    let t = ledger().await;

    let detail = t.invoices().invoice_detail(12_345).await.unwrap();
    assert!(detail.is_empty());
    assert!(detail.header().is_none());
    assert_eq!(detail.total(), Money::zero());

    let detail = t.invoices().invoice_detail_str("12345").await.unwrap();
    assert!(detail.is_empty());
}

#[tokio::test]
async fn detail_of_non_numeric_id_is_a_validation_error() {
    let t = ledger().await;

    let err = t.invoices().invoice_detail_str("abc").await.unwrap_err();
    assert_eq!(err.kind(), "validation");

    let err = t.invoices().invoice_detail_str("").await.unwrap_err();
    assert_eq!(err.kind(), "validation");
}

#[tokio::test]
async fn header_and_lines_are_readable_separately() {
    let t = ledger().await;
    let fx = fixture(&t).await;
    let p = product(&t, &fx, "Webcam", 10, 85_000).await;

    let invoice_id = t
        .sales()
        .register_sale(fx.client.id, &[SaleLine::new(p.id, 2)])
        .await
        .unwrap();

    let invoice = t.invoices().get_invoice(invoice_id).await.unwrap().unwrap();
    assert_eq!(invoice.client_id, fx.client.id);
    assert_eq!(invoice.client_email, "cliente@mail.com");
    assert_eq!(invoice.total_cents, 170_000);

    let lines = t.invoices().get_lines(invoice_id).await.unwrap();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].invoice_id, invoice_id);
    assert_eq!(lines[0].product_id, p.id);
    assert_eq!(lines[0].quantity, 2);
    assert_eq!(lines[0].unit_price_cents, 85_000);

    assert!(t.invoices().get_invoice(invoice_id + 1).await.unwrap().is_none());
    assert!(t.invoices().get_lines(invoice_id + 1).await.unwrap().is_empty());
}

#[tokio::test]
async fn detail_serializes_as_a_row_array() {
    let t = ledger().await;
    let fx = fixture(&t).await;
    let p = product(&t, &fx, "Hub USB", 10, 37_000).await;

    let invoice_id = t
        .sales()
        .register_sale(fx.client.id, &[SaleLine::new(p.id, 1)])
        .await
        .unwrap();

    let detail = t.invoices().invoice_detail(invoice_id).await.unwrap();
    let json = serde_json::to_value(&detail).unwrap();

    let rows = json["rows"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["product_name"], "Hub USB");
    assert_eq!(rows[0]["line_total_cents"], 37_000);
}
