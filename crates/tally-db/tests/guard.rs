//! Referential guard: deletable sets, guarded deletes, and product writes
//! that depend on master data.

mod common;

use common::*;
use tally_core::{EntityKind, NewCategory, NewProduct, SaleLine, ValidationError};
use tally_db::LedgerError;

#[tokio::test]
async fn deletable_sets_exclude_referenced_rows() {
    let t = ledger().await;
    let fx = fixture(&t).await;
    let spare_category = category(&t, "Redes").await;
    let spare_supplier = supplier(&t, "PixelTrade SRL", "30765432987").await;
    let buyer = client(&t, "Ricardo Gómez", "39548620").await;
    let p = product(&t, &fx, "Teclado", 10, 100).await;

    t.sales()
        .register_sale(buyer.id, &[SaleLine::new(p.id, 1)])
        .await
        .unwrap();

    let categories = t.guard().deletable_categories().await.unwrap();
    assert_eq!(categories, vec![spare_category]);

    let suppliers = t.guard().deletable_suppliers().await.unwrap();
    assert_eq!(suppliers, vec![spare_supplier]);

    // fx.client never bought anything; the buyer is pinned by an invoice.
    let clients = t.guard().deletable_clients().await.unwrap();
    assert_eq!(clients, vec![fx.client]);
}

#[tokio::test]
async fn deletable_set_of_empty_table_is_empty() {
    let t = ledger().await;
    assert!(t.guard().deletable_categories().await.unwrap().is_empty());
    assert!(t.guard().deletable_suppliers().await.unwrap().is_empty());
    assert!(t.guard().deletable_clients().await.unwrap().is_empty());
}

#[tokio::test]
async fn deleting_an_unreferenced_row_removes_only_that_row() {
    let t = ledger().await;
    let keep = category(&t, "Sonido").await;
    let drop = category(&t, "Cámaras").await;

    t.guard().delete_category(drop.id).await.unwrap();

    let remaining = t.categories().list().await.unwrap();
    assert_eq!(remaining, vec![keep]);
    assert!(t.categories().get_by_id(drop.id).await.unwrap().is_none());
}

#[tokio::test]
async fn deleting_a_referenced_row_is_a_conflict() {
    let t = ledger().await;
    let fx = fixture(&t).await;
    product(&t, &fx, "Teclado", 10, 100).await;
    product(&t, &fx, "Mouse", 10, 100).await;

    let err = t.guard().delete_category(fx.category.id).await.unwrap_err();
    match err {
        LedgerError::ReferentialConflict {
            entity,
            id,
            dependents,
        } => {
            assert_eq!(entity, EntityKind::Category);
            assert_eq!(id, fx.category.id);
            assert_eq!(dependents, 2);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let err = t.guard().delete_supplier(fx.supplier.id).await.unwrap_err();
    assert_eq!(err.kind(), "referential_conflict");

    assert_eq!(t.categories().list().await.unwrap(), vec![fx.category]);
    assert_eq!(t.suppliers().list().await.unwrap(), vec![fx.supplier]);
}

#[tokio::test]
async fn stale_deletable_set_does_not_bypass_the_recheck() {
    let t = ledger().await;
    let fx = fixture(&t).await;
    let lonely = category(&t, "Almacenamiento").await;

    let offered = t.guard().deletable_categories().await.unwrap();
    assert!(offered.contains(&lonely));

    // Someone attaches a product between listing and deleting.
    t.products()
        .insert(&NewProduct {
            name: "Disco SSD".to_string(),
            category_id: lonely.id,
            supplier_id: fx.supplier.id,
            stock: 3,
            unit_price_cents: 50_000,
        })
        .await
        .unwrap();

    let err = t.guard().delete_category(lonely.id).await.unwrap_err();
    assert_eq!(err.kind(), "referential_conflict");
    assert!(t.categories().get_by_id(lonely.id).await.unwrap().is_some());
}

#[tokio::test]
async fn client_with_invoices_cannot_be_deleted() {
    let t = ledger().await;
    let fx = fixture(&t).await;
    let p = product(&t, &fx, "Teclado", 10, 100).await;

    t.sales()
        .register_sale(fx.client.id, &[SaleLine::new(p.id, 1)])
        .await
        .unwrap();

    let err = t.guard().delete_client(fx.client.id).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::ReferentialConflict {
            entity: EntityKind::Client,
            dependents: 1,
            ..
        }
    ));
    assert!(t.clients().get_by_id(fx.client.id).await.unwrap().is_some());
}

#[tokio::test]
async fn deleting_an_unknown_id_is_reference_not_found() {
    let t = ledger().await;

    let err = t.guard().delete_supplier(4_242).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::ReferenceNotFound {
            entity: EntityKind::Supplier,
            id: 4_242
        }
    ));

    let err = t.guard().delete_client(0).await.unwrap_err();
    assert_eq!(err.kind(), "validation");
}

#[tokio::test]
async fn dependent_counts_follow_the_rules() {
    let t = ledger().await;
    let fx = fixture(&t).await;
    let p = product(&t, &fx, "Teclado", 10, 100).await;

    assert!(t.guard().has_dependents(EntityKind::Category, fx.category.id).await.unwrap());
    assert!(t.guard().has_dependents(EntityKind::Supplier, fx.supplier.id).await.unwrap());
    assert!(!t.guard().has_dependents(EntityKind::Client, fx.client.id).await.unwrap());
    assert_eq!(t.guard().dependent_count(EntityKind::Product, p.id).await.unwrap(), 0);

    t.sales()
        .register_sale(fx.client.id, &[SaleLine::new(p.id, 1)])
        .await
        .unwrap();
    assert_eq!(
        t.guard().dependent_count(EntityKind::Client, fx.client.id).await.unwrap(),
        1
    );
}

#[tokio::test]
async fn deleting_the_last_product_frees_its_category() {
    let t = ledger().await;
    let fx = fixture(&t).await;
    let p = product(&t, &fx, "Teclado", 10, 100).await;

    t.products().delete(p.id).await.unwrap();
    assert!(t.products().get_by_id(p.id).await.unwrap().is_none());

    t.guard().delete_category(fx.category.id).await.unwrap();
    t.guard().delete_supplier(fx.supplier.id).await.unwrap();
}

#[tokio::test]
async fn product_delete_resolves_by_product_id() {
    let t = ledger().await;
    let fx = fixture(&t).await;
    let a = product(&t, &fx, "Teclado", 10, 100).await;
    let b = product(&t, &fx, "Mouse", 10, 100).await;

    t.products().delete(b.id).await.unwrap();

    let remaining = t.products().list().await.unwrap();
    assert_eq!(remaining, vec![a]);

    let err = t.products().delete(b.id).await.unwrap_err();
    assert!(matches!(
        err,
        LedgerError::ReferenceNotFound {
            entity: EntityKind::Product,
            ..
        }
    ));
}

#[tokio::test]
async fn folded_duplicate_names_are_rejected() {
    let t = ledger().await;
    category(&t, "Periféricos").await;

    let err = t
        .categories()
        .insert(&NewCategory {
            name: "  PERIFERICOS ".to_string(),
        })
        .await
        .unwrap_err();

    match err {
        LedgerError::Validation(ValidationError::Duplicate { field, .. }) => {
            assert_eq!(field, "name");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(t.categories().list().await.unwrap().len(), 1);
}

#[tokio::test]
async fn product_writes_check_their_references() {
    let t = ledger().await;
    let fx = fixture(&t).await;

    let err = t
        .products()
        .insert(&NewProduct {
            name: "Parlante".to_string(),
            category_id: 777,
            supplier_id: fx.supplier.id,
            stock: 1,
            unit_price_cents: 100,
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::ReferenceNotFound {
            entity: EntityKind::Category,
            id: 777
        }
    ));

    let p = product(&t, &fx, "Teclado", 10, 100).await;
    let err = t
        .products()
        .update(
            p.id,
            &NewProduct {
                name: "Teclado".to_string(),
                category_id: fx.category.id,
                supplier_id: 888,
                stock: 10,
                unit_price_cents: 100,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::ReferenceNotFound {
            entity: EntityKind::Supplier,
            id: 888
        }
    ));

    assert_eq!(t.products().count().await.unwrap(), 1);
    assert_eq!(stock_of(&t, p.id).await, 10);
}
