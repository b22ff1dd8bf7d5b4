use super::*;
use crate::availability::AvailabilityStore;
use crate::storage::{KeyValueStore, MemoryStore};
use chrono::{NaiveDate, NaiveTime};
use shared::{Availability, Medication, Site, StockLevel, StockStatus};

fn medication(id: i64, name: &str) -> Medication {
    Medication {
        id,
        name: name.to_string(),
        kind: "analgesico".to_string(),
        reference: format!("REF-{id}"),
        description: String::new(),
        photo: None,
        photo_file_name: None,
        photo_mime_type: None,
    }
}

fn site(id: i64, name: &str) -> Site {
    Site {
        id,
        name: name.to_string(),
        address: None,
        phone: None,
    }
}

fn row(medication_id: i64, site_id: i64, stock: u32) -> Availability {
    let status = if stock == 0 {
        StockStatus::Agotado
    } else if stock <= 10 {
        StockStatus::PocoStock
    } else {
        StockStatus::Disponible
    };
    Availability {
        id: medication_id * 100 + site_id,
        medication_id,
        site_id,
        stock,
        status,
        medication: None,
        site: None,
    }
}

fn store_with(rows: Vec<Availability>) -> AvailabilityStore {
    AvailabilityStore::from_parts(Vec::new(), rows)
}

fn empty_cart() -> CartManager<MemoryStore> {
    CartManager::load(MemoryStore::new()).unwrap()
}

// ========================================================================
// add_item
// ========================================================================

#[test]
fn add_item_snapshots_stock() {
    let availability = store_with(vec![row(1, 1, 5)]);
    let mut cart = empty_cart();

    let level = cart
        .add_item(&availability, &medication(1, "Ibuprofeno"), &site(1, "Sede Norte"), 2)
        .unwrap();

    assert_eq!(level, StockLevel::Low);
    assert_eq!(cart.len(), 1);
    let line = &cart.lines()[0];
    assert_eq!(line.quantity, 2);
    assert_eq!(line.max_quantity, 5);
    assert_eq!(line.medication_name, "Ibuprofeno");
    assert_eq!(line.site_name, "Sede Norte");
    assert_eq!(line.status, "poco_stock");
    assert!(!line.is_scheduled());
}

#[test]
fn add_item_without_availability_row_fails() {
    let availability = store_with(vec![row(1, 1, 5)]);
    let mut cart = empty_cart();

    let err = cart
        .add_item(&availability, &medication(1, "Ibuprofeno"), &site(2, "Sede Sur"), 1)
        .unwrap_err();

    assert!(matches!(
        err,
        CartError::NotAvailable {
            medication_id: 1,
            site_id: 2
        }
    ));
    assert!(cart.is_empty());
}

#[test]
fn add_item_rejects_zero_quantity() {
    let availability = store_with(vec![row(1, 1, 5)]);
    let mut cart = empty_cart();

    let err = cart
        .add_item(&availability, &medication(1, "Ibuprofeno"), &site(1, "Sede Norte"), 0)
        .unwrap_err();

    assert!(matches!(err, CartError::InvalidQuantity(0)));
}

#[test]
fn add_item_rejects_over_stock() {
    let availability = store_with(vec![row(1, 1, 5)]);
    let mut cart = empty_cart();

    let err = cart
        .add_item(&availability, &medication(1, "Ibuprofeno"), &site(1, "Sede Norte"), 6)
        .unwrap_err();

    assert!(matches!(
        err,
        CartError::InsufficientStock {
            requested: 6,
            available: 5
        }
    ));
}

#[test]
fn add_item_enforces_single_site() {
    let availability = store_with(vec![row(1, 1, 5), row(2, 2, 5)]);
    let mut cart = empty_cart();

    cart.add_item(&availability, &medication(1, "Ibuprofeno"), &site(1, "Sede Norte"), 1)
        .unwrap();

    let err = cart
        .add_item(&availability, &medication(2, "Amoxicilina"), &site(2, "Sede Sur"), 1)
        .unwrap_err();

    assert!(matches!(
        err,
        CartError::SiteConflict {
            cart_site_id: 1,
            requested_site_id: 2
        }
    ));
    assert_eq!(cart.len(), 1);
}

#[test]
fn add_item_merges_duplicate_pair() {
    let availability = store_with(vec![row(1, 1, 10)]);
    let mut cart = empty_cart();
    let med = medication(1, "Ibuprofeno");
    let sede = site(1, "Sede Norte");

    cart.add_item(&availability, &med, &sede, 3).unwrap();
    cart.add_item(&availability, &med, &sede, 4).unwrap();

    assert_eq!(cart.len(), 1);
    assert_eq!(cart.lines()[0].quantity, 7);
}

#[test]
fn merge_over_stock_leaves_existing_line_untouched() {
    let availability = store_with(vec![row(1, 1, 6)]);
    let mut cart = empty_cart();
    let med = medication(1, "Ibuprofeno");
    let sede = site(1, "Sede Norte");

    cart.add_item(&availability, &med, &sede, 3).unwrap();
    let err = cart.add_item(&availability, &med, &sede, 4).unwrap_err();

    assert!(matches!(
        err,
        CartError::InsufficientStock {
            requested: 7,
            available: 6
        }
    ));
    assert_eq!(cart.len(), 1);
    assert_eq!(cart.lines()[0].quantity, 3);
}

#[test]
fn add_item_same_site_different_medication_appends() {
    let availability = store_with(vec![row(1, 1, 5), row(2, 1, 20)]);
    let mut cart = empty_cart();

    let first = cart
        .add_item(&availability, &medication(1, "Ibuprofeno"), &site(1, "Sede Norte"), 2)
        .unwrap();
    let second = cart
        .add_item(&availability, &medication(2, "Amoxicilina"), &site(1, "Sede Norte"), 5)
        .unwrap();

    assert_eq!(first, StockLevel::Low);
    assert_eq!(second, StockLevel::Available);
    assert_eq!(cart.len(), 2);
    assert_eq!(cart.site_id(), Some(1));
    assert_eq!(cart.total_quantity(), 7);
}

// ========================================================================
// update_quantity / remove_item
// ========================================================================

#[test]
fn update_quantity_bounds_against_snapshot() {
    let availability = store_with(vec![row(1, 1, 5)]);
    let mut cart = empty_cart();
    cart.add_item(&availability, &medication(1, "Ibuprofeno"), &site(1, "Sede Norte"), 2)
        .unwrap();

    cart.update_quantity(0, 5).unwrap();
    assert_eq!(cart.lines()[0].quantity, 5);

    let err = cart.update_quantity(0, 6).unwrap_err();
    assert!(matches!(err, CartError::InvalidQuantity(6)));
    assert_eq!(cart.lines()[0].quantity, 5);

    let err = cart.update_quantity(0, 0).unwrap_err();
    assert!(matches!(err, CartError::InvalidQuantity(0)));

    let err = cart.update_quantity(3, 1).unwrap_err();
    assert!(matches!(err, CartError::OutOfBounds(3)));
}

#[test]
fn remove_item_checks_bounds() {
    let availability = store_with(vec![row(1, 1, 5)]);
    let mut cart = empty_cart();
    cart.add_item(&availability, &medication(1, "Ibuprofeno"), &site(1, "Sede Norte"), 2)
        .unwrap();

    let err = cart.remove_item(1).unwrap_err();
    assert!(matches!(err, CartError::OutOfBounds(1)));

    let removed = cart.remove_item(0).unwrap();
    assert_eq!(removed.medication_id, 1);
    assert!(cart.is_empty());
}

// ========================================================================
// schedule / clear
// ========================================================================

#[test]
fn set_schedule_stamps_every_line() {
    let availability = store_with(vec![row(1, 1, 5), row(2, 1, 20)]);
    let mut cart = empty_cart();
    cart.add_item(&availability, &medication(1, "Ibuprofeno"), &site(1, "Sede Norte"), 1)
        .unwrap();
    cart.add_item(&availability, &medication(2, "Amoxicilina"), &site(1, "Sede Norte"), 1)
        .unwrap();

    let date = NaiveDate::from_ymd_opt(2026, 8, 10).unwrap();
    let time = NaiveTime::from_hms_opt(9, 30, 0).unwrap();
    cart.set_schedule(date, time).unwrap();

    for line in cart.lines() {
        assert_eq!(line.pickup_date, "2026-08-10");
        assert_eq!(line.pickup_time, "09:30:00");
        assert!(line.is_scheduled());
    }
}

#[test]
fn clear_removes_persisted_entry() {
    let store = MemoryStore::new();
    let availability = store_with(vec![row(1, 1, 5)]);
    let mut cart = CartManager::load(store.clone()).unwrap();
    cart.add_item(&availability, &medication(1, "Ibuprofeno"), &site(1, "Sede Norte"), 1)
        .unwrap();
    assert!(store.get(CART_KEY).unwrap().is_some());

    cart.clear().unwrap();

    assert!(cart.is_empty());
    assert!(store.get(CART_KEY).unwrap().is_none());
}

// ========================================================================
// persistence
// ========================================================================

#[test]
fn mutations_survive_restart() {
    let store = MemoryStore::new();
    let availability = store_with(vec![row(1, 1, 10)]);

    let mut cart = CartManager::load(store.clone()).unwrap();
    cart.add_item(&availability, &medication(1, "Ibuprofeno"), &site(1, "Sede Norte"), 3)
        .unwrap();
    cart.update_quantity(0, 4).unwrap();
    let before: Vec<_> = cart.lines().to_vec();
    drop(cart);

    // "restart": reload from the same backing store
    let reloaded = CartManager::load(store).unwrap();
    assert_eq!(reloaded.lines(), before.as_slice());
}

#[test]
fn corrupt_persisted_cart_degrades_to_empty() {
    let store = MemoryStore::new();
    store.put(CART_KEY, "{not json").unwrap();

    let cart = CartManager::load(store.clone()).unwrap();

    assert!(cart.is_empty());
    // the corrupt entry was deleted, not kept around
    assert!(store.get(CART_KEY).unwrap().is_none());
}

#[test]
fn persisted_wire_format_is_stable() {
    let store = MemoryStore::new();
    let availability = store_with(vec![row(1, 1, 5)]);
    let mut cart = CartManager::load(store.clone()).unwrap();
    cart.add_item(&availability, &medication(1, "Ibuprofeno"), &site(1, "Sede Norte"), 2)
        .unwrap();

    let raw = store.get(CART_KEY).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let entry = &value.as_array().unwrap()[0];

    assert_eq!(entry["medicamentoId"], 1);
    assert_eq!(entry["sedeId"], 1);
    assert_eq!(entry["cantidad"], 2);
    assert_eq!(entry["maxCantidad"], 5);
    assert_eq!(entry["fechaRecoleccion"], "");
    assert_eq!(entry["horaRecoleccion"], "");
}
