//! Lifecycle and pool accounting integration tests

use chrono::Utc;
use equity_ledger::{
    Advisory, EmployeeId, EmployeeStatus, EquityAdmin, EquityConfig, EquityError, GrantStatus,
    TransactionKind,
};

fn admin_with_pool(total: u64) -> EquityAdmin {
    let mut config = EquityConfig::default();
    config.pool.total_capacity = total;
    EquityAdmin::new(&config).unwrap()
}

fn assert_replay_consistent(admin: &EquityAdmin) {
    let pool = admin.pool();
    let deltas: i64 = pool.transactions().iter().map(|t| t.delta).sum();
    assert_eq!(pool.balance(), pool.total_capacity() as i64 + deltas);
    assert!(pool.verify_history().is_ok());
}

#[test]
fn test_hire_issues_standard_grant() {
    let mut admin = admin_with_pool(1_000_000);
    let id = admin
        .add_employee("Alice", "Engineering", "P7", EmployeeStatus::PendingHire)
        .unwrap()
        .employee_id;
    assert!(admin.grants().is_empty());

    let outcome = admin.process_hire(id).unwrap();

    let employee = admin.employee(id).unwrap();
    assert_eq!(employee.status, EmployeeStatus::Active);
    assert_eq!(employee.join_date, Utc::now().date_naive());

    let grants = admin.grants_for(id);
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].granted_shares, 40_000);
    assert_eq!(grants[0].vested_shares, 0);
    assert_eq!(grants[0].status, GrantStatus::Active);

    assert_eq!(outcome.balance, 960_000);
    assert_eq!(admin.pool().balance(), 960_000);
    assert!(outcome.advisories.is_empty());

    let last = admin.pool().transactions().last().unwrap();
    assert_eq!(last.kind, TransactionKind::Grant);
    assert_eq!(last.delta, -40_000);
    assert!(last.description.contains("E001"));
    assert_replay_consistent(&admin);
}

#[test]
fn test_hire_with_insufficient_pool_still_hires() {
    let mut admin = admin_with_pool(30_000);
    let id = admin
        .add_employee("Bob", "Research", "P7", EmployeeStatus::PendingHire)
        .unwrap()
        .employee_id;

    let outcome = admin.process_hire(id).unwrap();

    assert_eq!(admin.employee(id).unwrap().status, EmployeeStatus::Active);
    assert!(outcome.grant.is_none());
    assert!(admin.grants().is_empty());
    assert_eq!(admin.pool().balance(), 30_000);
    assert_eq!(
        outcome.advisories,
        vec![Advisory::InsufficientPool {
            employee_id: id,
            requested: 40_000,
            available: 30_000,
        }]
    );
    assert_replay_consistent(&admin);
}

#[test]
fn test_add_active_and_hire_share_issuance() {
    let mut direct = admin_with_pool(1_000_000);
    let mut staged = admin_with_pool(1_000_000);

    let a = direct
        .add_employee("Carol", "Ops", "P8", EmployeeStatus::Active)
        .unwrap();
    let id = staged
        .add_employee("Carol", "Ops", "P8", EmployeeStatus::PendingHire)
        .unwrap()
        .employee_id;
    let b = staged.process_hire(id).unwrap();

    assert_eq!(a.grant.as_ref().unwrap().shares, b.grant.as_ref().unwrap().shares);
    assert_eq!(a.balance, b.balance);
    assert_eq!(direct.grants()[0].reason, staged.grants()[0].reason);
    assert_eq!(
        direct.pool().transactions()[1].description,
        staged.pool().transactions()[1].description
    );
}

#[test]
fn test_hire_requires_pending() {
    let mut admin = admin_with_pool(1_000_000);
    let id = admin
        .add_employee("Dan", "Sales", "P6", EmployeeStatus::Active)
        .unwrap()
        .employee_id;
    let before = admin.clone();

    assert!(matches!(
        admin.process_hire(id),
        Err(EquityError::InvalidTransition { .. })
    ));
    assert!(matches!(
        admin.process_hire(EmployeeId(42)),
        Err(EquityError::NotFound { .. })
    ));
    assert_eq!(admin, before);
}

#[test]
fn test_departure_reclaims_only_unvested() {
    let mut admin = admin_with_pool(1_000_000);
    admin.set_level_standard("L1", 100).unwrap();
    admin.set_level_standard("L2", 150).unwrap();

    let id = admin
        .add_employee("Eve", "Engineering", "L1", EmployeeStatus::Active)
        .unwrap()
        .employee_id;
    let promoted = admin.process_promotion(id, "L2").unwrap();
    let first = admin.grants_for(id)[0].id;
    let second = promoted.grant.unwrap().grant_id;

    admin.record_vesting(first, 30).unwrap();
    admin.record_vesting(second, 50).unwrap();
    let balance_before = admin.pool().balance();

    let today = Utc::now().date_naive();
    let outcome = admin.process_departure(id, today, "resigned").unwrap();

    assert_eq!(outcome.reclaimed, 70);
    assert_eq!(outcome.terminated, vec![first, second]);
    assert_eq!(admin.pool().balance(), balance_before + 70);
    assert!(admin
        .grants_for(id)
        .iter()
        .all(|g| g.status == GrantStatus::Terminated));

    let employee = admin.employee(id).unwrap();
    assert_eq!(employee.status, EmployeeStatus::Departed);
    assert_eq!(employee.leave_date, Some(today));
    assert_eq!(employee.leave_reason.as_deref(), Some("resigned"));

    let last = admin.pool().transactions().last().unwrap();
    assert_eq!(last.kind, TransactionKind::Reclaim);
    assert_eq!(last.delta, 70);
    assert_eq!(admin.current_usage(), 0);
    assert_replay_consistent(&admin);
}

#[test]
fn test_departure_with_fully_vested_grants_posts_nothing() {
    let mut admin = admin_with_pool(1_000_000);
    let id = admin
        .add_employee("Fay", "Engineering", "P6", EmployeeStatus::Active)
        .unwrap()
        .employee_id;
    let grant = admin.grants_for(id)[0].id;
    admin.record_vesting(grant, 20_000).unwrap();
    let tx_count = admin.pool().transactions().len();

    let outcome = admin
        .process_departure(id, Utc::now().date_naive(), "retired")
        .unwrap();
    assert_eq!(outcome.reclaimed, 0);
    assert_eq!(outcome.terminated.len(), 1);
    assert_eq!(admin.pool().transactions().len(), tx_count);
}

#[test]
fn test_departure_requires_active() {
    let mut admin = admin_with_pool(1_000_000);
    let pending = admin
        .add_employee("Gus", "Sales", "P6", EmployeeStatus::PendingHire)
        .unwrap()
        .employee_id;
    let today = Utc::now().date_naive();
    assert!(matches!(
        admin.process_departure(pending, today, "withdrawn"),
        Err(EquityError::InvalidTransition { .. })
    ));

    admin.process_hire(pending).unwrap();
    admin.process_departure(pending, today, "laid off").unwrap();
    assert!(matches!(
        admin.process_departure(pending, today, "again"),
        Err(EquityError::InvalidTransition { .. })
    ));
    assert!(matches!(
        admin.process_hire(pending),
        Err(EquityError::InvalidTransition { .. })
    ));
}

#[test]
fn test_promotion_issues_difference() {
    let mut admin = admin_with_pool(1_000_000);
    let id = admin
        .add_employee("Hal", "Engineering", "P6", EmployeeStatus::Active)
        .unwrap()
        .employee_id;
    let balance_before = admin.pool().balance();

    let outcome = admin.process_promotion(id, "P7").unwrap();

    assert_eq!(outcome.standard_delta, 20_000);
    assert_eq!(outcome.grant.as_ref().unwrap().shares, 20_000);
    assert_eq!(outcome.from_level, "P6");
    assert_eq!(admin.employee(id).unwrap().level, "P7");
    assert_eq!(admin.pool().balance(), balance_before - 20_000);
    assert_eq!(admin.grants_for(id).len(), 2);
    assert_replay_consistent(&admin);
}

#[test]
fn test_promotion_to_lower_or_equal_standard() {
    let mut admin = admin_with_pool(1_000_000);
    admin.set_level_standard("P7b", 40_000).unwrap();
    let id = admin
        .add_employee("Ivy", "Engineering", "P7", EmployeeStatus::Active)
        .unwrap()
        .employee_id;
    let balance_before = admin.pool().balance();

    let lateral = admin.process_promotion(id, "P7b").unwrap();
    assert!(lateral.grant.is_none());
    assert_eq!(lateral.standard_delta, 0);

    let demotion = admin.process_promotion(id, "P6").unwrap();
    assert!(demotion.grant.is_none());
    assert_eq!(demotion.standard_delta, -20_000);

    assert_eq!(admin.employee(id).unwrap().level, "P6");
    assert_eq!(admin.pool().balance(), balance_before);
    assert_eq!(admin.grants_for(id).len(), 1);
}

#[test]
fn test_promotion_blocked_by_pool_keeps_level() {
    let mut admin = admin_with_pool(50_000);
    let id = admin
        .add_employee("Jay", "Engineering", "P6", EmployeeStatus::Active)
        .unwrap()
        .employee_id;
    let before = admin.clone();

    // P6 -> P8 needs 60_000, only 30_000 remain
    let err = admin.process_promotion(id, "P8").unwrap_err();
    assert_eq!(
        err,
        EquityError::InsufficientPool {
            requested: 60_000,
            available: 30_000
        }
    );
    assert_eq!(admin, before);
    assert_eq!(admin.employee(id).unwrap().level, "P6");
}

#[test]
fn test_promotion_requires_active() {
    let mut admin = admin_with_pool(1_000_000);
    let id = admin
        .add_employee("Kim", "Engineering", "P6", EmployeeStatus::PendingHire)
        .unwrap()
        .employee_id;
    assert!(matches!(
        admin.process_promotion(id, "P7"),
        Err(EquityError::InvalidTransition { .. })
    ));
}

#[test]
fn test_level_change_does_not_touch_existing_grants() {
    let mut admin = admin_with_pool(1_000_000);
    let id = admin
        .add_employee("Lea", "Engineering", "P7", EmployeeStatus::Active)
        .unwrap()
        .employee_id;
    admin.set_level_standard("P7", 55_000).unwrap();
    admin.delete_level_standard("P8").unwrap();

    assert_eq!(admin.grants_for(id)[0].granted_shares, 40_000);
    assert_eq!(admin.standard_for("P8"), 0);
    assert_eq!(admin.standard_for("P7"), 55_000);
}

#[test]
fn test_reinitialize_pool_carries_active_grants() {
    let mut admin = admin_with_pool(1_000_000);
    admin
        .add_employee("Max", "Engineering", "P8", EmployeeStatus::Active)
        .unwrap();

    let outcome = admin.initialize_pool(2_000_000).unwrap();
    assert_eq!(outcome.carried_over, 80_000);
    assert_eq!(outcome.balance, 1_920_000);
    assert_eq!(admin.pool().transactions().len(), 2);
    assert_replay_consistent(&admin);
}

#[test]
fn test_replay_invariant_over_mixed_sequence() {
    let mut admin = admin_with_pool(300_000);
    let mut ids = Vec::new();
    for (name, level) in [("A", "P6"), ("B", "P7"), ("C", "P8"), ("D", "P8"), ("E", "P8")] {
        let outcome = admin
            .add_employee(name, "Engineering", level, EmployeeStatus::PendingHire)
            .unwrap();
        ids.push(outcome.employee_id);
    }
    for id in &ids {
        admin.process_hire(*id).unwrap();
        assert_replay_consistent(&admin);
    }
    let _ = admin.process_promotion(ids[0], "P8");
    let grant = admin.grants_for(ids[1])[0].id;
    admin.record_vesting(grant, 10_000).unwrap();
    admin
        .process_departure(ids[1], Utc::now().date_naive(), "resigned")
        .unwrap();
    let _ = admin.process_promotion(ids[0], "P8");
    admin.initialize_pool(400_000).unwrap();

    assert_replay_consistent(&admin);
    assert!(admin.pool().balance() >= 0);
}
