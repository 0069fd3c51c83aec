//! Borrow, return, renew and penalty rules across catalog, members and loans

use chrono::Duration;
use crate::common::{self, Desk, DUNE, FOUNDATION, PETIT_PRINCE};
use elidune_desk::{
    models::{BookStatus, LoanStatus, MemberCategory, SpecimenStatus},
    AppError,
};

#[test]
fn test_borrow_and_return_on_time() {
    let desk = Desk::new();
    let member = desk.member("Alice", MemberCategory::Student);
    desk.book(PETIT_PRINCE, "Le Petit Prince", &["00001"]);

    let loan = desk.services.loans.borrow(&member.matricule, PETIT_PRINCE, None).unwrap();
    assert_eq!(loan.barcode, "00001");
    assert_eq!(loan.due_at, common::start() + Duration::days(14));
    let book = desk.services.catalog.get_book(PETIT_PRINCE).unwrap();
    assert_eq!(book.status(), BookStatus::OnLoan);
    assert_eq!(book.borrow_count, 1);
    assert_eq!(book.specimen("00001").unwrap().status, SpecimenStatus::OnLoan);

    assert!(matches!(
        desk.services.loans.borrow(&member.matricule, PETIT_PRINCE, None),
        Err(AppError::CopyUnavailable(_))
    ));

    desk.advance_days(10);
    let returned = desk.services.loans.return_loan(&loan.id).unwrap();
    assert_eq!(desk.services.loans.status(&returned), LoanStatus::Returned);
    assert_eq!(
        desk.services.catalog.get_book(PETIT_PRINCE).unwrap().status(),
        BookStatus::Available
    );
    assert!(desk.services.loans.list_suspensions().is_empty());

    let member = desk.services.members.get(&member.matricule).unwrap();
    assert_eq!(member.loan_count(), 0);
    assert_eq!(member.history().len(), 2);
}

#[test]
fn test_late_return_suspends_three_days_per_day_late() {
    let desk = Desk::new();
    let member = desk.member("Alice", MemberCategory::Student);
    desk.book(PETIT_PRINCE, "Le Petit Prince", &["00001", "00002"]);

    let loan = desk.services.loans.borrow(&member.matricule, PETIT_PRINCE, None).unwrap();
    desk.advance_days(14 + 5);
    let returned = desk.services.loans.return_loan(&loan.id).unwrap();
    assert_eq!(desk.services.loans.status(&returned), LoanStatus::Overdue);

    let now = common::start() + Duration::days(19);
    assert_eq!(
        desk.services.loans.suspension_of(&member.matricule),
        Some(now + Duration::days(15))
    );
    match desk.services.loans.borrow(&member.matricule, PETIT_PRINCE, None) {
        Err(AppError::MemberSuspended { until, .. }) => assert_eq!(until, now + Duration::days(15)),
        other => panic!("expected a suspension, got {:?}", other),
    }

    // The suspension lapses exactly at its expiry
    desk.advance_days(15);
    assert!(desk.services.loans.borrow(&member.matricule, PETIT_PRINCE, None).is_ok());
    assert!(desk.services.loans.list_suspensions().is_empty());
}

#[test]
fn test_return_just_after_due_counts_one_day() {
    let desk = Desk::new();
    let member = desk.member("Alice", MemberCategory::Student);
    desk.book(PETIT_PRINCE, "Le Petit Prince", &["00001"]);

    let loan = desk.services.loans.borrow(&member.matricule, PETIT_PRINCE, None).unwrap();
    desk.clock.advance(Duration::days(14) + Duration::hours(2));
    desk.services.loans.return_loan(&loan.id).unwrap();

    let now = common::start() + Duration::days(14) + Duration::hours(2);
    assert_eq!(
        desk.services.loans.suspension_of(&member.matricule),
        Some(now + Duration::days(3))
    );
}

#[test]
fn test_loan_limit_per_category() {
    let desk = Desk::new();
    let student = desk.member("Alice", MemberCategory::Student);
    let teacher = desk.member("Bob", MemberCategory::Teacher);
    desk.book(PETIT_PRINCE, "Le Petit Prince", &["00001", "00002", "00003", "00004", "00005"]);

    for _ in 0..3 {
        desk.services.loans.borrow(&student.matricule, PETIT_PRINCE, None).unwrap();
    }
    match desk.services.loans.borrow(&student.matricule, PETIT_PRINCE, None) {
        Err(AppError::LoanLimitReached { limit, .. }) => assert_eq!(limit, 3),
        other => panic!("expected the loan limit, got {:?}", other),
    }
    assert_eq!(desk.services.members.get(&student.matricule).unwrap().loan_count(), 3);

    // Teachers go further on the remaining copies
    desk.services.loans.borrow(&teacher.matricule, PETIT_PRINCE, None).unwrap();
    desk.services.loans.borrow(&teacher.matricule, PETIT_PRINCE, None).unwrap();
    assert_eq!(desk.services.loans.list_active_by_member(&teacher.matricule).len(), 2);
    assert_eq!(
        desk.services.catalog.get_book(PETIT_PRINCE).unwrap().status(),
        BookStatus::OnLoan
    );
}

#[test]
fn test_inactive_member_cannot_borrow() {
    let desk = Desk::new();
    let member = desk.member("Alice", MemberCategory::Teacher);
    desk.book(PETIT_PRINCE, "Le Petit Prince", &["00001"]);

    assert!(desk.services.members.deactivate(&member.matricule));
    assert!(matches!(
        desk.services.loans.borrow(&member.matricule, PETIT_PRINCE, None),
        Err(AppError::LoanLimitReached { .. })
    ));
}

#[test]
fn test_borrow_checks_run_in_order() {
    let desk = Desk::new();
    let member = desk.member("Alice", MemberCategory::Student);
    desk.book(PETIT_PRINCE, "Le Petit Prince", &["00001", "00002"]);

    assert!(matches!(
        desk.services.loans.borrow("U-NOBODY00", PETIT_PRINCE, None),
        Err(AppError::MemberNotFound(_))
    ));
    assert!(matches!(
        desk.services.loans.borrow(&member.matricule, DUNE, None),
        Err(AppError::BookNotFound(_))
    ));
    assert!(matches!(
        desk.services.loans.borrow(&member.matricule, PETIT_PRINCE, Some("99999")),
        Err(AppError::CopyUnavailable(_))
    ));

    let loan = desk
        .services
        .loans
        .borrow(&member.matricule, PETIT_PRINCE, Some("00002"))
        .unwrap();
    assert_eq!(loan.barcode, "00002");
    assert!(matches!(
        desk.services.loans.borrow(&member.matricule, PETIT_PRINCE, Some("00002")),
        Err(AppError::CopyUnavailable(_))
    ));

    // A suspension is reported before the book lookup
    desk.advance_days(20);
    desk.services.loans.return_loan(&loan.id).unwrap();
    assert!(matches!(
        desk.services.loans.borrow(&member.matricule, DUNE, None),
        Err(AppError::MemberSuspended { .. })
    ));
}

#[test]
fn test_specimens_set_aside_are_not_lent() {
    let desk = Desk::new();
    let member = desk.member("Alice", MemberCategory::Student);
    desk.book(FOUNDATION, "Foundation", &["00001", "00002"]);

    desk.services
        .catalog
        .mark_specimen(FOUNDATION, "00001", SpecimenStatus::Damaged)
        .unwrap();
    let loan = desk.services.loans.borrow(&member.matricule, FOUNDATION, None).unwrap();
    assert_eq!(loan.barcode, "00002");
    assert!(matches!(
        desk.services
            .catalog
            .mark_specimen(FOUNDATION, "00002", SpecimenStatus::Lost),
        Err(AppError::CopyUnavailable(_))
    ));
}

#[test]
fn test_renew_at_most_twice() {
    let desk = Desk::new();
    let member = desk.member("Alice", MemberCategory::Student);
    desk.book(PETIT_PRINCE, "Le Petit Prince", &["00001"]);
    let loan = desk.services.loans.borrow(&member.matricule, PETIT_PRINCE, None).unwrap();

    assert!(desk.services.loans.renew(&loan.id).unwrap());
    assert!(desk.services.loans.renew(&loan.id).unwrap());
    assert!(!desk.services.loans.renew(&loan.id).unwrap());

    let loan = desk.services.loans.get(&loan.id).unwrap();
    assert_eq!(loan.renewals, 2);
    assert_eq!(loan.due_at, common::start() + Duration::days(28));

    assert!(matches!(
        desk.services.loans.renew("EMP-MISSING0"),
        Err(AppError::LoanNotFound(_))
    ));
}

#[test]
fn test_out_of_range_duration_changes_nothing() {
    let desk = Desk::new();
    let member = desk.member("Alice", MemberCategory::Student);
    desk.book(PETIT_PRINCE, "Le Petit Prince", &["00001"]);

    for days in [0, -3, 200_000_000, i64::MAX] {
        assert!(matches!(
            desk.services.loans.borrow_for(&member.matricule, PETIT_PRINCE, None, days),
            Err(AppError::Validation(_))
        ));
    }
    let book = desk.services.catalog.get_book(PETIT_PRINCE).unwrap();
    assert_eq!(book.status(), BookStatus::Available);
    assert_eq!(book.specimen("00001").unwrap().status, SpecimenStatus::Available);
    assert_eq!(book.borrow_count, 0);
    assert!(desk.services.loans.list_all().is_empty());
    assert_eq!(desk.services.members.get(&member.matricule).unwrap().loan_count(), 0);

    let loan = desk.services.loans.borrow(&member.matricule, PETIT_PRINCE, None).unwrap();
    assert!(matches!(
        desk.services.loans.renew_for(&loan.id, i64::MAX),
        Err(AppError::Validation(_))
    ));
    let unchanged = desk.services.loans.get(&loan.id).unwrap();
    assert_eq!(unchanged.due_at, loan.due_at);
    assert_eq!(unchanged.renewals, 0);
}

#[test]
fn test_cannot_renew_overdue_or_returned() {
    let desk = Desk::new();
    let member = desk.member("Alice", MemberCategory::Teacher);
    desk.book(PETIT_PRINCE, "Le Petit Prince", &["00001", "00002"]);
    let first = desk.services.loans.borrow(&member.matricule, PETIT_PRINCE, None).unwrap();
    let second = desk.services.loans.borrow(&member.matricule, PETIT_PRINCE, None).unwrap();

    desk.services.loans.return_loan(&second.id).unwrap();
    assert!(!desk.services.loans.renew(&second.id).unwrap());

    desk.advance_days(15);
    assert!(!desk.services.loans.renew(&first.id).unwrap());
    assert_eq!(desk.services.loans.get(&first.id).unwrap().renewals, 0);
    assert_eq!(desk.services.loans.list_overdue().len(), 1);
}

#[test]
fn test_second_return_changes_nothing() {
    let desk = Desk::new();
    let member = desk.member("Alice", MemberCategory::Student);
    desk.book(PETIT_PRINCE, "Le Petit Prince", &["00001"]);
    let loan = desk.services.loans.borrow(&member.matricule, PETIT_PRINCE, None).unwrap();

    let first = desk.services.loans.return_loan(&loan.id).unwrap();
    desk.advance_days(30);
    let second = desk.services.loans.return_loan(&loan.id).unwrap();
    assert_eq!(first, second);
    assert!(desk.services.loans.suspension_of(&member.matricule).is_none());
    assert_eq!(desk.services.members.get(&member.matricule).unwrap().history().len(), 2);
}

#[test]
fn test_apply_penalties_suspends_holders_of_overdue_loans() {
    let desk = Desk::new();
    let late = desk.member("Alice", MemberCategory::Student);
    let punctual = desk.member("Bob", MemberCategory::Student);
    desk.book(PETIT_PRINCE, "Le Petit Prince", &["00001"]);
    desk.book(DUNE, "Dune", &["00002"]);

    desk.services.loans.borrow(&late.matricule, PETIT_PRINCE, None).unwrap();
    desk.advance_days(10);
    desk.services.loans.borrow(&punctual.matricule, DUNE, None).unwrap();
    desk.advance_days(7);

    assert_eq!(desk.services.loans.apply_penalties().unwrap(), 1);
    let now = common::start() + Duration::days(17);
    assert_eq!(
        desk.services.loans.list_suspensions(),
        vec![(late.matricule.clone(), now + Duration::days(9))]
    );
    assert!(desk.services.loans.suspension_of(&punctual.matricule).is_none());
}

#[test]
fn test_member_with_loans_cannot_be_removed_or_downgraded() {
    let desk = Desk::new();
    let member = desk.member("Alice", MemberCategory::Teacher);
    desk.book(PETIT_PRINCE, "Le Petit Prince", &["00001", "00002", "00003", "00004"]);
    for _ in 0..4 {
        desk.services.loans.borrow(&member.matricule, PETIT_PRINCE, None).unwrap();
    }

    assert!(matches!(
        desk.services.members.remove(&member.matricule),
        Err(AppError::Validation(_))
    ));
    assert!(matches!(
        desk.services
            .members
            .change_category(&member.matricule, MemberCategory::Student),
        Err(AppError::Validation(_))
    ));
    let member = desk
        .services
        .members
        .change_category(&member.matricule, MemberCategory::AdminStaff)
        .unwrap();
    assert_eq!(member.loan_limit(), 5);
}
