//! Reservation queue lifecycle and its hand-off to circulation

use crate::common::{Desk, DUNE, PETIT_PRINCE};
use elidune_desk::{
    models::{BookStatus, MemberCategory, NewSpecimen, ReservationStatus, SpecimenStatus},
    services::reservations::ReservationsService,
    AppError,
};
use std::sync::Arc;

#[test]
fn test_cannot_reserve_an_available_book() {
    let desk = Desk::new();
    let member = desk.member("Alice", MemberCategory::Student);
    desk.book(PETIT_PRINCE, "Le Petit Prince", &["00001"]);

    assert!(matches!(
        desk.services.reservations.reserve(&member.matricule, PETIT_PRINCE),
        Err(AppError::BookAlreadyAvailable(_))
    ));
    assert!(matches!(
        desk.services.reservations.reserve("U-NOBODY00", PETIT_PRINCE),
        Err(AppError::MemberNotFound(_))
    ));
    assert!(matches!(
        desk.services.reservations.reserve(&member.matricule, DUNE),
        Err(AppError::BookNotFound(_))
    ));
}

#[test]
fn test_process_queue_with_nobody_pending() {
    let desk = Desk::new();
    desk.book(PETIT_PRINCE, "Le Petit Prince", &["00001"]);
    assert_eq!(desk.services.reservations.process_queue(PETIT_PRINCE), None);
    assert_eq!(desk.services.reservations.process_queue(DUNE), None);
    assert!(desk.services.reservations.notifications().unwrap().is_empty());
}

#[test]
fn test_return_notifies_earliest_and_confirm_creates_loan() {
    let desk = Desk::new();
    let holder = desk.member("Alice", MemberCategory::Student);
    let first = desk.member("Bob", MemberCategory::Student);
    let second = desk.member("Carol", MemberCategory::Student);
    desk.book(PETIT_PRINCE, "Le Petit Prince", &["00001"]);

    let loan = desk.services.loans.borrow(&holder.matricule, PETIT_PRINCE, None).unwrap();
    let bob = desk.services.reservations.reserve(&first.matricule, PETIT_PRINCE).unwrap();
    assert!(matches!(
        desk.services.reservations.reserve(&first.matricule, PETIT_PRINCE),
        Err(AppError::DuplicateReservation { .. })
    ));
    desk.advance_days(1);
    let carol = desk.services.reservations.reserve(&second.matricule, PETIT_PRINCE).unwrap();
    assert_eq!(desk.services.reservations.list_queue_for(PETIT_PRINCE).len(), 2);

    desk.advance_days(2);
    desk.services.loans.return_loan(&loan.id).unwrap();

    assert_eq!(
        desk.services.reservations.get(&bob.id).unwrap().status(),
        ReservationStatus::Notified
    );
    assert_eq!(
        desk.services.reservations.get(&carol.id).unwrap().status(),
        ReservationStatus::Pending
    );
    let notifications = desk.services.reservations.notifications().unwrap();
    assert_eq!(notifications.len(), 1);
    assert!(notifications[0].contains(&first.matricule));
    assert!(notifications[0].contains(&bob.id));

    assert!(desk.services.reservations.confirm(&bob.id));
    assert_eq!(
        desk.services.reservations.get(&bob.id).unwrap().status(),
        ReservationStatus::Confirmed
    );
    let loans = desk.services.loans.list_active_by_member(&first.matricule);
    assert_eq!(loans.len(), 1);
    assert_eq!(loans[0].barcode, "00001");
    assert_eq!(
        desk.services.catalog.get_book(PETIT_PRINCE).unwrap().status(),
        BookStatus::OnLoan
    );

    // Only Carol is left waiting, and a Confirmed reservation stays put
    let queue = desk.services.reservations.list_queue_for(PETIT_PRINCE);
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].id, carol.id);
    assert!(!desk.services.reservations.confirm(&bob.id));
    assert!(matches!(
        desk.services.reservations.cancel(&bob.id),
        Err(AppError::InvalidTransition { .. })
    ));
}

#[test]
fn test_confirm_refused_for_suspended_member_keeps_notified() {
    let desk = Desk::new();
    let holder = desk.member("Alice", MemberCategory::Student);
    let waiting = desk.member("Bob", MemberCategory::Student);
    desk.book(PETIT_PRINCE, "Le Petit Prince", &["00001"]);
    desk.book(DUNE, "Dune", &["00002"]);

    let held = desk.services.loans.borrow(&holder.matricule, PETIT_PRINCE, None).unwrap();
    let late = desk.services.loans.borrow(&waiting.matricule, DUNE, None).unwrap();
    let reservation = desk.services.reservations.reserve(&waiting.matricule, PETIT_PRINCE).unwrap();

    desk.advance_days(16);
    desk.services.loans.return_loan(&late.id).unwrap();
    assert!(desk.services.loans.suspension_of(&waiting.matricule).is_some());

    desk.services.loans.return_loan(&held.id).unwrap();
    assert_eq!(
        desk.services.reservations.get(&reservation.id).unwrap().status(),
        ReservationStatus::Notified
    );

    assert!(!desk.services.reservations.confirm(&reservation.id));
    assert_eq!(
        desk.services.reservations.get(&reservation.id).unwrap().status(),
        ReservationStatus::Notified
    );
    assert!(desk.services.loans.list_active_by_member(&waiting.matricule).is_empty());
    assert_eq!(
        desk.services.catalog.get_book(PETIT_PRINCE).unwrap().status(),
        BookStatus::Available
    );
}

#[test]
fn test_cancel() {
    let desk = Desk::new();
    let holder = desk.member("Alice", MemberCategory::Student);
    let first = desk.member("Bob", MemberCategory::Student);
    let second = desk.member("Carol", MemberCategory::Student);
    desk.book(PETIT_PRINCE, "Le Petit Prince", &["00001"]);

    let loan = desk.services.loans.borrow(&holder.matricule, PETIT_PRINCE, None).unwrap();
    let bob = desk.services.reservations.reserve(&first.matricule, PETIT_PRINCE).unwrap();
    let carol = desk.services.reservations.reserve(&second.matricule, PETIT_PRINCE).unwrap();

    assert!(desk.services.reservations.cancel(&bob.id).unwrap());
    assert!(desk.services.reservations.cancel(&bob.id).unwrap());
    assert!(!desk.services.reservations.cancel("RES-MISSING0").unwrap());
    assert_eq!(
        desk.services.reservations.get(&bob.id).unwrap().status(),
        ReservationStatus::Cancelled
    );

    // Bob may queue again, behind Carol
    let again = desk.services.reservations.reserve(&first.matricule, PETIT_PRINCE).unwrap();
    assert_eq!(desk.services.reservations.list_all().len(), 3);
    assert_eq!(desk.services.reservations.list_by_member(&first.matricule).len(), 2);

    // The cancelled head is skipped
    desk.services.loans.return_loan(&loan.id).unwrap();
    assert_eq!(
        desk.services.reservations.get(&carol.id).unwrap().status(),
        ReservationStatus::Notified
    );
    assert_eq!(
        desk.services.reservations.get(&again.id).unwrap().status(),
        ReservationStatus::Pending
    );
}

#[test]
fn test_new_specimen_notifies_the_queue() {
    let desk = Desk::new();
    let member = desk.member("Alice", MemberCategory::Student);
    desk.book(DUNE, "Dune", &[]);
    assert_eq!(desk.services.catalog.get_book(DUNE).unwrap().status(), BookStatus::Unavailable);

    let reservation = desk.services.reservations.reserve(&member.matricule, DUNE).unwrap();
    desk.services
        .catalog
        .add_specimen(DUNE, NewSpecimen::with_barcode("00009"))
        .unwrap();
    assert_eq!(
        desk.services.reservations.get(&reservation.id).unwrap().status(),
        ReservationStatus::Notified
    );
}

#[test]
fn test_specimen_back_on_shelf_notifies_the_queue() {
    let desk = Desk::new();
    let member = desk.member("Alice", MemberCategory::Student);
    desk.book(DUNE, "Dune", &["00009"]);
    desk.services
        .catalog
        .mark_specimen(DUNE, "00009", SpecimenStatus::Damaged)
        .unwrap();

    let reservation = desk.services.reservations.reserve(&member.matricule, DUNE).unwrap();
    desk.services
        .catalog
        .mark_specimen(DUNE, "00009", SpecimenStatus::Available)
        .unwrap();
    assert_eq!(
        desk.services.reservations.get(&reservation.id).unwrap().status(),
        ReservationStatus::Notified
    );
}

#[test]
fn test_confirm_without_circulation_only_changes_status() {
    let desk = Desk::new();
    let member = desk.member("Alice", MemberCategory::Student);
    desk.book(DUNE, "Dune", &[]);
    let reservation = desk.services.reservations.reserve(&member.matricule, DUNE).unwrap();
    desk.services
        .catalog
        .add_specimen(DUNE, NewSpecimen::with_barcode("00009"))
        .unwrap();

    let standalone = ReservationsService::new(
        desk.services.repository().clone(),
        Arc::new(desk.clock.clone()),
    );
    assert!(!standalone.has_circulation());
    assert!(standalone.confirm(&reservation.id));
    assert_eq!(
        standalone.get(&reservation.id).unwrap().status(),
        ReservationStatus::Confirmed
    );
    assert!(desk.services.loans.list_all().is_empty());
}
