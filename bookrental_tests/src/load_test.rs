use chrono::{Days, NaiveDate};
use rand::prelude::SliceRandom;
use rand::{thread_rng, Rng};
use rust_decimal::Decimal;

use bookrental_inventory::api::{Book, BookId};
use bookrental_reservations::api::{
    ReservationRequest, ReservationStatus, ReturnBookRequest, UserDetails, UserId,
};
use bookrental_reservations::backend::RentalBackend;
use bookrental_reservations::error::ReservationError;

const NO_OF_BOOKS_TO_GENERATE: usize = 10;
const NO_OF_USERS_TO_GENERATE: usize = 20;
const NO_OF_WORKERS: usize = 16;
const NO_OF_OPERATIONS_PER_WORKER: usize = 50;

fn generate_books(rng: &mut impl Rng, count: usize) -> Vec<Book> {
    (0..count)
        .map(|i| {
            let total_quantity = rng.gen_range(1..=4);
            Book {
                external_id: 1000 + i as BookId,
                title: format!("Generated book {}", i),
                total_quantity,
                available_quantity: rng.gen_range(0..=total_quantity),
                daily_rate: Decimal::new(rng.gen_range(100..3000), 2),
            }
        })
        .collect()
}

fn generate_users(count: usize) -> Vec<UserDetails> {
    (0..count)
        .map(|i| UserDetails {
            name: format!("User {}", i),
            email: format!("user{}@example.com", i),
        })
        .collect()
}

/// Many workers reserve and return random books at the same time
/// A copy is never handed out twice: for every book the copies on the shelf
/// plus the ACTIVE reservations stay equal to what was on the shelf at the start
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_reservations_never_over_allocate() {
    let backend = RentalBackend::in_memory();
    let service = backend.reservation_service();
    let start_date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    let books = generate_books(&mut thread_rng(), NO_OF_BOOKS_TO_GENERATE);
    for book in &books {
        backend
            .inventory_ledger
            .save_book(book.clone())
            .await
            .expect("Failed to add book");
    }
    let book_ids: Vec<BookId> = books.iter().map(|book| book.external_id).collect();

    let mut user_ids: Vec<UserId> = vec![];
    for user in generate_users(NO_OF_USERS_TO_GENERATE) {
        user_ids.push(
            backend
                .users_repository
                .add_user(user)
                .await
                .expect("Failed to add user"),
        );
    }

    let mut workers = vec![];
    for _ in 0..NO_OF_WORKERS {
        let service = service.clone();
        let book_ids = book_ids.clone();
        let user_ids = user_ids.clone();
        workers.push(tokio::spawn(async move {
            let mut held = vec![];
            for _ in 0..NO_OF_OPERATIONS_PER_WORKER {
                let (book_id, user_id, rental_days, return_now) = {
                    let mut rng = thread_rng();
                    (
                        *book_ids.choose(&mut rng).unwrap(),
                        *user_ids.choose(&mut rng).unwrap(),
                        rng.gen_range(1..=14),
                        rng.gen_bool(0.4),
                    )
                };

                if return_now && !held.is_empty() {
                    let (reservation_id, return_date) = held.swap_remove(0);
                    service
                        .return_book(reservation_id, ReturnBookRequest { return_date })
                        .await
                        .expect("Failed to return book");
                    continue;
                }

                match service
                    .create_reservation(ReservationRequest {
                        user_id,
                        book_id,
                        rental_days,
                        start_date,
                    })
                    .await
                {
                    Ok(reservation) => held.push((
                        reservation.id,
                        start_date + Days::new(rental_days as u64 + 1),
                    )),
                    Err(ReservationError::NoCopiesAvailable(_))
                    | Err(ReservationError::InsufficientStock(_)) => {}
                    Err(e) => panic!("Unexpected reservation failure {:?}", e),
                }
            }
        }));
    }

    for worker in workers {
        worker.await.expect("Worker panicked");
    }

    for book in &books {
        let stored = backend
            .inventory_ledger
            .find_by_external_id(book.external_id)
            .await
            .unwrap()
            .unwrap();
        let active = service.count_active_by_book(book.external_id).await.unwrap();

        assert!(stored.available_quantity >= 0);
        assert!(stored.available_quantity <= stored.total_quantity);
        assert_eq!(
            stored.available_quantity as i64 + active,
            book.available_quantity as i64,
            "Copies of book {} leaked",
            book.external_id
        );
    }

    let all = service.get_all_reservations().await.unwrap();
    assert!(all
        .iter()
        .filter(|reservation| reservation.status == ReservationStatus::Overdue)
        .all(|reservation| reservation.late_fee > Decimal::ZERO));
}
