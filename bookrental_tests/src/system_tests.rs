use chrono::{Days, NaiveDate};
use rust_decimal_macros::dec;
use serial_test::file_serial;
use testcontainers::core::IntoContainerPort;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage, ImageExt};

use bookrental_inventory::api::Book;
use bookrental_reservations::api::{
    ReservationRequest, ReservationStatus, ReturnBookRequest, UserDetails,
};
use bookrental_reservations::backend::RentalBackend;
use bookrental_reservations::error::ReservationError;
use bookrental_reservations::settings::{Settings, StorageKind};

const BOOK_ID: i32 = 258027;

async fn available_copies(backend: &RentalBackend) -> i32 {
    backend
        .inventory_ledger
        .find_by_external_id(BOOK_ID)
        .await
        .expect("Failed to get book")
        .expect("Book not found")
        .available_quantity
}

/// Full rental lifecycle against one backend
/// Adds a user and a book with a single copy on the shelf
/// Reserves the copy, second reservation is rejected
/// Lists the reservation as overdue once its expected date passed
/// Returns it three days late
/// Tries to return it again
/// Reserves again and returns two days early
async fn rental_lifecycle(backend: RentalBackend) {
    let service = backend.reservation_service();
    let start_date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

    let user_id = backend
        .users_repository
        .add_user(UserDetails {
            name: "Juan Pérez".to_string(),
            email: "juan@example.com".to_string(),
        })
        .await
        .expect("Failed to add user");

    backend
        .inventory_ledger
        .save_book(Book {
            external_id: BOOK_ID,
            title: "The Lord of the Rings".to_string(),
            total_quantity: 2,
            available_quantity: 1,
            daily_rate: dec!(15.99),
        })
        .await
        .expect("Failed to add book");

    let request = ReservationRequest {
        user_id,
        book_id: BOOK_ID,
        rental_days: 7,
        start_date,
    };

    // RESERVE
    let reservation = service
        .create_reservation(request.clone())
        .await
        .expect("Failed to reserve");
    assert_eq!(reservation.total_fee, dec!(111.93));
    assert_eq!(reservation.status, ReservationStatus::Active);
    assert_eq!(available_copies(&backend).await, 0);

    // RESERVE WITHOUT COPIES
    assert!(matches!(
        service.create_reservation(request.clone()).await,
        Err(ReservationError::NoCopiesAvailable(BOOK_ID))
    ));
    assert_eq!(
        service.get_all_reservations().await.unwrap(),
        vec![reservation.clone()]
    );

    // OVERDUE QUERY
    let overdue = service
        .get_overdue_reservations_as_of(start_date + Days::new(10))
        .await
        .expect("Failed to list overdue");
    assert_eq!(overdue, vec![reservation.clone()]);
    assert_eq!(overdue[0].status, ReservationStatus::Active);

    // LATE RETURN
    let returned = service
        .return_book(
            reservation.id,
            ReturnBookRequest {
                return_date: reservation.expected_return_date + Days::new(3),
            },
        )
        .await
        .expect("Failed to return");
    assert_eq!(returned.status, ReservationStatus::Overdue);
    assert_eq!(returned.late_fee, dec!(7.20));
    assert_eq!(available_copies(&backend).await, 1);

    // SECOND RETURN
    assert!(matches!(
        service
            .return_book(
                reservation.id,
                ReturnBookRequest {
                    return_date: reservation.expected_return_date,
                },
            )
            .await,
        Err(ReservationError::AlreadyReturned(..))
    ));
    assert_eq!(available_copies(&backend).await, 1);
    assert_eq!(service.get_reservation(reservation.id).await.unwrap(), returned);

    // EARLY RETURN
    let second = service
        .create_reservation(request)
        .await
        .expect("Failed to reserve");
    let returned_early = service
        .return_book(
            second.id,
            ReturnBookRequest {
                return_date: second.expected_return_date - Days::new(2),
            },
        )
        .await
        .expect("Failed to return");
    assert_eq!(returned_early.status, ReservationStatus::Returned);
    assert_eq!(returned_early.late_fee, dec!(0.00));
    assert_eq!(available_copies(&backend).await, 1);

    assert_eq!(
        service.get_reservations_by_user(user_id).await.unwrap(),
        vec![returned, returned_early]
    );
    assert_eq!(service.count_active_by_book(BOOK_ID).await.unwrap(), 0);
}

#[tokio::test]
async fn rental_lifecycle_in_memory() {
    rental_lifecycle(RentalBackend::in_memory()).await;
}

async fn start_postgres_container_and_init_backend() -> (ContainerAsync<GenericImage>, RentalBackend)
{
    let _pg_container = GenericImage::new("postgres", "latest")
        .with_mapped_port(5432, 5432.tcp())
        .with_env_var("POSTGRES_USER", "postgres")
        .with_env_var("POSTGRES_PASSWORD", "postgres")
        .start()
        .await
        .expect("Failed to start postgres");

    let settings = Settings {
        storage: StorageKind::Postgres,
        db_host: "127.0.0.1".to_string(),
        db_username: "postgres".to_string(),
        db_password: "postgres".to_string(),
        log_filter: "info".to_string(),
    };

    for _ in 0..10 {
        if let Ok(backend) = RentalBackend::from_settings(&settings).await {
            return (_pg_container, backend);
        }
        tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    }
    panic!("Failed to setup postgres container")
}

#[tokio::test]
#[file_serial(key, path => "../.pgtestslock")]
async fn rental_lifecycle_postgres() {
    let (_container, backend) = start_postgres_container_and_init_backend().await;
    rental_lifecycle(backend).await;
}
