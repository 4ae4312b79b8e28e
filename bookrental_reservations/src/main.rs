use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;

use bookrental_inventory::api::{Book, BookId};
use bookrental_reservations::api::{
    ReservationId, ReservationRequest, ReservationStatus, ReturnBookRequest, UserDetails, UserId,
};
use bookrental_reservations::backend::RentalBackend;
use bookrental_reservations::clock::{Clock, SystemClock};
use bookrental_reservations::reservation_service::ReservationService;
use bookrental_reservations::settings::Settings;
use bookrental_reservations::telemetry::init_telemetry;

#[derive(Parser)]
#[command(name = "bookrental")]
#[command(about = "Book rentals with stock tracking and late fees")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Settings file, bookrental.toml in the working directory is used when present
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a user
    AddUser {
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        email: String,
    },
    /// Add a book to the inventory or replace the stored one
    AddBook {
        /// External id of the book
        id: BookId,
        #[arg(short, long)]
        title: String,
        /// Copies owned by the library
        #[arg(long)]
        total: i32,
        /// Copies on the shelf, all of them when not given
        #[arg(long)]
        available: Option<i32>,
        #[arg(long)]
        daily_rate: Decimal,
    },
    /// List books in the inventory
    Books,
    /// Reserve a copy of a book for a user
    Reserve {
        #[arg(short, long)]
        user: UserId,
        #[arg(short, long)]
        book: BookId,
        #[arg(short, long)]
        days: i32,
        /// First day of the rental, today when not given
        #[arg(short, long)]
        start: Option<NaiveDate>,
    },
    /// Return the book of a reservation
    Return {
        /// Reservation id
        id: ReservationId,
        /// Day the book came back, today when not given
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
    /// Show a single reservation
    Show {
        /// Reservation id
        id: ReservationId,
    },
    /// List reservations, optionally filtered by user, status, book or start date range
    List {
        #[arg(long, conflicts_with_all = ["status", "book", "from"])]
        user: Option<UserId>,
        /// Only ACTIVE reservations of the user
        #[arg(long, requires = "user")]
        active: bool,
        #[arg(long, conflicts_with_all = ["book", "from"])]
        status: Option<ReservationStatus>,
        #[arg(long, conflicts_with = "from")]
        book: Option<BookId>,
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
    },
    /// List ACTIVE reservations past their expected return date
    Overdue {
        /// Reference day, today when not given
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
    /// Count ACTIVE reservations of a book
    CountActive {
        book: BookId,
    },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}

async fn run(
    command: Commands,
    backend: &RentalBackend,
    service: &ReservationService,
) -> anyhow::Result<()> {
    let today = SystemClock.today();

    match command {
        Commands::AddUser { name, email } => {
            let user_id = backend
                .users_repository
                .add_user(UserDetails { name, email })
                .await?;
            print_json(&user_id)
        }
        Commands::AddBook {
            id,
            title,
            total,
            available,
            daily_rate,
        } => {
            let book = Book {
                external_id: id,
                title,
                total_quantity: total,
                available_quantity: available.unwrap_or(total),
                daily_rate,
            };
            backend.inventory_ledger.save_book(book.clone()).await?;
            print_json(&book)
        }
        Commands::Books => print_json(&backend.inventory_ledger.list_books().await?),
        Commands::Reserve {
            user,
            book,
            days,
            start,
        } => {
            let reservation = service
                .create_reservation(ReservationRequest {
                    user_id: user,
                    book_id: book,
                    rental_days: days,
                    start_date: start.unwrap_or(today),
                })
                .await?;
            print_json(&reservation)
        }
        Commands::Return { id, date } => {
            let reservation = service
                .return_book(
                    id,
                    ReturnBookRequest {
                        return_date: date.unwrap_or(today),
                    },
                )
                .await?;
            print_json(&reservation)
        }
        Commands::Show { id } => print_json(&service.get_reservation(id).await?),
        Commands::List {
            user,
            active,
            status,
            book,
            from,
            to,
        } => {
            let reservations = match (user, status, book, from.zip(to)) {
                (Some(user_id), _, _, _) if active => {
                    service.get_active_reservations_by_user(user_id).await?
                }
                (Some(user_id), _, _, _) => service.get_reservations_by_user(user_id).await?,
                (_, Some(status), _, _) => service.get_reservations_by_status(status).await?,
                (_, _, Some(book_id), _) => service.get_reservations_by_book(book_id).await?,
                (_, _, _, Some((start, end))) => {
                    service.get_reservations_by_date_range(start, end).await?
                }
                _ => service.get_all_reservations().await?,
            };
            print_json(&reservations)
        }
        Commands::Overdue { as_of } => {
            let reservations = match as_of {
                Some(date) => service.get_overdue_reservations_as_of(date).await?,
                None => service.get_overdue_reservations().await?,
            };
            print_json(&reservations)
        }
        Commands::CountActive { book } => print_json(&service.count_active_by_book(book).await?),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;
    init_telemetry("bookrental", &settings.log_filter)?;

    let backend = RentalBackend::from_settings(&settings).await?;
    let service = backend.reservation_service();
    run(cli.command, &backend, &service).await
}
