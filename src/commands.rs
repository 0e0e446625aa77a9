use crate::api_client::{ApiClient, BusinessFilters};
use crate::availability;
use crate::backend::{ReservationSink, ScheduleSource};
use crate::clock::Clock;
use crate::session::SessionPersistence;
use crate::types::{
    CancelReservationPayload, CreateReservationPayload, Reservation, SignInPayload, SignUpPayload,
    UpdateBusinessHoursPayload, UpsertBusinessPayload, UserRole, VerifyCodePayload,
};
use chrono::{Duration, NaiveTime};
use clap::Subcommand;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Sign in and store the session
    Signin {
        email: String,
        password: String,
        /// Sign in as a business owner
        #[arg(long)]
        owner: bool,
    },
    /// Start the two-step sign-in; the server mails a verification code
    SigninCode {
        email: String,
        password: String,
        #[arg(long)]
        owner: bool,
    },
    /// Exchange a mailed verification code for a session
    Verify { user_id: Uuid, code: u32 },
    /// Register a new account
    Signup {
        name: String,
        email: String,
        password: String,
        phone: String,
        #[arg(long)]
        owner: bool,
    },
    /// Drop the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List businesses
    Businesses {
        #[arg(long)]
        category: Option<Uuid>,
        /// Only businesses owned by the signed-in user
        #[arg(long)]
        owner: bool,
    },
    /// Show one business with its weekly hours
    Business { id: Uuid },
    /// Create a business listing
    CreateBusiness {
        name: String,
        category: Uuid,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        email: String,
    },
    /// Update a business listing
    UpdateBusiness {
        id: Uuid,
        name: String,
        category: Uuid,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        email: String,
    },
    /// Delete a business listing
    DeleteBusiness { id: Uuid },
    /// Update one weekly-hours row
    SetHours {
        hour_id: Uuid,
        #[arg(long)]
        open: Option<String>,
        #[arg(long)]
        close: Option<String>,
        #[arg(long)]
        closed: bool,
    },
    /// List business categories
    Categories,
    /// List bookable start times for a date, or end times for a chosen start
    Availability {
        business: Uuid,
        /// Calendar day, YYYY-MM-DD
        date: String,
        /// Chosen start time (HH:MM); lists matching end times instead
        #[arg(long)]
        start: Option<String>,
    },
    /// Validate a reservation window and submit it
    Reserve {
        business: Uuid,
        date: String,
        start: String,
        end: String,
        #[arg(long, default_value_t = 1)]
        people: u32,
    },
    /// List reservations visible to the signed-in user
    Reservations,
    /// Confirm a pending reservation (owner)
    Confirm { id: Uuid },
    /// Mark a reservation completed (owner)
    Complete { id: Uuid },
    /// Cancel a reservation with a reason
    Cancel { id: Uuid, reason: String },
    /// List favorited businesses
    Favorites,
    /// Favorite a business
    Like { business: Uuid },
    /// Remove a business from favorites
    Dislike { business: Uuid },
}

/// Slot listing for one calendar day: either the day is closed outright or
/// there is a (possibly empty) set of aligned times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Closed,
    Slots(Vec<NaiveTime>),
}

/// Fetches the weekly hours and lists start times for `date`, or end times
/// once `chosen_start` is given.
pub async fn resolve_availability<S: ScheduleSource>(
    schedule: &S,
    business_id: Uuid,
    date: &str,
    chosen_start: Option<&str>,
    interval: Duration,
) -> Result<Availability, String> {
    let day = availability::day_index_for_date(date)
        .ok_or_else(|| "Invalid date, expected YYYY-MM-DD".to_string())?;
    let hours = schedule.business_hours(business_id).await?;
    let entry = hours.iter().find(|entry| entry.day_of_week == day);

    if availability::is_day_closed(entry) {
        return Ok(Availability::Closed);
    }
    let slots = match chosen_start {
        None => availability::list_start_times(entry, interval),
        Some(start) => {
            let start = NaiveTime::parse_from_str(start, "%H:%M")
                .map_err(|_| "Invalid start time, expected HH:MM".to_string())?;
            availability::list_end_times(entry, Some(start), interval)
        }
    };
    Ok(Availability::Slots(slots))
}

/// Validates the requested window against the day's schedule and the clock,
/// then hands the payload to the sink. The sink is never called for a
/// window the resolver rejects.
pub async fn submit_reservation<S, R, C>(
    schedule: &S,
    sink: &R,
    clock: &C,
    business_id: Uuid,
    date: &str,
    start: &str,
    end: &str,
    people: u32,
    interval: Duration,
) -> Result<Reservation, String>
where
    S: ScheduleSource,
    R: ReservationSink,
    C: Clock,
{
    let day = availability::day_index_for_date(date)
        .ok_or_else(|| "Invalid date, expected YYYY-MM-DD".to_string())?;
    let hours = schedule.business_hours(business_id).await?;
    let entry = hours.iter().find(|entry| entry.day_of_week == day);

    let window = availability::validate_reservation_window(
        entry,
        date,
        start,
        end,
        people,
        clock.now(),
        interval,
    )
    .map_err(|err| err.to_string())?;

    let payload = CreateReservationPayload {
        business_id,
        start_time: window.start,
        end_time: window.end,
        number_of_people: window.number_of_people,
    };
    payload.validate().map_err(|err| err.to_string())?;
    sink.create_reservation(payload).await
}

fn role_for(owner: bool) -> UserRole {
    if owner {
        UserRole::BusinessOwner
    } else {
        UserRole::Customer
    }
}

pub async fn run<P, C>(
    command: Command,
    client: &ApiClient<P>,
    clock: &C,
    interval: Duration,
) -> Result<(), String>
where
    P: SessionPersistence,
    C: Clock,
{
    match command {
        Command::Signin {
            email,
            password,
            owner,
        } => {
            let payload = SignInPayload {
                email,
                password,
                role: owner.then(|| role_for(owner)),
            };
            payload.validate().map_err(|err| err.to_string())?;
            let session = client.signin(&payload).await?;
            println!("Signed in as {} ({})", session.user.name, session.user.email);
        }
        Command::SigninCode {
            email,
            password,
            owner,
        } => {
            let payload = SignInPayload {
                email,
                password,
                role: owner.then(|| role_for(owner)),
            };
            payload.validate().map_err(|err| err.to_string())?;
            let response = client.signin_with_code(&payload).await?;
            println!(
                "Verification code sent to {}. Complete with: reserva verify {} <code>",
                response.user.email, response.user.id
            );
        }
        Command::Verify { user_id, code } => {
            let response = client.verify_code(&VerifyCodePayload { user_id, code }).await?;
            println!("{}", response.message);
            println!("Signed in as {} ({})", response.user.name, response.user.email);
        }
        Command::Signup {
            name,
            email,
            password,
            phone,
            owner,
        } => {
            let payload = SignUpPayload {
                name,
                email,
                password,
                phone,
                role: role_for(owner),
            };
            payload.validate().map_err(|err| err.to_string())?;
            let user = client.signup(&payload).await?;
            println!("Account created for {}. Sign in to continue.", user.email);
        }
        Command::Logout => {
            client.session().clear();
            println!("Signed out");
        }
        Command::Whoami => match client.session().user() {
            Some(user) => println!("{} ({}) {:?}", user.name, user.email, user.role),
            None => println!("Not signed in"),
        },
        Command::Businesses { category, owner } => {
            let businesses = client
                .businesses(BusinessFilters {
                    category_id: category,
                    owner,
                })
                .await?;
            for business in businesses {
                let category = business
                    .business_categories
                    .map(|c| c.category)
                    .unwrap_or_default();
                println!(
                    "{}  {}  {}  {}",
                    business.id, business.name, category, business.address
                );
            }
        }
        Command::Business { id } => {
            let detail = client.business_by_id(id).await?;
            println!("{} ({})", detail.summary.name, detail.summary.id);
            println!("{}", detail.summary.description);
            println!("{} | {}", detail.summary.address, detail.summary.phone);
            for entry in &detail.business_hours {
                if entry.is_closed {
                    println!("  day {}: closed", entry.day_of_week);
                } else {
                    println!(
                        "  day {}: {} - {}",
                        entry.day_of_week,
                        entry.open_time.as_deref().unwrap_or("?"),
                        entry.close_time.as_deref().unwrap_or("?")
                    );
                }
            }
        }
        Command::CreateBusiness {
            name,
            category,
            description,
            address,
            phone,
            email,
        } => {
            let payload = UpsertBusinessPayload {
                name,
                description,
                address,
                phone,
                email,
                category_id: category,
            };
            payload.validate().map_err(|err| err.to_string())?;
            let business = client.create_business(&payload).await?;
            println!("Created business {}", business.id);
        }
        Command::UpdateBusiness {
            id,
            name,
            category,
            description,
            address,
            phone,
            email,
        } => {
            let payload = UpsertBusinessPayload {
                name,
                description,
                address,
                phone,
                email,
                category_id: category,
            };
            payload.validate().map_err(|err| err.to_string())?;
            client.update_business(id, &payload).await?;
            println!("Updated business {id}");
        }
        Command::DeleteBusiness { id } => {
            client.delete_business(id).await?;
            println!("Deleted business {id}");
        }
        Command::SetHours {
            hour_id,
            open,
            close,
            closed,
        } => {
            let payload = UpdateBusinessHoursPayload {
                open_time: open,
                close_time: close,
                is_closed: closed,
            };
            payload.validate().map_err(|err| err.to_string())?;
            let entry = client.update_business_hours(hour_id, &payload).await?;
            if entry.is_closed {
                println!("Day {} is now closed", entry.day_of_week);
            } else {
                println!(
                    "Day {} now open {} - {}",
                    entry.day_of_week,
                    entry.open_time.as_deref().unwrap_or("?"),
                    entry.close_time.as_deref().unwrap_or("?")
                );
            }
        }
        Command::Categories => {
            for category in client.business_categories().await? {
                println!("{}  {}", category.id, category.category);
            }
        }
        Command::Availability {
            business,
            date,
            start,
        } => {
            let listing =
                resolve_availability(client, business, &date, start.as_deref(), interval).await?;
            match listing {
                Availability::Closed => println!("Closed on {date}"),
                Availability::Slots(slots) if slots.is_empty() => {
                    println!("No slots available")
                }
                Availability::Slots(slots) => {
                    for slot in slots {
                        println!("{}", slot.format("%H:%M"));
                    }
                }
            }
        }
        Command::Reserve {
            business,
            date,
            start,
            end,
            people,
        } => {
            let reservation = submit_reservation(
                client, client, clock, business, &date, &start, &end, people, interval,
            )
            .await?;
            println!(
                "Reservation {} created: {} - {} for {}",
                reservation.id,
                reservation.start_time,
                reservation.end_time,
                reservation.number_of_people
            );
        }
        Command::Reservations => {
            for reservation in client.reservations().await? {
                println!(
                    "{}  {} - {}  {} people  {:?}",
                    reservation.id,
                    reservation.start_time,
                    reservation.end_time,
                    reservation.number_of_people,
                    reservation.status
                );
            }
        }
        Command::Confirm { id } => {
            println!("{}", client.confirm_reservation(id).await?.message);
        }
        Command::Complete { id } => {
            println!("{}", client.complete_reservation(id).await?.message);
        }
        Command::Cancel { id, reason } => {
            let payload = CancelReservationPayload { reason };
            payload.validate().map_err(|err| err.to_string())?;
            println!("{}", client.cancel_reservation(id, &payload).await?.message);
        }
        Command::Favorites => {
            for business in client.liked_businesses().await? {
                println!("{}  {}", business.id, business.name);
            }
        }
        Command::Like { business } => {
            println!("{}", client.like_business(business).await?.message);
        }
        Command::Dislike { business } => {
            println!("{}", client.dislike_business(business).await?.message);
        }
    }
    Ok(())
}
