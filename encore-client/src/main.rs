//! # Encore CLI
//!
//! Command-line front end for the Encore marketplace. Talks to the REST API,
//! or to the local fallback store when the API cannot be reached.
//!
//! ## Usage
//!
//! ```bash
//! encore login user@example.com password
//! encore events
//! encore book <event-id> 2
//! encore dashboard
//! ```

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use encore_client::{
    backend,
    config::ClientConfig,
    gateway::ApiClient,
    session::Session,
    storage,
    workflow::Marketplace,
};
use encore_shared::models::{
    Booking, Contract, ContractDecision, ContractTerms, Event, EventDetails, MusicianProfile,
    OrganizerProfile, Profile, RegisterRequest, Role, User,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "encore")]
#[command(about = "Music event marketplace client", version)]
struct Cli {
    /// Settings file (defaults to ./encore.toml when present)
    #[arg(long, global = true, env = "ENCORE_CONFIG")]
    config: Option<String>,

    /// API base URL, overriding the settings file
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an account and sign in
    Register {
        name: String,
        email: String,
        password: String,
        #[arg(long, value_enum, default_value_t = RoleArg::User)]
        role: RoleArg,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        /// Musician genre
        #[arg(long)]
        genre: Option<String>,
        /// Musician fee per performance
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        bio: Option<String>,
        /// Organizer type (venue, agency, ...)
        #[arg(long = "organizer-type")]
        organizer_type: Option<String>,
    },
    /// Sign in
    Login { email: String, password: String },
    /// Sign out
    Logout,
    /// Show the signed-in account
    Whoami,
    /// Role-specific overview
    Dashboard,
    /// List events
    Events {
        /// Include past and completed events
        #[arg(long)]
        all: bool,
    },
    /// List musicians
    Artists,
    /// List organizers
    Organizers,
    /// Book tickets for an event
    Book { event_id: Uuid, tickets: u32 },
    /// List your bookings
    Bookings,
    /// List your contracts
    Contracts,
    /// Send a contract offer to a musician
    SendContract {
        artist_id: Uuid,
        #[arg(long)]
        event_name: String,
        #[arg(long)]
        venue: String,
        /// Event date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        time: Option<String>,
        #[arg(long)]
        payment: f64,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Accept or reject a pending contract
    Respond {
        contract_id: Uuid,
        #[arg(value_enum)]
        decision: DecisionArg,
    },
    /// Create an event from an accepted contract
    CreateEvent {
        /// Accepted contract naming the musician
        #[arg(long)]
        contract: Option<Uuid>,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        location: String,
        /// Event date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        #[arg(long, default_value = "")]
        time: String,
        #[arg(long, default_value_t = 0.0)]
        price: f64,
        #[arg(long, default_value = "")]
        category: String,
        #[arg(long)]
        tickets: u32,
    },
    /// Mark your past events completed
    CompletePast,
    /// Check whether the API is reachable
    Status,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum RoleArg {
    #[value(alias = "attendee")]
    User,
    Organizer,
    Musician,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DecisionArg {
    Accept,
    Reject,
}

impl From<DecisionArg> for ContractDecision {
    fn from(arg: DecisionArg) -> Self {
        match arg {
            DecisionArg::Accept => ContractDecision::Accept,
            DecisionArg::Reject => ContractDecision::Reject,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "encore_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config =
        ClientConfig::load_from(cli.config.as_deref()).context("Failed to load settings")?;
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }

    let store = storage::open(&config).context("Failed to open data directory")?;
    let session = Session::restore(store.clone()).context("Failed to restore session")?;

    let backend = backend::connect(&config, store, session.clone()).await?;
    let market = Marketplace::new(backend, session);
    run(&config, &market, cli.command).await
}

async fn status(config: &ClientConfig, market: &Marketplace) -> anyhow::Result<()> {
    let api = ApiClient::new(config, market.session().clone())?;
    let probe = api.test_connection().await;

    if probe.connected {
        println!("API reachable at {}", api.base_url());
    } else {
        println!(
            "API unreachable at {}: {}",
            api.base_url(),
            probe.error.unwrap_or_default()
        );
    }
    println!(
        "Using the {} backend (data directory {})",
        market.backend_kind(),
        config.data_dir.display()
    );

    match market.current_user() {
        Some(user) => println!("Signed in as {} ({})", user.email, user.role()),
        None => println!("Not signed in"),
    }
    Ok(())
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

async fn run(config: &ClientConfig, market: &Marketplace, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Register {
            name,
            email,
            password,
            role,
            location,
            phone,
            genre,
            price,
            bio,
            organizer_type,
        } => {
            let profile = match role {
                RoleArg::User => Profile::Attendee,
                RoleArg::Organizer => Profile::Organizer(OrganizerProfile {
                    kind: organizer_type,
                    location,
                    phone,
                    ..Default::default()
                }),
                RoleArg::Musician => Profile::Musician(MusicianProfile {
                    genre,
                    location,
                    phone,
                    bio,
                    price,
                    ..Default::default()
                }),
            };
            let user = market
                .register(RegisterRequest::new(name, email, password, &profile))
                .await?;
            println!("Registered {} as {}", user.email, user.role());
        }

        Command::Login { email, password } => {
            let user = market.login(&email, &password).await?;
            println!("Welcome, {} ({})", user.display_name(), user.role());
        }

        Command::Logout => {
            market.logout()?;
            println!("Signed out");
        }

        Command::Whoami => match market.current_user() {
            Some(user) => print_account(&user),
            None => println!("Not signed in"),
        },

        Command::Dashboard => dashboard(market).await?,

        Command::Events { all } => {
            let events = if all {
                market.events().await?
            } else {
                market.upcoming_events().await?
            };
            if events.is_empty() {
                println!("No events");
            }
            for event in &events {
                print_event(event);
            }
        }

        Command::Artists => {
            for artist in market.artists().await? {
                print_account(&artist);
            }
        }

        Command::Organizers => {
            for organizer in market.organizers().await? {
                print_account(&organizer);
            }
        }

        Command::Book { event_id, tickets } => {
            let booking = market.book_tickets(event_id, tickets).await?;
            println!(
                "Booked {} ticket(s), booking {} with code {}",
                booking.tickets, booking.id, booking.qr_code
            );
        }

        Command::Bookings => {
            let bookings = market.my_bookings().await?;
            if bookings.is_empty() {
                println!("No bookings");
            }
            for booking in &bookings {
                print_booking(booking);
            }
        }

        Command::Contracts => {
            let contracts = market.my_contracts().await?;
            if contracts.is_empty() {
                println!("No contracts");
            }
            for contract in &contracts {
                print_contract(contract);
            }
        }

        Command::SendContract {
            artist_id,
            event_name,
            venue,
            date,
            time,
            payment,
            description,
            notes,
        } => {
            let terms = ContractTerms {
                event_name,
                venue,
                event_date: Some(date),
                event_time: time,
                event_description: description,
                payment_amount: payment,
                notes,
            };
            let contract = market.send_contract(artist_id, terms).await?;
            println!("Sent contract {} to {}", contract.id, contract.artist_name);
        }

        Command::Respond {
            contract_id,
            decision,
        } => {
            let contract = market
                .respond_to_contract(contract_id, decision.into())
                .await?;
            println!("Contract {} is now {}", contract.id, contract.status);
        }

        Command::CreateEvent {
            contract,
            name,
            description,
            location,
            date,
            time,
            price,
            category,
            tickets,
        } => {
            let details = EventDetails {
                name,
                description,
                location,
                date,
                time,
                price,
                category,
                total_tickets: tickets,
            };
            let event = market.create_event(contract, details).await?;
            println!("Created event {}", event.id);
            print_event(&event);
        }

        Command::CompletePast => {
            let changed = market.sweep_completed(today()).await?;
            println!("{} event(s) marked completed", changed);
        }

        Command::Status => status(config, market).await?,
    }
    Ok(())
}

async fn dashboard(market: &Marketplace) -> anyhow::Result<()> {
    let user = market
        .current_user()
        .ok_or(encore_client::ClientError::NotLoggedIn)?;
    println!("{} dashboard ({} backend)", user.role(), market.backend_kind());

    match user.role() {
        Role::User => {
            let dashboard = market.attendee_dashboard(today()).await?;
            println!("Upcoming tickets: {}", dashboard.upcoming.len());
            for pass in &dashboard.upcoming {
                println!(
                    "  {} on {}: {} ticket(s), code {}",
                    pass.event_name, pass.date, pass.ticket_count, pass.qr_code
                );
            }
            println!("Past tickets: {}", dashboard.past.len());
            println!("Total spent: {:.2}", dashboard.total_spent);
        }
        Role::Organizer => {
            let dashboard = market.organizer_dashboard(today()).await?;
            println!("Upcoming events: {}", dashboard.upcoming_events.len());
            for event in &dashboard.upcoming_events {
                print_event(event);
            }
            println!("Completed events: {}", dashboard.completed_events.len());
            println!(
                "Contracts: {} pending, {} accepted, {} rejected",
                dashboard.pending_contracts.len(),
                dashboard.accepted_contracts.len(),
                dashboard.rejected_contracts.len()
            );
            println!("Ready for an event:");
            for contract in &dashboard.ready_contracts {
                print_contract(contract);
            }
            println!("Artists available: {}", dashboard.artists.len());
        }
        Role::Musician => {
            let dashboard = market.musician_dashboard().await?;
            println!("Pending offers:");
            for contract in &dashboard.pending_contracts {
                print_contract(contract);
            }
            println!("Accepted contracts: {}", dashboard.accepted_contracts.len());
            println!("Performances: {}", dashboard.performances.len());
            for event in &dashboard.performances {
                print_event(event);
            }
            println!("Earnings: {:.2}", dashboard.earnings);
        }
    }
    Ok(())
}

fn print_account(user: &User) {
    println!("{}  {} <{}>  {}", user.id, user.display_name(), user.email, user.role());
    match &user.profile {
        Profile::Attendee => {}
        Profile::Organizer(profile) => {
            if let Some(kind) = &profile.kind {
                println!("    type: {}", kind);
            }
            if let Some(location) = &profile.location {
                println!("    location: {}", location);
            }
        }
        Profile::Musician(profile) => {
            if let Some(genre) = &profile.genre {
                println!("    genre: {}", genre);
            }
            if let Some(location) = &profile.location {
                println!("    location: {}", location);
            }
            if let Some(price) = profile.price {
                println!("    fee: {:.2}", price);
            }
        }
    }
}

fn print_event(event: &Event) {
    println!(
        "{}  {}  {} {}  @ {}  {}/{} left  {:.2}  [{}]",
        event.id,
        event.name,
        event.date,
        event.time,
        event.location,
        event.available_tickets,
        event.total_tickets,
        event.price,
        event.status
    );
}

fn print_booking(booking: &Booking) {
    println!(
        "{}  event {}  {} ticket(s)  {}  {}",
        booking.id,
        booking.event_id,
        booking.tickets,
        booking.qr_code,
        booking.booking_date.format("%Y-%m-%d %H:%M")
    );
}

fn print_contract(contract: &Contract) {
    let date = contract
        .terms
        .event_date
        .map(|d| d.to_string())
        .unwrap_or_default();
    println!(
        "{}  {} @ {} on {}  {} → {}  {:.2}  [{}]",
        contract.id,
        contract.terms.event_name,
        contract.terms.venue,
        date,
        contract.organizer_name,
        contract.artist_name,
        contract.terms.payment_amount,
        contract.status
    );
}
