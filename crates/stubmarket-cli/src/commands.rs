//! Subcommands and their implementations.

use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Subcommand, ValueEnum};
use stubmarket_auth::{token, AuthClient, LoginRequest, RegisterRequest};
use stubmarket_client::endpoints::{self, marketplace, pii, purchases, stubs};
use stubmarket_client::types::{AuthStatus, Listing, NewListing, Purchase, PurchaseStatus, Stub};
use stubmarket_client::ApiClient;
use stubmarket_core::{ListingId, PurchaseId, SellerId, StubId};

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and store the session.
    Login {
        /// Account email.
        #[arg(long)]
        email: String,
        /// Account password.
        #[arg(long, env = "STUBMARKET_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account.
    Register {
        /// Public username.
        #[arg(long)]
        username: String,
        /// Account email.
        #[arg(long)]
        email: String,
        /// Account password.
        #[arg(long, env = "STUBMARKET_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// End the session.
    Logout,
    /// Show the current session.
    Whoami,
    /// Manage your stubs.
    #[command(subcommand)]
    Stubs(StubCommand),
    /// Browse and manage marketplace listings.
    #[command(subcommand)]
    Listings(ListingCommand),
    /// Show a seller's profile and listings.
    Seller {
        /// Seller ID.
        id: SellerId,
        /// Page to show.
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Buy listings and review purchases.
    #[command(subcommand)]
    Purchases(PurchaseCommand),
    /// Show or toggle the theme preference.
    Theme {
        /// Switch between light and dark.
        #[arg(long)]
        toggle: bool,
    },
    /// Suggest addresses for partial input.
    Address {
        /// Partial address.
        input: String,
    },
}

/// `stubs` subcommands.
#[derive(Subcommand, Debug)]
pub enum StubCommand {
    /// List your stubs.
    List,
    /// Show one stub.
    Show {
        /// Stub ID.
        id: StubId,
    },
    /// Upload a stub image.
    Upload {
        /// Title of the stub.
        #[arg(long)]
        title: String,
        /// PNG or JPEG image.
        image: PathBuf,
    },
}

/// `listings` subcommands.
#[derive(Subcommand, Debug)]
pub enum ListingCommand {
    /// Browse the marketplace.
    List {
        /// Listing status (`active`, `sold`, `cancelled`).
        #[arg(long)]
        status: Option<String>,
    },
    /// List your own listings.
    Mine,
    /// Show one listing.
    Show {
        /// Listing ID.
        id: ListingId,
    },
    /// Put a stub on the marketplace.
    Create {
        /// Stub to list.
        stub: StubId,
        /// Asking price.
        #[arg(long)]
        price: f64,
        /// Currency code.
        #[arg(long, default_value = "USD")]
        currency: String,
        /// Description shown to buyers.
        #[arg(long)]
        description: Option<String>,
    },
    /// Take a listing off the marketplace.
    Cancel {
        /// Listing ID.
        id: ListingId,
    },
}

/// `purchases` subcommands.
#[derive(Subcommand, Debug)]
pub enum PurchaseCommand {
    /// List purchases you made or received.
    List,
    /// Buy a listing.
    Buy {
        /// Listing ID.
        listing: ListingId,
        /// Idempotency key; reusing one returns the original purchase.
        #[arg(long)]
        key: Option<String>,
    },
    /// Set the status of a purchase you sold.
    SetStatus {
        /// Purchase ID.
        id: PurchaseId,
        /// New status.
        #[arg(value_enum)]
        status: StatusArg,
    },
}

/// Purchase status accepted on the command line.
#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum StatusArg {
    /// Handed over.
    Completed,
    /// Refunded.
    Refunded,
    /// Disputed.
    Disputed,
}

impl From<StatusArg> for PurchaseStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Completed => Self::Completed,
            StatusArg::Refunded => Self::Refunded,
            StatusArg::Disputed => Self::Disputed,
        }
    }
}

/// Run a command against the API.
pub async fn run(api: &ApiClient, auth: &AuthClient, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Login { email, password } => {
            let session =
                endpoints::auth::login(auth, api, &LoginRequest { email, password }).await?;
            println!("{}", session.message.as_deref().unwrap_or("Logged in"));
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            let request = RegisterRequest {
                username,
                email,
                password,
            };
            let session = endpoints::auth::register(auth, api, &request).await?;
            println!("{}", session.message.as_deref().unwrap_or("Registered"));
        }
        Command::Logout => {
            endpoints::auth::logout(auth, api).await?;
            println!("Logged out");
        }
        Command::Whoami => {
            let status = endpoints::auth::status_check(api).await?;
            let expires_at = api
                .store()
                .access_token()?
                .as_deref()
                .and_then(token::expires_at);
            println!("{}", session_line(&status, expires_at));
        }
        Command::Stubs(command) => run_stubs(api, command).await?,
        Command::Listings(command) => run_listings(api, command).await?,
        Command::Seller { id, page } => {
            let page = marketplace::seller_listings(api, id, page, 20).await?;
            println!(
                "{} ({} active, {} sold)",
                page.seller.username,
                page.seller.stats.active_listings,
                page.seller.stats.completed_sales
            );
            for listing in &page.listings {
                println!("{}", listing_line(listing));
            }
            println!("page {}/{}", page.pagination.page, page.pagination.pages);
        }
        Command::Purchases(command) => run_purchases(api, command).await?,
        Command::Theme { toggle } => {
            let mode = if toggle {
                api.store().toggle_theme_mode()?
            } else {
                api.store().theme_mode()?
            };
            println!("{mode}");
        }
        Command::Address { input } => {
            let suggestions = pii::address_autocomplete(api, &input).await?;
            println!("{}", serde_json::to_string_pretty(&suggestions)?);
        }
    }
    Ok(())
}

async fn run_stubs(api: &ApiClient, command: StubCommand) -> anyhow::Result<()> {
    match command {
        StubCommand::List => {
            for stub in stubs::list(api).await? {
                println!("{}", stub_line(&stub));
            }
        }
        StubCommand::Show { id } => {
            let stub = stubs::get(api, id).await?;
            println!("{}", serde_json::to_string_pretty(&stub)?);
        }
        StubCommand::Upload { title, image } => {
            let file_name = image
                .file_name()
                .and_then(|name| name.to_str())
                .context("image path has no file name")?
                .to_string();
            let bytes = tokio::fs::read(&image)
                .await
                .with_context(|| format!("failed to read {}", image.display()))?;
            let stub = stubs::upload(api, &title, &file_name, bytes).await?;
            println!("uploaded {}", stub_line(&stub));
        }
    }
    Ok(())
}

async fn run_listings(api: &ApiClient, command: ListingCommand) -> anyhow::Result<()> {
    match command {
        ListingCommand::List { status } => {
            for listing in marketplace::listings(api, status.as_deref()).await? {
                println!("{}", listing_line(&listing));
            }
        }
        ListingCommand::Mine => {
            for listing in marketplace::my_listings(api).await? {
                println!("{}", listing_line(&listing));
            }
        }
        ListingCommand::Show { id } => {
            let listing = marketplace::listing(api, id).await?;
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
        ListingCommand::Create {
            stub,
            price,
            currency,
            description,
        } => {
            let listing = marketplace::create_listing(
                api,
                &NewListing {
                    stub_id: stub,
                    asking_price: price,
                    currency,
                    description,
                },
            )
            .await?;
            println!("listed {}", listing_line(&listing));
        }
        ListingCommand::Cancel { id } => {
            let listing = marketplace::delete_listing(api, id).await?;
            println!("cancelled {}", listing_line(&listing));
        }
    }
    Ok(())
}

async fn run_purchases(api: &ApiClient, command: PurchaseCommand) -> anyhow::Result<()> {
    match command {
        PurchaseCommand::List => {
            for purchase in purchases::list(api).await? {
                println!("{}", purchase_line(&purchase));
            }
        }
        PurchaseCommand::Buy { listing, key } => {
            let created = purchases::create(api, listing, key.as_deref()).await?;
            println!("{}", purchase_line(&created.purchase));
            if let Some(secret) = created.client_secret {
                println!("payment secret: {secret}");
            }
        }
        PurchaseCommand::SetStatus { id, status } => {
            let purchase = purchases::update_status(api, id, status.into()).await?;
            println!("{}", purchase_line(&purchase));
        }
    }
    Ok(())
}

fn session_line(status: &AuthStatus, expires_at: Option<DateTime<Utc>>) -> String {
    if !status.is_authenticated {
        return "not logged in".to_string();
    }
    let who = status.username.as_deref().unwrap_or("authenticated");
    match expires_at {
        Some(at) => format!("{who} (token valid until {})", at.format("%Y-%m-%d %H:%M UTC")),
        None => who.to_string(),
    }
}

fn stub_line(stub: &Stub) -> String {
    let title = stub.title.as_deref().unwrap_or("(untitled)");
    match &stub.event_name {
        Some(event) => format!("#{} {title} [{event}]", stub.id),
        None => format!("#{} {title}", stub.id),
    }
}

fn listing_line(listing: &Listing) -> String {
    let title = listing
        .stub
        .as_ref()
        .and_then(|stub| stub.title.as_deref())
        .unwrap_or("(untitled)");
    format!(
        "#{} {title} {:.2} {} ({})",
        listing.id, listing.asking_price, listing.currency, listing.status
    )
}

fn purchase_line(purchase: &Purchase) -> String {
    format!(
        "#{} listing #{} {:.2} {} ({})",
        purchase.id, purchase.listing_id, purchase.purchase_price, purchase.currency, purchase.status
    )
}
