//! Application state for the shopdash command line.
//!
//! `App` owns the configuration, the session, the API client and the notice
//! board, and runs one command against them.

use std::io::{self, Write};
use std::time::Instant;

use anyhow::{anyhow, Result};
use tracing::{debug, info, warn};

use shopdash_core::auth::SessionView;
use shopdash_core::models::{CategoryDraft, FilterDraft, Order, Product};
use shopdash_core::notice::NoticeBoard;
use shopdash_core::{ApiClient, ApiError, Config, SessionManager};

use crate::command::{Command, USAGE};
use crate::format::{format_date, format_price, truncate_string};

/// Column width for product and order titles
const TITLE_WIDTH: usize = 40;

pub struct App {
    pub config: Config,
    pub session: SessionManager,
    pub api: ApiClient,
    pub notices: NoticeBoard,
}

impl App {
    /// Create a new application instance
    pub fn new() -> Result<Self> {
        let config = match Config::load() {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "Failed to load config, using defaults");
                Config::default()
            }
        };
        debug!(base_url = %config.api_base_url(), backend = ?config.token_backend, "Config loaded");

        let (session, api) = shopdash_core::connect(&config)?;
        let notices = config.notice_board();

        Ok(Self {
            config,
            session,
            api,
            notices,
        })
    }

    /// Restore a saved session, showing a loading line while it resolves
    pub async fn start(&mut self) -> SessionView {
        if self.session.state().is_loading {
            eprintln!("Loading...");
        }
        self.session.restore().await;
        self.session.state().view()
    }

    fn notify(&mut self, message: impl Into<String>) {
        let now = Instant::now();
        self.notices.post(message, now);
        if let Some(text) = self.notices.current(now) {
            eprintln!("Info: {}", text);
        }
    }

    /// Surface an API error to the user; session-ending errors send them to login
    fn api_failure(&mut self, e: ApiError) -> anyhow::Error {
        self.notify(e.user_message());
        if e.ends_session() {
            eprintln!("Run `shopdash login` to sign in again.");
        }
        anyhow!(e)
    }

    pub async fn run(&mut self, command: Command) -> Result<()> {
        if command.needs_session() && !self.session.is_authenticated() {
            return Err(anyhow!("Not logged in. Run `shopdash login` first."));
        }

        match command {
            Command::Help => print!("{}", USAGE),
            Command::Login => self.login_interactive().await?,
            Command::Logout => {
                self.session.logout().await;
                println!("Logged out.");
            }
            Command::WhoAmI => {
                if let Some(user) = self.session.user() {
                    println!("{} <{}>", user.display_name(), user.email);
                    if !user.phone.is_empty() {
                        println!("Phone: {}", user.phone);
                    }
                }
            }
            Command::ForgotPassword(email) => {
                let email = match email.or_else(|| self.config.last_email.clone()) {
                    Some(e) => e,
                    None => Self::prompt("Email: ")?,
                };
                self.forgot_password(&email).await?;
            }
            command => self.run_dashboard(command).await?,
        }
        Ok(())
    }

    async fn run_dashboard(&mut self, command: Command) -> Result<()> {
        let api = self.api.clone();
        let result = match command {
            Command::Stats => api.fetch_stats().await.map(|stats| {
                println!("Revenue:        {}", format_price(stats.total_revenue));
                println!("Orders:         {}", stats.total_orders);
                println!("Pending orders: {}", stats.pending_orders);
                println!("Products:       {}", stats.total_products);
            }),
            Command::Products => api.fetch_products().await.map(|products| {
                products.iter().for_each(print_product_row);
            }),
            Command::Product(id) => api.fetch_product(id).await.map(|p| print_product(&p)),
            Command::Search(query) => api.search_products(&query).await.map(|products| {
                if products.is_empty() {
                    println!("No products match \"{}\"", query);
                }
                products.iter().for_each(print_product_row);
            }),
            Command::DeleteProduct(id) => api
                .delete_product(id)
                .await
                .map(|_| println!("Product {} deleted.", id)),
            Command::Orders => api.fetch_orders().await.map(|orders| {
                orders.iter().for_each(print_order_row);
            }),
            Command::Order(id) => api.fetch_order(id).await.map(|o| print_order(&o)),
            Command::SetOrderStatus(id, status) => api
                .update_order_status(id, &status)
                .await
                .map(|o| println!("Order {} is now {}.", o.id, o.status)),
            Command::DeleteOrder(id) => api
                .delete_order(id)
                .await
                .map(|_| println!("Order {} deleted.", id)),
            Command::Categories => api.fetch_categories().await.map(|categories| {
                for c in &categories {
                    let indent = if c.is_top_level() { "" } else { "  " };
                    println!("{}{:>5}  {}", indent, c.id, c.name);
                }
            }),
            Command::AddCategory { name, parent_id } => api
                .create_category(&CategoryDraft { parent_id, name })
                .await
                .map(|c| println!("Category {} created.", c.id)),
            Command::DeleteCategory(id) => api
                .delete_category(id)
                .await
                .map(|_| println!("Category {} deleted.", id)),
            Command::Filters => api.fetch_filters().await.map(|filters| {
                for f in &filters {
                    println!("{:>5}  {}  (category {})", f.id, f.name, f.category_id);
                }
            }),
            Command::AddFilter { category_id, name } => api
                .create_filter(&FilterDraft { category_id, name })
                .await
                .map(|f| println!("Filter {} created.", f.id)),
            Command::DeleteFilter(id) => api
                .delete_filter(id)
                .await
                .map(|_| println!("Filter {} deleted.", id)),
            Command::WeightPrices => api.fetch_weight_prices().await.map(|tiers| {
                for t in &tiers {
                    println!("{:>5}  {:<16} {}", t.id, t.range_display(), format_price(t.price));
                }
            }),
            Command::ShippingCost(weight) => api.fetch_weight_prices().await.map(|tiers| {
                match tiers.iter().find(|t| t.covers(weight)) {
                    Some(t) => println!("{} kg ships for {}", weight, format_price(t.price)),
                    None => println!("No shipping tier covers {} kg", weight),
                }
            }),
            Command::Help
            | Command::Login
            | Command::Logout
            | Command::WhoAmI
            | Command::ForgotPassword(_) => Ok(()),
        };

        result.map_err(|e| self.api_failure(e))
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Interactive login
    pub async fn login_interactive(&mut self) -> Result<()> {
        let email = match self.config.last_email.clone() {
            Some(last) => {
                let input = Self::prompt(&format!("Email [{}]: ", last))?;
                if input.is_empty() {
                    last
                } else {
                    input
                }
            }
            None => Self::prompt("Email: ")?,
        };
        let password = rpassword::prompt_password("Password: ")?;

        if email.is_empty() || password.is_empty() {
            self.notify("Email and password required");
            return Err(anyhow!("Email and password required"));
        }

        eprintln!("Signing in...");
        match self.session.login(&email, &password).await {
            Ok(user) => {
                self.config.last_email = Some(email);
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }
                info!("Login successful");
                println!("Welcome, {}!", user.display_name());
                Ok(())
            }
            Err(e) => {
                self.notify(e.user_message());
                Err(anyhow!(e))
            }
        }
    }

    pub async fn forgot_password(&mut self, email: &str) -> Result<()> {
        match self.session.forgot_password(email).await {
            Ok(Some(message)) => self.notify(message),
            Ok(None) => self.notify("If the account exists, a reset email is on its way."),
            Err(e) => {
                self.notify(e.user_message());
                return Err(anyhow!(e));
            }
        }
        Ok(())
    }

    fn prompt(label: &str) -> Result<String> {
        print!("{}", label);
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        Ok(input.trim().to_string())
    }
}

fn print_product_row(p: &Product) {
    let stock = if p.in_stock() {
        format!("{} in stock", p.stock)
    } else {
        "out of stock".to_string()
    };
    println!(
        "{:>5}  {:<width$}  {:>12}  {}",
        p.id,
        truncate_string(&p.title, TITLE_WIDTH),
        format_price(p.discounted_price()),
        stock,
        width = TITLE_WIDTH
    );
}

fn print_product(p: &Product) {
    println!("{} (#{})", p.title, p.id);
    println!("SKU: {}  EAN: {}", p.sku, p.ean);
    println!("Category: {}", p.category);
    if p.discount > 0.0 {
        println!(
            "Price: {} ({}% off {})",
            format_price(p.discounted_price()),
            p.discount,
            format_price(p.price)
        );
    } else {
        println!("Price: {}", format_price(p.price));
    }
    println!("Stock: {}  Weight: {} kg", p.stock, p.weight);
    println!("Images: {}", 1 + p.gallery().len());
    if !p.description.is_empty() {
        println!();
        println!("{}", p.description);
    }
}

fn print_order_row(o: &Order) {
    println!(
        "{:>5}  {:<12}  {:<12}  {:>12}  {}",
        o.id,
        format_date(&o.date),
        o.status().as_str(),
        format_price(o.price),
        truncate_string(&o.email, TITLE_WIDTH)
    );
}

fn print_order(o: &Order) {
    println!("Order #{} - {}", o.id, o.status().as_str());
    println!("Placed: {}", format_date(&o.date));
    println!("Customer: {}", o.email);
    println!("Ship to: {}", o.address.one_line());
    println!("Total: {}", format_price(o.price));
}
