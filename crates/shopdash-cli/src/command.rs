//! Command-line parsing for the dashboard sections.

use anyhow::{anyhow, bail, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Login,
    Logout,
    WhoAmI,
    ForgotPassword(Option<String>),
    Stats,
    Products,
    Product(i64),
    Search(String),
    DeleteProduct(i64),
    Orders,
    Order(i64),
    SetOrderStatus(i64, String),
    DeleteOrder(i64),
    Categories,
    AddCategory { name: String, parent_id: i64 },
    DeleteCategory(i64),
    Filters,
    AddFilter { category_id: i64, name: String },
    DeleteFilter(i64),
    WeightPrices,
    ShippingCost(f64),
    Help,
}

pub const USAGE: &str = "\
Usage: shopdash <command> [args]

Session:
  login                       Sign in (prompts for email and password)
  logout                      Sign out and forget stored tokens
  whoami                      Show the signed-in administrator
  forgot-password [email]     Request a password reset email

Catalog:
  stats                       Dashboard totals
  products                    List products
  product <id>                Show one product
  search <query>              Search products
  delete-product <id>         Delete a product
  categories                  List categories
  add-category <name> [parent-id]
  delete-category <id>
  filters                     List filters
  add-filter <category-id> <name>
  delete-filter <id>
  weight-prices               List shipping tiers
  shipping-cost <weight-kg>   Price of the tier covering a weight

Orders:
  orders                      List orders
  order <id>                  Show one order
  set-status <id> <status>    Change an order's status
  delete-order <id>
";

fn parse_id(value: Option<&String>, what: &str) -> Result<i64> {
    let value = value.ok_or_else(|| anyhow!("Missing {}", what))?;
    value
        .parse()
        .map_err(|_| anyhow!("Invalid {}: {}", what, value))
}

impl Command {
    /// Parse arguments after the program name
    pub fn parse(args: &[String]) -> Result<Self> {
        let Some(name) = args.first() else {
            return Ok(Command::Help);
        };
        let rest = &args[1..];

        let command = match name.as_str() {
            "login" => Command::Login,
            "logout" => Command::Logout,
            "whoami" => Command::WhoAmI,
            "forgot-password" => Command::ForgotPassword(rest.first().cloned()),
            "stats" => Command::Stats,
            "products" => Command::Products,
            "product" => Command::Product(parse_id(rest.first(), "product id")?),
            "search" => {
                if rest.is_empty() {
                    bail!("Missing search query");
                }
                Command::Search(rest.join(" "))
            }
            "delete-product" => Command::DeleteProduct(parse_id(rest.first(), "product id")?),
            "orders" => Command::Orders,
            "order" => Command::Order(parse_id(rest.first(), "order id")?),
            "set-status" => {
                let id = parse_id(rest.first(), "order id")?;
                let status = rest.get(1).ok_or_else(|| anyhow!("Missing status"))?;
                Command::SetOrderStatus(id, status.clone())
            }
            "delete-order" => Command::DeleteOrder(parse_id(rest.first(), "order id")?),
            "categories" => Command::Categories,
            "add-category" => {
                let name = rest.first().ok_or_else(|| anyhow!("Missing category name"))?;
                let parent_id = match rest.get(1) {
                    Some(_) => parse_id(rest.get(1), "parent id")?,
                    None => 0,
                };
                Command::AddCategory {
                    name: name.clone(),
                    parent_id,
                }
            }
            "delete-category" => Command::DeleteCategory(parse_id(rest.first(), "category id")?),
            "filters" => Command::Filters,
            "add-filter" => {
                let category_id = parse_id(rest.first(), "category id")?;
                if rest.len() < 2 {
                    bail!("Missing filter name");
                }
                Command::AddFilter {
                    category_id,
                    name: rest[1..].join(" "),
                }
            }
            "delete-filter" => Command::DeleteFilter(parse_id(rest.first(), "filter id")?),
            "weight-prices" => Command::WeightPrices,
            "shipping-cost" => {
                let weight = rest.first().ok_or_else(|| anyhow!("Missing weight"))?;
                let weight = weight
                    .parse()
                    .map_err(|_| anyhow!("Invalid weight: {}", weight))?;
                Command::ShippingCost(weight)
            }
            "help" | "-h" | "--help" => Command::Help,
            other => bail!("Unknown command: {}", other),
        };
        Ok(command)
    }

    /// Command word as typed, without its arguments. Safe to log.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Login => "login",
            Command::Logout => "logout",
            Command::WhoAmI => "whoami",
            Command::ForgotPassword(_) => "forgot-password",
            Command::Stats => "stats",
            Command::Products => "products",
            Command::Product(_) => "product",
            Command::Search(_) => "search",
            Command::DeleteProduct(_) => "delete-product",
            Command::Orders => "orders",
            Command::Order(_) => "order",
            Command::SetOrderStatus(..) => "set-status",
            Command::DeleteOrder(_) => "delete-order",
            Command::Categories => "categories",
            Command::AddCategory { .. } => "add-category",
            Command::DeleteCategory(_) => "delete-category",
            Command::Filters => "filters",
            Command::AddFilter { .. } => "add-filter",
            Command::DeleteFilter(_) => "delete-filter",
            Command::WeightPrices => "weight-prices",
            Command::ShippingCost(_) => "shipping-cost",
            Command::Help => "help",
        }
    }

    /// Whether the command talks to authenticated endpoints
    pub fn needs_session(&self) -> bool {
        !matches!(
            self,
            Command::Login | Command::Logout | Command::ForgotPassword(_) | Command::Help
        )
    }
}
