//! # Terminal Shell
//!
//! Line-oriented front end over the command functions. Reads one command
//! per line, prints the result, and never decides anything itself: every
//! rule lives behind `commands`.
//!
//! ## Command Reference
//! ```text
//! login <cashier>...                 open a session (fresh cart)
//! logout                             close the session
//! products                           list active products
//! show <product>                     variants, modifiers, bundles
//! add <product> [qty] [-v <variant>] [-o <opt>,<opt>] [-b <bundle>]
//! cart                               lines with their numbers
//! qty <line#> <quantity>             change a line's quantity
//! rm <line#>                         remove a line
//! clear                              empty the cart
//! discount <percent>                 cart discount, clamped to 0..100
//! totals                             item count, gross, discount, net
//! pay <cash> [key]                   commit the sale
//! sales [n]                          recent sales
//! sale <id>                          one sale with its lines
//! summary                            last 24 hours
//! help [command] | quit
//! ```
//!
//! The grammar is a clap `Subcommand`; each input line is split on
//! whitespace and parsed as if it were an argv without a binary name.
//!
//! Line numbers are positions in the last printed cart (1-based); they are
//! translated to line ids before any command runs.

use std::fmt::Write as _;

use chrono::Utc;
use clap::{ColorChoice, Parser, Subcommand};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::commands::{cart, product, sale};
use crate::error::ApiError;
use crate::state::{ConfigState, DbState, SessionState};
use till_core::validation::SelectionRequest;
use till_core::{
    BundleId, LineId, ModifierMode, ModifierOptionId, Money, ProductId, ProductListing, Receipt,
    SaleId, VariantId,
};

// =============================================================================
// Parsing
// =============================================================================

/// One register input line.
#[derive(Debug, Parser)]
#[command(
    name = "register",
    no_binary_name = true,
    disable_version_flag = true,
    color = ColorChoice::Never,
    help_template = "commands:\n{subcommands}"
)]
struct InputLine {
    #[command(subcommand)]
    command: Command,
}

/// Register shell commands.
#[derive(Debug, Clone, PartialEq, Subcommand)]
pub enum Command {
    /// Open a session with a fresh cart
    Login {
        /// Cashier identity (words are joined with spaces)
        #[arg(required = true, num_args = 1..)]
        cashier: Vec<String>,
    },

    /// Close the session
    Logout,

    /// List active products
    Products,

    /// Show a product's variants, modifiers and bundles
    Show { product: ProductId },

    /// Add a product selection to the cart
    #[command(allow_negative_numbers = true)]
    Add {
        product: ProductId,

        #[arg(default_value_t = 1)]
        quantity: i64,

        /// Variant id (required when the product has variants)
        #[arg(short = 'v', long = "variant")]
        variant: Option<VariantId>,

        /// Modifier option ids, comma separated
        #[arg(short = 'o', long = "options", value_delimiter = ',')]
        options: Vec<ModifierOptionId>,

        /// Bundle id
        #[arg(short = 'b', long = "bundle")]
        bundle: Option<BundleId>,
    },

    /// Print the cart with line numbers
    Cart,

    /// Change a line's quantity
    #[command(allow_negative_numbers = true)]
    Qty { line: usize, quantity: i64 },

    /// Remove a line
    #[command(name = "rm")]
    Remove { line: usize },

    /// Empty the cart
    Clear,

    /// Set the cart discount percent (clamped to 0..100)
    #[command(allow_negative_numbers = true)]
    Discount { percent: f64 },

    /// Item count, gross, discount and net
    Totals,

    /// Commit the sale
    Pay {
        /// Cash tendered, e.g. 250 or 250.00
        cash: Money,

        /// Idempotency key for safe retries
        key: Option<String>,
    },

    /// Recent sales
    Sales { count: Option<u32> },

    /// One sale with its lines
    Sale { id: SaleId },

    /// Sales over the last 24 hours
    Summary,

    /// Leave the register
    #[command(alias = "exit")]
    Quit,
}

/// Parses one input line.
///
/// `help` and `help <command>` come back as a clap error of kind
/// `DisplayHelp`, carrying the rendered text.
pub fn parse_command(line: &str) -> Result<Command, clap::Error> {
    InputLine::try_parse_from(line.split_whitespace()).map(|input| input.command)
}

// =============================================================================
// Shell
// =============================================================================

/// The terminal front end, holding the register state.
pub struct Shell {
    db: DbState,
    session: SessionState,
    config: ConfigState,
}

impl Shell {
    pub fn new(db: DbState, session: SessionState, config: ConfigState) -> Self {
        Shell {
            db,
            session,
            config,
        }
    }

    /// Reads commands until `quit` or end of input.
    pub async fn run<R, W>(&self, reader: R, mut writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        writer
            .write_all(format!("{} register ('help' for commands)\n", self.config.store_name).as_bytes())
            .await?;

        loop {
            writer.write_all(b"> ").await?;
            writer.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let output = match parse_command(line) {
                Ok(Command::Quit) => break,
                Ok(command) => match self.execute(command).await {
                    Ok(text) => text,
                    Err(e) => format!("error [{:?}]: {}", e.code, e.message),
                },
                // clap renders both help and its own "error: ..." text
                Err(e) => e.to_string().trim_end().to_string(),
            };

            writer.write_all(output.as_bytes()).await?;
            writer.write_all(b"\n").await?;
        }

        writer.flush().await
    }

    /// Runs one command and renders its result.
    pub async fn execute(&self, command: Command) -> Result<String, ApiError> {
        debug!(?command, "shell command");

        match command {
            Command::Login { cashier } => {
                let session = self.session.login(&cashier.join(" "))?;
                Ok(format!("logged in as {}", session.cashier))
            }
            Command::Logout => Ok(match self.session.logout() {
                Some(session) => format!("{} logged out", session.cashier),
                None => "no session".to_string(),
            }),
            Command::Products => {
                let products = product::list_products(&self.db, None).await?;
                let mut out = String::new();
                for p in products {
                    let _ = writeln!(
                        out,
                        "#{:<4} {:<24} {:>10}  stock {}",
                        p.id,
                        p.name,
                        self.money(p.price),
                        p.current_stock
                    );
                }
                Ok(out.trim_end().to_string())
            }
            Command::Show { product } => {
                let listing = product::get_listing(&self.db, product).await?;
                Ok(self.render_listing(&listing))
            }
            Command::Add {
                product,
                quantity,
                variant,
                options,
                bundle,
            } => {
                let request = SelectionRequest {
                    product_id: product,
                    variant_id: variant,
                    option_ids: options,
                    bundle_id: bundle,
                    quantity,
                };
                cart::add_to_cart(&self.db, &self.session, request).await?;
                Ok(self.render_cart())
            }
            Command::Cart => Ok(self.render_cart()),
            Command::Qty { line, quantity } => {
                let id = self.line_at(line)?;
                cart::set_line_quantity(&self.db, &self.session, id, quantity).await?;
                Ok(self.render_cart())
            }
            Command::Remove { line } => {
                let id = self.line_at(line)?;
                cart::remove_line(&self.session, id);
                Ok(self.render_cart())
            }
            Command::Clear => {
                cart::clear_cart(&self.session);
                Ok("cart cleared".to_string())
            }
            Command::Discount { percent } => {
                let applied = cart::set_discount(&self.session, percent);
                Ok(format!("discount {}", applied))
            }
            Command::Totals => Ok(self.render_totals()),
            Command::Pay { cash, key } => {
                let receipt =
                    sale::complete_sale(&self.db, &self.session, cash, key.as_deref()).await?;
                Ok(self.render_receipt(&receipt))
            }
            Command::Sales { count } => {
                let sales = sale::recent_sales(&self.db, count).await?;
                if sales.is_empty() {
                    return Ok("no sales".to_string());
                }
                let mut out = String::new();
                for s in sales {
                    let _ = writeln!(
                        out,
                        "#{:<5} {}  {:>10}  {} items  {}",
                        s.id,
                        s.sale_date.format("%Y-%m-%d %H:%M"),
                        self.money(s.total()),
                        s.total_items,
                        s.cashier_email
                    );
                }
                Ok(out.trim_end().to_string())
            }
            Command::Sale { id } => {
                let detail = sale::get_sale(&self.db, id).await?;
                let mut out = String::new();
                for l in &detail.lines {
                    let _ = writeln!(
                        out,
                        "  {:>3} x {:<28} {:>10}",
                        l.quantity,
                        l.product_name,
                        self.money(Money::from_cents(l.subtotal_cents))
                    );
                }
                let _ = writeln!(out, "cashier: {}", detail.cashier);
                out.push_str(&self.render_receipt(&detail.receipt));
                Ok(out)
            }
            Command::Summary => {
                let summary = sale::daily_summary(&self.db, Utc::now()).await?;
                Ok(format!(
                    "last 24h: {} sales, {} items, {}",
                    summary.sale_count,
                    summary.item_count,
                    self.money(summary.net_total)
                ))
            }
            Command::Quit => Ok(String::new()),
        }
    }

    fn money(&self, amount: Money) -> String {
        self.config.format_currency(amount)
    }

    fn line_at(&self, number: usize) -> Result<LineId, ApiError> {
        let cart = cart::get_cart(&self.session);
        number
            .checked_sub(1)
            .and_then(|i| cart.lines.get(i))
            .map(|l| l.line_id)
            .ok_or_else(|| ApiError::not_found("Cart line", &number.to_string()))
    }

    fn render_cart(&self) -> String {
        let cart = cart::get_cart(&self.session);
        if cart.lines.is_empty() {
            return "cart is empty".to_string();
        }

        let mut out = String::new();
        for (i, line) in cart.lines.iter().enumerate() {
            let _ = write!(
                out,
                "{:>2}. {:>3} x {:<24} @ {:>9} = {:>10}",
                i + 1,
                line.quantity,
                line.name,
                self.money(line.unit_price),
                self.money(line.subtotal)
            );
            if !line.options.is_empty() {
                let _ = write!(out, "  [{}]", line.options.join(", "));
            }
            if let Some(bundle) = &line.bundle {
                let _ = write!(out, "  (with {})", bundle);
            }
            out.push('\n');
        }
        out.push_str(&self.render_totals());
        out
    }

    fn render_totals(&self) -> String {
        let t = cart::get_totals(&self.session);
        let mut out = format!(
            "items {}  gross {}",
            t.item_count,
            self.money(t.gross_total)
        );
        if !t.discount.is_zero() {
            let _ = write!(
                out,
                "  discount {} (-{})",
                t.discount,
                self.money(t.discount_amount)
            );
        }
        let _ = write!(out, "  net {}", self.money(t.net_total));
        out
    }

    fn render_listing(&self, listing: &ProductListing) -> String {
        let p = &listing.product;
        let mut out = format!(
            "#{} {}  {}  stock {}\n",
            p.id,
            p.name,
            self.money(p.price()),
            p.current_stock
        );

        if listing.has_variants() {
            out.push_str("variants (one required, -v <id>):\n");
            for v in &listing.variants {
                let _ = writeln!(
                    out,
                    "  -v {:<4} {:<16} {:>10}  stock {}",
                    v.id,
                    v.name,
                    self.money(v.price()),
                    v.stock
                );
            }
        }

        for g in &listing.modifier_groups {
            let mode = match g.mode {
                ModifierMode::Single => "pick one",
                ModifierMode::Multiple => "pick any",
            };
            let required = if g.required { ", required" } else { "" };
            let _ = writeln!(out, "{} ({}{}):", g.name, mode, required);
            for o in &g.options {
                let _ = writeln!(out, "  -o {:<4} {:<16} +{}", o.id, o.name, self.money(o.price()));
            }
        }

        if !listing.bundles.is_empty() {
            out.push_str("bundles (-b <id>):\n");
            for b in &listing.bundles {
                let _ = writeln!(
                    out,
                    "  -b {:<4} {} x {}",
                    b.id,
                    b.quantity,
                    b.item_name.as_deref().unwrap_or("?")
                );
            }
        }

        out.trim_end().to_string()
    }

    fn render_receipt(&self, r: &Receipt) -> String {
        let mut out = format!(
            "sale #{}  {}\n",
            r.sale_id,
            r.sale_date.format("%Y-%m-%d %H:%M:%S")
        );
        let _ = writeln!(out, "  gross    {:>10}", self.money(r.gross_total));
        if !r.discount.is_zero() {
            let _ = writeln!(
                out,
                "  discount {:>10}  ({})",
                format!("-{}", self.money(r.discount_amount)),
                r.discount
            );
        }
        let _ = writeln!(out, "  total    {:>10}", self.money(r.net_total));
        let _ = writeln!(out, "  cash     {:>10}", self.money(r.cash_tendered));
        let _ = write!(out, "  change   {:>10}", self.money(r.change));
        if r.replayed {
            out.push_str("\n  (already recorded; receipt replayed)");
        }
        out
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::setup;
    use clap::error::ErrorKind;

    #[test]
    fn test_command_grammar_is_consistent() {
        use clap::CommandFactory;
        InputLine::command().debug_assert();
    }

    #[test]
    fn test_parse_add_full() {
        let cmd = parse_command("add 7 3 -v 2 -o 4,5 -b 9").unwrap();
        assert_eq!(
            cmd,
            Command::Add {
                product: 7,
                quantity: 3,
                variant: Some(2),
                options: vec![4, 5],
                bundle: Some(9),
            }
        );
    }

    #[test]
    fn test_parse_add_defaults_to_one() {
        match parse_command("add 7").unwrap() {
            Command::Add {
                quantity, options, ..
            } => {
                assert_eq!(quantity, 1);
                assert!(options.is_empty());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_negative_quantity_reaches_validation() {
        assert_eq!(
            parse_command("qty 1 -2").unwrap(),
            Command::Qty {
                line: 1,
                quantity: -2
            }
        );
    }

    #[test]
    fn test_parse_pay() {
        assert_eq!(
            parse_command("pay 250.00 till1-42").unwrap(),
            Command::Pay {
                cash: Money::from_cents(25000),
                key: Some("till1-42".to_string()),
            }
        );
        let err = parse_command("pay 2.505").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            parse_command("qty 1").unwrap_err().kind(),
            ErrorKind::MissingRequiredArgument
        );
        assert_eq!(
            parse_command("refund 3").unwrap_err().kind(),
            ErrorKind::InvalidSubcommand
        );
        assert!(parse_command("add 7 -x 1").is_err());
        assert_eq!(
            parse_command("login Ana Silva").unwrap(),
            Command::Login {
                cashier: vec!["Ana".to_string(), "Silva".to_string()]
            }
        );
        assert_eq!(parse_command("exit").unwrap(), Command::Quit);
    }

    #[test]
    fn test_help_lists_commands() {
        let err = parse_command("help").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);

        let text = err.to_string();
        assert!(text.contains("discount"));
        assert!(text.contains("rm"));
        assert!(text.contains("Commit the sale"));
    }

    #[tokio::test]
    async fn test_scripted_sale() {
        let (db, session, fx) = setup().await;
        let shell = Shell::new(db, session, ConfigState::default());

        let script = format!(
            "add {} 2 -o {}\ndiscount 10\ntotals\nrefund 1\npay 200\npay 250\nsales\nquit\ntotals\n",
            fx.lamp, fx.warm_bulb
        );
        let mut output = Vec::new();
        shell
            .run(tokio::io::BufReader::new(script.as_bytes()), &mut output)
            .await
            .unwrap();
        let output = String::from_utf8(output).unwrap();

        assert!(output.contains("net $207.00"));
        assert!(output.contains("error [InsufficientCash]"));
        assert!(output.contains("error: unrecognized subcommand 'refund'"));
        assert!(output.contains("change       $43.00"));
        assert!(output.contains("ana@shop.test"));
    }

    #[tokio::test]
    async fn test_line_numbers() {
        let (db, session, fx) = setup().await;
        let shell = Shell::new(db, session, ConfigState::default());

        shell
            .execute(Command::Add {
                product: fx.latte,
                quantity: 1,
                variant: Some(fx.large),
                options: Vec::new(),
                bundle: None,
            })
            .await
            .unwrap();

        let out = shell
            .execute(Command::Qty {
                line: 1,
                quantity: 3,
            })
            .await
            .unwrap();
        assert!(out.contains("3 x Latte (Large)"));

        let err = shell.execute(Command::Remove { line: 2 }).await.unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::NotFound);

        let out = shell.execute(Command::Remove { line: 1 }).await.unwrap();
        assert_eq!(out, "cart is empty");
    }
}
