//! # Shell Commands
//!
//! Parses typed lines and runs them against a [`CartFacade`].
//!
//! ## Command Reference
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  catalog                              list products and their options  │
//! │  add <product> [qty] [variant|-] [addon,addon|-] [note...]             │
//! │  qty <line> <n>                       set quantity (0 removes)         │
//! │  inc <line> / dec <line>              stepper buttons                  │
//! │  edit <line> <qty> [variant|-] [addon,addon|-] [note...]               │
//! │  rm <line>                            remove a line                    │
//! │  clear                                empty the cart                   │
//! │  toggle <line>                        flip checkout selection          │
//! │  toggle-store <vendor>                flip a whole vendor group        │
//! │  select-all on|off                                                     │
//! │  rm-selected                          drop every selected line         │
//! │  total [fee...]                       selected subtotal + fees         │
//! │  show / help / quit                                                    │
//! │                                                                         │
//! │  <line> is the number printed by `show` or a prefix of the line id.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::fmt::Write as _;

use satchel_core::{pricing, CartSnapshot, LineModifiers, Money, SubtotalScope};
use satchel_db::KeyValueStore;
use satchel_store::CartFacade;

use crate::catalog::{Catalog, CatalogEntry};
use crate::config::AppConfig;
use crate::error::{CliError, CliResult};

const NONE_MARKER: &str = "-";

/// Modifiers as typed, before catalog lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModifierArgs {
    pub variant: Option<String>,
    pub addons: Vec<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Catalog,
    Show,
    Quit,
    Add {
        product: String,
        quantity: i64,
        modifiers: ModifierArgs,
    },
    Quantity { line: String, quantity: i64 },
    Increment { line: String },
    Decrement { line: String },
    Edit {
        line: String,
        quantity: i64,
        modifiers: ModifierArgs,
    },
    Remove { line: String },
    Clear,
    Toggle { line: String },
    ToggleStore { vendor: String },
    SelectAll(bool),
    RemoveSelected,
    Total { fees: Vec<Money> },
}

impl Command {
    /// Parses one input line. Blank lines parse to `None`.
    pub fn parse(input: &str) -> CliResult<Option<Command>> {
        let mut words = input.split_whitespace();
        let Some(name) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let command = match name.to_ascii_lowercase().as_str() {
            "help" | "?" => Command::Help,
            "catalog" => Command::Catalog,
            "show" | "ls" => Command::Show,
            "quit" | "exit" => Command::Quit,
            "add" => {
                let (product, rest) = args.split_first().ok_or(CliError::Usage(
                    "add <product> [qty] [variant|-] [addon,addon|-] [note...]",
                ))?;
                let quantity = match rest.first() {
                    Some(q) => parse_number(q)?,
                    None => 1,
                };
                Command::Add {
                    product: product.to_string(),
                    quantity,
                    modifiers: parse_modifiers(rest.get(1..).unwrap_or_default()),
                }
            }
            "qty" => match args.as_slice() {
                [line, quantity] => Command::Quantity {
                    line: line.to_string(),
                    quantity: parse_number(quantity)?,
                },
                _ => return Err(CliError::Usage("qty <line> <n>")),
            },
            "inc" => Command::Increment {
                line: single(&args, "inc <line>")?,
            },
            "dec" => Command::Decrement {
                line: single(&args, "dec <line>")?,
            },
            "edit" => match args.as_slice() {
                [line, quantity, rest @ ..] => Command::Edit {
                    line: line.to_string(),
                    quantity: parse_number(quantity)?,
                    modifiers: parse_modifiers(rest),
                },
                _ => {
                    return Err(CliError::Usage(
                        "edit <line> <qty> [variant|-] [addon,addon|-] [note...]",
                    ))
                }
            },
            "rm" => Command::Remove {
                line: single(&args, "rm <line>")?,
            },
            "clear" => Command::Clear,
            "toggle" => Command::Toggle {
                line: single(&args, "toggle <line>")?,
            },
            "toggle-store" => {
                if args.is_empty() {
                    return Err(CliError::Usage("toggle-store <vendor>"));
                }
                Command::ToggleStore {
                    vendor: args.join(" "),
                }
            }
            "select-all" => match args.as_slice() {
                ["on"] => Command::SelectAll(true),
                ["off"] => Command::SelectAll(false),
                _ => return Err(CliError::Usage("select-all on|off")),
            },
            "rm-selected" => Command::RemoveSelected,
            "total" => Command::Total {
                fees: args
                    .iter()
                    .map(|fee| parse_number(fee).map(Money::from_minor))
                    .collect::<CliResult<_>>()?,
            },
            other => return Err(CliError::UnknownCommand(other.to_string())),
        };

        Ok(Some(command))
    }
}

fn parse_number(word: &str) -> CliResult<i64> {
    word.parse()
        .map_err(|_| CliError::InvalidNumber(word.to_string()))
}

fn single(args: &[&str], usage: &'static str) -> CliResult<String> {
    match args {
        [one] => Ok(one.to_string()),
        _ => Err(CliError::Usage(usage)),
    }
}

/// `[variant|-] [addon,addon|-] [note...]`
fn parse_modifiers(args: &[&str]) -> ModifierArgs {
    let mut args = args.iter();

    let variant = args
        .next()
        .filter(|v| **v != NONE_MARKER)
        .map(|v| v.to_string());

    let addons = args
        .next()
        .filter(|a| **a != NONE_MARKER)
        .map(|a| {
            a.split(',')
                .filter(|id| !id.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let notes: Vec<&str> = args.copied().collect();
    let notes = (!notes.is_empty()).then(|| notes.join(" "));

    ModifierArgs {
        variant,
        addons,
        notes,
    }
}

// =============================================================================
// Shell
// =============================================================================

/// What the read loop should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Quit,
}

pub struct Shell<S: KeyValueStore> {
    facade: CartFacade<S>,
    catalog: Catalog,
    config: AppConfig,
}

impl<S: KeyValueStore> Shell<S> {
    pub fn new(facade: CartFacade<S>, catalog: Catalog, config: AppConfig) -> Self {
        Shell {
            facade,
            catalog,
            config,
        }
    }

    pub fn facade(&self) -> &CartFacade<S> {
        &self.facade
    }

    /// Runs one command. Cart commands that change nothing answer with a
    /// short notice; changes are announced by the cart subscriber.
    pub fn execute(&self, command: Command) -> CliResult<Reply> {
        let before = self.facade.revision();

        match command {
            Command::Help => return Ok(Reply::Text(HELP.to_string())),
            Command::Catalog => return Ok(Reply::Text(self.render_catalog())),
            Command::Show => return Ok(Reply::Text(self.render_cart())),
            Command::Quit => return Ok(Reply::Quit),
            Command::Total { fees } => return Ok(Reply::Text(self.render_total(&fees))),

            Command::Add {
                product,
                quantity,
                modifiers,
            } => {
                let entry = self.catalog.find(&product)?;
                let modifiers = resolve_modifiers(entry, modifiers)?;
                self.facade.add_item(&entry.product, quantity, modifiers);
            }
            Command::Quantity { line, quantity } => {
                let id = self.resolve_line(&line)?;
                self.facade.update_quantity(&id, quantity);
            }
            Command::Increment { line } => {
                let id = self.resolve_line(&line)?;
                self.facade.increment_item(&id);
            }
            Command::Decrement { line } => {
                let id = self.resolve_line(&line)?;
                self.facade.decrement_item(&id);
            }
            Command::Edit {
                line,
                quantity,
                modifiers,
            } => {
                let id = self.resolve_line(&line)?;
                let cart = self.facade.cart_items();
                let product_id = cart
                    .get(&id)
                    .map(|item| item.product().id.clone())
                    .ok_or_else(|| CliError::LineNotFound(line.clone()))?;
                let entry = self.catalog.find(&product_id)?;
                let modifiers = resolve_modifiers(entry, modifiers)?;
                self.facade.update_item(&id, quantity, modifiers);
            }
            Command::Remove { line } => {
                let id = self.resolve_line(&line)?;
                self.facade.remove_item(&id);
            }
            Command::Clear => {
                self.facade.clear_cart();
            }
            Command::Toggle { line } => {
                let id = self.resolve_line(&line)?;
                self.facade.toggle_selection(&id);
            }
            Command::ToggleStore { vendor } => {
                self.facade.toggle_store_selection(&vendor);
            }
            Command::SelectAll(value) => {
                self.facade.select_all(value);
            }
            Command::RemoveSelected => {
                self.facade.remove_selected();
            }
        }

        if self.facade.revision() == before {
            Ok(Reply::Text("(cart unchanged)".to_string()))
        } else {
            Ok(Reply::Text(String::new()))
        }
    }

    /// Maps a 1-based position or a line id prefix to a line id.
    fn resolve_line(&self, reference: &str) -> CliResult<String> {
        let cart = self.facade.cart_items();

        if let Ok(position) = reference.parse::<usize>() {
            return position
                .checked_sub(1)
                .and_then(|i| cart.items().get(i))
                .map(|item| item.line_id().to_string())
                .ok_or_else(|| CliError::LineNotFound(reference.to_string()));
        }

        let mut matches = cart
            .iter()
            .filter(|item| item.line_id().starts_with(reference));
        match (matches.next(), matches.next()) {
            (Some(item), None) => Ok(item.line_id().to_string()),
            (None, _) => Err(CliError::LineNotFound(reference.to_string())),
            (Some(_), Some(_)) => Err(CliError::AmbiguousLine(reference.to_string())),
        }
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    fn render_catalog(&self) -> String {
        let mut out = String::new();
        for entry in self.catalog.entries() {
            let product = &entry.product;
            let _ = writeln!(
                out,
                "{:<4} {:<14} {:>10}  {}",
                product.id,
                product.name,
                self.config.format_currency(product.price),
                product.vendor.as_deref().unwrap_or("")
            );
            for variant in &entry.variants {
                let _ = writeln!(
                    out,
                    "       variant {:<4} {:<12} {:+}",
                    variant.id,
                    variant.name,
                    variant.price_delta.minor()
                );
            }
            for addon in &entry.addons {
                let _ = writeln!(
                    out,
                    "       add-on  {:<4} {:<12} {}",
                    addon.id,
                    addon.name,
                    self.config.format_currency(addon.price)
                );
            }
        }
        out
    }

    fn render_cart(&self) -> String {
        let cart = self.facade.cart_items();
        if cart.is_empty() {
            return "Cart is empty".to_string();
        }

        let with_selection = self.facade.kind().selection_enabled();
        let mut out = String::new();

        for group in self.facade.vendor_groups() {
            let vendor = if group.vendor.is_empty() {
                "(no vendor)"
            } else {
                group.vendor.as_str()
            };
            if with_selection {
                let mark = if group.all_selected { "[x]" } else { "[ ]" };
                let _ = writeln!(out, "{mark} {vendor}");
            } else {
                let _ = writeln!(out, "{vendor}");
            }

            for (position, item) in cart.iter().enumerate() {
                if item.vendor_key() != group.vendor {
                    continue;
                }
                let mut label = item.product().name.clone();
                if let Some(variant) = item.variant() {
                    let _ = write!(label, " ({})", variant.name);
                }
                for addon in item.addons() {
                    let _ = write!(label, " +{}", addon.name);
                }
                let mark = match (with_selection, item.is_selected()) {
                    (false, _) => "",
                    (true, true) => "[x] ",
                    (true, false) => "[ ] ",
                };
                let short_id: String = item.line_id().chars().take(8).collect();
                let _ = writeln!(
                    out,
                    "  {mark}{}. {label}  x{}  {}  #{short_id}",
                    position + 1,
                    item.quantity(),
                    self.config.format_currency(item.subtotal()),
                );
                if let Some(notes) = item.notes() {
                    let _ = writeln!(out, "       note: {notes}");
                }
            }
        }

        let _ = write!(out, "{}", summary_line(&cart, &self.config));
        out
    }

    fn render_total(&self, fees: &[Money]) -> String {
        let subtotal = self.facade.selected_subtotal();
        let fee_sum: Money = fees.iter().sum();
        let total = self.facade.get_total(SubtotalScope::Selected, fees);

        format!(
            "checkout {} lines: subtotal {} + fees {} = {}",
            self.facade.selected_count(),
            self.config.format_currency(subtotal),
            self.config.format_currency(fee_sum),
            self.config.format_currency(total)
        )
    }
}

fn resolve_modifiers(entry: &CatalogEntry, args: ModifierArgs) -> CliResult<LineModifiers> {
    let mut modifiers = LineModifiers::none();

    if let Some(variant) = args.variant {
        modifiers = modifiers.with_variant(entry.find_variant(&variant)?);
    }
    let addons = args
        .addons
        .iter()
        .map(|id| entry.find_addon(id))
        .collect::<CliResult<Vec<_>>>()?;
    modifiers = modifiers.with_addons(addons);
    if let Some(notes) = args.notes {
        modifiers = modifiers.with_notes(notes);
    }

    Ok(modifiers)
}

/// One-line cart summary, printed after every change.
pub fn summary_line(cart: &CartSnapshot, config: &AppConfig) -> String {
    format!(
        "cart: {} items in {} lines, subtotal {}, selected {}",
        pricing::item_count(cart),
        cart.len(),
        config.format_currency(pricing::cart_subtotal(cart, SubtotalScope::All)),
        config.format_currency(pricing::cart_subtotal(cart, SubtotalScope::Selected)),
    )
}

const HELP: &str = "\
commands:
  catalog
  add <product> [qty] [variant|-] [addon,addon|-] [note...]
  qty <line> <n>        inc <line>        dec <line>
  edit <line> <qty> [variant|-] [addon,addon|-] [note...]
  rm <line>             clear
  toggle <line>         toggle-store <vendor>
  select-all on|off     rm-selected
  total [fee...]        show              quit
<line> is the number shown by `show` or a prefix of the line id";

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use satchel_core::CartKind;
    use satchel_db::MemoryStore;
    use satchel_persist::PersistConfig;

    fn shell(kind: CartKind) -> Shell<MemoryStore> {
        let facade = CartFacade::new(MemoryStore::new(), kind, &PersistConfig::default());
        Shell::new(facade, Catalog::demo(), AppConfig::default())
    }

    fn run(shell: &Shell<MemoryStore>, line: &str) -> CliResult<Reply> {
        let command = Command::parse(line)?.expect("non-empty line");
        shell.execute(command)
    }

    #[test]
    fn test_parse_add_with_everything() {
        let command = Command::parse("add P1 2 L egg,krp no chili please").unwrap();
        assert_eq!(
            command,
            Some(Command::Add {
                product: "P1".into(),
                quantity: 2,
                modifiers: ModifierArgs {
                    variant: Some("L".into()),
                    addons: vec!["egg".into(), "krp".into()],
                    notes: Some("no chili please".into()),
                },
            })
        );
    }

    #[test]
    fn test_parse_defaults_and_markers() {
        assert_eq!(
            Command::parse("add d1").unwrap(),
            Some(Command::Add {
                product: "d1".into(),
                quantity: 1,
                modifiers: ModifierArgs::default(),
            })
        );

        let Some(Command::Edit { modifiers, .. }) = Command::parse("edit 1 3 - lmn").unwrap() else {
            panic!("expected edit");
        };
        assert_eq!(modifiers.variant, None);
        assert_eq!(modifiers.addons, vec!["lmn".to_string()]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(Command::parse("   ").unwrap().is_none());
        assert!(matches!(Command::parse("qty 1"), Err(CliError::Usage(_))));
        assert!(matches!(Command::parse("qty 1 many"), Err(CliError::InvalidNumber(_))));
        assert!(matches!(Command::parse("select-all maybe"), Err(CliError::Usage(_))));
        assert!(matches!(Command::parse("checkout"), Err(CliError::UnknownCommand(_))));
    }

    #[test]
    fn test_parse_total_and_store() {
        assert_eq!(
            Command::parse("total 10000 1500").unwrap(),
            Some(Command::Total {
                fees: vec![Money::from_minor(10_000), Money::from_minor(1_500)],
            })
        );
        assert_eq!(
            Command::parse("toggle-store Warung Bu Sri").unwrap(),
            Some(Command::ToggleStore {
                vendor: "Warung Bu Sri".into()
            })
        );
    }

    #[tokio::test]
    async fn test_add_and_edit_through_catalog() {
        let shell = shell(CartKind::Marketplace);

        run(&shell, "add P1 2").unwrap();
        run(&shell, "add p1 1").unwrap();
        run(&shell, "add P1 1 L egg").unwrap();

        let cart = shell.facade().cart_items();
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.items()[0].quantity(), 3);
        assert_eq!(cart.items()[1].subtotal().minor(), 38_000);

        run(&shell, "edit 2 2 S - less oil").unwrap();
        let cart = shell.facade().cart_items();
        assert_eq!(cart.items()[1].subtotal().minor(), 40_000);
        assert_eq!(cart.items()[1].notes(), Some("less oil"));
    }

    #[tokio::test]
    async fn test_line_references() {
        let shell = shell(CartKind::Marketplace);
        run(&shell, "add P1").unwrap();
        run(&shell, "add D1").unwrap();

        let id = shell.facade().cart_items().items()[1].line_id().to_string();
        run(&shell, &format!("qty {} 4", &id[..8])).unwrap();
        assert_eq!(shell.facade().get_item_quantity("D1"), 4);

        run(&shell, "inc 1").unwrap();
        assert_eq!(shell.facade().get_item_quantity("P1"), 2);

        assert!(matches!(run(&shell, "rm 3"), Err(CliError::LineNotFound(_))));
        assert!(matches!(run(&shell, "rm 0"), Err(CliError::LineNotFound(_))));
        assert!(matches!(run(&shell, "rm zz"), Err(CliError::LineNotFound(_))));
        // The empty prefix matches every line
        assert!(matches!(
            shell.resolve_line(""),
            Err(CliError::AmbiguousLine(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_products_leave_cart_alone() {
        let shell = shell(CartKind::Marketplace);
        assert!(matches!(run(&shell, "add X9"), Err(CliError::UnknownProduct(_))));
        assert!(matches!(
            run(&shell, "add P1 1 XL"),
            Err(CliError::UnknownModifier { .. })
        ));
        assert!(shell.facade().cart_items().is_empty());
    }

    #[tokio::test]
    async fn test_unchanged_notice() {
        let shell = shell(CartKind::Marketplace);
        assert_eq!(
            run(&shell, "add P1 0").unwrap(),
            Reply::Text("(cart unchanged)".into())
        );
        assert_eq!(run(&shell, "add P1").unwrap(), Reply::Text(String::new()));
        assert_eq!(run(&shell, "quit").unwrap(), Reply::Quit);
    }

    #[tokio::test]
    async fn test_store_selection_and_total() {
        let shell = shell(CartKind::Marketplace);
        run(&shell, "add P1 2").unwrap();
        run(&shell, "add D1 1").unwrap();

        run(&shell, "toggle-store Kedai Segar").unwrap();
        let Reply::Text(total) = run(&shell, "total 10000").unwrap() else {
            panic!("expected text");
        };
        assert_eq!(total, "checkout 1 lines: subtotal Rp50000 + fees Rp10000 = Rp60000");

        run(&shell, "select-all on").unwrap();
        run(&shell, "rm-selected").unwrap();
        assert!(shell.facade().cart_items().is_empty());
    }

    #[tokio::test]
    async fn test_show_renders_groups() {
        let shell = shell(CartKind::Marketplace);
        assert_eq!(
            run(&shell, "show").unwrap(),
            Reply::Text("Cart is empty".into())
        );

        run(&shell, "add P1 1 L egg extra spicy").unwrap();
        run(&shell, "add D2").unwrap();
        run(&shell, "toggle 2").unwrap();

        let Reply::Text(text) = run(&shell, "show").unwrap() else {
            panic!("expected text");
        };
        assert!(text.contains("[x] Warung Bu Sri"));
        assert!(text.contains("[ ] Kedai Segar"));
        assert!(text.contains("1. Nasi Goreng (Large) +Fried egg  x1  Rp38000"));
        assert!(text.contains("note: extra spicy"));
        assert!(text.ends_with("cart: 2 items in 2 lines, subtotal Rp56000, selected Rp38000"));
    }

    #[tokio::test]
    async fn test_food_cart_has_no_checkboxes() {
        let shell = shell(CartKind::FoodOrder);
        run(&shell, "add P3 2 20").unwrap();

        assert_eq!(
            run(&shell, "toggle 1").unwrap(),
            Reply::Text("(cart unchanged)".into())
        );
        let Reply::Text(text) = run(&shell, "show").unwrap() else {
            panic!("expected text");
        };
        assert!(!text.contains("[x]"));
        assert!(text.contains("1. Sate Ayam (20 skewers)  x2  Rp110000"));
    }
}
