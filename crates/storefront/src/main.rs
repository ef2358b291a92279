//! Storefront CLI entry point.

use std::process;

use cart::EventSnapshot;
use checkout::ContactForm;
use clap::{Args, Parser, Subcommand};
use common::{CartItemId, OrderId};
use rust_decimal::Decimal;
use storefront::{AddToCart, Config, Storefront, StorefrontError, telemetry};

#[derive(Debug, Parser)]
#[command(name = "storefront", about = "Ticket storefront", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Inspect or change the cart
    Cart(CartCommand),
    /// Convert the cart into an order and a payment session
    Checkout(CheckoutArgs),
    /// Watch an order until payment is confirmed
    Track(TrackArgs),
}

#[derive(Debug, Args)]
struct CartCommand {
    #[command(subcommand)]
    command: CartSubcommand,
}

#[derive(Debug, Subcommand)]
enum CartSubcommand {
    List,
    Add(AddArgs),
    Remove {
        /// Composite `<event_id>-<category_id>` id
        id: CartItemId,
    },
    Clear,
}

#[derive(Debug, Args)]
struct AddArgs {
    #[arg(long)]
    event_id: u64,
    #[arg(long)]
    category_id: u64,
    #[arg(long, default_value_t = 1)]
    quantity: u32,
    /// Remaining seats in the category
    #[arg(long)]
    seats_left: Option<u32>,
    /// Display price per ticket
    #[arg(long)]
    price: Decimal,
    #[arg(long)]
    event_title: String,
    #[arg(long)]
    category_name: String,
    #[arg(long, default_value = "")]
    venue: String,
    #[arg(long, default_value = "")]
    date: String,
    #[arg(long, default_value = "")]
    month: String,
    #[arg(long, default_value = "")]
    day: String,
    #[arg(long, default_value = "")]
    time: String,
}

#[derive(Debug, Args)]
struct CheckoutArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    /// Phone number including country code
    #[arg(long)]
    phone: String,
    #[arg(long, default_value = "")]
    comments: String,
    /// Agree to the terms and conditions
    #[arg(long)]
    agree: bool,
}

#[derive(Debug, Args)]
struct TrackArgs {
    order_id: OrderId,
}

#[tokio::main]
pub async fn main() {
    _ = dotenvy::dotenv();

    let config = Config::from_env().unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });
    telemetry::init(&config);

    let cli = Cli::parse();
    let storefront = Storefront::open(config);

    if let Err(error) = run(&storefront, cli).await {
        eprintln!("{error}");
        process::exit(1);
    }
}

async fn run(storefront: &Storefront, cli: Cli) -> Result<(), StorefrontError> {
    match cli.command {
        Commands::Cart(CartCommand { command }) => match command {
            CartSubcommand::List => list_cart(storefront),
            CartSubcommand::Add(args) => {
                let id = storefront.add_to_cart(AddToCart {
                    event_id: args.event_id,
                    category_id: args.category_id,
                    quantity: args.quantity,
                    seats_left: args.seats_left,
                    snapshot: EventSnapshot {
                        event_title: args.event_title,
                        category_name: args.category_name,
                        price: args.price,
                        venue: args.venue,
                        event_date: args.date,
                        event_month: args.month,
                        event_day: args.day,
                        event_time: args.time,
                    },
                })?;
                println!("Added {id}");
                list_cart(storefront);
            }
            CartSubcommand::Remove { id } => {
                if storefront.remove_from_cart(id) {
                    println!("Removed {id}");
                } else {
                    println!("{id} is not in the cart");
                }
            }
            CartSubcommand::Clear => {
                storefront.clear_cart();
                println!("Cart cleared");
            }
        },
        Commands::Checkout(args) => {
            let form = ContactForm {
                name: args.name,
                email: args.email,
                phone: args.phone,
                comments: args.comments,
                agree: args.agree,
            };
            let redirect = storefront.checkout(&form).await?;
            match &redirect.order_number {
                Some(number) => println!("Order {number} ({}) created", redirect.order_id),
                None => println!("Order {} created", redirect.order_id),
            }
            println!("Continue to payment: {}", redirect.checkout_url);
        }
        Commands::Track(TrackArgs { order_id }) => {
            let report = storefront.track(order_id).await?;
            println!(
                "Order {}: {} ({} tickets, total {})",
                report.order.order_number,
                report.status.label(),
                report.order.total_tickets,
                report.order.total_amount
            );
            if report.tracked {
                println!("Purchase recorded");
            }
        }
    }
    Ok(())
}

fn list_cart(storefront: &Storefront) {
    let cart = storefront.cart();
    if cart.is_empty() {
        println!("Your cart is empty");
        return;
    }
    for item in cart.items() {
        println!(
            "{:<8} {} / {}  {} x {} = {}",
            item.id.to_string(),
            item.event_title,
            item.category_name,
            item.quantity,
            item.price,
            item.line_total()
        );
    }
    println!(
        "{} tickets, total {}",
        cart.total_item_count(),
        cart.total_value()
    );
}
