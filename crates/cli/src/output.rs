//! Terminal rendering of command results.
//!
//! Results go to stdout; logs go to stderr.

#![allow(clippy::print_stdout)]

use shopfront_client::api::{Order, Page, Product};
use shopfront_client::cart::{CartLine, SyncOutcome};
use shopfront_core::Price;

pub fn products(products: &[Product]) {
    if products.is_empty() {
        println!("No products found.");
        return;
    }
    for product in products {
        let stock = if product.active && product.inventory > 0 {
            format!("{} in stock", product.inventory)
        } else {
            "out of stock".to_string()
        };
        println!("{:<24} {:<32} {:>10}  {stock}", product.id, product.name, product.price);
    }
}

pub fn product(product: &Product) {
    println!("{}", product.name);
    println!("  id:        {}", product.id);
    println!("  price:     {}", product.price);
    println!("  inventory: {}", product.inventory);
    if !product.category_id.as_str().is_empty() {
        println!("  category:  {}", product.category_id);
    }
    if let Some(url) = &product.image_url {
        println!("  image:     {url}");
    }
    if !product.description.is_empty() {
        println!();
        println!("{}", product.description);
    }
}

pub fn cart(lines: &[CartLine], total: Price, units: u64) {
    if lines.is_empty() {
        println!("Your cart is empty.");
        return;
    }
    for line in lines {
        println!(
            "{:<24} {:<32} {:>4} x {:>10} = {:>10}",
            line.product_id(),
            line.product().name,
            line.quantity(),
            line.product().price,
            line.line_total()
        );
    }
    println!("{units} item(s), total {total}");
}

pub fn outcome(outcome: SyncOutcome) {
    match outcome {
        SyncOutcome::Local => println!("Cart updated."),
        SyncOutcome::Unchanged => println!("Nothing to change."),
        SyncOutcome::Reconciled(report) if report.degraded > 0 => println!(
            "Cart synced ({} line(s), {} without catalog details).",
            report.lines, report.degraded
        ),
        SyncOutcome::Reconciled(report) => println!("Cart synced ({} line(s)).", report.lines),
        SyncOutcome::Discarded => println!("Cart was cleared during sync."),
    }
}

pub fn order(order: &Order) {
    println!(
        "Order {} ({}) placed {}, total {}",
        order.id,
        order.status,
        order.created_at.format("%Y-%m-%d %H:%M"),
        order.total_price
    );
    for item in &order.order_items {
        println!(
            "  {:>4} x {:<32} {:>10}",
            item.quantity, item.product.name, item.price_at_purchase
        );
    }
}

pub fn orders(page: &Page<Order>) {
    if page.content.is_empty() {
        println!("No orders yet.");
        return;
    }
    for order in &page.content {
        self::order(order);
        if order.status.awaiting_payment() {
            println!("  pay with: shopfront pay {}", order.id);
        }
    }
    println!(
        "Page {} of {} ({} order(s))",
        page.number + 1,
        page.total_pages.max(1),
        page.total_elements
    );
}

pub fn message(text: &str) {
    println!("{text}");
}
