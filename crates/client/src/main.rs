//! Storefront - terminal front end
//!
//! Browses the catalog, signs in, and joins the live chat against the backend
//! named by `STOREFRONT_API_URL`.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use storefront_client::{
    logging, AppContext, ClientConfig, FileStore, MemoryStore, SharedStore,
};
use storefront_shared::{Category, PageRequest, Product, ProductId};
use tokio::io::{AsyncBufReadExt, BufReader};

const USAGE: &str = "\
usage: storefront <command>

commands:
  products [CATEGORY] [PAGE]   list a page of products, optionally one category (home, office)
  product ID                   show one product
  search QUERY                 search the first page by description
  login PHONE PASSWORD         sign in and keep the session
  logout                       forget the session
  dark-mode                    toggle the dark mode preference
  chat                         join the live chat, one message per line";

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        println!("{USAGE}");
        return Ok(());
    };

    let config = ClientConfig::from_env();
    tracing::debug!(api_url = %config.api_url, "configuration loaded");
    let app = AppContext::new(config.clone(), open_storage(&config), || {
        eprintln!("Session expired, please log in again.");
    });

    match (command.as_str(), rest) {
        ("products", rest) => list_products(&app, rest).await,
        ("product", [id]) => {
            let id: ProductId = id.parse().with_context(|| format!("invalid product id {id:?}"))?;
            let product = app
                .fetch_product(id)
                .await
                .map_err(|e| anyhow!(e.message_or("Product not found")))?;
            print_product(&product);
            Ok(())
        }
        ("search", query) if !query.is_empty() => {
            let query = query.join(" ");
            app.fetch_products(config.first_page())
                .await
                .map_err(|e| anyhow!(e.message_or("Failed to fetch products")))?;
            let state = app.products().snapshot();
            let hits = state.search(&query);
            if hits.is_empty() {
                println!("No products match {query:?}.");
            }
            for product in hits {
                print_product(product);
            }
            Ok(())
        }
        ("login", [phone, password]) => {
            app.login(phone, password)
                .await
                .map_err(|e| anyhow!(e.message_or("Login failed")))?;
            println!("Logged in.");
            Ok(())
        }
        ("logout", []) => {
            app.logout();
            println!("Logged out.");
            Ok(())
        }
        ("dark-mode", []) => {
            let enabled = app.preferences().toggle_dark_mode();
            println!("Dark mode {}.", if enabled { "on" } else { "off" });
            Ok(())
        }
        ("chat", []) => chat(&app).await,
        _ => bail!("unrecognized command\n\n{USAGE}"),
    }
}

fn open_storage(config: &ClientConfig) -> SharedStore {
    let store = match &config.data_dir {
        Some(dir) => FileStore::with_dir(dir),
        None => FileStore::new(),
    };
    match store {
        Some(store) => {
            tracing::debug!(dir = %store.dir().display(), "using file storage");
            Arc::new(store)
        }
        None => {
            tracing::warn!("no usable storage directory, session will not be kept");
            MemoryStore::shared()
        }
    }
}

async fn list_products(app: &AppContext, args: &[String]) -> Result<()> {
    let mut category = None;
    let mut page = 0;
    for arg in args {
        if let Ok(c) = arg.parse::<Category>() {
            category = Some(c);
        } else {
            page = arg
                .parse()
                .with_context(|| format!("expected a category or page number, got {arg:?}"))?;
        }
    }

    let request = PageRequest::new(page, app.config().page_size);
    let result = match category {
        Some(category) => app
            .fetch_products_by_category(category, request)
            .await
            .map_err(|e| anyhow!(e.message_or("Failed to fetch products by category"))),
        None => app
            .fetch_products(request)
            .await
            .map_err(|e| anyhow!(e.message_or("Failed to fetch products"))),
    };
    result?;

    let state = app.products().snapshot();
    let catalog = state.catalog();
    for product in &catalog.products {
        print_product(product);
    }
    println!(
        "page {} of {} ({} products)",
        catalog.current_page + 1,
        catalog.total_pages.max(1),
        catalog.total_elements
    );
    Ok(())
}

fn print_product(product: &Product) {
    println!(
        "#{:<5} {:<40} {:>10.2}  {:<6} {:<9} {:<9} {}",
        product.id,
        product.description,
        product.price,
        product.category,
        format!("{:?}", product.status).to_uppercase(),
        product.condition.as_str(),
        product.location,
    );
}

async fn chat(app: &AppContext) -> Result<()> {
    let subscription = app.open_chat();
    println!(
        "Joined chat as {}. Type a message and press enter, Ctrl-D to leave.",
        app.chat_sender()
    );

    let mut updates = app.chat().subscribe();
    let printer = tokio::spawn(async move {
        let mut shown = 0;
        while updates.changed().await.is_ok() {
            let fresh: Vec<_> = updates.borrow_and_update().messages()[shown..].to_vec();
            shown += fresh.len();
            for message in fresh {
                println!("[{}] {}", message.sender, message.content);
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        if let Err(e) = app.send_chat(&line) {
            eprintln!("Not sent: {e}");
        }
    }

    drop(subscription);
    printer.abort();
    Ok(())
}
