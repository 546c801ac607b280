use crate::client::{ApiClient, RequestOptions};
use crate::prelude::{eprintln, println, *};
use colored::Colorize;
use libraryhub_core::books::display_date;
use serde_json::Value;

pub use libraryhub_core::books::FavoriteBook;

/// Favorite book commands
#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// List your favorite books
    #[clap(name = "list")]
    List(ListOptions),

    /// Add a book to your favorites
    #[clap(name = "add")]
    Add(BookOptions),

    /// Remove a book from your favorites
    #[clap(name = "remove")]
    Remove(BookOptions),
}

#[derive(Debug, clap::Args, Clone)]
pub struct ListOptions {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct BookOptions {
    pub book_id: i64,
}

pub async fn list_data(client: &ApiClient) -> Result<Vec<FavoriteBook>> {
    let books: Option<Vec<FavoriteBook>> = client
        .get("/book/collections/list", &RequestOptions::new())
        .await?;
    Ok(books.unwrap_or_default())
}

pub async fn add_data(client: &ApiClient, book_id: i64) -> Result<()> {
    client
        .post::<Value, _>(
            &format!("/book/collections/add/{book_id}"),
            &serde_json::json!({}),
            &RequestOptions::new(),
        )
        .await?;
    Ok(())
}

pub async fn remove_data(client: &ApiClient, book_id: i64) -> Result<()> {
    client
        .delete::<Value>(&format!("/book/collections/remove/{book_id}"), &RequestOptions::new())
        .await?;
    Ok(())
}

async fn list_handler(client: &ApiClient, options: ListOptions) -> Result<()> {
    let books = list_data(client).await?;

    if options.json {
        return print_json(&books);
    }
    if books.is_empty() {
        println!("No favorites yet.");
        return Ok(());
    }

    let mut table = new_table(&["ID", "Title", "Author", "Published"]);
    for book in &books {
        table.add_row(prettytable::row![
            book.id.to_string().green(),
            book.title.bright_white(),
            book.author,
            display_date(book.published_date.as_deref())
        ]);
    }
    table.printstd();
    Ok(())
}

/// Run favorites commands
pub async fn run(cmd: Commands, client: &ApiClient, global: &crate::Global) -> Result<()> {
    if global.verbose {
        eprintln!("Running favorites command against {}...", client.base_url());
    }

    match cmd {
        Commands::List(options) => list_handler(client, options).await,
        Commands::Add(options) => {
            add_data(client, options.book_id).await?;
            println!("{} {}", "Added to favorites:".green().bold(), options.book_id);
            Ok(())
        }
        Commands::Remove(options) => {
            remove_data(client, options.book_id).await?;
            println!("{} {}", "Removed from favorites:".yellow().bold(), options.book_id);
            Ok(())
        }
    }
}
