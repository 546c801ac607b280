use crate::client::{ApiClient, RequestOptions};
use crate::prelude::{eprintln, println, *};
use chrono::NaiveDate;
use colored::Colorize;
use serde::Serialize;
use serde_json::Value;

use libraryhub_core::books::{
    add_book_path, borrow_status, category_path, details_path, display_date, has_more,
    keyword_search_path, related_books_path, related_comments_path, transform_book_detail,
    transform_comment, RELATED_PAGE_SIZE, REVIEWS_PAGE_SIZE,
};
pub use libraryhub_core::books::{
    ApiComment, ApiRelatedBook, BookDetail, BookDetailResponse, BookReview, BookSummary,
    BorrowRecord, BorrowStatus, NewReviewRequest, OverdueRecord, RatingSummary, Recommendation,
};

/// Book catalogue, borrowing and review commands
#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Search books by keyword
    #[clap(name = "search")]
    Search(SearchOptions),

    /// Popular books
    #[clap(name = "hot")]
    Hot(ListOptions),

    /// Books in a category
    #[clap(name = "category")]
    Category(CategoryOptions),

    /// Full details of a book
    #[clap(name = "details")]
    Details(BookOptions),

    /// Your borrowing history
    #[clap(name = "borrowed")]
    Borrowed(ListOptions),

    /// Overdue loans across all users (administrators)
    #[clap(name = "overdue")]
    Overdue(ListOptions),

    /// Recommended books for the home page
    #[clap(name = "recommendations")]
    Recommendations(ListOptions),

    /// A page of reviews for a book
    #[clap(name = "comments")]
    Comments(PageOptions),

    /// A page of books related to a book
    #[clap(name = "related")]
    Related(PageOptions),

    /// Review a book
    #[clap(name = "review")]
    Review(ReviewOptions),

    /// Add a book to the catalogue by ISBN (administrators)
    #[clap(name = "add")]
    Add(AddOptions),
}

#[derive(Debug, clap::Args, Clone)]
pub struct SearchOptions {
    pub query: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct CategoryOptions {
    /// Category name, e.g. "文学"
    pub category: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
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

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct PageOptions {
    pub book_id: i64,

    /// Page number (1-indexed)
    #[arg(short, long, default_value = "1")]
    pub page: u32,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct ReviewOptions {
    pub book_id: i64,

    /// Stars, 1 to 5
    #[arg(short, long)]
    pub rating: u8,

    #[arg(short, long)]
    pub content: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct AddOptions {
    pub isbn: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// A borrow record with its status on a given day
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct BorrowedBook {
    #[serde(flatten)]
    pub record: BorrowRecord,
    pub status: BorrowStatus,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ReviewPage {
    pub page: u32,
    pub reviews: Vec<BookReview>,
    pub has_more: bool,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RelatedPage {
    pub page: u32,
    pub books: Vec<ApiRelatedBook>,
    pub has_more: bool,
}

// --- Data functions ---

async fn list<T: serde::de::DeserializeOwned>(client: &ApiClient, path: &str) -> Result<Vec<T>> {
    let items: Option<Vec<T>> = client.get(path, &RequestOptions::new()).await?;
    Ok(items.unwrap_or_default())
}

pub async fn search_data(client: &ApiClient, query: &str) -> Result<Vec<BookSummary>> {
    let query = query.trim();
    if query.is_empty() {
        return Err(eyre!("Search query cannot be empty"));
    }
    list(client, &keyword_search_path(query)).await
}

pub async fn hot_data(client: &ApiClient) -> Result<Vec<BookSummary>> {
    list(client, "/books/search/hot").await
}

pub async fn category_data(client: &ApiClient, category: &str) -> Result<Vec<BookSummary>> {
    list(client, &category_path(category.trim())).await
}

pub async fn details_data(client: &ApiClient, book_id: i64) -> Result<BookDetail> {
    let response: BookDetailResponse = client
        .get(&details_path(book_id), &RequestOptions::new())
        .await?
        .ok_or_else(|| eyre!("Book {book_id} not found"))?;

    Ok(transform_book_detail(response))
}

/// Borrowing history, each record classified against `today`.
pub async fn borrowed_data(client: &ApiClient, today: NaiveDate) -> Result<Vec<BorrowedBook>> {
    let records: Vec<BorrowRecord> = list(client, "/books/myBorrowRecords").await?;

    Ok(records
        .into_iter()
        .map(|record| {
            let status = borrow_status(&record, today);
            BorrowedBook { record, status }
        })
        .collect())
}

pub async fn overdue_data(client: &ApiClient) -> Result<Vec<OverdueRecord>> {
    list(client, "/books/search/overdue").await
}

pub async fn recommendations_data(client: &ApiClient) -> Result<Vec<Recommendation>> {
    list(client, "/books/recommendations/").await
}

pub async fn comments_data(client: &ApiClient, book_id: i64, page: u32) -> Result<ReviewPage> {
    let comments: Vec<ApiComment> = list(
        client,
        &related_comments_path(book_id, page, REVIEWS_PAGE_SIZE),
    )
    .await?;

    Ok(ReviewPage {
        page,
        has_more: has_more(comments.len(), REVIEWS_PAGE_SIZE),
        reviews: comments.into_iter().map(transform_comment).collect(),
    })
}

pub async fn related_data(client: &ApiClient, book_id: i64, page: u32) -> Result<RelatedPage> {
    let books: Vec<ApiRelatedBook> = list(
        client,
        &related_books_path(book_id, page, RELATED_PAGE_SIZE),
    )
    .await?;

    Ok(RelatedPage {
        page,
        has_more: has_more(books.len(), RELATED_PAGE_SIZE),
        books,
    })
}

/// Post a review and return the book's rating summary with it counted.
pub async fn review_data(client: &ApiClient, request: &NewReviewRequest) -> Result<RatingSummary> {
    request.validate().map_err(|e| eyre!(e))?;

    let current = details_data(client, request.book_id).await?.rating;
    client
        .post::<Value, _>("/books/newComment/top", request, &RequestOptions::new())
        .await?;

    Ok(current.with_review(request.rating))
}

pub async fn add_data(client: &ApiClient, isbn: &str) -> Result<Option<Value>> {
    if isbn.trim().is_empty() {
        return Err(eyre!("ISBN cannot be empty"));
    }
    Ok(client
        .post(&add_book_path(isbn), &serde_json::json!({}), &RequestOptions::new())
        .await?)
}

// --- CLI handlers ---

fn print_summaries(books: &[BookSummary]) {
    if books.is_empty() {
        println!("No books found.");
        return;
    }

    let mut table = new_table(&["ID", "Title", "Author", "Publisher", "Published"]);
    for book in books {
        table.add_row(prettytable::row![
            book.id.to_string().green(),
            book.title.bright_white(),
            book.author,
            book.publisher.as_deref().unwrap_or("N/A"),
            display_date(book.published_date.as_deref())
        ]);
    }
    table.printstd();
}

fn print_rating(rating: &RatingSummary) {
    println!(
        "{} {:.1} ({} ratings)",
        "Rating:".bold(),
        rating.average,
        rating.count
    );
    for (stars, bucket) in rating.distribution.iter().enumerate().rev() {
        println!(
            "  {} {:>3}%",
            "★".repeat(stars + 1).yellow(),
            rating.percentage(*bucket)
        );
    }
}

fn print_reviews(reviews: &[BookReview]) {
    for review in reviews {
        println!(
            "{} {} {}",
            review.user_name.bright_white().bold(),
            "★".repeat(review.rating as usize).yellow(),
            display_date(review.comment_date.as_deref()).bright_black()
        );
        println!("  {}", review.comment_text);
    }
}

fn print_detail(book: &BookDetail) {
    println!("{}", book.title.bright_white().bold());
    println!("{} {}", "by".bright_black(), book.author);
    println!();

    let mut table = new_table(&["Field", "Value"]);
    table.add_row(prettytable::row!["ISBN", book.isbn]);
    table.add_row(prettytable::row!["Publisher", book.publisher]);
    table.add_row(prettytable::row!["Published", display_date(book.published_date.as_deref())]);
    table.add_row(prettytable::row!["Category", book.category]);
    table.add_row(prettytable::row!["Call number", book.call_number.as_deref().unwrap_or("N/A")]);
    table.add_row(prettytable::row!["Location", book.location.as_deref().unwrap_or("N/A")]);
    table.add_row(prettytable::row!["Copies", book.copies.len()]);
    table.printstd();

    if !book.description.is_empty() {
        println!("\n{}", book.description);
    }

    println!();
    print_rating(&book.rating);

    if !book.reviews.is_empty() {
        println!("\n{}", "Reviews".bold().cyan());
        print_reviews(&book.reviews);
        if book.has_more_reviews {
            println!("{}", "  more: `libraryhub books comments <id> --page 2`".bright_black());
        }
    }

    if !book.recommendations.is_empty() {
        println!("\n{}", "Related".bold().cyan());
        for rec in &book.recommendations {
            println!("  [{}] {} - {}", rec.id.to_string().green(), rec.title, rec.author);
        }
    }
}

async fn borrowed_handler(client: &ApiClient, options: ListOptions) -> Result<()> {
    let today = chrono::Local::now().date_naive();
    let books = borrowed_data(client, today).await?;

    if options.json {
        return print_json(&books);
    }
    if books.is_empty() {
        println!("No borrowing records.");
        return Ok(());
    }

    let mut table = new_table(&["ID", "Title", "Author", "Borrowed", "Due", "Status"]);
    for book in &books {
        let status = match &book.status {
            BorrowStatus::Returned(_) => book.status.to_string().green(),
            BorrowStatus::Overdue => book.status.to_string().red().bold(),
            BorrowStatus::Borrowed => book.status.to_string().yellow(),
            BorrowStatus::InvalidDate => book.status.to_string().bright_black(),
        };
        table.add_row(prettytable::row![
            book.record.id,
            book.record.title.bright_white(),
            book.record.author,
            display_date(Some(&book.record.create_time)),
            display_date(Some(&book.record.due_date)),
            status
        ]);
    }
    table.printstd();
    Ok(())
}

async fn overdue_handler(client: &ApiClient, options: ListOptions) -> Result<()> {
    let records = overdue_data(client).await?;

    if options.json {
        return print_json(&records);
    }
    if records.is_empty() {
        println!("No overdue loans.");
        return Ok(());
    }

    let mut table = new_table(&["ID", "User", "Email", "Book", "Barcode", "Borrowed", "Due"]);
    for record in &records {
        table.add_row(prettytable::row![
            record.id,
            record.user.username.bright_white(),
            record.user.email.as_deref().unwrap_or("N/A"),
            record.book.title,
            record.book.barcode,
            display_date(Some(&record.borrow_date)),
            display_date(Some(&record.due_date)).red()
        ]);
    }
    table.printstd();
    Ok(())
}

async fn recommendations_handler(client: &ApiClient, options: ListOptions) -> Result<()> {
    let recs = recommendations_data(client).await?;

    if options.json {
        return print_json(&recs);
    }
    if recs.is_empty() {
        println!("No recommendations.");
        return Ok(());
    }

    let mut table = new_table(&["Book", "Title", "Author", "Why"]);
    for rec in &recs {
        table.add_row(prettytable::row![
            rec.target_book_id().to_string().green(),
            rec.title.bright_white(),
            rec.author,
            rec.description.as_deref().unwrap_or("")
        ]);
    }
    table.printstd();
    Ok(())
}

/// Run book commands
pub async fn run(cmd: Commands, client: &ApiClient, global: &crate::Global) -> Result<()> {
    if global.verbose {
        eprintln!("Running books command against {}...", client.base_url());
    }

    match cmd {
        Commands::Search(options) => {
            let books = search_data(client, &options.query).await?;
            if options.json {
                print_json(&books)?;
            } else {
                println!("Found {} book(s) for {:?}:\n", books.len(), options.query);
                print_summaries(&books);
            }
        }
        Commands::Hot(options) => {
            let books = hot_data(client).await?;
            if options.json {
                print_json(&books)?;
            } else {
                print_summaries(&books);
            }
        }
        Commands::Category(options) => {
            let books = category_data(client, &options.category).await?;
            if options.json {
                print_json(&books)?;
            } else {
                println!("{} {}\n", "Category:".bold(), options.category);
                print_summaries(&books);
            }
        }
        Commands::Details(options) => {
            let book = details_data(client, options.book_id).await?;
            if options.json {
                print_json(&book)?;
            } else {
                print_detail(&book);
            }
        }
        Commands::Borrowed(options) => borrowed_handler(client, options).await?,
        Commands::Overdue(options) => overdue_handler(client, options).await?,
        Commands::Recommendations(options) => recommendations_handler(client, options).await?,
        Commands::Comments(options) => {
            let page = comments_data(client, options.book_id, options.page).await?;
            if options.json {
                print_json(&page)?;
            } else if page.reviews.is_empty() {
                println!("No reviews on page {}.", page.page);
            } else {
                print_reviews(&page.reviews);
                if page.has_more {
                    println!("{}", format!("  next: --page {}", page.page + 1).bright_black());
                }
            }
        }
        Commands::Related(options) => {
            let page = related_data(client, options.book_id, options.page).await?;
            if options.json {
                print_json(&page)?;
            } else if page.books.is_empty() {
                println!("No related books on page {}.", page.page);
            } else {
                let mut table = new_table(&["ID", "Title", "Author"]);
                for book in &page.books {
                    table.add_row(prettytable::row![book.id.to_string().green(), book.title, book.author]);
                }
                table.printstd();
                if page.has_more {
                    println!("{}", format!("  next: --page {}", page.page + 1).bright_black());
                }
            }
        }
        Commands::Review(options) => {
            let request = NewReviewRequest {
                book_id: options.book_id,
                rating: options.rating,
                content: options.content,
            };
            let rating = review_data(client, &request).await?;
            if options.json {
                print_json(&rating)?;
            } else {
                println!("{}", "Review posted.".green().bold());
                print_rating(&rating);
            }
        }
        Commands::Add(options) => {
            let added = add_data(client, &options.isbn).await?;
            if options.json {
                print_json(&added)?;
            } else {
                println!("{} {}", "Added ISBN".green().bold(), options.isbn.trim());
            }
        }
    }

    Ok(())
}
