//! Pure transformation functions for book, borrowing, review and favorite data
//!
//! This module contains zero I/O operations and is fully testable with fixture data.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Avatar shown for reviewers without one.
pub const DEFAULT_AVATAR: &str = "/avatar.png";

/// Reviews fetched per page on the detail view.
pub const REVIEWS_PAGE_SIZE: u32 = 5;

/// Related books fetched per page on the detail view.
pub const RELATED_PAGE_SIZE: u32 = 3;

// ============================================================================
// Domain Models (Input from API)
// ============================================================================

/// A book as it appears in search, category, ranking and favorite lists
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookSummary {
    pub id: i64,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub cover: Option<String>,
}

/// Entries of `GET /book/collections/list`
pub type FavoriteBook = BookSummary;

/// Home page recommendation from `GET /books/recommendations/`
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub id: i64,
    #[serde(default)]
    pub book_id: Option<i64>,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub cover: Option<String>,
}

impl Recommendation {
    /// The book this recommendation points at.
    pub fn target_book_id(&self) -> i64 {
        self.book_id.unwrap_or(self.id)
    }
}

/// Response of `GET /books/search/details`
#[derive(Debug, Deserialize, Clone)]
pub struct BookDetailResponse {
    pub book: ApiBookDetail,
    #[serde(default)]
    pub copies: Vec<ApiCopy>,
    #[serde(default)]
    pub comments: Vec<ApiComment>,
    #[serde(default)]
    pub recommendations: Vec<ApiRelatedBook>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ApiBookDetail {
    pub id: i64,
    #[serde(default)]
    pub isbn: String,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cover: String,
    #[serde(default)]
    pub call_number: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub edition: Option<String>,
    #[serde(default)]
    pub pages: Option<u32>,
    #[serde(default)]
    pub rating_distribution: Vec<u32>,
    #[serde(default)]
    pub rating_avg: f64,
    #[serde(default)]
    pub rating_count: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ApiCopy {
    pub id: i64,
    pub barcode: String,
}

/// A review as sent by `/books/search/details` and `/books/relatedComments`
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ApiComment {
    pub id: i64,
    #[serde(default)]
    pub avatar: Option<String>,
    pub username: String,
    pub content: String,
    #[serde(default)]
    pub update_time: Option<String>,
    pub rating: u8,
}

/// A related book as sent by `/books/search/details` and `/books/relatedBooks`
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ApiRelatedBook {
    pub id: i64,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub cover: Option<String>,
}

/// Entries of `GET /books/myBorrowRecords`
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRecord {
    pub id: i64,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub cover: Option<String>,
    /// Borrow date
    pub create_time: String,
    #[serde(default)]
    pub return_date: Option<String>,
    pub due_date: String,
}

/// Entries of `GET /books/search/overdue` (admin only)
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OverdueRecord {
    pub id: i64,
    pub user: OverdueUser,
    pub book: OverdueBook,
    pub borrow_date: String,
    pub due_date: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct OverdueUser {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OverdueBook {
    pub id: i64,
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub published_date: Option<String>,
    #[serde(default)]
    pub cover: Option<String>,
    pub barcode: String,
}

// ============================================================================
// Request Bodies (Output to API)
// ============================================================================

/// Body of `POST /books/newComment/top`
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewReviewRequest {
    pub book_id: i64,
    pub rating: u8,
    pub content: String,
}

impl NewReviewRequest {
    /// A review needs a 1-5 rating and some text.
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=5).contains(&self.rating) {
            return Err(format!("Rating must be between 1 and 5, got {}", self.rating));
        }
        if self.content.trim().is_empty() {
            return Err("Review content cannot be empty".to_string());
        }
        Ok(())
    }
}

// ============================================================================
// Output Models (Domain Model)
// ============================================================================

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct BookReview {
    pub id: i64,
    pub user_avatar: String,
    pub user_name: String,
    pub rating: u8,
    pub comment_text: String,
    pub comment_date: Option<String>,
}

/// Star-rating histogram plus its derived average
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct RatingSummary {
    /// Counts for 1 to 5 stars, always five entries
    pub distribution: Vec<u32>,
    pub average: f64,
    pub count: u32,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct BookDetail {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub description: String,
    pub cover: String,
    pub publisher: String,
    pub published_date: Option<String>,
    pub category: String,
    pub isbn: String,
    pub call_number: Option<String>,
    pub location: Option<String>,
    pub price: Option<f64>,
    pub edition: Option<String>,
    pub pages: Option<u32>,
    pub rating: RatingSummary,
    pub copies: Vec<ApiCopy>,
    pub reviews: Vec<BookReview>,
    pub recommendations: Vec<ApiRelatedBook>,
    pub has_more_reviews: bool,
    pub has_more_recommendations: bool,
}

/// Where a borrowed book stands relative to today
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(tag = "status", content = "date", rename_all = "snake_case")]
pub enum BorrowStatus {
    Returned(String),
    Overdue,
    Borrowed,
    InvalidDate,
}

impl std::fmt::Display for BorrowStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BorrowStatus::Returned(date) => write!(f, "Returned on {date}"),
            BorrowStatus::Overdue => write!(f, "Overdue"),
            BorrowStatus::Borrowed => write!(f, "Not returned"),
            BorrowStatus::InvalidDate => write!(f, "Invalid date"),
        }
    }
}

// ============================================================================
// Pure Helper Functions
// ============================================================================

/// Parse the date part of a backend timestamp.
///
/// Accepts RFC 3339 (`2024-05-01T08:00:00Z`), naive date-times with `T` or a
/// space, and plain `YYYY-MM-DD`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// `YYYY-MM-DD` for display; the raw value when unparseable, `N/A` when absent.
pub fn display_date(value: Option<&str>) -> String {
    match value {
        None => "N/A".to_string(),
        Some(raw) => parse_date(raw)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| raw.to_string()),
    }
}

/// Whether a page of `page_len` items suggests another page exists.
pub fn has_more(page_len: usize, page_size: u32) -> bool {
    page_len >= page_size as usize
}

// ============================================================================
// Pure Transformation Functions
// ============================================================================

impl RatingSummary {
    /// Normalise the backend's histogram to exactly five buckets.
    pub fn new(distribution: &[u32], average: f64, count: u32) -> Self {
        let mut buckets = vec![0; 5];
        for (slot, value) in buckets.iter_mut().zip(distribution) {
            *slot = *value;
        }
        RatingSummary {
            distribution: buckets,
            average,
            count,
        }
    }

    /// Summary after one more review with `rating` stars.
    ///
    /// Ratings outside 1-5 still count towards the total but land in no
    /// bucket.
    pub fn with_review(&self, rating: u8) -> Self {
        let mut distribution = self.distribution.clone();
        if (1..=5).contains(&rating) {
            if let Some(bucket) = distribution.get_mut(rating as usize - 1) {
                *bucket += 1;
            }
        }
        let count = self.count + 1;
        let total: u32 = distribution
            .iter()
            .enumerate()
            .map(|(i, c)| (i as u32 + 1) * c)
            .sum();

        RatingSummary {
            distribution,
            average: f64::from(total) / f64::from(count),
            count,
        }
    }

    /// Share of reviews in `bucket_count`, rounded to a whole percent.
    pub fn percentage(&self, bucket_count: u32) -> u32 {
        if self.count == 0 {
            return 0;
        }
        (f64::from(bucket_count) / f64::from(self.count) * 100.0).round() as u32
    }
}

/// Convert a wire comment into a review for display.
pub fn transform_comment(comment: ApiComment) -> BookReview {
    BookReview {
        id: comment.id,
        user_avatar: comment
            .avatar
            .filter(|a| !a.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_AVATAR.to_string()),
        user_name: comment.username,
        rating: comment.rating,
        comment_text: comment.content,
        comment_date: comment.update_time,
    }
}

/// Pure transformation: Convert the book detail bundle into the domain model
pub fn transform_book_detail(response: BookDetailResponse) -> BookDetail {
    let book = response.book;
    let has_more_reviews = has_more(response.comments.len(), REVIEWS_PAGE_SIZE);
    let has_more_recommendations = has_more(response.recommendations.len(), RELATED_PAGE_SIZE);

    BookDetail {
        id: book.id,
        title: book.title,
        author: book.author,
        description: book.description,
        cover: book.cover,
        publisher: book.publisher,
        published_date: book.published_date,
        category: book.category,
        isbn: book.isbn,
        call_number: book.call_number,
        location: book.location,
        price: book.price,
        edition: book.edition,
        pages: book.pages,
        rating: RatingSummary::new(&book.rating_distribution, book.rating_avg, book.rating_count),
        copies: response.copies,
        reviews: response.comments.into_iter().map(transform_comment).collect(),
        recommendations: response.recommendations,
        has_more_reviews,
        has_more_recommendations,
    }
}

/// Classify a borrow record against `today`.
pub fn borrow_status(record: &BorrowRecord, today: NaiveDate) -> BorrowStatus {
    if let Some(returned) = record.return_date.as_deref() {
        return BorrowStatus::Returned(display_date(Some(returned)));
    }

    match parse_date(&record.due_date) {
        Some(due) if due < today => BorrowStatus::Overdue,
        Some(_) => BorrowStatus::Borrowed,
        None => BorrowStatus::InvalidDate,
    }
}

// ============================================================================
// Request Paths
// ============================================================================

pub fn keyword_search_path(query: &str) -> String {
    format!("/books/search/keywords?q={}", urlencoding::encode(query))
}

pub fn category_path(category: &str) -> String {
    format!("/books/search/category?category={}", urlencoding::encode(category))
}

pub fn details_path(book_id: i64) -> String {
    format!("/books/search/details?bookId={book_id}")
}

pub fn related_comments_path(book_id: i64, page: u32, page_size: u32) -> String {
    format!("/books/relatedComments?bookId={book_id}&currentPage={page}&pageSize={page_size}")
}

pub fn related_books_path(book_id: i64, page: u32, page_size: u32) -> String {
    format!("/books/relatedBooks?bookId={book_id}&currentPage={page}&pageSize={page_size}")
}

pub fn add_book_path(isbn: &str) -> String {
    format!("/books/new/{}", urlencoding::encode(isbn.trim()))
}

// ============================================================================
// Tests
// ============================================================================
