use crate::client::{ApiClient, RequestOptions};
use crate::prelude::{eprintln, println, *};
use colored::Colorize;
use libraryhub_core::articles::{article_path, mime_from_extension, PresignRequest, UploadKind};
use libraryhub_core::books::display_date;
use libraryhub_core::cookies::is_absolute_url;
use serde_json::Value;
use std::path::{Path, PathBuf};

pub use libraryhub_core::articles::{Announcement, NewArticleRequest, PresignedPost};

/// Announcement/article commands
#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// List published articles
    #[clap(name = "list")]
    List(ListOptions),

    /// Read an article
    #[clap(name = "read")]
    Read(ReadOptions),

    /// Publish an article with a cover image
    #[clap(name = "publish")]
    Publish(PublishOptions),

    /// Upload an image to object storage and print its URL
    #[clap(name = "upload")]
    Upload(UploadOptions),
}

#[derive(Debug, clap::Args, Clone)]
pub struct ListOptions {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct ReadOptions {
    pub id: i64,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct PublishOptions {
    #[arg(short, long)]
    pub title: String,

    /// Markdown file with the article body
    #[arg(short, long)]
    pub content: PathBuf,

    /// Cover image file
    #[arg(long)]
    pub cover: PathBuf,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ImageKind {
    Cover,
    Content,
}

impl From<ImageKind> for UploadKind {
    fn from(kind: ImageKind) -> Self {
        match kind {
            ImageKind::Cover => UploadKind::Cover,
            ImageKind::Content => UploadKind::Content,
        }
    }
}

#[derive(Debug, clap::Args, Clone)]
pub struct UploadOptions {
    pub file: PathBuf,

    /// What the image is for
    #[arg(long, value_enum, default_value = "content")]
    pub kind: ImageKind,
}

// --- Data functions ---

pub async fn list_data(client: &ApiClient) -> Result<Vec<Announcement>> {
    let articles: Option<Vec<Announcement>> = client.get("/articles/", &RequestOptions::new()).await?;
    Ok(articles.unwrap_or_default())
}

pub async fn read_data(client: &ApiClient, id: i64) -> Result<Announcement> {
    client
        .get(&article_path(id), &RequestOptions::new())
        .await?
        .ok_or_else(|| eyre!("Article {id} not found"))
}

/// Ask the backend for a signed upload form for `filename`.
pub async fn presign_data(client: &ApiClient, request: &PresignRequest) -> Result<PresignedPost> {
    let signature: PresignedPost = client
        .post("/auth/oss/generate-presigned-post", request, &RequestOptions::new())
        .await?
        .ok_or_eyre("Backend returned no upload signature")?;

    signature.validate().map_err(|e| eyre!(e))?;
    if !is_absolute_url(&signature.host) {
        return Err(eyre!("Upload host is not an absolute URL: {}", signature.host));
    }
    Ok(signature)
}

/// Upload image bytes with a presigned POST; returns the public object URL.
pub async fn upload_bytes(
    client: &ApiClient,
    filename: &str,
    bytes: Vec<u8>,
    kind: UploadKind,
) -> Result<String> {
    let mime = mime_from_extension(filename);
    let signature = presign_data(client, &PresignRequest::new(filename, mime, kind)).await?;

    // The file part must come after every signed field.
    let mut form = reqwest::multipart::Form::new();
    for (name, value) in signature.form_fields() {
        form = form.text(name, value);
    }
    let part = reqwest::multipart::Part::bytes(bytes)
        .file_name(filename.to_string())
        .mime_str(mime)
        .map_err(|e| eyre!("Invalid MIME type: {e}"))?;
    form = form.part("file", part);

    match client
        .post_multipart::<Value>(&signature.host, form, &RequestOptions::new())
        .await
    {
        Ok(_) => {}
        // Storage answers 2xx with XML or nothing at all; the object is stored either way.
        Err(Error::Api(e)) if (200..300).contains(&e.status()) => {
            log::debug!("Storage answered HTTP {} without an envelope", e.status());
        }
        Err(e) => return Err(eyre!("Object storage upload failed (HTTP {}): {}", e.status(), e)),
    }

    let url = signature.object_url();
    log::debug!("Uploaded {filename} to {url}");
    Ok(url)
}

pub async fn upload_file(client: &ApiClient, path: &Path, kind: UploadKind) -> Result<String> {
    if !path.is_file() {
        return Err(eyre!("File not found: {}", path.display()));
    }

    let filename = path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| eyre!("Failed to read {}: {e}", path.display()))?;

    upload_bytes(client, &filename, bytes, kind).await
}

/// Validate, upload the cover, then create the article.
pub async fn publish_data(client: &ApiClient, title: &str, content: &str, cover: &Path) -> Result<NewArticleRequest> {
    if title.trim().is_empty() {
        return Err(eyre!("Article title cannot be empty"));
    }
    if content.trim().is_empty() {
        return Err(eyre!("Article content cannot be empty"));
    }

    let cover_image_url = upload_file(client, cover, UploadKind::Cover)
        .await
        .wrap_err("Failed to upload cover image")?;

    let request = NewArticleRequest {
        title: title.to_string(),
        content: content.to_string(),
        cover_image_url,
    };
    client
        .post::<Value, _>("/articles/new", &request, &RequestOptions::new())
        .await?;

    Ok(request)
}

// --- CLI handlers ---

async fn list_handler(client: &ApiClient, options: ListOptions) -> Result<()> {
    let articles = list_data(client).await?;

    if options.json {
        return print_json(&articles);
    }
    if articles.is_empty() {
        println!("No articles.");
        return Ok(());
    }

    let mut table = new_table(&["ID", "Title", "Author", "Published", "Views"]);
    for article in &articles {
        table.add_row(prettytable::row![
            article.id.to_string().green(),
            article.title.bright_white(),
            article.author.as_deref().unwrap_or("N/A"),
            display_date(article.create_time.as_deref()),
            article.views
        ]);
    }
    table.printstd();
    Ok(())
}

async fn read_handler(client: &ApiClient, options: ReadOptions) -> Result<()> {
    let article = read_data(client, options.id).await?;

    if options.json {
        return print_json(&article);
    }

    println!("{}", article.title.bright_white().bold());
    println!(
        "{} {} {} {}",
        "by".bright_black(),
        article.author.as_deref().unwrap_or("unknown"),
        "on".bright_black(),
        display_date(article.create_time.as_deref())
    );
    if let Some(cover) = &article.cover_image {
        println!("{} {}", "Cover:".bright_black(), cover);
    }
    println!("\n{}", article.content);
    Ok(())
}

/// Run article commands
pub async fn run(cmd: Commands, client: &ApiClient, global: &crate::Global) -> Result<()> {
    if global.verbose {
        eprintln!("Running articles command against {}...", client.base_url());
    }

    match cmd {
        Commands::List(options) => list_handler(client, options).await,
        Commands::Read(options) => read_handler(client, options).await,
        Commands::Publish(options) => {
            let content = tokio::fs::read_to_string(&options.content)
                .await
                .map_err(|e| eyre!("Failed to read {}: {e}", options.content.display()))?;
            let article = publish_data(client, &options.title, &content, &options.cover).await?;
            println!("{} {}", "Published:".green().bold(), article.title.bright_white());
            println!("{} {}", "Cover:".bright_black(), article.cover_image_url);
            Ok(())
        }
        Commands::Upload(options) => {
            let url = upload_file(client, &options.file, options.kind.into()).await?;
            println!("{url}");
            Ok(())
        }
    }
}
