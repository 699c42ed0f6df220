mod session_file;

use anyhow::{Context, Result};
use blog_content::{
    BlogContent, ClientConfig, ContentError, Credentials, Post, PostInput, PostQuery, PostStatus,
    Tag, TagFields,
};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use session_file::SessionFile;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Content API root, overrides BLOG_API_URL
    #[arg(short, long)]
    server: Option<String>,

    #[arg(long)]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Login {
        #[arg(short, long)]
        email: String,

        #[arg(short, long)]
        password: String,
    },

    Logout,

    Status,

    /// Public post list
    Posts {
        #[arg(short, long)]
        search: Option<String>,

        #[arg(short, long)]
        tag: Option<String>,
    },

    /// All posts including drafts
    AdminPosts,

    Get {
        slug: String,
    },

    AdminGet {
        id: String,
    },

    /// Create a post, or update it when --id is given
    Save {
        #[arg(long)]
        id: Option<String>,

        #[arg(short, long)]
        title: String,

        #[arg(long)]
        slug: String,

        #[arg(short, long, default_value = "")]
        content: String,

        #[arg(long)]
        excerpt: Option<String>,

        #[arg(long)]
        cover_image: Option<String>,

        /// Comma separated tag names; missing tags are created
        #[arg(long, default_value = "")]
        tags: String,

        #[arg(long, default_value_t = PostStatus::Draft)]
        status: PostStatus,

        #[arg(long)]
        read_time: Option<u32>,

        #[arg(long)]
        publish_date: Option<DateTime<Utc>>,

        #[arg(long)]
        seo_description: Option<String>,
    },

    Delete {
        id: String,
    },

    Tags,

    TagCreate {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long)]
        color: Option<String>,
    },

    TagUpdate {
        id: String,

        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long)]
        color: Option<String>,
    },

    TagDelete {
        id: String,
    },
}

fn init_logging() {
    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    let filter_layer = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,blog_content=info"));

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env().context("Invalid client configuration")?;
    if let Some(server) = cli.server {
        config.base_url = server;
    }

    let content = BlogContent::new(config).context("Failed to create content client")?;

    let session_file = SessionFile::new(cli.session_file)?;
    let saved = session_file.load()?;
    if let Some(session) = saved.clone() {
        content.session().restore(session);
    }

    let result = run(&content, &session_file, cli.command).await;

    // a 401 during the command clears the session; forget it on disk too
    let current = content.session().current();
    if current != saved {
        session_file.sync(current.as_ref())?;
    }

    if let Err(e) = result {
        report(&e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(content: &BlogContent, session_file: &SessionFile, command: Commands) -> Result<()> {
    let queries = content.queries();

    match command {
        Commands::Login { email, password } => {
            println!("🔑 Logging in as: {}", email);

            let session = content
                .auth()
                .login(&Credentials::new(email, password))
                .await?;

            println!("{}", "✅ Login successful!".green());
            println!("   Email: {}", session.user.email);
            println!("   Role: {}", session.user.role);
            println!("   Session saved to {:?}", session_file.path());
        }

        Commands::Logout => {
            content.auth().logout().await;
            println!("{}", "✅ Logged out".green());
        }

        Commands::Status => match content.session().current() {
            Some(session) => {
                println!("🔑 Session file: {:?}", session_file.path());
                println!("   Email: {}", session.user.email);
                println!("   Role: {}", session.user.role);
                println!("   Status: {}", "✅ Active".green());
            }
            None => {
                println!("{}", "❌ No session found".yellow());
                println!("   Please login first: blog-admin login --email <email> --password <password>");
            }
        },

        Commands::Posts { search, tag } => {
            let posts = queries.posts(&PostQuery { search, tag }).await?;
            print_posts(&posts);
        }

        Commands::AdminPosts => {
            let posts = queries.admin_posts().await?;
            print_posts(&posts);
        }

        Commands::Get { slug } => match queries.post(&slug).await? {
            Some(post) => print_post(&post),
            None => {
                println!("{}", format!("❌ Post '{}' not found", slug).red());
                println!("   Tip: Use 'posts' command to see available posts");
            }
        },

        Commands::AdminGet { id } => match queries.admin_post(&id).await? {
            Some(post) => print_post(&post),
            None => println!("{}", format!("❌ Post #{} not found", id).red()),
        },

        Commands::Save {
            id,
            title,
            slug,
            content: body,
            excerpt,
            cover_image,
            tags,
            status,
            read_time,
            publish_date,
            seo_description,
        } => {
            let input = PostInput {
                id,
                title,
                slug,
                content: body,
                excerpt,
                cover_image,
                tags: tags.into(),
                status,
                read_time,
                publish_date,
                seo_description,
            };

            let post = queries.save_post(&input).await?;

            println!("{}", "✅ Post saved successfully!".green());
            print_post(&post);
        }

        Commands::Delete { id } => {
            println!("🗑️ Deleting post #{}", id);
            if !queries.delete_post(&id).await {
                anyhow::bail!("Failed to delete post #{}", id);
            }
            println!("{}", "✅ Post deleted successfully!".green());
        }

        Commands::Tags => {
            let tags = queries.admin_tags().await?;
            if tags.is_empty() {
                println!("   No tags found");
            }
            for tag in &tags {
                print_tag(tag);
            }
        }

        Commands::TagCreate {
            name,
            description,
            color,
        } => {
            let tag = queries
                .create_tag(&tag_fields(name, description, color))
                .await?;
            println!("{}", "✅ Tag created!".green());
            print_tag(&tag);
        }

        Commands::TagUpdate {
            id,
            name,
            description,
            color,
        } => {
            let tag = queries
                .update_tag(&id, &tag_fields(name, description, color))
                .await?;
            println!("{}", "✅ Tag updated!".green());
            print_tag(&tag);
        }

        Commands::TagDelete { id } => {
            if !queries.delete_tag(&id).await {
                anyhow::bail!("Failed to delete tag #{}", id);
            }
            println!("{}", "✅ Tag deleted".green());
        }
    }

    Ok(())
}

fn tag_fields(name: String, description: Option<String>, color: Option<String>) -> TagFields {
    let mut fields = TagFields::new(name);
    fields.description = description;
    if let Some(color) = color {
        fields.color_code = color;
    }
    fields
}

fn report(error: &anyhow::Error) {
    let content_error = error
        .chain()
        .find_map(|cause| {
            cause
                .downcast_ref::<ContentError>()
                .or_else(|| cause.downcast_ref::<Arc<ContentError>>().map(Arc::as_ref))
        });

    match content_error {
        Some(ContentError::InvalidCredentials) => {
            println!("{}", "❌ Login failed: invalid email or password".red());
        }
        Some(e) if e.is_unauthorized() => {
            println!("{}", "❌ Unauthorized. Please login first:".red());
            println!("   blog-admin login --email <email> --password <password>");
        }
        Some(ContentError::Conflict(_)) => {
            println!("{}", "❌ A post with this slug already exists".red());
        }
        _ => println!("{}", format!("❌ {:#}", error).red()),
    }
}

fn print_posts(posts: &[Post]) {
    println!("✅ Found {} posts", posts.len());
    println!();

    if posts.is_empty() {
        println!("   No posts found");
        return;
    }

    for (i, post) in posts.iter().enumerate() {
        println!("   {}. [{}] {} ({})", i + 1, post.id, post.title, post.status);
        println!("      Slug: {}", post.slug);
        if !post.tags.is_empty() {
            println!("      Tags: {}", post.tags.join(", "));
        }
        println!("      Excerpt: {}", truncate(&post.excerpt, 50));
        println!();
    }
}

fn print_post(post: &Post) {
    println!("   ID: {}", post.id);
    println!("   Title: {}", post.title);
    println!("   Slug: {}", post.slug);
    println!("   Status: {}", post.status);
    if let Some(date) = post.publish_date {
        println!("   Published: {}", date.format("%Y-%m-%d %H:%M"));
    }
    println!("   Read time: {} min", post.read_time);
    println!("   Tags: {}", post.tags.join(", "));
    println!("   Content: {}", truncate(&post.content, 200));
}

fn print_tag(tag: &Tag) {
    match &tag.description {
        Some(description) => println!(
            "   [{}] {} {} - {}",
            tag.id, tag.name, tag.color_code, description
        ),
        None => println!("   [{}] {} {}", tag.id, tag.name, tag.color_code),
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((index, _)) => format!("{}...", &s[..index]),
        None => s.to_string(),
    }
}
