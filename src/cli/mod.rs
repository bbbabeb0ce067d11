//! Command-line interface.

pub mod commands;
pub mod helpers;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{load_settings_with_options, LoadOptions};
use crate::models::{DocumentSource, DocumentStatus};

#[derive(Debug, Parser)]
#[command(name = "draftpress", version, about = "Blog draft lifecycle store and API")]
pub struct Cli {
    /// Config file (JSON). Auto-discovered when omitted.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Blog project root.
    #[arg(long, global = true, env = "DRAFTPRESS_PROJECT_ROOT")]
    pub project_root: Option<PathBuf>,

    /// Resolve relative config paths against the current directory.
    #[arg(long, global = true)]
    pub cwd: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP API
    Serve {
        #[arg(long, env = "DRAFTPRESS_HOST")]
        host: Option<String>,
        #[arg(long, short, env = "DRAFTPRESS_PORT")]
        port: Option<u16>,
        /// Webhook called to rebuild the site
        #[arg(long, env = "DRAFTPRESS_REBUILD_URL")]
        rebuild_url: Option<String>,
    },
    /// Create the directory layout and repair interrupted writes
    Init,
    /// Import a markdown or text file as a pending document
    Import {
        file: PathBuf,
        #[arg(long, default_value = "manual")]
        source: DocumentSource,
    },
    /// List documents
    List {
        #[arg(long)]
        status: Option<DocumentStatus>,
    },
    /// Show one document
    Show {
        id: String,
        /// Print the content too
        #[arg(long)]
        content: bool,
    },
    /// Generate front matter and move a pending document to processed
    Process {
        id: String,
        #[arg(long)]
        title: Option<String>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
        /// Comma-separated categories
        #[arg(long)]
        categories: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        draft: Option<bool>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Publish a processed document to content/posts
    Publish {
        id: String,
        /// Call the rebuild hook afterwards
        #[arg(long)]
        rebuild: bool,
    },
    /// Delete a document from the admin areas
    Delete {
        id: String,
        /// Skip confirmation
        #[arg(long, short)]
        yes: bool,
    },
    /// Upload an image
    Upload {
        file: PathBuf,
        /// documents, gallery or temp
        #[arg(long, default_value = "temp")]
        category: String,
        #[arg(long)]
        subcategory: Option<String>,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Call the site rebuild hook
    Rebuild {
        #[arg(long, env = "DRAFTPRESS_REBUILD_URL")]
        rebuild_url: Option<String>,
    },
}

/// Parse arguments and run the selected command.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut options = LoadOptions {
        config_path: cli.config,
        use_cwd: cli.cwd,
        project_root: cli.project_root,
        ..Default::default()
    };
    match &cli.command {
        Commands::Serve {
            host,
            port,
            rebuild_url,
        } => {
            options.host = host.clone();
            options.port = *port;
            options.rebuild_url = rebuild_url.clone();
        }
        Commands::Rebuild { rebuild_url } => options.rebuild_url = rebuild_url.clone(),
        _ => {}
    }
    let settings = load_settings_with_options(options).await;

    match cli.command {
        Commands::Serve { .. } => commands::serve::cmd_serve(&settings).await,
        Commands::Init => commands::site::cmd_init(&settings),
        Commands::Import { file, source } => {
            commands::document::cmd_import(&settings, &file, source).await
        }
        Commands::List { status } => commands::document::cmd_list(&settings, status).await,
        Commands::Show { id, content } => {
            commands::document::cmd_show(&settings, &id, content).await
        }
        Commands::Process {
            id,
            title,
            tags,
            categories,
            date,
            draft,
            description,
        } => {
            let patch = crate::models::MetadataPatch {
                title,
                tags: tags.as_deref().map(helpers::parse_csv),
                categories: categories.as_deref().map(helpers::parse_csv),
                date,
                draft,
                description,
                images: Vec::new(),
            };
            commands::document::cmd_process(&settings, &id, patch).await
        }
        Commands::Publish { id, rebuild } => {
            commands::document::cmd_publish(&settings, &id, rebuild).await
        }
        Commands::Delete { id, yes } => commands::document::cmd_delete(&settings, &id, yes).await,
        Commands::Upload {
            file,
            category,
            subcategory,
            tags,
            description,
        } => {
            commands::image::cmd_upload(
                &settings,
                &file,
                &category,
                subcategory,
                tags.as_deref().map(helpers::parse_csv).unwrap_or_default(),
                description,
            )
            .await
        }
        Commands::Rebuild { .. } => commands::site::cmd_rebuild(&settings).await,
    }
}
