use arbor::config::SortOrder;
use arbor::{output, render, scan};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "arbor")]
#[command(version)]
#[command(about = "Static site generator for nested article archives")]
#[command(long_about = "\
Static site generator for nested article archives

Your filesystem is the data source. Directories become articles, nested up
to three levels deep; the files inside become each article's content.

Content structure:

  content/
  ├── site.toml                  # Site config (optional)
  ├── about.yml                  # Site metadata: title, owner
  ├── assets/                    # Static assets → copied to output root
  ├── launch-week/               # Article
  │   ├── article.yml            # title, date, topics, pinned
  │   ├── intro.md               # Markdown (front matter supported)
  │   ├── rocket.jpg             # Image content
  │   └── press/                 # Sub-article
  │       ├── briefing.txt       # Plain text (first line titles it)
  │       ├── recap.youtube      # Embedded video: 'id: <youtube-id>'
  │       └── photos/            # Sub-sub-article (deepest level)
  └── _drafts/                   # '_' prefix = excluded

Title resolution (first available wins):
  metadata 'title' → first titled document → directory name

Topic tags ('topics:' in any .yml) aggregate upward and get their own
listing pages under /topics/.")]
struct Cli {
    /// Content directory
    #[arg(long, default_value = "content", global = true)]
    source: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the content directory and render the full site
    Build {
        /// Empty the output directory first
        #[arg(long)]
        clean: bool,
        /// Listing order (overrides site.toml)
        #[arg(long, value_enum)]
        sort: Option<SortOrder>,
    },
    /// Print the article tree
    List {
        /// Include sub- and sub-sub-articles
        #[arg(long)]
        all: bool,
        /// Show each entry's topics
        #[arg(long)]
        topics: bool,
        /// Listing order (overrides site.toml)
        #[arg(long, value_enum)]
        sort: Option<SortOrder>,
        /// Emit the tree as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print all topics
    Topics,
    /// Print the total content size
    Size,
    /// Scan and validate the content directory without writing output
    Check,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Build { clean, sort } => {
            println!("==> Scanning {}", cli.source.display());
            let site = scan::scan(&cli.source)?;
            let sort = sort.unwrap_or(site.config.sort);

            if clean {
                render::clean_target(&cli.output)?;
            }
            println!("==> Rendering {} entities", site.tree.len());
            let summary = render::render_site(&site, &cli.source, &cli.output, sort)?;
            output::print_build_summary(&summary, &cli.output);
        }
        Command::List { all, topics, sort, json } => {
            let site = scan::scan(&cli.source)?;
            if json {
                let value = output::article_tree_json(&site);
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                let sort = sort.unwrap_or(site.config.sort);
                output::print_article_list(&site, all, topics, sort);
            }
        }
        Command::Topics => {
            let site = scan::scan(&cli.source)?;
            output::print_topic_list(&site);
        }
        Command::Size => {
            let site = scan::scan(&cli.source)?;
            output::print_size(&site);
        }
        Command::Check => {
            println!("==> Checking {}", cli.source.display());
            let site = scan::scan(&cli.source)?;
            output::print_article_list(&site, true, true, site.config.sort);
            println!("==> Content is valid: {} entities", site.tree.len());
        }
    }

    Ok(())
}
