//! `resources` subcommand

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use crate::api::client::{ApiClientConfig, QuranApiClient};
use crate::ResourceInfo;

/// Which resource catalog to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResourceKind {
    /// Translation resources
    Translations,
    /// Tafsir resources
    Tafsirs,
}

/// Arguments for the `resources` subcommand.
#[derive(Debug, Args)]
pub struct ResourcesArgs {
    /// Catalog to list
    #[arg(value_enum)]
    pub kind: ResourceKind,

    /// Filter by language name, e.g. "english"
    #[arg(long)]
    pub language: Option<String>,

    /// API base URL
    #[arg(long, default_value = "https://api.quran.com/api/v4")]
    pub base_url: String,
}

/// Run the resources subcommand.
pub async fn run(args: ResourcesArgs) -> Result<()> {
    let config = ApiClientConfig {
        base_url: args.base_url.clone(),
        ..ApiClientConfig::default()
    };
    let client = QuranApiClient::new(config).context("failed to initialize API client")?;

    let resources = match args.kind {
        ResourceKind::Translations => client.get_translations_list().await?,
        ResourceKind::Tafsirs => client.get_tafsirs_list().await?,
    };

    let filtered = filter_by_language(resources, args.language.as_deref());
    for resource in &filtered {
        let language = resource.language.as_deref().unwrap_or("-");
        let author = resource.author_name.as_deref().unwrap_or("-");
        println!("{:>5}  {:<12}  {}  ({author})", resource.id, language, resource.name);
    }
    println!("{} resources", filtered.len());
    Ok(())
}

fn filter_by_language(resources: Vec<ResourceInfo>, language: Option<&str>) -> Vec<ResourceInfo> {
    match language {
        None => resources,
        Some(wanted) => resources
            .into_iter()
            .filter(|resource| {
                resource
                    .language
                    .as_deref()
                    .is_some_and(|l| l.eq_ignore_ascii_case(wanted))
            })
            .collect(),
    }
}
