use clap::Subcommand;
use repro_cache::{CacheKind, ResultCache};
use repro_config::Settings;
use repro_core::{Result, EXIT_SUCCESS};

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Show entry counts per kind
    Stats,
    /// Remove cached entries
    Clear {
        /// Only this kind (paper, repository, analysis)
        kind: Option<CacheKind>,
    },
}

impl CacheCommands {
    pub fn execute(self, settings: &Settings) -> Result<i32> {
        let cache = ResultCache::new(&settings.cache_dir);
        match self {
            CacheCommands::Stats => {
                let stats = cache.stats()?;
                println!("Cache directory: {}", stats.root.display());
                for kind in CacheKind::ALL {
                    println!("  {:<12} {}", kind.as_str(), stats.count(kind));
                }
                println!("  {:<12} {}", "total", stats.total());
            }
            CacheCommands::Clear { kind } => {
                let removed = cache.clear(kind)?;
                match kind {
                    Some(kind) => println!("✓ Removed {removed} {kind} cache entries"),
                    None => println!("✓ Removed {removed} cache entries"),
                }
            }
        }
        Ok(EXIT_SUCCESS)
    }
}
