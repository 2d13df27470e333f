//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `blog_core` linkage.
//! - Open the configured database and report its article count.

use blog_core::db::open_db;
use blog_core::{
    core_version, init_logging_from_config, ping, ArticleService, CoreConfig,
    SqliteArticleRepository,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("blog_core ping={}", ping());
    println!("blog_core version={}", core_version());

    match run() {
        Ok(count) => {
            println!("blog_core articles={count}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("blog_core probe failed: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<u64, String> {
    let config = CoreConfig::from_env().map_err(|err| err.to_string())?;
    init_logging_from_config(&config)?;
    println!("blog_core db_path={}", config.db_path.display());

    let mut conn = open_db(&config.db_path).map_err(|err| err.to_string())?;
    let repo = SqliteArticleRepository::try_new(&mut conn).map_err(|err| err.to_string())?;
    ArticleService::new(repo)
        .count_articles()
        .map_err(|err| err.to_string())
}
