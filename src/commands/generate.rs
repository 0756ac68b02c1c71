//! Generate static files

use anyhow::Result;

use crate::cms::Repository;
use crate::generator::{GenerateStats, Generator};
use crate::Blog;

/// Export the whole blog into the public directory
pub async fn run<R: Repository>(blog: &Blog, repo: R) -> Result<GenerateStats> {
    let start = std::time::Instant::now();

    let generator = Generator::new(
        blog.pages(repo)?,
        blog.public_dir.clone(),
        blog.static_dir.clone(),
    );
    let stats = generator.generate().await?;

    tracing::info!(
        "Generated {} posts, {} listing pages and {} assets in {:.2}s",
        stats.posts,
        stats.listing_pages,
        stats.assets,
        start.elapsed().as_secs_f64()
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::tests::fixture_repository;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_generate_into_public_dir() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("_config.yml"), "timezone: UTC\n").unwrap();
        let blog = Blog::new(temp.path()).unwrap();

        let stats = run(&blog, fixture_repository()).await.unwrap();
        assert_eq!(stats.posts, 2);
        assert!(blog.public_dir.join("index.html").exists());
        assert!(blog
            .public_dir
            .join("post/como-utilizar-hooks/index.html")
            .exists());
    }
}
