//! List posts

use anyhow::Result;

use crate::cms::Repository;
use crate::content::{PostFetcher, PostSummary};
use crate::Blog;

/// Print every post, following the listing to its last page
pub async fn run<R: Repository>(blog: &Blog, repo: R) -> Result<()> {
    let pages = blog.pages(repo)?;
    let posts = collect(pages.fetcher()).await?;

    println!("Posts ({}):", posts.len());
    for post in posts {
        println!(
            "  {} - {} [{}]",
            post.first_publication_date, post.title, post.uid
        );
    }

    Ok(())
}

/// All summaries in listing order
async fn collect<R: Repository>(fetcher: &PostFetcher<R>) -> Result<Vec<PostSummary>> {
    let mut page = fetcher.fetch_summaries().await?;
    let mut posts = Vec::new();
    loop {
        posts.append(&mut page.results);
        match page.next_page {
            Some(cursor) => page = fetcher.fetch_more(&cursor).await?,
            None => break,
        }
    }
    Ok(posts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::tests::pages;

    #[tokio::test]
    async fn test_collect_follows_every_page() {
        let pages = pages();
        let posts = collect(pages.fetcher()).await.unwrap();
        let uids: Vec<_> = posts.iter().map(|p| p.uid.as_str()).collect();
        assert_eq!(uids, ["como-utilizar-hooks", "criando-um-app-cra-do-zero"]);
        assert_eq!(posts[0].first_publication_date, "15 mar 2021");
    }
}
