use crate::error::DownloaderError;
use log::debug;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

pub async fn read_urls(path: &Path) -> Result<Vec<String>, DownloaderError> {
    let mut file = File::open(path)
        .await
        .map_err(|e| DownloaderError::UrlListError(format!("{}: {}", path.display(), e)))?;

    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .await
        .map_err(|e| DownloaderError::UrlListError(format!("{}: {}", path.display(), e)))?;

    let urls: Vec<String> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();

    debug!("Read {} URLs from {}", urls.len(), path.display());
    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn trims_and_drops_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.txt");
        tokio::fs::write(
            &path,
            "  https://example.com/a.pdf \n\n\t\nhttps://example.com/b.pdf\r\nhttps://example.com/c.pdf",
        )
        .await
        .unwrap();

        let urls = read_urls(&path).await.unwrap();
        assert_eq!(
            urls,
            vec![
                "https://example.com/a.pdf",
                "https://example.com/b.pdf",
                "https://example.com/c.pdf",
            ]
        );
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_urls(&dir.path().join("nope.txt")).await;
        assert!(matches!(result, Err(DownloaderError::UrlListError(_))));
    }
}
