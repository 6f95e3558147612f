use crate::download::{Options, promote, tmp_path};
use crate::error::{DownloadError, Result};
use futures_util::StreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use reqwest::Url;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Downloads `s3://bucket/key` urls. The bucket is the url's authority and
/// the key is its path without the leading slash. Region and any credentials
/// not given in `options` come from the usual AWS environment variables.
pub async fn download(url: &Url, destination: &Path, options: &Options) -> Result<()> {
    let bucket = url
        .host_str()
        .ok_or_else(|| DownloadError::InvalidLocator(url.to_string()))?;
    let key = url.path().trim_start_matches('/');

    let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);
    if let Some(access_key) = &options.s3_access_key {
        builder = builder.with_access_key_id(access_key);
    }
    if let Some(secret_key) = &options.s3_secret_key {
        builder = builder.with_secret_access_key(secret_key);
    }
    let store = builder.build()?;

    fetch_object(&store, &ObjectPath::from(key), destination).await
}

/// Streams an object to `destination`, checking the byte count against the
/// object's declared size. Unlike the HTTP path, this engine promotes its
/// own temp file.
async fn fetch_object(store: &dyn ObjectStore, key: &ObjectPath, destination: &Path) -> Result<()> {
    let meta = store.head(key).await?;
    let mut stream = store.get(key).await?.into_stream();

    let tmp = tmp_path(destination);
    let mut file = tokio::fs::File::create(&tmp).await?;
    let mut copied = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        file.write_all(&chunk).await?;
        copied += chunk.len() as u64;
    }
    file.flush().await?;

    if copied != meta.size {
        return Err(DownloadError::Transfer(format!(
            "object {key} is {} bytes, copied {copied}",
            meta.size
        )));
    }

    promote(&tmp, destination)
}
