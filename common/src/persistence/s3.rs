use std::{collections::HashMap, path::Path};

use s3::{creds::Credentials, region::Region, Bucket, BucketConfiguration};
use tokio::{fs::File, io::AsyncRead, sync::OnceCell};
use tracing::{error, info, warn};

use super::IFileStorage;

pub struct S3FileStorage {
    bucket: Bucket,
    credentials: Credentials,
    public_url: Option<String>,
    expire_seconds: u32,
    bucket_checked: OnceCell<()>,
}

impl S3FileStorage {
    pub fn build(endpoint: String, region: String, access_key_id: String, secret_access_key: String, bucket: String, public_url: Option<String>, expire_seconds: u32) -> Result<Self, &'static str> {
        let credentials = Credentials::new(Some(&access_key_id), Some(&secret_access_key), None, None, None);
        let credentials = credentials.map_err(|_| "error with credentials")?;
        let bucket = Bucket::new(&bucket, Region::Custom { region, endpoint }, credentials.clone()).map_err(|_| "error with bucket")?;
        let bucket = bucket.with_path_style();
        Ok(S3FileStorage {
            bucket,
            credentials,
            public_url: public_url.map(|url| url.trim_end_matches('/').to_string()),
            expire_seconds,
            bucket_checked: OnceCell::new(),
        })
    }

    /// Creates the bucket the first time anything is stored. Creation errors
    /// (including "already exists") are only logged.
    async fn ensure_bucket(&self) {
        self.bucket_checked
            .get_or_init(|| async {
                let created = Bucket::create_with_path_style(&self.bucket.name, self.bucket.region.clone(), self.credentials.clone(), BucketConfiguration::default()).await;
                match created {
                    Ok(response) if response.success() => info!("Created bucket {}", &self.bucket.name),
                    Ok(response) => info!("Bucket {} not created ({}), assuming it exists", &self.bucket.name, response.response_code),
                    Err(err) => warn!("Could not create bucket {}: {}", &self.bucket.name, err),
                }
            })
            .await;
    }

    fn result_url(&self, name: &str) -> Result<String, &'static str> {
        if let Some(public_url) = &self.public_url {
            return Ok(format!("{}/{}/{}", public_url, &self.bucket.name, name));
        }
        let mut custom_queries = HashMap::new();
        custom_queries.insert("response-content-disposition".into(), format!("inline; filename=\"{}\"", name));
        self.bucket.presign_get(name, self.expire_seconds, Some(custom_queries)).map_err(|_| "could not get presigned url")
    }

    async fn store_result<R>(&self, name: &str, mime_type: Option<&str>, mut source: R) -> Result<String, &'static str>
    where
        R: AsyncRead + Unpin,
    {
        info!("Storing {}", name);
        self.ensure_bucket().await;
        if let Some(mime_type) = mime_type {
            self.bucket.put_object_stream_with_content_type(&mut source, name, mime_type).await.map_err(|_| "could not put blob")?;
        } else {
            self.bucket.put_object_stream(&mut source, name).await.map_err(|_| "could not put blob")?;
        }
        self.result_url(name)
    }
}

#[async_trait::async_trait]
impl IFileStorage for S3FileStorage {
    async fn store_result_file_path(&self, name: &str, mime_type: Option<&str>, source: &Path) -> Option<String> {
        let result = match File::open(source).await {
            Ok(file) => self.store_result(name, mime_type, file).await,
            Err(_) => Err("file not found"),
        };
        match result {
            Ok(url) => Some(url),
            Err(err) => {
                error!("Blob upload error for {}: {}", name, err);
                None
            }
        }
    }
}
