//! Filesystem writability probe

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

use crate::health::check::{CheckContext, CheckOutcome, HealthCheck};

/// Creates and removes a small marker file inside a directory.
pub struct FilePathWriteCheck {
    directory: PathBuf,
}

impl FilePathWriteCheck {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    async fn write_and_remove(probe: &Path) -> io::Result<()> {
        let mut file = fs::File::create(probe).await?;
        file.write_all(b"healthwatch").await?;
        file.flush().await?;
        drop(file);
        fs::remove_file(probe).await
    }
}

#[async_trait::async_trait]
impl HealthCheck for FilePathWriteCheck {
    async fn check(&self, ctx: CheckContext) -> CheckOutcome {
        let probe = self
            .directory
            .join(format!(".healthwatch-probe-{}", Uuid::new_v4()));

        let result = tokio::select! {
            result = Self::write_and_remove(&probe) => result,
            _ = ctx.cancellation().cancelled() => {
                Err(io::Error::new(io::ErrorKind::Interrupted, "probe cancelled"))
            }
        };

        match result {
            Ok(()) => CheckOutcome::healthy()
                .with_data("path", self.directory.display().to_string()),
            Err(e) => {
                debug!(path = %probe.display(), error = %e, "filesystem probe failed");
                // The file may exist if the write itself failed.
                let _ = fs::remove_file(&probe).await;

                CheckOutcome::failure(&ctx, "Issues writing to file path")
                    .with_data("path", probe.display().to_string())
                    .with_error(e)
            }
        }
    }
}
