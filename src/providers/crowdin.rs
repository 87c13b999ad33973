use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::errors::PlatformError;
use crate::providers::{ExportStatus, FileUpload, LanguageProgress, SupportedLanguage, TranslationPlatform};
use crate::shell;
use crate::translation::status::LanguageStatus;

/// Base URL of the Crowdin v1 project API
pub const API_URL: &str = "https://api.crowdin.com/api/project";

/// Crowdin client for one project
#[derive(Clone)]
pub struct Crowdin {
    /// HTTP client for API requests
    client: Client,
    /// API base URL, without the project segment
    base_url: String,
    /// Project identifier (the repository name)
    project: String,
    /// Project API key
    api_key: String,
}

impl fmt::Debug for Crowdin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Crowdin")
            .field("base_url", &self.base_url)
            .field("project", &self.project)
            .finish()
    }
}

/// Error envelope returned by every method on failure
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    success: bool,
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
struct ExportResponse {
    success: ExportStatus,
}

impl Crowdin {
    /// Create a client for `project` against the public API
    pub fn new(project: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_base_url(API_URL, project, api_key)
    }

    /// Create a client against another base URL
    pub fn with_base_url(base_url: impl Into<String>, project: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(300))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            project: project.into(),
            api_key: api_key.into(),
        }
    }

    /// Project identifier
    pub fn project(&self) -> &str {
        &self.project
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.project, method)
    }

    /// POST a method with `key` and `json` parameters plus `params`
    fn post(&self, method: &str, params: &[(&str, &str)]) -> RequestBuilder {
        self.client
            .post(self.method_url(method))
            .query(&[("key", self.api_key.as_str()), ("json", "true")])
            .query(params)
    }

    async fn send(&self, method: &str, request: RequestBuilder) -> Result<String, PlatformError> {
        debug!("Crowdin {} ({})", method, self.project);
        let response = request
            .send()
            .await
            .map_err(|e| PlatformError::RequestFailed(format!("{}: {}", method, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PlatformError::RequestFailed(format!("{}: {}", method, e)))?;

        // Errors are reported in the body, usually with a non-success status
        if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(&body) {
            if let (false, Some(detail)) = (envelope.success, envelope.error) {
                return Err(PlatformError::Api {
                    status: status.as_u16(),
                    code: detail.code,
                    message: detail.message,
                });
            }
        }

        if !status.is_success() {
            error!("Crowdin API error ({}): {}", status, body);
            return Err(PlatformError::Http {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, params: &[(&str, &str)]) -> Result<T, PlatformError> {
        let body = self.send(method, self.post(method, params)).await?;
        serde_json::from_str(&body).map_err(|e| PlatformError::ParseError(format!("{}: {}", method, e)))
    }

    async fn upload_form(upload: &FileUpload) -> Result<Form, PlatformError> {
        let content = tokio::fs::read(&upload.local_path).await.map_err(|e| {
            PlatformError::RequestFailed(format!("Failed to read {}: {}", upload.local_path.display(), e))
        })?;
        let file_name = upload
            .local_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| upload.remote_path.clone());

        Ok(Form::new()
            .part(
                format!("files[{}]", upload.remote_path),
                Part::bytes(content).file_name(file_name),
            )
            .text(
                format!("export_patterns[{}]", upload.remote_path),
                upload.export_pattern.clone(),
            ))
    }

    async fn upload(&self, method: &str, upload: &FileUpload) -> Result<(), PlatformError> {
        let form = Self::upload_form(upload).await?;
        self.send(method, self.post(method, &[]).multipart(form)).await?;
        Ok(())
    }
}

#[async_trait]
impl TranslationPlatform for Crowdin {
    async fn add_directory(&self, path: &str) -> Result<(), PlatformError> {
        self.send("add-directory", self.post("add-directory", &[("name", path)]))
            .await?;
        Ok(())
    }

    async fn add_file(&self, upload: &FileUpload) -> Result<(), PlatformError> {
        self.upload("add-file", upload).await
    }

    async fn update_file(&self, upload: &FileUpload) -> Result<(), PlatformError> {
        self.upload("update-file", upload).await
    }

    async fn export(&self) -> Result<ExportStatus, PlatformError> {
        let response: ExportResponse = self.call("export", &[]).await?;
        Ok(response.success)
    }

    async fn project_status(&self) -> Result<Vec<LanguageProgress>, PlatformError> {
        self.call("status", &[]).await
    }

    async fn language_status(&self, language: &str) -> Result<LanguageStatus, PlatformError> {
        self.call("language-status", &[("language", language)]).await
    }

    async fn supported_languages(&self) -> Result<Vec<SupportedLanguage>, PlatformError> {
        self.call("supported-languages", &[]).await
    }

    async fn download_translations(&self, destination: &Path) -> Result<(), PlatformError> {
        let archive = destination.with_extension("zip");
        info!("Downloading translations to {}", archive.display());

        let response = self
            .client
            .get(self.method_url("download/all.zip"))
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| PlatformError::RequestFailed(format!("download/all.zip: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Crowdin download failed ({}): {}", status, body);
            return Err(PlatformError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PlatformError::RequestFailed(format!("download/all.zip: {}", e)))?;
        tokio::fs::write(&archive, &bytes)
            .await
            .map_err(|e| PlatformError::Archive(format!("Failed to write {}: {}", archive.display(), e)))?;
        info!("Download complete.");

        tokio::fs::create_dir_all(destination)
            .await
            .map_err(|e| PlatformError::Archive(e.to_string()))?;
        // Run next to the archive so relative destinations resolve the same way
        let working_dir = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let file_arg = |path: &Path| {
            path.file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default()
        };
        let archive_arg = file_arg(&archive);
        let destination_arg = file_arg(destination);
        shell::run_quiet(
            working_dir,
            &["unzip", "-q", "-o", archive_arg.as_str(), "-d", destination_arg.as_str()],
        )
        .await
        .map_err(|e| PlatformError::Archive(e.to_string()))?;

        tokio::fs::remove_file(&archive)
            .await
            .map_err(|e| PlatformError::Archive(format!("Failed to remove {}: {}", archive.display(), e)))?;
        Ok(())
    }
}
