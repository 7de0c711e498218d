use std::collections::HashMap;

use axum::extract::Multipart;

use crate::api::errors::ApiError;

#[derive(Debug)]
pub(crate) struct UploadedFile {
    pub(crate) filename: String,
    pub(crate) bytes: Vec<u8>,
}

/// Text fields and files of a multipart body, keyed by field name.
#[derive(Debug, Default)]
pub(crate) struct MultipartForm {
    texts: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl MultipartForm {
    /// Fields carrying a filename are collected as files, the rest as text.
    /// Empty file parts are dropped so they read as "not uploaded".
    pub(crate) async fn read(mut multipart: Multipart, max_bytes: u64) -> Result<Self, ApiError> {
        let mut form = Self::default();

        while let Some(mut field) = multipart
            .next_field()
            .await
            .map_err(|_| ApiError::BadRequest("Invalid multipart data".to_string()))?
        {
            let name = field.name().unwrap_or("").to_string();
            if name.is_empty() {
                continue;
            }

            match field.file_name().map(str::to_string) {
                Some(filename) => {
                    let mut bytes = Vec::new();
                    while let Some(chunk) = field
                        .chunk()
                        .await
                        .map_err(|_| ApiError::BadRequest("Failed to read file".to_string()))?
                    {
                        if bytes.len() as u64 + chunk.len() as u64 > max_bytes {
                            return Err(ApiError::BadRequest(format!(
                                "File size exceeds {}MB limit",
                                max_bytes / (1024 * 1024)
                            )));
                        }
                        bytes.extend_from_slice(&chunk);
                    }
                    if !bytes.is_empty() {
                        form.files.insert(name, UploadedFile { filename, bytes });
                    }
                }
                None => {
                    let text = field.text().await.map_err(|_| {
                        ApiError::BadRequest(format!("Invalid value for field '{name}'"))
                    })?;
                    form.texts.insert(name, text);
                }
            }
        }

        Ok(form)
    }

    pub(crate) fn text(&self, name: &str) -> Option<&str> {
        self.texts.get(name).map(String::as_str)
    }

    pub(crate) fn take_text(&mut self, name: &str) -> Option<String> {
        self.texts.remove(name)
    }

    pub(crate) fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }
}
