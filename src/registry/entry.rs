//! Adapter descriptor record and its deep-copy codec.

use serde::{Deserialize, Serialize};

use super::store::RegistryError;

/// Metadata describing one LoRA adapter.
///
/// The `id` is the primary key: unique, non-empty, immutable once stored.
/// Re-registering under the same id replaces the whole record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdapterEntry {
    /// Unique adapter identifier.
    pub id: String,
    /// Human-readable display name.
    pub name: Option<String>,
    /// Short description of what this adapter does.
    pub description: Option<String>,
    /// Direct download URL (.gguf file).
    pub download_url: Option<String>,
    /// Filename to save as on disk.
    pub filename: Option<String>,
    /// Explicit list of compatible base model ids, in registration order.
    pub compatible_model_ids: Vec<String>,
    /// File size in bytes (0 if unknown).
    pub file_size: i64,
    /// Recommended LoRA scale (e.g. 0.3). No enforced range.
    pub default_scale: f32,
}

impl AdapterEntry {
    /// Create an entry with only an id set.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            description: None,
            download_url: None,
            filename: None,
            compatible_model_ids: Vec::new(),
            file_size: 0,
            default_scale: 0.0,
        }
    }

    /// True if this adapter declares compatibility with `model_id`.
    ///
    /// Exact string match against the compatible list.
    pub fn is_compatible_with(&self, model_id: &str) -> bool {
        self.compatible_model_ids.iter().any(|m| m == model_id)
    }

    /// Fallibly deep-copy this entry.
    ///
    /// Every owned allocation is reserved up front; if any reservation
    /// fails the partially built copy is dropped and `OutOfMemory` is
    /// returned. No half-built entry is ever observable; callers commit
    /// the result only after this returns `Ok`.
    pub fn try_clone(&self) -> Result<Self, RegistryError> {
        let mut compatible_model_ids = Vec::new();
        compatible_model_ids
            .try_reserve_exact(self.compatible_model_ids.len())
            .map_err(|_| RegistryError::OutOfMemory)?;
        for model_id in &self.compatible_model_ids {
            compatible_model_ids.push(try_copy_str(model_id)?);
        }

        Ok(Self {
            id: try_copy_str(&self.id)?,
            name: try_copy_opt(&self.name)?,
            description: try_copy_opt(&self.description)?,
            download_url: try_copy_opt(&self.download_url)?,
            filename: try_copy_opt(&self.filename)?,
            compatible_model_ids,
            file_size: self.file_size,
            default_scale: self.default_scale,
        })
    }
}

fn try_copy_str(s: &str) -> Result<String, RegistryError> {
    let mut out = String::new();
    out.try_reserve_exact(s.len())
        .map_err(|_| RegistryError::OutOfMemory)?;
    out.push_str(s);
    Ok(out)
}

fn try_copy_opt(s: &Option<String>) -> Result<Option<String>, RegistryError> {
    match s {
        Some(s) => Ok(Some(try_copy_str(s)?)),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AdapterEntry {
        AdapterEntry {
            id: "style-anime".to_string(),
            name: Some("Anime Style".to_string()),
            description: Some("Shifts outputs toward anime prose".to_string()),
            download_url: Some("https://cdn.example.com/style-anime.gguf".to_string()),
            filename: Some("style-anime.gguf".to_string()),
            compatible_model_ids: vec!["qwen-0.5b".to_string(), "llama-3b".to_string()],
            file_size: 42_000_000,
            default_scale: 0.3,
        }
    }

    #[test]
    fn try_clone_is_field_equal() {
        let original = sample();
        let copy = original.try_clone().unwrap();
        assert_eq!(original, copy);
    }

    #[test]
    fn try_clone_is_independent() {
        let original = sample();
        let mut copy = original.try_clone().unwrap();
        copy.name = Some("mutated".to_string());
        copy.compatible_model_ids.push("extra".to_string());
        assert_eq!(original.name.as_deref(), Some("Anime Style"));
        assert_eq!(original.compatible_model_ids.len(), 2);
    }

    #[test]
    fn compatibility_is_exact_match() {
        let entry = sample();
        assert!(entry.is_compatible_with("qwen-0.5b"));
        assert!(!entry.is_compatible_with("qwen"));
        assert!(!entry.is_compatible_with("QWEN-0.5B"));
    }

    #[test]
    fn serde_round_trip() {
        let entry = sample();
        let json = serde_json::to_string(&entry).unwrap();
        let parsed: AdapterEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(entry, parsed);
    }
}
