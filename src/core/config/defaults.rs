use crate::core::config::data::Config;
use crate::core::provision::ModelRequest;

pub const DEFAULT_MODEL: &str = "qwen2.5:0.5b-instruct";
pub const DEFAULT_DTYPE: &str = "q4";
pub const DEFAULT_DEVICE: &str = "gpu";
pub const DEFAULT_RUNTIME_URL: &str = "http://localhost:11434";

/// Keys accepted by `neoai set` / `neoai unset`.
pub const CONFIG_KEYS: [&str; 4] = ["model", "dtype", "device", "runtime-url"];

impl Config {
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn dtype(&self) -> &str {
        self.dtype.as_deref().unwrap_or(DEFAULT_DTYPE)
    }

    pub fn device(&self) -> &str {
        self.device.as_deref().unwrap_or(DEFAULT_DEVICE)
    }

    pub fn runtime_url(&self) -> &str {
        self.runtime_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .unwrap_or(DEFAULT_RUNTIME_URL)
    }

    pub fn model_request(&self) -> ModelRequest {
        ModelRequest {
            model: self.model().to_string(),
            dtype: self.dtype().to_string(),
            device: self.device().to_string(),
        }
    }

    pub fn set_value(&mut self, key: &str, value: String) -> Result<(), String> {
        let value = value.trim().to_string();
        if value.is_empty() {
            return Err(format!("A value is required for '{key}'"));
        }
        *self.slot_mut(key)? = Some(value);
        Ok(())
    }

    pub fn unset_value(&mut self, key: &str) -> Result<(), String> {
        *self.slot_mut(key)? = None;
        Ok(())
    }

    fn slot_mut(&mut self, key: &str) -> Result<&mut Option<String>, String> {
        match key {
            "model" => Ok(&mut self.model),
            "dtype" => Ok(&mut self.dtype),
            "device" => Ok(&mut self.device),
            "runtime-url" => Ok(&mut self.runtime_url),
            _ => Err(format!(
                "Unknown config key '{key}'. Available keys: {}",
                CONFIG_KEYS.join(", ")
            )),
        }
    }
}
