use crate::core::config::data::Config;

impl Config {
    pub fn print_all(&self) {
        println!("Current configuration:");
        print_entry("model", self.model.as_deref(), self.model());
        print_entry("dtype", self.dtype.as_deref(), self.dtype());
        print_entry("device", self.device.as_deref(), self.device());
        print_entry("runtime-url", self.runtime_url.as_deref(), self.runtime_url());
    }
}

fn print_entry(key: &str, configured: Option<&str>, effective: &str) {
    match configured {
        Some(_) => println!("  {key}: {effective}"),
        None => println!("  {key}: {effective} (default)"),
    }
}
