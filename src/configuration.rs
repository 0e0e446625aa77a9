use std::path::PathBuf;

pub trait Configuration: Clone + Send + Sync + 'static {
    fn api_base_url(&self) -> String;
    fn session_path(&self) -> PathBuf;
    fn slot_interval_minutes(&self) -> i64;
}
