pub const DEFAULT_RESTORE_SUFFIX: &str = "-restore-test";
pub const DEFAULT_STATUS_SUBJECT: &str = "Restore Test Status";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Appended to the original table name to name the restored copy.
    pub restore_suffix: String,
    /// Subject of the confirmation we publish; notifications carrying it are ours.
    pub status_subject: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            restore_suffix: DEFAULT_RESTORE_SUFFIX.to_string(),
            status_subject: DEFAULT_STATUS_SUBJECT.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let restore_suffix = std::env::var("RESTORE_TEST_SUFFIX")
            .unwrap_or_else(|_| DEFAULT_RESTORE_SUFFIX.to_string());
        let status_subject = std::env::var("RESTORE_TEST_STATUS_SUBJECT")
            .unwrap_or_else(|_| DEFAULT_STATUS_SUBJECT.to_string());

        Self {
            restore_suffix,
            status_subject,
        }
    }

    pub fn restore_table_name(&self, original_table_name: &str) -> String {
        format!("{}{}", original_table_name, self.restore_suffix)
    }
}
