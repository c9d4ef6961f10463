/// Object naming for one ImmuKV namespace.
///
/// ```text
/// {prefix}_log.json        the log object, one version per entry
/// {prefix}keys/{key}.json  one key object per user key
/// ```
///
/// The prefix is used verbatim; include a trailing `/` if a directory-style
/// layout is wanted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageLayout {
    prefix: String,
}

const LOG_OBJECT: &str = "_log.json";
const KEYS_DIR: &str = "keys/";
const KEY_SUFFIX: &str = ".json";

impl StorageLayout {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Path of the global log object.
    pub fn log_path(&self) -> String {
        format!("{}{LOG_OBJECT}", self.prefix)
    }

    /// Path of the key object for `key`.
    pub fn key_path(&self, key: &str) -> String {
        format!("{}{KEYS_DIR}{key}{KEY_SUFFIX}", self.prefix)
    }

    /// Prefix shared by every key object.
    pub fn keys_prefix(&self) -> String {
        format!("{}{KEYS_DIR}", self.prefix)
    }

    /// Recover the user key from a key-object path. Paths outside the key
    /// namespace, or not ending in `.json`, yield `None`.
    pub fn key_from_path<'a>(&self, path: &'a str) -> Option<&'a str> {
        path.strip_prefix(self.prefix.as_str())?
            .strip_prefix(KEYS_DIR)?
            .strip_suffix(KEY_SUFFIX)
    }
}
